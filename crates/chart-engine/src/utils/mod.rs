//! Shared utilities for the chart engine.
//!
//! This module contains the stable key hash used to identify charts, the
//! member collation used to sort axis members, and the lazy
//! partial-permutation generator used by the chart engines.

mod permutations;

pub use permutations::{PartialPermutations, partial_permutations};

use crate::types::Value;
use icu_collator::CollatorBorrowed;
use icu_collator::options::CollatorOptions;
use icu_locale_core::Locale;
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Key Generation
// =============================================================================

const DJB2_SEED: u32 = 5381;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 32-bit djb2 hash over the UTF-16 code units of `input`.
///
/// Operating on UTF-16 units keeps keys identical to those produced by
/// JavaScript clients hashing the same token string.
pub fn djb2(input: &str) -> u32 {
    input.encode_utf16().fold(DJB2_SEED, |hash, unit| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(unit))
    })
}

/// Render a number in lowercase base 36.
pub fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Deterministic short key over an ordered token list.
///
/// Tokens are joined with `|` before hashing, so `["a", "bc"]` and
/// `["ab", "c"]` produce different keys.
pub fn stable_key<I, T>(tokens: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let joined = tokens
        .into_iter()
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join("|");
    to_base36(djb2(&joined))
}

// =============================================================================
// Member Collation
// =============================================================================

/// Sorts axis members the way a reader of the dataset's locale expects.
///
/// Strings use the CLDR collation of the locale with numeric ordering on
/// ("Item 2" < "Item 10", "Ávila" < "Madrid"). When the locale cannot be
/// parsed, strings fall back to a case-insensitive natural order. Ties fall
/// back to the raw string so the order is total. Numbers compare
/// numerically, booleans false-first.
#[derive(Clone)]
pub struct Collator {
    locale: String,
    unicode: Option<Arc<CollatorBorrowed<'static>>>,
}

impl Collator {
    pub fn new(locale: impl Into<String>) -> Self {
        let locale = locale.into();
        let unicode = locale_collator(&locale).map(Arc::new);
        Self { locale, unicode }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Whether strings are compared with the locale's collation rules.
    pub fn is_locale_aware(&self) -> bool {
        self.unicode.is_some()
    }

    pub fn compare_str(&self, a: &str, b: &str) -> Ordering {
        let ord = match &self.unicode {
            Some(collator) => collator.compare(a, b),
            None => natural_cmp(&a.to_lowercase(), &b.to_lowercase()),
        };
        ord.then_with(|| a.cmp(b))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
            (Value::String(x), Value::String(y)) => self.compare_str(x, y),
            (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        }
    }

    /// Sort values in place using this collation.
    pub fn sort(&self, values: &mut [Value]) {
        values.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Debug for Collator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collator")
            .field("locale", &self.locale)
            .field("locale_aware", &self.is_locale_aware())
            .finish()
    }
}

/// CLDR collator for `locale` with numeric ordering, if the tag parses.
fn locale_collator(locale: &str) -> Option<CollatorBorrowed<'static>> {
    // "-u-kn-true" turns on numeric ordering; tags that already carry a
    // unicode extension are used as given.
    let parsed = format!("{locale}-u-kn-true")
        .parse::<Locale>()
        .or_else(|_| locale.parse::<Locale>());
    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(locale, error = %e, "Unrecognized locale; using natural member order");
            return None;
        }
    };

    match icu_collator::Collator::try_new(parsed.into(), CollatorOptions::default()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            debug!(locale, error = %e, "No collation data; using natural member order");
            None
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
    }
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut left);
                let y_run = take_digits(&mut right);
                let ord = compare_digit_runs(&x_run, &y_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.cmp(&y);
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

// =============================================================================
// Tests
// =============================================================================

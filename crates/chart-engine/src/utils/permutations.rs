//! Lazy generation of ordered k-selections (partial permutations).
//!
//! Chart engines walk every ordered choice of `k` distinct axis levels. The
//! number of such choices grows as `n! / (n - k)!`, so selections are produced
//! on demand and a consumer that stops early never pays for the rest.

/// Iterator over every ordered selection of `k` distinct items of a slice.
///
/// Selections come out in lexicographic order of item indices. The iterator
/// is `Clone`, so a sequence can be replayed from any point.
#[derive(Debug, Clone)]
pub struct PartialPermutations<'a, T> {
    items: &'a [T],
    k: usize,
    indices: Vec<usize>,
    used: Vec<bool>,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Running,
    Done,
}

/// Lazily yield every ordered selection of exactly `k` distinct items.
pub fn partial_permutations<T>(items: &[T], k: usize) -> PartialPermutations<'_, T> {
    PartialPermutations {
        items,
        k,
        indices: Vec::with_capacity(k),
        used: vec![false; items.len()],
        state: State::Fresh,
    }
}

impl<'a, T> PartialPermutations<'a, T> {
    /// Fill positions `from..k` with the smallest unused indices.
    fn fill_from(&mut self, from: usize) {
        self.indices.truncate(from);
        let mut candidate = 0;
        while self.indices.len() < self.k {
            if !self.used[candidate] {
                self.used[candidate] = true;
                self.indices.push(candidate);
            }
            candidate += 1;
        }
    }

    /// Move to the next selection; false when exhausted.
    fn advance(&mut self) -> bool {
        let mut position = self.k;
        while position > 0 {
            position -= 1;
            let current = self.indices[position];
            // positions to the right were released on the way down
            self.used[current] = false;
            if let Some(next) = (current + 1..self.items.len()).find(|&i| !self.used[i]) {
                self.used[next] = true;
                self.indices[position] = next;
                self.fill_from(position + 1);
                return true;
            }
            self.indices.truncate(position);
        }
        false
    }

    fn current(&self) -> Vec<&'a T> {
        self.indices.iter().map(|&i| &self.items[i]).collect()
    }
}

impl<'a, T> Iterator for PartialPermutations<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => None,
            State::Fresh => {
                if self.k > self.items.len() {
                    self.state = State::Done;
                    return None;
                }
                self.fill_from(0);
                self.state = if self.k == 0 {
                    State::Done
                } else {
                    State::Running
                };
                Some(self.current())
            }
            State::Running => {
                if self.advance() {
                    Some(self.current())
                } else {
                    self.state = State::Done;
                    None
                }
            }
        }
    }
}

impl<T> std::iter::FusedIterator for PartialPermutations<'_, T> {}

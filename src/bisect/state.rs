//! Search position over a build range.

use crate::domain::Verdict;

/// Position of a binary search over `len` builds ordered newest first.
///
/// Bad builds sit at the low indices and good builds at the high ones. A bad
/// verdict moves the search toward older builds, a good verdict toward newer
/// ones. The chunk halves on every step and the search ends after the verdict
/// taken at chunk size 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BisectState {
    current_chunk: usize,
    current_index: usize,
    len: usize,
}

impl BisectState {
    /// Start a search over `len` builds. `len` must be at least 2.
    pub fn new(len: usize) -> Self {
        debug_assert!(len >= 2, "bisection needs at least two builds");
        let chunk = (len + 1).next_power_of_two() / 2;
        Self {
            current_chunk: chunk,
            current_index: (chunk - 1).min(len - 1),
            len,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_chunk(&self) -> usize {
        self.current_chunk
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the next verdict is the last one
    pub fn is_last_step(&self) -> bool {
        self.current_chunk <= 1
    }

    /// Fold a verdict for the current index into the state.
    ///
    /// Returns true when the search is finished. Retry leaves the state
    /// untouched; quit finishes without moving.
    pub fn step(&mut self, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Retry => return false,
            Verdict::Quit => return true,
            Verdict::Good | Verdict::Bad => {}
        }

        if self.is_last_step() {
            return true;
        }

        self.current_chunk = self.current_chunk.div_ceil(2);
        let index = match verdict {
            Verdict::Bad => self.current_index + self.current_chunk,
            _ => self.current_index.saturating_sub(self.current_chunk),
        };
        self.current_index = index.min(self.len - 1);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let cases = [(2, 2, 1), (3, 2, 1), (4, 4, 3), (6, 4, 3), (7, 4, 3), (8, 8, 7), (100, 64, 63)];
        for (len, chunk, index) in cases {
            let state = BisectState::new(len);
            assert_eq!(state.current_chunk(), chunk, "len {}", len);
            assert_eq!(state.current_index(), index, "len {}", len);
        }
    }

    #[test]
    fn test_bad_moves_older_and_good_moves_newer() {
        let mut state = BisectState::new(8);
        assert_eq!(state.current_index(), 7);

        assert!(!state.step(Verdict::Good));
        assert_eq!(state.current_chunk(), 4);
        assert_eq!(state.current_index(), 3);

        assert!(!state.step(Verdict::Bad));
        assert_eq!(state.current_chunk(), 2);
        assert_eq!(state.current_index(), 5);
    }

    #[test]
    fn test_index_is_clamped() {
        let mut state = BisectState::new(6);
        assert_eq!(state.current_index(), 3);
        assert!(!state.step(Verdict::Bad));
        assert_eq!(state.current_index(), 5);
        assert!(!state.step(Verdict::Bad));
        // 5 + 1 clamps to the oldest build
        assert_eq!(state.current_index(), 5);

        let mut state = BisectState::new(2);
        assert!(!state.step(Verdict::Good));
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn test_chunk_strictly_decreases_to_one() {
        for len in 2..=130 {
            for verdict in [Verdict::Good, Verdict::Bad] {
                let mut state = BisectState::new(len);
                let mut previous = state.current_chunk();
                let mut steps = 1;
                while !state.step(verdict) {
                    assert!(state.current_chunk() < previous);
                    assert!(state.current_index() < len);
                    previous = state.current_chunk();
                    steps += 1;
                }
                assert_eq!(state.current_chunk(), 1);
                assert!(steps <= (len as f64).log2().ceil() as usize + 1, "len {} took {}", len, steps);
            }
        }
    }

    #[test]
    fn test_retry_and_quit_do_not_move() {
        let mut state = BisectState::new(10);
        let before = state;
        assert!(!state.step(Verdict::Retry));
        assert_eq!(state, before);
        assert!(state.step(Verdict::Quit));
        assert_eq!(state, before);
    }
}

use std::collections::VecDeque;

/// Rolling buffer of the most recent key codes, matched against a target
/// sequence.
#[derive(Clone, Debug)]
pub struct KeySequence {
    target: Vec<u32>,
    recent: VecDeque<u32>,
}

impl KeySequence {
    pub fn new(target: Vec<u32>) -> Self {
        let capacity = target.len();
        Self {
            target,
            recent: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a key press. True when the last `target.len()` codes equal the
    /// target, in order.
    pub fn push(&mut self, code: u32) -> bool {
        if self.target.is_empty() {
            return false;
        }
        self.recent.push_back(code);
        if self.recent.len() > self.target.len() {
            self.recent.pop_front();
        }
        self.recent.len() == self.target.len() && self.recent.iter().eq(self.target.iter())
    }
}

//! Text scramble state machine.
//!
//! A job runs in two phases driven by the controller's timers: a scramble
//! phase where every tick replaces each non-space character with a random
//! symbol, then a typewriter restore where the original text is revealed one
//! character per tick over the last scrambled frame.

use crate::rng::RandomSource;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestoreStep {
    /// Text to display; more steps follow.
    Partial(String),
    /// Restoration finished; display exactly this (the original text).
    Done(String),
}

#[derive(Clone, Debug)]
pub struct ScrambleJob {
    original: Vec<char>,
    scrambled: Vec<char>,
    index: usize,
}

impl ScrambleJob {
    pub fn new(original: &str) -> Self {
        Self {
            original: original.chars().collect(),
            scrambled: Vec::new(),
            index: 0,
        }
    }

    pub fn original(&self) -> String {
        self.original.iter().collect()
    }

    /// Produce a new scrambled frame of the same length, spaces kept in place.
    pub fn scramble<R: RandomSource + ?Sized>(&mut self, alphabet: &[char], rng: &mut R) -> String {
        self.scrambled.clear();
        for &c in &self.original {
            if c == ' ' || alphabet.is_empty() {
                self.scrambled.push(c);
            } else {
                self.scrambled.push(alphabet[rng.index(alphabet.len())]);
            }
        }
        self.scrambled.iter().collect()
    }

    /// One restore tick: original prefix of the current length followed by
    /// the frozen scrambled suffix.
    pub fn restore_step(&mut self) -> RestoreStep {
        let prefix = self.original.iter().take(self.index);
        let suffix = self.scrambled.iter().skip(self.index);
        let text: String = prefix.chain(suffix).collect();
        self.index += 1;
        if self.index > self.original.len() {
            RestoreStep::Done(self.original())
        } else {
            RestoreStep::Partial(text)
        }
    }
}

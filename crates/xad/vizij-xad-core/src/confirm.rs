//! Blocking yes/no decisions requested by the engines.

use std::collections::VecDeque;

/// Host capability that answers a yes/no question; `true` means proceed.
pub trait Confirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self(title, message)
    }
}

/// Answers every prompt the same way.
#[derive(Clone, Copy, Debug)]
pub struct AlwaysAnswer(pub bool);

impl Confirm for AlwaysAnswer {
    fn confirm(&mut self, _title: &str, _message: &str) -> bool {
        self.0
    }
}

/// Replays queued answers in order and records every prompt it was shown.
/// Once the queue is empty, `fallback` is returned.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    fallback: bool,
    prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback,
            prompts: Vec::new(),
        }
    }

    /// Titles of prompts shown so far.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        log::debug!("confirm '{title}': {message}");
        self.prompts.push(title.to_string());
        self.answers.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_then_fallback() {
        let mut c = ScriptedConfirm::new([false, true], true);
        assert!(!c.confirm("a", ""));
        assert!(c.confirm("b", ""));
        assert!(c.confirm("c", ""));
        assert_eq!(c.prompts(), ["a", "b", "c"]);
    }

    #[test]
    fn closures_are_confirmers() {
        let mut seen = 0;
        let mut c = |_: &str, _: &str| {
            seen += 1;
            false
        };
        assert!(!Confirm::confirm(&mut c, "t", "m"));
        assert_eq!(seen, 1);
    }
}

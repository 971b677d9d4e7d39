// SPDX-License-Identifier: MIT

use alloc::{collections::VecDeque, string::String};

use crate::errors::*;

/// A bounded numeric question (sector, cylinder, head count, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberRequest {
    pub low: u64,
    pub default: Option<u64>,
    pub high: u64,
    /// Reference value for relative answers such as `+size`.
    pub base: u64,
    pub prompt: String,
}

impl NumberRequest {
    pub fn new(prompt: impl Into<String>, low: u64, high: u64) -> Self {
        Self {
            low,
            default: None,
            high,
            base: 0,
            prompt: prompt.into(),
        }
    }

    /// Sets the default; values outside `[low, high]` mean "no default".
    pub fn with_default(mut self, dflt: u64) -> Self {
        self.default = (self.low..=self.high).contains(&dflt).then_some(dflt);
        self
    }

    pub fn with_base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    #[inline]
    pub fn accepts(&self, v: u64) -> bool {
        (self.low..=self.high).contains(&v)
    }
}

/// Prompt collaborator used for geometry entry, partition bounds and confirmations.
pub trait Dialog {
    /// Asks for a number; implementations should return a value within `[low, high]`.
    fn ask_number(&mut self, req: &NumberRequest) -> LabelResult<u64>;

    /// Asks for a line of text (without trailing newline).
    fn ask_text(&mut self, prompt: &str) -> LabelResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Number(u64),
    /// Accept the request's default value.
    Default,
    Text(String),
}

/// Pre-recorded answers, consumed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<Answer>,
}

impl ScriptedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(mut self, v: u64) -> Self {
        self.answers.push_back(Answer::Number(v));
        self
    }

    pub fn default_answer(mut self) -> Self {
        self.answers.push_back(Answer::Default);
        self
    }

    pub fn text(mut self, s: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Text(s.into()));
        self
    }

    pub fn push(&mut self, a: Answer) {
        self.answers.push_back(a);
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Dialog for ScriptedDialog {
    fn ask_number(&mut self, req: &NumberRequest) -> LabelResult<u64> {
        match self.answers.pop_front() {
            Some(Answer::Number(v)) => Ok(v),
            Some(Answer::Default) => req
                .default
                .ok_or(LabelError::InvalidArgument("no default value for this question")),
            Some(Answer::Text(_)) => Err(LabelError::InvalidArgument("expected a number")),
            None => Err(LabelError::UserDeclined),
        }
    }

    fn ask_text(&mut self, _prompt: &str) -> LabelResult<String> {
        match self.answers.pop_front() {
            Some(Answer::Text(s)) => Ok(s),
            Some(_) => Err(LabelError::InvalidArgument("expected text")),
            None => Err(LabelError::UserDeclined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_outside_range_is_dropped() {
        let req = NumberRequest::new("First sector", 10, 20).with_default(21);
        assert_eq!(req.default, None);
        let req = NumberRequest::new("First sector", 10, 20).with_default(20);
        assert_eq!(req.default, Some(20));
    }

    #[test]
    fn scripted_answers_in_order() {
        let mut d = ScriptedDialog::new().number(5).default_answer().text("YES");
        let req = NumberRequest::new("n", 0, 10).with_default(7);
        assert_eq!(d.ask_number(&req), Ok(5));
        assert_eq!(d.ask_number(&req), Ok(7));
        assert_eq!(d.ask_text("confirm"), Ok("YES".into()));
        assert_eq!(d.ask_number(&req), Err(LabelError::UserDeclined));
    }
}

// SPDX-License-Identifier: MIT

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use rimio::errors::RimIOError;
use rimlabel::dialog::{Answer, Dialog, NumberRequest};
use rimlabel::errors::{LabelError, LabelResult};

/// Answers taken from command line flags first, then from stdin when interactive.
#[derive(Debug, Default)]
pub struct CliDialog {
    answers: VecDeque<Answer>,
    interactive: bool,
    /// Bytes per display unit, for `+512M` style answers.
    unit_bytes: u64,
}

impl CliDialog {
    pub fn new(interactive: bool, unit_bytes: u64) -> Self {
        Self {
            answers: VecDeque::new(),
            interactive,
            unit_bytes: unit_bytes.max(1),
        }
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    /// Queues `value` or, when absent, the request default.
    pub fn push_or_default(&mut self, value: Option<&str>) {
        match value {
            Some(v) => self.push(Answer::Text(v.to_string())),
            None if self.interactive => {}
            None => self.push(Answer::Default),
        }
    }

    fn read_line(&self, prompt: &str) -> LabelResult<Option<String>> {
        print!("{prompt}");
        io::stdout().flush().map_err(RimIOError::from)?;
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line).map_err(RimIOError::from)?;
        Ok((n != 0).then_some(line))
    }
}

impl Dialog for CliDialog {
    fn ask_number(&mut self, req: &NumberRequest) -> LabelResult<u64> {
        if let Some(answer) = self.answers.pop_front() {
            return match answer {
                Answer::Number(v) => Ok(v),
                Answer::Default => req
                    .default
                    .ok_or(LabelError::InvalidArgument("no default value for this question")),
                Answer::Text(s) => {
                    parse_answer(&s, req, self.unit_bytes).ok_or(LabelError::InvalidArgument("unparsable number"))
                }
            };
        }
        if !self.interactive {
            return Err(LabelError::UserDeclined);
        }

        let prompt = match req.default {
            Some(d) => format!("{} ({}-{}, default {}): ", req.prompt, req.low, req.high, d),
            None => format!("{} ({}-{}): ", req.prompt, req.low, req.high),
        };
        loop {
            let Some(line) = self.read_line(&prompt)? else {
                return Err(LabelError::UserDeclined);
            };
            match parse_answer(&line, req, self.unit_bytes) {
                Some(v) if req.accepts(v) => return Ok(v),
                _ => {
                    crate::log_warn!("Value out of range.");
                }
            }
        }
    }

    fn ask_text(&mut self, prompt: &str) -> LabelResult<String> {
        match self.answers.pop_front() {
            Some(Answer::Text(s)) => Ok(s),
            Some(_) => Err(LabelError::InvalidArgument("expected text")),
            None if self.interactive => self
                .read_line(prompt)?
                .map(|l| l.trim_end_matches(['\r', '\n']).to_string())
                .ok_or(LabelError::UserDeclined),
            None => Err(LabelError::UserDeclined),
        }
    }
}

/// Parses `N`, `+N`, `-N` and sized answers (`+512M`, `+2G`).
///
/// Empty input selects the default. `+` counts from the request base and `-`
/// back from its upper bound; sized values are converted to display units,
/// rounded up.
pub fn parse_answer(input: &str, req: &NumberRequest, unit_bytes: u64) -> Option<u64> {
    let s = input.trim();
    if s.is_empty() {
        return req.default;
    }
    if let Some(rel) = s.strip_prefix('+') {
        return req.base.checked_add(parse_amount(rel, unit_bytes)?);
    }
    if let Some(rel) = s.strip_prefix('-') {
        return req.high.checked_sub(parse_amount(rel, unit_bytes)?);
    }
    parse_amount(s, unit_bytes)
}

fn parse_amount(s: &str, unit_bytes: u64) -> Option<u64> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let shift = match c.to_ascii_uppercase() {
                'K' => 10,
                'M' => 20,
                'G' => 30,
                'T' => 40,
                'P' => 50,
                _ => return None,
            };
            (&s[..i], Some(shift))
        }
        _ => (s, None),
    };
    let n = digits.trim().parse::<u64>().ok()?;
    match shift {
        None => Some(n),
        Some(shift) => Some(n.checked_mul(1u64 << shift)?.div_ceil(unit_bytes.max(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> NumberRequest {
        NumberRequest::new("Last sector", 2048, 36_000)
            .with_default(36_000)
            .with_base(2048)
    }

    #[test]
    fn plain_and_default() {
        assert_eq!(parse_answer("4096", &req(), 512), Some(4096));
        assert_eq!(parse_answer("  \n", &req(), 512), Some(36_000));
        assert_eq!(parse_answer("abc", &req(), 512), None);
    }

    #[test]
    fn relative_answers() {
        assert_eq!(parse_answer("+100", &req(), 512), Some(2148));
        assert_eq!(parse_answer("+1M", &req(), 512), Some(2048 + 2048));
        assert_eq!(parse_answer("-1000", &req(), 512), Some(35_000));
        assert_eq!(parse_answer("+1X", &req(), 512), None);
    }

    #[test]
    fn sized_answers_in_cylinders() {
        // 36 sectors of 512 bytes per cylinder
        assert_eq!(parse_answer("+1M", &req(), 36 * 512), Some(2048 + 57));
    }

    #[test]
    fn scripted_answers_come_first() {
        let mut d = CliDialog::new(false, 512);
        d.push(Answer::Text("+10".into()));
        d.push_or_default(None);
        assert_eq!(d.ask_number(&req()), Ok(2058));
        assert_eq!(d.ask_number(&req()), Ok(36_000));
        assert_eq!(d.ask_number(&req()), Err(LabelError::UserDeclined));
        assert_eq!(d.ask_text("confirm"), Err(LabelError::UserDeclined));
    }
}

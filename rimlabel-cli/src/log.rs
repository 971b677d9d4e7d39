// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU8, Ordering};

use colored::Colorize;
use rimlabel::notice::{Notice, Severity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Normal as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Quiet,
        2 => LogLevel::Verbose,
        _ => LogLevel::Normal,
    }
}

#[macro_export]
macro_rules! log_normal {
    ($($arg:tt)*) => {
        println!("[rimlabel] {}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::log::log_level() != $crate::log::LogLevel::Quiet {
            println!("[rimlabel] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if $crate::log::log_level() == $crate::log::LogLevel::Verbose {
            println!("[rimlabel] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        eprintln!("[rimlabel] {}", colored::Colorize::yellow(format!($($arg)*).as_str()))
    };
}

/// Prints drained library notices; warnings survive `--quiet`.
pub fn print_notices(notices: &[Notice]) {
    for n in notices {
        match n.sev {
            Severity::Info => {
                crate::log_info!("{}", n.msg);
            }
            Severity::Warn => {
                crate::log_warn!("{}", n.msg);
            }
            Severity::Error => eprintln!("[rimlabel] {}", n.to_string().red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_of_every_severity_print() {
        set_log_level(LogLevel::Quiet);
        print_notices(&[
            Notice::info("t.info", "created"),
            Notice::warn("t.warn", "check this"),
            Notice::err("t.err", "failed"),
        ]);
        assert_eq!(log_level(), LogLevel::Quiet);
    }

    #[test]
    fn warnings_work_as_match_arms() {
        for code in [0u8, 1] {
            match code {
                0 => crate::log_warn!("arm {code}"),
                _ => crate::log_verbose!("arm {code}"),
            }
        }
    }
}

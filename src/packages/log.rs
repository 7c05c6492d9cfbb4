//! Logging from scripts
//!
//! Each function emits one tracing event per argument under the
//! `itrex::script` target and returns its last argument, so a call can wrap
//! any expression without changing its value.

use tracing::{debug, error, info, warn, Level};

use crate::error::Result;
use crate::packages::{Installer, Package};
use crate::runtime::{Args, Value};

/// `log.debug`, `log.info`, `log.warn`, `log.error`
pub struct LogPackage;

impl Package for LogPackage {
    fn name(&self) -> &str {
        "log"
    }

    fn default_prefix(&self) -> Option<&str> {
        Some("log")
    }

    fn install(&self, installer: &mut Installer) {
        installer.native("debug", "Log the arguments at debug level.", |args, _| {
            emit(Level::DEBUG, args)
        });
        installer.native("info", "Log the arguments at info level.", |args, _| {
            emit(Level::INFO, args)
        });
        installer.native("warn", "Log the arguments at warn level.", |args, _| {
            emit(Level::WARN, args)
        });
        installer.native("error", "Log the arguments at error level.", |args, _| {
            emit(Level::ERROR, args)
        });
    }
}

fn emit(level: Level, args: Args) -> Result<Value> {
    let mut last = Value::Null;
    for value in args {
        let value = value?;
        let text = value.to_text();
        match level {
            Level::ERROR => error!(target: "itrex::script", "{}", text),
            Level::WARN => warn!(target: "itrex::script", "{}", text),
            Level::INFO => info!(target: "itrex::script", "{}", text),
            _ => debug!(target: "itrex::script", "{}", text),
        }
        last = value;
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Evaluator, Value};

    #[test]
    fn test_log_returns_last_argument() {
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.evaluate_str("[log.info starting [add 1 2]]").unwrap(),
            Value::Int(3)
        );
        assert_eq!(evaluator.evaluate_str("[log.warn]").unwrap(), Value::Null);
        assert!(evaluator.evaluate_str("[log.error [nope]]").is_err());
    }
}

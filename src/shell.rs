//! Interactive read-evaluate-print loop
//!
//! Lines are accumulated until they form complete expressions, so a long
//! expression can span several lines. Evaluation errors are printed and the
//! loop carries on; `[exit]` or end of input stops it.

use std::any::Any;
use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::interop::HostObject;
use crate::parser::{Expression, ExpressionParser};
use crate::runtime::{Evaluator, Value};

/// Printed when `[exit]` is evaluated
pub const EXIT_MESSAGE: &str = "exiting...";

/// Default prompt
pub const PROMPT: &str = "exp: ";

/// Value returned by the shell's `exit` function
#[derive(Debug)]
pub struct ExitSignal;

impl HostObject for ExitSignal {
    fn type_name(&self) -> &str {
        "exit"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// True if `value` is the sentinel produced by `[exit]`
pub fn is_exit(value: &Value) -> bool {
    match value {
        Value::Foreign(obj) => obj.as_any().is::<ExitSignal>(),
        _ => false,
    }
}

/// Text shown for a result; iterators are drained so their elements are visible
pub fn render(value: &Value) -> Result<String> {
    match value {
        Value::Iter(items) => Ok(Value::list(items.drain()?).to_string()),
        other if is_exit(other) => Ok(EXIT_MESSAGE.to_string()),
        other => Ok(other.to_string()),
    }
}

/// Shell over any line reader and writer
pub struct Shell<R, W> {
    evaluator: Evaluator,
    input: R,
    output: W,
    prompt: String,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Wraps `evaluator` and registers `exit` in it
    pub fn new(evaluator: Evaluator, input: R, output: W) -> Self {
        evaluator.register_fn("exit", |_, _| Ok(Value::Foreign(Arc::new(ExitSignal))));
        Shell {
            evaluator,
            input,
            output,
            prompt: PROMPT.to_string(),
        }
    }

    /// Replaces the prompt; an empty prompt prints nothing
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The evaluator behind the shell
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Runs until `[exit]` or end of input
    pub fn run(&mut self) -> Result<()> {
        while let Some(expressions) = self.read_expressions()? {
            if self.evaluate_all(&expressions)? {
                debug!("shell exit requested");
                break;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Reads lines until the buffer holds complete expressions
    ///
    /// `None` means the input ended. A malformed buffer is reported and dropped.
    fn read_expressions(&mut self) -> Result<Option<Vec<Expression>>> {
        let mut buffer = String::new();
        loop {
            if buffer.is_empty() && !self.prompt.is_empty() {
                write!(self.output, "{}", self.prompt)?;
                self.output.flush()?;
            }

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                if !buffer.trim().is_empty() {
                    writeln!(self.output, "Incomplete expression discarded at end of input")?;
                }
                return Ok(None);
            }
            buffer.push_str(&line);

            match ExpressionParser::from_source(&buffer).and_then(|mut p| p.parse_all()) {
                Ok(expressions) => return Ok(Some(expressions)),
                Err(e) if e.is_incomplete() => continue,
                Err(e) => {
                    writeln!(self.output, "{}", e)?;
                    buffer.clear();
                }
            }
        }
    }

    /// Evaluates and prints each expression; true once `[exit]` was evaluated
    ///
    /// A failing expression prints its error and the rest still run.
    fn evaluate_all(&mut self, expressions: &[Expression]) -> Result<bool> {
        for expr in expressions {
            let rendered = self
                .evaluator
                .evaluate(expr)
                .and_then(|value| Ok((is_exit(&value), render(&value)?)));
            match rendered {
                Ok((exit, text)) => {
                    writeln!(self.output, "{}", text)?;
                    if exit {
                        return Ok(true);
                    }
                }
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
        Ok(false)
    }
}

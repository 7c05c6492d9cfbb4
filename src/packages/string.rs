//! String functions

use regex::Regex;

use crate::error::{Error, Result};
use crate::packages::{Installer, Package};
use crate::runtime::{Args, Value};

/// `stringJoin`, `stringConcat`, `stringSplit`
pub struct StringPackage;

impl Package for StringPackage {
    fn name(&self) -> &str {
        "string"
    }

    fn install(&self, installer: &mut Installer) {
        installer.native(
            "stringJoin",
            "[stringJoin sep a b ...] joins the arguments with sep; list and iterator arguments are spliced in.",
            |args, _| string_join(args),
        );
        installer.native(
            "stringConcat",
            "Concatenate the text of every argument.",
            |args, _| {
                let mut out = String::new();
                for value in args {
                    out.push_str(&value?.to_text());
                }
                Ok(Value::String(out))
            },
        );
        installer.native(
            "stringSplit",
            "[stringSplit pattern s] splits s around matches of the regular expression.",
            |mut args, _| {
                let pattern = args.require("stringSplit", "pattern")?.to_text();
                let text = args.require("stringSplit", "string")?.to_text();
                let re = Regex::new(&pattern).map_err(|e| {
                    Error::arity("stringSplit", format!("invalid pattern: {}", e))
                })?;
                let mut parts: Vec<Value> = re.split(&text).map(Value::from).collect();
                // Trailing empty strings are dropped
                while matches!(parts.last(), Some(Value::String(s)) if s.is_empty()) {
                    parts.pop();
                }
                Ok(Value::list(parts))
            },
        );
    }
}

fn string_join(mut args: Args) -> Result<Value> {
    let separator = match args.optional()? {
        Some(separator) => separator.to_text(),
        None => return Ok(Value::from("")),
    };
    let mut parts = Vec::new();
    for value in args {
        let value = value?;
        match value.iterate() {
            Some(items) => {
                for item in items {
                    parts.push(item?.to_text());
                }
            }
            None => parts.push(value.to_text()),
        }
    }
    Ok(Value::String(parts.join(&separator)))
}

//! Type conversions
//!
//! The same conversions back the `string`/`int`/`long`/`float`/`double`/
//! `boolean` functions of the base package.

use crate::error::{Error, Result};
use crate::packages::{Installer, Package};
use crate::runtime::{Args, Value};

/// `toString`, `toInt`, `toLong`, `toFloat`, `toDouble`
pub struct CastingPackage;

impl Package for CastingPackage {
    fn name(&self) -> &str {
        "casting"
    }

    fn install(&self, installer: &mut Installer) {
        installer.native("toString", "Convert the argument to a string.", |args, _| {
            cast("toString", args, to_string)
        });
        installer.native("toInt", "Convert the argument to an integer.", |args, _| {
            cast("toInt", args, to_int)
        });
        installer.native("toLong", "Convert the argument to an integer.", |args, _| {
            cast("toLong", args, to_int)
        });
        installer.native("toFloat", "Convert the argument to a float.", |args, _| {
            cast("toFloat", args, to_float)
        });
        installer.native("toDouble", "Convert the argument to a float.", |args, _| {
            cast("toDouble", args, to_float)
        });
    }
}

/// Applies `convert` to the single argument of `function`
pub(crate) fn cast(
    function: &str,
    mut args: Args,
    convert: fn(&Value) -> Result<Value>,
) -> Result<Value> {
    let value = args.require(function, "value to convert")?;
    convert(&value)
}

pub(crate) fn to_string(value: &Value) -> Result<Value> {
    Ok(Value::String(value.to_text()))
}

pub(crate) fn to_int(value: &Value) -> Result<Value> {
    match value {
        // "2.5" converts through float like a literal would
        Value::String(s) if s.contains('.') => Ok(Value::Int(value.as_float()? as i64)),
        other => Ok(Value::Int(other.as_int()?)),
    }
}

pub(crate) fn to_float(value: &Value) -> Result<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        other => Ok(Value::Float(other.as_float()?)),
    }
}

pub(crate) fn to_bool(value: &Value) -> Result<Value> {
    match value {
        Value::Future(_) | Value::Function(_) => Err(Error::type_error("boolean", value.type_name())),
        other => Ok(Value::Bool(other.is_truthy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Value::from("12")).unwrap(), Value::Int(12));
        assert_eq!(to_int(&Value::from("2.75")).unwrap(), Value::Int(2));
        assert_eq!(to_int(&Value::Bool(true)).unwrap(), Value::Int(1));
        assert!(to_int(&Value::from("twelve")).is_err());
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(&Value::Int(3)).unwrap(), Value::Float(3.0));
        assert_eq!(to_float(&Value::from("1.5")).unwrap(), Value::Float(1.5));
        assert!(to_float(&Value::list(vec![])).is_err());
    }

    #[test]
    fn test_to_bool_follows_truthiness() {
        assert_eq!(to_bool(&Value::from("off")).unwrap(), Value::Bool(false));
        assert_eq!(to_bool(&Value::from("on")).unwrap(), Value::Bool(true));
        assert_eq!(to_bool(&Value::Null).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(
            to_string(&Value::list(vec![Value::Int(1), Value::Int(2)])).unwrap(),
            Value::from("[1, 2]")
        );
    }
}

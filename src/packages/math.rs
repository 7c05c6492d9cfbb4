//! Arithmetic
//!
//! Integer arithmetic is checked: overflow is an error, never a wrap. An
//! operation mixing an integer and a float is carried out in floats.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::iterators::FlattenValues;
use crate::packages::{Installer, Package};
use crate::runtime::{Args, Function, Value, ValueIter};

/// `add`, `sub`, `mul`, `div`, `mod`, `min`, `max`, `abs`, `pow`, `sqrt`
pub struct MathPackage;

impl Package for MathPackage {
    fn name(&self) -> &str {
        "math"
    }

    fn install(&self, installer: &mut Installer) {
        installer.add("add", Function::reducer("add", Value::Int(0), add));
        installer.add("mul", Function::reducer("mul", Value::Int(1), mul));

        installer.native(
            "sub",
            "[sub a b c] computes a - b - c; [sub a] negates a.",
            |args, _| {
                let mut count = 0;
                let result = left_fold("sub", args, |acc, next| {
                    count += 1;
                    arithmetic("sub", acc, next, i64::checked_sub, |a, b| a - b)
                })?;
                if count == 0 {
                    arithmetic("sub", &Value::Int(0), &result, i64::checked_sub, |a, b| a - b)
                } else {
                    Ok(result)
                }
            },
        );
        installer.native(
            "div",
            "[div a b c] computes a / b / c. Integer division truncates; dividing by zero is an error.",
            |args, _| {
                left_fold("div", args, |acc, next| {
                    if is_zero(next) {
                        return Err(Error::DivisionByZero);
                    }
                    arithmetic("div", acc, next, i64::checked_div, |a, b| a / b)
                })
            },
        );
        installer.native(
            "mod",
            "[mod a b] is the remainder of a / b, with the sign of a.",
            |mut args, _| {
                let a = number("mod", &args.require("mod", "dividend")?)?;
                let b = number("mod", &args.require("mod", "divisor")?)?;
                if is_zero(&b) {
                    return Err(Error::DivisionByZero);
                }
                arithmetic("mod", &a, &b, i64::checked_rem, |a, b| a % b)
            },
        );
        installer.native("min", "Smallest argument.", |args, _| {
            extreme("min", args, Ordering::Less)
        });
        installer.native("max", "Largest argument.", |args, _| {
            extreme("max", args, Ordering::Greater)
        });
        installer.native("abs", "Absolute value.", |mut args, _| {
            match number("abs", &args.require("abs", "number")?)? {
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| overflow("abs")),
                Value::Float(x) => Ok(Value::Float(x.abs())),
                other => Err(Error::type_error("number", other.type_name())),
            }
        });
        installer.native(
            "pow",
            "[pow base exponent]. An integer base with a small non-negative integer exponent stays an integer.",
            |mut args, _| {
                let base = number("pow", &args.require("pow", "base")?)?;
                let exponent = number("pow", &args.require("pow", "exponent")?)?;
                match (&base, &exponent) {
                    (Value::Int(b), Value::Int(e)) if *e >= 0 => {
                        let e = u32::try_from(*e).map_err(|_| overflow("pow"))?;
                        b.checked_pow(e).map(Value::Int).ok_or_else(|| overflow("pow"))
                    }
                    _ => Ok(Value::Float(base.as_float()?.powf(exponent.as_float()?))),
                }
            },
        );
        installer.native("sqrt", "Square root, always a float.", |mut args, _| {
            let x = number("sqrt", &args.require("sqrt", "number")?)?.as_float()?;
            if x < 0.0 {
                return Err(Error::arity("sqrt", "argument must not be negative"));
            }
            Ok(Value::Float(x.sqrt()))
        });
    }
}

fn add(acc: &Value, next: &Value) -> Result<(bool, Value)> {
    let next = number("add", next)?;
    Ok((true, arithmetic("add", acc, &next, i64::checked_add, |a, b| a + b)?))
}

fn mul(acc: &Value, next: &Value) -> Result<(bool, Value)> {
    let next = number("mul", next)?;
    Ok((true, arithmetic("mul", acc, &next, i64::checked_mul, |a, b| a * b)?))
}

fn overflow(function: &str) -> Error {
    Error::runtime(format!("{}: integer overflow", function))
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(n) => *n == 0,
        Value::Float(x) => *x == 0.0,
        _ => false,
    }
}

/// Coerces an argument to `Int` or `Float`
///
/// Numeric strings are accepted, so words read from input work as operands.
fn number(function: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Ok(Value::Int(n))
            } else if let Ok(x) = s.parse::<f64>() {
                Ok(Value::Float(x))
            } else {
                Err(Error::arity(function, format!("not a number: {}", s)))
            }
        }
        other => Err(Error::arity(
            function,
            format!("expected a number, got {}", other.type_name()),
        )),
    }
}

fn arithmetic(
    function: &str,
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (number(function, a)?, number(function, b)?) {
        (Value::Int(a), Value::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| overflow(function)),
        (a, b) => Ok(Value::Float(float_op(a.as_float()?, b.as_float()?))),
    }
}

/// Numeric operands of `function`, list and iterator arguments spliced in
fn operands(function: &'static str, args: Args) -> ValueIter {
    let flat = FlattenValues::one_level(Box::new(args));
    Box::new(flat.map(move |item| item.and_then(|v| number(function, &v))))
}

fn left_fold(
    function: &'static str,
    args: Args,
    mut step: impl FnMut(&Value, &Value) -> Result<Value>,
) -> Result<Value> {
    let mut operands = operands(function, args);
    let mut acc = match operands.next() {
        Some(first) => first?,
        None => return Err(Error::arity(function, "requires at least one argument")),
    };
    for next in operands {
        acc = step(&acc, &next?)?;
    }
    Ok(acc)
}

fn extreme(function: &'static str, args: Args, wanted: Ordering) -> Result<Value> {
    left_fold(function, args, |best, next| match next.compare(best) {
        Some(ordering) if ordering == wanted => Ok(next.clone()),
        Some(_) => Ok(best.clone()),
        None => Err(Error::arity(function, "arguments are not comparable")),
    })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::runtime::{Evaluator, Value};

    fn eval(text: &str) -> Value {
        Evaluator::new().evaluate_str(text).unwrap()
    }

    #[test]
    fn test_add_and_mul() {
        assert_eq!(eval("[add 1 2 3]"), Value::Int(6));
        assert_eq!(eval("[add]"), Value::Int(0));
        assert_eq!(eval("[add 1 2.5]"), Value::Float(3.5));
        assert_eq!(eval("[add [list 1 2] 3]"), Value::Int(6));
        assert_eq!(eval("[mul 2 3 4]"), Value::Int(24));
        assert_eq!(eval("[add \"4\" 1]"), Value::Int(5));
    }

    #[test]
    fn test_sub_div_mod() {
        assert_eq!(eval("[sub 10 1 2]"), Value::Int(7));
        assert_eq!(eval("[sub 4]"), Value::Int(-4));
        assert_eq!(eval("[div 7 2]"), Value::Int(3));
        assert_eq!(eval("[div 7.0 2]"), Value::Float(3.5));
        assert_eq!(eval("[mod 7 3]"), Value::Int(1));
        assert_eq!(eval("[mod -7 3]"), Value::Int(-1));
    }

    #[test]
    fn test_division_by_zero() {
        let evaluator = Evaluator::new();
        assert!(matches!(
            evaluator.evaluate_str("[div 1 0]"),
            Err(Error::DivisionByZero)
        ));
        assert!(matches!(
            evaluator.evaluate_str("[mod 1 0]"),
            Err(Error::DivisionByZero)
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let evaluator = Evaluator::new();
        assert!(evaluator
            .evaluate_str("[add 9223372036854775807 1]")
            .is_err());
        assert!(evaluator.evaluate_str("[pow 10 30]").is_err());
    }

    #[test]
    fn test_min_max_abs_pow_sqrt() {
        assert_eq!(eval("[min 3 1 2]"), Value::Int(1));
        assert_eq!(eval("[max 3 1.5 [list 7 2]]"), Value::Int(7));
        assert_eq!(eval("[abs -3]"), Value::Int(3));
        assert_eq!(eval("[pow 2 10]"), Value::Int(1024));
        assert_eq!(eval("[pow 4 0.5]"), Value::Float(2.0));
        assert_eq!(eval("[sqrt 9]"), Value::Float(3.0));
        assert!(Evaluator::new().evaluate_str("[sqrt -1]").is_err());
    }

    #[test]
    fn test_non_numbers_are_rejected() {
        assert!(matches!(
            Evaluator::new().evaluate_str("[add 1 apple]"),
            Err(Error::ArityOrTypeError { .. })
        ));
    }
}

//! Logical reducers and comparisons

use std::cmp::Ordering;

use crate::error::Result;
use crate::packages::{Installer, Package};
use crate::runtime::{Args, Function, Value};

/// `and`, `or`, `not`, `eq`, `gt`, `gte`, `lt`, `lte`
pub struct BooleanPackage;

impl Package for BooleanPackage {
    fn name(&self) -> &str {
        "boolean"
    }

    fn install(&self, installer: &mut Installer) {
        installer.add("and", Function::reducer("and", Value::Bool(true), and));
        installer.add("or", Function::reducer("or", Value::Bool(false), or));
        installer.add("not", Function::reducer("not", Value::Bool(false), not));

        installer.native("eq", "True if every argument equals the next.", |args, _| {
            compare_chain(args, |o| o == Ordering::Equal)
        });
        installer.native("gt", "True if the arguments are strictly decreasing.", |args, _| {
            compare_chain(args, |o| o == Ordering::Greater)
        });
        installer.native("gte", "True if the arguments never increase.", |args, _| {
            compare_chain(args, |o| o != Ordering::Less)
        });
        installer.native("lt", "True if the arguments are strictly increasing.", |args, _| {
            compare_chain(args, |o| o == Ordering::Less)
        });
        installer.native("lte", "True if the arguments never decrease.", |args, _| {
            compare_chain(args, |o| o != Ordering::Greater)
        });
    }
}

// Stops on the first false argument
fn and(acc: &Value, next: &Value) -> Result<(bool, Value)> {
    let next = next.is_truthy();
    Ok((next, Value::Bool(acc.is_truthy() && next)))
}

// Stops on the first true argument
fn or(acc: &Value, next: &Value) -> Result<(bool, Value)> {
    let next = next.is_truthy();
    Ok((!next, Value::Bool(acc.is_truthy() || next)))
}

fn not(_acc: &Value, next: &Value) -> Result<(bool, Value)> {
    Ok((true, Value::Bool(!next.is_truthy())))
}

/// Compares consecutive arguments, evaluating no further once a pair fails
fn compare_chain(mut args: Args, accept: fn(Ordering) -> bool) -> Result<Value> {
    let mut prev = match args.optional()? {
        Some(first) => first,
        None => return Ok(Value::Bool(true)),
    };
    while let Some(current) = args.optional()? {
        match prev.compare(&current) {
            Some(ordering) if accept(ordering) => prev = current,
            _ => return Ok(Value::Bool(false)),
        }
    }
    Ok(Value::Bool(true))
}

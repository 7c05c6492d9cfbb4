//! Interactive shell and host interop through the public API

use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;

use itrex::{Evaluator, HostObject, HostRegistry, InteropError, Shell, Value};
use pretty_assertions::assert_eq;

fn run_shell(evaluator: Evaluator, input: &str) -> String {
    let mut output = Vec::new();
    Shell::new(evaluator, Cursor::new(input.to_string()), &mut output)
        .with_prompt("")
        .run()
        .unwrap();
    String::from_utf8(output).unwrap()
}

// ====================
// Shell
// ====================

#[test]
fn test_shell_session() {
    let input = "\
[set total 0]
[for i [range 4]
     [update total [add [get total] [get i]]]]
[get total]
[get missing]
[get total]
";
    let output = run_shell(Evaluator::new(), input);
    assert_eq!(output, "0\n6\n6\nUndefined variable: missing\n6\n");
}

#[test]
fn test_shell_several_expressions_on_one_line() {
    let output = run_shell(Evaluator::new(), "[add 1 1] [mul 3 3]\n");
    assert_eq!(output, "2\n9\n");
}

#[test]
fn test_shell_exit_in_middle_of_input() {
    let output = run_shell(Evaluator::new(), "[list a]\n[exit]\n[list b]\n");
    assert_eq!(output, "[a]\nexiting...\n");
}

#[test]
fn test_shell_unfinished_input_at_end() {
    let output = run_shell(Evaluator::new(), "[add 1\n");
    assert_eq!(output, "Incomplete expression discarded at end of input\n");
}

// ====================
// Interop
// ====================

#[derive(Debug)]
struct Account {
    owner: String,
    balance: i64,
}

impl HostObject for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn account(value: &Value) -> Result<&Account, InteropError> {
    match value {
        Value::Foreign(obj) => obj.as_any().downcast_ref::<Account>(),
        _ => None,
    }
    .ok_or_else(|| InteropError::Failed("not an account".to_string()))
}

fn bank() -> Arc<HostRegistry> {
    let registry = HostRegistry::new();
    registry.constructor("Account", |args| {
        let owner = args.first().map(Value::to_text).unwrap_or_default();
        let balance = match args.get(1) {
            Some(v) => v.as_int().map_err(|e| InteropError::Failed(e.to_string()))?,
            None => 0,
        };
        Ok(Value::Foreign(Arc::new(Account { owner, balance })))
    });
    registry.method("Account", "owner", |target, _| {
        Ok(Value::from(account(target)?.owner.clone()))
    });
    registry.method("Account", "deposit", |target, args| {
        let current = account(target)?;
        let extra: i64 = args.iter().filter_map(|v| v.as_int().ok()).sum();
        Ok(Value::Foreign(Arc::new(Account {
            owner: current.owner.clone(),
            balance: current.balance + extra,
        })))
    });
    registry.method("Account", "balance", |target, _| {
        Ok(Value::Int(account(target)?.balance))
    });
    Arc::new(registry)
}

#[test]
fn test_interop_from_expressions() {
    let evaluator = Evaluator::new().with_host(bank());
    evaluator.evaluate_str("[import interop]").unwrap();
    evaluator
        .evaluate_str("[set acct [construct Account ann 10]]")
        .unwrap();

    assert_eq!(
        evaluator.evaluate_str("[invoke [get acct] owner]").unwrap(),
        Value::from("ann")
    );
    assert_eq!(
        evaluator
            .evaluate_str("[invoke [invoke [get acct] deposit [list 5 6]] balance]")
            .unwrap(),
        Value::Int(21)
    );
}

#[test]
fn test_interop_errors_are_reported() {
    let evaluator = Evaluator::new().with_host(bank());
    evaluator.evaluate_str("[import interop]").unwrap();

    let err = evaluator.evaluate_str("[construct Bank]").unwrap_err();
    assert_eq!(err.to_string(), "Interop error: Unknown host type: Bank");

    let err = evaluator
        .evaluate_str("[invoke [construct Account bob] withdraw 1]")
        .unwrap_err();
    assert_eq!(err.to_string(), "Interop error: No method withdraw on Account");
}

#[test]
fn test_interop_in_shell() {
    let evaluator = Evaluator::new().with_host(bank());
    let output = run_shell(
        evaluator,
        "[import interop]\n[invoke [construct Account cy 3] balance]\n",
    );
    assert_eq!(output, "OK\n3\n");
}

//! Property-based tests for the parser and the context chain
//!
//! These tests use proptest to verify that:
//! 1. The scanner and parser never panic on arbitrary input
//! 2. Printing a parsed expression and parsing it again is lossless
//! 3. Bindings only flow from a context to its descendants

use itrex::{parse, Evaluator, Expression, ExpressionParser, Scanner, Value};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Random ASCII that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,300}").unwrap()
}

/// Token soup with brackets that may or may not balance
fn bracket_soup() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        Just("[".to_string()),
        Just("]".to_string()),
        Just("\"".to_string()),
        Just(",".to_string()),
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z]{1,6}",
    ];
    prop::collection::vec(token, 0..40).prop_map(|tokens| tokens.join(" "))
}

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.]{0,8}".prop_filter("booleans are not words", |w| w != "true" && w != "false")
}

/// Atoms that print back to the same token
fn atom() -> impl Strategy<Value = Expression> {
    prop_oneof![
        any::<i64>().prop_map(Expression::Int),
        any::<f64>()
            .prop_filter("finite", |x| x.is_finite())
            .prop_map(Expression::Float),
        any::<bool>().prop_map(Expression::Bool),
        word().prop_map(Expression::Word),
        "[ -~]{0,12}".prop_map(Expression::Text),
    ]
}

fn expression() -> impl Strategy<Value = Expression> {
    atom().prop_recursive(4, 64, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Expression::sequence)
    })
}

// =============================================================================
// PARSER PROPERTIES
// =============================================================================

proptest! {
    /// The scanner returns a result for any input, never panics
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let _ = Scanner::new(&source).scan_tokens();
    }

    /// Unbalanced input is an error, never a panic
    #[test]
    fn parser_never_panics(source in bracket_soup()) {
        if let Ok(mut parser) = ExpressionParser::from_source(&source) {
            let _ = parser.parse_all();
        }
    }

    /// Every prefix of a well-formed sequence that cuts it open asks for more input
    #[test]
    fn truncated_sequences_are_incomplete(items in prop::collection::vec(expression(), 1..5)) {
        let text = Expression::sequence(items).to_string();
        let cut: String = text.chars().take(text.chars().count() - 1).collect();
        let err = parse(&cut).unwrap_err();
        prop_assert!(err.is_incomplete(), "{:?} gave {:?}", cut, err);
    }

    /// Printing and re-parsing reproduces the expression and consumes all input
    #[test]
    fn parse_round_trip(expr in expression()) {
        let text = expr.to_string();
        let (parsed, position) = parse(&text).unwrap();
        prop_assert_eq!(position, text.chars().count());
        prop_assert_eq!(parsed, expr);
    }

    /// Large and tiny floats survive printing and reading back
    #[test]
    fn float_literals_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let evaluator = Evaluator::new();
        let shown = Value::Float(x).to_string();
        prop_assert_eq!(evaluator.evaluate_str(&shown).unwrap(), Value::Float(x));
    }

    /// Nesting depth is limited only by memory
    #[test]
    fn parser_handles_deep_nesting(depth in 1usize..200) {
        let source = format!("{}list{}", "[".repeat(depth), "]".repeat(depth));
        let (_, position) = parse(&source).unwrap();
        prop_assert_eq!(position, source.len());
    }
}

// =============================================================================
// SCOPING PROPERTIES
// =============================================================================

proptest! {
    /// A child's binding is never visible to a sibling; the parent's is visible to both
    #[test]
    fn bindings_flow_only_downwards(
        name in "[a-z]{1,8}",
        parent_value in any::<i64>(),
        child_value in any::<i64>(),
    ) {
        let evaluator = Evaluator::new();
        let parent = evaluator.child_context();
        let left = parent.child();
        let right = parent.child();

        left.set(name.clone(), Value::Int(child_value));
        prop_assert_eq!(left.get(&name), Some(Value::Int(child_value)));
        prop_assert_eq!(right.get(&name), None);
        prop_assert_eq!(parent.get(&name), None);

        parent.set(name.clone(), Value::Int(parent_value));
        prop_assert_eq!(right.get(&name), Some(Value::Int(parent_value)));
        prop_assert_eq!(right.child().get(&name), Some(Value::Int(parent_value)));
        // Shadowed in left
        prop_assert_eq!(left.get(&name), Some(Value::Int(child_value)));
    }

    /// Folding add over a range matches the closed form
    #[test]
    fn fold_matches_closed_form(n in 0i64..500) {
        let evaluator = Evaluator::new();
        let source = format!("[fold add 0 [range {}]]", n + 1);
        prop_assert_eq!(evaluator.evaluate_str(&source).unwrap(), Value::Int(n * (n + 1) / 2));
    }
}

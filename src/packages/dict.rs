//! Dictionary functions, imported as `dict.*` by default

use std::collections::BTreeMap;

use crate::packages::{Installer, Package};
use crate::runtime::Value;

/// `dict.mk`, `dict.get`, `dict.put`, `dict.keys`
pub struct DictPackage;

impl Package for DictPackage {
    fn name(&self) -> &str {
        "dict"
    }

    fn default_prefix(&self) -> Option<&str> {
        Some("dict")
    }

    fn install(&self, installer: &mut Installer) {
        installer.native(
            "mk",
            "[dict.mk k1 v1 k2 v2 ...] builds a dictionary; a trailing key maps to null.",
            |mut args, _| {
                let mut entries = BTreeMap::new();
                while let Some(key) = args.optional()? {
                    let value = args.optional()?.unwrap_or(Value::Null);
                    entries.insert(key.to_text(), value);
                }
                Ok(Value::dict(entries))
            },
        );
        installer.native(
            "get",
            "[dict.get d key default] looks up key, falling back to default (or null).",
            |mut args, _| {
                let dict = args.require("dict.get", "dictionary")?;
                let dict = dict.as_dict()?;
                let key = args.require("dict.get", "key")?.to_text();
                match dict.get(&key) {
                    Some(value) => Ok(value.clone()),
                    None => Ok(args.optional()?.unwrap_or(Value::Null)),
                }
            },
        );
        installer.native(
            "put",
            "[dict.put d key value] returns a copy of d with key bound to value.",
            |mut args, _| {
                let dict = args.require("dict.put", "dictionary")?;
                let mut entries = dict.as_dict()?.as_ref().clone();
                let key = args.require("dict.put", "key")?.to_text();
                let value = args.require("dict.put", "value")?;
                entries.insert(key, value);
                Ok(Value::dict(entries))
            },
        );
        installer.native("keys", "Sorted keys of a dictionary.", |mut args, _| {
            let dict = args.require("dict.keys", "dictionary")?;
            let keys = dict.as_dict()?.keys().cloned().map(Value::String).collect();
            Ok(Value::list(keys))
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Evaluator, Value};

    #[test]
    fn test_dict_functions() {
        let evaluator = Evaluator::new();
        evaluator.evaluate_str("[set d [dict.mk b 2 a 1]]").unwrap();
        assert_eq!(
            evaluator.evaluate_str("[dict.get [get d] a]").unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            evaluator.evaluate_str("[dict.get [get d] z 9]").unwrap(),
            Value::Int(9)
        );
        assert_eq!(
            evaluator.evaluate_str("[dict.keys [dict.put [get d] c 3]]").unwrap(),
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
        // put leaves its input unchanged
        assert_eq!(
            evaluator.evaluate_str("[dict.keys [get d]]").unwrap(),
            vec![Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn test_import_under_other_prefix() {
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.evaluate_str("[import [list dict d]]").unwrap(),
            Value::from("OK")
        );
        assert_eq!(
            evaluator.evaluate_str("[d.get [d.mk x 1] x]").unwrap(),
            Value::Int(1)
        );
    }
}

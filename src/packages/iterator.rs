//! Functions over lists and iterators

use crate::iterators::{FlattenValues, SkipNulls};
use crate::packages::functional::call_flattened;
use crate::packages::{Installer, Package};
use crate::runtime::{Function, Value};

/// `flatten`, `flatten2`, `skipNulls`
pub struct IteratorPackage;

impl Package for IteratorPackage {
    fn name(&self) -> &str {
        "iterator"
    }

    fn install(&self, installer: &mut Installer) {
        let flatten = Function::with_help(
            installer.qualify("flatten"),
            "Lazily splice list and iterator arguments, one level deep; other arguments pass through.",
            |args, _| Ok(Value::iter(FlattenValues::one_level(Box::new(args)))),
        );
        // [curry callFlattened [curry flatten]]
        let flatten2 = Function::curry(
            call_flattened(),
            vec![Value::Function(Function::curry(flatten.clone(), Vec::new()))],
        );

        installer.add("flatten", flatten);
        installer.add("flatten2", flatten2);
        installer.native(
            "skipNulls",
            "Lazily drop null elements from the list and iterator arguments.",
            |args, _| {
                Ok(Value::iter(SkipNulls::new(FlattenValues::one_level(
                    Box::new(args),
                ))))
            },
        );
    }
}

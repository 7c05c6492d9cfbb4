//! Host object access
//!
//! Only available when the evaluator was given a [`HostBridge`]; see
//! [`Evaluator::with_host`](crate::runtime::Evaluator::with_host).

use std::sync::Arc;

use crate::interop::{HostBridge, InteropCall, InteropOp};
use crate::packages::{Installer, Package};
use crate::runtime::Function;

/// `construct`, `invoke`, `classOf` bound to one bridge
pub struct InteropPackage {
    bridge: Arc<dyn HostBridge>,
}

impl InteropPackage {
    /// Package forwarding to `bridge`
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        InteropPackage { bridge }
    }
}

impl Package for InteropPackage {
    fn name(&self) -> &str {
        "interop"
    }

    fn install(&self, installer: &mut Installer) {
        for op in [InteropOp::Construct, InteropOp::Invoke, InteropOp::ClassOf] {
            let call = InteropCall::new(Arc::clone(&self.bridge), op);
            installer.add(call.name(), Function::Interop(Arc::new(call)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::interop::{HostClass, HostObject, HostRegistry};
    use crate::runtime::{Evaluator, Value};

    fn evaluator() -> Evaluator {
        let registry = HostRegistry::new();
        registry.constructor("Greeter", |args| {
            let name = args.first().map(Value::to_text).unwrap_or_default();
            Ok(Value::from(format!("hello {}", name)))
        });
        Evaluator::new().with_host(Arc::new(registry))
    }

    #[test]
    fn test_interop_needs_import() {
        let evaluator = evaluator();
        assert!(evaluator.evaluate_str("[construct Greeter]").is_err());
        assert_eq!(
            evaluator.evaluate_str("[import interop]").unwrap(),
            Value::from("OK")
        );
        assert_eq!(
            evaluator.evaluate_str("[construct Greeter bob]").unwrap(),
            Value::from("hello bob")
        );
    }

    #[test]
    fn test_class_of() {
        let evaluator = evaluator();
        evaluator.evaluate_str("[import interop]").unwrap();
        match evaluator.evaluate_str("[classOf Greeter]").unwrap() {
            Value::Foreign(obj) => {
                assert_eq!(obj.type_name(), "class");
                let class = obj.as_any().downcast_ref::<HostClass>().unwrap();
                assert_eq!(class.name(), "Greeter");
            }
            other => panic!("expected a class, got {}", other),
        }
        assert_eq!(
            evaluator
                .evaluate_str("[construct [classOf Greeter] ann]")
                .unwrap(),
            Value::from("hello ann")
        );
    }
}

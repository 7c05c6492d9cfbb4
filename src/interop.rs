//! Boundary to host-language objects
//!
//! The evaluator never inspects host objects. A [`HostBridge`] supplied by
//! the embedding program constructs them, invokes their methods and hands
//! out type handles; the `interop` package forwards evaluated arguments to it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::error::Result;
use crate::iterators::FlattenValues;
use crate::runtime::{Args, Value};

/// Failures reported by a host bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InteropError {
    /// No type with this name is known to the bridge
    #[error("Unknown host type: {0}")]
    UnknownType(String),

    /// The type has no method with this name
    #[error("No method {method} on {type_name}")]
    NoSuchMethod {
        /// Receiver type
        type_name: String,
        /// Requested method
        method: String,
    },

    /// The host call itself failed
    #[error("{0}")]
    Failed(String),
}

/// Object owned by the host, carried around by [`Value::Foreign`]
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Host type name, used for method lookup and display
    fn type_name(&self) -> &str;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}

/// Capability surface of the host
pub trait HostBridge: Send + Sync {
    /// Creates an object of the named type
    fn construct(&self, type_name: &str, args: Vec<Value>) -> std::result::Result<Value, InteropError>;

    /// Invokes a named method on `target`
    fn invoke(
        &self,
        target: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> std::result::Result<Value, InteropError>;

    /// Handle for the named type; invoking a method on it calls a type-level method
    fn class_of(&self, type_name: &str) -> std::result::Result<Value, InteropError>;
}

/// Type handle returned by [`HostRegistry::class_of`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostClass {
    name: String,
}

impl HostClass {
    /// Name of the type
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HostObject for HostClass {
    fn type_name(&self) -> &str {
        "class"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Constructor = Box<dyn Fn(Vec<Value>) -> std::result::Result<Value, InteropError> + Send + Sync>;
type Method =
    Box<dyn Fn(&Value, Vec<Value>) -> std::result::Result<Value, InteropError> + Send + Sync>;

/// Host bridge assembled from Rust closures
///
/// Methods are keyed by receiver type name: [`Value::type_name`] for plain
/// values, [`HostObject::type_name`] for foreign objects, and the type name
/// itself when the receiver is a [`HostClass`] handle.
#[derive(Default)]
pub struct HostRegistry {
    constructors: DashMap<String, Constructor>,
    methods: DashMap<String, HashMap<String, Method>>,
}

impl HostRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor of a type
    pub fn constructor<F>(&self, type_name: &str, f: F)
    where
        F: Fn(Vec<Value>) -> std::result::Result<Value, InteropError> + Send + Sync + 'static,
    {
        self.constructors.insert(type_name.to_string(), Box::new(f));
    }

    /// Registers a method for receivers of `type_name`
    pub fn method<F>(&self, type_name: &str, method: &str, f: F)
    where
        F: Fn(&Value, Vec<Value>) -> std::result::Result<Value, InteropError>
            + Send
            + Sync
            + 'static,
    {
        self.methods
            .entry(type_name.to_string())
            .or_default()
            .insert(method.to_string(), Box::new(f));
    }

    fn knows(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name) || self.methods.contains_key(type_name)
    }
}

impl HostBridge for HostRegistry {
    fn construct(&self, type_name: &str, args: Vec<Value>) -> std::result::Result<Value, InteropError> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| InteropError::UnknownType(type_name.to_string()))?;
        constructor.value()(args)
    }

    fn invoke(
        &self,
        target: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> std::result::Result<Value, InteropError> {
        let type_name = match target {
            Value::Foreign(obj) => match obj.as_any().downcast_ref::<HostClass>() {
                Some(class) => class.name().to_string(),
                None => obj.type_name().to_string(),
            },
            other => other.type_name().to_string(),
        };

        let methods = self
            .methods
            .get(&type_name)
            .ok_or_else(|| InteropError::UnknownType(type_name.clone()))?;
        let f = methods.get(method).ok_or_else(|| InteropError::NoSuchMethod {
            type_name: type_name.clone(),
            method: method.to_string(),
        })?;
        f(target, args)
    }

    fn class_of(&self, type_name: &str) -> std::result::Result<Value, InteropError> {
        if !self.knows(type_name) {
            return Err(InteropError::UnknownType(type_name.to_string()));
        }
        Ok(Value::Foreign(Arc::new(HostClass {
            name: type_name.to_string(),
        })))
    }
}

/// Which bridge operation an interop function performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteropOp {
    /// `[construct type args...]`
    Construct,
    /// `[invoke target method args...]`
    Invoke,
    /// `[classOf type]`
    ClassOf,
}

/// Interop function: forwards evaluated arguments to a bridge
pub struct InteropCall {
    bridge: Arc<dyn HostBridge>,
    op: InteropOp,
}

impl InteropCall {
    /// Binds `op` to `bridge`
    pub fn new(bridge: Arc<dyn HostBridge>, op: InteropOp) -> Self {
        InteropCall { bridge, op }
    }

    /// Registered name of the operation
    pub fn name(&self) -> &'static str {
        match self.op {
            InteropOp::Construct => "construct",
            InteropOp::Invoke => "invoke",
            InteropOp::ClassOf => "classOf",
        }
    }

    /// Evaluates the arguments and performs the call
    ///
    /// List and iterator arguments after the leading ones are spread into
    /// individual host arguments.
    pub fn apply(&self, mut args: Args) -> Result<Value> {
        let name = self.name();
        match self.op {
            InteropOp::Construct => {
                let target = args.require(name, "type name or class")?;
                let type_name = match &target {
                    Value::Foreign(obj) => match obj.as_any().downcast_ref::<HostClass>() {
                        Some(class) => class.name().to_string(),
                        None => obj.type_name().to_string(),
                    },
                    other => other.to_text(),
                };
                let rest = spread(args)?;
                Ok(self.bridge.construct(&type_name, rest)?)
            }
            InteropOp::Invoke => {
                let target = args.require(name, "target")?;
                let method = args.require(name, "method name")?.to_text();
                let rest = spread(args)?;
                Ok(self.bridge.invoke(&target, &method, rest)?)
            }
            InteropOp::ClassOf => {
                let type_name = args.require(name, "type name")?.to_text();
                Ok(self.bridge.class_of(&type_name)?)
            }
        }
    }
}

fn spread(args: Args) -> Result<Vec<Value>> {
    FlattenValues::one_level(Box::new(args)).collect()
}

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::parallel::WorkerPool;
use crate::runtime::{Function, LazyIter, Session, Value};

/// Chained scope for variable bindings and registered functions
///
/// Cloning a `Context` yields another handle to the same scope. Lookups walk
/// from this scope towards the root; `set` and `register` only ever write
/// the local scope, which gives lexical shadowing.
#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
}

struct Node {
    parent: Option<Context>,
    session: Arc<Session>,
    bindings: RwLock<HashMap<String, Value>>,
    functions: RwLock<HashMap<String, Function>>,
    /// Argument stream of the user function running in this scope
    arguments: Mutex<Option<LazyIter>>,
}

impl Context {
    /// Creates a root scope (no parent)
    pub fn root(session: Arc<Session>) -> Self {
        Context {
            node: Arc::new(Node {
                parent: None,
                session,
                bindings: RwLock::new(HashMap::new()),
                functions: RwLock::new(HashMap::new()),
                arguments: Mutex::new(None),
            }),
        }
    }

    /// Creates a new scope whose parent is `self`
    pub fn child(&self) -> Self {
        Context {
            node: Arc::new(Node {
                parent: Some(self.clone()),
                session: Arc::clone(&self.node.session),
                bindings: RwLock::new(HashMap::new()),
                functions: RwLock::new(HashMap::new()),
                arguments: Mutex::new(None),
            }),
        }
    }

    /// Parent scope, `None` for the root
    pub fn parent(&self) -> Option<&Context> {
        self.node.parent.as_ref()
    }

    /// Walks this scope and its ancestors, nearest first
    fn ancestry(&self) -> impl Iterator<Item = &Context> {
        std::iter::successors(Some(self), |ctx| ctx.parent())
    }

    // Variables

    /// Looks up a binding in this scope or the nearest ancestor that has it
    pub fn get(&self, key: &str) -> Option<Value> {
        self.ancestry()
            .find_map(|ctx| ctx.node.bindings.read().get(key).cloned())
    }

    /// True if `key` is bound here or in any ancestor
    pub fn contains_key(&self, key: &str) -> bool {
        self.ancestry()
            .any(|ctx| ctx.node.bindings.read().contains_key(key))
    }

    /// Binds `key` in this scope, shadowing any ancestor binding
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.node.bindings.write().insert(key.into(), value);
    }

    /// Rebinds `key` in the nearest scope that has it, or here if none does
    pub fn update(&self, key: &str, value: Value) {
        for ctx in self.ancestry() {
            let mut bindings = ctx.node.bindings.write();
            if let Some(slot) = bindings.get_mut(key) {
                *slot = value;
                return;
            }
        }
        self.set(key, value);
    }

    // Functions

    /// Installs or replaces a function in this scope's registry
    pub fn register(&self, name: impl Into<String>, function: Function) {
        self.node.functions.write().insert(name.into(), function);
    }

    /// Resolves a function name against this scope and its ancestors
    pub fn function(&self, name: &str) -> Option<Function> {
        self.ancestry()
            .find_map(|ctx| ctx.node.functions.read().get(name).cloned())
    }

    /// Every function name visible from this scope, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ancestry()
            .flat_map(|ctx| {
                ctx.node
                    .functions
                    .read()
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Turns a function value, or the name of a registered function, into a function
    pub fn resolve_function(&self, value: &Value) -> Result<Function> {
        match value {
            Value::Function(f) => Ok(f.clone()),
            Value::String(name) => self.function(name).ok_or_else(|| Error::UnknownFunction {
                name: name.clone(),
            }),
            other => Err(Error::type_error("function", other.type_name())),
        }
    }

    // Arguments of user-defined functions

    /// Attaches the argument stream of the function call running in this scope
    pub fn set_arguments(&self, arguments: LazyIter) {
        *self.node.arguments.lock() = Some(arguments);
    }

    /// Argument stream of the innermost enclosing function call
    pub fn arguments(&self) -> Option<LazyIter> {
        self.ancestry()
            .find_map(|ctx| ctx.node.arguments.lock().clone())
    }

    // Shared state

    /// Session shared by every scope of one evaluator
    pub fn session(&self) -> &Arc<Session> {
        &self.node.session
    }

    /// Worker pool for background evaluation
    pub fn pool(&self) -> &WorkerPool {
        self.node.session.pool()
    }

    /// True if both handles refer to the same scope
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Drops every binding, function and argument stream of this scope
    ///
    /// Closures stored in a scope keep that scope alive; clearing it lets the
    /// reference cycle unwind.
    pub(crate) fn clear(&self) {
        self.node.bindings.write().clear();
        self.node.functions.write().clear();
        self.node.arguments.lock().take();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.node.bindings.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("bindings", &keys)
            .field("functions", &self.node.functions.read().len())
            .field("depth", &(self.ancestry().count() - 1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Context {
        Context::root(Session::shared())
    }

    #[test]
    fn test_child_sees_parent() {
        let parent = root();
        parent.set("x", Value::Int(1));
        let child = parent.child().child();
        assert_eq!(child.get("x"), Some(Value::Int(1)));
        assert!(child.contains_key("x"));
    }

    #[test]
    fn test_set_shadows_locally() {
        let parent = root();
        parent.set("x", Value::Int(1));
        let child = parent.child();
        child.set("x", Value::Int(2));

        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(parent.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_siblings_are_isolated() {
        let parent = root();
        let a = parent.child();
        let b = parent.child();
        a.set("y", Value::Int(5));

        assert_eq!(a.get("y"), Some(Value::Int(5)));
        assert_eq!(b.get("y"), None);
        assert!(!b.contains_key("y"));
    }

    #[test]
    fn test_update_rewrites_nearest_binding() {
        let parent = root();
        parent.set("n", Value::Int(1));
        let child = parent.child();
        child.update("n", Value::Int(2));
        assert_eq!(parent.get("n"), Some(Value::Int(2)));

        child.update("fresh", Value::Int(3));
        assert_eq!(child.get("fresh"), Some(Value::Int(3)));
        assert_eq!(parent.get("fresh"), None);
    }

    #[test]
    fn test_function_lookup_walks_parents() {
        let parent = root();
        parent.register("f", Function::native("f", |_, _| Ok(Value::Int(1))));
        let child = parent.child();
        child.register("g", Function::native("g", |_, _| Ok(Value::Int(2))));

        assert!(child.function("f").is_some());
        assert!(parent.function("g").is_none());
        assert_eq!(child.function_names(), vec!["f".to_string(), "g".to_string()]);
    }

    #[test]
    fn test_arguments_come_from_enclosing_call() {
        let call = root().child();
        call.set_arguments(LazyIter::from_values(vec![Value::Int(7)]));
        let inner = call.child();

        let mut args = inner.arguments().unwrap();
        assert_eq!(args.next().unwrap().unwrap(), Value::Int(7));
        assert!(call.parent().unwrap().arguments().is_none());
    }
}

//! Function packages
//!
//! A package is a named bundle of functions. Every evaluator knows the
//! default packages by name; `[import name]` installs one into the calling
//! context's registry, optionally under a `prefix.` namespace.

mod base;
mod boolean;
mod casting;
mod concurrent;
mod dict;
mod functional;
mod interop;
mod iterator;
mod log;
mod math;
mod string;

pub use base::BasePackage;
pub use boolean::BooleanPackage;
pub use casting::CastingPackage;
pub use concurrent::ConcurrentPackage;
pub use dict::DictPackage;
pub use functional::FunctionalPackage;
pub use interop::InteropPackage;
pub use iterator::IteratorPackage;
pub use log::LogPackage;
pub use math::MathPackage;
pub use string::StringPackage;

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::{Args, Context, Function, Value, ValueIter};

/// Packages imported into every evaluator built with `Evaluator::new`, in order
pub const DEFAULT_IMPORTS: [&str; 10] = [
    "base",
    "boolean",
    "functional",
    "iterator",
    "string",
    "casting",
    "dict",
    "math",
    "concurrent",
    "log",
];

/// Named bundle of functions
pub trait Package: Send + Sync {
    /// Name used by `import`
    fn name(&self) -> &str;

    /// Namespace applied when the importer does not give one
    fn default_prefix(&self) -> Option<&str> {
        None
    }

    /// Registers the package's functions
    fn install(&self, installer: &mut Installer);
}

/// Registers functions into a context, applying a name prefix
pub struct Installer {
    context: Context,
    prefix: Option<String>,
    installed: usize,
}

impl Installer {
    /// Installer writing into `context`; names become `prefix.name` when a prefix is set
    pub fn new(context: Context, prefix: Option<String>) -> Self {
        Installer {
            context,
            prefix,
            installed: 0,
        }
    }

    /// Full registry name for `name`
    pub fn qualify(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.to_string(),
        }
    }

    /// Registers an existing function value
    pub fn add(&mut self, name: &str, function: Function) {
        let name = self.qualify(name);
        self.context.register(name, function);
        self.installed += 1;
    }

    /// Registers a Rust closure with help text
    pub fn native<F>(&mut self, name: &str, help: &str, body: F)
    where
        F: Fn(Args, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        let qualified = self.qualify(name);
        self.add(name, Function::with_help(qualified, help, body));
    }

    /// Context receiving the functions
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Number of functions registered so far
    pub fn installed(&self) -> usize {
        self.installed
    }
}

/// Every package an evaluator knows by default
pub fn defaults() -> Vec<Arc<dyn Package>> {
    vec![
        Arc::new(BasePackage),
        Arc::new(BooleanPackage),
        Arc::new(FunctionalPackage),
        Arc::new(IteratorPackage),
        Arc::new(StringPackage),
        Arc::new(CastingPackage),
        Arc::new(DictPackage),
        Arc::new(MathPackage),
        Arc::new(ConcurrentPackage),
        Arc::new(LogPackage),
    ]
}

/// Installs the package registered as `name` into `context`
///
/// `prefix` overrides the package's default prefix.
pub fn import_into(context: &Context, name: &str, prefix: Option<&str>) -> Result<()> {
    let package = context
        .session()
        .package(name)
        .ok_or_else(|| Error::runtime(format!("No package {}", name)))?;

    let prefix = prefix
        .or_else(|| package.default_prefix())
        .map(str::to_string);
    let mut installer = Installer::new(context.clone(), prefix);
    package.install(&mut installer);

    debug!(
        package = name,
        functions = installer.installed(),
        "package imported"
    );
    Ok(())
}

/// Iterator over a list or lazy sequence argument of `function`
pub(crate) fn iterable(function: &str, value: &Value) -> Result<ValueIter> {
    value.iterate().ok_or_else(|| {
        Error::arity(
            function,
            format!("expected a list or iterator, got {}", value.type_name()),
        )
    })
}

/// `[import name...]` / `[import [list name prefix]]`
///
/// Returns `OK`, or one line per package that could not be imported.
pub(crate) fn import_function(args: Args, ctx: &Context) -> Result<Value> {
    let mut errors = Vec::new();
    for request in args {
        let request = request?;
        let outcome = match &request {
            Value::List(parts) => match parts.as_slice() {
                [name] => import_into(ctx, &name.to_text(), None),
                [name, prefix] => import_into(ctx, &name.to_text(), Some(&prefix.to_text())),
                _ => Err(Error::arity("import", "expected [list name prefix]")),
            },
            other => import_into(ctx, &other.to_text(), None),
        };
        if let Err(e) = outcome {
            errors.push(e.to_string());
        }
    }

    if errors.is_empty() {
        Ok(Value::from("OK"))
    } else {
        Ok(Value::from(errors.join("\n")))
    }
}

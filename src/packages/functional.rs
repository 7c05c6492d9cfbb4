//! Higher-order functions: partial application, composition, mapping and folding

use crate::error::{Error, Result};
use crate::iterators::FlattenValues;
use crate::packages::{iterable, Installer, Package};
use crate::runtime::{Args, Context, Function, Value};

/// `curry`, `compose`, `map`, `filter`, `fold`, `foldLeft`, `callFlattened`, `pipeline`
pub struct FunctionalPackage;

impl Package for FunctionalPackage {
    fn name(&self) -> &str {
        "functional"
    }

    fn install(&self, installer: &mut Installer) {
        installer.native("curry", CURRY_HELP, curry);
        installer.native(
            "compose",
            "[compose f g h] returns a function computing f(g(h(args))).",
            |args, ctx| {
                let mut stages = stage_functions("compose", args, ctx)?;
                stages.reverse();
                Ok(Value::Function(Function::pipeline(stages)))
            },
        );
        installer.native(
            "pipeline",
            "[pipeline f | g | h] returns a function computing h(g(f(args))). `|` and `=>` are ignored.",
            |args, ctx| {
                let stages = stage_functions("pipeline", args, ctx)?;
                Ok(Value::Function(Function::pipeline(stages)))
            },
        );
        installer.native(
            "map",
            "[map f iterable] lazily applies f to every element.",
            |mut args, ctx| {
                let f = args.require("map", "function")?;
                let f = ctx.resolve_function(&f)?;
                if !args.has_next() {
                    return Err(Error::arity("map", "requires a second argument"));
                }
                let ctx = ctx.clone();
                Ok(Value::iter(
                    FlattenValues::one_level(Box::new(args))
                        .map(move |item| item.and_then(|v| f.call(vec![v], &ctx))),
                ))
            },
        );
        installer.native(
            "filter",
            "[filter predicate iterable] lazily keeps the elements the predicate accepts.",
            |mut args, ctx| {
                let predicate = args.require("filter", "predicate")?;
                let predicate = ctx.resolve_function(&predicate)?;
                if !args.has_next() {
                    return Err(Error::arity("filter", "requires a second argument"));
                }
                let ctx = ctx.clone();
                Ok(Value::iter(FlattenValues::one_level(Box::new(args)).filter_map(
                    move |item| {
                        let keep = item.and_then(|v| {
                            let keep = predicate.call(vec![v.clone()], &ctx)?.is_truthy();
                            Ok((keep, v))
                        });
                        match keep {
                            Ok((true, v)) => Some(Ok(v)),
                            Ok((false, _)) => None,
                            Err(e) => Some(Err(e)),
                        }
                    },
                )))
            },
        );
        installer.native("fold", FOLD_HELP, |args, ctx| fold("fold", args, ctx));
        installer.native("foldLeft", FOLD_HELP, |args, ctx| fold("foldLeft", args, ctx));
        installer.add("callFlattened", call_flattened());
    }
}

const CURRY_HELP: &str = "Return a curried function.

The first argument is a function or the name of one. The remaining arguments
are evaluated now and passed first on every call, followed by the call's own
arguments.

    [map [curry add 3] [list 4 5]]

returns an iterator over 7, 8.";

const FOLD_HELP: &str = "[fold f initial iterable] threads an accumulator through f from left to right.";

fn curry(mut args: Args, ctx: &Context) -> Result<Value> {
    let target = args.require("curry", "function")?;
    let target = ctx.resolve_function(&target)?;
    let prefix = args.collect_values()?;
    Ok(Value::Function(Function::curry(target, prefix)))
}

fn fold(name: &str, mut args: Args, ctx: &Context) -> Result<Value> {
    let f = args.require(name, "function")?;
    let f = ctx.resolve_function(&f)?;
    let mut acc = args.require(name, "initial value")?;
    let sequence = match args.optional()? {
        Some(sequence) => sequence,
        None => return Err(Error::arity(name, "requires a third argument that is iterable")),
    };
    for item in iterable(name, &sequence)? {
        acc = f.call(vec![acc, item?], ctx)?;
    }
    Ok(acc)
}

fn stage_functions(name: &str, args: Args, ctx: &Context) -> Result<Vec<Function>> {
    let mut stages = Vec::new();
    for stage in args {
        match stage? {
            Value::String(s) if s == "|" || s == "=>" => {}
            Value::Function(f) => stages.push(f),
            Value::String(s) => stages.push(ctx.function(&s).ok_or_else(|| {
                Error::arity(name, format!("no such function: {}", s))
            })?),
            other => {
                return Err(Error::arity(
                    name,
                    format!("argument must be a function, got {}", other.type_name()),
                ))
            }
        }
    }
    Ok(stages)
}

/// `[callFlattened f args...]`: calls `f` with every nested list or iterator
/// argument spliced into one flat argument stream
pub(crate) fn call_flattened() -> Function {
    Function::with_help(
        "callFlattened",
        "[callFlattened f a [list b [list c]]] calls f with a, b and c.",
        |mut args, ctx| {
            let f = args.require("callFlattened", "function")?;
            let f = ctx.resolve_function(&f)?;
            let flat = FlattenValues::deep(Box::new(args));
            f.apply(Args::from_iter(Box::new(flat)), ctx)
        },
    )
}

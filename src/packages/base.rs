//! Core functions: control flow, variables, lists, user functions and introspection

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::iterators::FlattenValues;
use crate::packages::casting::{cast, to_bool, to_float, to_int, to_string};
use crate::packages::{import_function, iterable, Installer, Package};
use crate::parser::{Expression, ExpressionParser};
use crate::runtime::{evaluate, Args, Context, Function, LazyIter, Value};

/// Functions every evaluator starts with
pub struct BasePackage;

impl Package for BasePackage {
    fn name(&self) -> &str {
        "base"
    }

    fn install(&self, installer: &mut Installer) {
        install_control(installer);
        install_variables(installer);
        install_lists(installer);
        install_functions(installer);
        install_output(installer);
        install_casts(installer);

        installer.native("import", IMPORT_HELP, import_function);
        installer.native("evalFile", EVAL_FILE_HELP, eval_file);
        installer.native("help", HELP_HELP, help);
        installer.native("version", "Version of this evaluator.", |_, _| {
            Ok(Value::from(crate::VERSION))
        });
        installer.native("nop", "Do nothing; arguments are not evaluated.", |_, _| {
            Ok(Value::Null)
        });
    }
}

const IMPORT_HELP: &str = "Import packages into the current context.

    [import math]
    [import [list dict d]]

The second form installs every function as `d.name`. Returns OK, or one line
per package that could not be imported.";

const EVAL_FILE_HELP: &str = "Evaluate every expression in a file in the calling context.

    [evalFile lib/strings.itrml]

Definitions made by the file stay visible to the caller. Returns the value of
the last expression.";

const HELP_HELP: &str = "Print help for the named functions; `verbose` or `-v` adds headings.";

fn install_control(installer: &mut Installer) {
    installer.native(
        "if",
        "[if predicate then else] evaluates only the branch it takes.",
        |mut args, _| {
            let predicate = args.require("if", "predicate")?;
            if !args.has_next() {
                return Err(Error::arity("if", "requires 3 arguments"));
            }
            if predicate.is_truthy() {
                let value = args.require("if", "then branch")?;
                if !args.has_next() {
                    return Err(Error::arity("if", "requires 3 arguments"));
                }
                Ok(value)
            } else {
                args.skip_next();
                args.require("if", "else branch")
            }
        },
    );

    installer.native(
        "let",
        "Evaluate every argument in a new child scope and return the last value.\n\n    [let [set a 1] [set b 2] [add [get a] [get b]]]",
        |mut args, ctx| {
            let scope = ctx.child();
            let mut last = Value::Null;
            while let Some(value) = args.next_in(&scope) {
                last = value?;
            }
            Ok(last)
        },
    );

    installer.native(
        "for",
        "[for name iterable body] evaluates body once per element with name bound to it.",
        |mut args, ctx| {
            let name = args.require("for", "variable name")?.to_text();
            let sequence = args.require("for", "iterable")?;
            let sequence = iterable("for", &sequence)?;
            let body = match args.next_unevaluated() {
                Some(body) => body?,
                None => return Err(Error::arity("for", "missing body")),
            };

            let scope = ctx.child();
            let mut last = Value::Null;
            for item in sequence {
                scope.set(name.as_str(), item?);
                last = evaluate(&body, &scope)?;
            }
            Ok(last)
        },
    );

    installer.native(
        "range",
        "[range stop], [range start stop] or [range start stop step]; a lazy sequence of integers.",
        |args, _| {
            let bounds = args
                .map(|v| v.and_then(|v| v.as_int()))
                .collect::<Result<Vec<i64>>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [] => return Ok(Value::Iter(LazyIter::empty())),
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step, ..] => (*start, *stop, *step),
            };
            if step == 0 {
                return Err(Error::arity("range", "step must not be zero"));
            }
            Ok(range(start, stop, step))
        },
    );

    installer.native(
        "case",
        "[case predicate value] is [true value] when predicate holds, else [false null] without evaluating value.",
        |mut args, _| {
            let predicate = args.require("case", "predicate")?;
            if predicate.is_truthy() {
                let value = args.optional()?.unwrap_or(Value::Null);
                Ok(Value::list(vec![Value::Bool(true), value]))
            } else {
                args.skip_next();
                Ok(Value::list(vec![Value::Bool(false), Value::Null]))
            }
        },
    );

    installer.native(
        "defaultCase",
        "[defaultCase value] is a case that always matches.",
        |mut args, _| {
            let value = args.optional()?.unwrap_or(Value::Null);
            Ok(Value::list(vec![Value::Bool(true), value]))
        },
    );

    installer.native(
        "caseList",
        "Return the value of the first matching case.\n\n    [caseList [case [eq 1 2] a] [case [eq 1 1] b] [defaultCase c]]",
        |args, _| case_list(args),
    );
}

fn install_variables(installer: &mut Installer) {
    installer.native("get", "[get name] reads a variable.", |mut args, ctx| {
        let name = args.require("get", "variable name")?.to_text();
        ctx.get(&name)
            .ok_or(Error::UndefinedVariable { name })
    });

    installer.native(
        "set",
        "[set name value] binds a variable in the current scope and returns the value.",
        |mut args, ctx| {
            let name = args.require("set", "variable name")?.to_text();
            let value = args.require("set", "value")?;
            ctx.set(name, value.clone());
            Ok(value)
        },
    );

    installer.native(
        "update",
        "[update name value] rebinds the nearest existing variable, or binds it here.",
        |mut args, ctx| {
            let name = args.require("update", "variable name")?.to_text();
            let value = args.require("update", "value")?;
            ctx.update(&name, value.clone());
            Ok(value)
        },
    );
}

fn install_lists(installer: &mut Installer) {
    installer.native("last", "Evaluate every argument and return the last.", |args, _| {
        let mut last = Value::Null;
        for value in args {
            last = value?;
        }
        Ok(last)
    });

    installer.native("list", "Collect the arguments into a list.", |args, _| {
        Ok(Value::list(args.collect_values()?))
    });

    installer.native(
        "dict",
        "[dict k1 v1 k2 v2 ...] builds a dictionary; a trailing key maps to null.",
        |args, _| {
            let mut entries = BTreeMap::new();
            let mut values = args;
            while let Some(key) = values.optional()? {
                let value = values.optional()?.unwrap_or(Value::Null);
                entries.insert(key.to_text(), value);
            }
            Ok(Value::dict(entries))
        },
    );

    installer.native(
        "listFlatten",
        "Collect the arguments into one list, splicing lists and iterators.",
        |args, _| {
            let flat = FlattenValues::one_level(Box::new(args)).collect::<Result<Vec<_>>>()?;
            Ok(Value::list(flat))
        },
    );

    installer.native("head", "First element of a list or iterator.", |mut args, _| {
        let sequence = args.require("head", "iterable")?;
        match iterable("head", &sequence)?.next() {
            Some(value) => value,
            None => Err(Error::NoMoreElements),
        }
    });

    installer.native(
        "tail",
        "Everything but the first element; an iterator loses its first element.",
        |mut args, _| {
            let sequence = args.require("tail", "iterable")?;
            match &sequence {
                Value::List(items) => Ok(Value::list(items.iter().skip(1).cloned().collect())),
                Value::Iter(iter) => {
                    let mut rest = iter.clone();
                    if let Some(Err(e)) = rest.next() {
                        return Err(e);
                    }
                    Ok(Value::Iter(rest))
                }
                other => Err(Error::arity(
                    "tail",
                    format!("expected a list or iterator, got {}", other.type_name()),
                )),
            }
        },
    );
}

fn install_functions(installer: &mut Installer) {
    installer.native(
        "function",
        "[function body] returns a function evaluating body; read its arguments with arg/args.",
        |mut args, ctx| {
            let body = unevaluated_body("function", &mut args)?;
            Ok(Value::Function(Function::closure(body, ctx.clone())))
        },
    );

    installer.native(
        "fn",
        "[fn name body] defines and registers a function; [fn name] looks one up.",
        |mut args, ctx| {
            let name = args.require("fn", "function name")?.to_text();
            if args.has_next() {
                let body = unevaluated_body("fn", &mut args)?;
                let function = Function::closure(body, ctx.clone());
                ctx.register(name, function.clone());
                Ok(Value::Function(function))
            } else {
                ctx.function(&name)
                    .map(Value::Function)
                    .ok_or(Error::UnknownFunction { name })
            }
        },
    );

    installer.native(
        "register",
        "[register name function] installs a function value under name.",
        |mut args, ctx| {
            let name = args.require("register", "function name")?.to_text();
            let function = args.require("register", "function")?;
            let function = ctx.resolve_function(&function)?;
            ctx.register(name, function.clone());
            Ok(Value::Function(function))
        },
    );

    installer.native("arg", "Next argument of the enclosing function call.", |_, ctx| {
        match call_arguments("arg", ctx)?.next() {
            Some(value) => value,
            None => Err(Error::NoMoreElements),
        }
    });

    installer.native(
        "args",
        "Remaining arguments of the enclosing function call, as an iterator.",
        |_, ctx| Ok(Value::Iter(ctx.arguments().unwrap_or_else(LazyIter::empty))),
    );

    installer.native(
        "hasArg",
        "True if the enclosing function call has another argument.",
        |_, ctx| {
            Ok(Value::Bool(
                ctx.arguments().map_or(false, |arguments| arguments.has_next()),
            ))
        },
    );

    installer.native(
        "nameArgs",
        "[nameArgs a b] binds the next call arguments to a and b.",
        |args, ctx| {
            let mut arguments = call_arguments("nameArgs", ctx)?;
            for name in args {
                let name = name?.to_text();
                match arguments.next() {
                    Some(value) => ctx.set(name, value?),
                    None => break,
                }
            }
            Ok(Value::Null)
        },
    );

    installer.native(
        "hashArgs",
        "Bind every `key:value` argument as a variable; the rest become the new argument stream.",
        |args, ctx| {
            let mut unconsumed = Vec::new();
            for value in FlattenValues::one_level(Box::new(args)) {
                let value = value?;
                let pair = match &value {
                    Value::String(s) => s
                        .split_once(':')
                        .map(|(k, v)| (k.to_string(), v.to_string())),
                    _ => None,
                };
                match pair {
                    Some((key, val)) => ctx.set(key, Value::String(val)),
                    None if value == Value::Null => {}
                    None => unconsumed.push(value),
                }
            }
            let rest = LazyIter::from_values(unconsumed);
            ctx.set_arguments(rest.clone());
            Ok(Value::Iter(rest))
        },
    );
}

fn install_output(installer: &mut Installer) {
    installer.native(
        "print",
        "Print every argument with its type to stdout; returns the arguments.",
        |args, _| print_args(args, false),
    );
    installer.native(
        "printErr",
        "Print every argument with its type to stderr; returns the arguments.",
        |args, _| print_args(args, true),
    );
    installer.native(
        "trace",
        "[trace f args...] prints the call, then calls f.",
        |mut args, ctx| {
            let target = match args.optional()? {
                Some(target) => target,
                None => return Ok(Value::Null),
            };
            let function = ctx.resolve_function(&target)?;
            let values = args.collect_values()?;

            let mut line = format!("[ {}", target);
            for value in &values {
                line.push(' ');
                line.push_str(&value.to_string());
            }
            line.push_str(" ]");
            println!("{}", line);

            function.call(values, ctx)
        },
    );
}

fn install_casts(installer: &mut Installer) {
    installer.native("string", "Convert to a string.", |args, _| {
        cast("string", args, to_string)
    });
    installer.native("int", "Convert to an integer.", |args, _| {
        cast("int", args, to_int)
    });
    installer.native("long", "Convert to an integer.", |args, _| {
        cast("long", args, to_int)
    });
    installer.native("float", "Convert to a float.", |args, _| {
        cast("float", args, to_float)
    });
    installer.native("double", "Convert to a float.", |args, _| {
        cast("double", args, to_float)
    });
    installer.native("boolean", "Convert to a boolean.", |args, _| {
        cast("boolean", args, to_bool)
    });
}

fn unevaluated_body(function: &str, args: &mut Args) -> Result<Expression> {
    match args.next_unevaluated() {
        Some(body) => body,
        None => Err(Error::arity(function, "missing body")),
    }
}

fn call_arguments(function: &str, ctx: &Context) -> Result<LazyIter> {
    ctx.arguments()
        .ok_or_else(|| Error::arity(function, "not inside a function call"))
}

fn range(start: i64, stop: i64, step: i64) -> Value {
    let mut next = Some(start);
    Value::iter(std::iter::from_fn(move || {
        let current = next?;
        let more = if step > 0 {
            current < stop
        } else {
            current > stop
        };
        if !more {
            next = None;
            return None;
        }
        next = current.checked_add(step);
        Some(Ok(Value::Int(current)))
    }))
}

fn case_list(args: Args) -> Result<Value> {
    for case in args {
        let case = case?;
        match case.iterate() {
            None => {
                if case.is_truthy() {
                    return Ok(case);
                }
            }
            Some(mut parts) => {
                let matched = match parts.next() {
                    Some(flag) => flag?.is_truthy(),
                    None => false,
                };
                if matched {
                    return parts.next().unwrap_or(Ok(Value::Bool(true)));
                }
            }
        }
    }
    Ok(Value::Null)
}

fn print_args(args: Args, to_stderr: bool) -> Result<Value> {
    let values = args.collect_values()?;
    for value in &values {
        let line = format!("{}:{}", value, value.type_name());
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
    Ok(Value::list(values))
}

fn eval_file(mut args: Args, ctx: &Context) -> Result<Value> {
    let path = args.require("evalFile", "path")?.to_text();
    let source = std::fs::read_to_string(&path)
        .map_err(|e| Error::Io(format!("Loading {}: {}", path, e)))?;
    debug!(path = %path, "evaluating file");

    let mut last = Value::Null;
    for expr in ExpressionParser::from_source(&source)?.parse_all()? {
        last = evaluate(&expr, ctx)?;
    }
    Ok(last)
}

fn help(args: Args, ctx: &Context) -> Result<Value> {
    let mut verbose = false;
    let mut out = String::new();
    let mut asked = false;

    for target in args {
        let target = target?;
        if let Value::String(flag) = &target {
            if flag == "verbose" || flag == "-v" {
                verbose = true;
                continue;
            }
        }
        asked = true;

        let (name, function) = match &target {
            Value::Function(f) => (f.name(), Some(f.clone())),
            other => (other.to_text(), ctx.function(&other.to_text())),
        };
        match function.and_then(|f| f.help()) {
            Some(text) => {
                if verbose {
                    out.push_str(&format!("## {}\n\n", name));
                }
                out.push_str(&text);
                out.push('\n');
            }
            None => out.push_str(&format!("No help for function {}.\n", name)),
        }
    }

    if !asked {
        out = ctx.function_names().join("\n");
    }
    Ok(Value::String(out))
}

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::LunariaResult;
use crate::compiler::{Compiler, Handler};
use crate::error::{CompileError, Error, NameKind};
use crate::helpers::is_valid_identifier;
use crate::node::Node;

mod control_flow;
mod data;
mod function;
mod io;
mod utility;
mod variable;

type HandlerFn = fn(&Node, &mut Compiler) -> LunariaResult;

const BUILTINS: &[(&str, HandlerFn)] = &[
    ("set", variable::set),
    ("if", control_flow::if_),
    ("elseif", control_flow::elseif),
    ("else", control_flow::else_),
    ("for", control_flow::for_),
    ("while", control_flow::while_),
    ("repeat", control_flow::repeat),
    ("break", control_flow::break_),
    ("function", function::function),
    ("call", function::call),
    ("return", function::return_),
    ("arg", consumed_by_parent),
    ("table", data::table),
    ("entry", consumed_by_parent),
    ("array", data::array),
    ("item", consumed_by_parent),
    ("print", io::print),
    ("warn", io::warn),
    ("error", io::error),
    ("raw", utility::raw),
    ("comment", utility::comment),
    ("assert", utility::assert),
    ("typeof", utility::typeof_),
];

/// Handlers every new [`Compiler`] starts from.
pub static BUILTIN_HANDLERS: LazyLock<FxHashMap<SmolStr, Handler>> = LazyLock::new(|| {
    let mut map = FxHashMap::default();

    for &(tag, handler) in BUILTINS {
        map.insert(SmolStr::new_static(tag), Arc::new(handler) as Handler);
    }

    map
});

#[derive(Clone, Debug)]
pub struct BuiltinHandlerDoc {
    pub description: &'static str,
    pub attributes: &'static [&'static str],
}

pub static BUILTIN_HANDLER_DOC: LazyLock<FxHashMap<SmolStr, BuiltinHandlerDoc>> =
    LazyLock::new(|| {
        let mut map = FxHashMap::default();

        map.insert(
            SmolStr::new_static("set"),
            BuiltinHandlerDoc {
                description: "Assigns the content expression to a variable.",
                attributes: &["var", "local"],
            },
        );
        map.insert(
            SmolStr::new_static("if"),
            BuiltinHandlerDoc {
                description: "Runs the body when the test expression is truthy.",
                attributes: &["test"],
            },
        );
        map.insert(
            SmolStr::new_static("elseif"),
            BuiltinHandlerDoc {
                description: "Adds an alternative branch. Must be placed inside an <if> body.",
                attributes: &["test"],
            },
        );
        map.insert(
            SmolStr::new_static("else"),
            BuiltinHandlerDoc {
                description: "Adds the fallback branch. Must be placed inside an <if> body.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("for"),
            BuiltinHandlerDoc {
                description: "Numeric loop with from/to/step, or generic loop over an iterator with in.",
                attributes: &["var", "from", "to", "step", "in"],
            },
        );
        map.insert(
            SmolStr::new_static("while"),
            BuiltinHandlerDoc {
                description: "Repeats the body while the test expression is truthy.",
                attributes: &["test"],
            },
        );
        map.insert(
            SmolStr::new_static("repeat"),
            BuiltinHandlerDoc {
                description: "Runs the body until the until expression becomes truthy.",
                attributes: &["until"],
            },
        );
        map.insert(
            SmolStr::new_static("break"),
            BuiltinHandlerDoc {
                description: "Exits the innermost loop.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("function"),
            BuiltinHandlerDoc {
                description: "Defines a function with the children as its body.",
                attributes: &["name", "params", "local"],
            },
        );
        map.insert(
            SmolStr::new_static("call"),
            BuiltinHandlerDoc {
                description: "Calls a function with the content and <arg> children as arguments.",
                attributes: &["name"],
            },
        );
        map.insert(
            SmolStr::new_static("return"),
            BuiltinHandlerDoc {
                description: "Returns from the enclosing function, optionally with the content as value.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("arg"),
            BuiltinHandlerDoc {
                description: "One argument of the enclosing <call>.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("table"),
            BuiltinHandlerDoc {
                description: "Table constructor built from <entry> children.",
                attributes: &["var", "local"],
            },
        );
        map.insert(
            SmolStr::new_static("entry"),
            BuiltinHandlerDoc {
                description: "One key/value field of the enclosing <table>.",
                attributes: &["key"],
            },
        );
        map.insert(
            SmolStr::new_static("array"),
            BuiltinHandlerDoc {
                description: "Array constructor built from the content and <item> children.",
                attributes: &["var", "local"],
            },
        );
        map.insert(
            SmolStr::new_static("item"),
            BuiltinHandlerDoc {
                description: "One element of the enclosing <array>.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("print"),
            BuiltinHandlerDoc {
                description: "Prints the content. {{expr}} placeholders are interpolated.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("warn"),
            BuiltinHandlerDoc {
                description: "Emits a warning with the content. {{expr}} placeholders are interpolated.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("error"),
            BuiltinHandlerDoc {
                description: "Raises an error with the content. {{expr}} placeholders are interpolated.",
                attributes: &["level"],
            },
        );
        map.insert(
            SmolStr::new_static("raw"),
            BuiltinHandlerDoc {
                description: "Copies the content verbatim, re-indented to the current level.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("comment"),
            BuiltinHandlerDoc {
                description: "Turns every line of the content into a -- comment.",
                attributes: &[],
            },
        );
        map.insert(
            SmolStr::new_static("assert"),
            BuiltinHandlerDoc {
                description: "Asserts the test expression, with the content as optional message.",
                attributes: &["test"],
            },
        );
        map.insert(
            SmolStr::new_static("typeof"),
            BuiltinHandlerDoc {
                description: "Takes the type of the content expression, optionally assigning it.",
                attributes: &["var", "local"],
            },
        );

        map
    });

/// `arg`, `entry` and `item` are read directly by their parent handler.
fn consumed_by_parent(_: &Node, _: &mut Compiler) -> LunariaResult {
    Ok(String::new())
}

#[inline(always)]
fn local_prefix(node: &Node) -> &'static str {
    if node.bool_attr("local") { "local " } else { "" }
}

fn required_attr<'a>(node: &'a Node, name: &'static str) -> Result<&'a str, Error> {
    match node.attr(name) {
        "" => Err(CompileError::MissingAttribute(node.tag.clone(), name).into()),
        value => Ok(value),
    }
}

fn required_content<'a>(node: &'a Node, what: &'static str) -> Result<&'a str, Error> {
    match node.content() {
        "" => Err(CompileError::MissingContent(node.tag.clone(), what).into()),
        content => Ok(content),
    }
}

fn identifier(name: &str, kind: NameKind) -> Result<&str, Error> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(CompileError::InvalidName(kind, name.to_string()).into())
    }
}

/// Emits `header`, the children one level deeper inside a `block` scope, and
/// `footer` back at the current level.
fn compile_block(
    compiler: &mut Compiler,
    block: &str,
    node: &Node,
    header: String,
    footer: &str,
) -> LunariaResult {
    let body = compiler.with_block(block, |c| c.compile_children(node))?;
    let mut code = header;

    for statement in body {
        code.push('\n');
        code.push_str(&statement);
    }

    code.push('\n');
    code.push_str(&compiler.indent());
    code.push_str(footer);

    Ok(code)
}

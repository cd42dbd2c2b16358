use super::{identifier, local_prefix, required_attr};
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::{CompileError, NameKind};
use crate::helpers::{format_comment, indent_lines, wrap_in_quotes};
use crate::node::Node;

pub(super) fn raw(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    match node.content() {
        "" => Ok(String::new()),
        code => Ok(indent_lines(code, &compiler.indent())),
    }
}

pub(super) fn comment(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    Ok(indent_lines(&format_comment(node.content()), &compiler.indent()))
}

pub(super) fn assert(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let test = required_attr(node, "test")?;

    match node.content() {
        "" => Ok(format!("{}assert({test})", compiler.indent())),
        message => Ok(format!(
            "{}assert({test}, {})",
            compiler.indent(),
            wrap_in_quotes(message)
        )),
    }
}

pub(super) fn typeof_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    match (node.attr("var"), node.content()) {
        ("", "") => Err(CompileError::MissingTarget(node.tag.clone()).into()),
        ("", expr) => Ok(format!("{}typeof({expr})", compiler.indent())),
        (var, expr) => {
            let var = identifier(var, NameKind::Variable)?;
            if expr.is_empty() {
                return Err(
                    CompileError::MissingContent(node.tag.clone(), "content when 'var' is set").into(),
                );
            }

            Ok(format!(
                "{}{}{var} = typeof({expr})",
                compiler.indent(),
                local_prefix(node)
            ))
        }
    }
}

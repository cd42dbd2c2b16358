use std::borrow::Cow;

use super::required_content;
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::Error;
use crate::helpers::interpolated_literal;
use crate::node::Node;

pub(super) fn print(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    Ok(format!("{}print({})", compiler.indent(), message(node)?))
}

pub(super) fn warn(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    Ok(format!("{}warn({})", compiler.indent(), message(node)?))
}

pub(super) fn error(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let message = message(node)?;
    let level = node.attr_or("level", "1");

    Ok(format!("{}error({message}, {level})", compiler.indent()))
}

/// Content containing `{{` becomes an interpolated string literal, even when
/// no complete placeholder follows; anything else is passed through as an
/// expression.
fn message(node: &Node) -> Result<Cow<'_, str>, Error> {
    let content = required_content(node, "content")?;

    if content.contains("{{") {
        Ok(Cow::Owned(interpolated_literal(content)))
    } else {
        Ok(Cow::Borrowed(content))
    }
}

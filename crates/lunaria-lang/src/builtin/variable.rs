use super::{identifier, local_prefix, required_attr, required_content};
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::NameKind;
use crate::node::Node;

pub(super) fn set(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let var = identifier(required_attr(node, "var")?, NameKind::Variable)?;
    let value = required_content(node, "a value")?;

    Ok(format!(
        "{}{}{var} = {value}",
        compiler.indent(),
        local_prefix(node)
    ))
}

use itertools::Itertools;

use super::{compile_block, identifier, required_attr};
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::{CompileError, Error, NameKind};
use crate::node::Node;

const IF: &str = "if";

pub(super) fn if_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let test = required_attr(node, "test")?;

    // `else` is the final clause of an `if`.
    if let Some(clause) = node
        .children
        .iter()
        .filter(|child| child.tag == "elseif" || child.tag == "else")
        .skip_while(|child| child.tag != "else")
        .nth(1)
    {
        return Err(
            Error::new(CompileError::ClauseAfterElse(clause.tag.clone())).with_span(clause.span)
        );
    }

    let header = format!("{}if {test} then", compiler.indent());

    compile_block(compiler, IF, node, header, "end")
}

pub(super) fn elseif(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let test = required_attr(node, "test")?;
    compile_clause(node, compiler, &format!("elseif {test} then"))
}

pub(super) fn else_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    compile_clause(node, compiler, "else")
}

/// `elseif` and `else` live inside the `if` body: the keyword is written at the
/// `if` statement's level and the branch body stays at the body level. The
/// enclosing `if` writes the final `end`.
fn compile_clause(node: &Node, compiler: &mut Compiler, keyword: &str) -> LunariaResult {
    let level = match compiler.enclosing_block() {
        Some(IF) => compiler.indent_level().saturating_sub(1),
        _ => return Err(CompileError::MisplacedClause(node.tag.clone(), IF).into()),
    };

    let body = compiler.with_clause(&node.tag, |c| c.compile_children(node))?;

    Ok(std::iter::once(format!("{}{keyword}", compiler.indent_at(level)))
        .chain(body)
        .join("\n"))
}

pub(super) fn for_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let var = required_attr(node, "var")?;
    let vars = var
        .split(',')
        .map(|name| identifier(name.trim(), NameKind::Variable))
        .collect::<Result<Vec<_>, Error>>()?;

    let header = match (node.attr("from"), node.attr("to"), node.attr("in")) {
        (from, to, _) if !from.is_empty() && !to.is_empty() => {
            let [var] = vars.as_slice() else {
                return Err(CompileError::InvalidName(NameKind::Variable, var.to_string()).into());
            };

            match node.attr_or("step", "1") {
                step if is_unit_step(step) => {
                    format!("{}for {var} = {from}, {to} do", compiler.indent())
                }
                step => format!("{}for {var} = {from}, {to}, {step} do", compiler.indent()),
            }
        }
        (_, _, "") => return Err(CompileError::MissingRange(node.tag.clone()).into()),
        (_, _, iterator) => format!(
            "{}for {} in {iterator} do",
            compiler.indent(),
            vars.iter().join(", ")
        ),
    };

    compile_block(compiler, "for", node, header, "end")
}

fn is_unit_step(step: &str) -> bool {
    step.trim().parse::<f64>().is_ok_and(|step| step == 1.0)
}

pub(super) fn while_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let test = required_attr(node, "test")?;
    let header = format!("{}while {test} do", compiler.indent());

    compile_block(compiler, "while", node, header, "end")
}

pub(super) fn repeat(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let until = required_attr(node, "until")?;
    let header = format!("{}repeat", compiler.indent());

    compile_block(compiler, "repeat", node, header, &format!("until {until}"))
}

pub(super) fn break_(_: &Node, compiler: &mut Compiler) -> LunariaResult {
    Ok(format!("{}break", compiler.indent()))
}

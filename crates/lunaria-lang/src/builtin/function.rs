use super::{compile_block, identifier, local_prefix, required_attr};
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::NameKind;
use crate::helpers::{join_with_commas, split_parameters};
use crate::node::Node;

pub(super) fn function(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let name = identifier(required_attr(node, "name")?, NameKind::Function)?;
    let params = split_parameters(node.attr("params")).join(", ");
    let header = format!(
        "{}{}function {name}({params})",
        compiler.indent(),
        local_prefix(node)
    );

    compile_block(compiler, "function", node, header, "end")
}

/// The inline content is the first argument, followed by every `<arg>` child.
pub(super) fn call(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let name = required_attr(node, "name")?;
    let args = join_with_commas(
        std::iter::once(node.content()).chain(node.elements_named("arg").map(Node::content)),
    );

    Ok(format!("{}{name}({args})", compiler.indent()))
}

pub(super) fn return_(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    match node.content() {
        "" => Ok(format!("{}return", compiler.indent())),
        value => Ok(format!("{}return {value}", compiler.indent())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use rstest::{fixture, rstest};

    #[fixture]
    fn compiler() -> Compiler {
        Compiler::new()
    }

    fn arg(value: &str) -> Node {
        Node::element("arg").with_text(value)
    }

    #[rstest]
    fn test_local_function(mut compiler: Compiler) {
        let node = Node::element("function")
            .with_attr("name", "greet")
            .with_attr("params", "name")
            .with_attr("local", "true")
            .with_text("\n  ")
            .with_child(Node::element("print").with_text("Hello, {{name}}!"))
            .with_text("\n  ")
            .with_child(Node::element("return").with_text("\"greeting sent\""))
            .with_text("\n");

        assert_eq!(
            compiler.compile_node(&node),
            Ok([
                "local function greet(name)",
                "    print(\"Hello, \" .. tostring(name) .. \"!\")",
                "    return \"greeting sent\"",
                "end",
            ]
            .join("\n"))
        );
    }

    #[rstest]
    #[case::none("", "function f()")]
    #[case::spaced("a ,b,c", "function f(a, b, c)")]
    #[case::typed("x: number, y: {[string]: number}", "function f(x: number, y: {[string]: number})")]
    #[case::variadic("fmt, ...", "function f(fmt, ...)")]
    fn test_function_params(mut compiler: Compiler, #[case] params: &str, #[case] header: &str) {
        let node = Node::element("function")
            .with_attr("name", "f")
            .with_attr("params", params);

        assert_eq!(compiler.compile_node(&node), Ok(format!("{header}\nend")));
    }

    #[rstest]
    #[case::missing(Node::element("function"), CompileError::MissingAttribute("function".into(), "name"))]
    #[case::keyword(
        Node::element("function").with_attr("name", "end"),
        CompileError::InvalidName(NameKind::Function, "end".to_string())
    )]
    #[case::dotted(
        Node::element("function").with_attr("name", "M.run"),
        CompileError::InvalidName(NameKind::Function, "M.run".to_string())
    )]
    fn test_function_error(mut compiler: Compiler, #[case] node: Node, #[case] expected: CompileError) {
        assert_eq!(compiler.compile_node(&node).unwrap_err().cause, expected);
    }

    #[rstest]
    #[case::args(
        Node::element("call").with_attr("name", "greet").with_child(arg("\"Alice\"")).with_child(arg("\"Bob\"")),
        "greet(\"Alice\", \"Bob\")"
    )]
    #[case::inline_first(
        Node::element("call").with_attr("name", "print").with_text("a").with_child(arg("b")),
        "print(a, b)"
    )]
    #[case::no_args(Node::element("call").with_attr("name", "init"), "init()")]
    #[case::empty_args_dropped(
        Node::element("call").with_attr("name", "f").with_child(arg("  ")).with_child(arg("1")),
        "f(1)"
    )]
    #[case::method(Node::element("call").with_attr("name", "obj:method").with_child(arg("x")), "obj:method(x)")]
    fn test_call(mut compiler: Compiler, #[case] node: Node, #[case] expected: &str) {
        assert_eq!(compiler.compile_node(&node), Ok(expected.to_string()));
    }

    #[rstest]
    fn test_call_requires_name(mut compiler: Compiler) {
        assert_eq!(
            compiler.compile_node(&Node::element("call")).unwrap_err().to_string(),
            "call command requires 'name' attribute"
        );
    }

    #[rstest]
    #[case::bare(Node::element("return"), "return")]
    #[case::value(Node::element("return").with_text(" a + b "), "return a + b")]
    fn test_return(mut compiler: Compiler, #[case] node: Node, #[case] expected: &str) {
        assert_eq!(compiler.compile_node(&node), Ok(expected.to_string()));
    }
}

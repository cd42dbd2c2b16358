use super::{identifier, local_prefix};
use crate::LunariaResult;
use crate::compiler::Compiler;
use crate::error::NameKind;
use crate::helpers::{is_valid_identifier, join_with_commas, wrap_in_quotes};
use crate::node::Node;

/// Renders `<entry key="k">v</entry>` children as one field per line.
///
/// Keys that are valid names are written bare, anything else goes through
/// [`wrap_in_quotes`] inside brackets. Entries without a key or a value are skipped.
pub(super) fn table(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let target = match node.attr("var") {
        "" => String::new(),
        var => format!(
            "{}{} = ",
            local_prefix(node),
            identifier(var, NameKind::Variable)?
        ),
    };

    let fields = compiler.with_block("table", |c| {
        let indent = c.indent();

        node.elements_named("entry")
            .filter_map(|entry| match (entry.attr("key"), entry.content()) {
                ("", _) | (_, "") => None,
                (key, value) if is_valid_identifier(key) => Some(format!("{indent}{key} = {value},")),
                (key, value) => Some(format!("{indent}[{}] = {value},", wrap_in_quotes(key))),
            })
            .collect::<Vec<_>>()
    });

    let indent = compiler.indent();
    let mut code = format!("{indent}{target}{{\n");

    for field in fields {
        code.push_str(&field);
        code.push('\n');
    }

    code.push_str(&indent);
    code.push('}');

    Ok(code)
}

/// Renders the inline content and `<item>` children as `{a, b, c}`.
pub(super) fn array(node: &Node, compiler: &mut Compiler) -> LunariaResult {
    let values = join_with_commas(
        std::iter::once(node.content()).chain(node.elements_named("item").map(Node::content)),
    );

    match node.attr("var") {
        "" => Ok(format!("{}{{{values}}}", compiler.indent())),
        var => Ok(format!(
            "{}{}{} = {{{values}}}",
            compiler.indent(),
            local_prefix(node),
            identifier(var, NameKind::Variable)?
        )),
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

    fn entry(key: &str, value: &str) -> Node {
        Node::element("entry").with_attr("key", key).with_text(value)
    }

    fn item(value: &str) -> Node {
        Node::element("item").with_text(value)
    }

    #[rstest]
    fn test_local_table(mut compiler: Compiler) {
        let node = Node::element("table")
            .with_attr("var", "config")
            .with_attr("local", "true")
            .with_child(entry("name", "\"MyApp\""))
            .with_child(entry("version", "1.0"))
            .with_child(entry("debug", "true"));

        assert_eq!(
            compiler.compile_node(&node),
            Ok([
                "local config = {",
                "    name = \"MyApp\",",
                "    version = 1.0,",
                "    debug = true,",
                "}",
            ]
            .join("\n"))
        );
    }

    #[rstest]
    fn test_table_keys(mut compiler: Compiler) {
        let node = Node::element("table")
            .with_attr("var", "headers")
            .with_child(entry("content-type", "\"text/plain\""))
            .with_child(entry("1", "\"first\""))
            .with_child(entry("end", "false"))
            .with_child(entry("", "\"skipped\""))
            .with_child(entry("empty", " "));

        assert_eq!(
            compiler.compile_node(&node),
            Ok([
                "headers = {",
                "    [\"content-type\"] = \"text/plain\",",
                "    [1] = \"first\",",
                "    [\"end\"] = false,",
                "}",
            ]
            .join("\n"))
        );
    }

    #[rstest]
    fn test_inline_table_follows_indent(mut compiler: Compiler) {
        let node = Node::element("table").with_child(entry("x", "1"));
        let code = compiler.with_block("function", |c| c.compile_node(&node));

        assert_eq!(code, Ok("    {\n        x = 1,\n    }".to_string()));
    }

    #[rstest]
    fn test_empty_table(mut compiler: Compiler) {
        let node = Node::element("table").with_attr("var", "t").with_attr("local", "1");
        assert_eq!(compiler.compile_node(&node), Ok("local t = {\n}".to_string()));
    }

    #[rstest]
    #[case::local(
        Node::element("array").with_attr("var", "numbers").with_attr("local", "true")
            .with_child(item("1")).with_child(item("2")).with_child(item("3")),
        "local numbers = {1, 2, 3}"
    )]
    #[case::inline_first(Node::element("array").with_attr("var", "xs").with_text("0").with_child(item("1")), "xs = {0, 1}")]
    #[case::anonymous(Node::element("array").with_child(item("\"a\"")).with_child(item("\"b\"")), "{\"a\", \"b\"}")]
    #[case::empty(Node::element("array").with_attr("var", "empty"), "empty = {}")]
    #[case::blank_items_dropped(Node::element("array").with_child(item(" ")).with_child(item("x")), "{x}")]
    fn test_array(mut compiler: Compiler, #[case] node: Node, #[case] expected: &str) {
        assert_eq!(compiler.compile_node(&node), Ok(expected.to_string()));
    }

    #[rstest]
    #[case::table(Node::element("table").with_attr("var", "my-table"))]
    #[case::array(Node::element("array").with_attr("var", "9lives"))]
    fn test_invalid_variable(mut compiler: Compiler, #[case] node: Node) {
        assert!(matches!(
            compiler.compile_node(&node).unwrap_err().cause,
            CompileError::InvalidName(NameKind::Variable, _)
        ));
    }
}

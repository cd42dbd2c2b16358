use std::borrow::Cow;
use std::sync::LazyLock;

use itertools::Itertools;
use regex_lite::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"));

const KEYWORDS: [&str; 21] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in", "local",
    "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Checks whether `s` can be used as a Luau name: ASCII letters, digits and
/// underscores, not starting with a digit, and not a reserved word.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&s)
}

pub fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }

    escaped
}

pub fn is_string_literal(s: &str) -> bool {
    let s = s.trim();

    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\'') && s.ends_with('\''))
            || (s.starts_with("[[") && s.ends_with("]]")))
}

pub fn is_number_literal(s: &str) -> bool {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }

    s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        && s.parse::<f64>().is_ok()
}

/// Quotes `s` as a Luau string unless it already looks like an expression.
///
/// This is a textual heuristic, not a parser: string and number literals,
/// bare names, and anything containing `(` or `.` are passed through as
/// expressions. A sentence such as `Done.` is therefore left unquoted.
pub fn wrap_in_quotes(s: &str) -> Cow<'_, str> {
    if is_string_literal(s)
        || is_number_literal(s)
        || is_valid_identifier(s)
        || s.contains('(')
        || s.contains('.')
    {
        return Cow::Borrowed(s);
    }

    Cow::Owned(format!("\"{}\"", escape_string(s)))
}

/// Splits a comma separated list, ignoring commas nested in brackets or quotes.
pub fn split_parameters(params: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth: i32 = 0;

    for c in params.chars() {
        match c {
            '"' | '\'' => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
                current.push(c);
            }
            '(' | '[' | '{' if quote.is_none() => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' if quote.is_none() => {
                depth -= 1;
                current.push(c);
            }
            ',' if quote.is_none() && depth == 0 => {
                let param = current.trim();
                if !param.is_empty() {
                    result.push(param.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let param = current.trim();
    if !param.is_empty() {
        result.push(param.to_string());
    }

    result
}

/// Joins the non-blank values with `", "`.
pub fn join_with_commas<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|v| {
            let v = v.as_ref().trim();
            (!v.is_empty()).then(|| v.to_string())
        })
        .join(", ")
}

/// Prefixes every non-blank line with `indent`; blank lines become empty.
pub fn indent_lines(text: &str, indent: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .join("\n")
}

pub fn format_comment(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    text.split('\n')
        .map(|line| match line.trim() {
            "" => "--".to_string(),
            line => format!("-- {line}"),
        })
        .join("\n")
}

pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Expands `{{ expr }}` placeholders into `" .. tostring(expr) .. "` splices.
///
/// Text without placeholders is returned unchanged and unallocated.
pub fn interpolate(text: &str) -> Cow<'_, str> {
    PLACEHOLDER.replace_all(text, |caps: &regex_lite::Captures| {
        format!("\" .. tostring({}) .. \"", caps[1].trim())
    })
}

/// Builds a complete string literal from `text`, escaping the literal parts
/// and splicing in every placeholder expression.
pub fn interpolated_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    let mut last = 0;

    literal.push('"');

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        literal.push_str(&escape_string(&text[last..whole.start()]));
        literal.push_str("\" .. tostring(");
        literal.push_str(expr.as_str().trim());
        literal.push_str(") .. \"");
        last = whole.end();
    }

    literal.push_str(&escape_string(&text[last..]));
    literal.push('"');
    literal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("x", true)]
    #[case::underscore("_private", true)]
    #[case::mixed("camelCase2", true)]
    #[case::leading_digit("123invalid", false)]
    #[case::keyword("end", false)]
    #[case::keyword_local("local", false)]
    #[case::not_keyword("type", true)]
    #[case::dash("my-var", false)]
    #[case::list("k, v", false)]
    #[case::dotted("a.b", false)]
    #[case::empty("", false)]
    #[case::unicode("é", false)]
    fn test_is_valid_identifier(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_valid_identifier(s), expected);
    }

    #[rstest]
    #[case::plain("hello", "hello")]
    #[case::quotes(r#"say "hi""#, r#"say \"hi\""#)]
    #[case::backslash(r"a\b", r"a\\b")]
    #[case::control("a\n\tb\r", r"a\n\tb\r")]
    fn test_escape_string(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(escape_string(s), expected);
    }

    #[rstest]
    #[case::double(r#""text""#, true)]
    #[case::single("'text'", true)]
    #[case::long("[[text]]", true)]
    #[case::padded(r#"  "text"  "#, true)]
    #[case::single_quote_char(r#"""#, false)]
    #[case::unterminated(r#""text"#, false)]
    #[case::bare("text", false)]
    fn test_is_string_literal(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_string_literal(s), expected);
    }

    #[rstest]
    #[case::int("42", true)]
    #[case::negative("-3", true)]
    #[case::float("1.5", true)]
    #[case::exponent("1e10", true)]
    #[case::hex("0xFF", true)]
    #[case::bad_hex("0x", false)]
    #[case::word("inf", false)]
    #[case::nan("NaN", false)]
    #[case::text("12abc", false)]
    #[case::empty("", false)]
    fn test_is_number_literal(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_number_literal(s), expected);
    }

    #[rstest]
    #[case::sentence("Variable x must not be nil", r#""Variable x must not be nil""#)]
    #[case::string_literal(r#""already""#, r#""already""#)]
    #[case::number("10", "10")]
    #[case::identifier("message", "message")]
    #[case::call("format(x)", "format(x)")]
    #[case::field("err.message", "err.message")]
    #[case::escaped(r#"bad "value""#, r#""bad \"value\"""#)]
    #[case::key_with_dash("content-type", r#""content-type""#)]
    fn test_wrap_in_quotes(#[case] s: &str, #[case] expected: &str) {
        assert_eq!(wrap_in_quotes(s), expected);
    }

    #[rstest]
    #[case::empty("", vec![])]
    #[case::single("a", vec!["a"])]
    #[case::spaces(" a ,b,  c ", vec!["a", "b", "c"])]
    #[case::nested("f(a, b), {1, 2}, [x]", vec!["f(a, b)", "{1, 2}", "[x]"])]
    #[case::quoted(r#""a,b", 'c,d'"#, vec![r#""a,b""#, "'c,d'"])]
    #[case::mixed_quotes(r#""it's", x"#, vec![r#""it's""#, "x"])]
    #[case::blank_items("a,,b,", vec!["a", "b"])]
    #[case::typed("x: number, y: {[string]: number}", vec!["x: number", "y: {[string]: number}"])]
    fn test_split_parameters(#[case] params: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_parameters(params), expected);
    }

    #[rstest]
    #[case::filters_blank(vec!["a", " ", "b"], "a, b")]
    #[case::trims(vec![" a ", "b "], "a, b")]
    #[case::empty(vec![], "")]
    fn test_join_with_commas(#[case] values: Vec<&str>, #[case] expected: &str) {
        assert_eq!(join_with_commas(values), expected);
    }

    #[rstest]
    #[case::single("x = 1", "    ", "    x = 1")]
    #[case::multi("a\n  b", "  ", "  a\n    b")]
    #[case::blank_line("a\n   \nb", "  ", "  a\n\n  b")]
    #[case::no_indent("a\nb", "", "a\nb")]
    fn test_indent_lines(#[case] text: &str, #[case] indent: &str, #[case] expected: &str) {
        assert_eq!(indent_lines(text, indent), expected);
    }

    #[rstest]
    #[case::single("This is a test comment", "-- This is a test comment")]
    #[case::multi("This is a\nmulti-line\ncomment", "-- This is a\n-- multi-line\n-- comment")]
    #[case::blank_line("first\n\n  second  ", "-- first\n--\n-- second")]
    #[case::empty("   ", "")]
    fn test_format_comment(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(format_comment(text), expected);
    }

    #[rstest]
    #[case::single("Hello, {{name}}!", r#"Hello, " .. tostring(name) .. "!"#)]
    #[case::whole("{{i}}", r#"" .. tostring(i) .. ""#)]
    #[case::trimmed("{{ a.b }}", r#"" .. tostring(a.b) .. ""#)]
    #[case::multiple("{{k}}: {{v}}", r#"" .. tostring(k) .. ": " .. tostring(v) .. ""#)]
    #[case::empty_braces("{{}}", "{{}}")]
    #[case::no_placeholder("plain text", "plain text")]
    fn test_interpolate(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(interpolate(text), expected);
    }

    #[test]
    fn test_interpolate_without_placeholder_borrows() {
        assert!(matches!(interpolate("no markers {here}"), Cow::Borrowed(_)));
    }

    #[rstest]
    #[case::simple("Hello, {{name}}!", r#""Hello, " .. tostring(name) .. "!""#)]
    #[case::whole("{{i}}", r#""" .. tostring(i) .. """#)]
    #[case::escapes_literal_parts(
        r#"Say "hi" to {{name}}"#,
        r#""Say \"hi\" to " .. tostring(name) .. """#
    )]
    #[case::no_placeholder("plain", r#""plain""#)]
    fn test_interpolated_literal(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(interpolated_literal(text), expected);
    }

    #[rstest]
    #[case::marker("a {{b}}", true)]
    #[case::empty_marker("a {{}}", false)]
    #[case::none("a {b}", false)]
    fn test_has_placeholder(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(has_placeholder(text), expected);
    }
}

use std::fmt;

use miette::{Diagnostic, LabeledSpan, SourceCode, SourceOffset, SourceSpan};
use smol_str::SmolStr;

use crate::node::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    Function,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Variable => write!(f, "variable"),
            NameKind::Function => write!(f, "function"),
        }
    }
}

type TagName = SmolStr;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CompileError {
    #[error("XML parse error: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("{0} command requires '{1}' attribute")]
    MissingAttribute(TagName, &'static str),
    #[error("{0} command requires {1}")]
    MissingContent(TagName, &'static str),
    #[error("{0} command requires either 'from'/'to' or 'in' attributes")]
    MissingRange(TagName),
    #[error("{0} command requires either 'var' attribute or content")]
    MissingTarget(TagName),
    #[error("invalid {0} name: {1}")]
    InvalidName(NameKind, String),
    #[error("unknown tag: {0}")]
    UnknownTag(TagName),
    #[error("unexpected text content: {0}")]
    UnexpectedText(String),
    #[error("{0} command must be nested inside an {1} block")]
    MisplacedClause(TagName, &'static str),
    #[error("markup is nested more than {0} elements deep")]
    NestingTooDeep(usize),
    #[error("{0} command cannot follow an else clause")]
    ClauseAfterElse(TagName),
    #[error("{0}")]
    Custom(String),
}

/// A compile failure together with the markup it came from.
///
/// `location` points at the innermost element that has a source span, so
/// rendering the error through miette underlines the offending tag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: CompileError,
    /// The markup being compiled, empty when compiling a programmatic tree.
    pub source_code: String,
    /// The location in the markup for diagnostics.
    pub location: Option<SourceSpan>,
}

impl Error {
    pub fn new(cause: CompileError) -> Self {
        Self {
            cause,
            source_code: String::new(),
            location: None,
        }
    }

    /// Builds an error for user-defined handlers.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(CompileError::Custom(message.into()))
    }

    pub(crate) fn with_span(mut self, span: Option<Span>) -> Self {
        if self.location.is_none() {
            self.location = span.map(|span| {
                SourceSpan::new(SourceOffset::from(span.start), std::cmp::max(span.len(), 1))
            });
        }

        self
    }

    pub(crate) fn with_source_code(mut self, source_code: impl Into<String>) -> Self {
        self.source_code = source_code.into();
        self
    }
}

impl From<CompileError> for Error {
    fn from(cause: CompileError) -> Self {
        Self::new(cause)
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let c = match &self.cause {
            CompileError::Parse(_) => "CompileError::Parse",
            CompileError::Io(_) => "CompileError::Io",
            CompileError::MissingAttribute(_, _) => "CompileError::MissingAttribute",
            CompileError::MissingContent(_, _) => "CompileError::MissingContent",
            CompileError::MissingRange(_) => "CompileError::MissingRange",
            CompileError::MissingTarget(_) => "CompileError::MissingTarget",
            CompileError::InvalidName(_, _) => "CompileError::InvalidName",
            CompileError::UnknownTag(_) => "CompileError::UnknownTag",
            CompileError::UnexpectedText(_) => "CompileError::UnexpectedText",
            CompileError::MisplacedClause(_, _) => "CompileError::MisplacedClause",
            CompileError::NestingTooDeep(_) => "CompileError::NestingTooDeep",
            CompileError::ClauseAfterElse(_) => "CompileError::ClauseAfterElse",
            CompileError::Custom(_) => "CompileError::Custom",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let msg = match &self.cause {
            CompileError::Parse(_) => {
                Some("Check that every tag is closed and attribute values are quoted.".to_string())
            }
            CompileError::MissingAttribute(tag, attr) => {
                Some(format!("Add {attr}=\"...\" to the <{tag}> element."))
            }
            CompileError::MissingContent(tag, _) => {
                Some(format!("Put the expression between <{tag}> and </{tag}>."))
            }
            CompileError::MissingRange(_) => Some(
                "Use from=\"..\" and to=\"..\" for a numeric loop, or in=\"..\" for an iterator loop."
                    .to_string(),
            ),
            CompileError::InvalidName(_, _) => Some(
                "Names must start with a letter or underscore, contain only letters, digits and underscores, and must not be a Luau keyword."
                    .to_string(),
            ),
            CompileError::UnknownTag(tag) => Some(format!(
                "<{tag}> has no registered handler. Run `lunaria tags` to list the built-in tags."
            )),
            CompileError::UnexpectedText(_) => {
                Some("Wrap the text in a tag such as <print> or <raw>.".to_string())
            }
            CompileError::MisplacedClause(tag, parent) => Some(format!(
                "Move <{tag}> inside the body of an <{parent}> element."
            )),
            CompileError::NestingTooDeep(_) => {
                Some("Split the script into functions, or raise CompilerConfig::max_depth.".to_string())
            }
            CompileError::ClauseAfterElse(_) => {
                Some("The <else> clause must be the last clause of its <if>.".to_string())
            }
            CompileError::Io(_) | CompileError::MissingTarget(_) | CompileError::Custom(_) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        if self.location.is_some() && !self.source_code.is_empty() {
            Some(&self.source_code)
        } else {
            None
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.source_code.is_empty() {
            return None;
        }

        self.location.map(|location| {
            Box::new(std::iter::once(LabeledSpan::new_with_span(
                Some(self.cause.to_string()),
                location,
            ))) as Box<dyn Iterator<Item = LabeledSpan>>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing_attribute(
        CompileError::MissingAttribute("set".into(), "var"),
        "set command requires 'var' attribute"
    )]
    #[case::missing_content(
        CompileError::MissingContent("print".into(), "content"),
        "print command requires content"
    )]
    #[case::missing_range(
        CompileError::MissingRange("for".into()),
        "for command requires either 'from'/'to' or 'in' attributes"
    )]
    #[case::invalid_variable(
        CompileError::InvalidName(NameKind::Variable, "1x".to_string()),
        "invalid variable name: 1x"
    )]
    #[case::invalid_function(
        CompileError::InvalidName(NameKind::Function, "end".to_string()),
        "invalid function name: end"
    )]
    #[case::unknown_tag(CompileError::UnknownTag("loop".into()), "unknown tag: loop")]
    #[case::unexpected_text(
        CompileError::UnexpectedText("hello".to_string()),
        "unexpected text content: hello"
    )]
    #[case::misplaced_clause(
        CompileError::MisplacedClause("else".into(), "if"),
        "else command must be nested inside an if block"
    )]
    #[case::nesting_too_deep(
        CompileError::NestingTooDeep(200),
        "markup is nested more than 200 elements deep"
    )]
    #[case::clause_after_else(
        CompileError::ClauseAfterElse("elseif".into()),
        "elseif command cannot follow an else clause"
    )]
    #[case::parse(CompileError::Parse("EOF".to_string()), "XML parse error: EOF")]
    fn test_error_message(#[case] cause: CompileError, #[case] expected: &str) {
        assert_eq!(Error::from(cause).to_string(), expected);
    }

    #[test]
    fn test_with_span_keeps_innermost_location() {
        let err = Error::custom("boom")
            .with_span(Some(Span::new(10, 20)))
            .with_span(Some(Span::new(0, 40)));

        assert_eq!(err.location, Some(SourceSpan::new(10.into(), 10)));
    }

    #[test]
    fn test_empty_span_has_minimum_length() {
        let err = Error::custom("boom").with_span(Some(Span::new(3, 3)));
        assert_eq!(err.location, Some(SourceSpan::new(3.into(), 1)));
    }

    #[test]
    fn test_diagnostic_without_source_has_no_labels() {
        let err = Error::custom("boom").with_span(Some(Span::new(0, 4)));
        assert!(err.labels().is_none());
        assert!(Diagnostic::source_code(&err).is_none());
    }

    #[test]
    fn test_diagnostic_code() {
        let err = Error::from(CompileError::UnknownTag("x".into()));
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("CompileError::UnknownTag".to_string())
        );
    }
}

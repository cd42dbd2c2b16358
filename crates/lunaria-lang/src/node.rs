use smol_str::SmolStr;

/// Byte range of an element in the markup it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: SmolStr,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One element of the markup tree.
///
/// A node with an empty `tag` is a text fragment: it only carries `text` and
/// never has children. For elements, `text` holds the character data that is
/// directly inside the element (text of descendants is not included), and
/// `children` keeps both child elements and text fragments in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub tag: SmolStr,
    pub attrs: Vec<Attr>,
    pub text: String,
    pub children: Vec<Node>,
    pub span: Option<Span>,
}

impl Node {
    pub fn element(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    /// Appends character data, both to the immediate text and as a text fragment child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text.push_str(&text);
        self.children.push(Node::text(text));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[inline(always)]
    pub fn is_text(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn is_whitespace(&self) -> bool {
        self.is_text() && self.text.trim().is_empty()
    }

    /// Returns the first attribute value with this name, or `""` when absent.
    pub fn attr(&self, name: &str) -> &str {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
            .unwrap_or_default()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|attr| attr.name == name)
    }

    /// Returns the attribute value, falling back to `default` when it is missing or empty.
    pub fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.attr(name) {
            "" => default,
            value => value,
        }
    }

    /// `true` only for the exact values `"true"`, `"1"` and `"yes"`.
    pub fn bool_attr(&self, name: &str) -> bool {
        matches!(self.attr(name), "true" | "1" | "yes")
    }

    pub fn content(&self) -> &str {
        self.text.trim()
    }

    pub fn elements_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }
}

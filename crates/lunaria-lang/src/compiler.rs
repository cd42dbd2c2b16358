use std::fmt;
use std::io::Read;
use std::sync::Arc;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::LunariaResult;
use crate::builtin::BUILTIN_HANDLERS;
use crate::error::{CompileError, Error};
use crate::node::Node;
use crate::parser;

/// Generates code for one tag. Handlers receive the compiler so they can
/// query the indentation and recurse into their children.
pub type Handler = Arc<dyn Fn(&Node, &mut Compiler) -> Result<String, Error> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct CompilerConfig {
    /// Number of spaces per nesting level.
    pub indent_width: usize,
    /// Maximum number of nested elements compiled before giving up.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            max_depth: 200,
        }
    }
}

/// Compiler state for one compile at a time.
///
/// The indent level and the block stack are mutated during a tree walk, so an
/// instance must not be shared between concurrent compiles. Every instance
/// starts from the same immutable set of built-in handlers.
#[derive(Clone)]
pub struct Compiler {
    handlers: FxHashMap<SmolStr, Handler>,
    indent_level: usize,
    depth: usize,
    blocks: Vec<SmolStr>,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("tags", &self.tags())
            .field("indent_level", &self.indent_level)
            .field("blocks", &self.blocks)
            .field("config", &self.config)
            .finish()
    }
}

impl Compiler {
    /// Root tag whose children are compiled as separate statements.
    pub const SCRIPT_TAG: &'static str = "script";

    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            handlers: BUILTIN_HANDLERS.clone(),
            indent_level: 0,
            depth: 0,
            blocks: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn set_indent_width(&mut self, indent_width: usize) {
        self.config.indent_width = indent_width;
    }

    /// Registers `handler` for `tag`, replacing any handler already registered for it.
    pub fn register<F>(&mut self, tag: impl Into<SmolStr>, handler: F)
    where
        F: Fn(&Node, &mut Compiler) -> Result<String, Error> + Send + Sync + 'static,
    {
        let tag = tag.into();

        if self.handlers.insert(tag.clone(), Arc::new(handler)).is_some() {
            log::debug!("Overriding handler for <{tag}>");
        } else {
            log::debug!("Registered handler for <{tag}>");
        }
    }

    pub fn has_handler(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.handlers.keys().map(SmolStr::as_str).sorted().collect()
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// Indentation for the current nesting depth.
    pub fn indent(&self) -> String {
        self.indent_at(self.indent_level)
    }

    pub fn indent_at(&self, level: usize) -> String {
        " ".repeat(level * self.config.indent_width)
    }

    /// Tag of the innermost block or clause being compiled.
    pub fn enclosing_block(&self) -> Option<&str> {
        self.blocks.last().map(SmolStr::as_str)
    }

    /// Runs `f` one nesting level deeper inside a `tag` block.
    ///
    /// The indent level and block stack are restored when `f` returns, including
    /// when it returns an error.
    pub fn with_block<T>(&mut self, tag: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent_level += 1;
        let result = self.with_clause(tag, f);
        self.indent_level -= 1;
        result
    }

    /// Runs `f` inside a `tag` clause without changing the indentation.
    pub fn with_clause<T>(&mut self, tag: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.blocks.push(SmolStr::new(tag));
        let result = f(self);
        self.blocks.pop();
        result
    }

    pub(crate) fn reset(&mut self) {
        self.indent_level = 0;
        self.depth = 0;
        self.blocks.clear();
    }

    pub fn compile_node(&mut self, node: &Node) -> LunariaResult {
        if node.is_text() {
            return match node.text.trim() {
                "" => Ok(String::new()),
                text => Err(Error::new(CompileError::UnexpectedText(text.to_string()))
                    .with_span(node.span)),
            };
        }

        let Some(handler) = self.handlers.get(&node.tag).cloned() else {
            return Err(Error::new(CompileError::UnknownTag(node.tag.clone())).with_span(node.span));
        };

        if self.depth >= self.config.max_depth {
            return Err(
                Error::new(CompileError::NestingTooDeep(self.config.max_depth)).with_span(node.span)
            );
        }

        log::trace!("Compiling <{}> at level {}", node.tag, self.indent_level);
        self.depth += 1;
        let result = handler(node, self).map_err(|e| e.with_span(node.span));
        self.depth -= 1;
        result
    }

    /// Compiles each child in document order, dropping empty results.
    pub fn compile_children(&mut self, node: &Node) -> Result<Vec<String>, Error> {
        let mut results = Vec::with_capacity(node.children.len());

        for child in &node.children {
            let code = self.compile_node(child)?;
            if !code.is_empty() {
                results.push(code);
            }
        }

        Ok(results)
    }

    /// Compiles a whole tree. A `script` root has its children compiled as
    /// separate statements joined by newlines; any other root is one statement.
    pub fn compile(&mut self, root: &Node) -> LunariaResult {
        if root.tag == Self::SCRIPT_TAG {
            return self.compile_children(root).map(|statements| statements.join("\n"));
        }

        self.compile_node(root)
    }

    pub fn compile_str(&mut self, source: &str) -> LunariaResult {
        log::debug!("Compiling {} bytes of markup", source.len());

        parser::parse(source)
            .and_then(|root| self.compile(&root))
            .map_err(|e| e.with_source_code(source))
    }

    pub fn compile_bytes(&mut self, bytes: &[u8]) -> LunariaResult {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| Error::new(CompileError::Parse(e.to_string())))?;

        self.compile_str(source)
    }

    pub fn compile_reader<R: Read>(&mut self, mut reader: R) -> LunariaResult {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::new(CompileError::Io(e.to_string())))?;

        self.compile_bytes(&bytes)
    }
}

//! `lunaria-lang` compiles Lunaria markup, an XML vocabulary for writing Luau, into Luau source.
//!
//! ## Examples
//!
//! ```rust
//! let code = lunaria_lang::compile_str(r#"<set var="x" local="true">42</set>"#).unwrap();
//! assert_eq!(code, "local x = 42");
//!
//! // Independent compiler with a custom tag
//! use lunaria_lang::{Compiler, Node, wrap_in_quotes};
//!
//! let mut compiler = Compiler::new();
//! compiler.register("log", |node: &Node, c: &mut Compiler| {
//!     let level = node.attr_or("level", "info");
//!     Ok(format!("{}logger.{level}({})", c.indent(), wrap_in_quotes(node.content())))
//! });
//!
//! let code = compiler
//!     .compile_str(r#"<log level="debug">Application starting</log>"#)
//!     .unwrap();
//! assert_eq!(code, r#"logger.debug("Application starting")"#);
//! ```
mod builtin;
mod compiler;
mod error;
mod helpers;
mod node;
mod parser;

use std::io::Read;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use builtin::{BUILTIN_HANDLER_DOC, BuiltinHandlerDoc};
pub use compiler::{Compiler, CompilerConfig, Handler};
pub use error::{CompileError, Error, NameKind};
pub use helpers::{
    escape_string, format_comment, has_placeholder, indent_lines, interpolate,
    interpolated_literal, is_number_literal, is_string_literal, is_valid_identifier,
    join_with_commas, split_parameters, wrap_in_quotes,
};
pub use node::{Attr, Node, Span};
pub use parser::parse;

pub type LunariaResult = Result<String, Error>;

static DEFAULT_COMPILER: LazyLock<Mutex<Compiler>> = LazyLock::new(|| Mutex::new(Compiler::new()));

fn default_compiler() -> MutexGuard<'static, Compiler> {
    DEFAULT_COMPILER.lock().unwrap_or_else(|poisoned| {
        // A handler panicked mid-walk; the registry is intact but the walk state is not.
        DEFAULT_COMPILER.clear_poison();
        let mut compiler = poisoned.into_inner();
        compiler.reset();
        compiler
    })
}

/// Compiles UTF-8 markup with the process-wide default compiler.
pub fn compile(bytes: &[u8]) -> LunariaResult {
    default_compiler().compile_bytes(bytes)
}

pub fn compile_str(source: &str) -> LunariaResult {
    default_compiler().compile_str(source)
}

pub fn compile_reader<R: Read>(reader: R) -> LunariaResult {
    default_compiler().compile_reader(reader)
}

/// Registers a handler on the process-wide default compiler.
///
/// Compilers created with [`Compiler::new`] are not affected.
///
/// The default compiler is locked for the whole compile, so `handler` must not
/// call [`compile`], [`compile_str`], [`compile_reader`] or [`register`]: the
/// lock is not reentrant and the call deadlocks or panics. Recurse through the
/// `&mut Compiler` argument, or compile nested markup with a separate
/// [`Compiler`].
pub fn register<F>(tag: &str, handler: F)
where
    F: Fn(&Node, &mut Compiler) -> Result<String, Error> + Send + Sync + 'static,
{
    default_compiler().register(tag, handler);
}

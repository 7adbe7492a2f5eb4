//! Recursive tag-expansion markup renderer.
//!
//! Markup is plain text with bracketed constructs:
//!
//! - Tags: `[name]`, `[name positional\second\key\\value]`, expanded by
//!   fetching the tag's body from a [`TagStore`] and rendering it with the
//!   tag's arguments bound
//! - Substitutions: `[\\1]` (positional, 1-based), `[\\key]` (named, falling
//!   back to render globals)
//! - Conditionals: `[\if key\then\else]`, `[\if 2\then\else]`
//! - Loops over positional arguments: `[\loop\<li>[\item]</li>\empty]`
//! - Escapes: `[\o]` → `[`, `[\c]` → `]`, `[\s]` → `\`
//!
//! Recursion depth is bounded by an explicit [`TagStack`]; every error
//! carries a snapshot of that stack as its trace.
//!
//! # Example
//!
//! ```
//! use tagup::{MemoryStore, Renderer};
//!
//! let store = MemoryStore::with_tags([("greet", r"Hello, [\\1]!")]);
//! let renderer = Renderer::new(store);
//! assert_eq!(renderer.render(r"[greet World]", None).unwrap(), "Hello, World!");
//! ```

pub mod ast;
pub mod context;
pub mod control_flow;
pub mod error;
pub mod parser;
pub mod reader;
pub mod renderer;
pub mod stack;
pub mod store;
mod substitution;

pub use ast::{Argument, Escape, Node, Position};
pub use context::{ArgumentContext, ArgumentValue, Globals, Scope};
pub use control_flow::Resolution;
pub use error::{ErrorKind, SyntaxError, SyntaxErrorKind, TagupError, TagupResult};
pub use parser::{TagupParser, parse};
pub use reader::RenderingReader;
pub use renderer::{PostHook, PreHook, RenderOptions, Renderer};
pub use stack::{StackEntry, StackTrace, TagStack};
pub use store::{DirectoryStore, FetchError, MemoryStore, NullStore, TagStore};

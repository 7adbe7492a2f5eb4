use std::fmt;
use std::io::Read;

use tracing::debug;

use crate::ast::Node;
use crate::context::{ArgumentContext, Globals};
use crate::error::{TagupError, TagupResult};
use crate::parser::parse;
use crate::reader::RenderingReader;
use crate::stack::StackTrace;
use crate::store::TagStore;
use crate::substitution::Evaluator;

/// Rewrites a freshly parsed root block before it is evaluated.
pub type PreHook = Box<dyn Fn(Node) -> Node + Send + Sync>;

/// Transforms the rendered string of a document or tag body.
pub type PostHook = Box<dyn Fn(String) -> String + Send + Sync>;

/// Rendering configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Nested tag expansions allowed. 0 forbids tag expansion entirely.
    pub max_depth: usize,
    /// Trim surrounding whitespace from argument values.
    pub trim_args: bool,
}

impl RenderOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 50;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            trim_args: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_trim_args(mut self, trim_args: bool) -> Self {
        self.trim_args = trim_args;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders markup, expanding tags fetched from a [`TagStore`].
///
/// A renderer holds no per-render state; each [`Renderer::render`] call owns
/// its tag stack, so one renderer can serve concurrent renders when its store
/// is `Sync`.
pub struct Renderer<S> {
    store: S,
    options: RenderOptions,
    pre_hook: Option<PreHook>,
    post_hook: Option<PostHook>,
}

impl<S: TagStore> Renderer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            options: RenderOptions::default(),
            pre_hook: None,
            post_hook: None,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn with_trim_args(mut self, trim_args: bool) -> Self {
        self.options.trim_args = trim_args;
        self
    }

    /// Install a hook run on every parsed root block (the document and each
    /// fetched tag body) before control flow is resolved.
    pub fn with_pre_hook(mut self, hook: impl Fn(Node) -> Node + Send + Sync + 'static) -> Self {
        self.pre_hook = Some(Box::new(hook));
        self
    }

    /// Install a hook run on the rendered string of the document and of each
    /// tag body.
    pub fn with_post_hook(
        mut self,
        hook: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.post_hook = Some(Box::new(hook));
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Render `markup`, with optional globals visible to every expansion.
    ///
    /// The first failure aborts the render; there is no partial output.
    pub fn render(&self, markup: &str, globals: Option<&Globals>) -> TagupResult<String> {
        debug!(len = markup.len(), "rendering markup");

        let root = parse(markup).map_err(|err| TagupError::syntax(err, StackTrace::root()))?;

        let names = root.tag_names();
        debug!(tags = names.len(), "prefetching referenced tags");
        self.store.prefetch_tags(&names);

        let empty = Globals::new();
        let globals = globals.unwrap_or(&empty);
        let mut evaluator = Evaluator::new(self, globals);
        evaluator
            .render_tree(root, &ArgumentContext::new())
            .inspect_err(|err| {
                debug!(kind = ?err.kind(), trace = %err.trace(), "render failed");
            })
    }

    /// Wrap `inner` in a reader that yields its rendered contents.
    pub fn reader<'r, R: Read>(
        &'r self,
        inner: R,
        globals: Option<&'r Globals>,
    ) -> RenderingReader<'r, R, S> {
        RenderingReader::new(inner, self, globals)
    }

    pub(crate) fn pre_process(&self, node: Node) -> Node {
        match &self.pre_hook {
            Some(hook) => hook(node),
            None => node,
        }
    }

    pub(crate) fn post_process(&self, output: String) -> String {
        match &self.post_hook {
            Some(hook) => hook(output),
            None => output,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Renderer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("store", &self.store)
            .field("options", &self.options)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("post_hook", &self.post_hook.is_some())
            .finish()
    }
}

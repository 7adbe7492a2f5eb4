use tracing::trace;

use crate::ast::{Argument, Node, Position};
use crate::context::{ArgumentContext, ArgumentValue, Globals, Scope};
use crate::control_flow::{self, Resolution};
use crate::error::{TagupError, TagupResult};
use crate::parser::parse;
use crate::renderer::Renderer;
use crate::stack::{StackTrace, TagStack};
use crate::store::{FetchError, TagStore};

/// State of one render call.
pub(crate) struct Evaluator<'r, S> {
    renderer: &'r Renderer<S>,
    globals: &'r Globals,
    stack: TagStack,
}

impl<'r, S: TagStore> Evaluator<'r, S> {
    pub(crate) fn new(renderer: &'r Renderer<S>, globals: &'r Globals) -> Self {
        Self {
            renderer,
            globals,
            stack: TagStack::new(renderer.options().max_depth),
        }
    }

    #[cfg(test)]
    pub(crate) fn stack(&self) -> &TagStack {
        &self.stack
    }

    /// Pre-hook, control flow, substitution, post-hook.
    pub(crate) fn render_tree(
        &mut self,
        root: Node,
        arguments: &ArgumentContext,
    ) -> TagupResult<String> {
        let root = self.renderer.pre_process(root);
        let scope = Scope::new(arguments, self.globals);
        let output = match control_flow::resolve(&root, scope) {
            Resolution::Resolved(node) => self.evaluate(&node, scope)?,
            Resolution::Discarded => String::new(),
        };
        Ok(self.renderer.post_process(output))
    }

    fn evaluate(&mut self, node: &Node, scope: Scope<'_>) -> TagupResult<String> {
        match node {
            Node::Block(children) => self.evaluate_all(children, scope),

            Node::Text(text) => Ok(text.clone()),

            Node::Escape(escape) => Ok(escape.as_str().to_string()),

            Node::NamedSubstitution { name, position } => match scope.named(name) {
                Some(value) => Ok(value.to_string()),
                None => Err(TagupError::NamedArgumentNotFound {
                    name: name.clone(),
                    trace: self.reference_trace(name, *position),
                }),
            },

            Node::PositionalSubstitution { index, position } => match scope.positional(*index) {
                Some(value) => Ok(value.to_string()),
                None => Err(TagupError::PositionalArgumentNotFound {
                    index: *index,
                    trace: self.reference_trace(&index.to_string(), *position),
                }),
            },

            Node::Tag {
                name,
                args,
                position,
            } => self.expand_tag(name, args, *position, scope),

            // Only reachable when a hook or caller hands over an unresolved tree.
            Node::NamedTest { .. }
            | Node::PositionalTest { .. }
            | Node::PositionalLoop { .. }
            | Node::LoopItem => match control_flow::resolve(node, scope) {
                Resolution::Resolved(resolved) => self.evaluate(&resolved, scope),
                Resolution::Discarded => Ok(String::new()),
            },
        }
    }

    fn evaluate_all(&mut self, nodes: &[Node], scope: Scope<'_>) -> TagupResult<String> {
        nodes.iter().map(|node| self.evaluate(node, scope)).collect()
    }

    fn evaluate_argument(
        &mut self,
        arg: &Argument,
        scope: Scope<'_>,
    ) -> TagupResult<ArgumentValue> {
        let value = self.evaluate_all(arg.value(), scope)?;
        let value = if self.renderer.options().trim_args {
            value.trim().to_string()
        } else {
            value
        };

        Ok(match arg {
            Argument::Named { name, .. } => ArgumentValue::Named(name.clone(), value),
            Argument::Positional { .. } => ArgumentValue::Positional(value),
        })
    }

    fn expand_tag(
        &mut self,
        name: &str,
        args: &[Argument],
        position: Position,
        scope: Scope<'_>,
    ) -> TagupResult<String> {
        let values = args
            .iter()
            .map(|arg| self.evaluate_argument(arg, scope))
            .collect::<TagupResult<Vec<_>>>()?;

        self.stack.push(name, Some(position))?;
        trace!(tag = name, depth = self.stack.depth(), "expanding tag");

        let result = self.expand_body(name, values);
        let popped = self.stack.pop();
        let output = result?;
        popped?;
        Ok(output)
    }

    fn expand_body(&mut self, name: &str, values: Vec<ArgumentValue>) -> TagupResult<String> {
        let body = self
            .renderer
            .store()
            .get_tag(name)
            .map_err(|err| self.fetch_error(name, err))?;
        let tree = parse(&body).map_err(|err| TagupError::syntax(err, self.stack.stack_trace()))?;
        let arguments = ArgumentContext::from_values(values);
        self.render_tree(tree, &arguments)
    }

    fn fetch_error(&self, name: &str, err: FetchError) -> TagupError {
        let trace = self.stack.stack_trace();
        match err {
            FetchError::NotFound => TagupError::TagNotFound {
                name: name.to_string(),
                trace,
            },
            FetchError::NotImplemented(capability) => {
                TagupError::NotImplemented { capability, trace }
            }
            FetchError::Backend(source) => TagupError::Store {
                name: name.to_string(),
                source,
                trace,
            },
        }
    }

    fn reference_trace(&self, reference: &str, position: Position) -> StackTrace {
        self.stack
            .stack_trace()
            .pointing_at(format!("\\\\{reference}"), position)
    }
}

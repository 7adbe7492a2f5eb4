use crate::ast::{Argument, Node};
use crate::context::Scope;

/// Outcome of resolving one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Node),
    /// The node contributes nothing to the output. Not an error.
    Discarded,
}

impl Resolution {
    pub fn into_node(self) -> Option<Node> {
        match self {
            Resolution::Resolved(node) => Some(node),
            Resolution::Discarded => None,
        }
    }
}

/// Resolve all control flow in `node` against `scope`.
pub fn resolve(node: &Node, scope: Scope<'_>) -> Resolution {
    Resolver { scope, item: None }.resolve(node)
}

struct Resolver<'a> {
    scope: Scope<'a>,
    /// Argument bound to `[\item]` in the current loop copy.
    item: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    fn resolve(&self, node: &Node) -> Resolution {
        match node {
            Node::Block(children) => Resolution::Resolved(Node::Block(self.resolve_all(children))),

            Node::Text(_)
            | Node::Escape(_)
            | Node::NamedSubstitution { .. }
            | Node::PositionalSubstitution { .. } => Resolution::Resolved(node.clone()),

            Node::Tag {
                name,
                args,
                position,
            } => Resolution::Resolved(Node::Tag {
                name: name.clone(),
                args: args.iter().map(|arg| self.resolve_argument(arg)).collect(),
                position: *position,
            }),

            Node::NamedTest {
                name,
                then,
                otherwise,
                ..
            } => self.select(self.scope.has_named(name), then, otherwise.as_deref()),

            Node::PositionalTest {
                index,
                then,
                otherwise,
                ..
            } => self.select(
                self.scope.positional_args().len() >= *index,
                then,
                otherwise.as_deref(),
            ),

            Node::PositionalLoop {
                body, otherwise, ..
            } => {
                let args = self.scope.positional_args();
                if args.is_empty() {
                    return self.fallback(otherwise.as_deref());
                }

                let copies = args
                    .iter()
                    .map(|arg| {
                        // Items already bound by an enclosing loop keep that binding.
                        let copy = Resolver {
                            scope: self.scope,
                            item: self.item.or(Some(arg.as_str())),
                        };
                        Node::Block(copy.resolve_all(body))
                    })
                    .collect();
                Resolution::Resolved(Node::Block(copies))
            }

            Node::LoopItem => match self.item {
                Some(value) => Resolution::Resolved(Node::text(value)),
                None => Resolution::Discarded,
            },
        }
    }

    fn resolve_all(&self, nodes: &[Node]) -> Vec<Node> {
        nodes
            .iter()
            .filter_map(|node| self.resolve(node).into_node())
            .collect()
    }

    fn resolve_argument(&self, arg: &Argument) -> Argument {
        match arg {
            Argument::Named {
                name,
                value,
                position,
            } => Argument::Named {
                name: name.clone(),
                value: self.resolve_all(value),
                position: *position,
            },
            Argument::Positional { value, position } => Argument::Positional {
                value: self.resolve_all(value),
                position: *position,
            },
        }
    }

    fn select(&self, holds: bool, then: &[Node], otherwise: Option<&[Node]>) -> Resolution {
        if holds {
            Resolution::Resolved(Node::Block(self.resolve_all(then)))
        } else {
            self.fallback(otherwise)
        }
    }

    fn fallback(&self, otherwise: Option<&[Node]>) -> Resolution {
        match otherwise {
            Some(branch) => Resolution::Resolved(Node::Block(self.resolve_all(branch))),
            None => Resolution::Discarded,
        }
    }
}

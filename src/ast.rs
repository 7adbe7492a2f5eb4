use std::collections::HashSet;
use std::fmt;

/// 1-based source position of a node's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.column)
    }
}

/// Literal-bracket escapes: `[\o]`, `[\c]`, `[\s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    Open,
    Close,
    Slash,
}

impl Escape {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'o' => Some(Escape::Open),
            'c' => Some(Escape::Close),
            's' => Some(Escape::Slash),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Escape::Open => "[",
            Escape::Close => "]",
            Escape::Slash => "\\",
        }
    }
}

/// Parsed markup node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered children, rendered by concatenation
    Block(Vec<Node>),
    /// Literal text, never re-evaluated
    Text(String),
    /// Tag invocation: `[name args...]`
    Tag {
        name: String,
        args: Vec<Argument>,
        position: Position,
    },
    /// `[\\name]`
    NamedSubstitution { name: String, position: Position },
    /// `[\\N]`, 1-based
    PositionalSubstitution { index: usize, position: Position },
    Escape(Escape),
    /// `[\if name\then\else]`
    NamedTest {
        name: String,
        then: Vec<Node>,
        otherwise: Option<Vec<Node>>,
        position: Position,
    },
    /// `[\if N\then\else]`
    PositionalTest {
        index: usize,
        then: Vec<Node>,
        otherwise: Option<Vec<Node>>,
        position: Position,
    },
    /// `[\loop\body\else]`
    PositionalLoop {
        body: Vec<Node>,
        otherwise: Option<Vec<Node>>,
        position: Position,
    },
    /// `[\item]` placeholder inside a loop body
    LoopItem,
}

/// Argument of a tag invocation. The value is markup evaluated in the
/// caller's scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Named {
        name: String,
        value: Vec<Node>,
        position: Position,
    },
    Positional {
        value: Vec<Node>,
        position: Position,
    },
}

impl Argument {
    pub fn value(&self) -> &[Node] {
        match self {
            Argument::Named { value, .. } | Argument::Positional { value, .. } => value,
        }
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Distinct literal tag names referenced anywhere in this tree,
    /// including inside arguments, branches and loop bodies.
    pub fn tag_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        self.collect_tag_names(&mut names);
        names
    }

    fn collect_tag_names(&self, names: &mut HashSet<String>) {
        match self {
            Node::Block(children) => collect_all(children, names),
            Node::Tag { name, args, .. } => {
                names.insert(name.clone());
                for arg in args {
                    collect_all(arg.value(), names);
                }
            }
            Node::NamedTest {
                then, otherwise, ..
            }
            | Node::PositionalTest {
                then, otherwise, ..
            } => {
                collect_all(then, names);
                if let Some(otherwise) = otherwise {
                    collect_all(otherwise, names);
                }
            }
            Node::PositionalLoop {
                body, otherwise, ..
            } => {
                collect_all(body, names);
                if let Some(otherwise) = otherwise {
                    collect_all(otherwise, names);
                }
            }
            Node::Text(_)
            | Node::NamedSubstitution { .. }
            | Node::PositionalSubstitution { .. }
            | Node::Escape(_)
            | Node::LoopItem => {}
        }
    }
}

fn collect_all(nodes: &[Node], names: &mut HashSet<String>) {
    for node in nodes {
        node.collect_tag_names(names);
    }
}

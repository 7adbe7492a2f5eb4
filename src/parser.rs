use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::ast::{Argument, Escape, Node, Position};
use crate::error::{SyntaxError, SyntaxErrorKind};

#[derive(Parser)]
#[grammar = "src/tagup.pest"]
pub struct TagupParser;

/// Parse markup into a root [`Node::Block`].
pub fn parse(input: &str) -> Result<Node, SyntaxError> {
    TagupParser::parse_markup(input)
}

impl TagupParser {
    /// Parse markup into a root block node
    pub fn parse_markup(input: &str) -> Result<Node, SyntaxError> {
        let mut pairs = TagupParser::parse(Rule::document, input).map_err(syntax_error)?;
        let document = pairs.next().expect("parser returned no document rule");

        let children = document
            .into_inner()
            .filter(|p| p.as_rule() != Rule::EOI)
            .map(|p| Self::build_node(p, false))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::Block(children))
    }

    fn build_children(pair: Pair<Rule>, in_loop: bool) -> Result<Vec<Node>, SyntaxError> {
        pair.into_inner()
            .map(|p| Self::build_node(p, in_loop))
            .collect()
    }

    fn build_node(pair: Pair<Rule>, in_loop: bool) -> Result<Node, SyntaxError> {
        let position = position_of(&pair);

        match pair.as_rule() {
            Rule::top_text | Rule::text => Ok(Node::text(pair.as_str())),
            Rule::escape_sequence => {
                let code = first_inner_str(pair).chars().next();
                match code.and_then(Escape::from_code) {
                    Some(escape) => Ok(Node::Escape(escape)),
                    None => unreachable!("grammar admits only known escape codes"),
                }
            }
            Rule::named_substitution => Ok(Node::NamedSubstitution {
                name: first_inner_str(pair),
                position,
            }),
            Rule::positional_substitution => Ok(Node::PositionalSubstitution {
                index: parse_index(&first_inner_str(pair)),
                position,
            }),
            Rule::named_test => {
                let (key, then, otherwise) = Self::build_test(pair, in_loop)?;
                Ok(Node::NamedTest {
                    name: key,
                    then,
                    otherwise,
                    position,
                })
            }
            Rule::positional_test => {
                let (key, then, otherwise) = Self::build_test(pair, in_loop)?;
                Ok(Node::PositionalTest {
                    index: parse_index(&key),
                    then,
                    otherwise,
                    position,
                })
            }
            Rule::positional_loop => {
                let mut inner = pair.into_inner();
                // Items in the body bind to this loop; the else branch keeps
                // the enclosing scope.
                let body = match inner.next() {
                    Some(p) => Self::build_children(p, true)?,
                    None => Vec::new(),
                };
                let otherwise = inner
                    .next()
                    .map(|p| Self::build_children(p, in_loop))
                    .transpose()?;
                Ok(Node::PositionalLoop {
                    body,
                    otherwise,
                    position,
                })
            }
            Rule::loop_item => {
                if in_loop {
                    Ok(Node::LoopItem)
                } else {
                    Err(builder_error(
                        &pair,
                        SyntaxErrorKind::LoopItemOutsideLoop,
                        "loop item outside of a loop body".to_string(),
                    ))
                }
            }
            Rule::builtin_error => {
                let name = first_inner_str(pair.clone());
                let (kind, message) = match name.as_str() {
                    "if" | "loop" | "item" => (
                        SyntaxErrorKind::Malformed,
                        format!("malformed `{name}` builtin"),
                    ),
                    _ => (
                        SyntaxErrorKind::NoSuchBuiltin,
                        format!("no such builtin: `{name}`"),
                    ),
                };
                Err(builder_error(&pair, kind, message))
            }
            Rule::tag => Self::build_tag(pair, in_loop),
            Rule::malformed_tag => {
                let name = first_inner_str(pair.clone());
                Err(builder_error(
                    &pair,
                    SyntaxErrorKind::Malformed,
                    format!("malformed tag `{name}`"),
                ))
            }
            rule => unreachable!("unexpected rule in block: {rule:?}"),
        }
    }

    fn build_test(
        pair: Pair<Rule>,
        in_loop: bool,
    ) -> Result<(String, Vec<Node>, Option<Vec<Node>>), SyntaxError> {
        let mut inner = pair.into_inner();
        let key = inner
            .next()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_default();
        let then = match inner.next() {
            Some(p) => Self::build_children(p, in_loop)?,
            None => Vec::new(),
        };
        let otherwise = inner
            .next()
            .map(|p| Self::build_children(p, in_loop))
            .transpose()?;
        Ok((key, then, otherwise))
    }

    fn build_tag(pair: Pair<Rule>, in_loop: bool) -> Result<Node, SyntaxError> {
        let position = position_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner
            .next()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_default();
        let args = inner
            .map(|p| Self::build_argument(p, in_loop))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::Tag {
            name,
            args,
            position,
        })
    }

    fn build_argument(pair: Pair<Rule>, in_loop: bool) -> Result<Argument, SyntaxError> {
        let position = position_of(&pair);
        let rule = pair.as_rule();
        let mut inner = pair.into_inner();

        match rule {
            Rule::named_argument => {
                let name = inner
                    .next()
                    .map(|p| p.as_str().to_owned())
                    .unwrap_or_default();
                let value = match inner.next() {
                    Some(p) => Self::build_children(p, in_loop)?,
                    None => Vec::new(),
                };
                Ok(Argument::Named {
                    name,
                    value,
                    position,
                })
            }
            Rule::positional_argument => {
                let value = match inner.next() {
                    Some(p) => Self::build_children(p, in_loop)?,
                    None => Vec::new(),
                };
                Ok(Argument::Positional { value, position })
            }
            rule => unreachable!("unexpected rule in tag arguments: {rule:?}"),
        }
    }
}

fn position_of(pair: &Pair<Rule>) -> Position {
    let (line, column) = pair.as_span().start_pos().line_col();
    Position::new(line, column)
}

fn first_inner_str(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_default()
}

/// Digits beyond `usize` saturate; such an index is never in range.
fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

fn builder_error(pair: &Pair<Rule>, kind: SyntaxErrorKind, message: String) -> SyntaxError {
    let start = pair.as_span().start_pos();
    let (line, column) = start.line_col();
    SyntaxError {
        kind,
        message,
        excerpt: start.line_of().trim_end_matches(['\r', '\n']).to_owned(),
        line,
        column,
    }
}

fn syntax_error(err: pest::error::Error<Rule>) -> SyntaxError {
    let (line, column) = match &err.line_col {
        LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => *pos,
    };
    SyntaxError {
        kind: SyntaxErrorKind::Malformed,
        message: err.variant.message().into_owned(),
        excerpt: err.line().to_owned(),
        line,
        column,
    }
}

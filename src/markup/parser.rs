//! Lenient markup parser.
//!
//! Builds [`ElementNode`] trees from the token stream of
//! [`crate::markup::tokenizer`]. Like an HTML parser it never rejects a
//! document for structural problems: unclosed elements close at end of
//! input and stray closing tags are ignored. Only lexically broken tags
//! (a missing tag name, an unterminated quote) are errors.

use crate::element::ElementNode;
use crate::markup::tokenizer::{tokenize, PToken, Tok};
use crate::markup::{decode_entities, is_void};

/// Errors from markup parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at offset {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unterminated quoted attribute value at offset {0}")]
    UnclosedAttribute(usize),
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("markup contains no elements")]
    Empty,
}

/// Parse markup and return its first top-level element.
pub fn parse(source: &str) -> Result<ElementNode, ParseError> {
    parse_fragment(source)?
        .into_iter()
        .next()
        .ok_or(ParseError::Empty)
}

/// Parse markup into all of its top-level elements, in document order.
///
/// Text outside any element is discarded.
pub fn parse_fragment(source: &str) -> Result<Vec<ElementNode>, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(source),
        cursor: 0,
    };
    let mut tree = TreeBuilder::default();

    while let Some(token) = parser.advance() {
        match token.tok {
            Tok::Text => tree.text(&token.text),
            Tok::Ignored => {}
            Tok::OpenStart => {
                let (node, self_closing) = parser.parse_open_tag()?;
                tree.open(node, self_closing);
            }
            Tok::CloseStart => {
                let name = parser.parse_close_tag()?;
                tree.close(&name);
            }
            Tok::UnclosedQuote => return Err(ParseError::UnclosedAttribute(token.offset)),
            _ => {
                return Err(ParseError::UnexpectedToken {
                    position: token.offset,
                    message: format!("unexpected {:?} '{}' in content", token.tok, token.text),
                })
            }
        }
    }

    Ok(tree.finish())
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Token cursor.
struct Parser {
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: Tok, context: &str) -> Result<PToken, ParseError> {
        match self.advance() {
            Some(token) if token.tok == expected => Ok(token),
            Some(token) if token.tok == Tok::UnclosedQuote => {
                Err(ParseError::UnclosedAttribute(token.offset))
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                position: token.offset,
                message: format!(
                    "expected {expected:?} {context}, got {:?} '{}'",
                    token.tok, token.text
                ),
            }),
            None => Err(ParseError::UnexpectedEof(format!(
                "expected {expected:?} {context}"
            ))),
        }
    }

    /// Parse `name attr=value ... >` after `<`. Returns the node and whether
    /// the tag was self-closing.
    fn parse_open_tag(&mut self) -> Result<(ElementNode, bool), ParseError> {
        let name = self.expect(Tok::Name, "after '<'")?;
        let mut node = ElementNode::new(&name.text);

        loop {
            let Some(token) = self.advance() else {
                return Err(ParseError::UnexpectedEof(format!(
                    "unclosed tag <{}>",
                    node.tag()
                )));
            };
            match token.tok {
                Tok::End => return Ok((node, false)),
                Tok::SelfClose => return Ok((node, true)),
                Tok::Name => {
                    let value = if self.peek().is_some_and(|t| t.tok == Tok::Equals) {
                        self.cursor += 1;
                        let value = self.expect(Tok::Value, "after '='")?;
                        decode_entities(&value.text).into_owned()
                    } else {
                        String::new()
                    };
                    node = node.with_attr(&token.text, value);
                }
                Tok::UnclosedQuote => return Err(ParseError::UnclosedAttribute(token.offset)),
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        position: token.offset,
                        message: format!(
                            "unexpected {:?} '{}' in <{}>",
                            token.tok,
                            token.text,
                            node.tag()
                        ),
                    })
                }
            }
        }
    }

    /// Parse `name >` after `</`.
    fn parse_close_tag(&mut self) -> Result<String, ParseError> {
        let name = self.expect(Tok::Name, "after '</'")?;
        self.expect(Tok::End, "to end closing tag")?;
        Ok(name.text.to_ascii_lowercase())
    }
}

// ---------------------------------------------------------------------------
// TreeBuilder
// ---------------------------------------------------------------------------

/// An element whose closing tag has not been seen yet.
struct Open {
    node: ElementNode,
    text: String,
}

/// Stack of open elements plus the finished top-level roots.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
    roots: Vec<ElementNode>,
}

impl TreeBuilder {
    fn text(&mut self, raw: &str) {
        if let Some(open) = self.stack.last_mut() {
            open.text.push_str(&decode_entities(raw));
        }
    }

    fn open(&mut self, node: ElementNode, self_closing: bool) {
        if self_closing || is_void(node.tag()) {
            self.attach(node);
        } else {
            self.stack.push(Open {
                node,
                text: String::new(),
            });
        }
    }

    fn close(&mut self, tag: &str) {
        let Some(depth) = self.stack.iter().rposition(|o| o.node.tag() == tag) else {
            // Closing tags of void elements are common and harmless.
            if !is_void(tag) {
                tracing::debug!(tag, "ignoring stray closing tag");
            }
            return;
        };
        while self.stack.len() > depth {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(open) = self.stack.pop() {
            let text = open.text.trim();
            let node = if text.is_empty() {
                open.node
            } else {
                open.node.with_text(text)
            };
            self.attach(node);
        }
    }

    fn attach(&mut self, node: ElementNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.node.push_child(node),
            None => self.roots.push(node),
        }
    }

    fn finish(mut self) -> Vec<ElementNode> {
        if !self.stack.is_empty() {
            tracing::debug!(open = self.stack.len(), "closing unclosed elements at end of input");
        }
        while !self.stack.is_empty() {
            self.pop();
        }
        self.roots
    }
}

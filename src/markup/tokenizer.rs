//! logos-based markup tokenizer.
//!
//! Markup has two lexical contexts: element content (text, comments, tag
//! openers) and the inside of a tag (names, `=`, attribute values). Each has
//! its own token set; the lexer is switched between them with
//! [`Lexer::morph`] whenever a tag opens or closes.

use logos::{Lexer, Logos};

/// Tokens recognized between tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentToken {
    /// `<!-- ... -->`. An unterminated comment runs to end of input.
    #[token("<!--", comment)]
    Comment,

    /// `<!DOCTYPE ...>` and friends.
    #[token("<!", declaration)]
    Declaration,

    /// `<? ... ?>`.
    #[token("<?", declaration)]
    ProcessingInstruction,

    /// `</`
    #[token("</")]
    CloseTagStart,

    /// `<`
    #[token("<")]
    TagStart,

    /// Character data up to the next `<`.
    #[regex(r"[^<]+")]
    Text,
}

/// Tokens recognized inside `<...>`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum TagToken {
    /// `/>`
    #[token("/>")]
    SelfClose,

    /// `>`
    #[token(">")]
    End,

    /// `=`
    #[token("=")]
    Equals,

    /// `"..."`
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// `'...'`
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// Tag or attribute name.
    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", priority = 4)]
    Name,

    /// Unquoted attribute value.
    #[regex(r#"[^ \t\n\r\f"'=<>`/]+"#, priority = 2)]
    Unquoted,
}

fn comment(lex: &mut Lexer<ContentToken>) -> bool {
    let rest = lex.remainder();
    let len = rest.find("-->").map_or(rest.len(), |i| i + 3);
    lex.bump(len);
    true
}

fn declaration(lex: &mut Lexer<ContentToken>) -> bool {
    let rest = lex.remainder();
    let len = rest.find('>').map_or(rest.len(), |i| i + 1);
    lex.bump(len);
    true
}

/// Flattened token kind handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok {
    Text,
    /// Comment, declaration or processing instruction.
    Ignored,
    OpenStart,
    CloseStart,
    Name,
    Equals,
    /// Attribute value; the text has its quotes stripped.
    Value,
    End,
    SelfClose,
    /// A quoted value missing its closing quote.
    UnclosedQuote,
    /// Anything the lexer could not match.
    Invalid,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PToken {
    pub tok: Tok,
    pub text: String,
    pub offset: usize,
}

impl PToken {
    fn new(tok: Tok, text: &str, offset: usize) -> Self {
        Self {
            tok,
            text: text.to_owned(),
            offset,
        }
    }
}

/// Tokenize markup into a flat token stream.
pub fn tokenize(source: &str) -> Vec<PToken> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    while let Some(result) = content.next() {
        let offset = content.span().start;
        let slice = content.slice();
        let entering_tag = match result {
            Ok(ContentToken::Text) => {
                tokens.push(PToken::new(Tok::Text, slice, offset));
                false
            }
            Ok(
                ContentToken::Comment
                | ContentToken::Declaration
                | ContentToken::ProcessingInstruction,
            ) => {
                tokens.push(PToken::new(Tok::Ignored, slice, offset));
                false
            }
            Ok(ContentToken::TagStart) => {
                tokens.push(PToken::new(Tok::OpenStart, slice, offset));
                true
            }
            Ok(ContentToken::CloseTagStart) => {
                tokens.push(PToken::new(Tok::CloseStart, slice, offset));
                true
            }
            Err(()) => {
                tokens.push(PToken::new(Tok::Invalid, slice, offset));
                false
            }
        };

        if entering_tag {
            let mut tag = content.morph::<TagToken>();
            lex_tag(&mut tag, &mut tokens);
            content = tag.morph();
        }
    }

    tokens
}

/// Consume tag-mode tokens up to and including `>` or `/>`.
fn lex_tag(lex: &mut Lexer<TagToken>, tokens: &mut Vec<PToken>) {
    while let Some(result) = lex.next() {
        let offset = lex.span().start;
        let slice = lex.slice();
        let after_equals = tokens.last().is_some_and(|t| t.tok == Tok::Equals);
        let token = match result {
            Ok(TagToken::SelfClose) => PToken::new(Tok::SelfClose, slice, offset),
            Ok(TagToken::End) => PToken::new(Tok::End, slice, offset),
            Ok(TagToken::Equals) => PToken::new(Tok::Equals, slice, offset),
            Ok(TagToken::DoubleQuoted | TagToken::SingleQuoted) => {
                PToken::new(Tok::Value, &slice[1..slice.len() - 1], offset)
            }
            Ok(TagToken::Name) if after_equals => PToken::new(Tok::Value, slice, offset),
            Ok(TagToken::Name) => PToken::new(Tok::Name, slice, offset),
            Ok(TagToken::Unquoted) => PToken::new(Tok::Value, slice, offset),
            Err(()) if slice.starts_with(['"', '\'']) => {
                // The rest of the input cannot close this tag.
                let rest = lex.remainder().len();
                lex.bump(rest);
                tokens.push(PToken::new(Tok::UnclosedQuote, slice, offset));
                return;
            }
            Err(()) => PToken::new(Tok::Invalid, slice, offset),
        };
        let done = matches!(token.tok, Tok::End | Tok::SelfClose);
        tokens.push(token);
        if done {
            return;
        }
    }
}

//! Lexer for ranking expressions.
//!
//! Produces span-based tokens; whitespace is skipped but token adjacency can
//! still be recovered from the spans (the parser needs it to join hyphenated
//! identifiers inside feature arguments).
//!
//! Consecutive unrecognized characters are coalesced into one `Garbage` token.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("^")]
    Caret,

    #[token("!")]
    Bang,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("~=")]
    TildeEq,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEq,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEq,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    #[regex(r"'(?:[^'\\]|\\.)*'")]
    String,

    #[regex(r"[A-Za-z_$@][A-Za-z0-9_$@]*")]
    Identifier,

    /// Coalesced unrecognized characters
    Garbage,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::ParenOpen => "'('",
            TokenKind::ParenClose => "')'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::Bang => "'!'",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::TildeEq => "'~='",
            TokenKind::Less => "'<'",
            TokenKind::LessEq => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEq => "'>='",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Garbage => "unrecognized input",
        }
    }
}

/// Token kind plus its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span()]
    }

    /// True when `next` starts exactly where this token ends.
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.start
    }
}

pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                let span = lexer.span();
                if let Some(start) = error_start.take() {
                    tokens.push(Token {
                        kind: TokenKind::Garbage,
                        start,
                        end: span.start,
                    });
                }
                tokens.push(Token {
                    kind,
                    start: span.start,
                    end: span.end,
                });
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token {
                        kind: TokenKind::Garbage,
                        start,
                        end: source.len(),
                    });
                }
                break;
            }
        }
    }

    tokens
}

/// Content of a string token with its quotes removed and escapes resolved.
pub fn string_value(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(escaped @ ('"' | '\'' | '\\')) => value.push(escaped),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}

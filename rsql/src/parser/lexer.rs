use std::fmt::Display;
use std::iter::Peekable;
use std::str::Chars;

use crate::errors::{ErrorKind, RsqlError, RsqlResult};

/// Characters that cannot appear in an unquoted selector or argument.
pub const RESERVED_CHARS: [char; 12] = ['"', '\'', '(', ')', ';', ',', '=', '!', '~', '<', '>', ' '];

/// Returns `true` if `c` may appear in an unreserved (unquoted) string.
#[inline]
pub fn is_unreserved(c: char) -> bool {
    !RESERVED_CHARS.contains(&c) && !c.is_whitespace()
}

/// The kind of a lexical token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `;`
    And,
    /// `,`
    Or,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// A comparison symbol such as `==`, `=gt=` or `<=`.
    Operator(String),
    /// An unquoted string.
    Unreserved(String),
    /// A quoted string with quotes removed and escapes resolved.
    Quoted(String),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns the name used for this kind in syntax error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::And => "';'".to_string(),
            TokenKind::Or => "','".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Operator(symbol) => format!("operator '{}'", symbol),
            TokenKind::Unreserved(text) => format!("'{}'", text),
            TokenKind::Quoted(text) => format!("quoted '{}'", text),
            TokenKind::Eof => "<EOF>".to_string(),
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A token with its position in the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    /// Zero-based character offset of the first character.
    offset: usize,
    /// One-based line.
    line: usize,
    /// One-based column.
    column: usize,
}

impl Token {
    #[inline]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Splits RSQL text into tokens.
///
/// Whitespace between tokens is skipped. Once the input is exhausted the lexer
/// keeps returning [TokenKind::Eof] from [Lexer::next_token]; as an iterator it
/// yields the `Eof` token once and then stops.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::LexicalError] on a character that starts no token
    /// or on an unterminated quoted string.
    pub fn next_token(&mut self) -> RsqlResult<Token> {
        self.skip_whitespace();

        let (offset, line, column) = (self.offset, self.line, self.column);
        let token = |kind| Token {
            kind,
            offset,
            line,
            column,
        };

        let c = match self.chars.peek() {
            Some(c) => *c,
            None => return Ok(token(TokenKind::Eof)),
        };

        let kind = match c {
            ';' => {
                self.bump();
                TokenKind::And
            }
            ',' => {
                self.bump();
                TokenKind::Or
            }
            '(' => {
                self.bump();
                TokenKind::LParen
            }
            ')' => {
                self.bump();
                TokenKind::RParen
            }
            '"' | '\'' => self.read_quoted(c)?,
            '=' => self.read_fiql_operator()?,
            '<' | '>' => {
                self.bump();
                let mut symbol = c.to_string();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    symbol.push('=');
                }
                TokenKind::Operator(symbol)
            }
            '!' => {
                self.bump();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    TokenKind::Operator("!=".to_string())
                } else {
                    return Err(lexical_error('!', offset));
                }
            }
            c if is_unreserved(c) => {
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if !is_unreserved(c) {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
                TokenKind::Unreserved(text)
            }
            other => return Err(lexical_error(other, offset)),
        };

        log::trace!("Token {} at {}:{}", kind, line, column);
        Ok(token(kind))
    }

    fn read_quoted(&mut self, quote: char) -> RsqlResult<TokenKind> {
        let start = self.offset;
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(lexical_error(quote, start)),
                },
                Some(c) if c == quote => return Ok(TokenKind::Quoted(text)),
                Some(c) => text.push(c),
                None => {
                    log::error!("Unterminated quoted string starting at offset {}", start);
                    return Err(lexical_error(quote, start));
                }
            }
        }
    }

    // =[a-zA-Z]*=
    fn read_fiql_operator(&mut self) -> RsqlResult<TokenKind> {
        let start = self.offset;
        self.bump();

        let mut symbol = String::from("=");
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphabetic() {
                symbol.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if self.chars.peek() == Some(&'=') {
            self.bump();
            symbol.push('=');
            Ok(TokenKind::Operator(symbol))
        } else {
            Err(lexical_error('=', start))
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

impl Iterator for Lexer<'_> {
    type Item = RsqlResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        match &token {
            Ok(t) if t.is_eof() => self.finished = true,
            Err(_) => self.finished = true,
            _ => {}
        }
        Some(token)
    }
}

fn lexical_error(character: char, offset: usize) -> RsqlError {
    log::error!("Illegal character '{}' at offset {}", character, offset);
    RsqlError::new(
        &format!("Illegal character '{}' at offset {}", character, offset),
        ErrorKind::LexicalError { character, offset },
    )
}

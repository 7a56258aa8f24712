//! Token interface shared by the scanners and the parse drivers.

use std::{convert::Infallible, fmt};

/// The lexical class of a scanned token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Newline,
    Sign,
    Positive,
    Negative,
    EndOfFile,
    Error,
}

/// 1-based location of a token in the source text.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn eof(position: Position) -> Self {
        Self::new(TokenKind::EndOfFile, "", position)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfFile
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfFile => f.write_str("<eof>"),
            TokenKind::Newline => f.write_str("<newline>"),
            _ => f.write_str(&self.text),
        }
    }
}

/// A pull-based supplier of tokens.
///
/// Once the input is exhausted, implementations keep returning an
/// `EndOfFile` token.
pub trait TokenSource {
    type Error: fmt::Display;

    fn next_token(&mut self) -> Result<Token, Self::Error>;
}

impl<T: ?Sized> TokenSource for &mut T
where
    T: TokenSource,
{
    type Error = T::Error;

    fn next_token(&mut self) -> Result<Token, Self::Error> {
        (**self).next_token()
    }
}

/// Adapts an in-memory token sequence into a `TokenSource`.
#[derive(Debug)]
pub struct Tokens<I> {
    iter: I,
    last: Position,
}

impl<I> Tokens<I>
where
    I: Iterator<Item = Token>,
{
    pub fn new<T>(tokens: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: tokens.into_iter(),
            last: Position::new(1, 1),
        }
    }
}

impl<I> TokenSource for Tokens<I>
where
    I: Iterator<Item = Token>,
{
    type Error = Infallible;

    fn next_token(&mut self) -> Result<Token, Self::Error> {
        match self.iter.next() {
            Some(token) => {
                let width = token.text.chars().count().max(1) as u32;
                self.last = Position::new(token.position.line, token.position.column + width);
                Ok(token)
            }
            None => Ok(Token::eof(self.last)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_end_with_eof() {
        let mut source = Tokens::new(vec![Token::new(
            TokenKind::Identifier,
            "abc",
            Position::new(1, 1),
        )]);
        assert_eq!(source.next_token().unwrap().text, "abc");

        let eof = source.next_token().unwrap();
        assert!(eof.is_eof());
        assert_eq!(eof.position, Position::new(1, 4));
        assert!(source.next_token().unwrap().is_eof());
    }

    #[test]
    fn position_display() {
        assert_eq!(Position::new(3, 14).to_string(), "3:14");
    }
}

//! Source scanner feeding the parse drivers.

use elpar::runtime::{Position, Token, TokenKind, TokenSource};
use logos::Logos;

#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\f]+|#[^\n]*")]
enum Lexeme {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r#""[^"\n]*""#)]
    String,

    #[token("\n")]
    Newline,

    #[token("==")]
    #[token("<=")]
    #[token(">=")]
    #[regex(r"[!%&'()*+,\-./:;<=>?@\[\\\]^`{|}~]")]
    Sign,
}

impl Lexeme {
    fn kind(self) -> TokenKind {
        match self {
            Self::Identifier => TokenKind::Identifier,
            Self::Number => TokenKind::Number,
            Self::String => TokenKind::String,
            Self::Newline => TokenKind::Newline,
            Self::Sign => TokenKind::Sign,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized input `{}' at {}", text, position)]
pub struct ScanError {
    pub text: String,
    pub position: Position,
}

/// Splits source text into tokens, tracking line and column.
pub struct Scanner<'s> {
    lexer: logos::Lexer<'s, Lexeme>,
    line: u32,
    line_start: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            lexer: Lexeme::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    fn position(&self, offset: usize) -> Position {
        let column = self.lexer.source()[self.line_start..offset].chars().count();
        Position::new(self.line, column as u32 + 1)
    }
}

impl TokenSource for Scanner<'_> {
    type Error = ScanError;

    fn next_token(&mut self) -> Result<Token, Self::Error> {
        let Some(lexeme) = self.lexer.next() else {
            return Ok(Token::eof(self.position(self.lexer.source().len())));
        };

        let span = self.lexer.span();
        let position = self.position(span.start);
        let slice = self.lexer.slice();

        let Ok(lexeme) = lexeme else {
            return Err(ScanError {
                text: slice.to_owned(),
                position,
            });
        };

        if lexeme == Lexeme::Newline {
            self.line += 1;
            self.line_start = span.end;
        }

        let text = match lexeme {
            Lexeme::String => &slice[1..slice.len() - 1],
            _ => slice,
        };
        Ok(Token::new(lexeme.kind(), text, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        let mut tokens = vec![];
        loop {
            let token = scanner.next_token().unwrap();
            if token.is_eof() {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn kinds_and_positions() {
        let tokens = scan("let x_1 = 42 # note\n  print \"hi there\" >= $y");
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str(), t.position.line, t.position.column))
            .collect();
        assert_eq!(
            summary,
            [
                (TokenKind::Identifier, "let", 1, 1),
                (TokenKind::Identifier, "x_1", 1, 5),
                (TokenKind::Sign, "=", 1, 9),
                (TokenKind::Number, "42", 1, 11),
                (TokenKind::Newline, "\n", 1, 20),
                (TokenKind::Identifier, "print", 2, 3),
                (TokenKind::String, "hi there", 2, 9),
                (TokenKind::Sign, ">=", 2, 20),
                (TokenKind::Identifier, "$y", 2, 23),
            ]
        );
    }

    #[test]
    fn eof_repeats() {
        let mut scanner = Scanner::new("a");
        assert_eq!(scanner.next_token().unwrap().text, "a");
        let eof = scanner.next_token().unwrap();
        assert!(eof.is_eof());
        assert_eq!(eof.position, Position::new(1, 2));
        assert!(scanner.next_token().unwrap().is_eof());
    }

    #[test]
    fn unrecognized_input_is_an_error() {
        let mut scanner = Scanner::new("a\n \"open");
        scanner.next_token().unwrap();
        scanner.next_token().unwrap();
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.position, Position::new(2, 2));
    }
}

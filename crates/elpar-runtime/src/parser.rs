//! Shift/reduce parser.

use crate::{
    definition::{ParseAction, ParseActionError, ParseTable},
    token::{Position, Token, TokenKind, TokenSource},
    tree::SyntaxTree,
};
use std::{fmt, mem};

/// The parser driven based on the generated parse table.
#[derive(Debug)]
pub struct Parser<TDef>
where
    TDef: ParseTable,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    item_stack: Vec<ParseItem<TDef::Symbol>>,
    parser_state: ParserState,
    peeked_token: Option<Token>,
}

#[derive(Debug)]
enum ParserState {
    Reading,
    PendingGoto,
    Accepted,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            item_stack: vec![],
            parser_state: ParserState::Reading,
            peeked_token: None,
        }
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    pub fn next_event<S>(
        &mut self,
        tokens: &mut S,
        args: &mut Vec<ParseItem<TDef::Symbol>>,
    ) -> Result<ParseEvent<TDef>, ParseError<S::Error>>
    where
        S: TokenSource,
    {
        if matches!(self.parser_state, ParserState::Accepted) {
            return Err(ParseError::AlreadyAccepted);
        }

        loop {
            let current = *self
                .state_stack
                .last()
                .ok_or_else(|| ParseError::EmptyNodeStack)?;

            let input = match self.parser_state {
                ParserState::PendingGoto => match self
                    .item_stack
                    .last()
                    .ok_or_else(|| ParseError::EmptyItemStack)?
                {
                    ParseItem::N(s) => Some(*s),
                    ParseItem::T(s, _) => Some(*s),
                    ParseItem::__Empty => unreachable!(),
                },
                _ => {
                    if self.peeked_token.is_none() {
                        self.peeked_token = Some(read_token(tokens)?);
                    }
                    let token = self
                        .peeked_token
                        .as_ref()
                        .ok_or_else(|| ParseError::UnexpectedEOI)?;
                    if token.is_eof() {
                        None
                    } else {
                        match self.definition.terminal(token) {
                            Some(symbol) => Some(symbol),
                            None if token.kind == TokenKind::Newline => {
                                self.peeked_token = None;
                                continue;
                            }
                            None => {
                                let err = ParseError::InvalidToken {
                                    text: token.text.clone(),
                                    position: token.position,
                                };
                                tracing::error!("{}", err);
                                return Err(err);
                            }
                        }
                    }
                }
            };

            match self.definition.action(current, input) {
                ParseAction::Shift(n) => {
                    if !matches!(self.parser_state, ParserState::PendingGoto) {
                        let t = self
                            .peeked_token
                            .take()
                            .ok_or_else(|| ParseError::UnexpectedEOI)?;
                        let s = input.ok_or_else(|| ParseError::UnexpectedEOI)?;
                        self.item_stack.push(ParseItem::T(s, t));
                    }

                    self.parser_state = ParserState::Reading;
                    self.state_stack.push(n);
                    continue;
                }

                ParseAction::Reduce(reduce, lhs, n) => {
                    if n > self.state_stack.len() || n > self.item_stack.len() {
                        return Err(ParseError::EmptyItemStack);
                    }
                    args.resize_with(n, Default::default);
                    for i in 0..n {
                        self.state_stack.pop();
                        let arg = self
                            .item_stack
                            .pop()
                            .ok_or_else(|| ParseError::EmptyItemStack)?;
                        args[n - i - 1] = arg;
                    }

                    self.item_stack.push(ParseItem::N(lhs));
                    self.parser_state = ParserState::PendingGoto;

                    return Ok(ParseEvent::Reduce(reduce, lhs));
                }

                ParseAction::Accept => {
                    let arg = self
                        .item_stack
                        .pop()
                        .ok_or_else(|| ParseError::EmptyItemStack)?;
                    args.clear();
                    args.push(arg);

                    self.parser_state = ParserState::Accepted;
                    return Ok(ParseEvent::Accept);
                }

                ParseAction::Error(err) => {
                    if matches!(self.parser_state, ParserState::PendingGoto) {
                        return Err(ParseError::ParserDef(err));
                    }
                    let token = self
                        .peeked_token
                        .as_ref()
                        .ok_or_else(|| ParseError::UnexpectedEOI)?;
                    if token.kind == TokenKind::Newline {
                        self.peeked_token = None;
                        continue;
                    }
                    let err = ParseError::UnexpectedToken {
                        text: token.to_string(),
                        position: token.position,
                    };
                    tracing::error!("{}", err);
                    return Err(err);
                }
            }
        }
    }

    /// Drive the parser to completion, building the syntax tree of the input.
    pub fn parse<S>(mut self, mut tokens: S) -> Result<SyntaxTree<TDef::Symbol>, ParseError<S::Error>>
    where
        S: TokenSource,
    {
        let mut tree = SyntaxTree::new();
        let mut completed = vec![];
        let mut args = vec![];
        loop {
            match self.next_event(&mut tokens, &mut args)? {
                ParseEvent::Reduce(_, lhs) => {
                    let num_nonterminals = args
                        .iter()
                        .filter(|arg| matches!(arg, ParseItem::N(..)))
                        .count();
                    let offset = completed
                        .len()
                        .checked_sub(num_nonterminals)
                        .ok_or_else(|| ParseError::EmptyItemStack)?;
                    let mut nonterminals = completed.split_off(offset).into_iter();

                    let mut children = Vec::with_capacity(args.len());
                    for arg in args.iter_mut() {
                        match arg.take() {
                            Some(ParseItem::T(symbol, token)) => {
                                let leaf = tree.add_node(symbol);
                                tree.set_token(leaf, token);
                                children.push(leaf);
                            }
                            Some(ParseItem::N(..)) => {
                                children.extend(nonterminals.next());
                            }
                            _ => (),
                        }
                    }

                    let node = tree.add_node(lhs);
                    tree.set_children(node, children);
                    completed.push(node);
                }

                ParseEvent::Accept => {
                    let root = completed.pop().ok_or_else(|| ParseError::EmptyItemStack)?;
                    tree.set_root(root);
                    return Ok(tree);
                }
            }
        }
    }
}

pub(crate) fn read_token<S>(tokens: &mut S) -> Result<Token, ParseError<S::Error>>
where
    S: TokenSource,
{
    tokens.next_token().map_err(|err| {
        tracing::error!("failed to read token: {}", err);
        ParseError::Lexer(err)
    })
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TSym> {
    T(TSym, Token),
    N(TSym),

    #[doc(hidden)]
    __Empty,
}

impl<TSym> Default for ParseItem<TSym> {
    fn default() -> Self {
        Self::__Empty
    }
}

impl<TSym> ParseItem<TSym> {
    pub fn take(&mut self) -> Option<Self> {
        match mem::replace(self, Self::__Empty) {
            Self::__Empty => None,
            me => Some(me),
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<TDef>
where
    TDef: ParseTable,
{
    Reduce(TDef::Reduce, TDef::Symbol),
    Accept,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("failed to read token: {}", _0)]
    Lexer(L),

    #[error("invalid token {} at {}", text, position)]
    InvalidToken { text: String, position: Position },

    #[error("unexpected token {} at {}", text, position)]
    UnexpectedToken { text: String, position: Position },

    #[error("invalid syntax at {}", position)]
    InvalidSyntax { position: Position },

    #[error("from parser definition: {}", _0)]
    ParserDef(ParseActionError),

    #[error("unexpected EOI")]
    UnexpectedEOI,

    #[error("already accepted")]
    AlreadyAccepted,

    #[error("empty node stack")]
    EmptyNodeStack,

    #[error("empty item stack")]
    EmptyItemStack,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Tokens;

    // S -> ( S ) | x, with states numbered by hand.
    #[derive(Debug)]
    struct Parens;

    #[derive(Debug, Copy, Clone, PartialEq)]
    enum Sym {
        LParen,
        RParen,
        X,
        S,
    }

    impl fmt::Display for Sym {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self, f)
        }
    }

    impl ParseTable for Parens {
        type State = u8;
        type Symbol = Sym;
        type Reduce = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn terminal(&self, token: &Token) -> Option<Sym> {
            match &*token.text {
                "(" => Some(Sym::LParen),
                ")" => Some(Sym::RParen),
                "x" => Some(Sym::X),
                _ => None,
            }
        }

        fn action(&self, current: u8, lookahead: Option<Sym>) -> ParseAction<u8, Sym, u8> {
            use ParseAction::*;
            match (current, lookahead) {
                (0 | 2, Some(Sym::LParen)) => Shift(2),
                (0 | 2, Some(Sym::X)) => Shift(3),
                (0, Some(Sym::S)) => Shift(1),
                (2, Some(Sym::S)) => Shift(4),
                (1, None) => Accept,
                (3, Some(Sym::RParen) | None) => Reduce(1, Sym::S, 1),
                (4, Some(Sym::RParen)) => Shift(5),
                (5, Some(Sym::RParen) | None) => Reduce(0, Sym::S, 3),
                _ => Error(ParseActionError::IncorrectSymbol),
            }
        }
    }

    fn tokens(texts: &[&str]) -> Tokens<std::vec::IntoIter<Token>> {
        Tokens::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let kind = if *text == "\n" {
                        TokenKind::Newline
                    } else {
                        TokenKind::Sign
                    };
                    Token::new(kind, *text, Position::new(1, i as u32 + 1))
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn builds_tree_from_reductions() {
        let tree = Parser::new(Parens)
            .parse(tokens(&["(", "(", "x", ")", ")"]))
            .unwrap();
        let leaves: Vec<_> = tree.leaves().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(leaves, ["(", "(", "x", ")", ")"]);
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.symbol, Sym::S);
        assert_eq!(root.children.len(), 3);
    }

    #[test]
    fn skips_unexpected_newlines() {
        let tree = Parser::new(Parens)
            .parse(tokens(&["(", "\n", "x", ")"]))
            .unwrap();
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn reports_unexpected_token() {
        let err = Parser::new(Parens)
            .parse(tokens(&["(", "x", "x"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref text, position } if text == "x" && position == Position::new(1, 3)
        ));
    }

    #[test]
    fn reports_invalid_token() {
        let err = Parser::new(Parens).parse(tokens(&["y"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid token y at 1:1");
    }
}

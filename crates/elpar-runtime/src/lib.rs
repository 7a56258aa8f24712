//! Runtime implementation for `elpar` parsers.

pub mod definition;
pub mod parser;
pub mod predictive;
pub mod token;
pub mod tree;

pub use crate::{
    definition::{ParseAction, ParseActionError, ParseTable, PredictiveTable},
    parser::{ParseError, ParseEvent, ParseItem, Parser},
    predictive::PredictiveParser,
    token::{Position, Token, TokenKind, TokenSource, Tokens},
    tree::{Node, NodeID, SyntaxTree},
};

//! Grammar transformations and parse table construction for LL(1) and LR
//! parsers.

pub mod grammar;
pub mod ll1;
pub mod lr0;
pub mod parse_table;
pub mod serializer;
pub mod sets;
pub mod symbol;
pub mod syntax;
pub mod types;
pub mod util;

pub use crate::{
    grammar::{Alternative, AlternativeID, Grammar, GrammarDef, GrammarDefError, GrammarSet},
    ll1::LLParser,
    parse_table::LRTable,
    serializer::{CompiledParser, SerializeError},
    symbol::Symbol,
};
pub use elpar_runtime as runtime;

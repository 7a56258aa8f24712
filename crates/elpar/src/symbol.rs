//! Interned grammar symbols.

use crate::types::Map;
use elpar_runtime::{Token, TokenKind};
use std::{
    fmt,
    sync::{OnceLock, PoisonError, RwLock},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

/// A handle to a symbol registered in the process-wide symbol table.
///
/// Interning the same text with the same kind always returns the same handle,
/// so equality, ordering and hashing work on identity rather than on text.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol {
    raw: u32,
}

impl Symbol {
    /// The end-of-input marker.
    pub const ZERO: Self = Self::new(0);
    /// The empty derivation. Matches every token without consuming it.
    pub const EPSILON: Self = Self::new(1);
    pub const NUMBER: Self = Self::new(2);
    pub const STRING: Self = Self::new(3);
    pub const IDENTIFIER: Self = Self::new(4);
    pub const NEWLINE: Self = Self::new(5);
    pub const POSITIVE: Self = Self::new(6);
    pub const NEGATIVE: Self = Self::new(7);

    const BUILTINS: [(Self, &'static str); 8] = [
        (Self::ZERO, "zero"),
        (Self::EPSILON, "epsilon"),
        (Self::NUMBER, "number"),
        (Self::STRING, "string"),
        (Self::IDENTIFIER, "identifier"),
        (Self::NEWLINE, "newline"),
        (Self::POSITIVE, "positive"),
        (Self::NEGATIVE, "negative"),
    ];

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    /// Intern a terminal symbol.
    ///
    /// The texts of the builtin terminals (`zero`, `epsilon`, `number`, ...)
    /// resolve to the builtin instances.
    pub fn terminal(text: &str) -> Self {
        intern(SymbolKind::Terminal, text)
    }

    /// Intern a nonterminal symbol.
    pub fn nonterminal(text: &str) -> Self {
        intern(SymbolKind::Nonterminal, text)
    }

    pub fn kind(self) -> SymbolKind {
        with_registry(|r| r.entries[self.raw as usize].0)
    }

    pub fn is_terminal(self) -> bool {
        self.kind() == SymbolKind::Terminal
    }

    pub fn is_nonterminal(self) -> bool {
        self.kind() == SymbolKind::Nonterminal
    }

    pub fn is_builtin(self) -> bool {
        (self.raw as usize) < Self::BUILTINS.len()
    }

    pub fn name(self) -> &'static str {
        with_registry(|r| r.entries[self.raw as usize].1)
    }

    /// The token kind a builtin terminal stands for, if any.
    pub fn token_kind(self) -> Option<TokenKind> {
        match self {
            Self::NUMBER => Some(TokenKind::Number),
            Self::STRING => Some(TokenKind::String),
            Self::IDENTIFIER => Some(TokenKind::Identifier),
            Self::NEWLINE => Some(TokenKind::Newline),
            Self::POSITIVE => Some(TokenKind::Positive),
            Self::NEGATIVE => Some(TokenKind::Negative),
            _ => None,
        }
    }

    /// Test whether this terminal accepts the specified token.
    ///
    /// # Panics
    ///
    /// Panics when called on a nonterminal or on the end marker.
    pub fn matches(self, token: &Token) -> bool {
        match self {
            Self::ZERO => panic!("unable to compare zero with text"),
            Self::EPSILON => true,
            _ => match self.token_kind() {
                Some(kind) => token.kind == kind,
                None => {
                    assert!(
                        self.is_terminal(),
                        "match nonterminal symbol `{}' with a token",
                        self
                    );
                    token.text == self.name()
                }
            },
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            SymbolKind::Terminal => write!(f, "T({})", self.name()),
            SymbolKind::Nonterminal => write!(f, "N({})", self.name()),
        }
    }
}

#[derive(Debug)]
struct Registry {
    entries: Vec<(SymbolKind, &'static str)>,
    terminals: Map<&'static str, Symbol>,
    nonterminals: Map<&'static str, Symbol>,
}

impl Registry {
    fn new() -> Self {
        let mut registry = Self {
            entries: vec![],
            terminals: Map::default(),
            nonterminals: Map::default(),
        };
        for (symbol, name) in Symbol::BUILTINS {
            debug_assert_eq!(symbol.raw as usize, registry.entries.len());
            registry.entries.push((SymbolKind::Terminal, name));
            registry.terminals.insert(name, symbol);
        }
        registry
    }

    fn table(&self, kind: SymbolKind) -> &Map<&'static str, Symbol> {
        match kind {
            SymbolKind::Terminal => &self.terminals,
            SymbolKind::Nonterminal => &self.nonterminals,
        }
    }
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Registry::new()))
}

fn with_registry<R>(f: impl FnOnce(&Registry) -> R) -> R {
    let registry = registry().read().unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

fn intern(kind: SymbolKind, text: &str) -> Symbol {
    if let Some(symbol) = with_registry(|r| r.table(kind).get(text).copied()) {
        return symbol;
    }

    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have registered it between the two locks.
    if let Some(symbol) = registry.table(kind).get(text) {
        return *symbol;
    }

    let symbol = Symbol::new(registry.entries.len() as u32);
    let name: &'static str = Box::leak(text.to_owned().into_boxed_str());
    registry.entries.push((kind, name));
    match kind {
        SymbolKind::Terminal => registry.terminals.insert(name, symbol),
        SymbolKind::Nonterminal => registry.nonterminals.insert(name, symbol),
    };
    drop(registry);

    tracing::trace!("intern {:?}", symbol);
    symbol
}

#[cfg(test)]
mod tests {
    use super::*;
    use elpar_runtime::Position;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Position::new(1, 1))
    }

    #[test]
    fn interning_is_identity() {
        let a1 = Symbol::terminal("interning_is_identity");
        let a2 = Symbol::terminal("interning_is_identity");
        assert_eq!(a1, a2);

        let n = Symbol::nonterminal("interning_is_identity");
        assert_ne!(a1, n);
        assert_eq!(n, Symbol::nonterminal("interning_is_identity"));
        assert_eq!(a1.name(), n.name());
        assert!(a1.is_terminal());
        assert!(n.is_nonterminal());
    }

    #[test]
    fn builtin_texts() {
        assert_eq!(Symbol::terminal("epsilon"), Symbol::EPSILON);
        assert_eq!(Symbol::terminal("zero"), Symbol::ZERO);
        assert_eq!(Symbol::terminal("negative"), Symbol::NEGATIVE);
        assert!(Symbol::IDENTIFIER.is_builtin());
        assert!(!Symbol::terminal("builtin_texts").is_builtin());
        assert_ne!(Symbol::nonterminal("number"), Symbol::NUMBER);
    }

    #[test]
    fn matches_by_text_or_kind() {
        let plus = Symbol::terminal("+");
        assert!(plus.matches(&token(TokenKind::Sign, "+")));
        assert!(!plus.matches(&token(TokenKind::Sign, "-")));

        assert!(Symbol::NUMBER.matches(&token(TokenKind::Number, "42")));
        assert!(!Symbol::NUMBER.matches(&token(TokenKind::Identifier, "x")));
        assert!(Symbol::IDENTIFIER.matches(&token(TokenKind::Identifier, "x")));
        assert!(Symbol::EPSILON.matches(&token(TokenKind::Sign, ";")));
    }

    #[test]
    #[should_panic(expected = "match nonterminal symbol")]
    fn matching_nonterminal_panics() {
        Symbol::nonterminal("matching_nonterminal_panics").matches(&token(TokenKind::Sign, "+"));
    }

    #[test]
    #[should_panic(expected = "unable to compare zero")]
    fn matching_zero_panics() {
        Symbol::ZERO.matches(&Token::eof(Position::new(1, 1)));
    }
}

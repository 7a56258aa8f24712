//! Grammar types.

use crate::{
    symbol::Symbol,
    types::{Map, Set},
    util::{display_fn, heading, join},
};
use elpar_runtime::{Token, TokenKind};
use std::{cmp::Ordering, fmt, fs, io, path::Path};

/// One right-hand side choice of a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternative {
    symbols: Vec<Symbol>,
    action: Option<String>,
}

impl Alternative {
    /// # Panics
    ///
    /// Panics if `symbols` is empty.
    pub fn new(symbols: Vec<Symbol>, action: Option<String>) -> Self {
        assert!(!symbols.is_empty(), "empty alternative");
        Self { symbols, action }
    }

    /// The alternative deriving the empty string.
    pub fn epsilon() -> Self {
        Self::new(vec![Symbol::EPSILON], None)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols[..]
    }

    /// The semantic action attached to this alternative, uninterpreted.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols[0] == Symbol::EPSILON
    }

    /// The number of symbols this alternative consumes when it is reduced.
    pub fn arity(&self) -> usize {
        if self.is_epsilon() {
            0
        } else {
            self.symbols.len()
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", join(&self.symbols, " "))?;
        if let Some(action) = &self.action {
            write!(f, " => {}", action)?;
        }
        Ok(())
    }
}

/// Length of the longest common symbol prefix of two alternatives.
pub fn common_prefix(a: &Alternative, b: &Alternative) -> usize {
    a.symbols
        .iter()
        .zip(&b.symbols)
        .take_while(|(x, y)| x == y)
        .count()
}

/// All the alternatives of one nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    lhs: Symbol,
    alternatives: Vec<Alternative>,
}

impl Grammar {
    pub fn new(lhs: Symbol) -> Self {
        assert!(lhs.is_nonterminal(), "`{}' is not a nonterminal", lhs);
        Self {
            lhs,
            alternatives: vec![],
        }
    }

    /// Restore a grammar keeping the alternatives in the given order.
    pub(crate) fn from_parts(lhs: Symbol, alternatives: Vec<Alternative>) -> Self {
        Self { lhs, alternatives }
    }

    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives[..]
    }

    /// Whether the alternative starts with the left-hand side of this grammar.
    pub fn is_left_recursive(&self, alternative: &Alternative) -> bool {
        alternative.symbols[0] == self.lhs
    }

    /// Append an alternative.
    ///
    /// Left-recursive alternatives are placed in front of the others.
    pub fn add_alternative(&mut self, alternative: Alternative) {
        if self.is_left_recursive(&alternative) {
            self.alternatives.insert(0, alternative);
        } else {
            self.alternatives.push(alternative);
        }
    }

    /// Sort the alternatives so that the ones sharing a prefix become adjacent.
    ///
    /// Left-recursive alternatives stay in front. Past the common prefix, an
    /// alternative that ends there is ordered after the longer one, otherwise
    /// the first differing symbols are compared in reverse order.
    pub fn sort_alternatives(&mut self) {
        let lhs = self.lhs;
        self.alternatives.sort_by(|a, b| {
            let recursive = (b.symbols[0] == lhs).cmp(&(a.symbols[0] == lhs));
            if recursive != Ordering::Equal {
                return recursive;
            }
            let n = common_prefix(a, b);
            match (a.symbols.get(n), b.symbols.get(n)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => y.cmp(x),
            }
        });
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<22}{}",
            self.lhs.name(),
            join(&self.alternatives, " | ")
        )
    }
}

/// Identifies an alternative inside a `GrammarSet` by position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlternativeID {
    pub grammar: u16,
    pub index: u16,
}

impl AlternativeID {
    pub const fn new(grammar: u16, index: u16) -> Self {
        Self { grammar, index }
    }

    /// # Panics
    ///
    /// Panics if either position does not fit in 16 bits.
    pub fn from_indices(grammar: usize, index: usize) -> Self {
        Self {
            grammar: u16::try_from(grammar).expect("too many grammars"),
            index: u16::try_from(index).expect("too many alternatives"),
        }
    }

    /// Pack into a single integer: the alternative index in the low word and
    /// the grammar index in the high word.
    pub const fn into_raw(self) -> u32 {
        (self.grammar as u32) << 16 | self.index as u32
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self {
            grammar: (raw >> 16) as u16,
            index: raw as u16,
        }
    }
}

impl fmt::Display for AlternativeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.grammar, self.index)
    }
}

/// The ordered collection of grammars.
///
/// The left-hand side of the first grammar is the start symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarSet {
    grammars: Vec<Grammar>,
}

impl From<Vec<Grammar>> for GrammarSet {
    fn from(grammars: Vec<Grammar>) -> Self {
        Self { grammars }
    }
}

impl GrammarSet {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, GrammarDefError> {
        crate::syntax::parse(source)
    }

    /// Define a grammar collection using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            grammars: vec![],
            start: None,
        };
        f(&mut def)?;
        def.end()
    }

    pub fn grammars(&self) -> &[Grammar] {
        &self.grammars[..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grammar> {
        self.grammars.iter()
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub fn into_grammars(self) -> Vec<Grammar> {
        self.grammars
    }

    /// # Panics
    ///
    /// Panics if the collection is empty.
    pub fn start_symbol(&self) -> Symbol {
        self.grammars
            .first()
            .map(Grammar::lhs)
            .unwrap_or_else(|| panic!("empty grammar set"))
    }

    pub fn position(&self, lhs: Symbol) -> Option<usize> {
        self.grammars.iter().position(|g| g.lhs == lhs)
    }

    /// # Panics
    ///
    /// Panics if no grammar has `lhs` as its left-hand side.
    pub fn find_grammar(&self, lhs: Symbol) -> (usize, &Grammar) {
        match self.position(lhs) {
            Some(i) => (i, &self.grammars[i]),
            None => panic!("invalid production: `{}'", lhs),
        }
    }

    /// Resolve an alternative by its identifier, along with the owning grammar.
    pub fn target_alternative(&self, id: AlternativeID) -> (&Alternative, &Grammar) {
        let g = &self.grammars[id.grammar as usize];
        (&g.alternatives[id.index as usize], g)
    }

    pub fn alternative(&self, id: AlternativeID) -> &Alternative {
        self.target_alternative(id).0
    }

    pub fn alternative_ids(&self) -> impl Iterator<Item = AlternativeID> + '_ {
        self.grammars.iter().enumerate().flat_map(|(gi, g)| {
            (0..g.alternatives.len()).map(move |i| AlternativeID::from_indices(gi, i))
        })
    }

    /// The terminal symbols in order of first appearance.
    pub fn terminals(&self) -> Vec<Symbol> {
        let mut terminals = Set::default();
        for g in &self.grammars {
            for alt in &g.alternatives {
                terminals.extend(alt.symbols.iter().filter(|s| s.is_terminal()));
            }
        }
        terminals.into_iter().collect()
    }

    /// The nonterminal symbols, left-hand sides first.
    pub fn nonterminals(&self) -> Vec<Symbol> {
        let mut nonterminals: Set<Symbol> = self.grammars.iter().map(Grammar::lhs).collect();
        for g in &self.grammars {
            for alt in &g.alternatives {
                nonterminals.extend(alt.symbols.iter().filter(|s| s.is_nonterminal()));
            }
        }
        nonterminals.into_iter().collect()
    }

    pub fn display_alternative(&self, id: AlternativeID) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let (alt, g) = self.target_alternative(id);
            write!(f, "{} : {}", g.lhs, alt)
        })
    }
}

impl<'a> IntoIterator for &'a GrammarSet {
    type Item = &'a Grammar;
    type IntoIter = std::slice::Iter<'a, Grammar>;

    fn into_iter(self) -> Self::IntoIter {
        self.grammars.iter()
    }
}

impl fmt::Display for GrammarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", heading("Grammars"))?;
        for g in &self.grammars {
            writeln!(f, "{}", g)?;
        }
        Ok(())
    }
}

/// Maps scanned tokens to the terminal symbols of a grammar.
#[derive(Debug, Clone, Default)]
pub struct TerminalMap {
    by_text: Map<&'static str, Symbol>,
    by_kind: Map<TokenKind, Symbol>,
}

impl TerminalMap {
    pub fn new<I>(terminals: I) -> Self
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut map = Self::default();
        for symbol in terminals {
            match symbol.token_kind() {
                Some(kind) => {
                    map.by_kind.insert(kind, symbol);
                }
                None if !symbol.is_builtin() => {
                    map.by_text.insert(symbol.name(), symbol);
                }
                None => (),
            }
        }
        map
    }

    /// Find the terminal the token stands for.
    ///
    /// Literal texts take priority over token classes, so a keyword terminal
    /// wins over `identifier`. The end of input is always `zero` and a line
    /// break is always `newline`.
    pub fn find(&self, token: &Token) -> Option<Symbol> {
        match token.kind {
            TokenKind::EndOfFile => Some(Symbol::ZERO),
            TokenKind::Newline => Some(Symbol::NEWLINE),
            TokenKind::String => self.by_kind.get(&TokenKind::String).copied(),
            kind => self
                .by_text
                .get(token.text.as_str())
                .or_else(|| self.by_kind.get(&kind))
                .copied(),
        }
    }
}

/// The contextual values for building a `GrammarSet`.
#[derive(Debug)]
pub struct GrammarDef {
    grammars: Vec<Grammar>,
    start: Option<Symbol>,
}

impl GrammarDef {
    /// Add an alternative `lhs -> rhs` to the grammar of `lhs`.
    pub fn rule<I>(&mut self, lhs: Symbol, rhs: I, action: Option<&str>) -> Result<(), GrammarDefError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        if !lhs.is_nonterminal() {
            return Err(format!("`{}' is not a nonterminal symbol", lhs).into());
        }

        let symbols: Vec<Symbol> = rhs.into_iter().collect();
        if symbols.is_empty() {
            return Err(format!("empty alternative for `{}'", lhs).into());
        }
        if symbols.len() > 1 && symbols.contains(&Symbol::EPSILON) {
            return Err(format!("epsilon must stand alone in an alternative of `{}'", lhs).into());
        }

        let g = match self.grammars.iter().position(|g| g.lhs == lhs) {
            Some(i) => &mut self.grammars[i],
            None => {
                self.grammars.push(Grammar::new(lhs));
                self.grammars.last_mut().ok_or("empty grammar set")?
            }
        };
        if g.alternatives.iter().any(|alt| alt.symbols == symbols) {
            return Err(format!("duplicate alternative for `{}'", lhs).into());
        }
        g.add_alternative(Alternative::new(symbols, action.map(Into::into)));

        Ok(())
    }

    /// Specify the start symbol. Defaults to the first defined left-hand side.
    pub fn start_symbol(&mut self, symbol: Symbol) -> Result<(), GrammarDefError> {
        if !symbol.is_nonterminal() {
            return Err(format!("`{}' is not a nonterminal symbol", symbol).into());
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn end(mut self) -> Result<GrammarSet, GrammarDefError> {
        if self.grammars.is_empty() {
            return Err("empty grammar set".into());
        }

        if let Some(start) = self.start.take() {
            let i = self
                .grammars
                .iter()
                .position(|g| g.lhs == start)
                .ok_or_else(|| format!("start symbol `{}' has no production", start))?;
            let g = self.grammars.remove(i);
            self.grammars.insert(0, g);
        }

        let grammars = GrammarSet::from(self.grammars);
        for symbol in grammars.nonterminals() {
            if grammars.position(symbol).is_none() {
                return Err(GrammarDefError::UndefinedSymbol {
                    name: symbol.name().to_owned(),
                });
            }
        }

        Ok(grammars)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error at line {}: {}", line, msg)]
    Syntax { line: usize, msg: String },

    #[error("Undefined symbol: `{}'", name)]
    UndefinedSymbol { name: String },

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
impl From<&str> for GrammarDefError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}
impl From<String> for GrammarDefError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elpar_runtime::Position;

    fn t(s: &str) -> Symbol {
        Symbol::terminal(s)
    }
    fn n(s: &str) -> Symbol {
        Symbol::nonterminal(s)
    }
    fn alt(symbols: &[Symbol]) -> Alternative {
        Alternative::new(symbols.to_vec(), None)
    }

    #[test]
    fn left_recursive_alternative_goes_first() {
        let e = n("grammar_lr_E");
        let mut g = Grammar::new(e);
        g.add_alternative(alt(&[t("n")]));
        g.add_alternative(alt(&[e, t("+"), t("n")]));
        assert_eq!(g.alternatives()[0].symbols()[0], e);
        assert_eq!(g.alternatives()[1].symbols(), [t("n")]);
    }

    #[test]
    #[should_panic(expected = "empty alternative")]
    fn empty_alternative_panics() {
        let _ = Alternative::new(vec![], None);
    }

    #[test]
    fn sort_groups_common_prefixes() {
        let (a, b, c) = (t("a"), t("b"), t("c"));
        let mut g = Grammar::new(n("grammar_sort_S"));
        g.add_alternative(alt(&[a, b]));
        g.add_alternative(alt(&[c]));
        g.add_alternative(alt(&[a]));
        g.add_alternative(alt(&[a, c]));
        g.sort_alternatives();

        let alts = g.alternatives();
        let a_pos: Vec<_> = (0..alts.len())
            .filter(|i| alts[*i].symbols()[0] == a)
            .collect();
        assert_eq!(a_pos.len(), 3);
        assert_eq!(a_pos[2] - a_pos[0], 2, "alternatives starting with `a' are adjacent");
        // the alternative ending at the shared prefix sorts after the longer ones
        assert_eq!(alts[a_pos[2]].symbols(), [a]);
    }

    #[test]
    fn sort_keeps_left_recursion_in_front() {
        let e = n("grammar_sort_E");
        let (x, plus) = (t("grammar_sort_x"), t("grammar_sort_plus"));
        let mut g = Grammar::new(e);
        g.add_alternative(alt(&[x]));
        g.add_alternative(alt(&[e, plus, x]));
        g.add_alternative(alt(&[t("grammar_sort_y"), x]));
        g.sort_alternatives();

        assert!(g.is_left_recursive(&g.alternatives()[0]));
        let recursive = g
            .alternatives()
            .iter()
            .filter(|alt| g.is_left_recursive(alt))
            .count();
        assert_eq!(recursive, 1);
    }

    #[test]
    #[should_panic(expected = "too many alternatives")]
    fn alternative_index_overflow_panics() {
        let alternatives = vec![alt(&[t("grammar_overflow_x")]); u16::MAX as usize + 2];
        let grammars = GrammarSet::from(vec![Grammar::from_parts(
            n("grammar_overflow_S"),
            alternatives,
        )]);
        let ids: Vec<_> = grammars.alternative_ids().collect();
        assert_eq!(ids.len(), u16::MAX as usize + 2);
    }

    #[test]
    fn alternative_id_packing() {
        let last = AlternativeID::from_indices(1, u16::MAX as usize);
        assert_eq!(last, AlternativeID::new(1, u16::MAX));

        let id = AlternativeID::new(3, 7);
        assert_eq!(id.into_raw(), 0x0003_0007);
        assert_eq!(AlternativeID::from_raw(id.into_raw()), id);
    }

    #[test]
    fn define_and_lookup() {
        let (s, a) = (n("grammar_def_S"), n("grammar_def_A"));
        let x = t("x");
        let grammars = GrammarSet::define(|g| {
            g.rule(a, [x, a], Some("cons"))?;
            g.rule(a, [Symbol::EPSILON], None)?;
            g.rule(s, [a], None)?;
            g.start_symbol(s)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(grammars.start_symbol(), s);
        assert_eq!(grammars.nonterminals(), [s, a]);
        assert_eq!(grammars.terminals(), [x, Symbol::EPSILON]);

        let (alt, g) = grammars.target_alternative(AlternativeID::new(1, 0));
        assert_eq!(g.lhs(), a);
        assert_eq!(alt.action(), Some("cons"));
        assert_eq!(grammars.find_grammar(a).0, 1);
        eprintln!("{}", grammars);
    }

    #[test]
    fn undefined_nonterminal_is_an_error() {
        let err = GrammarSet::define(|g| {
            g.rule(n("grammar_undef_S"), [n("grammar_undef_T")], None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::UndefinedSymbol { ref name } if name == "grammar_undef_T"));
    }

    #[test]
    #[should_panic(expected = "invalid production")]
    fn find_undefined_grammar_panics() {
        let grammars = GrammarSet::define(|g| g.rule(n("grammar_find_S"), [t("x")], None)).unwrap();
        grammars.find_grammar(n("grammar_find_T"));
    }

    #[test]
    fn terminal_map_prefers_literals() {
        let map = TerminalMap::new([t("if"), Symbol::IDENTIFIER, Symbol::NUMBER]);
        let pos = Position::new(1, 1);
        let find = |kind, text| map.find(&Token::new(kind, text, pos));

        assert_eq!(find(TokenKind::Identifier, "if"), Some(t("if")));
        assert_eq!(find(TokenKind::Identifier, "foo"), Some(Symbol::IDENTIFIER));
        assert_eq!(find(TokenKind::Number, "1"), Some(Symbol::NUMBER));
        assert_eq!(find(TokenKind::Sign, "+"), None);
        assert_eq!(find(TokenKind::Newline, "\n"), Some(Symbol::NEWLINE));
        assert_eq!(map.find(&Token::eof(pos)), Some(Symbol::ZERO));
    }
}

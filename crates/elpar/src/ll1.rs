//! LL(1) grammar transformations and the predictive parsing table.

use crate::{
    grammar::{common_prefix, Alternative, AlternativeID, Grammar, GrammarSet, TerminalMap},
    sets::{FirstSets, FollowSets},
    symbol::Symbol,
    types::{Matrix, Set},
    util::heading,
};
use elpar_runtime::{ParseError, PredictiveParser, PredictiveTable, SyntaxTree, Token, TokenSource};
use std::{collections::VecDeque, fmt, mem, ops::Range};

/// Remove direct left recursion from every grammar.
///
/// `A -> A α | β` is replaced in place by `A -> β A_2` and
/// `A_2 -> α A_2 | epsilon`. Returns whether any grammar was rewritten.
#[tracing::instrument(skip_all)]
pub fn remove_left_recursion(grammars: &mut GrammarSet) -> bool {
    let mut taken: Set<Symbol> = grammars.nonterminals().into_iter().collect();
    let mut changed = false;

    let mut result = Vec::with_capacity(grammars.len());
    for g in mem::take(grammars).into_grammars() {
        match split_left_recursion(&g, &mut taken) {
            Some((head, tail)) => {
                tracing::debug!("remove left recursion of `{}' via `{}'", g.lhs(), tail.lhs());
                result.push(head);
                result.push(tail);
                changed = true;
            }
            None => result.push(g),
        }
    }

    *grammars = GrammarSet::from(result);
    changed
}

fn split_left_recursion(g: &Grammar, taken: &mut Set<Symbol>) -> Option<(Grammar, Grammar)> {
    let lhs = g.lhs();
    let alternatives = g.alternatives();

    // left-recursive alternatives are always kept in front.
    let pos = alternatives
        .iter()
        .take_while(|alt| g.is_left_recursive(alt))
        .count();
    if pos == 0 {
        return None;
    }
    assert!(
        pos < alternatives.len(),
        "invalid production: every alternative of `{}' is left-recursive",
        lhs
    );

    let (lhs2, _) = fresh_nonterminal(lhs, 2, taken);

    let mut head = Grammar::new(lhs);
    for alt in &alternatives[pos..] {
        let mut symbols = match alt.is_epsilon() {
            true => vec![],
            false => alt.symbols().to_vec(),
        };
        symbols.push(lhs2);
        head.add_alternative(Alternative::new(symbols, alt.action().map(Into::into)));
    }

    let mut tail = Grammar::new(lhs2);
    for alt in &alternatives[..pos] {
        let rest = &alt.symbols()[1..];
        if rest.is_empty() {
            // `A -> A` derives nothing new.
            continue;
        }
        let mut symbols = rest.to_vec();
        symbols.push(lhs2);
        tail.add_alternative(Alternative::new(symbols, alt.action().map(Into::into)));
    }
    tail.add_alternative(Alternative::epsilon());

    Some((head, tail))
}

/// Left-factor every grammar until no two alternatives share a prefix.
///
/// A factored grammar is replaced in place by its rewritten form followed by
/// the helper grammars, the most recently created first. Returns whether any
/// grammar was rewritten.
#[tracing::instrument(skip_all)]
pub fn left_factor(grammars: &mut GrammarSet) -> bool {
    let mut taken: Set<Symbol> = grammars.nonterminals().into_iter().collect();
    let mut changed = false;

    let mut result = Vec::with_capacity(grammars.len());
    for mut g in mem::take(grammars).into_grammars() {
        g.sort_alternatives();
        let factored = factor_grammar(g, &mut taken);
        changed |= factored.len() > 1;
        result.extend(factored);
    }

    *grammars = GrammarSet::from(result);
    changed
}

/// Find the run of adjacent alternatives sharing the longest prefix.
///
/// The scan stops at the first adjacent pair whose common prefix is shorter
/// than the best one found so far.
fn longest_factor(g: &Grammar) -> Option<(Range<usize>, usize)> {
    let alternatives = g.alternatives();
    let (mut from, mut max) = (0, 0);
    let mut index = 1;
    while index < alternatives.len() {
        let len = common_prefix(&alternatives[index - 1], &alternatives[index]);
        if len < max {
            break;
        }
        if len > max {
            from = index - 1;
            max = len;
        }
        index += 1;
    }
    (max > 0).then_some((from..index, max))
}

fn factor_grammar(mut g: Grammar, taken: &mut Set<Symbol>) -> Vec<Grammar> {
    let lhs = g.lhs();
    let mut helpers = VecDeque::new();
    let mut next_index = 2;

    while let Some((range, len)) = longest_factor(&g) {
        let (helper, index) = fresh_nonterminal(lhs, next_index, taken);
        next_index = index + 1;

        let alternatives = g.alternatives();
        let prefix = &alternatives[range.start].symbols()[..len];
        tracing::debug!(
            "factor `{}' out of {} alternatives of `{}' into `{}'",
            crate::util::join(prefix, " "),
            range.len(),
            lhs,
            helper
        );

        let mut rewritten = Grammar::new(lhs);
        let mut symbols = prefix.to_vec();
        symbols.push(helper);
        rewritten.add_alternative(Alternative::new(symbols, None));
        for alt in alternatives[..range.start]
            .iter()
            .chain(&alternatives[range.end..])
        {
            rewritten.add_alternative(alt.clone());
        }

        let mut factored = Grammar::new(helper);
        for alt in &alternatives[range] {
            let action = alt.action().map(Into::into);
            let suffix = &alt.symbols()[len..];
            factored.add_alternative(match suffix.is_empty() {
                true => Alternative::new(vec![Symbol::EPSILON], action),
                false => Alternative::new(suffix.to_vec(), action),
            });
        }
        helpers.push_front(factored);

        rewritten.sort_alternatives();
        g = rewritten;
    }

    std::iter::once(g).chain(helpers).collect()
}

/// Intern `<lhs>_<n>` for the smallest `n >= start` not used yet.
fn fresh_nonterminal(lhs: Symbol, start: usize, taken: &mut Set<Symbol>) -> (Symbol, usize) {
    let mut n = start;
    loop {
        let symbol = Symbol::nonterminal(&format!("{}_{}", lhs.name(), n));
        if taken.insert(symbol) {
            return (symbol, n);
        }
        n += 1;
    }
}

/// A duplicated entry found while filling the parsing table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LLConflict {
    pub nonterminal: Symbol,
    pub terminal: Symbol,
    pub kept: AlternativeID,
    pub dropped: AlternativeID,
}

/// A predictive parser built from a grammar collection.
#[derive(Debug)]
pub struct LLParser {
    grammars: GrammarSet,
    first: FirstSets,
    follow: FollowSets,
    table: Matrix<Symbol, Symbol, AlternativeID>,
    terminals: TerminalMap,
    conflicts: Vec<LLConflict>,
}

impl LLParser {
    /// Transform the grammars into LL(1) form and build the parsing table.
    ///
    /// Conflicting table entries are reported as warnings and the first
    /// entry is kept, so this never fails.
    #[tracing::instrument(skip_all)]
    pub fn new(mut grammars: GrammarSet) -> Self {
        remove_left_recursion(&mut grammars);
        left_factor(&mut grammars);

        let first = FirstSets::new(&grammars);
        let follow = FollowSets::new(&grammars, &first);

        let mut me = Self {
            terminals: TerminalMap::new(grammars.terminals()),
            grammars,
            first,
            follow,
            table: Matrix::default(),
            conflicts: vec![],
        };
        me.build_table();
        me
    }

    /// Restore a parser from a previously built table.
    pub(crate) fn from_parts(
        grammars: GrammarSet,
        table: Matrix<Symbol, Symbol, AlternativeID>,
    ) -> Self {
        Self {
            terminals: TerminalMap::new(grammars.terminals()),
            grammars,
            first: FirstSets::default(),
            follow: FollowSets::default(),
            table,
            conflicts: vec![],
        }
    }

    fn build_table(&mut self) {
        let ids: Vec<_> = self.grammars.alternative_ids().collect();
        for id in ids {
            let (alt, g) = self.grammars.target_alternative(id);
            let lhs = g.lhs();

            let first = self.first.of_sequence(alt.symbols());
            let mut lookaheads: Vec<Symbol> = first
                .iter()
                .copied()
                .filter(|s| *s != Symbol::EPSILON)
                .collect();
            if first.contains(&Symbol::EPSILON) {
                lookaheads.extend(self.follow.get(lhs).into_iter().flatten().copied());
            }

            for terminal in lookaheads {
                self.insert(lhs, terminal, id);
            }
        }
        tracing::debug!(
            "parsing table has {} entries, {} conflicts",
            self.table.len(),
            self.conflicts.len()
        );
    }

    fn insert(&mut self, nonterminal: Symbol, terminal: Symbol, id: AlternativeID) {
        if let Err(&kept) = self.table.try_insert(nonterminal, terminal, id) {
            if kept == id {
                return;
            }
            tracing::warn!(
                "invalid LL(1) grammar at [{}, {}]\n(1) {}\n(2) {}",
                nonterminal,
                terminal,
                self.grammars.display_alternative(kept),
                self.grammars.display_alternative(id),
            );
            self.conflicts.push(LLConflict {
                nonterminal,
                terminal,
                kept,
                dropped: id,
            });
        }
    }

    pub fn grammars(&self) -> &GrammarSet {
        &self.grammars
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow
    }

    pub fn table(&self) -> &Matrix<Symbol, Symbol, AlternativeID> {
        &self.table
    }

    pub fn conflicts(&self) -> &[LLConflict] {
        &self.conflicts[..]
    }

    /// Parse the token stream with this table.
    pub fn parse<S>(&self, tokens: S) -> Result<SyntaxTree<Symbol>, ParseError<S::Error>>
    where
        S: TokenSource,
    {
        PredictiveParser::new(self).parse(tokens)
    }
}

impl PredictiveTable for LLParser {
    type Symbol = Symbol;
    type Production = AlternativeID;

    fn start_symbol(&self) -> Symbol {
        self.grammars.start_symbol()
    }

    fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.is_terminal()
    }

    fn is_epsilon(&self, symbol: Symbol) -> bool {
        symbol == Symbol::EPSILON
    }

    fn matches(&self, symbol: Symbol, token: &Token) -> bool {
        symbol.matches(token)
    }

    fn terminal(&self, token: &Token) -> Option<Symbol> {
        self.terminals.find(token)
    }

    fn predict(&self, top: Symbol, lookahead: Symbol) -> Option<(AlternativeID, &[Symbol])> {
        let id = *self.table.get(top, lookahead)?;
        Some((id, self.grammars.alternative(id).symbols()))
    }
}

impl fmt::Display for LLParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.grammars)?;
        writeln!(f, "{}", self.first)?;
        writeln!(f, "{}", self.follow)?;
        write!(f, "{}", heading("ParsingTable"))?;
        for (nonterminal, terminal, id) in self.table.iter() {
            let slot = format!("[{}, {}]", nonterminal, terminal);
            writeln!(f, "{:<28}{}", slot, self.grammars.display_alternative(*id))?;
        }
        Ok(())
    }
}

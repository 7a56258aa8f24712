//! LR(0) item sets and the automaton over them.

use crate::{
    grammar::{AlternativeID, GrammarSet},
    sets::FirstSets,
    symbol::Symbol,
    types::{Map, Matrix},
    util::{display_fn, heading},
};
use std::{collections::BTreeSet, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);

impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }

    /// # Panics
    ///
    /// Panics if the index does not fit in 16 bits.
    pub fn from_index(index: usize) -> Self {
        Self(u16::try_from(index).expect("too many states"))
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An alternative with a dot marking how much of it has been recognized.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LRItem {
    pub alternative: AlternativeID,
    pub dot: u16,
}

impl LRItem {
    pub const fn new(alternative: AlternativeID, dot: u16) -> Self {
        Self { alternative, dot }
    }

    /// The symbol right after the dot.
    pub fn next_symbol(&self, g: &GrammarSet) -> Option<Symbol> {
        g.alternative(self.alternative)
            .symbols()
            .get(self.dot as usize)
            .copied()
    }

    /// Whether the whole alternative has been recognized.
    ///
    /// An `epsilon` alternative is complete as soon as it is predicted.
    pub fn is_complete(&self, g: &GrammarSet) -> bool {
        let alt = g.alternative(self.alternative);
        alt.is_epsilon() || self.dot as usize >= alt.symbols().len()
    }

    pub fn display<'g>(&'g self, g: &'g GrammarSet) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let (alt, grammar) = g.target_alternative(self.alternative);
            write!(f, "{} -> [", grammar.lhs())?;
            for (i, symbol) in alt.symbols().iter().enumerate() {
                if i == self.dot as usize {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if self.dot as usize >= alt.symbols().len() {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

pub type ItemSet = BTreeSet<LRItem>;

/// An interned item set, reduced to its core items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LR0State {
    pub id: StateID,
    pub core: ItemSet,
}

#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Vec<LR0State>,
    pub edges: Matrix<StateID, Symbol, StateID>,
}

impl LR0Automaton {
    pub fn display<'g>(&'g self, g: &'g GrammarSet) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{}", heading("Itemsets"))?;
            for state in &self.states {
                writeln!(f, "State {}:", state.id)?;
                for item in &state.core {
                    writeln!(f, "  {}", item.display(g))?;
                }
            }
            write!(f, "{}", heading("Edges"))?;
            for (from, symbol, to) in self.edges.iter() {
                writeln!(f, "{} --({})--> {}", from, symbol, to)?;
            }
            Ok(())
        })
    }
}

/// Builds the LR(0) automaton of a grammar collection.
///
/// When FIRST sets are supplied, items are also predicted past nullable
/// symbols, the same way a top-down expansion lets them vanish. Without them
/// every predicted item has its dot at the beginning, which yields the plain
/// LR(0) item sets a shift/reduce table needs.
#[derive(Debug)]
pub struct ItemSetBuilder<'g> {
    grammars: &'g GrammarSet,
    first: Option<&'g FirstSets>,
}

impl<'g> ItemSetBuilder<'g> {
    pub fn new(grammars: &'g GrammarSet, first: Option<&'g FirstSets>) -> Self {
        Self { grammars, first }
    }

    fn is_nullable(&self, symbol: Symbol) -> bool {
        self.first.map_or(false, |first| first.is_nullable(symbol))
    }

    /// Add the initial items of every alternative of `lhs`.
    ///
    /// Items are added at each dot position up to and including the first
    /// symbol that cannot vanish, and past the end when all of them can.
    pub fn add_items_for(&self, items: &mut ItemSet, lhs: Symbol) {
        let (gi, g) = self.grammars.find_grammar(lhs);
        for (index, alt) in g.alternatives().iter().enumerate() {
            let id = AlternativeID::from_indices(gi, index);
            let symbols = alt.symbols();
            let item = |dot: usize| {
                LRItem::new(id, u16::try_from(dot).expect("too long alternative"))
            };

            let mut dot = 0;
            while dot < symbols.len() {
                items.insert(item(dot));
                let symbol = symbols[dot];
                if symbol == Symbol::EPSILON || !self.is_nullable(symbol) {
                    break;
                }
                dot += 1;
            }
            if dot == symbols.len() {
                items.insert(item(dot));
            }
        }
    }

    /// Close the item set under prediction of the nonterminals after a dot.
    pub fn closure(&self, items: &mut ItemSet) {
        while self.closure_pass(items) {}
    }

    fn closure_pass(&self, items: &mut ItemSet) -> bool {
        let mut added = ItemSet::new();
        for item in items.iter() {
            match item.next_symbol(self.grammars) {
                Some(symbol) if symbol.is_nonterminal() => self.add_items_for(&mut added, symbol),
                _ => (),
            }
        }

        let mut changed = false;
        for item in added {
            changed |= items.insert(item);
        }
        changed
    }

    /// Advance the dot over `symbol` for every item expecting it, then close.
    pub fn edge_target(&self, items: &ItemSet, symbol: Symbol) -> ItemSet {
        let mut target = ItemSet::new();
        for item in items {
            let alt = self.grammars.alternative(item.alternative);
            if alt.is_epsilon() {
                continue;
            }
            if alt.symbols().get(item.dot as usize) != Some(&symbol) {
                continue;
            }
            target.insert(LRItem::new(item.alternative, item.dot + 1));
        }
        self.closure(&mut target);
        target
    }

    /// Reduce a closed item set to the items its closure cannot rederive.
    ///
    /// Items are visited in ascending `(dot, alternative)` order and dropped
    /// whenever the remaining items still close to the same set.
    pub fn core(&self, closed: &ItemSet) -> ItemSet {
        let mut order: Vec<LRItem> = closed.iter().copied().collect();
        order.sort_by_key(|item| (item.dot, item.alternative));

        let mut core = closed.clone();
        for item in order {
            core.remove(&item);
            let mut reclosed = core.clone();
            self.closure(&mut reclosed);
            if reclosed != *closed {
                core.insert(item);
            }
        }
        core
    }

    /// Discover every item set reachable from the start symbol.
    #[tracing::instrument(skip_all)]
    pub fn build(&self) -> LR0Automaton {
        let terminals = self.grammars.terminals();
        let nonterminals = self.grammars.nonterminals();

        let mut start = ItemSet::new();
        self.add_items_for(&mut start, self.grammars.start_symbol());
        self.closure(&mut start);

        let mut closed: Vec<ItemSet> = vec![start.clone()];
        let mut interned = Map::<ItemSet, StateID>::default();
        interned.insert(start, StateID::START);

        let mut edges = Matrix::default();
        let mut current = 0;
        while current < closed.len() {
            let from = StateID::from_index(current);
            for &symbol in terminals.iter().chain(&nonterminals) {
                let target = self.edge_target(&closed[current], symbol);
                if target.is_empty() {
                    continue;
                }
                let to = match interned.get(&target) {
                    Some(id) => *id,
                    None => {
                        let id = StateID::from_index(closed.len());
                        tracing::trace!("discover state {} from {} on `{}'", id, from, symbol);
                        interned.insert(target.clone(), id);
                        closed.push(target);
                        id
                    }
                };
                let inserted = edges.try_insert(from, symbol, to).is_ok();
                debug_assert!(inserted, "duplicated edge {} --({})-->", from, symbol);
            }
            current += 1;
        }
        tracing::debug!("{} item sets, {} edges", closed.len(), edges.len());

        let states = closed
            .iter()
            .enumerate()
            .map(|(i, items)| {
                let core = self.core(items);
                assert!(!core.is_empty(), "invalid itemset");
                LR0State {
                    id: StateID::from_index(i),
                    core,
                }
            })
            .collect();

        LR0Automaton { states, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Symbol {
        Symbol::nonterminal(s)
    }
    fn t(s: &str) -> Symbol {
        Symbol::terminal(s)
    }

    // S -> A b | c ; A -> a A | epsilon
    fn grammars() -> GrammarSet {
        let (s, a) = (n("lr0_S"), n("lr0_A"));
        GrammarSet::define(|g| {
            g.rule(s, [a, t("b")], None)?;
            g.rule(s, [t("c")], None)?;
            g.rule(a, [t("a"), a], None)?;
            g.rule(a, [Symbol::EPSILON], None)?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn closure_is_idempotent() {
        let grammars = grammars();
        let first = FirstSets::new(&grammars);
        for first in [None, Some(&first)] {
            let builder = ItemSetBuilder::new(&grammars, first);

            let mut items = ItemSet::new();
            builder.add_items_for(&mut items, n("lr0_S"));
            builder.closure(&mut items);
            let once = items.clone();
            builder.closure(&mut items);
            assert_eq!(items, once);
        }
    }

    #[test]
    fn nullable_symbols_are_skipped() {
        let grammars = grammars();
        let first = FirstSets::new(&grammars);

        let mut items = ItemSet::new();
        ItemSetBuilder::new(&grammars, Some(&first)).add_items_for(&mut items, n("lr0_S"));
        // S -> . A b, S -> A . b, S -> . c
        assert_eq!(items.len(), 3);
        assert!(items.contains(&LRItem::new(AlternativeID::new(0, 0), 1)));

        let mut items = ItemSet::new();
        ItemSetBuilder::new(&grammars, None).add_items_for(&mut items, n("lr0_S"));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn automaton() {
        let grammars = grammars();
        let first = FirstSets::new(&grammars);
        let builder = ItemSetBuilder::new(&grammars, Some(&first));
        let automaton = builder.build();
        eprintln!("{}", automaton.display(&grammars));

        assert!(automaton.states.len() > 1);
        let mut closed: Vec<ItemSet> = vec![];
        for state in &automaton.states {
            assert!(!state.core.is_empty());
            let mut items = state.core.clone();
            builder.closure(&mut items);
            assert_eq!(builder.core(&items), state.core);
            closed.push(items);
        }

        // interned sets are pairwise distinct.
        let count = closed.len();
        closed.sort();
        closed.dedup();
        assert_eq!(closed.len(), count);

        assert!(automaton.edges.get(StateID::START, t("c")).is_some());
        assert!(automaton.edges.get(StateID::START, n("lr0_S")).is_none());
    }

    #[test]
    fn core_closes_back() {
        let grammars = grammars();
        let builder = ItemSetBuilder::new(&grammars, None);
        let mut closed = ItemSet::new();
        builder.add_items_for(&mut closed, n("lr0_S"));
        builder.closure(&mut closed);

        let core = builder.core(&closed);
        assert!(core.len() < closed.len());
        let mut reclosed = core.clone();
        builder.closure(&mut reclosed);
        assert_eq!(reclosed, closed);
    }
}

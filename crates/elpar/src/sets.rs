//! Calculation of FIRST and FOLLOW sets.

use crate::{
    grammar::GrammarSet,
    symbol::Symbol,
    types::{Map, Set},
    util::{heading, join},
};
use std::fmt;

/// FIRST sets of the nonterminals, possibly including `epsilon`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSets {
    sets: Map<Symbol, Set<Symbol>>,
}

impl FirstSets {
    /// Iterate the passes until no set changes.
    #[tracing::instrument(skip_all)]
    pub fn new(grammars: &GrammarSet) -> Self {
        let mut me = Self::default();
        let mut passes = 1;
        while me.update(grammars) {
            passes += 1;
        }
        tracing::debug!("FIRST sets converged after {} passes", passes);
        me
    }

    /// Run a single pass over all alternatives and report whether any set
    /// has grown.
    pub fn update(&mut self, grammars: &GrammarSet) -> bool {
        let mut changed = false;
        for g in grammars {
            let mut added = vec![];
            for alt in g.alternatives() {
                let mut vanishes = true;
                for &symbol in alt.symbols() {
                    if symbol.is_terminal() {
                        if symbol == Symbol::EPSILON {
                            continue;
                        }
                        added.push(symbol);
                        vanishes = false;
                        break;
                    }

                    let first = self.sets.get(&symbol);
                    added.extend(
                        first
                            .into_iter()
                            .flatten()
                            .copied()
                            .filter(|s| *s != Symbol::EPSILON),
                    );
                    if !first.map_or(false, |f| f.contains(&Symbol::EPSILON)) {
                        vanishes = false;
                        break;
                    }
                }
                if vanishes {
                    added.push(Symbol::EPSILON);
                }
            }

            let set = self.sets.entry(g.lhs()).or_default();
            for symbol in added {
                changed |= set.insert(symbol);
            }
        }
        changed
    }

    pub fn get(&self, nonterminal: Symbol) -> Option<&Set<Symbol>> {
        self.sets.get(&nonterminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Set<Symbol>)> + '_ {
        self.sets.iter().map(|(k, v)| (*k, v))
    }

    /// Whether the symbol can derive the empty string.
    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        if symbol.is_terminal() {
            return symbol == Symbol::EPSILON;
        }
        self.sets
            .get(&symbol)
            .map_or(false, |set| set.contains(&Symbol::EPSILON))
    }

    /// FIRST of a symbol sequence.
    ///
    /// The result contains `epsilon` only when every symbol in the sequence is
    /// nullable, which includes the empty sequence.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> Set<Symbol> {
        let mut res = Set::default();
        for &symbol in symbols {
            if symbol.is_terminal() {
                if symbol == Symbol::EPSILON {
                    continue;
                }
                res.insert(symbol);
                return res;
            }

            if let Some(first) = self.sets.get(&symbol) {
                res.extend(first.iter().copied().filter(|s| *s != Symbol::EPSILON));
            }
            if !self.is_nullable(symbol) {
                return res;
            }
        }
        res.insert(Symbol::EPSILON);
        res
    }
}

impl fmt::Display for FirstSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", heading("First"))?;
        fmt_sets(f, &self.sets)
    }
}

/// FOLLOW sets of the nonterminals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    sets: Map<Symbol, Set<Symbol>>,
}

impl FollowSets {
    /// Seed the start symbol with the end marker and iterate until no set
    /// changes.
    #[tracing::instrument(skip_all)]
    pub fn new(grammars: &GrammarSet, first: &FirstSets) -> Self {
        let mut me = Self::default();
        me.sets
            .entry(grammars.start_symbol())
            .or_default()
            .insert(Symbol::ZERO);
        let mut passes = 1;
        while me.update(grammars, first) {
            passes += 1;
        }
        tracing::debug!("FOLLOW sets converged after {} passes", passes);
        me
    }

    /// Run a single pass over every nonterminal occurrence.
    pub fn update(&mut self, grammars: &GrammarSet, first: &FirstSets) -> bool {
        let mut changed = false;
        for g in grammars {
            for alt in g.alternatives() {
                let symbols = alt.symbols();
                for (i, &symbol) in symbols.iter().enumerate() {
                    if symbol.is_terminal() {
                        continue;
                    }

                    let rest = first.of_sequence(&symbols[i + 1..]);
                    let mut added: Vec<Symbol> = rest
                        .iter()
                        .copied()
                        .filter(|s| *s != Symbol::EPSILON)
                        .collect();
                    if rest.contains(&Symbol::EPSILON) {
                        added.extend(self.sets.get(&g.lhs()).into_iter().flatten().copied());
                    }

                    let set = self.sets.entry(symbol).or_default();
                    for s in added {
                        changed |= set.insert(s);
                    }
                }
            }
        }
        changed
    }

    pub fn get(&self, nonterminal: Symbol) -> Option<&Set<Symbol>> {
        self.sets.get(&nonterminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Set<Symbol>)> + '_ {
        self.sets.iter().map(|(k, v)| (*k, v))
    }
}

impl fmt::Display for FollowSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", heading("Follow"))?;
        fmt_sets(f, &self.sets)
    }
}

fn fmt_sets(f: &mut fmt::Formatter<'_>, sets: &Map<Symbol, Set<Symbol>>) -> fmt::Result {
    for (symbol, set) in sets {
        writeln!(f, "{:<22}{{ {} }}", symbol.name(), join(set, ", "))?;
    }
    Ok(())
}

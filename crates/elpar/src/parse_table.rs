//! Shift/reduce table derived from the LR(0) automaton.

use crate::{
    grammar::{Alternative, AlternativeID, Grammar, GrammarSet, TerminalMap},
    lr0::{ItemSetBuilder, LR0Automaton, StateID},
    sets::{FirstSets, FollowSets},
    symbol::Symbol,
    types::{Matrix, Set},
    util::{display_fn, heading},
};
use elpar_runtime::{ParseAction, ParseActionError, ParseError, ParseTable, Parser, SyntaxTree, Token, TokenSource};
use std::fmt;

/// The action performed on a terminal lookahead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LRAction {
    /// Consume the lookahead and move to the specified state.
    Shift(StateID),

    /// Reduce by the specified alternative.
    Reduce(AlternativeID),

    Accept,
}

impl LRAction {
    pub fn display<'g>(&'g self, g: &'g GrammarSet) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift(to) => write!(f, "shift({})", to),
            Self::Reduce(id) => write!(f, "reduce({})", g.display_alternative(*id)),
            Self::Accept => f.write_str("accept"),
        })
    }
}

/// Two actions competing for the same table slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LRConflict {
    pub state: StateID,
    pub terminal: Symbol,
    pub kept: LRAction,
    pub dropped: LRAction,
}

/// SLR(1) parse table over the grammar augmented with `S' -> S`.
#[derive(Debug)]
pub struct LRTable {
    grammars: GrammarSet,
    actions: Matrix<StateID, Symbol, LRAction>,
    gotos: Matrix<StateID, Symbol, StateID>,
    num_states: usize,
    terminals: TerminalMap,
    automaton: Option<LR0Automaton>,
    conflicts: Vec<LRConflict>,
}

impl LRTable {
    /// Build the table. Conflicts are reported as warnings and resolved in
    /// favor of the entry inserted first, with shifts inserted before reduces.
    #[tracing::instrument(skip_all)]
    pub fn new(grammars: &GrammarSet) -> Self {
        let grammars = augment(grammars);
        let accept = grammars.start_symbol();

        let first = FirstSets::new(&grammars);
        let follow = FollowSets::new(&grammars, &first);
        let builder = ItemSetBuilder::new(&grammars, None);
        let automaton = builder.build();

        let mut me = Self {
            terminals: TerminalMap::new(grammars.terminals()),
            actions: Matrix::default(),
            gotos: Matrix::default(),
            num_states: automaton.states.len(),
            automaton: None,
            conflicts: vec![],
            grammars: GrammarSet::default(),
        };

        for (from, symbol, to) in automaton.edges.iter() {
            if symbol.is_terminal() {
                me.insert(&grammars, from, symbol, LRAction::Shift(*to));
            } else {
                let inserted = me.gotos.try_insert(from, symbol, *to).is_ok();
                debug_assert!(inserted, "duplicated goto {} --({})-->", from, symbol);
            }
        }

        for state in &automaton.states {
            let mut items = state.core.clone();
            builder.closure(&mut items);
            for item in items.iter().filter(|item| item.is_complete(&grammars)) {
                let lhs = grammars.target_alternative(item.alternative).1.lhs();
                if lhs == accept {
                    me.insert(&grammars, state.id, Symbol::ZERO, LRAction::Accept);
                    continue;
                }
                let lookaheads = follow.get(lhs).into_iter().flatten().copied();
                for terminal in lookaheads.filter(|t| *t != Symbol::EPSILON) {
                    me.insert(&grammars, state.id, terminal, LRAction::Reduce(item.alternative));
                }
            }
        }
        tracing::debug!(
            "{} states, {} actions, {} gotos, {} conflicts",
            me.num_states,
            me.actions.len(),
            me.gotos.len(),
            me.conflicts.len()
        );

        me.grammars = grammars;
        me.automaton = Some(automaton);
        me
    }

    /// Restore a table from its parts, without an automaton to dump.
    pub(crate) fn from_parts(
        grammars: GrammarSet,
        actions: Matrix<StateID, Symbol, LRAction>,
        gotos: Matrix<StateID, Symbol, StateID>,
        num_states: usize,
    ) -> Self {
        Self {
            terminals: TerminalMap::new(grammars.terminals()),
            grammars,
            actions,
            gotos,
            num_states,
            automaton: None,
            conflicts: vec![],
        }
    }

    fn insert(&mut self, g: &GrammarSet, state: StateID, terminal: Symbol, action: LRAction) {
        if let Err(&kept) = self.actions.try_insert(state, terminal, action) {
            if kept == action {
                return;
            }
            tracing::warn!(
                "conflict in state {} on `{}'\n(1) {}\n(2) {}",
                state,
                terminal,
                kept.display(g),
                action.display(g),
            );
            self.conflicts.push(LRConflict {
                state,
                terminal,
                kept,
                dropped: action,
            });
        }
    }

    /// The augmented grammar collection the table refers to.
    pub fn grammars(&self) -> &GrammarSet {
        &self.grammars
    }

    pub fn actions(&self) -> &Matrix<StateID, Symbol, LRAction> {
        &self.actions
    }

    pub fn gotos(&self) -> &Matrix<StateID, Symbol, StateID> {
        &self.gotos
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn automaton(&self) -> Option<&LR0Automaton> {
        self.automaton.as_ref()
    }

    pub fn conflicts(&self) -> &[LRConflict] {
        &self.conflicts[..]
    }

    /// Parse the token stream with this table.
    pub fn parse<S>(&self, tokens: S) -> Result<SyntaxTree<Symbol>, ParseError<S::Error>>
    where
        S: TokenSource,
    {
        Parser::new(self).parse(tokens)
    }
}

/// Put `S' -> S` in front of the collection.
fn augment(grammars: &GrammarSet) -> GrammarSet {
    let start = grammars.start_symbol();
    let used: Set<Symbol> = grammars.nonterminals().into_iter().collect();

    let mut name = format!("{}'", start.name());
    while used.contains(&Symbol::nonterminal(&name)) {
        name.push('\'');
    }

    let mut accept = Grammar::new(Symbol::nonterminal(&name));
    accept.add_alternative(Alternative::new(vec![start], None));

    let mut augmented = vec![accept];
    augmented.extend(grammars.iter().cloned());
    GrammarSet::from(augmented)
}

impl ParseTable for LRTable {
    type State = StateID;
    type Symbol = Symbol;
    type Reduce = AlternativeID;

    fn initial_state(&self) -> StateID {
        StateID::START
    }

    fn terminal(&self, token: &Token) -> Option<Symbol> {
        self.terminals.find(token)
    }

    fn action(
        &self,
        current: StateID,
        lookahead: Option<Symbol>,
    ) -> ParseAction<StateID, Symbol, AlternativeID> {
        let symbol = lookahead.unwrap_or(Symbol::ZERO);
        if symbol.is_nonterminal() {
            return match self.gotos.get(current, symbol) {
                Some(to) => ParseAction::Shift(*to),
                None => ParseAction::Error(ParseActionError::IncorrectState),
            };
        }

        match self.actions.get(current, symbol) {
            Some(LRAction::Shift(to)) => ParseAction::Shift(*to),
            Some(LRAction::Reduce(id)) => {
                let (alt, g) = self.grammars.target_alternative(*id);
                ParseAction::Reduce(*id, g.lhs(), alt.arity())
            }
            Some(LRAction::Accept) => ParseAction::Accept,
            None => ParseAction::Error(ParseActionError::IncorrectSymbol),
        }
    }
}

impl fmt::Display for LRTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.grammars)?;
        if let Some(automaton) = &self.automaton {
            writeln!(f, "{}", automaton.display(&self.grammars))?;
        }

        write!(f, "{}", heading("LRTable"))?;
        for i in 0..self.num_states {
            let id = StateID::from_index(i);
            writeln!(f, "#### State {}", id)?;
            for (terminal, action) in self.actions.row(id) {
                writeln!(f, "- {} => {}", terminal, action.display(&self.grammars))?;
            }
            for (nonterminal, to) in self.gotos.row(id) {
                writeln!(f, "- {} => goto({})", nonterminal, to)?;
            }
        }
        Ok(())
    }
}

//! Parser definition.

use crate::token::Token;

/// The trait for abstracting a shift/reduce parse table.
pub trait ParseTable {
    /// The number to identify the state of the LR automaton.
    type State: Copy;

    /// The value to identify the terminal/nonterminal symbols.
    type Symbol: Copy;

    /// The context value corresponding to the matched production rule.
    type Reduce: Copy;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the terminal symbol that the specified token stands for.
    fn terminal(&self, token: &Token) -> Option<Self::Symbol>;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// If there is no lookahead symbol, a `None` is passsed as the end of input.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn terminal(&self, token: &Token) -> Option<Self::Symbol> {
        (**self).terminal(token)
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        (**self).action(current, lookahead)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TReduce> {
    Shift(TState),
    Reduce(TReduce, TSymbol, usize),
    Accept,
    Error(ParseActionError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseActionError {
    #[error("incorrect state")]
    IncorrectState,

    #[error("incorrect symbol")]
    IncorrectSymbol,
}

/// The trait for abstracting a predictive (LL(1)) parse table.
pub trait PredictiveTable {
    /// The value to identify the terminal/nonterminal symbols.
    type Symbol: Copy + PartialEq;

    /// The context value corresponding to the chosen production rule.
    type Production: Copy;

    /// Return the symbol placed on the stack before parsing.
    fn start_symbol(&self) -> Self::Symbol;

    fn is_terminal(&self, symbol: Self::Symbol) -> bool;

    /// Whether the symbol derives the empty string without consuming input.
    fn is_epsilon(&self, symbol: Self::Symbol) -> bool;

    /// Test whether a terminal symbol accepts the specified token.
    fn matches(&self, symbol: Self::Symbol, token: &Token) -> bool;

    /// Return the terminal symbol that the specified token stands for.
    fn terminal(&self, token: &Token) -> Option<Self::Symbol>;

    /// Choose the production used to expand `top` on the lookahead terminal.
    fn predict(
        &self,
        top: Self::Symbol,
        lookahead: Self::Symbol,
    ) -> Option<(Self::Production, &[Self::Symbol])>;
}

impl<T: ?Sized> PredictiveTable for &T
where
    T: PredictiveTable,
{
    type Symbol = T::Symbol;
    type Production = T::Production;

    fn start_symbol(&self) -> Self::Symbol {
        (**self).start_symbol()
    }

    fn is_terminal(&self, symbol: Self::Symbol) -> bool {
        (**self).is_terminal(symbol)
    }

    fn is_epsilon(&self, symbol: Self::Symbol) -> bool {
        (**self).is_epsilon(symbol)
    }

    fn matches(&self, symbol: Self::Symbol, token: &Token) -> bool {
        (**self).matches(symbol, token)
    }

    fn terminal(&self, token: &Token) -> Option<Self::Symbol> {
        (**self).terminal(token)
    }

    fn predict(
        &self,
        top: Self::Symbol,
        lookahead: Self::Symbol,
    ) -> Option<(Self::Production, &[Self::Symbol])> {
        (**self).predict(top, lookahead)
    }
}

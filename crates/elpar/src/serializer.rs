//! Binary form of built parsers.
//!
//! Layout: magic, parser kind, terminal texts, nonterminal texts, grammars,
//! table. Every primitive is a little-endian `i32` or a length-prefixed UTF-8
//! string. A symbol reference is the index into the terminal list, or
//! `-(index + 1)` into the nonterminal list.

use crate::{
    grammar::{Alternative, AlternativeID, Grammar, GrammarSet},
    ll1::LLParser,
    lr0::StateID,
    parse_table::{LRAction, LRTable},
    symbol::Symbol,
    types::{Map, Matrix, Set},
};
use std::io::{self, Read, Write};

const MAGIC: i32 = 0x454c_5052;

const KIND_LL: i32 = 1;
const KIND_LR: i32 = 2;

const ACTION_SHIFT: i32 = 0;
const ACTION_REDUCE: i32 = 1;
const ACTION_ACCEPT: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("IO error: {}", _0)]
    IO(#[from] io::Error),

    #[error("bad magic number: {:#x}", _0)]
    BadMagic(i32),

    #[error("unknown parser kind: {}", _0)]
    UnknownKind(i32),

    #[error("corrupted data: {}", msg)]
    Corrupted { msg: String },

    #[error("unknown symbol reference: {}", _0)]
    UnknownSymbol(i32),

    #[error("unknown state: {}", _0)]
    UnknownState(i32),
}

fn corrupted(msg: impl Into<String>) -> SerializeError {
    SerializeError::Corrupted { msg: msg.into() }
}

/// A parser that can be written out and loaded back without rebuilding it.
#[derive(Debug)]
pub enum CompiledParser {
    LL(LLParser),
    LR(LRTable),
}

impl From<LLParser> for CompiledParser {
    fn from(parser: LLParser) -> Self {
        Self::LL(parser)
    }
}

impl From<LRTable> for CompiledParser {
    fn from(table: LRTable) -> Self {
        Self::LR(table)
    }
}

impl CompiledParser {
    pub fn grammars(&self) -> &GrammarSet {
        match self {
            Self::LL(parser) => parser.grammars(),
            Self::LR(table) => table.grammars(),
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SerializeError> {
        let mut w = Writer::new(writer, self)?;
        match self {
            Self::LL(parser) => {
                w.i32(parser.table().len() as i32)?;
                for (nonterminal, terminal, id) in parser.table().iter() {
                    w.symbol(nonterminal)?;
                    w.symbol(terminal)?;
                    w.alternative(*id)?;
                }
            }
            Self::LR(table) => {
                w.i32(table.num_states() as i32)?;

                w.i32(table.actions().len() as i32)?;
                for (state, terminal, action) in table.actions().iter() {
                    w.i32(state.into_raw().into())?;
                    w.symbol(terminal)?;
                    match action {
                        LRAction::Shift(to) => {
                            w.i32(ACTION_SHIFT)?;
                            w.i32(to.into_raw().into())?;
                        }
                        LRAction::Reduce(id) => {
                            w.i32(ACTION_REDUCE)?;
                            w.i32(id.into_raw() as i32)?;
                        }
                        LRAction::Accept => {
                            w.i32(ACTION_ACCEPT)?;
                            w.i32(0)?;
                        }
                    }
                }

                w.i32(table.gotos().len() as i32)?;
                for (state, nonterminal, to) in table.gotos().iter() {
                    w.i32(state.into_raw().into())?;
                    w.symbol(nonterminal)?;
                    w.i32(to.into_raw().into())?;
                }
            }
        }
        w.inner.flush()?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn load<R: Read>(reader: R) -> Result<Self, SerializeError> {
        let mut r = Reader::new(reader)?;
        let kind = r.kind;
        let grammars = r.grammars()?;

        match kind {
            KIND_LL => {
                let mut table = Matrix::default();
                for _ in 0..r.len()? {
                    let nonterminal = r.symbol()?;
                    let terminal = r.symbol()?;
                    let id = r.alternative(&grammars)?;
                    table
                        .try_insert(nonterminal, terminal, id)
                        .map_err(|_| corrupted("duplicated parsing table entry"))?;
                }
                Ok(Self::LL(LLParser::from_parts(grammars, table)))
            }

            KIND_LR => {
                let num_states = r.len()?;
                let state = |raw: i32| -> Result<StateID, SerializeError> {
                    match u16::try_from(raw) {
                        Ok(id) if (id as usize) < num_states => Ok(StateID::from_raw(id)),
                        _ => Err(SerializeError::UnknownState(raw)),
                    }
                };

                let mut actions = Matrix::default();
                for _ in 0..r.len()? {
                    let from = state(r.i32()?)?;
                    let terminal = r.symbol()?;
                    let action = match (r.i32()?, r.i32()?) {
                        (ACTION_SHIFT, to) => LRAction::Shift(state(to)?),
                        (ACTION_REDUCE, raw) => {
                            LRAction::Reduce(check_alternative(&grammars, raw)?)
                        }
                        (ACTION_ACCEPT, _) => LRAction::Accept,
                        (tag, _) => return Err(corrupted(format!("unknown action tag {}", tag))),
                    };
                    actions
                        .try_insert(from, terminal, action)
                        .map_err(|_| corrupted("duplicated action entry"))?;
                }

                let mut gotos = Matrix::default();
                for _ in 0..r.len()? {
                    let from = state(r.i32()?)?;
                    let nonterminal = r.symbol()?;
                    let to = state(r.i32()?)?;
                    gotos
                        .try_insert(from, nonterminal, to)
                        .map_err(|_| corrupted("duplicated goto entry"))?;
                }

                Ok(Self::LR(LRTable::from_parts(
                    grammars, actions, gotos, num_states,
                )))
            }

            kind => Err(SerializeError::UnknownKind(kind)),
        }
    }
}

fn check_alternative(grammars: &GrammarSet, raw: i32) -> Result<AlternativeID, SerializeError> {
    let id = AlternativeID::from_raw(raw as u32);
    let valid = grammars
        .grammars()
        .get(id.grammar as usize)
        .map_or(false, |g| (id.index as usize) < g.alternatives().len());
    if !valid {
        return Err(corrupted(format!("alternative {} out of range", id)));
    }
    Ok(id)
}

struct Writer<W> {
    inner: W,
    refs: Map<Symbol, i32>,
}

impl<W: Write> Writer<W> {
    fn new(inner: W, parser: &CompiledParser) -> Result<Self, SerializeError> {
        let grammars = parser.grammars();

        // the end marker can be a table key without occurring in any grammar.
        let mut terminals: Set<Symbol> = Some(Symbol::ZERO).into_iter().collect();
        terminals.extend(grammars.terminals());
        let nonterminals = grammars.nonterminals();

        let mut refs = Map::default();
        for (i, t) in terminals.iter().enumerate() {
            refs.insert(*t, i as i32);
        }
        for (i, n) in nonterminals.iter().enumerate() {
            refs.insert(*n, -(i as i32) - 1);
        }

        let mut w = Self { inner, refs };
        w.i32(MAGIC)?;
        w.i32(match parser {
            CompiledParser::LL(..) => KIND_LL,
            CompiledParser::LR(..) => KIND_LR,
        })?;

        w.i32(terminals.len() as i32)?;
        for t in &terminals {
            w.string(t.name())?;
        }
        w.i32(nonterminals.len() as i32)?;
        for n in &nonterminals {
            w.string(n.name())?;
        }

        w.i32(grammars.len() as i32)?;
        for g in grammars {
            w.symbol(g.lhs())?;
            w.i32(g.alternatives().len() as i32)?;
            for alt in g.alternatives() {
                w.i32(alt.symbols().len() as i32)?;
                for symbol in alt.symbols() {
                    w.symbol(*symbol)?;
                }
                match alt.action() {
                    Some(action) => {
                        w.i32(1)?;
                        w.string(action)?;
                    }
                    None => w.i32(0)?,
                }
            }
        }

        Ok(w)
    }

    fn i32(&mut self, value: i32) -> Result<(), SerializeError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn string(&mut self, s: &str) -> Result<(), SerializeError> {
        self.i32(s.len() as i32)?;
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    fn symbol(&mut self, symbol: Symbol) -> Result<(), SerializeError> {
        let raw = *self
            .refs
            .get(&symbol)
            .ok_or_else(|| corrupted(format!("symbol `{}' is not in the symbol lists", symbol)))?;
        self.i32(raw)
    }

    fn alternative(&mut self, id: AlternativeID) -> Result<(), SerializeError> {
        self.i32(id.into_raw() as i32)
    }
}

struct Reader<R> {
    inner: R,
    kind: i32,
    terminals: Vec<Symbol>,
    nonterminals: Vec<Symbol>,
}

impl<R: Read> Reader<R> {
    fn new(inner: R) -> Result<Self, SerializeError> {
        let mut r = Self {
            inner,
            kind: 0,
            terminals: vec![],
            nonterminals: vec![],
        };

        let magic = r.i32()?;
        if magic != MAGIC {
            return Err(SerializeError::BadMagic(magic));
        }
        r.kind = r.i32()?;
        if !matches!(r.kind, KIND_LL | KIND_LR) {
            return Err(SerializeError::UnknownKind(r.kind));
        }

        for _ in 0..r.len()? {
            let text = r.string()?;
            r.terminals.push(Symbol::terminal(&text));
        }
        for _ in 0..r.len()? {
            let text = r.string()?;
            r.nonterminals.push(Symbol::nonterminal(&text));
        }

        Ok(r)
    }

    fn grammars(&mut self) -> Result<GrammarSet, SerializeError> {
        let mut grammars = vec![];
        for _ in 0..self.len()? {
            let lhs = self.symbol()?;
            if !lhs.is_nonterminal() {
                return Err(corrupted(format!("terminal `{}' used as a left-hand side", lhs)));
            }

            // alternatives are restored in their stored order.
            let mut alternatives = vec![];
            for _ in 0..self.len()? {
                let mut symbols = vec![];
                for _ in 0..self.len()? {
                    symbols.push(self.symbol()?);
                }
                if symbols.is_empty() {
                    return Err(corrupted("empty alternative"));
                }
                let action = match self.i32()? {
                    0 => None,
                    _ => Some(self.string()?),
                };
                alternatives.push(Alternative::new(symbols, action));
            }
            grammars.push(Grammar::from_parts(lhs, alternatives));
        }
        Ok(GrammarSet::from(grammars))
    }

    fn i32(&mut self) -> Result<i32, SerializeError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn len(&mut self) -> Result<usize, SerializeError> {
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| corrupted(format!("negative length {}", len)))
    }

    fn string(&mut self) -> Result<String, SerializeError> {
        let len = self.len()?;
        let mut buf = vec![];
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(SerializeError::IO(io::ErrorKind::UnexpectedEof.into()));
        }
        String::from_utf8(buf).map_err(|_| corrupted("invalid UTF-8 string"))
    }

    fn symbol(&mut self) -> Result<Symbol, SerializeError> {
        let raw = self.i32()?;
        let symbol = if raw >= 0 {
            self.terminals.get(raw as usize)
        } else {
            self.nonterminals.get((-(raw as i64) - 1) as usize)
        };
        symbol.copied().ok_or(SerializeError::UnknownSymbol(raw))
    }

    fn alternative(&mut self, grammars: &GrammarSet) -> Result<AlternativeID, SerializeError> {
        let raw = self.i32()?;
        check_alternative(grammars, raw)
    }
}

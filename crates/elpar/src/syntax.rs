//! Reader for grammar files.
//!
//! A grammar file is a sequence of records separated by blank lines. The first
//! line of a record names the left-hand side and every following line is one
//! alternative:
//!
//! ```text
//! expr
//!     : expr + term	add
//!     | term
//!
//! term
//!     : number
//! ```
//!
//! Leading `:`, `|` and whitespace are stripped from an alternative, and a tab
//! separates its symbols from the optional action text. A symbol is a
//! nonterminal when some record defines it; any other symbol is a terminal.

use crate::{
    grammar::{GrammarDefError, GrammarSet},
    symbol::Symbol,
    types::Map,
};

#[derive(Debug)]
struct Record<'s> {
    lhs: &'s str,
    alternatives: Vec<AlternativeLine<'s>>,
}

#[derive(Debug)]
struct AlternativeLine<'s> {
    line: usize,
    symbols: Vec<&'s str>,
    action: Option<&'s str>,
}

/// Parse the grammar text into a grammar collection.
pub fn parse(source: &str) -> Result<GrammarSet, GrammarDefError> {
    let records = read_records(source)?;

    let mut nonterminals = Map::default();
    for record in &records {
        nonterminals.insert(record.lhs, Symbol::nonterminal(record.lhs));
    }
    let symbol = |text: &str| match nonterminals.get(text) {
        Some(symbol) => *symbol,
        None => Symbol::terminal(text),
    };

    GrammarSet::define(|g| {
        for record in &records {
            let lhs = symbol(record.lhs);
            for alt in &record.alternatives {
                g.rule(lhs, alt.symbols.iter().map(|s| symbol(*s)), alt.action)
                    .map_err(|err| match err {
                        GrammarDefError::Other { msg } => GrammarDefError::Syntax {
                            line: alt.line,
                            msg,
                        },
                        err => err,
                    })?;
            }
        }
        Ok(())
    })
}

fn read_records(source: &str) -> Result<Vec<Record<'_>>, GrammarDefError> {
    let mut records: Vec<Record<'_>> = vec![];
    let mut current: Option<Record<'_>> = None;

    for (i, text) in source.lines().enumerate() {
        let line = i + 1;
        let syntax_error = |msg: &str| GrammarDefError::Syntax {
            line,
            msg: msg.into(),
        };

        if text.trim_start().starts_with("//") {
            continue;
        }

        if text.trim().is_empty() {
            records.extend(current.take());
            continue;
        }

        let Some(record) = current.as_mut() else {
            let lhs = text.trim();
            if lhs.contains(char::is_whitespace) {
                return Err(syntax_error("malformed left-hand side"));
            }
            if records.iter().any(|r| r.lhs == lhs) {
                return Err(syntax_error("duplicated left-hand side"));
            }
            current = Some(Record {
                lhs,
                alternatives: vec![],
            });
            continue;
        };

        let text = text.trim_start_matches(|c| matches!(c, ':' | '|' | '\t' | '\n' | ' '));
        let (symbols, action) = match text.split_once('\t') {
            Some((symbols, action)) => (symbols, Some(action.trim()).filter(|a| !a.is_empty())),
            None => (text, None),
        };
        let symbols: Vec<&str> = symbols.split_whitespace().collect();
        if symbols.is_empty() {
            return Err(syntax_error("empty alternative"));
        }

        record.alternatives.push(AlternativeLine {
            line,
            symbols,
            action,
        });
    }
    records.extend(current);

    for record in &records {
        if record.alternatives.is_empty() {
            return Err(GrammarDefError::Other {
                msg: format!("`{}' has no alternative", record.lhs),
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_records() {
        let grammars = parse(
            "// a comment\n\
             syntax_S\n\
             \t: syntax_A ;\tstmt\n\
             \n\
             syntax_A\n\
             \t: syntax_A x\n\
             \t| epsilon\n",
        )
        .unwrap();
        eprintln!("{}", grammars);

        let s = Symbol::nonterminal("syntax_S");
        let a = Symbol::nonterminal("syntax_A");
        assert_eq!(grammars.start_symbol(), s);
        assert_eq!(grammars.len(), 2);

        let alt = &grammars.grammars()[0].alternatives()[0];
        assert_eq!(alt.symbols(), [a, Symbol::terminal(";")]);
        assert_eq!(alt.action(), Some("stmt"));

        let alts = grammars.grammars()[1].alternatives();
        assert_eq!(alts[0].symbols(), [a, Symbol::terminal("x")]);
        assert!(alts[1].is_epsilon());
    }

    #[test]
    fn empty_alternative_is_a_syntax_error() {
        let err = parse("syntax_E\n\t|\n").unwrap_err();
        assert!(matches!(err, GrammarDefError::Syntax { line: 2, .. }));
    }

    #[test]
    fn duplicated_lhs_is_a_syntax_error() {
        let err = parse("syntax_D\n\t: x\n\nsyntax_D\n\t: y\n").unwrap_err();
        assert!(matches!(err, GrammarDefError::Syntax { line: 4, .. }));
    }

    #[test]
    fn mixed_epsilon_reports_line() {
        let err = parse("syntax_M\n\t: x\n\t| epsilon y\n").unwrap_err();
        assert!(matches!(err, GrammarDefError::Syntax { line: 3, .. }));
    }
}

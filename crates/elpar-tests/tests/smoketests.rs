use elpar::{
    grammar::common_prefix,
    ll1,
    runtime::{ParseError, Position, Token, TokenKind, Tokens},
    sets::{FirstSets, FollowSets},
    CompiledParser, GrammarDef, GrammarDefError, GrammarSet, LLParser, LRTable, Symbol,
};
use elpar_tests::grammars;
use std::vec;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_test_writer()
        .try_init();
}

/// Split the source on whitespace, keeping line breaks as newline tokens.
fn tokens(source: &str) -> Tokens<vec::IntoIter<Token>> {
    let mut tokens = vec![];
    let mut column = 1;
    for (i, line) in source.lines().enumerate() {
        let line_no = i as u32 + 1;
        if i > 0 {
            tokens.push(Token::new(TokenKind::Newline, "\n", Position::new(line_no - 1, column)));
        }
        column = 1;
        for word in line.split(' ') {
            let position = Position::new(line_no, column);
            column += word.chars().count() as u32 + 1;
            if word.is_empty() {
                continue;
            }
            let token = match word {
                s if s.starts_with('"') => {
                    Token::new(TokenKind::String, s.trim_matches('"'), position)
                }
                s if s.chars().all(|c| c.is_ascii_digit()) => {
                    Token::new(TokenKind::Number, s, position)
                }
                s if s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                    Token::new(TokenKind::Identifier, s, position)
                }
                s => Token::new(TokenKind::Sign, s, position),
            };
            tokens.push(token);
        }
    }
    Tokens::new(tokens)
}

fn leaf_texts(tree: &elpar::runtime::SyntaxTree<Symbol>) -> Vec<String> {
    tree.leaves().iter().map(|token| token.text.clone()).collect()
}

fn smoketest_grammar(f: impl FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>) {
    init_tracing();
    let grammars = GrammarSet::define(f).unwrap();
    eprintln!("{}", grammars);

    let table = LRTable::new(&grammars);
    eprintln!("{}", table);

    let parser = LLParser::new(grammars);
    eprintln!("{}", parser);
}

#[test]
fn smoketest_g_simple1() {
    smoketest_grammar(grammars::g_simple1);
}

#[test]
fn smoketest_g_simple2() {
    smoketest_grammar(grammars::g_simple2);
}

#[test]
fn smoketest_g1() {
    smoketest_grammar(grammars::g1);
}

#[test]
fn smoketest_g2() {
    smoketest_grammar(grammars::g2);
}

#[test]
fn smoketest_g4() {
    smoketest_grammar(grammars::g4);
}

#[test]
fn smoketest_min_caml() {
    smoketest_grammar(grammars::min_caml);
}

#[test]
fn interning_is_stable() {
    let a = Symbol::nonterminal("smoke_interned");
    assert_eq!(a, Symbol::nonterminal("smoke_interned"));
    assert_ne!(a, Symbol::terminal("smoke_interned"));
    assert_eq!(a.name(), "smoke_interned");
    assert_eq!(Symbol::terminal("number"), Symbol::NUMBER);
}

#[test]
fn transformations_are_idempotent() {
    init_tracing();
    for f in [grammars::g_simple2, grammars::g4, grammars::statements] {
        let mut grammars = GrammarSet::define(f).unwrap();
        ll1::remove_left_recursion(&mut grammars);
        ll1::left_factor(&mut grammars);
        eprintln!("{}", grammars);

        let count = grammars.len();
        assert!(!ll1::remove_left_recursion(&mut grammars));
        assert!(!ll1::left_factor(&mut grammars));
        assert_eq!(grammars.len(), count);

        for g in &grammars {
            let alts = g.alternatives();
            for (i, alt) in alts.iter().enumerate() {
                assert!(!g.is_left_recursive(alt));
                for other in &alts[i + 1..] {
                    assert_eq!(common_prefix(alt, other), 0, "`{}' is not factored", g);
                }
            }
        }
    }
}

#[test]
fn sets_reach_fixed_point() {
    let grammars = GrammarSet::define(grammars::min_caml).unwrap();

    let mut first = FirstSets::new(&grammars);
    assert!(!first.update(&grammars));

    let mut follow = FollowSets::new(&grammars, &first);
    assert!(!follow.update(&grammars, &first));

    let exp = Symbol::nonterminal("EXPR");
    assert!(follow.get(exp).unwrap().contains(&Symbol::ZERO));
    assert!(first.get(exp).unwrap().contains(&Symbol::terminal("let")));
}

#[test]
fn left_recursive_sum() {
    init_tracing();
    let grammars = GrammarSet::define(grammars::g4).unwrap();

    let parser = LLParser::new(grammars.clone());
    assert!(parser.conflicts().is_empty());
    let tree = parser.parse(tokens("n + ( n + n )")).unwrap();
    eprintln!("{}", tree);
    assert_eq!(leaf_texts(&tree), ["n", "+", "(", "n", "+", "n", ")"]);

    let table = LRTable::new(&grammars);
    assert!(table.conflicts().is_empty());
    let tree = table.parse(tokens("n + ( n + n )")).unwrap();
    eprintln!("{}", tree);
    assert_eq!(leaf_texts(&tree), ["n", "+", "(", "n", "+", "n", ")"]);
}

#[test]
fn both_parsers_agree_on_arithmetic() {
    init_tracing();
    let grammars = GrammarSet::define(grammars::g_simple2).unwrap();
    let source = "1 + 2 * ( 3 - 4 ) / 5";
    let expected: Vec<&str> = source.split(' ').collect();

    let table = LRTable::new(&grammars);
    assert!(table.conflicts().is_empty());
    let lr = table.parse(tokens(source)).unwrap();
    assert_eq!(leaf_texts(&lr), expected);

    let parser = LLParser::new(grammars);
    assert!(parser.conflicts().is_empty());
    let ll = parser.parse(tokens(source)).unwrap();
    assert_eq!(leaf_texts(&ll), expected);
    assert_eq!(
        ll.node(ll.root().unwrap()).symbol,
        Symbol::nonterminal("EXPR")
    );
}

#[test]
fn nullable_list() {
    init_tracing();
    let grammars = GrammarSet::define(grammars::nullable_list).unwrap();

    let parser = LLParser::new(grammars.clone());
    assert!(parser.conflicts().is_empty());
    assert_eq!(leaf_texts(&parser.parse(tokens("a a")).unwrap()), ["a", "a"]);
    assert!(parser.parse(tokens("")).unwrap().leaves().is_empty());
    match parser.parse(tokens("b")) {
        Err(ParseError::InvalidToken { text, position }) => {
            assert_eq!(text, "b");
            assert_eq!(position, Position::new(1, 1));
        }
        result => panic!("unexpected result: {:?}", result),
    }

    let table = LRTable::new(&grammars);
    assert!(table.conflicts().is_empty());
    assert_eq!(leaf_texts(&table.parse(tokens("a a a")).unwrap()), ["a", "a", "a"]);
    assert!(table.parse(tokens("a b")).is_err());
}

#[test]
fn statements_across_lines() {
    init_tracing();
    let grammars = GrammarSet::define(grammars::statements).unwrap();
    let source = "x = 1 + y ;\n\
                  if x then print \"hi\" ; else print 2 ; end\n\
                  if 0 then x = x ; end";

    let parser = LLParser::new(grammars.clone());
    eprintln!("{}", parser);
    assert!(parser.conflicts().is_empty());
    let tree = parser.parse(tokens(source)).unwrap();
    eprintln!("{}", tree);
    assert_eq!(leaf_texts(&tree).len(), 25);
    assert!(leaf_texts(&tree).contains(&"hi".to_owned()));

    let table = LRTable::new(&grammars);
    assert!(table.conflicts().is_empty());
    let tree = table.parse(tokens(source)).unwrap();
    assert_eq!(leaf_texts(&tree).len(), 25);

    match parser.parse(tokens("print ;")) {
        Err(ParseError::UnexpectedToken { text, position }) => {
            assert_eq!(text, ";");
            assert_eq!(position, Position::new(1, 7));
        }
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn grammar_file_with_actions() {
    init_tracing();
    let grammars = GrammarSet::from_str(grammars::CALC).unwrap();
    assert_eq!(grammars.start_symbol(), Symbol::nonterminal("calc_expr"));
    assert_eq!(grammars.len(), 3);

    let add = &grammars.grammars()[0].alternatives();
    assert!(add.iter().any(|alt| alt.action() == Some("add")));

    let source = "- 3 * ( 4 + 5 ) - 6";
    let expected: Vec<&str> = source.split(' ').collect();

    let table = LRTable::new(&grammars);
    assert!(table.conflicts().is_empty());
    assert_eq!(leaf_texts(&table.parse(tokens(source)).unwrap()), expected);

    let parser = LLParser::new(grammars);
    assert!(parser.conflicts().is_empty());
    assert_eq!(leaf_texts(&parser.parse(tokens(source)).unwrap()), expected);
}

#[test]
fn compiled_parsers_survive_save_and_load() {
    init_tracing();
    let grammars = GrammarSet::define(grammars::g_simple2).unwrap();
    let source = "( 1 + 2 ) * 3";

    for compiled in [
        CompiledParser::from(LRTable::new(&grammars)),
        CompiledParser::from(LLParser::new(grammars.clone())),
    ] {
        let mut buf = vec![];
        compiled.save(&mut buf).unwrap();
        let loaded = CompiledParser::load(&buf[..]).unwrap();
        assert_eq!(loaded.grammars(), compiled.grammars());

        let (before, after) = match (&compiled, &loaded) {
            (CompiledParser::LR(a), CompiledParser::LR(b)) => {
                assert_eq!(a.actions(), b.actions());
                assert_eq!(a.gotos(), b.gotos());
                (a.parse(tokens(source)), b.parse(tokens(source)))
            }
            (CompiledParser::LL(a), CompiledParser::LL(b)) => {
                assert_eq!(a.table(), b.table());
                (a.parse(tokens(source)), b.parse(tokens(source)))
            }
            _ => panic!("parser kind changed"),
        };
        assert_eq!(leaf_texts(&before.unwrap()), leaf_texts(&after.unwrap()));
    }
}

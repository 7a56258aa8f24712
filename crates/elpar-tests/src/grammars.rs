//! Grammar definitions for integration tests.

use elpar::{GrammarDef, GrammarDefError, Symbol};

fn t(text: &str) -> Symbol {
    Symbol::terminal(text)
}

fn n(text: &str) -> Symbol {
    Symbol::nonterminal(text)
}

pub fn g_simple1(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let (a, e, tm) = (n("A"), n("E"), n("T"));

    g.start_symbol(a)?;

    g.rule(a, [e, t("="), e], None)?;
    g.rule(a, [Symbol::IDENTIFIER], None)?;
    g.rule(e, [e, t("+"), tm], None)?;
    g.rule(e, [tm], None)?;
    g.rule(tm, [Symbol::NUMBER], None)?;
    g.rule(tm, [Symbol::IDENTIFIER], None)?;
    Ok(())
}

/// Arithmetic with the usual precedence levels.
pub fn g_simple2(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let expr = n("EXPR");
    let factor = n("FACTOR");
    let term = n("TERM");

    g.start_symbol(expr)?;

    g.rule(expr, [expr, t("+"), factor], Some("add"))?;
    g.rule(expr, [expr, t("-"), factor], Some("sub"))?;
    g.rule(expr, [factor], None)?;
    g.rule(factor, [factor, t("*"), term], Some("mul"))?;
    g.rule(factor, [factor, t("/"), term], Some("div"))?;
    g.rule(factor, [term], None)?;
    g.rule(term, [Symbol::NUMBER], Some("num"))?;
    g.rule(term, [t("("), expr, t(")")], None)?;
    Ok(())
}

pub fn g1(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let (e, tm) = (n("E"), n("T"));

    g.rule(e, [e, t("+"), tm], None)?;
    g.rule(e, [tm], None)?;
    g.rule(tm, [tm, t("*"), t("a")], None)?;
    g.rule(tm, [t("a")], None)?;
    Ok(())
}

pub fn g2(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let def = n("DEF");
    let param_spec = n("PARAM_SPEC");
    let return_spec = n("RETURN_SPEC");
    let type_ = n("TYPE");
    let name = n("NAME");
    let name_list = n("NAME_LIST");
    let (comma, colon, ident) = (t(","), t(":"), Symbol::IDENTIFIER);

    g.rule(def, [param_spec, return_spec, comma], None)?;
    g.rule(param_spec, [type_], None)?;
    g.rule(param_spec, [name_list, colon, type_], None)?;
    g.rule(return_spec, [type_], None)?;
    g.rule(return_spec, [name, colon, type_], None)?;
    g.rule(type_, [ident], None)?;
    g.rule(name, [ident], None)?;
    g.rule(name_list, [name], None)?;
    g.rule(name_list, [name, comma, name_list], None)?;
    Ok(())
}

// E → E + T | T
// T → ( E ) | n
pub fn g4(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let (e, tm) = (n("E"), n("T"));

    g.rule(e, [e, t("+"), tm], None)?;
    g.rule(e, [tm], None)?;
    g.rule(tm, [t("("), e, t(")")], None)?;
    g.rule(tm, [t("n")], None)?;
    Ok(())
}

/// A list of `a` which may be empty.
pub fn nullable_list(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let (s, a) = (n("S"), n("A"));

    g.rule(s, [a], None)?;
    g.rule(a, [t("a"), a], Some("cons"))?;
    g.rule(a, [Symbol::EPSILON], Some("nil"))?;
    Ok(())
}

/// Statements sharing a keyword prefix, which need left factoring.
pub fn statements(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let program = n("PROGRAM");
    let stmt = n("STMT");
    let expr = n("EXPR");
    let atom = n("ATOM");

    g.rule(program, [stmt, program], None)?;
    g.rule(program, [Symbol::EPSILON], None)?;
    g.rule(stmt, [t("if"), expr, t("then"), stmt, t("end")], Some("if"))?;
    g.rule(
        stmt,
        [t("if"), expr, t("then"), stmt, t("else"), stmt, t("end")],
        Some("if_else"),
    )?;
    g.rule(stmt, [t("print"), expr, t(";")], Some("print"))?;
    g.rule(stmt, [Symbol::IDENTIFIER, t("="), expr, t(";")], Some("assign"))?;
    g.rule(expr, [expr, t("+"), atom], Some("add"))?;
    g.rule(expr, [atom], None)?;
    g.rule(atom, [Symbol::NUMBER], None)?;
    g.rule(atom, [Symbol::IDENTIFIER], None)?;
    g.rule(atom, [Symbol::STRING], None)?;
    Ok(())
}

pub fn min_caml(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
    let (l_paren, r_paren) = (t("("), t(")"));
    let (t_true, t_false) = (t("true"), t("false"));
    let (integer, ident) = (Symbol::NUMBER, Symbol::IDENTIFIER);
    let t_not = t("not");
    let (plus, plus_dot) = (t("+"), t("+."));
    let (minus, minus_dot) = (t("-"), t("-."));
    let (star_dot, slash_dot) = (t("*."), t("/."));
    let (equal, less_greater) = (t("="), t("<>"));
    let (less, greater) = (t("<"), t(">"));
    let (less_equal, greater_equal) = (t("<="), t(">="));
    let less_minus = t("<-");
    let (comma, semicolon, dot) = (t(","), t(";"), t("."));
    let (t_if, t_then, t_else) = (t("if"), t("then"), t("else"));
    let (t_let, t_rec, t_in) = (t("let"), t("rec"), t("in"));
    let array_make = t("Array.make");

    let simple_exp = n("SIMPLE_EXP");
    let app_exp = n("APP_EXP");
    let neg_exp = n("NEG_EXP");
    let mult_exp = n("MULT_EXP");
    let add_exp = n("ADD_EXP");
    let rel_exp = n("REL_EXP");
    let tuple_exp = n("TUPLE_EXP");
    let put_exp = n("PUT_EXP");
    let if_exp = n("IF_EXP");
    let let_exp = n("LET_EXP");
    let exp = n("EXPR");
    let formal_args = n("FORMAL_ARGS");
    let actual_args = n("ACTUAL_ARGS");
    let tuple_exp_rest = n("TUPLE_EXP_REST");
    let fundef = n("FUNDEF");
    let pat = n("PAT");

    g.start_symbol(exp)?;

    g.rule(simple_exp, [l_paren, exp, r_paren], None)?;
    g.rule(simple_exp, [l_paren, r_paren], None)?;
    g.rule(simple_exp, [t_true], None)?;
    g.rule(simple_exp, [t_false], None)?;
    g.rule(simple_exp, [integer], None)?;
    g.rule(simple_exp, [ident], None)?;
    g.rule(simple_exp, [simple_exp, dot, l_paren, exp, r_paren], None)?;

    g.rule(app_exp, [simple_exp], None)?;
    g.rule(app_exp, [simple_exp, actual_args], None)?;
    g.rule(app_exp, [array_make, simple_exp, simple_exp], None)?;
    g.rule(app_exp, [t_not, app_exp], None)?;

    g.rule(neg_exp, [app_exp], None)?;
    g.rule(neg_exp, [minus, neg_exp], None)?;
    g.rule(neg_exp, [minus_dot, neg_exp], None)?;

    g.rule(mult_exp, [neg_exp], None)?;
    for op in [star_dot, slash_dot] {
        g.rule(mult_exp, [mult_exp, op, neg_exp], None)?;
    }

    g.rule(add_exp, [mult_exp], None)?;
    for op in [plus, minus, plus_dot, minus_dot] {
        g.rule(add_exp, [add_exp, op, mult_exp], None)?;
    }

    g.rule(rel_exp, [add_exp], None)?;
    for op in [equal, less_greater, less, greater, less_equal, greater_equal] {
        g.rule(rel_exp, [rel_exp, op, add_exp], None)?;
    }

    g.rule(tuple_exp, [rel_exp], None)?;
    g.rule(tuple_exp, [rel_exp, comma, tuple_exp_rest], None)?;
    g.rule(tuple_exp_rest, [rel_exp], None)?;
    g.rule(tuple_exp_rest, [rel_exp, comma, tuple_exp_rest], None)?;

    g.rule(put_exp, [tuple_exp], None)?;
    g.rule(
        put_exp,
        [simple_exp, dot, l_paren, exp, r_paren, less_minus, exp],
        None,
    )?;

    g.rule(if_exp, [put_exp], None)?;
    g.rule(if_exp, [t_if, exp, t_then, exp, t_else, exp], None)?;

    g.rule(let_exp, [t_let, ident, equal, exp, t_in, exp], None)?;
    g.rule(let_exp, [t_let, t_rec, fundef, t_in, exp], None)?;
    g.rule(
        let_exp,
        [t_let, l_paren, pat, r_paren, equal, exp, t_in, exp],
        None,
    )?;

    g.rule(fundef, [ident, formal_args, equal, exp], None)?;

    g.rule(formal_args, [ident, formal_args], None)?;
    g.rule(formal_args, [ident], None)?;

    g.rule(actual_args, [actual_args, simple_exp], None)?;
    g.rule(actual_args, [simple_exp], None)?;

    g.rule(pat, [pat, comma, ident], None)?;
    g.rule(pat, [ident, comma, ident], None)?;

    g.rule(exp, [if_exp], None)?;
    g.rule(exp, [if_exp, semicolon, exp], None)?;
    g.rule(exp, [let_exp], None)?;
    Ok(())
}

/// The arithmetic grammar in the grammar file format.
pub const CALC: &str = "\
// arithmetic expressions
calc_expr
\t: calc_expr + calc_term\tadd
\t| calc_expr - calc_term\tsub
\t| calc_term

calc_term
\t: calc_term * calc_factor\tmul
\t| calc_factor

calc_factor
\t: ( calc_expr )
\t| number\tnum
\t| - calc_factor\tneg
";

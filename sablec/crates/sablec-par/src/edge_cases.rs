//! Edge case tests for sablec-par

use crate::ast::{NodeData, NodeKind};
use crate::{OwnedParseResult, Parser};
use proptest::prelude::*;

fn parse_ok(source: &str) -> OwnedParseResult {
    let mut parser = Parser::new();
    let res = parser.parse(source);
    assert!(!res.has_error, "parse error for {source:?}: {}", res.err_msg);
    res.dupe()
}

fn parse_err(source: &str) -> (String, u32) {
    let mut parser = Parser::new();
    let res = parser.parse(source);
    assert!(res.has_error, "expected failure for {source:?}");
    (res.err_msg.to_string(), res.err_pos)
}

// ==================== EDGE CASES ====================

#[test]
fn test_edge_empty_source() {
    let res = parse_ok("");
    let root = res.root_id.expect("root");
    assert_eq!(res.nodes[root].kind, NodeKind::Root);
    assert!(res.first_child(root).is_none());
    assert!(res.deps.is_empty());
}

#[test]
fn test_edge_newlines_only() {
    let res = parse_ok("\n\n\n");
    assert!(res.first_child(res.root_id.expect("root")).is_none());
}

#[test]
fn test_edge_deeply_nested_groups() {
    let res = parse_ok("x = ((((1))))");
    assert!(!res.has_error);
}

#[test]
fn test_edge_long_binary_chain() {
    let terms: Vec<String> = (0..100).map(|i| format!("v{i}")).collect();
    let source = format!("total = {}", terms.join(" + "));
    let res = parse_ok(&source);
    assert_eq!(res.deps.len(), 100);
}

#[test]
fn test_edge_tab_indented_program() {
    let res = parse_ok("if a:\n\tif b:\n\t\tpass\n\telse:\n\t\tpass");
    assert!(!res.has_error);
}

#[test]
fn test_edge_dedent_by_more_than_one_level() {
    let res = parse_ok("if a:\n  if b:\n    pass\npass");
    let root = res.root_id.expect("root");
    let first = res.first_child(root).expect("if");
    let second = res.nodes[first].next.expect("trailing pass");
    assert_eq!(res.nodes[second].kind, NodeKind::PassStmt);
}

#[test]
fn test_edge_shadow_does_not_cancel_real_dependency() {
    // `foo` is referenced free first; the later assignment binds a new
    // local but must not retract the existing dependency entry.
    let res = parse_ok("foo\nfoo = 1");
    assert_eq!(res.deps.len(), 1);
    assert!(res.deps.contains_key("foo"));
}

#[test]
fn test_edge_dependency_points_at_first_reference() {
    let res = parse_ok("foo\nfoo");
    let id = *res.deps.get("foo").expect("dep");
    // Both references exist; the map holds the earlier node.
    let mut ident_nodes: Vec<_> = res
        .nodes
        .iter_enumerated()
        .filter(|(_, n)| n.kind == NodeKind::Ident)
        .map(|(id, _)| id)
        .collect();
    ident_nodes.sort();
    assert_eq!(id, ident_nodes[0]);
}

#[test]
fn test_edge_self_referential_assignment_retracts() {
    // The left-hand side's own leaf reference is the first entry, so the
    // binding retracts it even though the right side reads the name.
    let res = parse_ok("foo = foo + 1");
    assert!(!res.deps.contains_key("foo"));
}

#[test]
fn test_edge_op_assign_keeps_dependency() {
    let res = parse_ok("foo += 1");
    assert!(res.deps.contains_key("foo"));
}

#[test]
fn test_edge_deps_in_first_use_order() {
    let res = parse_ok("beta\nalpha\ngamma");
    let names: Vec<_> = res.deps.keys().cloned().collect();
    assert_eq!(names, vec!["beta", "alpha", "gamma"]);
}

#[test]
fn test_edge_lambda_param_scope_ends_with_body() {
    let res = parse_ok("f = x => x + 1\nx");
    assert_eq!(res.deps.len(), 1);
    assert!(res.deps.contains_key("x"));
}

#[test]
fn test_edge_no_paren_call_stops_at_line_end() {
    let res = parse_ok("print a\nprint b");
    let root = res.root_id.expect("root");
    let first = res.first_child(root).expect("first");
    let second = res.nodes[first].next.expect("second");
    assert!(res.nodes[second].next.is_none());
}

#[test]
fn test_edge_template_with_call_inside() {
    let res = parse_ok("m = 'n = {f(1) + 2}'");
    assert!(res.deps.contains_key("f"));
}

#[test]
fn test_edge_coyield_statement() {
    let res = parse_ok("coyield");
    let root = res.root_id.expect("root");
    let stmt = res.first_child(root).expect("stmt");
    assert_eq!(res.nodes[stmt].kind, NodeKind::ExprStmt);
}

#[test]
fn test_edge_error_positions_are_byte_offsets() {
    let (_, pos) = parse_err("x = )");
    assert_eq!(pos, 4);

    let (_, pos) = parse_err("  x = 1");
    assert_eq!(pos, 0);
}

#[test]
fn test_edge_token_error_flag() {
    let mut parser = Parser::new();
    let res = parser.parse("x = 'oops");
    assert!(res.has_error);
    assert!(res.is_token_error);

    let res = parser.parse("x = )");
    assert!(res.has_error);
    assert!(!res.is_token_error);
}

#[test]
fn test_edge_error_then_successful_reuse() {
    let mut parser = Parser::new();
    assert!(parser.parse("x = )").has_error);
    let res = parser.parse("x = 1");
    assert!(!res.has_error, "{}", res.err_msg);
    assert!(res.err_msg.is_empty());
}

#[test]
fn test_edge_if_expr_nested_in_call() {
    let res = parse_ok("f(if c then 1 else 2, 3)");
    assert!(res.deps.contains_key("f"));
    assert!(res.deps.contains_key("c"));
}

#[test]
fn test_edge_label_with_inline_body() {
    let res = parse_ok("fast: pass");
    let root = res.root_id.expect("root");
    let label = res.first_child(root).expect("label");
    assert_eq!(res.nodes[label].kind, NodeKind::LabelDecl);
}

#[test]
fn test_edge_while_inf_with_break() {
    let res = parse_ok("while:\n  break");
    let root = res.root_id.expect("root");
    let w = res.first_child(root).expect("while");
    assert_eq!(res.nodes[w].kind, NodeKind::WhileInfStmt);
}

#[test]
fn test_edge_slice_assignment_target_rejected() {
    let (msg, _) = parse_err("a[1..2] = 3");
    assert_eq!(msg, "Left-hand side of assignment is not assignable.");
}

#[test]
fn test_edge_object_init_only_on_ident_or_access() {
    // A group is not a valid initializer target, so `{` starts nothing
    // here and the statement fails to terminate cleanly.
    let mut parser = Parser::new();
    let res = parser.parse("(a){x: 1}");
    assert!(res.has_error);
}

#[test]
fn test_edge_access_chain_dependency_is_root_name() {
    let res = parse_ok("a.b.c");
    assert_eq!(res.deps.len(), 1);
    assert!(res.deps.contains_key("a"));
}

// ==================== PROPERTIES ====================

/// Numeric operators from the precedence table, with their levels.
const OPS: &[(&str, u8)] = &[
    ("<<", 9),
    (">>", 9),
    ("&", 8),
    ("|", 7),
    ("||", 7),
    ("^", 6),
    ("*", 5),
    ("/", 5),
    ("%", 5),
    ("+", 4),
    ("-", 4),
];

proptest! {
    /// `a OP1 b OP2 c` groups left iff prec(OP1) >= prec(OP2).
    #[test]
    fn prop_precedence_grouping(i in 0..OPS.len(), j in 0..OPS.len()) {
        let (op1, p1) = OPS[i];
        let (op2, p2) = OPS[j];
        let source = format!("a {op1} b {op2} c");
        let res = parse_ok(&source);

        let root = res.root_id.expect("root");
        let stmt = res.first_child(root).expect("stmt");
        let NodeData::Child { child } = res.nodes[stmt].data else {
            panic!("expr stmt");
        };
        let NodeData::Binary { left, right, .. } = res.nodes[child].data else {
            panic!("binary expr for {source}");
        };

        if p1 >= p2 {
            prop_assert_eq!(res.nodes[left].kind, NodeKind::BinExpr, "{}", source);
            prop_assert_eq!(res.nodes[right].kind, NodeKind::Ident, "{}", source);
        } else {
            prop_assert_eq!(res.nodes[left].kind, NodeKind::Ident, "{}", source);
            prop_assert_eq!(res.nodes[right].kind, NodeKind::BinExpr, "{}", source);
        }
    }

    /// Re-parsing the same source yields identical token and node
    /// arrays.
    #[test]
    fn prop_reparse_deterministic(names in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
        let source = names
            .iter()
            .enumerate()
            .map(|(i, n)| format!("{n}{i} = {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut parser = Parser::new();
        let first = parser.parse(&source).dupe();
        let second = parser.parse(&source).dupe();
        prop_assert_eq!(first.tokens, second.tokens);
        prop_assert_eq!(first.nodes, second.nodes);
    }

    /// Free names are exactly those never declared.
    #[test]
    fn prop_declared_names_never_free(n in 1usize..8) {
        let mut source = String::new();
        for i in 0..n {
            source.push_str(&format!("v{i} = {i}\n"));
        }
        for i in 0..n {
            source.push_str(&format!("use{i} = v{i}\n"));
        }
        let res = parse_ok(&source);
        prop_assert!(res.deps.is_empty(), "deps: {:?}", res.deps);
    }
}

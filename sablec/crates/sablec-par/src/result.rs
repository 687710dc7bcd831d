//! Parse result views.
//!
//! [`ParseResult`] is the hot path: a non-owning view into the parser's
//! retained buffers, valid until the next `parse` call. [`OwnedParseResult`]
//! is its deep copy for callers that outlive the parser.

use crate::ast::{Node, NodeData, NodeId, StaticDecl};
use sablec_lex::{Token, TokenId};
use sablec_util::{FxIndexMap, IndexVec};

/// A parse result borrowing the parser's buffers.
#[derive(Clone, Copy, Debug)]
pub struct ParseResult<'a> {
    pub has_error: bool,
    /// True when the recorded error came from the tokenizer.
    pub is_token_error: bool,
    pub err_msg: &'a str,
    pub err_pos: u32,
    pub root_id: Option<NodeId>,
    pub nodes: &'a IndexVec<NodeId, Node>,
    pub tokens: &'a IndexVec<TokenId, Token>,
    pub src: &'a str,
    pub name: &'a str,
    /// Free names mapped to their first referencing node, in first-use
    /// order.
    pub deps: &'a FxIndexMap<String, NodeId>,
    /// Top-level static declarations in source order.
    pub static_decls: &'a [StaticDecl],
}

impl ParseResult<'_> {
    /// Deep copy into independent storage.
    pub fn dupe(&self) -> OwnedParseResult {
        OwnedParseResult {
            has_error: self.has_error,
            is_token_error: self.is_token_error,
            err_msg: self.err_msg.to_owned(),
            err_pos: self.err_pos,
            root_id: self.root_id,
            nodes: self.nodes.clone(),
            tokens: self.tokens.clone(),
            src: self.src.to_owned(),
            name: self.name.to_owned(),
            deps: self.deps.clone(),
            static_decls: self.static_decls.to_vec(),
        }
    }

    /// First child of a node that heads a child chain, if any.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        first_child_of(&self.nodes[id].data)
    }

    /// Lexeme text behind a node's first token.
    pub fn node_text(&self, id: NodeId) -> &str {
        match self.tokens.get(self.nodes[id].start_token) {
            Some(tok) => tok.lexeme(self.src),
            None => "",
        }
    }
}

/// A parse result owning all of its storage.
#[derive(Clone, Debug)]
pub struct OwnedParseResult {
    pub has_error: bool,
    pub is_token_error: bool,
    pub err_msg: String,
    pub err_pos: u32,
    pub root_id: Option<NodeId>,
    pub nodes: IndexVec<NodeId, Node>,
    pub tokens: IndexVec<TokenId, Token>,
    pub src: String,
    pub name: String,
    pub deps: FxIndexMap<String, NodeId>,
    pub static_decls: Vec<StaticDecl>,
}

impl OwnedParseResult {
    /// First child of a node that heads a child chain, if any.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        first_child_of(&self.nodes[id].data)
    }

    /// Lexeme text behind a node's first token.
    pub fn node_text(&self, id: NodeId) -> &str {
        match self.tokens.get(self.nodes[id].start_token) {
            Some(tok) => tok.lexeme(&self.src),
            None => "",
        }
    }
}

fn first_child_of(data: &NodeData) -> Option<NodeId> {
    match *data {
        NodeData::ChildList { head } => head,
        NodeData::Child { child } => Some(child),
        NodeData::OptChild { child } => child,
        _ => None,
    }
}

/// Direct children of a node, not following sibling links. Used by
/// traversal checks.
pub fn node_children(data: &NodeData) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut push = |id: Option<NodeId>| {
        if let Some(id) = id {
            out.push(id);
        }
    };
    match *data {
        NodeData::None => {}
        NodeData::Child { child } => push(Some(child)),
        NodeData::OptChild { child } => push(child),
        NodeData::ChildList { head } => push(head),
        NodeData::Pair { left, right } => {
            push(Some(left));
            push(Some(right));
        }
        NodeData::Binary { left, right, .. } => {
            push(Some(left));
            push(Some(right));
        }
        NodeData::Unary { child, .. } => push(Some(child)),
        NodeData::Slice { parent, low, high } => {
            push(Some(parent));
            push(low);
            push(high);
        }
        NodeData::Call {
            callee, arg_head, ..
        } => {
            push(Some(callee));
            push(arg_head);
        }
        NodeData::VarDecl {
            name,
            type_spec,
            init,
        } => {
            push(Some(name));
            push(type_spec);
            push(Some(init));
        }
        NodeData::LocalDecl { name, init } => {
            push(Some(name));
            push(init);
        }
        NodeData::IfStmt {
            cond,
            body_head,
            else_head,
        } => {
            push(Some(cond));
            push(body_head);
            push(else_head);
        }
        NodeData::ElseClause { cond, body_head } => {
            push(cond);
            push(body_head);
        }
        NodeData::IfExpr {
            cond,
            then_expr,
            else_expr,
        } => {
            push(Some(cond));
            push(Some(then_expr));
            push(else_expr);
        }
        NodeData::Match { expr, case_head } => {
            push(Some(expr));
            push(case_head);
        }
        NodeData::Case {
            cond_head,
            body_head,
        } => {
            push(cond_head);
            push(body_head);
        }
        NodeData::WhileCond { cond, body_head } => {
            push(Some(cond));
            push(body_head);
        }
        NodeData::WhileOpt {
            opt,
            capture,
            body_head,
        } => {
            push(Some(opt));
            push(Some(capture));
            push(body_head);
        }
        NodeData::ForRange {
            range,
            each,
            body_head,
        } => {
            push(Some(range));
            push(each);
            push(body_head);
        }
        NodeData::ForIter {
            iter,
            each,
            body_head,
        } => {
            push(Some(iter));
            push(each);
            push(body_head);
        }
        NodeData::Each { key, value } => {
            push(key);
            push(Some(value));
        }
        NodeData::TryStmt {
            body_head,
            capture,
            catch_head,
        } => {
            push(body_head);
            push(capture);
            push(catch_head);
        }
        NodeData::TryExpr { expr, else_expr } => {
            push(Some(expr));
            push(else_expr);
        }
        NodeData::Func {
            name,
            param_head,
            ret,
            body_head,
            ..
        } => {
            push(name);
            push(param_head);
            push(ret);
            push(body_head);
        }
        NodeData::FuncInit { name, ret, init } => {
            push(Some(name));
            push(ret);
            push(Some(init));
        }
        NodeData::Lambda {
            param_head, body, ..
        } => {
            push(param_head);
            push(Some(body));
        }
        NodeData::Object {
            name,
            field_head,
            func_head,
        } => {
            push(Some(name));
            push(field_head);
            push(func_head);
        }
        NodeData::Enum { name, member_head } => {
            push(Some(name));
            push(member_head);
        }
        NodeData::ObjectInit { left, entry_head } => {
            push(Some(left));
            push(entry_head);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use sablec_util::FxHashSet;

    const SOURCE: &str = "\
import io 'std/io'

var limit: 10

func fill(xs):
  for 0..limit each i:
    xs[i] = i * 2
  return xs

type Point object:
  x Number
  y Number
  func sum(self):
    return self.x + self.y

result = fill([])
msg = 'filled {limit} items'
";

    /// Walks children and sibling links, asserting that no node repeats
    /// on any root-to-leaf path. A cycle would trip the path check
    /// rather than loop forever.
    fn check_acyclic(
        res: &OwnedParseResult,
        id: NodeId,
        path: &mut FxHashSet<NodeId>,
        seen: &mut FxHashSet<NodeId>,
    ) {
        assert!(path.insert(id), "node {id:?} repeats on its own path");
        seen.insert(id);
        let mut targets = node_children(&res.nodes[id].data);
        if let Some(next) = res.nodes[id].next {
            targets.push(next);
        }
        for target in targets {
            check_acyclic(res, target, path, seen);
        }
        path.remove(&id);
    }

    #[test]
    fn test_traversal_is_acyclic_and_finite() {
        let mut parser = Parser::new();
        let res = parser.parse(SOURCE).dupe();
        assert!(!res.has_error, "{}", res.err_msg);

        let mut path = FxHashSet::default();
        let mut seen = FxHashSet::default();
        check_acyclic(&res, res.root_id.expect("root"), &mut path, &mut seen);
        assert!(seen.len() <= res.nodes.len());
    }

    #[test]
    fn test_sibling_chains_follow_source_order() {
        let mut parser = Parser::new();
        let res = parser.parse(SOURCE).dupe();
        for (_, node) in res.nodes.iter_enumerated() {
            if let Some(next) = node.next {
                assert!(
                    node.start_token < res.nodes[next].start_token,
                    "siblings out of source order"
                );
            }
        }
    }

    #[test]
    fn test_token_lexemes_roundtrip() {
        let mut parser = Parser::new();
        let res = parser.parse(SOURCE).dupe();
        for tok in res.tokens.iter() {
            let start = tok.start() as usize;
            let end = tok.end() as usize;
            assert!(start <= end && end <= res.src.len());
            assert_eq!(tok.lexeme(&res.src), &res.src[start..end]);
        }
    }

    #[test]
    fn test_dupe_is_independent_of_parser() {
        let mut parser = Parser::new();
        let owned = parser.parse(SOURCE).dupe();
        assert!(!owned.has_error);
        let node_count = owned.nodes.len();
        let dep_count = owned.deps.len();
        let src = owned.src.clone();

        // Reusing the parser must not disturb the owned copy.
        let other = parser.parse("something_else = 1");
        assert!(!other.has_error);

        assert_eq!(owned.nodes.len(), node_count);
        assert_eq!(owned.deps.len(), dep_count);
        assert_eq!(owned.src, src);
        assert_eq!(owned.node_text(owned.root_id.expect("root")), "import");
    }

    #[test]
    fn test_dupe_preserves_deps_and_statics() {
        let mut parser = Parser::new();
        let res = parser.parse(SOURCE);
        let owned = res.dupe();
        assert_eq!(owned.deps.len(), res.deps.len());
        assert_eq!(owned.static_decls, res.static_decls.to_vec());
        for (name, id) in res.deps.iter() {
            assert_eq!(owned.deps.get(name), Some(id));
        }
    }

    #[test]
    fn test_error_result_view() {
        let mut parser = Parser::new();
        let res = parser.parse("func (");
        assert!(res.has_error);
        assert!(!res.is_token_error);
        let owned = res.dupe();
        assert!(owned.has_error);
        assert_eq!(owned.err_msg, res.err_msg);
    }
}

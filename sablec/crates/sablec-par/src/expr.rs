//! Expression parsing.
//!
//! Three layers:
//! 1. Tight-term: an atom plus postfix member/index/call/initializer
//!    operators.
//! 2. Term: tight-term wrapped by the prefix forms (`not`, `throw`,
//!    `try`, the coroutine keywords, unary `-` `~` `!`) and the
//!    `if ... then ... else` expression.
//! 3. Binary: precedence climbing with an inner loop that left-folds
//!    tighter operators into the right operand.

use crate::ast::{NodeData, NodeId, NodeKind, UnaryOp, BinaryOp, CAST_PRECEDENCE};
use crate::{PResult, ParseError, Parser};
use sablec_lex::{OperatorKind, Token, TokenKind};

/// A binary operator waiting at (or just after) the cursor.
#[derive(Clone, Copy)]
struct BinOpInfo {
    op: PendingOp,
    prec: u8,
    /// Absolute token position of the operator.
    at: usize,
    /// Tokens the operator spans; `is not` spans two.
    len: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum PendingOp {
    Bin(BinaryOp),
    Cast,
}

/// Whether a token can begin a term expression.
fn can_start_term(tok: Token) -> bool {
    match tok.kind() {
        TokenKind::Ident
        | TokenKind::Number
        | TokenKind::NonDecimalInt
        | TokenKind::String
        | TokenKind::TemplateString
        | TokenKind::Symbol
        | TokenKind::True
        | TokenKind::False
        | TokenKind::NoneK
        | TokenKind::Error
        | TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::LeftBrace
        | TokenKind::At
        | TokenKind::If
        | TokenKind::Not
        | TokenKind::Throw
        | TokenKind::Try
        | TokenKind::Coresume
        | TokenKind::Coyield
        | TokenKind::Coinit => true,
        TokenKind::Operator => matches!(
            tok.operator(),
            Some(OperatorKind::Minus) | Some(OperatorKind::Tilde) | Some(OperatorKind::Bang)
        ),
        _ => false,
    }
}

impl Parser {
    // ---- binary layer ----

    /// Parses a full expression: a term followed by any number of binary
    /// operators.
    pub(crate) fn parse_expr(&mut self) -> PResult<NodeId> {
        let left = self.parse_term_expr()?;
        self.parse_binary_chain(left)
    }

    fn parse_binary_chain(&mut self, mut left: NodeId) -> PResult<NodeId> {
        while let Some(op) = self.peek_binary_op(false) {
            self.consume_op(op);
            left = self.parse_bin_rhs(left, op)?;
        }
        Ok(left)
    }

    /// Parses the right operand of an already-consumed operator, folding
    /// in any following operators that bind tighter. Line breaks before
    /// an operator are tolerated only here, during right-operand parsing.
    fn parse_bin_rhs(&mut self, left: NodeId, op: BinOpInfo) -> PResult<NodeId> {
        let mut right = match op.op {
            PendingOp::Cast => self.parse_type_spec()?,
            PendingOp::Bin(_) => self.parse_term_expr()?,
        };

        if let PendingOp::Bin(_) = op.op {
            while let Some(next) = self.peek_binary_op(true) {
                if next.prec <= op.prec {
                    break;
                }
                self.consume_op(next);
                right = self.parse_bin_rhs(right, next)?;
            }
        }

        let start = self.nodes[left].start_token;
        let node = match op.op {
            PendingOp::Cast => self.push_node(
                NodeKind::CastExpr,
                start,
                NodeData::Pair { left, right },
            ),
            PendingOp::Bin(bin) => self.push_node(
                NodeKind::BinExpr,
                start,
                NodeData::Binary {
                    left,
                    op: bin,
                    right,
                },
            ),
        };
        Ok(node)
    }

    /// Looks at the upcoming token (optionally across a line break) and
    /// classifies it as a binary operator. Never consumes input.
    fn peek_binary_op(&self, allow_line_break: bool) -> Option<BinOpInfo> {
        let mut at = self.pos;
        if allow_line_break && self.peek().kind() == TokenKind::NewLine {
            at += 1;
            if self.token_abs(at).kind() == TokenKind::Indent {
                at += 1;
            }
        }

        let tok = self.token_abs(at);
        let (op, len) = match tok.kind() {
            TokenKind::Operator => {
                let kind = tok.operator()?;
                // `+=`-style compound assignment is two tokens; leave it
                // for the statement level.
                if matches!(
                    kind,
                    OperatorKind::Plus
                        | OperatorKind::Minus
                        | OperatorKind::Star
                        | OperatorKind::Slash
                ) && self.token_abs(at + 1).kind() == TokenKind::Equal
                {
                    return None;
                }
                let bin = match kind {
                    OperatorKind::Plus => BinaryOp::Add,
                    OperatorKind::Minus => BinaryOp::Sub,
                    OperatorKind::Star => BinaryOp::Mul,
                    OperatorKind::Slash => BinaryOp::Div,
                    OperatorKind::Percent => BinaryOp::Mod,
                    OperatorKind::Caret => BinaryOp::BitwiseXor,
                    OperatorKind::Ampersand => BinaryOp::BitwiseAnd,
                    // `|` and `||` both produce the bitwise-or node.
                    OperatorKind::VerticalBar => BinaryOp::BitwiseOr,
                    OperatorKind::DoubleVerticalBar => BinaryOp::BitwiseOr,
                    OperatorKind::LessLess => BinaryOp::LeftShift,
                    OperatorKind::GreaterGreater => BinaryOp::RightShift,
                    OperatorKind::Less => BinaryOp::Less,
                    OperatorKind::LessEqual => BinaryOp::LessEqual,
                    OperatorKind::Greater => BinaryOp::Greater,
                    OperatorKind::GreaterEqual => BinaryOp::GreaterEqual,
                    OperatorKind::EqualEqual => BinaryOp::Equal,
                    OperatorKind::BangEqual => BinaryOp::NotEqual,
                    OperatorKind::Bang | OperatorKind::Tilde => return None,
                };
                (PendingOp::Bin(bin), 1)
            }
            TokenKind::And => (PendingOp::Bin(BinaryOp::And), 1),
            TokenKind::Or => (PendingOp::Bin(BinaryOp::Or), 1),
            TokenKind::Is => {
                if self.token_abs(at + 1).kind() == TokenKind::Not {
                    (PendingOp::Bin(BinaryOp::NotEqual), 2)
                } else {
                    (PendingOp::Bin(BinaryOp::Equal), 1)
                }
            }
            TokenKind::As => (PendingOp::Cast, 1),
            _ => return None,
        };

        let prec = match op {
            PendingOp::Bin(bin) => bin.precedence(),
            PendingOp::Cast => CAST_PRECEDENCE,
        };
        Some(BinOpInfo { op, prec, at, len })
    }

    fn consume_op(&mut self, info: BinOpInfo) {
        self.restore(info.at + info.len);
    }

    /// Token at an absolute buffer position.
    fn token_abs(&self, at: usize) -> Token {
        debug_assert!(at >= self.pos);
        self.peek_at(at - self.pos)
    }

    // ---- term layer ----

    pub(crate) fn parse_term_expr(&mut self) -> PResult<NodeId> {
        let tok = self.peek();
        match tok.kind() {
            TokenKind::Not => self.parse_unary(UnaryOp::Not),
            TokenKind::Operator => match tok.operator() {
                Some(OperatorKind::Minus) => self.parse_unary(UnaryOp::Minus),
                Some(OperatorKind::Tilde) => self.parse_unary(UnaryOp::BitwiseNot),
                Some(OperatorKind::Bang) => self.parse_unary(UnaryOp::Not),
                _ => Err(ParseError::UnexpectedToken {
                    expected: "expression",
                    found: tok.kind(),
                    pos: tok.start(),
                }),
            },
            TokenKind::Throw => {
                let t = self.cur_id();
                self.advance();
                let child = self.parse_term_expr()?;
                Ok(self.push_node(NodeKind::ThrowExpr, t, NodeData::Child { child }))
            }
            TokenKind::Try => {
                let t = self.cur_id();
                self.advance();
                let expr = self.parse_term_expr()?;
                let else_expr = if self.match_kind(TokenKind::Else) {
                    Some(self.parse_term_expr()?)
                } else {
                    None
                };
                Ok(self.push_node(
                    NodeKind::TryExpr,
                    t,
                    NodeData::TryExpr { expr, else_expr },
                ))
            }
            TokenKind::Coresume => {
                let t = self.cur_id();
                self.advance();
                let child = self.parse_term_expr()?;
                Ok(self.push_node(NodeKind::Coresume, t, NodeData::Child { child }))
            }
            TokenKind::Coinit => {
                let t = self.cur_id();
                self.advance();
                let child = self.parse_term_expr()?;
                Ok(self.push_node(NodeKind::Coinit, t, NodeData::Child { child }))
            }
            TokenKind::Coyield => {
                let t = self.cur_id();
                self.advance();
                let child = if can_start_term(self.peek()) {
                    Some(self.parse_term_expr()?)
                } else {
                    None
                };
                Ok(self.push_node(NodeKind::Coyield, t, NodeData::OptChild { child }))
            }
            TokenKind::If => self.parse_if_expr(),
            _ => self.parse_tight_term(),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp) -> PResult<NodeId> {
        let t = self.cur_id();
        self.advance();
        let child = self.parse_term_expr()?;
        Ok(self.push_node(NodeKind::UnaryExpr, t, NodeData::Unary { child, op }))
    }

    /// `if cond then a [else b]` expression form.
    fn parse_if_expr(&mut self) -> PResult<NodeId> {
        let t = self.cur_id();
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then, "`then`")?;
        let then_expr = self.parse_expr()?;
        let else_expr = if self.match_kind(TokenKind::Else) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(self.push_node(
            NodeKind::IfExpr,
            t,
            NodeData::IfExpr {
                cond,
                then_expr,
                else_expr,
            },
        ))
    }

    // ---- tight-term layer ----

    pub(crate) fn parse_tight_term(&mut self) -> PResult<NodeId> {
        let atom = self.parse_atom()?;
        self.parse_postfix_chain(atom)
    }

    /// Postfix operators: `.member`, `[index]`/`[a..b]`, `(args)`, and
    /// the `{...}` initializer (identifier or access targets only).
    pub(crate) fn parse_postfix_chain(&mut self, mut left: NodeId) -> PResult<NodeId> {
        loop {
            match self.peek().kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name_tok = self.cur_id();
                    self.expect(TokenKind::Ident, "identifier")?;
                    let right = self.push_node(NodeKind::Ident, name_tok, NodeData::None);
                    let start = self.nodes[left].start_token;
                    left = self.push_node(
                        NodeKind::AccessExpr,
                        start,
                        NodeData::Pair { left, right },
                    );
                }
                TokenKind::LeftBracket => left = self.parse_index_or_slice(left)?,
                TokenKind::LeftParen => left = self.parse_call(left)?,
                TokenKind::LeftBrace
                    if matches!(
                        self.node_kind(left),
                        NodeKind::Ident | NodeKind::AccessExpr
                    ) =>
                {
                    left = self.parse_object_init(left)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_index_or_slice(&mut self, left: NodeId) -> PResult<NodeId> {
        let start = self.nodes[left].start_token;
        self.advance(); // `[`

        if self.match_kind(TokenKind::DotDot) {
            let high = if self.peek().kind() == TokenKind::RightBracket {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::RightBracket, "`]`")?;
            return Ok(self.push_node(
                NodeKind::SliceExpr,
                start,
                NodeData::Slice {
                    parent: left,
                    low: None,
                    high,
                },
            ));
        }

        let first = self.parse_expr()?;
        if self.match_kind(TokenKind::DotDot) {
            let high = if self.peek().kind() == TokenKind::RightBracket {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::RightBracket, "`]`")?;
            return Ok(self.push_node(
                NodeKind::SliceExpr,
                start,
                NodeData::Slice {
                    parent: left,
                    low: Some(first),
                    high,
                },
            ));
        }

        self.expect(TokenKind::RightBracket, "`]`")?;
        Ok(self.push_node(
            NodeKind::IndexExpr,
            start,
            NodeData::Pair {
                left,
                right: first,
            },
        ))
    }

    fn parse_call(&mut self, callee: NodeId) -> PResult<NodeId> {
        let start = self.nodes[callee].start_token;
        self.advance(); // `(`

        let mut head = None;
        let mut tail = None;
        let mut has_named_arg = false;

        self.skip_line_tokens();
        if self.peek().kind() != TokenKind::RightParen {
            loop {
                let arg = if self.peek().kind() == TokenKind::Ident
                    && self.peek_at(1).kind() == TokenKind::Colon
                {
                    has_named_arg = true;
                    let name_tok = self.cur_id();
                    self.advance(); // identifier
                    let name = self.push_node(NodeKind::Ident, name_tok, NodeData::None);
                    self.advance(); // colon
                    let value = self.parse_expr()?;
                    self.push_node(
                        NodeKind::NamedArg,
                        name_tok,
                        NodeData::Pair {
                            left: name,
                            right: value,
                        },
                    )
                } else {
                    self.parse_expr()?
                };
                self.chain(&mut head, &mut tail, arg);

                self.skip_line_tokens();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                self.skip_line_tokens();
                if self.peek().kind() == TokenKind::RightParen {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;

        Ok(self.push_node(
            NodeKind::CallExpr,
            start,
            NodeData::Call {
                callee,
                arg_head: head,
                has_named_arg,
            },
        ))
    }

    fn parse_object_init(&mut self, left: NodeId) -> PResult<NodeId> {
        let start = self.nodes[left].start_token;
        let entry_head = self.parse_brace_entries()?;
        Ok(self.push_node(
            NodeKind::ObjectInit,
            start,
            NodeData::ObjectInit { left, entry_head },
        ))
    }

    // ---- atoms ----

    fn parse_atom(&mut self) -> PResult<NodeId> {
        let tok = self.peek();
        match tok.kind() {
            TokenKind::Ident => {
                if self.peek_at(1).kind() == TokenKind::EqualGreater {
                    return self.parse_single_param_lambda();
                }
                let t = self.cur_id();
                self.advance();
                let node = self.push_node(NodeKind::Ident, t, NodeData::None);
                self.note_reference(node);
                Ok(node)
            }
            TokenKind::Number => self.parse_leaf(NodeKind::Number),
            TokenKind::NonDecimalInt => self.parse_leaf(NodeKind::NonDecimalInt),
            TokenKind::String => self.parse_leaf(NodeKind::String),
            TokenKind::TemplateString => self.parse_template_string(),
            TokenKind::True => self.parse_leaf(NodeKind::TrueLit),
            TokenKind::False => self.parse_leaf(NodeKind::FalseLit),
            TokenKind::NoneK => self.parse_leaf(NodeKind::NoneLit),
            TokenKind::Symbol => self.parse_leaf(NodeKind::Symbol),
            TokenKind::Error => self.parse_error_symbol(),
            TokenKind::At => {
                let t = self.cur_id();
                self.advance();
                let child = self.parse_at_target()?;
                Ok(self.push_node(NodeKind::AtExpr, t, NodeData::Child { child }))
            }
            TokenKind::LeftParen => self.parse_group_or_lambda(),
            TokenKind::LeftBracket => self.parse_list_literal(),
            TokenKind::LeftBrace => self.parse_map_literal(),
            found => Err(ParseError::UnexpectedToken {
                expected: "expression",
                found,
                pos: tok.start(),
            }),
        }
    }

    fn parse_leaf(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let t = self.cur_id();
        self.advance();
        Ok(self.push_node(kind, t, NodeData::None))
    }

    /// An identifier node that does not take part in dependency
    /// tracking: declaration names, members, named-arg labels.
    pub(crate) fn parse_ident_node(&mut self) -> PResult<NodeId> {
        let t = self.cur_id();
        self.expect(TokenKind::Ident, "identifier")?;
        Ok(self.push_node(NodeKind::Ident, t, NodeData::None))
    }

    /// The `@name` target: an untracked identifier plus its postfix
    /// chain.
    pub(crate) fn parse_at_target(&mut self) -> PResult<NodeId> {
        let ident = self.parse_ident_node()?;
        self.parse_postfix_chain(ident)
    }

    /// `error.Name` tag literal.
    fn parse_error_symbol(&mut self) -> PResult<NodeId> {
        let t = self.cur_id();
        self.advance(); // `error`
        self.expect(TokenKind::Dot, "`.`")?;
        let child = self.parse_ident_node()?;
        Ok(self.push_node(NodeKind::ErrorSymbol, t, NodeData::Child { child }))
    }

    /// Interleaved string segments and expressions of a template string.
    fn parse_template_string(&mut self) -> PResult<NodeId> {
        let first = self.cur_id();
        let mut head = None;
        let mut tail = None;
        loop {
            let seg_tok = self.cur_id();
            self.expect(TokenKind::TemplateString, "template string")?;
            let seg = self.push_node(NodeKind::String, seg_tok, NodeData::None);
            self.chain(&mut head, &mut tail, seg);

            if self.match_kind(TokenKind::TemplateExprStart) {
                let expr = self.parse_expr()?;
                self.chain(&mut head, &mut tail, expr);
                self.expect(TokenKind::RightBrace, "`}`")?;
            } else {
                break;
            }
        }
        Ok(self.push_node(
            NodeKind::TemplateString,
            first,
            NodeData::ChildList { head },
        ))
    }

    fn parse_list_literal(&mut self) -> PResult<NodeId> {
        let t = self.cur_id();
        self.advance(); // `[`

        let mut head = None;
        let mut tail = None;
        self.skip_line_tokens();
        if self.peek().kind() != TokenKind::RightBracket {
            loop {
                let elem = self.parse_expr()?;
                self.chain(&mut head, &mut tail, elem);
                self.skip_line_tokens();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                self.skip_line_tokens();
                if self.peek().kind() == TokenKind::RightBracket {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBracket, "`]`")?;
        Ok(self.push_node(NodeKind::ListLiteral, t, NodeData::ChildList { head }))
    }

    fn parse_map_literal(&mut self) -> PResult<NodeId> {
        let t = self.cur_id();
        let head = self.parse_brace_entries()?;
        Ok(self.push_node(NodeKind::MapLiteral, t, NodeData::ChildList { head }))
    }

    /// `{ key: value, ... }` entry list shared by map literals and object
    /// initializers. Keys are identifiers, strings, or numbers.
    fn parse_brace_entries(&mut self) -> PResult<Option<NodeId>> {
        self.advance(); // `{`

        let mut head = None;
        let mut tail = None;
        self.skip_line_tokens();
        if self.peek().kind() != TokenKind::RightBrace {
            loop {
                let entry = self.parse_map_entry()?;
                self.chain(&mut head, &mut tail, entry);
                self.skip_line_tokens();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                self.skip_line_tokens();
                if self.peek().kind() == TokenKind::RightBrace {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(head)
    }

    fn parse_map_entry(&mut self) -> PResult<NodeId> {
        let key_tok = self.cur_id();
        let key = match self.peek().kind() {
            TokenKind::Ident => self.parse_ident_node()?,
            TokenKind::String => self.parse_leaf(NodeKind::String)?,
            TokenKind::Number => self.parse_leaf(NodeKind::Number)?,
            found => {
                return Err(ParseError::UnexpectedToken {
                    expected: "map key",
                    found,
                    pos: self.peek().start(),
                })
            }
        };
        self.expect(TokenKind::Colon, "`:`")?;
        let value = self.parse_expr()?;
        Ok(self.push_node(
            NodeKind::MapEntry,
            key_tok,
            NodeData::Pair {
                left: key,
                right: value,
            },
        ))
    }

    /// Skips newline and indent tokens inside bracketed constructs.
    fn skip_line_tokens(&mut self) {
        while matches!(
            self.peek().kind(),
            TokenKind::NewLine | TokenKind::Indent
        ) {
            self.advance();
        }
    }

    // ---- lambdas ----

    /// `ident => expr`.
    fn parse_single_param_lambda(&mut self) -> PResult<NodeId> {
        let name_tok = self.cur_id();
        self.advance(); // identifier
        self.advance(); // `=>`
        let param = self.push_node(NodeKind::Param, name_tok, NodeData::OptChild { child: None });
        self.finish_expr_lambda(name_tok, Some(param), 1)
    }

    /// Open paren: `()` / `(params) => expr` lambdas, or a grouped
    /// expression. A comma, a stray identifier (a typed parameter), or a
    /// closing paren followed by `=>` re-parses from the opening paren as
    /// a parameter list.
    fn parse_group_or_lambda(&mut self) -> PResult<NodeId> {
        let snap = self.snapshot();
        let paren_tok = self.cur_id();
        self.advance(); // `(`

        if self.peek().kind() == TokenKind::RightParen {
            self.advance();
            self.expect(TokenKind::EqualGreater, "`=>`")?;
            return self.finish_expr_lambda(paren_tok, None, 0);
        }

        let expr = self.parse_expr()?;
        match self.peek().kind() {
            TokenKind::Comma | TokenKind::Ident => {
                self.rollback(snap);
                self.parse_paren_lambda()
            }
            TokenKind::RightParen if self.peek_at(1).kind() == TokenKind::EqualGreater => {
                self.rollback(snap);
                self.parse_paren_lambda()
            }
            TokenKind::RightParen => {
                self.advance();
                Ok(self.push_node(NodeKind::Group, paren_tok, NodeData::Child { child: expr }))
            }
            found => Err(ParseError::UnexpectedToken {
                expected: "`)`",
                found,
                pos: self.peek().start(),
            }),
        }
    }

    /// `(params) => expr`, entered at the opening paren.
    fn parse_paren_lambda(&mut self) -> PResult<NodeId> {
        let paren_tok = self.cur_id();
        self.expect(TokenKind::LeftParen, "`(`")?;
        let (param_head, num_params) = self.parse_param_list()?;
        self.expect(TokenKind::RightParen, "`)`")?;
        self.expect(TokenKind::EqualGreater, "`=>`")?;
        self.finish_expr_lambda(paren_tok, param_head, num_params)
    }

    /// Parses the expression body with the parameters in scope.
    fn finish_expr_lambda(
        &mut self,
        start_tok: sablec_lex::TokenId,
        param_head: Option<NodeId>,
        num_params: u16,
    ) -> PResult<NodeId> {
        self.push_block();
        self.declare_params(param_head);
        let body = self.parse_expr()?;
        self.pop_block();
        Ok(self.push_node(
            NodeKind::LambdaExpr,
            start_tok,
            NodeData::Lambda {
                param_head,
                num_params,
                body,
            },
        ))
    }

    /// Declares every parameter in a chain into the innermost block.
    pub(crate) fn declare_params(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            let (start, end) = self.node_text_range(id);
            let name = self.src[start..end].to_owned();
            self.declare(&name);
            cur = self.nodes[id].next;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, NodeData, NodeId, NodeKind, UnaryOp};
    use crate::Parser;

    fn parse_ok(source: &str) -> crate::OwnedParseResult {
        let mut parser = Parser::new();
        let res = parser.parse(source);
        assert!(!res.has_error, "parse error: {}", res.err_msg);
        res.dupe()
    }

    /// The expression inside the first statement.
    fn first_expr(res: &crate::OwnedParseResult) -> NodeId {
        let root = res.root_id.expect("root");
        let stmt = res.first_child(root).expect("statement");
        match res.nodes[stmt].data {
            NodeData::Child { child } => child,
            _ => panic!("not an expression statement"),
        }
    }

    fn bin_parts(res: &crate::OwnedParseResult, id: NodeId) -> (NodeId, BinaryOp, NodeId) {
        match res.nodes[id].data {
            NodeData::Binary { left, op, right } => (left, op, right),
            other => panic!("not a binary expr: {other:?}"),
        }
    }

    #[test]
    fn test_left_associative_same_precedence() {
        let res = parse_ok("a - b - c");
        let (left, op, _right) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Sub);
        // ((a - b) - c): the left child is itself a subtraction.
        assert_eq!(res.nodes[left].kind, NodeKind::BinExpr);
    }

    #[test]
    fn test_tighter_right_operand_folds() {
        // a + ((b * c) * d)
        let res = parse_ok("a + b * c * d");
        let (left, op, right) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(res.nodes[left].kind, NodeKind::Ident);
        let (rl, rop, rr) = bin_parts(&res, right);
        assert_eq!(rop, BinaryOp::Mul);
        assert_eq!(res.nodes[rr].kind, NodeKind::Ident);
        let (_, rlop, _) = bin_parts(&res, rl);
        assert_eq!(rlop, BinaryOp::Mul);
    }

    #[test]
    fn test_comparison_folds_arithmetic() {
        // a < ((b * c) - d)
        let res = parse_ok("a < b * c - d");
        let (_, op, right) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Less);
        let (rl, rop, _) = bin_parts(&res, right);
        assert_eq!(rop, BinaryOp::Sub);
        let (_, rlop, _) = bin_parts(&res, rl);
        assert_eq!(rlop, BinaryOp::Mul);
    }

    #[test]
    fn test_and_or_precedence() {
        // (a and b) or c
        let res = parse_ok("a and b or c");
        let (left, op, _) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Or);
        let (_, lop, _) = bin_parts(&res, left);
        assert_eq!(lop, BinaryOp::And);
    }

    #[test]
    fn test_is_and_is_not() {
        let res = parse_ok("a is b");
        let (_, op, _) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Equal);

        let res = parse_ok("a is not b");
        let (_, op, _) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::NotEqual);
    }

    #[test]
    fn test_double_vertical_bar_is_bitwise_or() {
        let res = parse_ok("a || b");
        let (_, op, _) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::BitwiseOr);
    }

    #[test]
    fn test_cast() {
        let res = parse_ok("a as Number");
        let expr = first_expr(&res);
        assert_eq!(res.nodes[expr].kind, NodeKind::CastExpr);
    }

    #[test]
    fn test_cast_binds_below_arithmetic() {
        // (a + b) as Number
        let res = parse_ok("a + b as Number");
        let expr = first_expr(&res);
        assert_eq!(res.nodes[expr].kind, NodeKind::CastExpr);
        let NodeData::Pair { left, .. } = res.nodes[expr].data else {
            panic!("cast data");
        };
        assert_eq!(res.nodes[left].kind, NodeKind::BinExpr);
    }

    #[test]
    fn test_operator_after_line_break_in_right_operand() {
        // The `+ d` continuation folds into the comparison's right side.
        let res = parse_ok("x = a < b\n  + d");
        assert!(!res.has_error);
    }

    #[test]
    fn test_unary_forms() {
        for (src, expected) in [
            ("-a", UnaryOp::Minus),
            ("~a", UnaryOp::BitwiseNot),
            ("!a", UnaryOp::Not),
            ("not a", UnaryOp::Not),
        ] {
            let res = parse_ok(src);
            let expr = first_expr(&res);
            let NodeData::Unary { op, .. } = res.nodes[expr].data else {
                panic!("unary data for {src}");
            };
            assert_eq!(op, expected, "source {src}");
        }
    }

    #[test]
    fn test_postfix_chain() {
        let res = parse_ok("a.b[0].c(1)");
        let expr = first_expr(&res);
        assert_eq!(res.nodes[expr].kind, NodeKind::CallExpr);
    }

    #[test]
    fn test_slice_forms() {
        for src in ["a[1..2]", "a[..2]", "a[1..]", "a[..]"] {
            let res = parse_ok(src);
            let expr = first_expr(&res);
            assert_eq!(res.nodes[expr].kind, NodeKind::SliceExpr, "source {src}");
        }
        let res = parse_ok("a[1]");
        assert_eq!(res.nodes[first_expr(&res)].kind, NodeKind::IndexExpr);
    }

    #[test]
    fn test_named_args_flag_call() {
        let res = parse_ok("f(1, to: 2)");
        let expr = first_expr(&res);
        let NodeData::Call {
            has_named_arg,
            arg_head,
            ..
        } = res.nodes[expr].data
        else {
            panic!("call data");
        };
        assert!(has_named_arg);
        let first = arg_head.expect("args");
        assert_eq!(res.nodes[first].kind, NodeKind::Number);
        let second = res.nodes[first].next.expect("named arg");
        assert_eq!(res.nodes[second].kind, NodeKind::NamedArg);
    }

    #[test]
    fn test_call_without_named_args() {
        let res = parse_ok("f(1, 2)");
        let NodeData::Call { has_named_arg, .. } = res.nodes[first_expr(&res)].data else {
            panic!("call data");
        };
        assert!(!has_named_arg);
    }

    #[test]
    fn test_object_initializer() {
        let res = parse_ok("p = Point{x: 1, y: 2}");
        assert!(!res.has_error);
        let root = res.root_id.expect("root");
        let stmt = res.first_child(root).expect("stmt");
        let NodeData::Pair { right, .. } = res.nodes[stmt].data else {
            panic!("assign data");
        };
        assert_eq!(res.nodes[right].kind, NodeKind::ObjectInit);
        assert!(res.deps.contains_key("Point"));
    }

    #[test]
    fn test_list_and_map_literals() {
        let res = parse_ok("xs = [1, 2, 3]");
        assert!(!res.has_error);
        let res = parse_ok("m = {a: 1, 'b': 2, 3: 4}");
        assert!(!res.has_error);
    }

    #[test]
    fn test_group() {
        let res = parse_ok("(1 + 2) * 3");
        let (left, op, _) = bin_parts(&res, first_expr(&res));
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(res.nodes[left].kind, NodeKind::Group);
    }

    #[test]
    fn test_single_param_lambda() {
        let res = parse_ok("f = x => x + 1");
        assert!(!res.has_error);
        // The parameter is bound inside the lambda, not a dependency.
        assert!(!res.deps.contains_key("x"));
    }

    #[test]
    fn test_no_param_lambda() {
        let res = parse_ok("f = () => 1");
        assert!(!res.has_error);
    }

    #[test]
    fn test_multi_param_lambda() {
        let res = parse_ok("f = (a, b) => a + b");
        assert!(!res.has_error);
        assert!(!res.deps.contains_key("a"));
        assert!(!res.deps.contains_key("b"));
    }

    #[test]
    fn test_lambda_rewind_leaves_no_stale_deps() {
        // `(a, b)` is first attempted as a grouped expression; the
        // speculative reference to `a` must not survive the re-parse.
        let res = parse_ok("f = (a, b) => 1");
        assert!(res.deps.is_empty(), "deps: {:?}", res.deps);
    }

    #[test]
    fn test_if_expr() {
        let res = parse_ok("x = if c then 1 else 2");
        assert!(!res.has_error);
        assert!(res.deps.contains_key("c"));
    }

    #[test]
    fn test_try_expr_with_else() {
        let res = parse_ok("x = try f() else 0");
        assert!(!res.has_error);
    }

    #[test]
    fn test_throw_and_coroutine_prefixes() {
        for src in [
            "x = throw err",
            "x = coresume fiber",
            "x = coinit task()",
            "x = coyield",
            "x = coyield 1",
        ] {
            let res = parse_ok(src);
            assert!(!res.has_error, "source {src}");
        }
    }

    #[test]
    fn test_error_symbol() {
        let res = parse_ok("e = error.NotFound");
        assert!(!res.has_error);
        assert!(res.deps.is_empty());
    }

    #[test]
    fn test_symbol_literal_expr() {
        let res = parse_ok("s = #ok");
        assert!(!res.has_error);
    }

    #[test]
    fn test_template_string_expr_parts() {
        let res = parse_ok("m = 'a{x}b'");
        let root = res.root_id.expect("root");
        let stmt = res.first_child(root).expect("stmt");
        let NodeData::Pair { right, .. } = res.nodes[stmt].data else {
            panic!("assign data");
        };
        assert_eq!(res.nodes[right].kind, NodeKind::TemplateString);
        let NodeData::ChildList { head } = res.nodes[right].data else {
            panic!("template data");
        };
        // seg, expr, seg
        let p1 = head.expect("first part");
        let p2 = res.nodes[p1].next.expect("expr part");
        let p3 = res.nodes[p2].next.expect("last part");
        assert_eq!(res.nodes[p1].kind, NodeKind::String);
        assert_eq!(res.nodes[p2].kind, NodeKind::Ident);
        assert_eq!(res.nodes[p3].kind, NodeKind::String);
        assert!(res.nodes[p3].next.is_none());
        assert!(res.deps.contains_key("x"));
    }

    #[test]
    fn test_multiline_call_args() {
        let res = parse_ok("f(\n  1,\n  2,\n)");
        assert!(!res.has_error);
    }

    #[test]
    fn test_sibling_order_is_source_order() {
        let res = parse_ok("f(1, 2, 3)\ng = [4, 5]");
        for (_, node) in res.nodes.iter_enumerated() {
            if let Some(next) = node.next {
                assert!(node.start_token < res.nodes[next].start_token);
            }
        }
    }
}

//! Statement parsing - dispatch, control flow, and assignments.

use crate::ast::{BinaryOp, NodeData, NodeId, NodeKind, StaticDeclKind};
use crate::{PResult, ParseError, Parser};
use sablec_lex::{OperatorKind, TokenKind};

/// Tokens that may begin a no-paren call argument. Parenthesized and
/// bracketed forms never reach the check: the tight postfix chain has
/// already consumed them.
fn starts_no_paren_arg(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Number
            | TokenKind::NonDecimalInt
            | TokenKind::String
            | TokenKind::TemplateString
            | TokenKind::Symbol
            | TokenKind::True
            | TokenKind::False
            | TokenKind::NoneK
    )
}

/// Tokens that may begin an expression statement.
fn starts_expression(kind: TokenKind) -> bool {
    starts_no_paren_arg(kind)
        || matches!(
            kind,
            TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Operator
                | TokenKind::Not
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Coresume
                | TokenKind::Coyield
                | TokenKind::Coinit
                | TokenKind::Error
                | TokenKind::If
        )
}

impl Parser {
    /// Parses one statement. `indent` is the indent of the statement's
    /// line; bodies and else chains measure against it.
    pub(crate) fn parse_statement(&mut self, indent: u32) -> PResult<NodeId> {
        self.cur_indent = indent;
        let tok = self.peek();
        match tok.kind() {
            TokenKind::Ident if self.peek_at(1).kind() == TokenKind::Colon => {
                self.parse_label_decl(indent)
            }
            TokenKind::At => self.parse_at_stmt(),
            TokenKind::Type => self.parse_type_decl(indent),
            TokenKind::Func => self.parse_func_decl(indent),
            TokenKind::If => self.parse_if_stmt(indent),
            TokenKind::Match => self.parse_match_stmt(indent),
            TokenKind::For => self.parse_for_stmt(indent),
            TokenKind::While => self.parse_while_stmt(indent),
            TokenKind::Import => self.parse_import_stmt(),
            TokenKind::Pass => self.parse_leaf_stmt(NodeKind::PassStmt),
            TokenKind::Continue => self.parse_leaf_stmt(NodeKind::ContinueStmt),
            TokenKind::Break => self.parse_leaf_stmt(NodeKind::BreakStmt),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Try if self.peek_at(1).kind() == TokenKind::Colon => {
                self.parse_try_stmt(indent)
            }
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Capture => self.parse_local_decl(NodeKind::CaptureDecl),
            TokenKind::Static => self.parse_local_decl(NodeKind::StaticDecl),
            kind if starts_expression(kind) => self.parse_expr_or_assign_stmt(),
            kind => Err(ParseError::UnknownToken {
                kind,
                pos: tok.start(),
            }),
        }
    }

    /// `name: body` labeled block declaration.
    fn parse_label_decl(&mut self, indent: u32) -> PResult<NodeId> {
        let name_tok = self.cur_id();
        self.advance(); // identifier
        self.advance(); // colon
        let body = self.parse_body(indent)?;
        Ok(self.push_node(NodeKind::LabelDecl, name_tok, NodeData::ChildList { head: body }))
    }

    /// `@name(args)` statement form; the wrapped expression must be a
    /// call.
    fn parse_at_stmt(&mut self) -> PResult<NodeId> {
        let at_tok = self.cur_id();
        let at_pos = self.peek().start();
        self.advance();

        let expr = self.parse_at_target()?;
        if self.node_kind(expr) != NodeKind::CallExpr {
            return Err(ParseError::Rule {
                msg: crate::MSG_BAD_AT_STMT,
                pos: at_pos,
            });
        }

        let node = self.push_node(NodeKind::AtStmt, at_tok, NodeData::Child { child: expr });
        self.expect_line_end()?;
        Ok(node)
    }

    /// `pass`, `break`, or `continue`.
    fn parse_leaf_stmt(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let tok = self.cur_id();
        self.advance();
        let node = self.push_node(kind, tok, NodeData::None);
        self.expect_line_end()?;
        Ok(node)
    }

    fn parse_return_stmt(&mut self) -> PResult<NodeId> {
        let tok = self.cur_id();
        self.advance();
        let node = if matches!(self.peek().kind(), TokenKind::NewLine | TokenKind::None) {
            self.push_node(NodeKind::ReturnStmt, tok, NodeData::None)
        } else {
            let child = self.parse_expr()?;
            self.push_node(NodeKind::ReturnExprStmt, tok, NodeData::Child { child })
        };
        self.expect_line_end()?;
        Ok(node)
    }

    /// Expression statement, assignment, or operator assignment.
    fn parse_expr_or_assign_stmt(&mut self) -> PResult<NodeId> {
        let expr = self.parse_expr()?;
        match self.peek().kind() {
            TokenKind::Equal => self.parse_assign_stmt(expr),
            TokenKind::Operator if self.peek_at(1).kind() == TokenKind::Equal => {
                if let Some(op) = assign_operator(self.peek().operator()) {
                    self.parse_op_assign_stmt(expr, op)
                } else {
                    Err(ParseError::UnexpectedToken {
                        expected: "new line",
                        found: TokenKind::Operator,
                        pos: self.peek().start(),
                    })
                }
            }
            _ => {
                let expr = self.maybe_no_paren_call(expr)?;
                let start = self.nodes[expr].start_token;
                let node = self.push_node(NodeKind::ExprStmt, start, NodeData::Child { child: expr });
                self.expect_line_end()?;
                Ok(node)
            }
        }
    }

    fn parse_assign_stmt(&mut self, lhs: NodeId) -> PResult<NodeId> {
        self.check_assignable(lhs)?;
        self.advance(); // `=`
        let rhs = self.parse_decl_rhs()?;
        if self.node_kind(lhs) == NodeKind::Ident {
            self.bind_assignment(lhs);
        }
        let start = self.nodes[lhs].start_token;
        Ok(self.push_node(
            NodeKind::AssignStmt,
            start,
            NodeData::Pair {
                left: lhs,
                right: rhs,
            },
        ))
    }

    fn parse_op_assign_stmt(&mut self, lhs: NodeId, op: BinaryOp) -> PResult<NodeId> {
        self.check_assignable(lhs)?;
        self.advance(); // operator
        self.advance(); // `=`
        let rhs = self.parse_expr()?;
        let start = self.nodes[lhs].start_token;
        let node = self.push_node(
            NodeKind::OpAssignStmt,
            start,
            NodeData::Binary {
                left: lhs,
                op,
                right: rhs,
            },
        );
        self.expect_line_end()?;
        Ok(node)
    }

    fn check_assignable(&self, lhs: NodeId) -> PResult<()> {
        match self.node_kind(lhs) {
            NodeKind::Ident | NodeKind::AccessExpr | NodeKind::IndexExpr => Ok(()),
            _ => Err(ParseError::Rule {
                msg: crate::MSG_BAD_ASSIGN_TARGET,
                pos: self.node_pos(lhs),
            }),
        }
    }

    /// Builds a call from whitespace-separated tight terms when an
    /// identifier or access expression is followed by the start of
    /// another term on the same line.
    fn maybe_no_paren_call(&mut self, left: NodeId) -> PResult<NodeId> {
        if !matches!(
            self.node_kind(left),
            NodeKind::Ident | NodeKind::AccessExpr
        ) {
            return Ok(left);
        }
        if !starts_no_paren_arg(self.peek().kind()) {
            return Ok(left);
        }

        let mut head = None;
        let mut tail = None;
        loop {
            let arg = self.parse_tight_term()?;
            self.chain(&mut head, &mut tail, arg);
            if !starts_no_paren_arg(self.peek().kind()) {
                break;
            }
        }

        let start = self.nodes[left].start_token;
        Ok(self.push_node(
            NodeKind::CallExpr,
            start,
            NodeData::Call {
                callee: left,
                arg_head: head,
                has_named_arg: false,
            },
        ))
    }

    // ---- control flow ----

    fn parse_if_stmt(&mut self, indent: u32) -> PResult<NodeId> {
        let if_tok = self.cur_id();
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.parse_body(indent)?;
        let if_node = self.push_node(
            NodeKind::IfStmt,
            if_tok,
            NodeData::IfStmt {
                cond,
                body_head: body,
                else_head: None,
            },
        );

        // Greedy else chain; clauses attach only at the if's own indent.
        let mut prev: Option<NodeId> = None;
        loop {
            let save = self.save();
            let at_else = matches!(self.consume_indent()?, Some((i, _)) if i == indent)
                && self.peek().kind() == TokenKind::Else;
            if !at_else {
                self.restore(save);
                break;
            }

            let else_tok = self.cur_id();
            self.advance();
            let (cond, is_final) = if self.match_kind(TokenKind::Colon) {
                (None, true)
            } else {
                let c = self.parse_expr()?;
                self.expect(TokenKind::Colon, "`:`")?;
                (Some(c), false)
            };
            let body = self.parse_body(indent)?;
            let clause = self.push_node(
                NodeKind::ElseClause,
                else_tok,
                NodeData::ElseClause {
                    cond,
                    body_head: body,
                },
            );

            match prev {
                None => {
                    if let NodeData::IfStmt { else_head, .. } = &mut self.nodes[if_node].data {
                        *else_head = Some(clause);
                    }
                }
                Some(p) => self.nodes[p].next = Some(clause),
            }
            prev = Some(clause);
            if is_final {
                break;
            }
        }
        Ok(if_node)
    }

    /// `match expr:` with arms on the following indented lines. Also used
    /// as a declaration right-hand side.
    pub(crate) fn parse_match_stmt(&mut self, indent: u32) -> PResult<NodeId> {
        let match_tok = self.cur_id();
        self.advance();
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Colon, "`:`")?;
        self.expect_line_end()?;

        let node = self.push_node(
            NodeKind::MatchStmt,
            match_tok,
            NodeData::Match {
                expr,
                case_head: None,
            },
        );

        let case_indent = match self.consume_indent()? {
            Some((i, pos)) => {
                if i <= indent {
                    return Err(ParseError::Rule {
                        msg: crate::MSG_EMPTY_BLOCK,
                        pos,
                    });
                }
                i
            }
            None => {
                return Err(ParseError::Rule {
                    msg: crate::MSG_EMPTY_BLOCK,
                    pos: self.peek().start(),
                })
            }
        };

        let mut head = None;
        let mut tail = None;
        loop {
            let case = self.parse_case_clause(case_indent)?;
            self.chain(&mut head, &mut tail, case);

            let save = self.save();
            match self.consume_indent()? {
                None => break,
                Some((i, _)) if i == case_indent => {}
                Some((i, _)) if i < case_indent => {
                    self.restore(save);
                    break;
                }
                Some((_, pos)) => {
                    return Err(ParseError::Rule {
                        msg: crate::MSG_UNEXPECTED_INDENT,
                        pos,
                    })
                }
            }
        }

        if let NodeData::Match { case_head, .. } = &mut self.nodes[node].data {
            *case_head = head;
        }
        Ok(node)
    }

    /// One match arm: a comma-separated condition list, or the `else`
    /// sentinel.
    fn parse_case_clause(&mut self, case_indent: u32) -> PResult<NodeId> {
        let case_tok = self.cur_id();
        if self.match_kind(TokenKind::Else) {
            self.expect(TokenKind::Colon, "`:`")?;
            let body = self.parse_body(case_indent)?;
            return Ok(self.push_node(
                NodeKind::CaseClause,
                case_tok,
                NodeData::Case {
                    cond_head: None,
                    body_head: body,
                },
            ));
        }

        let mut cond_head = None;
        let mut cond_tail = None;
        loop {
            let cond = self.parse_expr()?;
            self.chain(&mut cond_head, &mut cond_tail, cond);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.parse_body(case_indent)?;
        Ok(self.push_node(
            NodeKind::CaseClause,
            case_tok,
            NodeData::Case {
                cond_head,
                body_head: body,
            },
        ))
    }

    fn parse_for_stmt(&mut self, indent: u32) -> PResult<NodeId> {
        let for_tok = self.cur_id();
        self.advance();

        let first = self.parse_expr()?;
        let range = if self.match_kind(TokenKind::DotDot) {
            let right = self.parse_expr()?;
            let start = self.nodes[first].start_token;
            Some(self.push_node(
                NodeKind::RangeClause,
                start,
                NodeData::Pair {
                    left: first,
                    right,
                },
            ))
        } else {
            None
        };

        let each = if self.peek().kind() == TokenKind::Each {
            Some(self.parse_each_clause()?)
        } else {
            None
        };

        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.parse_body(indent)?;

        let node = match range {
            Some(range) => self.push_node(
                NodeKind::ForRangeStmt,
                for_tok,
                NodeData::ForRange {
                    range,
                    each,
                    body_head: body,
                },
            ),
            None => self.push_node(
                NodeKind::ForIterStmt,
                for_tok,
                NodeData::ForIter {
                    iter: first,
                    each,
                    body_head: body,
                },
            ),
        };
        Ok(node)
    }

    /// `each v` or `each k, v`; the bindings join the innermost block.
    fn parse_each_clause(&mut self) -> PResult<NodeId> {
        let each_tok = self.cur_id();
        self.advance();

        let first = self.parse_ident_node()?;
        let data = if self.match_kind(TokenKind::Comma) {
            let value = self.parse_ident_node()?;
            self.declare_node(first);
            self.declare_node(value);
            NodeData::Each {
                key: Some(first),
                value,
            }
        } else {
            self.declare_node(first);
            NodeData::Each {
                key: None,
                value: first,
            }
        };
        Ok(self.push_node(NodeKind::EachClause, each_tok, data))
    }

    fn parse_while_stmt(&mut self, indent: u32) -> PResult<NodeId> {
        let while_tok = self.cur_id();
        self.advance();

        if self.match_kind(TokenKind::Colon) {
            let body = self.parse_body(indent)?;
            return Ok(self.push_node(
                NodeKind::WhileInfStmt,
                while_tok,
                NodeData::ChildList { head: body },
            ));
        }

        let cond = self.parse_expr()?;
        if self.match_kind(TokenKind::Some) {
            let capture = self.parse_ident_node()?;
            self.declare_node(capture);
            self.expect(TokenKind::Colon, "`:`")?;
            let body = self.parse_body(indent)?;
            return Ok(self.push_node(
                NodeKind::WhileOptStmt,
                while_tok,
                NodeData::WhileOpt {
                    opt: cond,
                    capture,
                    body_head: body,
                },
            ));
        }

        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.parse_body(indent)?;
        Ok(self.push_node(
            NodeKind::WhileCondStmt,
            while_tok,
            NodeData::WhileCond {
                cond,
                body_head: body,
            },
        ))
    }

    fn parse_try_stmt(&mut self, indent: u32) -> PResult<NodeId> {
        let try_tok = self.cur_id();
        self.advance();
        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.parse_body(indent)?;

        let save = self.save();
        let at_catch = matches!(self.consume_indent()?, Some((i, _)) if i == indent)
            && self.peek().kind() == TokenKind::Catch;
        if !at_catch {
            let found = self.peek();
            self.restore(save);
            return Err(ParseError::UnexpectedToken {
                expected: "`catch`",
                found: found.kind(),
                pos: found.start(),
            });
        }
        self.advance(); // catch

        let capture = if self.peek().kind() == TokenKind::Ident {
            let v = self.parse_ident_node()?;
            self.declare_node(v);
            Some(v)
        } else {
            None
        };
        self.expect(TokenKind::Colon, "`:`")?;
        let catch_body = self.parse_body(indent)?;

        Ok(self.push_node(
            NodeKind::TryStmt,
            try_tok,
            NodeData::TryStmt {
                body_head: body,
                capture,
                catch_head: catch_body,
            },
        ))
    }

    fn parse_import_stmt(&mut self) -> PResult<NodeId> {
        let import_tok = self.cur_id();
        self.advance();

        let name = self.parse_ident_node()?;
        self.declare_node(name);

        let spec = self.parse_expr()?;
        if self.node_kind(spec) != NodeKind::String {
            return Err(ParseError::Rule {
                msg: crate::MSG_BAD_IMPORT_TARGET,
                pos: self.node_pos(spec),
            });
        }

        let node = self.push_node(
            NodeKind::ImportStmt,
            import_tok,
            NodeData::Pair {
                left: name,
                right: spec,
            },
        );
        self.record_static(StaticDeclKind::Import, node);
        self.expect_line_end()?;
        Ok(node)
    }
}

/// Maps an operator token to its compound-assignment form, if it has one.
fn assign_operator(op: Option<OperatorKind>) -> Option<BinaryOp> {
    match op? {
        OperatorKind::Plus => Some(BinaryOp::Add),
        OperatorKind::Minus => Some(BinaryOp::Sub),
        OperatorKind::Star => Some(BinaryOp::Mul),
        OperatorKind::Slash => Some(BinaryOp::Div),
        _ => None,
    }
}

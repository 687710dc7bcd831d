//! Declaration parsing - variables, types, functions, and parameters.

use crate::ast::{NodeData, NodeId, NodeKind, StaticDeclKind};
use crate::{PResult, ParseError, Parser};
use sablec_lex::{TokenId, TokenKind};

impl Parser {
    /// `var name [type]: rhs` static variable declaration.
    pub(crate) fn parse_var_decl(&mut self) -> PResult<NodeId> {
        let var_tok = self.cur_id();
        self.advance();

        let name = self.parse_ident_node()?;
        let type_spec = if self.peek().kind() != TokenKind::Colon {
            Some(self.parse_type_spec()?)
        } else {
            None
        };
        self.expect(TokenKind::Colon, "`:`")?;

        // Static bindings are in scope for their own initializer.
        self.declare_node(name);
        let init = self.parse_decl_rhs()?;

        let node = self.push_node(
            NodeKind::VarDecl,
            var_tok,
            NodeData::VarDecl {
                name,
                type_spec,
                init,
            },
        );
        self.record_static(StaticDeclKind::Var, node);
        Ok(node)
    }

    /// `capture name [= rhs]` or `static name [= rhs]` local declaration.
    pub(crate) fn parse_local_decl(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let decl_tok = self.cur_id();
        self.advance();

        let name = self.parse_ident_node()?;
        self.declare_node(name);
        let init = if self.match_kind(TokenKind::Equal) {
            Some(self.parse_decl_rhs()?)
        } else {
            self.expect_line_end()?;
            None
        };
        Ok(self.push_node(kind, decl_tok, NodeData::LocalDecl { name, init }))
    }

    /// A declaration right-hand side: an expression, a `match` statement,
    /// or a multi-line lambda. Consumes the statement terminator.
    pub(crate) fn parse_decl_rhs(&mut self) -> PResult<NodeId> {
        match self.peek().kind() {
            TokenKind::Match => self.parse_match_stmt(self.cur_indent),
            TokenKind::Func if self.peek_at(1).kind() == TokenKind::LeftParen => {
                self.parse_multiline_lambda()
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_line_end()?;
                Ok(expr)
            }
        }
    }

    /// `func (params) [ret]: body` with a statement body.
    fn parse_multiline_lambda(&mut self) -> PResult<NodeId> {
        let func_tok = self.cur_id();
        self.advance(); // func
        self.expect(TokenKind::LeftParen, "`(`")?;
        let (param_head, num_params) = self.parse_param_list()?;
        self.expect(TokenKind::RightParen, "`)`")?;
        let ret = if self.peek().kind() != TokenKind::Colon {
            Some(self.parse_type_spec()?)
        } else {
            None
        };
        self.expect(TokenKind::Colon, "`:`")?;

        self.push_block();
        self.declare_params(param_head);
        let body = self.parse_body(self.cur_indent)?;
        self.pop_block();

        Ok(self.push_node(
            NodeKind::LambdaMulti,
            func_tok,
            NodeData::Func {
                name: None,
                param_head,
                num_params,
                ret,
                body_head: body,
            },
        ))
    }

    /// `type Name enum: ...`, `type Name object: ...`, or the alias form
    /// `type Name <type-spec>`.
    pub(crate) fn parse_type_decl(&mut self, indent: u32) -> PResult<NodeId> {
        let type_tok = self.cur_id();
        self.advance();

        let name = self.parse_ident_node()?;
        match self.peek().kind() {
            TokenKind::Enum => self.parse_enum_decl(type_tok, name, indent),
            TokenKind::Object => self.parse_object_decl(type_tok, name, indent),
            _ => {
                let spec = self.parse_type_spec()?;
                self.expect_line_end()?;
                self.declare_node(name);
                let node = self.push_node(
                    NodeKind::TypeAliasDecl,
                    type_tok,
                    NodeData::Pair {
                        left: name,
                        right: spec,
                    },
                );
                self.record_static(StaticDeclKind::TypeAlias, node);
                Ok(node)
            }
        }
    }

    /// Enum body: one bare identifier member per line.
    fn parse_enum_decl(&mut self, type_tok: TokenId, name: NodeId, indent: u32) -> PResult<NodeId> {
        self.advance(); // enum
        self.expect(TokenKind::Colon, "`:`")?;
        self.expect_line_end()?;

        let member_indent = self.expect_block_indent(indent)?;
        let mut head = None;
        let mut tail = None;
        loop {
            let member_tok = self.cur_id();
            self.expect(TokenKind::Ident, "identifier")?;
            let member = self.push_node(NodeKind::TagMember, member_tok, NodeData::None);
            self.chain(&mut head, &mut tail, member);
            self.expect_line_end()?;

            if !self.continue_block(member_indent)? {
                break;
            }
        }

        self.declare_node(name);
        let node = self.push_node(
            NodeKind::EnumDecl,
            type_tok,
            NodeData::Enum {
                name,
                member_head: head,
            },
        );
        self.record_static(StaticDeclKind::Enum, node);
        Ok(node)
    }

    /// Object body: `name [type]` fields one per line, then zero or more
    /// method `func` declarations.
    fn parse_object_decl(
        &mut self,
        type_tok: TokenId,
        name: NodeId,
        indent: u32,
    ) -> PResult<NodeId> {
        self.advance(); // object
        self.expect(TokenKind::Colon, "`:`")?;
        self.expect_line_end()?;

        // The object name is visible to its own methods.
        self.declare_node(name);

        let body_indent = self.expect_block_indent(indent)?;
        let mut field_head = None;
        let mut field_tail = None;
        let mut func_head = None;
        let mut func_tail = None;
        let mut in_methods = false;
        loop {
            if self.peek().kind() == TokenKind::Func {
                in_methods = true;
                let was_object = self.in_object_decl;
                self.in_object_decl = true;
                let method = self.parse_func_decl(body_indent);
                self.in_object_decl = was_object;
                let method = method?;
                self.chain(&mut func_head, &mut func_tail, method);
            } else {
                if in_methods {
                    let found = self.peek();
                    return Err(ParseError::UnexpectedToken {
                        expected: "`func`",
                        found: found.kind(),
                        pos: found.start(),
                    });
                }
                let field_tok = self.cur_id();
                self.expect(TokenKind::Ident, "identifier")?;
                let type_spec =
                    if !matches!(self.peek().kind(), TokenKind::NewLine | TokenKind::None) {
                        Some(self.parse_type_spec()?)
                    } else {
                        None
                    };
                let field = self.push_node(
                    NodeKind::ObjectField,
                    field_tok,
                    NodeData::OptChild { child: type_spec },
                );
                self.chain(&mut field_head, &mut field_tail, field);
                self.expect_line_end()?;
            }

            if !self.continue_block(body_indent)? {
                break;
            }
        }

        let node = self.push_node(
            NodeKind::ObjectDecl,
            type_tok,
            NodeData::Object {
                name,
                field_head,
                func_head,
            },
        );
        self.record_static(StaticDeclKind::Object, node);
        Ok(node)
    }

    /// `func name(params) [ret]: body` or `func name(params) [ret] = expr`.
    pub(crate) fn parse_func_decl(&mut self, indent: u32) -> PResult<NodeId> {
        let func_tok = self.cur_id();
        self.advance();

        let name = self.parse_ident_node()?;
        // The name joins the enclosing scope before the body parses, so
        // recursive references are not free.
        self.declare_node(name);

        self.expect(TokenKind::LeftParen, "`(`")?;
        let (param_head, num_params) = self.parse_param_list()?;
        self.expect(TokenKind::RightParen, "`)`")?;

        let ret = if !matches!(self.peek().kind(), TokenKind::Colon | TokenKind::Equal) {
            Some(self.parse_type_spec()?)
        } else {
            None
        };

        if self.match_kind(TokenKind::Equal) {
            let init = self.parse_expr()?;
            self.expect_line_end()?;
            let node = self.push_node(
                NodeKind::FuncDeclInit,
                func_tok,
                NodeData::FuncInit { name, ret, init },
            );
            if !self.in_object_decl {
                self.record_static(StaticDeclKind::FuncInit, node);
            }
            return Ok(node);
        }

        self.expect(TokenKind::Colon, "`:`")?;
        self.push_block();
        self.declare_params(param_head);
        let body = self.parse_body(indent)?;
        self.pop_block();

        let node = self.push_node(
            NodeKind::FuncDecl,
            func_tok,
            NodeData::Func {
                name: Some(name),
                param_head,
                num_params,
                ret,
                body_head: body,
            },
        );
        if !self.in_object_decl {
            self.record_static(StaticDeclKind::Func, node);
        }
        Ok(node)
    }

    /// Comma-separated `name [type]` parameters; stops before `)`.
    pub(crate) fn parse_param_list(&mut self) -> PResult<(Option<NodeId>, u16)> {
        let mut head = None;
        let mut tail = None;
        let mut count: u16 = 0;
        if self.peek().kind() != TokenKind::RightParen {
            loop {
                let param_tok = self.cur_id();
                self.expect(TokenKind::Ident, "identifier")?;
                let type_spec = if self.peek().kind() == TokenKind::Ident {
                    Some(self.parse_type_spec()?)
                } else {
                    None
                };
                let param = self.push_node(
                    NodeKind::Param,
                    param_tok,
                    NodeData::OptChild { child: type_spec },
                );
                self.chain(&mut head, &mut tail, param);
                count += 1;
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok((head, count))
    }

    /// A type annotation: an identifier, optionally dotted.
    pub(crate) fn parse_type_spec(&mut self) -> PResult<NodeId> {
        let mut node = self.parse_ident_node()?;
        while self.peek().kind() == TokenKind::Dot {
            self.advance();
            let right = self.parse_ident_node()?;
            let start = self.nodes[node].start_token;
            node = self.push_node(
                NodeKind::AccessExpr,
                start,
                NodeData::Pair { left: node, right },
            );
        }
        Ok(node)
    }

    /// Consumes the first indent of a required block, failing with the
    /// empty-block message when the block is missing.
    fn expect_block_indent(&mut self, parent_indent: u32) -> PResult<u32> {
        match self.consume_indent()? {
            Some((i, pos)) => {
                if i <= parent_indent {
                    return Err(ParseError::Rule {
                        msg: crate::MSG_EMPTY_BLOCK,
                        pos,
                    });
                }
                Ok(i)
            }
            None => Err(ParseError::Rule {
                msg: crate::MSG_EMPTY_BLOCK,
                pos: self.peek().start(),
            }),
        }
    }

    /// After a block line: true to keep consuming lines at `block_indent`,
    /// false when the block ends. Deeper indentation is an error.
    fn continue_block(&mut self, block_indent: u32) -> PResult<bool> {
        let save = self.save();
        match self.consume_indent()? {
            None => Ok(false),
            Some((i, _)) if i == block_indent => Ok(true),
            Some((i, _)) if i < block_indent => {
                self.restore(save);
                Ok(false)
            }
            Some((_, pos)) => Err(ParseError::Rule {
                msg: crate::MSG_UNEXPECTED_INDENT,
                pos,
            }),
        }
    }
}

//! sablec-par - Parser for the sable language.
//!
//! Consumes the token stream produced by `sablec-lex` and builds a flat
//! AST stored in an append-only node arena. Alongside the tree the parser
//! maintains:
//! - a stack of lexical blocks tracking locally declared names,
//! - a dependency map from free names to their first referencing node,
//! - an ordered list of top-level static declarations.
//!
//! The parser is long-lived: its buffers are cleared-but-retained between
//! `parse` calls, and the returned [`ParseResult`] borrows them. Use
//! [`ParseResult::dupe`] to snapshot a result independently of the parser.
//!
//! The implementation is organized into focused components:
//! - `ast` - Node arena definitions
//! - `stmt` - Statement dispatch and control flow
//! - `items` - Declarations: functions, types, variables, imports
//! - `expr` - The three expression layers and lambdas
//! - `result` - Borrowing and owned result views

pub mod ast;
mod expr;
mod items;
mod result;
mod stmt;

#[cfg(test)]
mod edge_cases;

pub use ast::{
    BinaryOp, Node, NodeData, NodeId, NodeKind, StaticDecl, StaticDeclKind, UnaryOp,
};
pub use result::{node_children, OwnedParseResult, ParseResult};

use sablec_lex::{
    tokenize, Payload, Token, TokenId, TokenKind, TokenizeOptions, TAB_INDENT_OFFSET,
};
use sablec_util::{FxHashSet, FxIndexMap, IndexVec};
use thiserror::Error;

/// Fixed grammar messages. Tests assert on these strings verbatim.
const MSG_UNEXPECTED_INDENT: &str = "Unexpected indentation.";
const MSG_MIXED_INDENT: &str = "Can not mix tabs and spaces for indentation.";
const MSG_EMPTY_BLOCK: &str =
    "Block requires at least one statement. Use the `pass` statement as a placeholder.";
const MSG_BAD_ASSIGN_TARGET: &str = "Left-hand side of assignment is not assignable.";
const MSG_BAD_IMPORT_TARGET: &str = "Import specifier must be a string literal.";
const MSG_BAD_AT_STMT: &str = "At-statement requires a call expression.";

/// A parse error with the byte position of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Statement dispatch found no applicable rule.
    #[error("unknown token: {kind}")]
    UnknownToken { kind: TokenKind, pos: u32 },

    /// A token other than the expected one was found.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        pos: u32,
    },

    /// A grammar rule violation with a fixed message.
    #[error("{msg}")]
    Rule { msg: &'static str, pos: u32 },
}

impl ParseError {
    /// Byte position where the error was detected.
    pub fn pos(&self) -> u32 {
        match *self {
            ParseError::UnknownToken { pos, .. } => pos,
            ParseError::UnexpectedToken { pos, .. } => pos,
            ParseError::Rule { pos, .. } => pos,
        }
    }
}

/// Failure form returned by [`Parser::parse_no_err`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{msg}")]
pub struct ParseFailure {
    pub msg: String,
    pub pos: u32,
    /// True when the failure came from the tokenizer.
    pub is_token_error: bool,
}

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Indentation flavor established by the first indented line of a parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndentUnit {
    Unknown,
    Spaces,
    Tabs,
}

/// One lexical block frame: the names declared in its scope.
#[derive(Debug, Default)]
struct Block {
    vars: FxHashSet<String>,
}

/// Rollback point for speculative parses (lambda disambiguation).
#[derive(Clone, Copy)]
pub(crate) struct Snapshot {
    pos: usize,
    nodes: usize,
    deps: usize,
}

/// Recursive descent parser producing a flat AST.
///
/// Reusable across `parse` calls; not safe for concurrent use.
pub struct Parser {
    /// Copy of the source being parsed; tokens and nodes hold offsets
    /// into it.
    src: String,

    /// Token buffer, appended to by the tokenizer.
    tokens: IndexVec<TokenId, Token>,

    /// Node arena.
    nodes: IndexVec<NodeId, Node>,

    /// Current position in the token buffer.
    pos: usize,

    /// Root node of the last successful parse.
    root: Option<NodeId>,

    /// Lexical block stack.
    blocks: Vec<Block>,

    /// Free name -> first referencing node.
    deps: FxIndexMap<String, NodeId>,

    /// Top-level static declarations in source order.
    static_decls: Vec<StaticDecl>,

    /// Module name exposed through the result view.
    name: String,

    err_msg: String,
    err_pos: u32,
    has_error: bool,
    token_error: bool,

    /// Space/tab flavor fixed by the first indented line.
    indent_unit: IndentUnit,

    /// Indent of the statement currently being parsed; expression-level
    /// lambda bodies indent relative to this.
    cur_indent: u32,

    /// Set while parsing an object declaration so method `func`s are not
    /// recorded as static declarations.
    in_object_decl: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            src: String::new(),
            tokens: IndexVec::with_capacity(128),
            nodes: IndexVec::with_capacity(128),
            pos: 0,
            root: None,
            blocks: Vec::with_capacity(8),
            deps: FxIndexMap::default(),
            static_decls: Vec::new(),
            name: String::new(),
            err_msg: String::new(),
            err_pos: 0,
            has_error: false,
            token_error: false,
            indent_unit: IndentUnit::Unknown,
            cur_indent: 0,
            in_object_decl: false,
        }
    }

    /// Parses `source`, returning a view that borrows the parser's
    /// buffers. The first error, lexical or syntactic, stops the parse
    /// and is recorded on the result.
    pub fn parse(&mut self, source: &str) -> ParseResult<'_> {
        self.reset(source);

        if let Err(err) = tokenize(&self.src, &mut self.tokens, TokenizeOptions::default()) {
            self.has_error = true;
            self.token_error = true;
            self.err_pos = err.pos();
            self.err_msg = err.to_string();
            return self.view();
        }

        match self.parse_root() {
            Ok(root) => self.root = Some(root),
            Err(err) => {
                self.has_error = true;
                self.err_pos = err.pos();
                self.err_msg = err.to_string();
            }
        }
        self.view()
    }

    /// Like [`Parser::parse`], but converts a recorded error into `Err`.
    pub fn parse_no_err(&mut self, source: &str) -> Result<ParseResult<'_>, ParseFailure> {
        let result = self.parse(source);
        if result.has_error {
            return Err(ParseFailure {
                msg: result.err_msg.to_string(),
                pos: result.err_pos,
                is_token_error: result.is_token_error,
            });
        }
        Ok(result)
    }

    /// Clears per-parse state while retaining buffer allocations.
    fn reset(&mut self, source: &str) {
        self.src.clear();
        self.src.push_str(source);
        self.tokens.clear();
        self.nodes.clear();
        self.pos = 0;
        self.root = None;
        self.blocks.clear();
        self.deps.clear();
        self.static_decls.clear();
        self.err_msg.clear();
        self.err_pos = 0;
        self.has_error = false;
        self.token_error = false;
        self.indent_unit = IndentUnit::Unknown;
        self.cur_indent = 0;
        self.in_object_decl = false;
    }

    fn view(&self) -> ParseResult<'_> {
        ParseResult {
            has_error: self.has_error,
            is_token_error: self.token_error,
            err_msg: &self.err_msg,
            err_pos: self.err_pos,
            root_id: self.root,
            nodes: &self.nodes,
            tokens: &self.tokens,
            src: &self.src,
            name: &self.name,
            deps: &self.deps,
            static_decls: &self.static_decls,
        }
    }

    // ---- root production ----

    /// Parses the top-level statement list. The first statement must sit
    /// at column zero; so must every following top-level line.
    fn parse_root(&mut self) -> PResult<NodeId> {
        self.blocks.push(Block::default());
        let root = self.push_node(NodeKind::Root, TokenId(0), NodeData::ChildList { head: None });

        let mut head = None;
        let mut tail = None;
        loop {
            match self.consume_indent()? {
                None => break,
                Some((0, _)) => {}
                Some((_, pos)) => {
                    return Err(ParseError::Rule {
                        msg: MSG_UNEXPECTED_INDENT,
                        pos,
                    })
                }
            }
            let stmt = self.parse_statement(0)?;
            self.chain(&mut head, &mut tail, stmt);
        }

        self.nodes[root].data = NodeData::ChildList { head };
        self.blocks.pop();
        Ok(root)
    }

    // ---- token cursor ----

    /// Current token, or the end-of-stream sentinel.
    pub(crate) fn peek(&self) -> Token {
        self.peek_at(0)
    }

    /// Token `n` positions ahead, or the sentinel.
    pub(crate) fn peek_at(&self, n: usize) -> Token {
        match self.tokens.get(TokenId((self.pos + n) as u32)) {
            Some(tok) => *tok,
            None => Token::new(TokenKind::None, self.src.len() as u32, Payload::None),
        }
    }

    /// Id the current token will have; valid even at end of stream.
    pub(crate) fn cur_id(&self) -> TokenId {
        TokenId(self.pos as u32)
    }

    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes and returns the current token, or fails naming what was
    /// expected.
    pub(crate) fn expect(&mut self, kind: TokenKind, expected: &'static str) -> PResult<Token> {
        let tok = self.peek();
        if tok.kind() == kind {
            self.advance();
            Ok(tok)
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                found: tok.kind(),
                pos: tok.start(),
            })
        }
    }

    /// Consumes the statement terminator: a newline, or end of input.
    pub(crate) fn expect_line_end(&mut self) -> PResult<()> {
        match self.peek().kind() {
            TokenKind::NewLine => {
                self.advance();
                Ok(())
            }
            TokenKind::None => Ok(()),
            found => Err(ParseError::UnexpectedToken {
                expected: "new line",
                found,
                pos: self.peek().start(),
            }),
        }
    }

    pub(crate) fn save(&self) -> usize {
        self.pos
    }

    pub(crate) fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Snapshot for speculative parses; rolling back also discards nodes
    /// and dependency entries created since.
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            nodes: self.nodes.len(),
            deps: self.deps.len(),
        }
    }

    pub(crate) fn rollback(&mut self, s: Snapshot) {
        self.pos = s.pos;
        self.nodes.truncate(s.nodes);
        self.deps.truncate(s.deps);
    }

    // ---- node arena ----

    pub(crate) fn push_node(
        &mut self,
        kind: NodeKind,
        start_token: TokenId,
        data: NodeData,
    ) -> NodeId {
        self.nodes.push(Node::new(kind, start_token, data))
    }

    pub(crate) fn node_kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    /// Byte position of a node's first token.
    pub(crate) fn node_pos(&self, id: NodeId) -> u32 {
        match self.tokens.get(self.nodes[id].start_token) {
            Some(tok) => tok.start(),
            None => 0,
        }
    }

    /// Appends `id` to a sibling chain.
    pub(crate) fn chain(
        &mut self,
        head: &mut Option<NodeId>,
        tail: &mut Option<NodeId>,
        id: NodeId,
    ) {
        match tail {
            Some(prev) => self.nodes[*prev].next = Some(id),
            None => *head = Some(id),
        }
        *tail = Some(id);
    }

    // ---- indentation ----

    /// Consumes the indentation measurement at a line start, skipping
    /// blank lines. Returns the encoded indent value and its byte
    /// position, or None at end of input. A line without leading
    /// whitespace measures zero.
    pub(crate) fn consume_indent(&mut self) -> PResult<Option<(u32, u32)>> {
        loop {
            let tok = self.peek();
            match tok.kind() {
                TokenKind::None => return Ok(None),
                TokenKind::NewLine => self.advance(),
                TokenKind::Indent => match self.peek_at(1).kind() {
                    // Whitespace-only lines do not take part in block
                    // measurement.
                    TokenKind::NewLine => {
                        self.advance();
                        self.advance();
                    }
                    TokenKind::None => {
                        self.advance();
                        return Ok(None);
                    }
                    _ => {
                        self.advance();
                        let encoded = tok.indent().unwrap_or(0);
                        let checked = self.check_indent(encoded, tok.start())?;
                        return Ok(Some((checked, tok.start())));
                    }
                },
                _ => return Ok(Some((0, tok.start()))),
            }
        }
    }

    /// Validates an indent against the established space/tab flavor.
    fn check_indent(&mut self, encoded: u32, pos: u32) -> PResult<u32> {
        let unit = if encoded >= TAB_INDENT_OFFSET {
            IndentUnit::Tabs
        } else {
            IndentUnit::Spaces
        };
        match self.indent_unit {
            IndentUnit::Unknown => {
                self.indent_unit = unit;
                Ok(encoded)
            }
            established if established == unit => Ok(encoded),
            _ => Err(ParseError::Rule {
                msg: MSG_MIXED_INDENT,
                pos,
            }),
        }
    }

    /// Parses the body that follows a block-opening `:`: either an inline
    /// statement on the same line, or an indented block.
    pub(crate) fn parse_body(&mut self, parent_indent: u32) -> PResult<Option<NodeId>> {
        match self.peek().kind() {
            TokenKind::NewLine => {
                self.advance();
                self.parse_indented_block(parent_indent)
            }
            TokenKind::None => Err(ParseError::Rule {
                msg: MSG_EMPTY_BLOCK,
                pos: self.peek().start(),
            }),
            _ => {
                let stmt = self.parse_statement(parent_indent)?;
                Ok(Some(stmt))
            }
        }
    }

    /// Parses statements of an indented block. The first line fixes the
    /// block indent; a dedent ends the block with its indent token left
    /// unconsumed for the enclosing scope.
    pub(crate) fn parse_indented_block(&mut self, parent_indent: u32) -> PResult<Option<NodeId>> {
        let block_indent = match self.consume_indent()? {
            Some((indent, pos)) => {
                if indent <= parent_indent {
                    return Err(ParseError::Rule {
                        msg: MSG_EMPTY_BLOCK,
                        pos,
                    });
                }
                indent
            }
            None => {
                return Err(ParseError::Rule {
                    msg: MSG_EMPTY_BLOCK,
                    pos: self.src.len() as u32,
                })
            }
        };

        let mut head = None;
        let mut tail = None;
        loop {
            let stmt = self.parse_statement(block_indent)?;
            self.chain(&mut head, &mut tail, stmt);

            let save = self.save();
            match self.consume_indent()? {
                None => break,
                Some((indent, _)) if indent == block_indent => {}
                Some((indent, _)) if indent < block_indent => {
                    // Dedent: hand the line back to the enclosing scope.
                    self.restore(save);
                    break;
                }
                Some((_, pos)) => {
                    return Err(ParseError::Rule {
                        msg: MSG_UNEXPECTED_INDENT,
                        pos,
                    })
                }
            }
        }
        Ok(head)
    }

    // ---- blocks and dependencies ----

    pub(crate) fn push_block(&mut self) {
        self.blocks.push(Block::default());
    }

    pub(crate) fn pop_block(&mut self) {
        self.blocks.pop();
    }

    /// Declares a name in the innermost block.
    pub(crate) fn declare(&mut self, name: &str) {
        if let Some(block) = self.blocks.last_mut() {
            block.vars.insert(name.to_owned());
        }
    }

    /// Declares the name held by an identifier node.
    pub(crate) fn declare_node(&mut self, ident: NodeId) {
        let (start, end) = self.node_text_range(ident);
        let name = self.src[start..end].to_owned();
        if let Some(block) = self.blocks.last_mut() {
            block.vars.insert(name);
        }
    }

    /// Whether any block frame declares `name`.
    fn block_declares(&self, name: &str) -> bool {
        self.blocks.iter().rev().any(|b| b.vars.contains(name))
    }

    /// Records a leaf identifier reference. Names with no declaring block
    /// enter the dependency map keyed to their first referencing node.
    pub(crate) fn note_reference(&mut self, ident: NodeId) {
        let (start, end) = self.node_text_range(ident);
        let declared = self.block_declares(&self.src[start..end]);
        if declared {
            return;
        }
        if !self.deps.contains_key(&self.src[start..end]) {
            let name = self.src[start..end].to_owned();
            self.deps.insert(name, ident);
        }
    }

    /// Binds a plain-identifier assignment target: the name joins the
    /// innermost block, and a dependency entry is retracted only when it
    /// points at this very node (the left-hand side's own leaf
    /// reference).
    pub(crate) fn bind_assignment(&mut self, ident: NodeId) {
        let (start, end) = self.node_text_range(ident);
        let name = self.src[start..end].to_owned();
        if self.deps.get(&name) == Some(&ident) {
            self.deps.shift_remove(&name);
        }
        if let Some(block) = self.blocks.last_mut() {
            block.vars.insert(name);
        }
    }

    /// Byte range of the lexeme behind an identifier-like node.
    pub(crate) fn node_text_range(&self, id: NodeId) -> (usize, usize) {
        match self.tokens.get(self.nodes[id].start_token) {
            Some(tok) => (tok.start() as usize, tok.end() as usize),
            None => (0, 0),
        }
    }

    /// Records a top-level static declaration.
    pub(crate) fn record_static(&mut self, kind: StaticDeclKind, node: NodeId) {
        self.static_decls.push(StaticDecl { kind, node });
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

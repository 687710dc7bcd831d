//! sablec-par - AST node definitions.
//!
//! The AST is a flat arena: an append-only `IndexVec<NodeId, Node>` where
//! children and siblings are referenced by index. Each node carries the
//! index of its first token, the index of its next sibling, and a tagged
//! data union whose active variant is determined by the node kind. The
//! arena holds no cycles and traversal never chases owned pointers.

use sablec_lex::TokenId;
use sablec_util::Idx;
use static_assertions::const_assert;
use std::fmt;
use std::num::NonZeroU32;

/// Index of a node in the AST arena.
///
/// Internally offset by one so `Option<NodeId>` occupies four bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl Idx for NodeId {
    #[inline]
    fn from_usize(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize);
        match NonZeroU32::new(idx as u32 + 1) {
            Some(raw) => NodeId(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.index())
    }
}

/// The closed set of node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,

    // Statements.
    ExprStmt,
    AssignStmt,
    OpAssignStmt,
    PassStmt,
    BreakStmt,
    ContinueStmt,
    ReturnStmt,
    ReturnExprStmt,

    // Control flow.
    IfStmt,
    ElseClause,
    MatchStmt,
    CaseClause,
    WhileInfStmt,
    WhileCondStmt,
    WhileOptStmt,
    ForRangeStmt,
    ForIterStmt,
    EachClause,
    RangeClause,
    TryStmt,
    LabelDecl,
    AtStmt,
    ImportStmt,

    // Declarations.
    VarDecl,
    CaptureDecl,
    StaticDecl,
    TypeAliasDecl,
    EnumDecl,
    TagMember,
    ObjectDecl,
    ObjectField,
    FuncDecl,
    FuncDeclInit,
    LambdaExpr,
    LambdaMulti,
    Param,

    // Expressions.
    Ident,
    Number,
    NonDecimalInt,
    String,
    TemplateString,
    TrueLit,
    FalseLit,
    NoneLit,
    Symbol,
    ErrorSymbol,
    ListLiteral,
    MapLiteral,
    MapEntry,
    Group,
    BinExpr,
    UnaryExpr,
    AccessExpr,
    IndexExpr,
    SliceExpr,
    CastExpr,
    CallExpr,
    NamedArg,
    ObjectInit,
    IfExpr,
    TryExpr,
    ThrowExpr,
    Coinit,
    Coyield,
    Coresume,
    AtExpr,
}

/// Binary operators, in the shape the precedence table uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitwiseXor,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter. The cast operator sits
    /// between arithmetic and comparisons at level 3.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LeftShift | BinaryOp::RightShift => 9,
            BinaryOp::BitwiseAnd => 8,
            BinaryOp::BitwiseOr => 7,
            BinaryOp::BitwiseXor => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual
            | BinaryOp::Equal
            | BinaryOp::NotEqual => 2,
            BinaryOp::And => 1,
            BinaryOp::Or => 0,
        }
    }
}

/// Precedence of the `as` cast operator.
pub const CAST_PRECEDENCE: u8 = 3;

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Not,
    BitwiseNot,
}

/// Kind-specific node data.
///
/// The active variant is fixed by the node kind; several kinds share a
/// variant shape. All references are arena indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// Literals and leaf statements; text comes from the start token.
    None,
    /// A single child: expr_stmt, return-expr, throw, group, coresume,
    /// coinit, at-stmt, at-expr, error-symbol.
    Child { child: NodeId },
    /// An optional child: coyield, param and object-field type specs.
    OptChild { child: Option<NodeId> },
    /// Head of a sibling chain: root, list/map literals, template-string
    /// parts, label-decl and while-infinite bodies.
    ChildList { head: Option<NodeId> },
    /// Two children: assignments, map entries, named args, access, index,
    /// cast, range clauses, import, type alias.
    Pair { left: NodeId, right: NodeId },
    /// Binary expression or operator assignment.
    Binary {
        left: NodeId,
        op: BinaryOp,
        right: NodeId,
    },
    Unary {
        child: NodeId,
        op: UnaryOp,
    },
    /// Slice postfix with optional bounds.
    Slice {
        parent: NodeId,
        low: Option<NodeId>,
        high: Option<NodeId>,
    },
    Call {
        callee: NodeId,
        arg_head: Option<NodeId>,
        has_named_arg: bool,
    },
    VarDecl {
        name: NodeId,
        type_spec: Option<NodeId>,
        init: NodeId,
    },
    /// `capture` and `static` locals.
    LocalDecl {
        name: NodeId,
        init: Option<NodeId>,
    },
    IfStmt {
        cond: NodeId,
        body_head: Option<NodeId>,
        else_head: Option<NodeId>,
    },
    /// One clause of an else chain; clauses link through `next`.
    ElseClause {
        cond: Option<NodeId>,
        body_head: Option<NodeId>,
    },
    IfExpr {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: Option<NodeId>,
    },
    Match {
        expr: NodeId,
        case_head: Option<NodeId>,
    },
    /// A match arm; `cond_head` of None marks the `else` arm.
    Case {
        cond_head: Option<NodeId>,
        body_head: Option<NodeId>,
    },
    WhileCond {
        cond: NodeId,
        body_head: Option<NodeId>,
    },
    WhileOpt {
        opt: NodeId,
        capture: NodeId,
        body_head: Option<NodeId>,
    },
    ForRange {
        range: NodeId,
        each: Option<NodeId>,
        body_head: Option<NodeId>,
    },
    ForIter {
        iter: NodeId,
        each: Option<NodeId>,
        body_head: Option<NodeId>,
    },
    Each {
        key: Option<NodeId>,
        value: NodeId,
    },
    TryStmt {
        body_head: Option<NodeId>,
        capture: Option<NodeId>,
        catch_head: Option<NodeId>,
    },
    TryExpr {
        expr: NodeId,
        else_expr: Option<NodeId>,
    },
    /// Function declarations and multi-line lambdas.
    Func {
        name: Option<NodeId>,
        param_head: Option<NodeId>,
        num_params: u16,
        ret: Option<NodeId>,
        body_head: Option<NodeId>,
    },
    /// `func name(...) [ret] = expr`.
    FuncInit {
        name: NodeId,
        ret: Option<NodeId>,
        init: NodeId,
    },
    /// Expression lambdas (`x => e`, `(a, b) => e`).
    Lambda {
        param_head: Option<NodeId>,
        num_params: u16,
        body: NodeId,
    },
    Object {
        name: NodeId,
        field_head: Option<NodeId>,
        func_head: Option<NodeId>,
    },
    Enum {
        name: NodeId,
        member_head: Option<NodeId>,
    },
    ObjectInit {
        left: NodeId,
        entry_head: Option<NodeId>,
    },
}

/// A packed AST node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    /// Tag fixing the active `data` variant.
    pub kind: NodeKind,
    /// Index of the first token that produced this node.
    pub start_token: TokenId,
    /// Next sibling in the chain, if any.
    pub next: Option<NodeId>,
    /// Kind-specific data.
    pub data: NodeData,
}

const_assert!(std::mem::size_of::<Node>() <= 40);

impl Node {
    pub fn new(kind: NodeKind, start_token: TokenId, data: NodeData) -> Self {
        Self {
            kind,
            start_token,
            next: None,
            data,
        }
    }
}

/// Kind tag of a static-declaration entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StaticDeclKind {
    Var,
    Func,
    FuncInit,
    Object,
    Enum,
    TypeAlias,
    Import,
}

/// One top-level static declaration, recorded in source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticDecl {
    pub kind: StaticDeclKind,
    pub node: NodeId,
}

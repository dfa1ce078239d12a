// ABOUTME: Expression and statement sum types produced by the parser

use crate::token::Token;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identity of a resolvable expression node.
///
/// The resolver side-table is keyed by expression identity, not by name or
/// position, so every variant the resolver annotates carries an id assigned
/// monotonically at build time.
pub type ExprId = usize;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// A process-unique expression id. Uniqueness across parses matters: the
/// prompt keeps one interpreter (and its resolver table) alive across
/// many parser instances.
pub fn fresh_expr_id() -> ExprId {
    NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Number(f64),
    Integer(i32),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: LiteralValue,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Variable {
        id: ExprId,
        name: Token,
    },
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },
    Unary {
        op: Token,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    This {
        id: ExprId,
        keyword: Token,
    },
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
    Increment {
        id: ExprId,
        name: Token,
        fix: Fixity,
    },
    Decrement {
        id: ExprId,
        name: Token,
        fix: Fixity,
    },
    List {
        bracket: Token,
        items: Vec<Expr>,
    },
    /// Indexed read, or indexed assignment when `value` is present.
    /// Only plain identifiers are subscriptable.
    Subscript {
        id: ExprId,
        name: Token,
        index: Box<Expr>,
        value: Option<Box<Expr>>,
    },
}

/// A function or method declaration, shared between the declaring statement
/// and the callables closing over it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// One `if`/`elif` condition with its body.
#[derive(Debug, Clone)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    /// `print(...)` desugars to a call of the global native; the statement
    /// wrapper only marks where the sugar applied.
    Print {
        expr: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        main: IfBranch,
        elifs: Vec<IfBranch>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Function {
        decl: Rc<FunctionDecl>,
    },
    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Break {
        keyword: Token,
    },
    Continue {
        keyword: Token,
    },
}

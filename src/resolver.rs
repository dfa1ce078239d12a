// ABOUTME: Two-pass static resolver binding variable references to scope depths

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::token::Token;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

/// Tracks whether the code being resolved sits inside a function
/// declaration, and which flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Walks the AST once before evaluation, recording for every resolvable
/// expression how many environment links to skip at lookup time. Names
/// that miss every lexical scope resolve through the global path at
/// runtime, so the global scope is never tracked here.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    reporter: &'a mut Reporter,
    /// Each map is one block scope; the value records whether the name's
    /// initializer has finished resolving.
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    loop_nesting: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter, reporter: &'a mut Reporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_nesting: 0,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Expression { expr } | Stmt::Print { expr } => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::If {
                main,
                elifs,
                else_branch,
            } => {
                self.resolve_expr(&main.condition);
                self.resolve_stmt(&main.body);
                for branch in elifs {
                    self.resolve_expr(&branch.condition);
                    self.resolve_stmt(&branch.body);
                }
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.loop_nesting += 1;
                self.resolve_expr(condition);
                self.resolve_stmt(body);
                self.loop_nesting -= 1;
            }
            Stmt::Function { decl } => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .error_at(keyword, "Resolvetime Error. Cannot return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter.error_at(
                            keyword,
                            "Resolvetime Error. Cannot return a value from an initializer.",
                        );
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Break { keyword } => {
                if self.loop_nesting == 0 {
                    self.reporter
                        .error_at(keyword, "Resolvetime Error. Can't break outside of a loop.");
                }
            }
            Stmt::Continue { keyword } => {
                if self.loop_nesting == 0 {
                    self.reporter.error_at(
                        keyword,
                        "Resolvetime Error. Can't continue outside of a loop.",
                    );
                }
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: Option<&Expr>, methods: &[Rc<FunctionDecl>]) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable {
            name: super_name, ..
        }) = superclass
        {
            if super_name.lexeme == name.lexeme {
                self.reporter.error_at(
                    super_name,
                    "Resolvetime Error. A class cannot inherit from itself.",
                );
            }
        }

        if let Some(superclass) = superclass {
            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert("super".to_string(), true);
            }
        }

        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this".to_string(), true);
        }

        for method in methods {
            let declaration = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, declaration);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Grouping { expr } => self.resolve_expr(expr),
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.reporter.error_at(
                            name,
                            "Resolvetime Error. Can't read local variable in its own initializer.",
                        );
                    }
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter.error_at(
                        keyword,
                        "Resolvetime Error. Cannot use 'this' outside of a class.",
                    );
                    return;
                }
                self.resolve_local(*id, keyword);
            }
            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.reporter.error_at(
                        keyword,
                        "Resolvetime Error. Cannot use 'super' outside of a class.",
                    );
                } else if self.current_class != ClassType::Subclass {
                    self.reporter.error_at(
                        keyword,
                        "Resolvetime Error. Cannot use 'super' in a class with no superclass.",
                    );
                }
                self.resolve_local(*id, keyword);
            }
            Expr::Increment { id, name, .. } | Expr::Decrement { id, name, .. } => {
                self.resolve_local(*id, name);
            }
            Expr::List { items, .. } => {
                for item in items {
                    self.resolve_expr(item);
                }
            }
            Expr::Subscript {
                id,
                name,
                index,
                value,
            } => {
                self.resolve_expr(index);
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
                self.resolve_local(*id, name);
            }
        }
    }

    fn resolve_function(&mut self, function: &Rc<FunctionDecl>, declaration: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, declaration);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Insert the name as declared-but-undefined so a read inside its own
    /// initializer can be caught. The global scope is untracked.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.error_at(
                    name,
                    format!(
                        "Resolvetime Error. Variable with the name '{}' already exists in this scope.",
                        name.lexeme
                    ),
                );
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Walk the scope stack from innermost outwards; on the first hit,
    /// record the hop count. A miss means the name is global.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve_source(source: &str) -> Reporter {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, &mut reporter).parse();
        assert!(!reporter.had_error, "parse failed: {:?}", source);

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
        reporter
    }

    #[test]
    fn test_read_in_own_initializer_is_error() {
        let reporter = resolve_source("{ var x = x; }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_global_self_reference_is_allowed() {
        // The global scope is untracked, so this resolves (and fails only
        // at runtime if `x` is unbound).
        let reporter = resolve_source("var x = 1; var y = y;");
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_local_redeclaration_is_error() {
        let reporter = resolve_source("{ var a = 1; var a = 2; }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        let reporter = resolve_source("var a = 1; var a = 2;");
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_return_outside_function_is_error() {
        let reporter = resolve_source("return 1;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_return_value_in_initializer_is_error() {
        let reporter = resolve_source("class A { init() { return 1; } }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        let reporter = resolve_source("class A { init() { return; } }");
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_this_outside_class_is_error() {
        let reporter = resolve_source("fun f() { return this; }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_super_outside_class_is_error() {
        let reporter = resolve_source("fun f() { super.m(); }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_super_without_superclass_is_error() {
        let reporter = resolve_source("class A { m() { super.m(); } }");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_super_in_subclass_is_allowed() {
        let reporter = resolve_source("class A { m() {} } class B < A { m() { super.m(); } }");
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_class_inheriting_from_itself_is_error() {
        let reporter = resolve_source("class A < A {}");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_break_outside_loop_is_error() {
        let reporter = resolve_source("break;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_continue_outside_loop_is_error() {
        let reporter = resolve_source("continue;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_break_inside_loop_is_allowed() {
        let reporter = resolve_source("while (true) { break; }");
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_break_inside_for_loop_is_allowed() {
        let reporter = resolve_source("for (var i = 0; i < 3; i = i + 1) { continue; }");
        assert!(!reporter.had_error);
    }
}

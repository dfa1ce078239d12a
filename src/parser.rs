// ABOUTME: Recursive-descent parser with panic-mode recovery at statement boundaries

use crate::ast::{Expr, ExprId, Fixity, FunctionDecl, IfBranch, LiteralValue, Stmt};
use crate::config::{MAX_LIST_ITEMS, MAX_PARAMETERS};
use crate::error::{ParseError, Reporter};
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'a mut Reporter,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, reporter: &'a mut Reporter) -> Self {
        Parser {
            tokens,
            current: 0,
            reporter,
        }
    }

    /// Parse the whole token stream, returning whatever statements were
    /// assembled. The driver checks the reporter's compile-error flag
    /// before using the result.
    pub fn parse(mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }
        statements
    }

    // statements...

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.match_kind(TokenKind::Class) {
            return self.class_declaration();
        }
        if self.match_kind(TokenKind::Fun) {
            let decl = self.function("function")?;
            return Ok(Stmt::Function { decl });
        }
        if self.match_kind(TokenKind::Var) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Syntax Error. Expect variable name.")?;
        let initializer = if self.match_kind(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Syntax Error. Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var { name, initializer })
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>, ParseError> {
        let name = self.consume(
            TokenKind::Identifier,
            format!("Syntax Error. Expect {} name.", kind),
        )?;
        self.consume(
            TokenKind::LeftParen,
            format!("Syntax Error. Expect '(' after {} name.", kind),
        )?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_PARAMETERS {
                    let token = self.peek().clone();
                    self.report(
                        &token,
                        "Syntax Error. Cannot have more than 255 parameters.",
                    );
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(
            TokenKind::RightParen,
            "Syntax Error. Expect ')' after parameters.",
        )?;
        self.consume(
            TokenKind::LeftBrace,
            format!("Syntax Error. Expect '{{' before {} body.", kind),
        )?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Syntax Error. Expect class name.")?;

        let superclass = if self.match_kind(TokenKind::Less) {
            let super_name =
                self.consume(TokenKind::Identifier, "Syntax Error. Expect superclass name.")?;
            Some(Expr::Variable {
                id: self.next_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(
            TokenKind::LeftBrace,
            "Syntax Error. Expect '{' before class body.",
        )?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }
        self.consume(
            TokenKind::RightBrace,
            "Syntax Error. Expect '}' after class body.",
        )?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::Print) {
            return self.print_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_reserved("break") || self.match_reserved("continue") {
            return self.control_statement();
        }
        if self.match_reserved("try") || self.match_reserved("throw") {
            let keyword = self.previous().clone();
            return Err(self.error(
                &keyword,
                format!(
                    "Syntax Error. '{}' is reserved but not yet supported.",
                    keyword.lexeme
                ),
            ));
        }
        if self.match_kind(TokenKind::LeftBrace) {
            let statements = self.block()?;
            return Ok(Stmt::Block { statements });
        }
        self.expression_statement()
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            // A parse error inside a block still aborts the whole block;
            // synchronization happens at the declaration that contains it.
            statements.push(self.declaration()?);
        }
        self.consume(
            TokenKind::RightBrace,
            "Syntax Error. Expect '}' after block.",
        )?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(
            TokenKind::Semicolon,
            "Syntax Error. Expect ';' after expression.",
        )?;
        Ok(Stmt::Expression { expr })
    }

    /// `for (init; cond; step) body` desugars to
    /// `{ init; while (cond) { body; step; } }`.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Syntax Error. Expect '(' after 'for'.")?;

        let initializer = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.match_kind(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.assignment()?)
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Syntax Error. Expect ';' after loop condition.",
        )?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.assignment()?)
        } else {
            None
        };
        self.consume(
            TokenKind::RightParen,
            "Syntax Error. Expect ')' after for clauses.",
        )?;

        let mut body = self.statement()?;

        if let Some(step) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expr: step }],
            };
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: LiteralValue::Bool(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block {
                statements: vec![init, body],
            };
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenKind::LeftParen, "Syntax Error. Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(
            TokenKind::RightParen,
            "Syntax Error. Expect ')' after if condition.",
        )?;
        let body = Box::new(self.statement()?);
        let main = IfBranch { condition, body };

        let mut elifs = Vec::new();
        while self.match_reserved("elif") {
            self.consume(
                TokenKind::LeftParen,
                "Syntax Error. Expect '(' after 'elif'.",
            )?;
            let condition = self.assignment()?;
            self.consume(
                TokenKind::RightParen,
                "Syntax Error. Expect ')' after elif condition.",
            )?;
            let body = Box::new(self.statement()?);
            elifs.push(IfBranch { condition, body });
        }

        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            main,
            elifs,
            else_branch,
        })
    }

    /// `print(...)` is sugar for a call of the global `print` native.
    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let identifier = self.previous().clone();
        if !self.match_kind(TokenKind::LeftParen) {
            return Err(self.error(&identifier, "Syntax Error. Expect '(' after 'print'."));
        }
        let callee = Expr::Variable {
            id: self.next_id(),
            name: identifier,
        };
        let expr = self.finish_call(callee)?;
        self.consume(TokenKind::Semicolon, "Syntax Error. Expect ';' after value.")?;
        Ok(Stmt::Print { expr })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(
            TokenKind::Semicolon,
            "Syntax Error. Expect ';' after return value.",
        )?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(
            TokenKind::LeftParen,
            "Syntax Error. Expect '(' after 'while'.",
        )?;
        let condition = self.expression()?;
        self.consume(
            TokenKind::RightParen,
            "Syntax Error. Expect ')' after condition.",
        )?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn control_statement(&mut self) -> Result<Stmt, ParseError> {
        let mut keyword = self.previous().clone();
        if keyword.lexeme == "break" {
            keyword.kind = TokenKind::Break;
            self.consume(TokenKind::Semicolon, "Syntax Error. Expect ';' after 'break'.")?;
            Ok(Stmt::Break { keyword })
        } else {
            keyword.kind = TokenKind::Continue;
            self.consume(
                TokenKind::Semicolon,
                "Syntax Error. Expect ';' after 'continue'.",
            )?;
            Ok(Stmt::Continue { keyword })
        }
    }

    // expressions...

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    /// Assignment parses its target as an ordinary expression, then
    /// rewrites `Variable`, `Get` and `Subscript` shapes into the
    /// corresponding assignment node. Any other target is rejected.
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or_expression()?;

        if self.match_kind(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            match expr {
                Expr::Subscript {
                    id,
                    name,
                    index,
                    value: None,
                } => {
                    return Ok(Expr::Subscript {
                        id,
                        name,
                        index,
                        value: Some(value),
                    });
                }
                Expr::Variable { name, .. } => {
                    return Ok(Expr::Assign {
                        id: self.next_id(),
                        name,
                        value,
                    });
                }
                Expr::Get { object, name } => {
                    return Ok(Expr::Set {
                        object,
                        name,
                        value,
                    });
                }
                _ => {
                    self.report(&equals, "Syntax Error. Invalid assignment target.");
                }
            }
        }

        Ok(expr)
    }

    fn or_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_expression()?;
        while self.match_kind(TokenKind::Or) {
            let op = self.previous().clone();
            let right = self.and_expression()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.match_kind(TokenKind::And) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
        operators: &[TokenKind],
    ) -> Result<Expr, ParseError> {
        let mut expr = operand(self)?;
        while self.match_kinds(operators) {
            let op = self.previous().clone();
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            Self::comparison,
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
        )
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            Self::term,
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
        )
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(Self::factor, &[TokenKind::Minus, TokenKind::Plus])
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            Self::unary,
            &[
                TokenKind::Slash,
                TokenKind::Backslash,
                TokenKind::Star,
                TokenKind::Modulo,
            ],
        )
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { op, right });
        }
        self.prefix()
    }

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        if self.match_kinds(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) {
            let op = self.previous().clone();
            let name = self.consume(
                TokenKind::Identifier,
                "Syntax Error. Operators '++' and '--' must be applied to an lvalue operand.",
            )?;

            if self.check(TokenKind::PlusPlus) || self.check(TokenKind::MinusMinus) {
                let next = self.peek().clone();
                return Err(self.error(
                    &next,
                    "Syntax Error. Operators '++' and '--' cannot be concatenated.",
                ));
            }

            let id = self.next_id();
            return Ok(if op.kind == TokenKind::PlusPlus {
                Expr::Increment {
                    id,
                    name,
                    fix: Fixity::Prefix,
                }
            } else {
                Expr::Decrement {
                    id,
                    name,
                    fix: Fixity::Prefix,
                }
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.call()?;

        if self.match_kinds(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) {
            let op = self.previous().clone();

            // Only named variables are legal targets.
            let name = match expr {
                Expr::Variable { name, .. } => name,
                _ => {
                    return Err(self.error(
                        &op,
                        "Syntax Error. Operators '++' and '--' must be applied to an lvalue operand.",
                    ));
                }
            };

            if self.match_kinds(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) {
                return Err(self.error(
                    &op,
                    "Syntax Error. Operators '++' and '--' cannot be concatenated.",
                ));
            }

            let id = self.next_id();
            return Ok(if op.kind == TokenKind::PlusPlus {
                Expr::Increment {
                    id,
                    name,
                    fix: Fixity::Postfix,
                }
            } else {
                Expr::Decrement {
                    id,
                    name,
                    fix: Fixity::Postfix,
                }
            });
        }

        Ok(expr)
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.subscript()?;
        loop {
            if self.match_kind(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::Dot) {
                let name = self.consume(
                    TokenKind::Identifier,
                    "Syntax Error. Expect property name after '.'.",
                )?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_PARAMETERS {
                    let token = self.peek().clone();
                    self.report(&token, "Syntax Error. Cannot have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(
            TokenKind::RightParen,
            "Syntax Error. Expect ')' after arguments.",
        )?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn subscript(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.match_kind(TokenKind::LeftBracket) {
            expr = self.finish_subscript(expr)?;
        }
        Ok(expr)
    }

    fn finish_subscript(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        let index = Box::new(self.or_expression()?);
        self.consume(
            TokenKind::RightBracket,
            "Syntax Error. Expect ']' after arguments.",
        )?;

        // Only plain identifiers are subscriptable.
        let name = match expr {
            Expr::Variable { name, .. } => name,
            _ => {
                let token = self.peek().clone();
                return Err(self.error(&token, "Syntax Error. Object is not subscriptable."));
            }
        };

        Ok(Expr::Subscript {
            id: self.next_id(),
            name,
            index,
            value: None,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.match_kind(TokenKind::False) {
            return Ok(Expr::Literal {
                value: LiteralValue::Bool(false),
            });
        }
        if self.match_kind(TokenKind::True) {
            return Ok(Expr::Literal {
                value: LiteralValue::Bool(true),
            });
        }
        if self.match_kind(TokenKind::Nil) {
            return Ok(Expr::Literal {
                value: LiteralValue::Nil,
            });
        }

        if self.match_kind(TokenKind::Number) {
            let value = match self.previous().literal {
                Literal::Number(n) => n,
                _ => 0.0,
            };
            return Ok(Expr::Literal {
                value: LiteralValue::Number(value),
            });
        }
        if self.match_kind(TokenKind::Integer) {
            let value = match self.previous().literal {
                Literal::Integer(n) => n,
                _ => 0,
            };
            return Ok(Expr::Literal {
                value: LiteralValue::Integer(value),
            });
        }
        if self.match_kind(TokenKind::String) {
            let value = match &self.previous().literal {
                Literal::Str(s) => s.clone(),
                _ => String::new(),
            };
            return Ok(Expr::Literal {
                value: LiteralValue::Str(value),
            });
        }

        if self.match_kind(TokenKind::Super) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Syntax Error. Expect '.' after 'super'.")?;
            let method = self.consume(
                TokenKind::Identifier,
                "Syntax Error. Expect superclass method name.",
            )?;
            return Ok(Expr::Super {
                id: self.next_id(),
                keyword,
                method,
            });
        }

        if self.match_kind(TokenKind::This) {
            return Ok(Expr::This {
                id: self.next_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.check_reserved("lambda") {
            let keyword = self.peek().clone();
            return Err(self.error(
                &keyword,
                "Syntax Error. 'lambda' is reserved but not yet supported.",
            ));
        }

        if self.match_kind(TokenKind::Identifier) {
            return Ok(Expr::Variable {
                id: self.next_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_kind(TokenKind::LeftParen) {
            let expr = Box::new(self.expression()?);
            self.consume(
                TokenKind::RightParen,
                "Syntax Error. Expect ')' after expression.",
            )?;
            return Ok(Expr::Grouping { expr });
        }

        if self.match_kind(TokenKind::LeftBracket) {
            let bracket = self.previous().clone();
            let items = self.list_items()?;
            self.consume(
                TokenKind::RightBracket,
                "Syntax Error. Expect ']' at the end of a list",
            )?;
            return Ok(Expr::List { bracket, items });
        }

        let token = self.peek().clone();
        Err(self.error(&token, "Syntax Error. Expect expression."))
    }

    fn list_items(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.check(TokenKind::RightBracket) {
            return Ok(items);
        }
        loop {
            if self.check(TokenKind::RightBracket) {
                break;
            }
            items.push(self.or_expression()?);
            if items.len() > MAX_LIST_ITEMS {
                let token = self.peek().clone();
                self.report(
                    &token,
                    "Syntax Error. Cannot have more than 100 items in a list.",
                );
            }
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // helper functions...

    fn next_id(&mut self) -> ExprId {
        crate::ast::fresh_expr_id()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// True when the current token is an identifier spelling one of the
    /// reserved words the scanner does not recognise.
    fn check_reserved(&self, word: &str) -> bool {
        !self.is_at_end()
            && self.peek().kind == TokenKind::Identifier
            && self.peek().lexeme == word
    }

    fn match_reserved(&mut self, word: &str) -> bool {
        if self.check_reserved(word) {
            self.advance();
            return true;
        }
        false
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(
        &mut self,
        kind: TokenKind,
        message: impl Into<String>,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        let token = self.peek().clone();
        Err(self.error(&token, message))
    }

    /// Log a diagnostic without unwinding.
    fn report(&mut self, token: &Token, message: impl Into<String>) {
        self.reporter.error_at(token, message);
    }

    /// Log a diagnostic and build the error that unwinds to the nearest
    /// declaration.
    fn error(&mut self, token: &Token, message: impl Into<String>) -> ParseError {
        let message = message.into();
        self.reporter.error_at(token, message.as_str());
        ParseError {
            line: token.line,
            message,
        }
    }

    /// Discard tokens up to the next statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    if self.check_reserved("break") {
                        return;
                    }
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, &mut reporter).parse();
        (statements, reporter)
    }

    #[test]
    fn test_var_declaration() {
        let (stmts, reporter) = parse("var x = 1;");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Var { name, initializer } => {
                assert_eq!(name.lexeme, "x");
                assert!(initializer.is_some());
            }
            other => panic!("Expected Var, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_rewrites_variable() {
        let (stmts, reporter) = parse("x = 1;");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Expression { expr } => match expr {
                Expr::Assign { name, .. } => assert_eq!(name.lexeme, "x"),
                other => panic!("Expected Assign, got {:?}", other),
            },
            other => panic!("Expected Expression, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_rewrites_property() {
        let (stmts, reporter) = parse("a.b = 1;");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Expression { expr } => assert!(matches!(expr, Expr::Set { .. })),
            other => panic!("Expected Expression, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_rewrites_subscript() {
        let (stmts, reporter) = parse("xs[0] = 1;");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Expression { expr } => match expr {
                Expr::Subscript { value, .. } => assert!(value.is_some()),
                other => panic!("Expected Subscript, got {:?}", other),
            },
            other => panic!("Expected Expression, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, reporter) = parse("1 = 2;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_for_desugars_to_while() {
        let (stmts, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print(i);");
        assert!(!reporter.had_error);
        // Outer block: { init; while }
        match &stmts[0] {
            Stmt::Block { statements } => {
                assert_eq!(statements.len(), 2);
                assert!(matches!(statements[0], Stmt::Var { .. }));
                match &statements[1] {
                    Stmt::While { body, .. } => match body.as_ref() {
                        // Inner block: { body; step }
                        Stmt::Block { statements } => assert_eq!(statements.len(), 2),
                        other => panic!("Expected Block, got {:?}", other),
                    },
                    other => panic!("Expected While, got {:?}", other),
                }
            }
            other => panic!("Expected Block, got {:?}", other),
        }
    }

    #[test]
    fn test_for_missing_condition_becomes_true() {
        let (stmts, reporter) = parse("for (;;) print(1);");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::While { condition, .. } => match condition {
                Expr::Literal {
                    value: LiteralValue::Bool(true),
                } => {}
                other => panic!("Expected true literal, got {:?}", other),
            },
            other => panic!("Expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_if_elif_else_chain() {
        let (stmts, reporter) =
            parse("if (a) print(1); elif (b) print(2); elif (c) print(3); else print(4);");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::If {
                elifs, else_branch, ..
            } => {
                assert_eq!(elifs.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_print_desugars_to_call() {
        let (stmts, reporter) = parse("print(1, 2);");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Print { expr } => match expr {
                Expr::Call { arguments, callee, .. } => {
                    assert_eq!(arguments.len(), 2);
                    match callee.as_ref() {
                        Expr::Variable { name, .. } => assert_eq!(name.lexeme, "print"),
                        other => panic!("Expected Variable callee, got {:?}", other),
                    }
                }
                other => panic!("Expected Call, got {:?}", other),
            },
            other => panic!("Expected Print, got {:?}", other),
        }
    }

    #[test]
    fn test_print_requires_parentheses() {
        let (_, reporter) = parse("print 1;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_break_and_continue_by_text() {
        let (stmts, reporter) = parse("while (true) { break; continue; }");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::While { body, .. } => match body.as_ref() {
                Stmt::Block { statements } => {
                    assert!(matches!(statements[0], Stmt::Break { .. }));
                    assert!(matches!(statements[1], Stmt::Continue { .. }));
                }
                other => panic!("Expected Block, got {:?}", other),
            },
            other => panic!("Expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_superclass_and_methods() {
        let (stmts, reporter) = parse("class B < A { init(x) { this.x = x; } m() { return 1; } }");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(superclass.is_some());
                assert_eq!(methods.len(), 2);
            }
            other => panic!("Expected Class, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_and_postfix_increment() {
        let (stmts, reporter) = parse("++i; i++;");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Expression { expr } => match expr {
                Expr::Increment { fix, .. } => assert_eq!(*fix, Fixity::Prefix),
                other => panic!("Expected Increment, got {:?}", other),
            },
            other => panic!("Expected Expression, got {:?}", other),
        }
        match &stmts[1] {
            Stmt::Expression { expr } => match expr {
                Expr::Increment { fix, .. } => assert_eq!(*fix, Fixity::Postfix),
                other => panic!("Expected Increment, got {:?}", other),
            },
            other => panic!("Expected Expression, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_increment_requires_lvalue() {
        let (_, reporter) = parse("1++;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_subscript_requires_identifier_base() {
        let (_, reporter) = parse("f()[0];");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_list_literal() {
        let (stmts, reporter) = parse("var xs = [1, 2, 3];");
        assert!(!reporter.had_error);
        match &stmts[0] {
            Stmt::Var {
                initializer: Some(Expr::List { items, .. }),
                ..
            } => assert_eq!(items.len(), 3),
            other => panic!("Expected Var with List initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_words_error() {
        let (_, reporter) = parse("try { print(1); }");
        assert!(reporter.had_error);

        let (_, reporter) = parse("var f = lambda;");
        assert!(reporter.had_error);
    }

    #[test]
    fn test_synchronize_recovers_following_statements() {
        // The bad statement is dropped; the next one still parses.
        let (stmts, reporter) = parse("var = 1; var y = 2;");
        assert!(reporter.had_error);
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Var { name, .. } => assert_eq!(name.lexeme, "y"),
            other => panic!("Expected Var, got {:?}", other),
        }
    }

    #[test]
    fn test_resolvable_nodes_get_distinct_ids() {
        let (stmts, _) = parse("a; a;");
        let ids: Vec<ExprId> = stmts
            .iter()
            .map(|s| match s {
                Stmt::Expression {
                    expr: Expr::Variable { id, .. },
                } => *id,
                other => panic!("Expected Variable expression, got {:?}", other),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}

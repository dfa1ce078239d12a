// ABOUTME: Tree-walking evaluator driven by the resolver's scope-depth table

use crate::ast::{Expr, ExprId, Fixity, LiteralValue, Stmt};
use crate::builtins::register_builtins;
use crate::callable::{Callable, ListMethodKind, LoxFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::env::Environment;
use crate::error::{Reporter, RuntimeError};
use crate::token::{Token, TokenKind};
use crate::value::{values_equal, Value};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

/// Outcome of executing a statement. Return, break and continue are
/// control signals, not errors: they unwind through statement evaluation
/// until the matching construct catches them, and must never be
/// observable to user code.
#[derive(Debug)]
pub enum Control {
    Normal,
    Return(Value),
    Break(Token),
    Continue(Token),
}

pub struct Interpreter {
    pub globals: Rc<Environment>,
    environment: Rc<Environment>,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_output(Box::new(io::stdout()))
    }

    /// An interpreter writing program output to the given sink; tests pass
    /// an in-memory buffer.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        register_builtins(&globals);
        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolver hop count for an expression node.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute a program. Runtime errors stop execution and are recorded
    /// in the reporter; control signals reaching this level are defensive
    /// runtime errors.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        for statement in statements {
            match self.execute(statement) {
                Ok(Control::Normal) => {}
                Ok(Control::Return(_)) => {}
                Ok(Control::Break(token)) => {
                    let error =
                        RuntimeError::new(&token, "Runtime Error. Cannot break outside of a loop.");
                    reporter.runtime_error(&error);
                    return;
                }
                Ok(Control::Continue(token)) => {
                    let error = RuntimeError::new(
                        &token,
                        "Runtime Error. Cannot continue outside of a loop.",
                    );
                    reporter.runtime_error(&error);
                    return;
                }
                Err(error) => {
                    reporter.runtime_error(&error);
                    return;
                }
            }
        }
    }

    /// Program output sink, used by the `print` built-in.
    pub(crate) fn write_output(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment pointer on every exit path, normal or not.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<Environment>,
    ) -> Result<Control, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.run_sequence(statements);
        self.environment = previous;
        result
    }

    fn run_sequence(&mut self, statements: &[Stmt]) -> Result<Control, RuntimeError> {
        for statement in statements {
            match self.execute(statement)? {
                Control::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Control::Normal)
    }

    fn execute(&mut self, statement: &Stmt) -> Result<Control, RuntimeError> {
        match statement {
            Stmt::Expression { expr } | Stmt::Print { expr } => {
                self.evaluate(expr)?;
                Ok(Control::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(Control::Normal)
            }
            Stmt::Block { statements } => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, environment)
            }
            Stmt::If {
                main,
                elifs,
                else_branch,
            } => {
                // Chained semantics: the first truthy condition wins.
                if self.evaluate(&main.condition)?.is_truthy() {
                    return self.execute(&main.body);
                }
                for branch in elifs {
                    if self.evaluate(&branch.condition)?.is_truthy() {
                        return self.execute(&branch.body);
                    }
                }
                if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
                Ok(Control::Normal)
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Control::Normal | Control::Continue(_) => {}
                        Control::Break(_) => break,
                        ret @ Control::Return(_) => return Ok(ret),
                    }
                }
                Ok(Control::Normal)
            }
            Stmt::Function { decl } => {
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment.define(
                    decl.name.lexeme.clone(),
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Control::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Control::Return(value))
            }
            Stmt::Break { keyword } => Ok(Control::Break(keyword.clone())),
            Stmt::Continue { keyword } => Ok(Control::Continue(keyword.clone())),
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::ast::FunctionDecl>],
    ) -> Result<Control, RuntimeError> {
        let superclass_value = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Callable(Callable::Class(class)) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable { name, .. } => name,
                            _ => name,
                        };
                        return Err(RuntimeError::new(
                            token,
                            "Runtime Error. Superclass must be a class.",
                        ));
                    }
                }
            }
            None => None,
        };

        // Defined as nil first so methods may reference the class name.
        self.environment.define(name.lexeme.clone(), Value::Nil);

        if let Some(ref class) = superclass_value {
            self.environment = Environment::with_enclosing(Rc::clone(&self.environment));
            self.environment
                .define("super", Value::Callable(Callable::Class(Rc::clone(class))));
        }

        let mut method_map = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Rc::new(LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                is_initializer,
            ));
            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value.clone(),
            method_map,
        ));

        if superclass_value.is_some() {
            if let Some(parent) = self.environment.enclosing() {
                self.environment = parent;
            }
        }

        self.environment
            .assign(name, Value::Callable(Callable::Class(class)))?;
        Ok(Control::Normal)
    }

    // expressions...

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal { value } => Ok(match value {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Integer(n) => Value::Integer(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Grouping { expr } => self.evaluate(expr),
            Expr::Variable { id, name } => self.look_up_variable(*id, name),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }
            Expr::Unary { op, right } => {
                let right = self.evaluate(right)?;
                match op.kind {
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    TokenKind::Minus => match right {
                        Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(
                            op,
                            "Runtime Error. Operand must be a number.",
                        )),
                    },
                    // Unreachable.
                    _ => Ok(Value::Nil),
                }
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary_op(left, op, right)
            }
            Expr::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                if op.kind == TokenKind::Or {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                let callable = match callee {
                    Value::Callable(callable) => callable,
                    _ => {
                        return Err(RuntimeError::new(
                            paren,
                            "Runtime Error. Can only call functions and classes.",
                        ));
                    }
                };

                if let Some(arity) = callable.arity() {
                    if args.len() != arity {
                        return Err(RuntimeError::new(
                            paren,
                            format!(
                                "Runtime Error. Expected {} arguments but got {}.",
                                arity,
                                args.len()
                            ),
                        ));
                    }
                }
                callable.call(self, args, paren)
            }
            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => LoxInstance::get(&instance, name),
                    Value::List(list) => match name.lexeme.as_str() {
                        "len" => Ok(Value::Callable(Callable::ListMethod {
                            list,
                            kind: ListMethodKind::Len,
                        })),
                        "append" => Ok(Value::Callable(Callable::ListMethod {
                            list,
                            kind: ListMethodKind::Append,
                        })),
                        _ => Err(RuntimeError::new(
                            name,
                            format!("Runtime Error. Undefined property '{}'.", name.lexeme),
                        )),
                    },
                    _ => Err(RuntimeError::new(
                        name,
                        "Runtime Error. Only instances have properties.",
                    )),
                }
            }
            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(
                        name,
                        "Runtime Error. Only instances have fields.",
                    )),
                }
            }
            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),
            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
            Expr::Increment { id, name, fix } => self.step_variable(*id, name, *fix, 1),
            Expr::Decrement { id, name, fix } => self.step_variable(*id, name, *fix, -1),
            Expr::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?);
                }
                Ok(Value::list(values))
            }
            Expr::Subscript {
                id,
                name,
                index,
                value,
            } => self.evaluate_subscript(*id, name, index, value.as_deref()),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
    ) -> Result<Value, RuntimeError> {
        let distance = self.locals.get(&id).copied().unwrap_or(0);
        let superclass = match self.environment.get_at(distance, "super") {
            Value::Callable(Callable::Class(class)) => class,
            _ => {
                return Err(RuntimeError::new(
                    keyword,
                    "Runtime Error. Cannot use 'super' outside of a subclass method.",
                ));
            }
        };
        // "this" is always one scope nearer than "super".
        let instance = match self.environment.get_at(distance.saturating_sub(1), "this") {
            Value::Instance(instance) => instance,
            _ => {
                return Err(RuntimeError::new(
                    keyword,
                    "Runtime Error. Cannot use 'super' outside of a subclass method.",
                ));
            }
        };

        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            RuntimeError::new(
                method,
                format!("Runtime Error. Undefined property '{}'.", method.lexeme),
            )
        })?;

        let bound = found.bind(instance);
        Ok(Value::Callable(Callable::Function(Rc::new(bound))))
    }

    /// Shared implementation of `++`/`--`. Postfix yields the old value,
    /// prefix the new; both write the updated value back to the binding.
    fn step_variable(
        &mut self,
        id: ExprId,
        name: &Token,
        fix: Fixity,
        delta: i32,
    ) -> Result<Value, RuntimeError> {
        let old_value = self.look_up_variable(id, name)?;
        let new_value = match old_value {
            Value::Integer(n) => Value::Integer(n.wrapping_add(delta)),
            Value::Number(n) => Value::Number(n + f64::from(delta)),
            _ => {
                let verb = if delta > 0 { "increment" } else { "decrement" };
                return Err(RuntimeError::new(
                    name,
                    format!(
                        "Runtime Error. Cannot {} a non numeric type '{}'.",
                        verb, name.lexeme
                    ),
                ));
            }
        };
        self.assign_variable(id, name, new_value.clone())?;
        Ok(match fix {
            Fixity::Postfix => old_value,
            Fixity::Prefix => new_value,
        })
    }

    fn evaluate_subscript(
        &mut self,
        id: ExprId,
        name: &Token,
        index: &Expr,
        value: Option<&Expr>,
    ) -> Result<Value, RuntimeError> {
        let target = self.look_up_variable(id, name)?;
        let list = match target {
            Value::List(list) => list,
            _ => {
                return Err(RuntimeError::new(
                    name,
                    format!(
                        "Runtime Error. Object '{}' can not be subscripted.",
                        name.lexeme
                    ),
                ));
            }
        };

        let index_value = self.evaluate(index)?;
        let mut position = match index_value {
            Value::Integer(n) => i64::from(n),
            Value::Number(n) if n.fract() == 0.0 => n as i64,
            _ => {
                return Err(RuntimeError::new(
                    name,
                    "Runtime Error. Indices must be integers.",
                ));
            }
        };

        let length = list.borrow().len();
        // Negative indices offset from the end.
        if position < 0 {
            position += length as i64;
        }
        if position < 0 || position as usize >= length {
            return Err(RuntimeError::new(
                name,
                format!(
                    "Runtime Error. Index out of range. Index is {} but object size is {}.",
                    position, length
                ),
            ));
        }

        if let Some(value_expr) = value {
            let value = self.evaluate(value_expr)?;
            list.borrow_mut()[position as usize] = value;
        }
        let result = list.borrow()[position as usize].clone();
        Ok(result)
    }

    fn binary_op(&mut self, left: Value, op: &Token, right: Value) -> Result<Value, RuntimeError> {
        match op.kind {
            TokenKind::Greater => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(l > r))
            }
            TokenKind::GreaterEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(l >= r))
            }
            TokenKind::Less => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(l < r))
            }
            TokenKind::LessEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Value::Bool(l <= r))
            }
            TokenKind::Plus => match (&left, &right) {
                (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l.wrapping_add(*r))),
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{}{}", l, r))),
                _ => Err(RuntimeError::new(
                    op,
                    "Runtime Error. Operands must be two numbers or two strings.",
                )),
            },
            TokenKind::Minus => match (&left, &right) {
                (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l.wrapping_sub(*r))),
                _ => {
                    let (l, r) = number_operands(op, &left, &right)?;
                    Ok(Value::Number(l - r))
                }
            },
            TokenKind::Star => match (&left, &right) {
                (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l.wrapping_mul(*r))),
                _ => {
                    let (l, r) = number_operands(op, &left, &right)?;
                    Ok(Value::Number(l * r))
                }
            },
            TokenKind::Slash => {
                // Division always produces a number.
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Value::Number(l / r))
            }
            TokenKind::Modulo => {
                let (l, r) = integer_operands(op, &left, &right)?;
                if r == 0 {
                    return Err(RuntimeError::new(op, "Runtime Error. Division by zero."));
                }
                Ok(Value::Integer(l.wrapping_rem(r)))
            }
            TokenKind::Backslash => {
                let (l, r) = integer_operands(op, &left, &right)?;
                if r == 0 {
                    return Err(RuntimeError::new(op, "Runtime Error. Division by zero."));
                }
                Ok(Value::Integer(l.wrapping_div(r)))
            }
            TokenKind::BangEqual => Ok(Value::Bool(!values_equal(&left, &right))),
            TokenKind::EqualEqual => Ok(Value::Bool(values_equal(&left, &right))),
            // Unreachable.
            _ => Ok(Value::Nil),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(&distance) = self.locals.get(&id) {
            Ok(self.environment.get_at(distance, &name.lexeme))
        } else {
            self.globals.get(name)
        }
    }

    fn assign_variable(
        &mut self,
        id: ExprId,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        if let Some(&distance) = self.locals.get(&id) {
            self.environment.assign_at(distance, name, value);
            Ok(())
        } else {
            self.globals.assign(name, value)
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Relational and arithmetic contexts accept integers and numbers,
/// computing in double precision.
fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(RuntimeError::new(
            op,
            "Runtime Error. Operands must be a number.",
        )),
    }
}

/// `%` and `\` cast both operands to integer first.
fn integer_operands(op: &Token, left: &Value, right: &Value) -> Result<(i32, i32), RuntimeError> {
    let (l, r) = number_operands(op, left, right)?;
    Ok((l as i32, r as i32))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Integer(n) => Some(f64::from(*n)),
        _ => None,
    }
}

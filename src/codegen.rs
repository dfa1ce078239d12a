// ABOUTME: Textual LLVM IR emission for build mode

use crate::ast::{Expr, LiteralValue, Stmt};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

/// The type a lowered global variable carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalType {
    Int,
    Double,
    Str,
}

/// Lowers the syntax tree to a textual LLVM module named `lox`.
///
/// This is the secondary, partially-realised backend: it covers numeric
/// and string globals, `print` calls, constant integer arithmetic,
/// function shells and class struct types, and silently skips statement
/// kinds outside that subset. The module always declares an external
/// `printf` and defines a `main` returning `i32 0`.
pub struct IrCompiler {
    /// String contents already pooled, mapped to their global index.
    string_pool: HashMap<String, usize>,
    /// Pooled strings in emission order (content with `\n` substituted).
    strings: Vec<String>,
    globals: Vec<String>,
    global_types: HashMap<String, GlobalType>,
    struct_types: Vec<String>,
    functions: Vec<String>,
    body: Vec<String>,
    temp_counter: usize,
}

impl IrCompiler {
    pub fn new() -> Self {
        IrCompiler {
            string_pool: HashMap::new(),
            strings: Vec::new(),
            globals: Vec::new(),
            global_types: HashMap::new(),
            struct_types: Vec::new(),
            functions: Vec::new(),
            body: Vec::new(),
            temp_counter: 0,
        }
    }

    /// Lower the program and render the complete module text.
    pub fn compile(&mut self, statements: &[Stmt]) -> String {
        for statement in statements {
            self.lower_stmt(statement);
        }
        self.render()
    }

    /// Lower the program and write the module to `path`.
    pub fn compile_to(&mut self, statements: &[Stmt], path: impl AsRef<Path>) -> io::Result<()> {
        let module = self.compile(statements);
        fs::write(path, module)
    }

    fn lower_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Var { name, initializer } => self.lower_var(&name.lexeme, initializer.as_ref()),
            Stmt::Print { expr } => self.lower_print(expr),
            Stmt::Expression { expr } => {
                // Evaluated for effect; only integer arithmetic lowers.
                self.emit_int_expr(expr);
            }
            Stmt::Function { decl } => {
                self.functions.push(format!(
                    "define void @{}() {{\nentry:\n  ret void\n}}",
                    decl.name.lexeme
                ));
            }
            Stmt::Class { name, .. } => {
                self.struct_types
                    .push(format!("%class.{} = type opaque", name.lexeme));
            }
            _ => {}
        }
    }

    fn lower_var(&mut self, name: &str, initializer: Option<&Expr>) {
        match initializer {
            Some(Expr::Literal {
                value: LiteralValue::Integer(n),
            }) => {
                self.globals.push(format!("@{} = global i32 {}", name, n));
                self.global_types.insert(name.to_string(), GlobalType::Int);
            }
            Some(Expr::Literal {
                value: LiteralValue::Number(n),
            }) => {
                self.globals
                    .push(format!("@{} = global double {}", name, double_constant(*n)));
                self.global_types
                    .insert(name.to_string(), GlobalType::Double);
            }
            Some(Expr::Literal {
                value: LiteralValue::Str(s),
            }) => {
                let pointer = self.string_pointer(s);
                self.globals.push(format!("@{} = global i8* {}", name, pointer));
                self.global_types.insert(name.to_string(), GlobalType::Str);
            }
            _ => {
                // A global without a constant initializer starts at 0.
                self.globals.push(format!("@{} = global i32 0", name));
                self.global_types.insert(name.to_string(), GlobalType::Int);
            }
        }
    }

    fn lower_print(&mut self, expr: &Expr) {
        let arguments = match expr {
            Expr::Call { arguments, .. } => arguments,
            _ => return,
        };
        for argument in arguments {
            match argument {
                Expr::Literal {
                    value: LiteralValue::Str(s),
                } => {
                    let pointer = self.string_pointer(s);
                    let temp = self.next_temp();
                    self.body.push(format!(
                        "{} = call i32 (i8*, ...) @printf(i8* {})",
                        temp, pointer
                    ));
                }
                _ => {
                    if let Some(value) = self.emit_int_expr(argument) {
                        let format = self.string_pointer("%d\\n");
                        let temp = self.next_temp();
                        self.body.push(format!(
                            "{} = call i32 (i8*, ...) @printf(i8* {}, i32 {})",
                            temp, format, value
                        ));
                    }
                }
            }
        }
    }

    /// Emit instructions computing an integer-valued expression, returning
    /// the SSA name or immediate holding the result. Unsupported shapes
    /// return `None` and emit nothing.
    fn emit_int_expr(&mut self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Literal {
                value: LiteralValue::Integer(n),
            } => Some(n.to_string()),
            Expr::Grouping { expr } => self.emit_int_expr(expr),
            Expr::Variable { name, .. } => {
                if self.global_types.get(&name.lexeme) == Some(&GlobalType::Int) {
                    let temp = self.next_temp();
                    self.body
                        .push(format!("{} = load i32, i32* @{}", temp, name.lexeme));
                    Some(temp)
                } else {
                    None
                }
            }
            Expr::Unary { op, right } if op.lexeme == "-" => {
                let value = self.emit_int_expr(right)?;
                let temp = self.next_temp();
                self.body.push(format!("{} = sub i32 0, {}", temp, value));
                Some(temp)
            }
            Expr::Binary { left, op, right } => {
                let instruction = match op.lexeme.as_str() {
                    "+" => "add",
                    "-" => "sub",
                    "*" => "mul",
                    _ => return None,
                };
                let lhs = self.emit_int_expr(left)?;
                let rhs = self.emit_int_expr(right)?;
                let temp = self.next_temp();
                self.body
                    .push(format!("{} = {} i32 {}, {}", temp, instruction, lhs, rhs));
                Some(temp)
            }
            _ => None,
        }
    }

    /// Pool a string literal, returning a constant-expression pointer to
    /// its first byte. Source-level `\n` escapes become newline bytes.
    fn string_pointer(&mut self, content: &str) -> String {
        let substituted = content.replace("\\n", "\n");
        let index = match self.string_pool.get(&substituted) {
            Some(&index) => index,
            None => {
                let index = self.strings.len();
                self.string_pool.insert(substituted.clone(), index);
                self.strings.push(substituted.clone());
                index
            }
        };
        let length = substituted.len() + 1;
        format!(
            "getelementptr inbounds ([{} x i8], [{} x i8]* @.str.{}, i32 0, i32 0)",
            length, length, index
        )
    }

    fn next_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("%t{}", self.temp_counter)
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "; ModuleID = 'lox'");
        let _ = writeln!(out, "source_filename = \"lox\"");
        let _ = writeln!(out);

        for (index, content) in self.strings.iter().enumerate() {
            let _ = writeln!(
                out,
                "@.str.{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
                index,
                content.len() + 1,
                escape_bytes(content)
            );
        }
        if !self.strings.is_empty() {
            let _ = writeln!(out);
        }

        for global in &self.globals {
            let _ = writeln!(out, "{}", global);
        }
        if !self.globals.is_empty() {
            let _ = writeln!(out);
        }

        for struct_type in &self.struct_types {
            let _ = writeln!(out, "{}", struct_type);
        }
        if !self.struct_types.is_empty() {
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "declare i32 @printf(i8*, ...)");
        let _ = writeln!(out);

        for function in &self.functions {
            let _ = writeln!(out, "{}", function);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "define i32 @main() {{");
        let _ = writeln!(out, "entry:");
        for instruction in &self.body {
            let _ = writeln!(out, "  {}", instruction);
        }
        let _ = writeln!(out, "  ret i32 0");
        let _ = writeln!(out, "}}");
        out
    }
}

impl Default for IrCompiler {
    fn default() -> Self {
        IrCompiler::new()
    }
}

/// Escape a string for LLVM's `c"..."` byte-array syntax.
fn escape_bytes(content: &str) -> String {
    let mut out = String::new();
    for byte in content.bytes() {
        if (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "\\{:02X}", byte);
        }
    }
    out
}

/// LLVM double constants render exactly in hexadecimal form.
fn double_constant(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

// ABOUTME: Syntax highlighter for the REPL with ANSI color support
// Implements rustyline's Highlighter trait to colorize language syntax
// while preserving display width

use rustyline::highlight::{CmdKind, Highlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

/// REPL helper providing syntax-aware color highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
pub struct LoxHelper;

impl LoxHelper {
    pub fn new() -> Self {
        LoxHelper
    }
}

impl Default for LoxHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for LoxHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let keywords = get_keywords();
        let builtins = get_builtins();

        let highlighted = highlight_line(line, &keywords, &builtins);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Tokenize a line and apply syntax highlighting.
fn highlight_line(
    line: &str,
    keywords: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: // to end of line, /* to end of line (the REPL is
            // single-line, so an open block comment colors the rest)
            '/' if i + 1 < chars.len() && (chars[i + 1] == '/' || chars[i + 1] == '*') => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    }
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Numbers, with an optional fractional part
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let number: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&number);
                result.push_str(COLOR_RESET);
            }

            // Identifiers and keywords
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if keywords.contains(word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(word.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            _ => {
                result.push(chars[i]);
                i += 1;
            }
        }
    }

    result
}

/// Keywords and reserved words.
fn get_keywords() -> HashSet<&'static str> {
    [
        "and", "class", "else", "elif", "false", "for", "fun", "if", "nil", "or", "print",
        "return", "super", "this", "true", "var", "while", "break", "continue", "try", "throw",
        "lambda",
    ]
    .iter()
    .copied()
    .collect()
}

/// Built-in functions registered in the global environment.
fn get_builtins() -> HashSet<&'static str> {
    ["clock", "input", "type", "list", "len", "append"]
        .iter()
        .copied()
        .collect()
}

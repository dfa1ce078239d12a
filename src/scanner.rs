// ABOUTME: Scanner turning a source string into a token stream

use crate::error::Reporter;
use crate::token::{Literal, Token, TokenKind};

/// Single forward pass over the source with one- and two-character
/// lookahead. Diagnostics accumulate in the reporter; scanning never halts
/// before end of input.
pub struct Scanner<'a> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    reporter: &'a mut Reporter,
}

/// The minimum keyword set recognised by the scanner. The remaining
/// reserved words (`elif`, `break`, `continue`, `try`, `throw`, `lambda`)
/// are matched by the parser from identifier text.
fn keyword(text: &str) -> Option<TokenKind> {
    match text {
        "and" => Some(TokenKind::And),
        "class" => Some(TokenKind::Class),
        "else" => Some(TokenKind::Else),
        "false" => Some(TokenKind::False),
        "for" => Some(TokenKind::For),
        "fun" => Some(TokenKind::Fun),
        "if" => Some(TokenKind::If),
        "nil" => Some(TokenKind::Nil),
        "or" => Some(TokenKind::Or),
        "print" => Some(TokenKind::Print),
        "return" => Some(TokenKind::Return),
        "super" => Some(TokenKind::Super),
        "this" => Some(TokenKind::This),
        "true" => Some(TokenKind::True),
        "var" => Some(TokenKind::Var),
        "while" => Some(TokenKind::While),
        _ => None,
    }
}

impl<'a> Scanner<'a> {
    pub fn new(source: &str, reporter: &'a mut Reporter) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            reporter,
        }
    }

    /// Scan the whole source, returning the token vector terminated by an
    /// end-of-file marker.
    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            // We are at the beginning of the next lexeme.
            self.start = self.current;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", Literal::None, self.line));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            ';' => self.add_token(TokenKind::Semicolon),
            ':' => self.add_token(TokenKind::Colon),
            '*' => self.add_token(TokenKind::Star),
            '^' => self.add_token(TokenKind::Carat),
            '%' => self.add_token(TokenKind::Modulo),
            '\\' => self.add_token(TokenKind::Backslash),
            '-' => {
                let kind = if self.match_char('-') {
                    TokenKind::MinusMinus
                } else {
                    TokenKind::Minus
                };
                self.add_token(kind);
            }
            '+' => {
                let kind = if self.match_char('+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                };
                self.add_token(kind);
            }
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_char('/') {
                    // A line comment runs to the end of the line.
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_char('*') {
                    self.block_comment();
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\0' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            _ => {
                if c.is_ascii_digit() {
                    self.number();
                } else if is_alpha(c) {
                    self.identifier();
                } else {
                    self.reporter
                        .error(self.line, "", format!("Unexpected character '{}'.", c));
                }
            }
        }
    }

    /// Block comments do not nest but track newlines. Reaching end of input
    /// before `*/` simply stops the scan.
    fn block_comment(&mut self) {
        while !(self.peek() == '*' && self.peek_next() == '/') && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if !self.is_at_end() {
            // Skip the closing */
            self.advance();
            self.advance();
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.reporter.error(self.line, "", "Unterminated string.");
            return;
        }

        // The closing ".
        self.advance();

        // Trim the surrounding quotes.
        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_literal_token(TokenKind::String, Literal::Str(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_integer = true;
        // Look for a fractional part.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_integer = false;
            // Consume the "."
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        if is_integer {
            match text.parse::<i32>() {
                Ok(n) => self.add_literal_token(TokenKind::Integer, Literal::Integer(n)),
                Err(_) => self
                    .reporter
                    .error(self.line, "", "Integer literal out of range."),
            }
        } else {
            match text.parse::<f64>() {
                Ok(n) => self.add_literal_token(TokenKind::Number, Literal::Number(n)),
                Err(_) => self.reporter.error(self.line, "", "Invalid number literal."),
            }
        }
    }

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }

    // helper functions...

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn advance(&mut self) -> char {
        self.current += 1;
        self.source[self.current - 1]
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, Literal::None);
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Literal) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, text, literal, self.line));
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        (tokens, reporter)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation_and_eof() {
        let (tokens, reporter) = scan("( ) { } [ ] , . ;");
        assert!(!reporter.had_error);
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_char_operators_take_precedence() {
        let (tokens, _) = scan("!= == <= >= ++ --");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_and_number_literals() {
        let (tokens, _) = scan("42 3.14");
        match &tokens[0].literal {
            Literal::Integer(n) => assert_eq!(*n, 42),
            other => panic!("Expected Integer(42), got {:?}", other),
        }
        assert_eq!(tokens[0].kind, TokenKind::Integer);

        match &tokens[1].literal {
            Literal::Number(n) => assert_eq!(*n, 3.14),
            other => panic!("Expected Number(3.14), got {:?}", other),
        }
        assert_eq!(tokens[1].kind, TokenKind::Number);
    }

    #[test]
    fn test_integer_followed_by_dot_is_not_fractional() {
        // "1." scans as integer 1 then a Dot token.
        let (tokens, _) = scan("1.");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Integer, TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_literal() {
        let (tokens, reporter) = scan("\"hello world\"");
        assert!(!reporter.had_error);
        match &tokens[0].literal {
            Literal::Str(s) => assert_eq!(s, "hello world"),
            other => panic!("Expected Str, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string_reports_but_scans_on() {
        let (tokens, reporter) = scan("\"abc");
        assert!(reporter.had_error);
        // Only the EOF marker is produced.
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_multiline_string_tracks_lines() {
        let (tokens, _) = scan("\"a\nb\" x");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        let (tokens, _) = scan("var varx while elif");
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::While);
        // elif is left to the parser.
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].lexeme, "elif");
    }

    #[test]
    fn test_line_comment_skipped() {
        let (tokens, _) = scan("a // comment b\nc");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
        assert_eq!(tokens[1].lexeme, "c");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_block_comment_tracks_newlines() {
        let (tokens, reporter) = scan("a /* one\ntwo */ b");
        assert!(!reporter.had_error);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_block_comment_stops_at_eof() {
        let (tokens, reporter) = scan("a /* never closed");
        assert!(!reporter.had_error);
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn test_unexpected_character_continues() {
        let (tokens, reporter) = scan("a ~ b");
        assert!(reporter.had_error);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }
}

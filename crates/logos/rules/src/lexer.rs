//! Lexer: tokenizes constraint rule text.

use crate::error::CompileError;

/// A token produced by the lexer
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Rule,
    Domain,
    Priority,
    Obligation,
    Exclusive,
    Implies,
    Require,
    Survival,
    Ratio,
    Confidence,
    And,
    Or,
    Not,

    // Identifiers and literals
    Identifier,
    StringLiteral,
    NumberLiteral,

    // Structural
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Arrow,
    Star,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Rule => "RULE",
            Self::Domain => "DOMAIN",
            Self::Priority => "PRIORITY",
            Self::Obligation => "OBLIGATION",
            Self::Exclusive => "EXCLUSIVE",
            Self::Implies => "IMPLIES",
            Self::Require => "REQUIRE",
            Self::Survival => "SURVIVAL",
            Self::Ratio => "RATIO",
            Self::Confidence => "CONFIDENCE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Identifier => "identifier",
            Self::StringLiteral => "string literal",
            Self::NumberLiteral => "number",
            Self::OpenBrace => "{",
            Self::CloseBrace => "}",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::Arrow => "->",
            Self::Star => "*",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eof => "end of input",
        };
        f.write_str(s)
    }
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.input.len() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line, self.col));
                break;
            }
            tokens.push(self.next_token()?);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        let ch = self.input[self.pos];
        let line = self.line;
        let col = self.col;

        let single = |kind, text: &str| Token::new(kind, text, line, col);

        match ch {
            '{' => {
                self.advance();
                Ok(single(TokenKind::OpenBrace, "{"))
            }
            '}' => {
                self.advance();
                Ok(single(TokenKind::CloseBrace, "}"))
            }
            '(' => {
                self.advance();
                Ok(single(TokenKind::OpenParen, "("))
            }
            ')' => {
                self.advance();
                Ok(single(TokenKind::CloseParen, ")"))
            }
            '*' => {
                self.advance();
                Ok(single(TokenKind::Star, "*"))
            }
            '=' => {
                self.advance();
                Ok(single(TokenKind::Eq, "="))
            }
            '-' if self.peek_at(1) == Some('>') => {
                self.advance();
                self.advance();
                Ok(single(TokenKind::Arrow, "->"))
            }
            '!' if self.peek_at(1) == Some('=') => {
                self.advance();
                self.advance();
                Ok(single(TokenKind::Ne, "!="))
            }
            '<' | '>' => {
                self.advance();
                let with_eq = self.peek_at(0) == Some('=');
                if with_eq {
                    self.advance();
                }
                Ok(match (ch, with_eq) {
                    ('<', false) => single(TokenKind::Lt, "<"),
                    ('<', true) => single(TokenKind::Le, "<="),
                    ('>', false) => single(TokenKind::Gt, ">"),
                    _ => single(TokenKind::Ge, ">="),
                })
            }
            '"' => self.read_string_literal(),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_identifier_or_keyword()),
            _ => Err(CompileError::Parse {
                line,
                col,
                message: format!("unexpected character '{}'", ch),
            }),
        }
    }

    fn read_string_literal(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // opening quote

        let mut text = String::new();
        while self.pos < self.input.len() && self.input[self.pos] != '"' {
            if self.input[self.pos] == '\\' && self.peek_at(1) == Some('"') {
                self.advance();
                text.push('"');
            } else {
                text.push(self.input[self.pos]);
            }
            self.advance();
        }

        if self.pos >= self.input.len() {
            return Err(CompileError::Parse {
                line,
                col,
                message: "unterminated string literal".into(),
            });
        }

        self.advance(); // closing quote
        Ok(Token::new(TokenKind::StringLiteral, text, line, col))
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();
        let mut seen_dot = false;

        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        Ok(Token::new(TokenKind::NumberLiteral, text, line, col))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();

        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match text.as_str() {
            "RULE" => TokenKind::Rule,
            "DOMAIN" => TokenKind::Domain,
            "PRIORITY" => TokenKind::Priority,
            "OBLIGATION" => TokenKind::Obligation,
            "EXCLUSIVE" => TokenKind::Exclusive,
            "IMPLIES" => TokenKind::Implies,
            "REQUIRE" => TokenKind::Require,
            "SURVIVAL" => TokenKind::Survival,
            "RATIO" => TokenKind::Ratio,
            "CONFIDENCE" => TokenKind::Confidence,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => TokenKind::Identifier,
        };

        Token::new(kind, text, line, col)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_at(0) {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' || (ch == '/' && self.peek_at(1) == Some('/')) {
                while self.peek_at(0).is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }
}

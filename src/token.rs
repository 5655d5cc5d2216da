use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the scanner.
///
/// Variants without data represent punctuation and keywords.
/// `STRING(String)` and `NUMBER(f64)` carry their decoded literal values.
/// `IDENTIFIER` is used for user-defined names. `EOF` marks end of input.
///
/// `class`, `this` and `super` are reserved words (they always lex as
/// keywords) even though the grammar has no productions for them.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,
    /// ')'
    RIGHT_PAREN,
    /// '{'
    LEFT_BRACE,
    /// '}'
    RIGHT_BRACE,
    /// ','
    COMMA,
    /// '.'
    DOT,
    /// '-'
    MINUS,
    /// '+'
    PLUS,
    /// ';'
    SEMICOLON,
    /// '/'
    SLASH,
    /// '*'
    STAR,
    /// '!'
    BANG,
    /// '!='
    BANG_EQUAL,
    /// '='
    EQUAL,
    /// '=='
    EQUAL_EQUAL,
    /// '>'
    GREATER,
    /// '>='
    GREATER_EQUAL,
    /// '<'
    LESS,
    /// '<='
    LESS_EQUAL,

    /// A user-defined identifier.
    IDENTIFIER,

    /// A string literal (contents without the quotes).
    STRING(String),

    /// A numeric literal, decoded as `f64`.
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    /// 'and'
    AND,
    /// 'class'
    CLASS,
    /// 'else'
    ELSE,
    /// 'false'
    FALSE,
    /// 'fun'
    FUN,
    /// 'for'
    FOR,
    /// 'if'
    IF,
    /// 'nil'
    NIL,
    /// 'or'
    OR,
    /// 'print'
    PRINT,
    /// 'return'
    RETURN,
    /// 'super'
    SUPER,
    /// 'this'
    THIS,
    /// 'true'
    TRUE,
    /// 'var'
    VAR,
    /// 'while'
    WHILE,

    /// End-of-file marker.
    EOF,
}

impl PartialEq for TokenType {
    /// Two `TokenType`s are equal if they share the same variant, ignoring
    /// any inner data. The parser matches on kind, never on payload.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl TokenType {
    /// Variant name without payloads, for diagnostics and token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

/// A scanned token: its kind, the exact source substring it was scanned
/// from, and the 1-based line where it starts. Immutable; created only by
/// the scanner, so the `'a` lifetime ties every token back to the source
/// buffer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring of the source that produced this token.
    pub lexeme: &'a str,

    /// 1-based line number in the source.
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        debug!(
            "Creating token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token<'_> {
    /// `VARIANT lexeme literal` — the literal column is the decoded value
    /// for strings and numbers (numbers always with a fractional part, so
    /// `3` renders as `3.0`) and `null` for everything else.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{}", s),

            TokenType::NUMBER(n) => {
                if n.fract() == 0.0 {
                    // 3 → "3.0", via a stack buffer instead of a float format
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}.0", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            _ => write!(f, "null"),
        }
    }
}

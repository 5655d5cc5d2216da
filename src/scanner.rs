//! One-pass, streaming lexer over a raw byte buffer.
//!
//! [`Scanner`] turns a `&[u8]` into a sequence of [`Token`]s, skipping
//! whitespace and `//` comments and emitting exactly one `EOF` token at the
//! end. It implements `Iterator<Item = Result<Token>>` (and
//! `FusedIterator`), so a lexical error is just an `Err` item in the
//! stream: scanning always continues with the next lexeme and the caller
//! decides what to do with the diagnostics. [`scan`] is the convenience
//! entry that drives the iterator to completion and splits tokens from
//! errors.
//!
//! Lexemes are zero-copy slices of the source buffer; only string literals
//! allocate (their decoded contents live in the token). Keywords are
//! resolved through a compile-time perfect-hash table, and comment bodies
//! are skipped in bulk with `memchr`.

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

/// Reserved words, keyed by raw lexeme bytes.
static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Drive a scanner over `src` to completion, partitioning recognized
/// tokens from lexical errors. The token list always ends with `EOF`,
/// whatever errors occurred along the way.
pub fn scan(src: &[u8]) -> (Vec<Token<'_>>, Vec<LoxError>) {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}

/// Single forward-only cursor over the source bytes, with a parallel
/// "start of current lexeme" marker and a line counter. The lifetime `'a`
/// ties every emitted token's `lexeme` slice back to the source buffer.
pub struct Scanner<'a> {
    src: &'a [u8],
    start: usize, // first byte of the current lexeme
    curr: usize,  // one past the last byte examined
    line: usize,  // 1-based, incremented on '\n'
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
        }
    }

    // ───────────────────────── primitive helpers ─────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte without consuming it; `0` past EOF so call sites can
    /// branch on the value without a separate end check.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// One byte beyond [`peek`]. Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Consume the current byte iff it equals `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    /// The lexeme accumulated since `self.start`, as UTF-8 text.
    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        // Lexeme boundaries only ever fall on ASCII bytes the scanner
        // itself recognized, so the slice is valid UTF-8 whenever the
        // source is.
        unsafe { std::str::from_utf8_unchecked(&self.src[self.start..self.curr]) }
    }

    // ───────────────────────────── core lexing ────────────────────────────

    /// Scan a single lexeme starting at `self.curr`. `Ok(Some(kind))`
    /// means a token was recognized; `Ok(None)` means the lexeme carries
    /// no token (whitespace, newline, comment).
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b = self.advance();

        let tt = match b {
            // single-character punctuators
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            // two-character operators, one byte of lookahead
            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            // insignificant whitespace
            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            // '/' is either a line comment or division
            b'/' => {
                if self.match_byte(b'/') {
                    // bulk-skip to the next newline; the '\n' itself is
                    // left for the next round so the line counter ticks
                    match memchr(b'\n', &self.src[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            b'"' => return self.string().map(Some),

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// Double-quoted string literal. Strings may span lines; there is no
    /// escape processing. An unterminated string is an error for this
    /// lexeme only — the cursor has already consumed to EOF, so scanning
    /// resumes (and immediately yields `EOF`) afterwards.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let slice: &[u8] = &self.src[self.start + 1..self.curr - 1];
        let s: &str = unsafe { std::str::from_utf8_unchecked(slice) };

        Ok(TokenType::STRING(s.to_owned()))
    }

    /// Numeric literal: digits, optionally followed by `.` and more
    /// digits. The dot is consumed only when a digit follows it, so
    /// `123.` lexes as NUMBER(123) DOT.
    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // the '.'

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // The lexeme is digits with at most one interior dot, which f64
        // parsing always accepts.
        let n: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0);

        TokenType::NUMBER(n)
    }

    /// Identifier or keyword: `[A-Za-z_][A-Za-z0-9_]*`, resolved against
    /// the perfect-hash keyword table.
    fn identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.src.len() {
            // Emit exactly one EOF, then fuse.
            if self.curr == self.src.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(Some(tt)) => {
                    debug!("Scanned token {:?} on line {}", tt, self.line);

                    return Some(Ok(Token::new(tt, self.lexeme(), self.line)));
                }

                // whitespace / comment: keep going
                Ok(None) => {}
            }
        }

        None
    }
}

impl FusedIterator for Scanner<'_> {}

//! Tokenizer — converts S-expression text into a token stream
//!
//! Only three token kinds exist: `(`, `)` and identifiers. Everything that is
//! not whitespace, a newline, a parenthesis or the start of a `;` comment is
//! part of an identifier, so numbers and `"quoted"` strings come through as
//! identifiers with their raw text intact.
//!
//! Guarantees:
//! - Infallible: every input produces a token stream
//! - Deterministic: same input always produces same token stream
//! - Every token carries its line:column span

/// Token types for S-expression syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenParen,  // (
    CloseParen, // )
    Identifier(String),
}

impl Token {
    /// Source text of the token
    pub fn text(&self) -> &str {
        match self {
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Identifier(text) => text.as_str(),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Source region of a token. Columns are 1-based, `end_column` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token with source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl std::fmt::Display for SpannedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}-{}:{} {}",
            self.span, self.span.end_line, self.span.end_column, self.token
        )
    }
}

/// Tokenizer for S-expression source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input text
    pub fn new(text: &str) -> Self {
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input into a stream of spanned tokens
    pub fn tokenize(&mut self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                break;
            }

            tokens.push(self.next_token());
        }

        tracing::trace!(count = tokens.len(), "tokenized input");
        tokens
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn span_from(&self, line: usize, column: usize, offset: usize) -> Span {
        Span {
            line,
            column,
            end_line: self.line,
            end_column: self.column,
            offset,
        }
    }

    // ── Whitespace & Comments ──────────────────────────────

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            if is_space(ch) || ch == '\n' {
                self.advance();
            } else if ch == ';' {
                // Comment runs up to, not including, the newline
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    // ── Main dispatch ──────────────────────────────────────

    fn next_token(&mut self) -> SpannedToken {
        let (line, column, offset) = (self.line, self.column, self.position);

        let token = match self.peek() {
            Some('(') => {
                self.advance();
                Token::OpenParen
            }
            Some(')') => {
                self.advance();
                Token::CloseParen
            }
            _ => self.read_identifier(),
        };

        SpannedToken {
            token,
            span: self.span_from(line, column, offset),
        }
    }

    // ── Identifiers ────────────────────────────────────────

    fn read_identifier(&mut self) -> Token {
        let start = self.position;

        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            self.advance();
        }

        Token::Identifier(self.input[start..self.position].iter().collect())
    }
}

fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\r'
}

fn is_delimiter(ch: char) -> bool {
    is_space(ch) || ch == '\n' || ch == '(' || ch == ')' || ch == ';'
}

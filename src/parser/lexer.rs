//! Lexer (tokenizer) for Finch source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Tokens borrow their lexeme and file name, so the source buffer must outlive
//! them. Characters the language has no use for become [`TokenKind::Error`]
//! tokens and lexing carries on; the parser reports them when it meets one.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Integer,
    Float,
    HexInteger,
    BinaryInteger,
    OctalInteger,
    Char,
    String,

    Identifier,

    // Keywords
    Func,
    Var,
    Mut,
    If,
    Else,
    Loop,
    While,
    Break,
    Continue,
    Return,
    Type,
    Struct,
    Enum,
    True,
    False,
    Public,
    Private,

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Logical
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    // Bitwise
    Amp,   // &
    Pipe,  // |
    Caret, // ^
    Tilde, // ~
    LtLt,  // <<
    GtGt,  // >>

    // Assignment
    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    LtLtEq,    // <<=
    GtGtEq,    // >>=
    AmpEq,     // &=
    PipeEq,    // |=
    CaretEq,   // ^=

    // Increment/Decrement
    PlusPlus,   // ++
    MinusMinus, // --

    Dot,      // .
    Arrow,    // ->
    FatArrow, // =>
    Question, // ?
    Colon,    // :

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,

    /// Unrecognized character or malformed literal
    Error,
    EndOfFile,
}

impl TokenKind {
    /// Keyword lookup, applied after the longest identifier has been scanned.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "func" => TokenKind::Func,
            "var" => TokenKind::Var,
            "mut" => TokenKind::Mut,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "loop" => TokenKind::Loop,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "type" => TokenKind::Type,
            "struct" => TokenKind::Struct,
            "enum" => TokenKind::Enum,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "public" => TokenKind::Public,
            "private" => TokenKind::Private,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::HexInteger
                | TokenKind::BinaryInteger
                | TokenKind::OctalInteger
                | TokenKind::Char
                | TokenKind::String
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::HexInteger => "hexadecimal literal",
            TokenKind::BinaryInteger => "binary literal",
            TokenKind::OctalInteger => "octal literal",
            TokenKind::Char => "character literal",
            TokenKind::String => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Func => "'func'",
            TokenKind::Var => "'var'",
            TokenKind::Mut => "'mut'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Loop => "'loop'",
            TokenKind::While => "'while'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Return => "'return'",
            TokenKind::Type => "'type'",
            TokenKind::Struct => "'struct'",
            TokenKind::Enum => "'enum'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Public => "'public'",
            TokenKind::Private => "'private'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::LtLt => "'<<'",
            TokenKind::GtGt => "'>>'",
            TokenKind::Eq => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::LtLtEq => "'<<='",
            TokenKind::GtGtEq => "'>>='",
            TokenKind::AmpEq => "'&='",
            TokenKind::PipeEq => "'|='",
            TokenKind::CaretEq => "'^='",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::Dot => "'.'",
            TokenKind::Arrow => "'->'",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Question => "'?'",
            TokenKind::Colon => "':'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Error => "invalid token",
            TokenKind::EndOfFile => "end of file",
        };
        f.write_str(text)
    }
}

/// A lexeme together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Name of the compilation unit the token belongs to
    pub file: &'a str,
    /// The lexeme exactly as written
    pub text: &'a str,
    pub location: SourceLocation,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
            TokenKind::Error => write!(f, "invalid token '{}'", self.text),
            kind if kind.is_literal() => write!(f, "{} {}", kind, self.text),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Lexer error type
///
/// These cover constructs the lexer cannot step over, so tokenization
/// stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { location: SourceLocation },
    #[error("unterminated character literal")]
    UnterminatedChar { location: SourceLocation },
    #[error("empty character literal")]
    EmptyChar { location: SourceLocation },
    #[error("unknown escape sequence '\\{escape}'")]
    UnknownEscape {
        escape: char,
        location: SourceLocation,
    },
    #[error("unterminated block comment")]
    UnterminatedComment { location: SourceLocation },
}

impl LexError {
    pub fn location(&self) -> SourceLocation {
        match self {
            LexError::UnterminatedString { location }
            | LexError::UnterminatedChar { location }
            | LexError::EmptyChar { location }
            | LexError::UnknownEscape { location, .. }
            | LexError::UnterminatedComment { location } => *location,
        }
    }
}

/// Map the character following a backslash to the character it denotes.
pub fn unescape(escaped: char) -> Option<char> {
    match escaped {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}

/// Decode the body of a quoted literal (quotes already stripped).
///
/// Returns `None` on a dangling backslash or an unknown escape; the lexer
/// has rejected both by the time the parser calls this.
pub fn unescape_str(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            out.push(unescape(chars.next()?)?);
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Tokenize `source`, attributing every token to `filename`.
pub fn tokenize<'a>(filename: &'a str, source: &'a str) -> Result<Vec<Token<'a>>, LexError> {
    Lexer::new(filename, source).tokenize()
}

/// Lexer for Finch source code
pub struct Lexer<'a> {
    file: &'a str,
    source: &'a str,
    /// Byte offset of the next unread character
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source string.
    pub fn new(file: &'a str, source: &'a str) -> Self {
        Self {
            file,
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(self.token_from(TokenKind::EndOfFile, self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        trace!(file = self.file, count = tokens.len(), "tokenized");
        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.current_location();
        let Some(ch) = self.advance() else {
            return Ok(self.token_from(TokenKind::EndOfFile, start));
        };

        let kind = match ch {
            '"' => self.string_literal(start)?,
            '\'' => self.char_literal(start)?,
            '0'..='9' => self.number_literal(ch),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start),

            // Operators: the longest candidate wins
            '+' => self.choose(&[("+", TokenKind::PlusPlus), ("=", TokenKind::PlusEq)], TokenKind::Plus),
            '-' => self.choose(
                &[
                    ("-", TokenKind::MinusMinus),
                    ("=", TokenKind::MinusEq),
                    (">", TokenKind::Arrow),
                ],
                TokenKind::Minus,
            ),
            '*' => self.choose(&[("=", TokenKind::StarEq)], TokenKind::Star),
            '/' => self.choose(&[("=", TokenKind::SlashEq)], TokenKind::Slash),
            '%' => self.choose(&[("=", TokenKind::PercentEq)], TokenKind::Percent),
            '=' => self.choose(&[("=", TokenKind::EqEq), (">", TokenKind::FatArrow)], TokenKind::Eq),
            '!' => self.choose(&[("=", TokenKind::NotEq)], TokenKind::Bang),
            '<' => self.choose(
                &[
                    ("<=", TokenKind::LtLtEq),
                    ("<", TokenKind::LtLt),
                    ("=", TokenKind::Le),
                ],
                TokenKind::Lt,
            ),
            '>' => self.choose(
                &[
                    (">=", TokenKind::GtGtEq),
                    (">", TokenKind::GtGt),
                    ("=", TokenKind::Ge),
                ],
                TokenKind::Gt,
            ),
            '&' => self.choose(&[("&", TokenKind::AndAnd), ("=", TokenKind::AmpEq)], TokenKind::Amp),
            '|' => self.choose(&[("|", TokenKind::OrOr), ("=", TokenKind::PipeEq)], TokenKind::Pipe),
            '^' => self.choose(&[("=", TokenKind::CaretEq)], TokenKind::Caret),
            '~' => TokenKind::Tilde,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,

            _ => TokenKind::Error,
        };

        Ok(self.token_from(kind, start))
    }

    /// Consume the first continuation in `candidates` that follows the
    /// current character. Candidates must be listed longest first.
    fn choose(&mut self, candidates: &[(&str, TokenKind)], single: TokenKind) -> TokenKind {
        for (rest, kind) in candidates {
            if self.remaining().starts_with(*rest) {
                for _ in 0..rest.len() {
                    self.advance();
                }
                return *kind;
            }
        }
        single
    }

    /// Parse string literal; the opening quote is already consumed
    fn string_literal(&mut self, start: SourceLocation) -> Result<TokenKind, LexError> {
        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(TokenKind::String);
                }
                '\n' => break,
                '\\' => self.escape_sequence(LexError::UnterminatedString { location: start })?,
                _ => {
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { location: start })
    }

    /// Parse character literal; the opening quote is already consumed
    fn char_literal(&mut self, start: SourceLocation) -> Result<TokenKind, LexError> {
        match self.peek() {
            Some('\'') => return Err(LexError::EmptyChar { location: start }),
            Some('\\') => self.escape_sequence(LexError::UnterminatedChar { location: start })?,
            Some('\n') | None => return Err(LexError::UnterminatedChar { location: start }),
            Some(_) => {
                self.advance();
            }
        }

        // Expect closing quote
        if self.peek() != Some('\'') {
            return Err(LexError::UnterminatedChar { location: start });
        }
        self.advance();
        Ok(TokenKind::Char)
    }

    /// Validate and consume `\x`
    fn escape_sequence(&mut self, at_end: LexError) -> Result<(), LexError> {
        let escape_location = self.current_location();
        self.advance(); // skip '\'
        let escaped = self.advance().ok_or(at_end)?;
        if unescape(escaped).is_none() {
            return Err(LexError::UnknownEscape {
                escape: escaped,
                location: SourceLocation {
                    len: self.position - escape_location.pos,
                    ..escape_location
                },
            });
        }
        Ok(())
    }

    /// Parse numeric literal
    ///
    /// A literal that runs into letters (`12abc`, `0b102`) or a radix prefix
    /// without digits (`0x`) is returned whole as an error token.
    fn number_literal(&mut self, first_digit: char) -> TokenKind {
        if first_digit == '0' {
            let radix = match self.peek() {
                Some('x') | Some('X') => Some((16, TokenKind::HexInteger)),
                Some('b') | Some('B') => Some((2, TokenKind::BinaryInteger)),
                Some('o') | Some('O') => Some((8, TokenKind::OctalInteger)),
                _ => None,
            };
            if let Some((radix, kind)) = radix {
                self.advance();
                let digits_start = self.position;
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let digits = &self.source[digits_start..self.position];
                let valid = digits.chars().any(|c| c != '_')
                    && digits.chars().all(|c| c == '_' || c.is_digit(radix));
                return if valid { kind } else { TokenKind::Error };
            }
        }

        self.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::Integer;

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // skip '.'
            self.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::Float;
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_ahead(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                self.eat_while(|c| c.is_ascii_digit());
                kind = TokenKind::Float;
            }
        }

        if self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return TokenKind::Error;
        }

        kind
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, start: SourceLocation) -> TokenKind {
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let ident = &self.source[start.pos..self.position];
        TokenKind::keyword(ident).unwrap_or(TokenKind::Identifier)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.eat_while(|c| c != '\n');
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.remaining().starts_with("*/") {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError::UnterminatedComment {
            location: SourceLocation { len: 2, ..start },
        })
    }

    fn token_from(&self, kind: TokenKind, start: SourceLocation) -> Token<'a> {
        Token {
            kind,
            file: self.file,
            text: &self.source[start.pos..self.position],
            location: SourceLocation {
                len: self.position - start.pos,
                ..start
            },
        }
    }

    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while self.peek().is_some_and(&mut predicate) {
            self.advance();
        }
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Zero-length location at the next unread character
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.position, 0, self.line, self.column)
    }
}

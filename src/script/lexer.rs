//! Tokenizer for the script subset

use std::iter::Peekable;
use std::str::Chars;

use super::error::{ScriptError, ScriptResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Function,
    Return,
    Const,
    Let,
    Var,
    If,
    Else,
    For,
    While,
    Break,
    Continue,
    True,
    False,
    Null,
    Undefined,
    Typeof,
    New,
    Throw,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "const" => Keyword::Const,
            "let" => Keyword::Let,
            "var" => Keyword::Var,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "for" => Keyword::For,
            "while" => Keyword::While,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            "typeof" => Keyword::Typeof,
            "new" => Keyword::New,
            "throw" => Keyword::Throw,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::Const => "const",
            Keyword::Let => "let",
            Keyword::Var => "var",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::While => "while",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Typeof => "typeof",
            Keyword::New => "new",
            Keyword::Throw => "throw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,
    QuestionDot,
    QuestionQuestion,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    PlusPlus,
    MinusMinus,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Colon => ":",
            Punct::Dot => ".",
            Punct::Question => "?",
            Punct::QuestionDot => "?.",
            Punct::QuestionQuestion => "??",
            Punct::Arrow => "=>",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Bang => "!",
            Punct::Assign => "=",
            Punct::PlusAssign => "+=",
            Punct::MinusAssign => "-=",
            Punct::PlusPlus => "++",
            Punct::MinusMinus => "--",
            Punct::Eq => "==",
            Punct::StrictEq => "===",
            Punct::NotEq => "!=",
            Punct::StrictNotEq => "!==",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Keyword(Keyword),
    Punct(Punct),
    Eof,
}

impl TokenKind {
    /// Rendering used in syntax error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Keyword(k) => format!("keyword '{}'", k.as_str()),
            TokenKind::Punct(p) => format!("token '{}'", p.as_str()),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Split source text into tokens, ending with `Eof`
pub fn tokenize(source: &str) -> ScriptResult<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl Lexer<'_> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> ScriptResult<()> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => {
                            while let Some(c) = self.chars.peek() {
                                if *c == '\n' {
                                    break;
                                }
                                self.bump();
                            }
                        }
                        Some('*') => {
                            let (line, column) = (self.line, self.column);
                            self.bump();
                            self.bump();
                            let mut closed = false;
                            while let Some(c) = self.bump() {
                                if c == '*' && self.eat('/') {
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                return Err(ScriptError::syntax(
                                    line,
                                    column,
                                    "unterminated block comment",
                                ));
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> ScriptResult<Token> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let make = |kind| Token { kind, line, column };

        let Some(c) = self.bump() else {
            return Ok(make(TokenKind::Eof));
        };

        let kind = match c {
            '0'..='9' => TokenKind::Number(self.number(c, line, column)?),
            '.' if self.chars.peek().is_some_and(|d| d.is_ascii_digit()) => {
                TokenKind::Number(self.number(c, line, column)?)
            }
            '"' | '\'' => TokenKind::Str(self.string(c, line, column)?),
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::from(c);
                while let Some(&next) = self.chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '$' {
                        ident.push(next);
                        self.bump();
                    } else {
                        break;
                    }
                }
                match Keyword::from_ident(&ident) {
                    Some(k) => TokenKind::Keyword(k),
                    None => TokenKind::Ident(ident),
                }
            }
            _ => TokenKind::Punct(self.punct(c, line, column)?),
        };
        Ok(make(kind))
    }

    fn number(&mut self, first: char, line: usize, column: usize) -> ScriptResult<f64> {
        if first == '0' && matches!(self.chars.peek(), Some('x') | Some('X')) {
            self.bump();
            let mut digits = String::new();
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return u64::from_str_radix(&digits, 16)
                .map(|n| n as f64)
                .map_err(|_| ScriptError::syntax(line, column, "invalid hex literal"));
        }

        let mut text = String::from(first);
        let mut seen_dot = first == '.';
        let mut seen_exp = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot && !seen_exp {
                seen_dot = true;
                text.push(c);
            } else if (c == 'e' || c == 'E') && !seen_exp {
                seen_exp = true;
                text.push(c);
                self.bump();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        text.push(sign);
                        self.bump();
                    }
                }
                continue;
            } else {
                break;
            }
            self.bump();
        }
        text.parse::<f64>()
            .map_err(|_| ScriptError::syntax(line, column, format!("invalid number '{}'", text)))
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> ScriptResult<String> {
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ScriptError::syntax(line, column, "unterminated string"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(ScriptError::syntax(line, column, "unterminated string")),
                '\\' => {
                    let Some(escaped) = self.bump() else {
                        return Err(ScriptError::syntax(line, column, "unterminated string"));
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'v' => out.push('\u{b}'),
                        'u' => {
                            let mut hex = String::new();
                            for _ in 0..4 {
                                match self.bump() {
                                    Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                                    _ => {
                                        return Err(ScriptError::syntax(
                                            self.line,
                                            self.column,
                                            "invalid unicode escape",
                                        ));
                                    }
                                }
                            }
                            let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
                            out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                        }
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn punct(&mut self, c: char, line: usize, column: usize) -> ScriptResult<Punct> {
        let p = match c {
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ',' => Punct::Comma,
            ';' => Punct::Semicolon,
            ':' => Punct::Colon,
            '.' => Punct::Dot,
            '*' => Punct::Star,
            '/' => Punct::Slash,
            '%' => Punct::Percent,
            '?' => {
                if self.eat('?') {
                    Punct::QuestionQuestion
                } else if self.chars.peek() == Some(&'.') {
                    // `a ? .5 : b` is a ternary, not optional chaining
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        Punct::Question
                    } else {
                        self.bump();
                        Punct::QuestionDot
                    }
                } else {
                    Punct::Question
                }
            }
            '+' => {
                if self.eat('+') {
                    Punct::PlusPlus
                } else if self.eat('=') {
                    Punct::PlusAssign
                } else {
                    Punct::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    Punct::MinusMinus
                } else if self.eat('=') {
                    Punct::MinusAssign
                } else {
                    Punct::Minus
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::StrictEq
                    } else {
                        Punct::Eq
                    }
                } else if self.eat('>') {
                    Punct::Arrow
                } else {
                    Punct::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::StrictNotEq
                    } else {
                        Punct::NotEq
                    }
                } else {
                    Punct::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    Punct::Le
                } else {
                    Punct::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Punct::Ge
                } else {
                    Punct::Gt
                }
            }
            '&' if self.eat('&') => Punct::AndAnd,
            '|' if self.eat('|') => Punct::OrOr,
            other => {
                return Err(ScriptError::syntax(
                    line,
                    column,
                    format!("unexpected character '{}'", other),
                ));
            }
        };
        Ok(p)
    }
}

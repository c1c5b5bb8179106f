use std::fmt::Display;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Illegal(Rc<str>),
    Ident(Rc<str>),
    Bool(bool),
    Int(Rc<str>),
    Float(Rc<str>),
    String(Rc<str>),
    RawString(Rc<str>),
    Comment(Rc<str>),

    // Operators
    Assign,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Ampersand,
    Pipe,

    Comma,
    Colon,
    SemiColon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Illegal(message) => write!(f, "illegal token ({message})"),
            TokenKind::Ident(text)
            | TokenKind::Int(text)
            | TokenKind::Float(text)
            | TokenKind::String(text)
            | TokenKind::RawString(text)
            | TokenKind::Comment(text) => write!(f, "{text}"),
            TokenKind::Bool(value) => write!(f, "{value}"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::GreaterThan => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::LessThan => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Asterisk => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::SemiColon => write!(f, ";"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
        }
    }
}

/// A token together with its byte span and the 1-based line and column of
/// its first character.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.kind)
    }
}

/// How many `${...}` interpolations may nest inside one string literal.
const MAX_INTERPOLATION_DEPTH: usize = 64;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: Cursor,
    start: Cursor,
    // Cursors prior to each `next_char` of the current token, popped by `backup`.
    history: Vec<Cursor>,
    interpolation_depth: usize,
    keep_comments: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let cursor = Cursor {
            offset: 0,
            line: 1,
            column: 1,
        };
        Self {
            input,
            cursor,
            start: cursor,
            history: Vec::new(),
            interpolation_depth: 0,
            keep_comments: false,
        }
    }

    /// Like [`Tokenizer::new`], but `//` comments are yielded as
    /// [`TokenKind::Comment`] tokens instead of being skipped.
    pub fn with_comments(input: &'a str) -> Self {
        Self {
            keep_comments: true,
            ..Self::new(input)
        }
    }

    fn is_letter(ch: char) -> bool {
        ch.is_alphabetic()
    }

    fn is_ident(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(ch, ' ' | '\t' | '\n' | '\r')
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.input[self.cursor.offset..].chars().next()?;
        self.history.push(self.cursor);
        self.cursor.offset += ch.len_utf8();
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }
        Some(ch)
    }

    fn backup(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.cursor = previous;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.cursor.offset..].chars().next()
    }

    fn accept(&mut self, expected: char) -> bool {
        match self.next_char() {
            Some(ch) if ch == expected => true,
            Some(_) => {
                self.backup();
                false
            }
            None => false,
        }
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.next_char() {
            if !predicate(ch) {
                self.backup();
                break;
            }
        }
    }

    fn begin(&mut self) {
        self.start = self.cursor;
        self.history.clear();
    }

    fn current(&self) -> &'a str {
        &self.input[self.start.offset..self.cursor.offset]
    }

    fn emit(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            start: self.start.offset,
            end: self.cursor.offset,
            line: self.start.line,
            column: self.start.column,
        }
    }

    fn illegal(&self, message: impl Into<Rc<str>>) -> Token {
        self.emit(TokenKind::Illegal(message.into()))
    }

    fn read_identifier(&mut self) -> Token {
        self.skip_while(Self::is_ident);

        let ident = self.current();
        match ident {
            "true" => self.emit(TokenKind::Bool(true)),
            "false" => self.emit(TokenKind::Bool(false)),
            _ => self.emit(TokenKind::Ident(ident.into())),
        }
    }

    fn read_digits(&mut self, mut ch: Option<char>, base: u32, digits: &mut Digits) -> Option<char> {
        loop {
            match ch {
                Some(c) if base <= 10 && c.is_ascii_digit() => {
                    digits.seen = true;
                    if digits.invalid.is_none() && (c as u32 - '0' as u32) >= base {
                        digits.invalid = Some(c);
                    }
                }
                Some(c) if base > 10 && c.is_ascii_hexdigit() => digits.seen = true,
                Some('_') => digits.separator = true,
                _ => return ch,
            }
            ch = self.next_char();
        }
    }

    /// Scans a numeric literal. When `dot` is set the leading `.` has already
    /// been consumed.
    fn read_number(&mut self, dot: bool) -> Token {
        let mut ch = self.next_char();
        let mut base = 10;
        let mut prefix = Prefix::None;
        let mut digits = Digits::default();
        let mut float = dot;
        let mut error: Option<String> = None;

        if !dot {
            if ch == Some('0') {
                ch = self.next_char();
                match ch.map(|c| c.to_ascii_lowercase()) {
                    Some('x') => {
                        ch = self.next_char();
                        (base, prefix) = (16, Prefix::Hexadecimal);
                    }
                    Some('o') => {
                        ch = self.next_char();
                        (base, prefix) = (8, Prefix::Octal);
                    }
                    Some('b') => {
                        ch = self.next_char();
                        (base, prefix) = (2, Prefix::Binary);
                    }
                    _ => {
                        (base, prefix) = (8, Prefix::LeadingZero);
                        digits.seen = true;
                    }
                }
            }
            ch = self.read_digits(ch, base, &mut digits);
            if ch == Some('.') {
                float = true;
                ch = self.next_char();
            }
        }

        if float {
            if matches!(prefix, Prefix::Octal | Prefix::Binary) {
                error.get_or_insert(format!("invalid radix point in {}", prefix.literal_name()));
            }
            ch = self.read_digits(ch, base, &mut digits);
        }

        if !digits.seen {
            error.get_or_insert(format!("{} has no digits", prefix.literal_name()));
        }

        match ch.map(|c| c.to_ascii_lowercase()) {
            Some(exponent @ ('e' | 'p')) => {
                float = true;
                if exponent == 'e' && !matches!(prefix, Prefix::None | Prefix::LeadingZero) {
                    error.get_or_insert("'e' exponent requires decimal mantissa".to_owned());
                }
                if exponent == 'p' && prefix != Prefix::Hexadecimal {
                    error.get_or_insert("'p' exponent requires hexadecimal mantissa".to_owned());
                }
                ch = self.next_char();
                if matches!(ch, Some('+' | '-')) {
                    ch = self.next_char();
                }
                let mut exponent_digits = Digits::default();
                ch = self.read_digits(ch, 10, &mut exponent_digits);
                digits.separator |= exponent_digits.separator;
                if !exponent_digits.seen {
                    error.get_or_insert("exponent has no digits".to_owned());
                }
            }
            _ if float && prefix == Prefix::Hexadecimal => {
                error.get_or_insert("hexadecimal mantissa requires a 'p' exponent".to_owned());
            }
            _ if !float => {
                if let Some(invalid) = digits.invalid {
                    error.get_or_insert(format!(
                        "invalid digit '{invalid}' in {}",
                        prefix.literal_name()
                    ));
                }
            }
            _ => {}
        }

        if ch.is_some() {
            self.backup();
        }

        if digits.separator && invalid_separator(self.current()).is_some() {
            error.get_or_insert("'_' must separate successive digits".to_owned());
        }

        match error {
            Some(message) => self.illegal(message),
            None if float => self.emit(TokenKind::Float(self.current().into())),
            None => self.emit(TokenKind::Int(self.current().into())),
        }
    }

    fn read_escape_digits(&mut self, base: u32, count: usize) -> Result<(), &'static str> {
        for _ in 0..count {
            match self.next_char() {
                Some(ch) if ch.is_digit(base) => {}
                Some(_) => {
                    self.backup();
                    return Err("invalid char escape");
                }
                None => return Err("invalid char escape"),
            }
        }
        Ok(())
    }

    fn read_escape(&mut self, quote: char) -> Result<(), &'static str> {
        match self.next_char() {
            Some(ch) if ch == quote => Ok(()),
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '$') => Ok(()),
            Some('0'..='7') => {
                self.backup();
                self.read_escape_digits(8, 3)
            }
            Some('x') => self.read_escape_digits(16, 2),
            Some('u') => self.read_escape_digits(16, 4),
            Some('U') => self.read_escape_digits(16, 8),
            Some(_) => {
                self.backup();
                Err("invalid char escape")
            }
            None => Err("invalid char escape"),
        }
    }

    /// Skips the body of a `${...}` interpolation, up to and including the
    /// closing brace. Nested string literals are skipped as a whole.
    fn skip_interpolation(&mut self, raw: bool) -> Result<(), &'static str> {
        if self.interpolation_depth >= MAX_INTERPOLATION_DEPTH {
            return Err("interpolation nested too deeply");
        }
        self.interpolation_depth += 1;
        let skipped = self.skip_interpolation_body(raw);
        self.interpolation_depth -= 1;
        skipped
    }

    fn skip_interpolation_body(&mut self, raw: bool) -> Result<(), &'static str> {
        let unterminated = if raw {
            "raw string literal not terminated"
        } else {
            "string literal not terminated"
        };
        let mut depth = 1;
        loop {
            match self.next_char() {
                None => return Err(unterminated),
                Some('\n') if !raw => {
                    self.backup();
                    return Err(unterminated);
                }
                Some('{') => depth += 1,
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(quote @ ('"' | '\'')) => self.skip_quoted(quote)?,
                Some('`') => self.skip_raw()?,
                Some(_) => {}
            }
        }
    }

    fn skip_quoted(&mut self, quote: char) -> Result<(), &'static str> {
        let mut escape_error = None;
        loop {
            match self.next_char() {
                None => return Err("string literal not terminated"),
                Some('\n') => {
                    self.backup();
                    return Err("string literal not terminated");
                }
                Some(ch) if ch == quote => break,
                Some('\\') => {
                    if let Err(message) = self.read_escape(quote) {
                        escape_error.get_or_insert(message);
                    }
                }
                Some('$') => {
                    if self.accept('{') {
                        self.skip_interpolation(false)?;
                    }
                }
                Some(_) => {}
            }
        }
        match escape_error {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    fn skip_raw(&mut self) -> Result<(), &'static str> {
        loop {
            match self.next_char() {
                None => return Err("raw string literal not terminated"),
                Some('`') => return Ok(()),
                Some('$') => {
                    if self.accept('{') {
                        self.skip_interpolation(true)?;
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        match self.skip_quoted(quote) {
            Ok(()) => self.emit(TokenKind::String(self.current().into())),
            Err(message) => self.illegal(message),
        }
    }

    fn read_raw_string(&mut self) -> Token {
        match self.skip_raw() {
            Ok(()) => self.emit(TokenKind::RawString(self.current().into())),
            Err(message) => self.illegal(message),
        }
    }

    fn read_slash(&mut self) -> Token {
        if self.accept('/') {
            self.skip_while(|ch| ch != '\n');
            self.emit(TokenKind::Comment(self.current().into()))
        } else {
            self.emit(TokenKind::Slash)
        }
    }

    fn scan(&mut self) -> Option<Token> {
        self.skip_while(Self::is_whitespace);
        self.begin();

        let ch = self.next_char()?;
        let token = match ch {
            '=' => self.emit(TokenKind::Assign),
            '>' => {
                if self.accept('=') {
                    self.emit(TokenKind::GreaterEqual)
                } else {
                    self.emit(TokenKind::GreaterThan)
                }
            }
            '<' => {
                if self.accept('=') {
                    self.emit(TokenKind::LessEqual)
                } else {
                    self.emit(TokenKind::LessThan)
                }
            }
            ',' => self.emit(TokenKind::Comma),
            ':' => self.emit(TokenKind::Colon),
            ';' => self.emit(TokenKind::SemiColon),
            '+' => self.emit(TokenKind::Plus),
            '-' => self.emit(TokenKind::Minus),
            '*' => self.emit(TokenKind::Asterisk),
            '/' => self.read_slash(),
            '&' => self.emit(TokenKind::Ampersand),
            '|' => self.emit(TokenKind::Pipe),
            '(' => self.emit(TokenKind::LParen),
            ')' => self.emit(TokenKind::RParen),
            '{' => self.emit(TokenKind::LBrace),
            '}' => self.emit(TokenKind::RBrace),
            '[' => self.emit(TokenKind::LBracket),
            ']' => self.emit(TokenKind::RBracket),
            '"' | '\'' => self.read_string(ch),
            '`' => self.read_raw_string(),
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number(true),
            c if c.is_ascii_digit() => {
                self.backup();
                self.read_number(false)
            }
            c if Tokenizer::is_letter(c) => self.read_identifier(),
            _ => self.illegal(format!("unexpected character '{ch}'")),
        };
        Some(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let token = self.scan()?;
            if matches!(token.kind, TokenKind::Comment(_)) && !self.keep_comments {
                continue;
            }
            return Some(token);
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Prefix {
    None,
    LeadingZero,
    Hexadecimal,
    Octal,
    Binary,
}

impl Prefix {
    fn literal_name(self) -> &'static str {
        match self {
            Prefix::Hexadecimal => "hexadecimal literal",
            Prefix::Octal | Prefix::LeadingZero => "octal literal",
            Prefix::Binary => "binary literal",
            Prefix::None => "decimal literal",
        }
    }
}

#[derive(Default)]
struct Digits {
    seen: bool,
    separator: bool,
    invalid: Option<char>,
}

/// Returns the index of the first `_` in `literal` that does not sit between
/// two digits (a radix prefix counts as a digit).
fn invalid_separator(literal: &str) -> Option<usize> {
    let bytes = literal.as_bytes();
    let mut index = 0;
    let mut previous_class = b'.';
    let mut prefix = b' ';

    if bytes.len() >= 2 && bytes[0] == b'0' {
        prefix = bytes[1].to_ascii_lowercase();
        if matches!(prefix, b'x' | b'o' | b'b') {
            previous_class = b'0';
            index = 2;
        }
    }

    while index < bytes.len() {
        let before = previous_class;
        previous_class = bytes[index];
        if previous_class == b'_' {
            if before != b'0' {
                return Some(index);
            }
        } else if previous_class.is_ascii_digit()
            || (prefix == b'x' && previous_class.is_ascii_hexdigit())
        {
            previous_class = b'0';
        } else {
            if before == b'_' {
                return Some(index - 1);
            }
            previous_class = b'.';
        }
        index += 1;
    }

    if previous_class == b'_' {
        Some(bytes.len() - 1)
    } else {
        None
    }
}

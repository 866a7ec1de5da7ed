use crate::error::ErrorStore;
use crate::token::{is_keyword, Kind, Token};
use tracing::debug;

const SYMBOLS: [char; 16] = [
    '+', '-', '*', '/', '%', '^', '#', '(', ')', '{', '}', '[', ']', ';', ':', ',',
];

// Longest first.
const LONG_SYMBOLS: [&str; 10] = ["...", "..", ".", "==", "~=", "<=", "=", ">=", "<", ">"];

const ESCAPES: [char; 11] = ['a', 'b', 'f', 'n', 'r', 't', 'v', '\\', '"', '\'', '\n'];

#[derive(Debug, Clone, Copy, Default)]
pub struct LexerOptions {
    /// Treat `--` line comments and `--[[ ]]` long comments as whitespace.
    pub lua_comments: bool,
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    line: usize,
    current: usize,
    // Extra characters to consume (or give back, when negative) after the
    // current token. Sub-scanners adjust it when the token text differs in
    // length from the source it was read from.
    skip: isize,
    options: LexerOptions,
    errors: &'a mut ErrorStore,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, errors: &'a mut ErrorStore) -> Self {
        Self {
            chars: input.chars().collect(),
            line: 1,
            current: 0,
            skip: 0,
            options: LexerOptions::default(),
            errors,
        }
    }

    pub fn with_options(mut self, options: LexerOptions) -> Self {
        self.options = options;
        self
    }

    fn at(&self) -> char {
        if self.current >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.current + offset).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(offset, c)| self.peek(offset) == Some(c))
    }

    fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_eof() {
                break;
            }
            if self.chars[self.current] == '\n' {
                self.line += 1;
            }
            self.current += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.report(Some(self.line), message);
    }

    /// Splits the whole input into tokens. Malformed input is reported to the
    /// error store and still produces a token; invalid characters are reported
    /// and dropped.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_eof() {
            let ch = self.at();

            if ch.is_whitespace() {
                self.advance(1);
                continue;
            }

            if self.options.lua_comments && self.starts_with("--") {
                self.skip_comment();
                continue;
            }

            let line = self.line;
            let position = self.current;

            let (value, kind) = if ch.is_ascii_alphabetic() || ch == '_' {
                self.name()
            } else if ch.is_ascii_digit() {
                self.number()
            } else if ch == '"' || ch == '\'' || self.starts_with("[=") || self.starts_with("[[") {
                self.string()
            } else {
                self.symbol()
            };

            let width = self.consumed(&value);
            self.advance(width);

            if kind != Kind::Invalid {
                tokens.push(Token {
                    line,
                    position,
                    width,
                    kind,
                    value,
                });
            }
        }

        debug!(tokens = tokens.len(), lines = self.line, "lexed source");
        tokens
    }

    // Source characters covered by a token with this text, never less than one
    // so the outer loop always moves forward.
    fn consumed(&mut self, value: &str) -> usize {
        let width = value.chars().count() as isize + self.skip;
        self.skip = 0;

        let remaining = self.chars.len() - self.current;
        (width.max(1) as usize).min(remaining)
    }

    fn name(&mut self) -> (String, Kind) {
        let ident: String = self.chars[self.current..]
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
            .collect();

        if is_keyword(&ident) {
            (ident, Kind::Keyword)
        } else {
            (ident, Kind::Name)
        }
    }

    fn number(&mut self) -> (String, Kind) {
        if self.starts_with("0x") {
            let digits: String = self.chars[self.current + 2..]
                .iter()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect();
            return (format!("0x{}", digits), Kind::Number);
        }

        let mut number = String::new();
        let mut decimal = false;
        let mut exponent = false;
        let mut after_exponent = false;

        for i in self.current..self.chars.len() {
            let c = self.chars[i];

            // A sign is only part of the number straight after the exponent marker.
            if !after_exponent && (c == '+' || c == '-') {
                break;
            }
            after_exponent = false;

            match c {
                '.' if decimal => {
                    self.error("Decimal point occurs multiple times");
                    self.skip += 1;
                    continue;
                }
                '.' => decimal = true,
                'e' | 'E' if exponent => {
                    self.error("Multiple exponents in number");
                    self.skip += 1;
                    continue;
                }
                'e' | 'E' => {
                    exponent = true;
                    after_exponent = true;
                }
                c if c.is_ascii_digit() || c == '+' || c == '-' => {}
                _ => break,
            }

            number.push(c);
        }

        (number, Kind::Number)
    }

    fn string(&mut self) -> (String, Kind) {
        if self.at() == '[' {
            self.long_string()
        } else {
            self.quoted_string()
        }
    }

    fn quoted_string(&mut self) -> (String, Kind) {
        let quote = self.at();
        let mut value = String::from(quote);
        let mut escaped = false;
        // Byte length of `value` when the first whitespace was reached.
        let mut cut: Option<usize> = None;

        for i in self.current + 1..self.chars.len() {
            let c = self.chars[i];

            if escaped {
                if !ESCAPES.contains(&c) && !c.is_ascii_digit() {
                    self.error("Illegal escape in string");
                }
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                value.push(c);
                return (value, Kind::String);
            }

            if cut.is_none() && c.is_whitespace() {
                cut = Some(value.len());
            }
            value.push(c);
        }

        // Unterminated: keep the first whitespace-delimited chunk and close it.
        self.error("String not closed");
        if let Some(cut) = cut {
            value.truncate(cut);
        }
        value.push(quote);
        self.skip -= 1;

        (value, Kind::String)
    }

    fn long_string(&mut self) -> (String, Kind) {
        let start = self.current + 1;

        let (level, body_start) = match self.chars[start..].iter().position(|c| *c == '[') {
            Some(offset) => {
                if self.chars[start..start + offset].iter().any(|c| *c != '=') {
                    self.error("Symbols other than '=' between initial '['");
                }
                (offset, start + offset + 1)
            }
            None => {
                self.error("String does not have a second '[' symbol");
                self.skip -= 1;
                let level = self.chars[start..]
                    .iter()
                    .take_while(|c| **c == '=')
                    .count();
                (level, start + level)
            }
        };

        let equals = "=".repeat(level);
        let opener = format!("[{}[", equals);
        let closer = format!("]{}]", equals);
        let closer_chars: Vec<char> = closer.chars().collect();

        let end = self.chars[body_start..]
            .windows(closer_chars.len())
            .position(|window| window == closer_chars.as_slice());

        let mut value = opener.clone();
        match end {
            Some(end) => value.extend(&self.chars[body_start..body_start + end]),
            None => {
                value.extend(
                    self.chars[body_start..]
                        .iter()
                        .take_while(|c| !c.is_whitespace()),
                );
                self.error("String not closed");
                self.skip -= closer_chars.len() as isize;
            }
        }
        value.push_str(&closer);

        if value.matches(opener.as_str()).count() > 1 {
            self.error("Long brackets are nested");
        }

        (value, Kind::String)
    }

    fn symbol(&mut self) -> (String, Kind) {
        let ch = self.at();

        if SYMBOLS.contains(&ch) {
            return (ch.to_string(), Kind::Symbol);
        }

        if let Some(symbol) = LONG_SYMBOLS.iter().find(|symbol| self.starts_with(symbol)) {
            return (symbol.to_string(), Kind::Symbol);
        }

        self.error(format!("'{}' does not start a valid token", ch));
        (ch.to_string(), Kind::Invalid)
    }

    fn skip_comment(&mut self) {
        self.advance(2); // --

        if self.at() == '[' {
            let level = self.chars[self.current + 1..]
                .iter()
                .take_while(|c| **c == '=')
                .count();

            if self.peek(level + 1) == Some('[') {
                let closer: Vec<char> = format!("]{}]", "=".repeat(level)).chars().collect();
                let body_start = self.current + level + 2;
                let end = self.chars[body_start..]
                    .windows(closer.len())
                    .position(|window| window == closer.as_slice());

                match end {
                    Some(end) => self.advance(level + 2 + end + closer.len()),
                    None => {
                        self.error("Comment not closed");
                        let remaining = self.chars.len() - self.current;
                        self.advance(remaining);
                    }
                }
                return;
            }
        }

        while !self.is_eof() && self.at() != '\n' {
            self.advance(1);
        }
    }
}

use crate::token::{Kind, Token};

/// Cursor over a lexed token buffer. Running past the last token yields the
/// end-of-input sentinel: no text, no kind, no line.
pub struct TokenStream {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn at(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    pub fn text(&self) -> Option<&str> {
        self.at().map(|token| token.value.as_str())
    }

    pub fn kind(&self) -> Option<Kind> {
        self.at().map(|token| token.kind)
    }

    pub fn line(&self) -> Option<usize> {
        self.at().map(|token| token.line)
    }

    pub fn is_empty(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// Current token text, or `EOF` at end of input. Used in messages.
    pub fn describe(&self) -> String {
        self.text().unwrap_or("EOF").to_string()
    }

    /// The token after the current one. Does not move the cursor.
    pub fn lookahead(&self) -> Option<&Token> {
        self.peek(1)
    }

    pub fn peek(&self, distance: usize) -> Option<&Token> {
        self.tokens.get(self.current + distance)
    }

    pub fn advance(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text() == Some(text)
    }

    pub fn is_any(&self, set: &[&str]) -> bool {
        self.text().map_or(false, |text| set.contains(&text))
    }

    pub fn matches(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.advance();
            return true;
        }
        false
    }

    pub fn matches_kind(&mut self, kind: Kind) -> bool {
        if self.kind() == Some(kind) {
            self.advance();
            return true;
        }
        false
    }

    pub fn matches_any(&mut self, set: &[&str]) -> bool {
        if self.is_any(set) {
            self.advance();
            return true;
        }
        false
    }

    /// Rewrites the current token in place, keeping its line. Used to pretend a
    /// misspelt keyword was read correctly. No effect at end of input.
    pub fn force_set(&mut self, text: &str, kind: Kind) {
        if let Some(token) = self.tokens.get_mut(self.current) {
            token.value = text.to_string();
            token.kind = kind;
        }
    }
}

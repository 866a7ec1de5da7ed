use serde::Serialize;
use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub(crate) line: usize,
    pub(crate) position: usize, // char offset of the first source character
    pub(crate) width: usize,    // source characters consumed
    pub(crate) kind: Kind,
    pub(crate) value: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Name,      // foo, _bar1
    String,    // "..", '..', [[..]], [==[..]==]
    Number,    // 3, 3.14, 1e-5, 0xff
    Keyword,   // and, break, do, ...
    Symbol,    // + - ... == ~= ( ) ...
    Invalid,   // reported by the lexer, never yielded
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Kind::Name => "name",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Keyword => "keyword",
            Kind::Symbol => "symbol",
            Kind::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

pub const KEYWORDS: [&str; 21] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

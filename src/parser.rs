use crate::error::ErrorStore;
use crate::functions::FunctionTable;
use crate::similarity::{self, DEFAULT_THRESHOLD};
use crate::stream::TokenStream;
use crate::token::{Kind, Token};
use tracing::{debug, trace};

const STATEMENT_KEYWORDS: [&str; 7] = ["do", "while", "repeat", "if", "for", "function", "local"];
const IF_CLOSERS: [&str; 3] = ["elseif", "else", "end"];
const UNARY_OPERATORS: [&str; 3] = ["-", "not", "#"];
const BINARY_OPERATORS: [&str; 15] = [
    "+", "-", "*", "/", "^", "%", "..", "<", "<=", ">", ">=", "==", "~=", "and", "or",
];
const LITERALS: [&str; 4] = ["nil", "false", "true", "..."];
const INDEX_START: [&str; 2] = ["[", "."];
const CALL_START: [&str; 3] = ["(", "{", ":"];

const SUFFIX_EXPECTED: &str = "'[', '.', '(', '{', ':' or a string expected";

// Nested blocks and expressions allowed before giving up, as in the Lua parser.
const MAX_DEPTH: usize = 200;

/// Exits from deep inside the grammar back to the production that handles them.
#[derive(Debug, Clone, PartialEq)]
enum Signal {
    /// `...` inside a name list, with the names read before it.
    Ellipsis(Vec<String>),
    /// A statement started with a misspelt block terminator. Carries the
    /// terminator the enclosing chunk should close on.
    ScopeTypo(String),
    /// Input ended inside an open block. Already reported.
    EndOfInput,
    /// Nesting went past `MAX_DEPTH`. Already reported.
    TooDeep,
}

type Parse<T> = Result<T, Signal>;

pub struct Parser<'e> {
    tokens: TokenStream,
    errors: &'e mut ErrorStore,
    functions: FunctionTable,
    unnamed_functions: usize,
    threshold: f64,
    depth: usize,
}

impl<'e> Parser<'e> {
    pub(crate) fn new(tokens: Vec<Token>, errors: &'e mut ErrorStore) -> Self {
        Self {
            tokens: TokenStream::new(tokens),
            errors,
            functions: FunctionTable::new(),
            unnamed_functions: 0,
            threshold: DEFAULT_THRESHOLD,
            depth: 0,
        }
    }

    pub(crate) fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Validates the whole token stream and returns the declared functions.
    /// Problems end up in the error store; parsing never stops early except at
    /// end of input inside an open block.
    pub(crate) fn parse(mut self) -> FunctionTable {
        match self.chunk(&[]) {
            Ok(_) | Err(Signal::EndOfInput | Signal::ScopeTypo(_) | Signal::TooDeep) => {}
            Err(Signal::Ellipsis(_)) => self.unexpected("'...' encountered in namelist"),
        }

        debug!(
            functions = self.functions.len(),
            errors = self.errors.error_count(),
            "parsed chunk"
        );
        self.functions
    }

    fn report(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.errors.report(line, message);
    }

    fn unexpected(&mut self, message: &str) {
        let found = self.tokens.describe();
        let line = self.tokens.line();
        self.report(line, format!("'{}' not expected. {}", found, message));
    }

    // Reports that `expected` should have been here. A close enough misspelling
    // is consumed as though it were the expected token.
    fn expected(&mut self, expected: &str, detail: &str) {
        let found = self.tokens.describe();
        let line = self.tokens.line();

        let is_typo = self
            .tokens
            .text()
            .map_or(false, |text| similarity::is_typo_of(text, expected, self.threshold));
        if is_typo {
            debug!(%found, expected, "reading token as a typo");
            self.tokens.advance();
        }

        self.report(line, format!("'{}' not expected. '{}' {}", found, expected, detail));
    }

    fn closest<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        let text = self.tokens.text()?;
        similarity::best_match(text, candidates, self.threshold).map(|index| candidates[index])
    }

    fn starts_suffix(&self, distance: usize) -> bool {
        self.tokens.peek(distance).map_or(false, |token| {
            token.kind == Kind::String
                || INDEX_START.contains(&token.value.as_str())
                || CALL_START.contains(&token.value.as_str())
        })
    }

    // Runs one nesting level. Past `MAX_DEPTH` the whole parse unwinds
    // after a single report.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Parse<T>) -> Parse<T> {
        if self.depth >= MAX_DEPTH {
            let line = self.tokens.line();
            self.report(line, "Chunk has too many syntax levels");
            debug!(depth = self.depth, "nesting limit reached");
            return Err(Signal::TooDeep);
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parses statements until one of `closers`, which is consumed and
    /// returned. The top level passes no closers and ends at end of input.
    fn chunk(&mut self, closers: &[&'static str]) -> Parse<String> {
        self.nested(|parser| parser.block(closers))
    }

    fn block(&mut self, closers: &[&'static str]) -> Parse<String> {
        let mut terminated = false;

        loop {
            if self.tokens.is_empty() {
                if closers.is_empty() {
                    return Ok(String::new());
                }
                self.report(None, "Scope not closed");
                return Err(Signal::EndOfInput);
            }

            if self.tokens.is_any(closers) {
                break;
            }

            if terminated {
                let line = self.tokens.line();
                self.report(line, "Scope not closed after 'break' or 'return'");
                return Ok(match self.closest(closers) {
                    Some(closer) => {
                        self.tokens.advance();
                        closer.to_string()
                    }
                    None => String::new(),
                });
            }

            if self.tokens.matches("break") {
                terminated = true;
            } else if self.tokens.matches("return") {
                terminated = true;
                if !self.tokens.is_empty() && !self.tokens.is_any(closers) && !self.tokens.is(";") {
                    self.explist()?;
                }
            } else {
                match self.statement(closers) {
                    Err(Signal::ScopeTypo(closer)) => return Ok(closer),
                    other => other?,
                }
            }

            self.tokens.matches(";");
        }

        let closer = self.tokens.describe();
        self.tokens.advance();
        Ok(closer)
    }

    fn statement(&mut self, closers: &[&'static str]) -> Parse<()> {
        trace!(token = ?self.tokens.text(), line = ?self.tokens.line(), "statement");

        if self.tokens.matches("do") {
            self.chunk(&["end"])?;
        } else if self.tokens.matches("while") {
            self.exp()?;
            if !self.tokens.matches("do") {
                self.expected("do", "not found after 'while'");
            }
            self.chunk(&["end"])?;
        } else if self.tokens.matches("repeat") {
            self.chunk(&["until"])?;
            self.exp()?;
        } else if self.tokens.matches("if") {
            self.if_statement()?;
        } else if self.tokens.matches("function") {
            let name = self.funcname();
            self.funcbody(name)?;
        } else if self.tokens.matches("local") {
            if self.tokens.matches("function") {
                let name = self.name();
                self.funcbody(name)?;
            } else {
                match self.namelist() {
                    Ok(_) => {}
                    Err(Signal::Ellipsis(_)) => self.unexpected("'...' encountered in namelist"),
                    Err(signal) => return Err(signal),
                }
                if self.tokens.matches("=") {
                    self.explist()?;
                }
            }
        } else if self.tokens.matches("for") {
            self.for_statement()?;
        } else if self.var_or_function_call(false, closers)? {
            // varlist '=' explist
            while self.tokens.matches(",") {
                self.var()?;
            }
            if self.tokens.matches("=") {
                self.explist()?;
            } else {
                self.expected("=", "expected");
            }
        }

        Ok(())
    }

    fn if_statement(&mut self) -> Parse<()> {
        self.exp()?;
        if !self.tokens.matches("then") {
            self.expected("then", "not found after 'if'");
        }

        let mut closer = self.chunk(&IF_CLOSERS)?;
        while closer == "elseif" {
            self.exp()?;
            if !self.tokens.matches("then") {
                self.expected("then", "not found after 'elseif'");
            }
            closer = self.chunk(&IF_CLOSERS)?;
        }

        if closer == "else" {
            self.chunk(&["end"])?;
        }
        Ok(())
    }

    fn for_statement(&mut self) -> Parse<()> {
        self.name();

        if self.tokens.matches("=") {
            self.exp()?;
            if !self.tokens.matches(",") {
                self.expected(",", "expected in 'for' loop");
            }
            self.exp()?;
            if self.tokens.matches(",") {
                self.exp()?;
            }
        } else {
            while self.tokens.matches(",") {
                self.name();
            }
            if !self.tokens.matches("in") {
                self.expected("in", "expected in 'for' loop");
            }
            self.explist()?;
        }

        if !self.tokens.matches("do") {
            self.expected("do", "expected in 'for' loop");
        }
        self.chunk(&["end"])?;
        Ok(())
    }

    fn var(&mut self) -> Parse<()> {
        if !self.var_or_function_call(false, &[])? {
            self.unexpected("Variable expected");
        }
        Ok(())
    }

    /// Parses a var, a function call or, in expressions, `'(' exp ')'`.
    /// Returns `true` when the result can be assigned to.
    ///
    /// One token of lookahead decides between a bare variable at the start of
    /// an assignment, a prefix followed by index/call suffixes, and (in
    /// statement position) a name that is probably a misspelt keyword.
    fn var_or_function_call(
        &mut self,
        in_expression: bool,
        closers: &[&'static str],
    ) -> Parse<bool> {
        if self.tokens.kind() == Some(Kind::Name) {
            let bare = self
                .tokens
                .lookahead()
                .map_or(false, |next| next.value == "," || next.value == "=");
            if bare {
                self.tokens.advance();
                return Ok(true);
            }

            if !self.starts_suffix(1) {
                if in_expression {
                    self.tokens.advance();
                    return Ok(false);
                }
                return self.recover_misspelt_name(closers);
            }
            self.prefix()?;
        } else if self.tokens.is("(") {
            self.prefix()?;
            if !self.starts_suffix(0) {
                if !in_expression {
                    self.unexpected(SUFFIX_EXPECTED);
                }
                return Ok(false);
            }
        } else {
            self.unexpected("Name or '(' expected");
            self.tokens.advance();
            return Ok(false);
        }

        let mut assignable = false;
        while let Some(is_index) = self.suffix()? {
            assignable = is_index;
        }
        Ok(assignable)
    }

    // A name in statement position with nothing after it that continues a
    // var or call.
    fn recover_misspelt_name(&mut self, closers: &[&'static str]) -> Parse<bool> {
        let found = self.tokens.describe();
        let line = self.tokens.line();

        if let Some(closer) = self.closest(closers) {
            self.report(line, format!("Typo in '{}' - should probably be '{}'", found, closer));
            debug!(%found, closer, "closing scope on misspelt terminator");
            self.tokens.advance();
            return Err(Signal::ScopeTypo(closer.to_string()));
        }

        if let Some(keyword) = self.closest(&STATEMENT_KEYWORDS) {
            self.report(line, format!("Typo in '{}' - should probably be '{}'", found, keyword));
            debug!(%found, keyword, "rewriting misspelt keyword");
            self.tokens.force_set(keyword, Kind::Keyword);
            return Ok(false);
        }

        self.tokens.advance();
        self.unexpected(SUFFIX_EXPECTED);
        Ok(false)
    }

    fn prefix(&mut self) -> Parse<()> {
        if self.tokens.matches("(") {
            self.exp()?;
            if !self.tokens.matches(")") {
                self.expected(")", "expected");
            }
        } else {
            self.name();
        }
        Ok(())
    }

    // One index or call suffix. `Some(true)` for an index, `Some(false)` for a
    // call, `None` when the current token starts neither.
    fn suffix(&mut self) -> Parse<Option<bool>> {
        if self.tokens.is_any(&INDEX_START) {
            self.index()?;
            Ok(Some(true))
        } else if self.tokens.is_any(&CALL_START) || self.tokens.kind() == Some(Kind::String) {
            self.call()?;
            Ok(Some(false))
        } else {
            Ok(None)
        }
    }

    fn index(&mut self) -> Parse<()> {
        if self.tokens.matches(".") {
            self.name();
        } else if self.tokens.matches("[") {
            self.exp()?;
            if !self.tokens.matches("]") {
                self.expected("]", "expected");
            }
        } else {
            self.unexpected("'.' or '[' expected");
        }
        Ok(())
    }

    fn call(&mut self) -> Parse<()> {
        if self.tokens.matches(":") {
            self.name();
        }

        if self.tokens.matches_kind(Kind::String) {
            return Ok(());
        }

        if self.tokens.matches("(") {
            if !self.tokens.matches(")") {
                self.explist()?;
                if !self.tokens.matches(")") {
                    self.expected(")", "expected");
                }
            }
        } else if self.tokens.is("{") {
            self.table_constructor()?;
        } else {
            self.unexpected("'(', '{' or a string expected");
        }
        Ok(())
    }

    fn table_constructor(&mut self) -> Parse<()> {
        if !self.tokens.matches("{") {
            self.expected("{", "expected");
        }

        if !self.tokens.matches("}") {
            self.field()?;
            while self.tokens.matches_any(&[",", ";"]) {
                if self.tokens.is("}") {
                    break;
                }
                self.field()?;
            }

            if !self.tokens.matches("}") {
                self.expected("}", "expected");
            }
        }
        Ok(())
    }

    fn field(&mut self) -> Parse<()> {
        if self.tokens.matches("[") {
            self.exp()?;
            if !self.tokens.matches("]") {
                self.expected("]", "expected");
            }
            if !self.tokens.matches("=") {
                self.expected("=", "expected");
            }
            self.exp()
        } else if self.tokens.kind() == Some(Kind::Name)
            && self.tokens.lookahead().map_or(false, |next| next.value == "=")
        {
            self.tokens.advance();
            self.tokens.advance();
            self.exp()
        } else {
            self.exp()
        }
    }

    fn value(&mut self) -> Parse<()> {
        if self.tokens.matches_any(&LITERALS)
            || self.tokens.matches_kind(Kind::Number)
            || self.tokens.matches_kind(Kind::String)
        {
            return Ok(());
        }

        if self.tokens.matches("function") {
            self.funcbody(String::new())
        } else if self.tokens.is("{") {
            self.table_constructor()
        } else {
            self.var_or_function_call(true, &[]).map(|_| ())
        }
    }

    // Every recursive path through expressions (parentheses, table fields,
    // index and call arguments) comes back through here.
    fn exp(&mut self) -> Parse<()> {
        self.nested(Self::operand_chain)
    }

    fn operand_chain(&mut self) -> Parse<()> {
        loop {
            while self.tokens.matches_any(&UNARY_OPERATORS) {}
            self.value()?;
            if !self.tokens.matches_any(&BINARY_OPERATORS) {
                return Ok(());
            }
        }
    }

    fn explist(&mut self) -> Parse<()> {
        self.exp()?;
        while self.tokens.matches(",") {
            self.exp()?;
        }
        Ok(())
    }

    /// Records the function under `name` (or a synthesized label when empty),
    /// then parses its parameter list and body.
    fn funcbody(&mut self, name: String) -> Parse<()> {
        let name = if name.is_empty() {
            let line = self
                .tokens
                .line()
                .map_or_else(|| "EOF".to_string(), |line| line.to_string());
            let label = format!("Unnamed function {} on line {}", self.unnamed_functions, line);
            self.unnamed_functions += 1;
            label
        } else {
            name
        };

        if self.functions.declare(&name) {
            let line = self.tokens.line();
            self.report(line, format!("Function '{}' defined multiple times", name));
        }

        let context = format!("expected in function '{}'", name);
        if !self.tokens.matches("(") {
            self.expected("(", &context);
        }

        if !self.tokens.matches(")") {
            if self.tokens.matches("...") {
                self.functions.mark_variadic(&name);
            } else {
                match self.namelist() {
                    Ok(params) => self.functions.add_params(&name, params),
                    Err(Signal::Ellipsis(params)) => {
                        self.functions.add_params(&name, params);
                        self.functions.mark_variadic(&name);
                    }
                    Err(signal) => return Err(signal),
                }
            }

            if !self.tokens.matches(")") {
                self.expected(")", &context);
            }
        }

        self.chunk(&["end"])?;
        Ok(())
    }

    fn namelist(&mut self) -> Parse<Vec<String>> {
        let mut names = vec![self.name()];
        while self.tokens.matches(",") {
            if self.tokens.matches("...") {
                return Err(Signal::Ellipsis(names));
            }
            names.push(self.name());
        }
        Ok(names)
    }

    fn name(&mut self) -> String {
        let name = self.tokens.text().unwrap_or_default().to_string();
        if !self.tokens.matches_kind(Kind::Name) {
            let message = format!("'{}' is not a valid name", self.tokens.describe());
            self.unexpected(&message);
        }
        name
    }

    fn funcname(&mut self) -> String {
        let mut name = self.name();
        while self.tokens.matches(".") {
            name.push('.');
            name.push_str(&self.name());
        }
        if self.tokens.matches(":") {
            name.push(':');
            name.push_str(&self.name());
        }
        name
    }
}

use crate::ast::{Form, FormKind, Span};
use crate::error::SprigError;

#[derive(Clone, Debug, Default)]
pub struct ReaderOptions {
    pub source_name: Option<String>,
}

pub struct Reader {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    pub options: ReaderOptions,
}

impl Reader {
    pub fn new(source: &str) -> Self {
        Self::new_with_options(source, ReaderOptions::default())
    }

    pub fn new_with_options(source: &str, options: ReaderOptions) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            options,
        }
    }

    pub fn read_all(&mut self) -> Result<Vec<Form>, SprigError> {
        let mut forms = Vec::new();
        self.skip_ws_and_comments();
        while !self.eof() {
            forms.push(self.read_form()?);
            self.skip_ws_and_comments();
        }
        Ok(forms)
    }

    /// Reads the next form, or `None` once only whitespace and comments remain.
    pub fn read_next(&mut self) -> Result<Option<Form>, SprigError> {
        self.skip_ws_and_comments();
        if self.eof() {
            return Ok(None);
        }
        self.read_form().map(Some)
    }

    fn read_form(&mut self) -> Result<Form, SprigError> {
        self.skip_ws_and_comments();
        if self.eof() {
            return self.incomplete_err("unexpected end of input");
        }
        let span = self.current_span();
        match self.current_char() {
            '\'' => self.read_prefixed("quote", 1, span),
            '`' => self.read_prefixed("syntax-quote", 1, span),
            '~' => {
                if self.peek_char() == Some('@') {
                    self.read_prefixed("unquote-splicing", 2, span)
                } else {
                    self.read_prefixed("unquote", 1, span)
                }
            }
            '(' => self.read_seq(')', "list", span).map(|items| Form::new(FormKind::List(items), span)),
            '[' => self.read_seq(']', "vector", span).map(|items| Form::new(FormKind::Vector(items), span)),
            '"' => self.read_string(span),
            ch @ (')' | ']') => self.parse_err(format!("unexpected closing delimiter '{}'", ch)),
            _ => self.read_atom(span),
        }
    }

    /// `'x`, `` `x ``, `~x` and `~@x` all read as `(head x)`.
    fn read_prefixed(&mut self, head: &str, width: usize, start: Span) -> Result<Form, SprigError> {
        for _ in 0..width {
            self.advance();
        }
        let inner = self.read_form()?;
        let head = Form::new(FormKind::Symbol(head.into()), start);
        Ok(Form::new(FormKind::List(vec![head, inner]), start))
    }

    fn read_seq(&mut self, close: char, what: &str, start: Span) -> Result<Vec<Form>, SprigError> {
        self.advance(); // opening delimiter
        let mut items = Vec::new();
        self.skip_ws_and_comments();
        while !self.eof() && self.current_char() != close {
            if matches!(self.current_char(), ')' | ']') {
                return self.parse_err(format!(
                    "unexpected closing delimiter '{}' in {} opened at {}:{}",
                    self.current_char(),
                    what,
                    start.line,
                    start.col
                ));
            }
            items.push(self.read_form()?);
            self.skip_ws_and_comments();
        }
        if self.eof() {
            return self.incomplete_err(format!("unterminated {}", what));
        }
        self.advance(); // closing delimiter
        Ok(items)
    }

    fn read_string(&mut self, start: Span) -> Result<Form, SprigError> {
        self.advance(); // "
        let mut buf = String::new();
        while !self.eof() {
            let ch = self.current_char();
            match ch {
                '"' => {
                    self.advance();
                    return Ok(Form::new(FormKind::String(buf), start));
                }
                '\\' => {
                    self.advance();
                    if self.eof() {
                        return self.incomplete_err("unterminated escape");
                    }
                    let esc = self.current_char();
                    let real = match esc {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '"' => '"',
                        '\\' => '\\',
                        _ => esc,
                    };
                    buf.push(real);
                    self.advance();
                }
                _ => {
                    buf.push(ch);
                    self.advance();
                }
            }
        }
        self.incomplete_err("unterminated string")
    }

    fn read_atom(&mut self, start: Span) -> Result<Form, SprigError> {
        let mut buf = String::new();
        while !self.eof() {
            let ch = self.current_char();
            if is_ws_or_comma(ch) || matches!(ch, '(' | ')' | '[' | ']' | '"' | ';' | '\'' | '`') {
                break;
            }
            buf.push(ch);
            self.advance();
        }
        match buf.as_str() {
            "nil" => return Ok(Form::new(FormKind::Nil, start)),
            "true" => return Ok(Form::new(FormKind::Bool(true), start)),
            "false" => return Ok(Form::new(FormKind::Bool(false), start)),
            _ => {}
        }
        if looks_numeric(&buf) {
            let is_float_literal = buf.contains('.') || buf.contains('e') || buf.contains('E');
            if is_float_literal {
                if let Ok(n) = buf.parse::<f64>() {
                    return Ok(Form::new(FormKind::Float(n), start));
                }
            } else if let Ok(n) = buf.parse::<i64>() {
                return Ok(Form::new(FormKind::Int(n), start));
            }
            return self.parse_err(format!("invalid number literal '{}'", buf));
        }
        Ok(Form::new(FormKind::Symbol(buf), start))
    }

    pub fn skip_ws_and_comments(&mut self) {
        loop {
            while !self.eof() && is_ws_or_comma(self.current_char()) {
                self.advance();
            }
            if self.eof() || self.current_char() != ';' {
                break;
            }
            while !self.eof() && self.current_char() != '\n' {
                self.advance();
            }
        }
    }

    fn current_char(&self) -> char {
        self.chars[self.index]
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn advance(&mut self) {
        if self.eof() {
            return;
        }
        let ch = self.chars[self.index];
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
            index: self.index,
        }
    }

    pub fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn located(&self, err: SprigError) -> SprigError {
        err.with_span(self.current_span())
            .with_file(self.options.source_name.clone())
    }

    pub fn parse_err<T>(&self, msg: impl Into<String>) -> Result<T, SprigError> {
        Err(self.located(SprigError::parse(msg)))
    }

    fn incomplete_err<T>(&self, msg: impl Into<String>) -> Result<T, SprigError> {
        Err(self.located(SprigError::incomplete(msg)))
    }
}

fn is_ws_or_comma(ch: char) -> bool {
    ch.is_whitespace() || ch == ','
}

fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_digit() => true,
        Some('+' | '-') => matches!(chars.next(), Some(ch) if ch.is_ascii_digit()),
        _ => false,
    }
}

pub fn read_source(source: &str) -> Result<Vec<Form>, SprigError> {
    Reader::new(source).read_all()
}

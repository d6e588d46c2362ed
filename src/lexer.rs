use crate::error::{error_context, Location, SyntaxError, SyntaxErrorType};
use crate::value::Value;
use std::collections::HashMap;

const INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Dot,
    Minus,
    Plus,
    Percent,
    Semicolon,

    // One or two character tokens
    Slash,
    SlashSlash,
    Star,
    StarStar,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Integer,
    Float,
    FStringStart,
    FStringText,
    FStringEnd,

    // Keywords
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    False,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    None,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    True,
    Try,
    While,
    With,
    Yield,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenType {
    /// Reserved words and symbols the language does not support.
    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            TokenType::As
                | TokenType::Assert
                | TokenType::Async
                | TokenType::Await
                | TokenType::Class
                | TokenType::Del
                | TokenType::Except
                | TokenType::Finally
                | TokenType::From
                | TokenType::Global
                | TokenType::Import
                | TokenType::Is
                | TokenType::Lambda
                | TokenType::Nonlocal
                | TokenType::Pass
                | TokenType::Raise
                | TokenType::Try
                | TokenType::With
                | TokenType::Yield
                | TokenType::Semicolon
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text, or the unescaped contents for string and f-string text tokens.
    pub lexeme: String,
    /// Value of a number, string, `True`, `False` or `None` token.
    pub literal: Option<Value>,
    pub location: Location,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, location: Location) -> Self {
        Self {
            token_type,
            lexeme,
            literal: None,
            location,
        }
    }

    pub fn with_literal(mut self, literal: Value) -> Self {
        self.literal = Some(literal);
        self
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
    indent_level: usize,
    bracket_depth: usize,
    at_line_start: bool,
    // Set for the scanner of an f-string replacement field.
    nested: Option<Location>,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let keywords = [
            ("and", TokenType::And),
            ("as", TokenType::As),
            ("assert", TokenType::Assert),
            ("async", TokenType::Async),
            ("await", TokenType::Await),
            ("break", TokenType::Break),
            ("class", TokenType::Class),
            ("continue", TokenType::Continue),
            ("def", TokenType::Def),
            ("del", TokenType::Del),
            ("elif", TokenType::Elif),
            ("else", TokenType::Else),
            ("except", TokenType::Except),
            ("False", TokenType::False),
            ("finally", TokenType::Finally),
            ("for", TokenType::For),
            ("from", TokenType::From),
            ("global", TokenType::Global),
            ("if", TokenType::If),
            ("import", TokenType::Import),
            ("in", TokenType::In),
            ("is", TokenType::Is),
            ("lambda", TokenType::Lambda),
            ("None", TokenType::None),
            ("nonlocal", TokenType::Nonlocal),
            ("not", TokenType::Not),
            ("or", TokenType::Or),
            ("pass", TokenType::Pass),
            ("raise", TokenType::Raise),
            ("return", TokenType::Return),
            ("True", TokenType::True),
            ("try", TokenType::Try),
            ("while", TokenType::While),
            ("with", TokenType::With),
            ("yield", TokenType::Yield),
        ]
        .into_iter()
        .collect();

        Self {
            source: source.to_string(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            indent_level: 0,
            bracket_depth: 0,
            at_line_start: true,
            nested: None,
            keywords,
        }
    }

    /// Scanner for the expression inside an f-string `{...}`, positioned at `origin`.
    fn nested(source: &str, origin: Location) -> Self {
        let mut lexer = Self::new(source);
        lexer.line = origin.line;
        lexer.at_line_start = false;
        lexer.bracket_depth = 1;
        lexer.nested = Some(origin);
        lexer
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, SyntaxError> {
        while !self.is_at_end() {
            if self.at_line_start && self.bracket_depth == 0 {
                self.indentation()?;
                if self.is_at_end() {
                    break;
                }
            }
            self.start = self.current;
            self.scan_token()?;
        }

        if self.nested.is_some() {
            return Ok(std::mem::take(&mut self.tokens));
        }

        self.start = self.current;
        let ends_line = matches!(
            self.tokens.last().map(|t| t.token_type),
            None | Some(TokenType::Newline) | Some(TokenType::Dedent)
        );
        if !ends_line {
            self.add_token_with_content(TokenType::Newline, String::new());
        }
        for _ in 0..self.indent_level {
            self.add_token_with_content(TokenType::Dedent, String::new());
        }
        self.indent_level = 0;
        self.add_token_with_content(TokenType::Eof, String::new());

        tracing::trace!(tokens = self.tokens.len(), "scanned source");
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Consumes leading whitespace of a logical line and emits Indent/Dedent tokens.
    /// Blank and comment-only lines are skipped without affecting indentation.
    fn indentation(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.start = self.current;
            let mut spaces = 0;
            loop {
                match self.peek() {
                    ' ' => {
                        self.advance();
                        spaces += 1;
                    }
                    '\t' => {
                        self.start = self.current;
                        self.advance();
                        return Err(self.error_with(
                            SyntaxErrorType::IndentationError,
                            "Tabs cannot be used for indentation, use four spaces instead",
                        ));
                    }
                    _ => break,
                }
            }

            match self.peek() {
                '#' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    continue;
                }
                '\r' => {
                    self.advance();
                    continue;
                }
                '\n' => {
                    self.advance();
                    self.new_line();
                    continue;
                }
                _ if self.is_at_end() => return Ok(()),
                _ => {}
            }

            if spaces % INDENT_WIDTH != 0 {
                return Err(self.error_with(
                    SyntaxErrorType::IndentationError,
                    &format!(
                        "Indentation must be a multiple of {} spaces, but this line has {}",
                        INDENT_WIDTH, spaces
                    ),
                ));
            }

            let level = spaces / INDENT_WIDTH;
            while level > self.indent_level {
                self.add_token_with_content(TokenType::Indent, String::new());
                self.indent_level += 1;
            }
            while level < self.indent_level {
                self.add_token_with_content(TokenType::Dedent, String::new());
                self.indent_level -= 1;
            }
            self.at_line_start = false;
            return Ok(());
        }
    }

    fn scan_token(&mut self) -> Result<(), SyntaxError> {
        let c = self.advance();

        match c {
            '(' => {
                self.bracket_depth += 1;
                self.add_token(TokenType::LeftParen);
            }
            ')' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                self.add_token(TokenType::RightParen);
            }
            '[' => {
                self.bracket_depth += 1;
                self.add_token(TokenType::LeftBracket);
            }
            ']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                self.add_token(TokenType::RightBracket);
            }
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            '%' => self.add_token(TokenType::Percent),
            ';' => {
                return Err(self.unimplemented(TokenType::Semicolon));
            }
            '*' => {
                let token_type = if self.match_char('*') {
                    TokenType::StarStar
                } else {
                    TokenType::Star
                };
                self.add_token(token_type);
            }
            '/' => {
                let token_type = if self.match_char('/') {
                    TokenType::SlashSlash
                } else {
                    TokenType::Slash
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.unexpected_character(c));
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '#' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => {
                if self.bracket_depth == 0 {
                    self.add_token_with_content(TokenType::Newline, String::new());
                    self.at_line_start = true;
                }
                self.new_line();
            }
            '"' | '\'' => self.string(c)?,
            'f' | 'F' if matches!(self.peek(), '"' | '\'') => {
                let quote = self.advance();
                self.fstring(quote)?;
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier()?,
            _ => return Err(self.unexpected_character(c)),
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.line_start = self.current;
    }

    /// Reads one escape sequence after a backslash.
    fn escape(&mut self) -> char {
        match self.advance() {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        }
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let mut content = String::new();
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(self.error(SyntaxErrorType::UnterminatedString));
            }
            match self.advance() {
                c if c == quote => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(self.error(SyntaxErrorType::UnterminatedString));
                    }
                    let escaped = self.escape();
                    content.push(escaped);
                }
                c => content.push(c),
            }
        }

        let literal = Value::Str(content.clone());
        self.add_literal_token(TokenType::String, content, literal);
        Ok(())
    }

    /// Scans `f"..."` into FStringStart, text and `{ expr }` parts, then FStringEnd.
    fn fstring(&mut self, quote: char) -> Result<(), SyntaxError> {
        self.add_token(TokenType::FStringStart);

        let mut text = String::new();
        self.start = self.current;
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(self.error(SyntaxErrorType::UnterminatedString));
            }
            let before = self.current;
            match self.advance() {
                c if c == quote => {
                    self.current = before;
                    self.flush_fstring_text(&mut text);
                    self.start = before;
                    self.advance();
                    self.add_token(TokenType::FStringEnd);
                    return Ok(());
                }
                '\\' => {
                    let escaped = self.escape();
                    text.push(escaped);
                }
                '{' if self.peek() == '{' => {
                    self.advance();
                    text.push('{');
                }
                '}' if self.peek() == '}' => {
                    self.advance();
                    text.push('}');
                }
                '}' => {
                    self.start = before;
                    return Err(SyntaxError::new(
                        SyntaxErrorType::GenericSyntaxError,
                        self.location(),
                        error_context([("lexeme", "}".to_string())]),
                    ));
                }
                '{' => {
                    self.current = before;
                    self.flush_fstring_text(&mut text);
                    self.start = before;
                    self.advance();
                    self.add_token(TokenType::LeftBrace);
                    self.replacement_field(quote)?;
                    self.start = self.current;
                }
                c => text.push(c),
            }
        }
    }

    fn flush_fstring_text(&mut self, text: &mut String) {
        if !text.is_empty() {
            let content = std::mem::take(text);
            self.add_token_with_content(TokenType::FStringText, content);
        }
    }

    /// Scans the expression of a `{...}` part with a nested scanner, through the closing `}`.
    fn replacement_field(&mut self, quote: char) -> Result<(), SyntaxError> {
        let open_brace = self.start;
        let expr_start = self.current;
        let mut depth = 0usize;
        let mut inner_quote: Option<char> = None;

        loop {
            let c = self.peek();
            if self.is_at_end() || c == '\n' || (c == quote && inner_quote.is_none()) {
                self.start = open_brace;
                return Err(self.error(SyntaxErrorType::MissingRightBraceInFString));
            }
            match (inner_quote, c) {
                (Some(q), c) if c == q => inner_quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => inner_quote = Some(c),
                (None, '(') | (None, '[') | (None, '{') => depth += 1,
                (None, ')') | (None, ']') => depth = depth.saturating_sub(1),
                (None, '}') if depth > 0 => depth -= 1,
                (None, '}') => break,
                _ => {}
            }
            self.advance();
        }

        let origin = self.location_at(expr_start, self.current);
        let expression = &self.source[expr_start..self.current];
        let inner = Lexer::nested(expression, origin).scan_tokens()?;
        self.tokens.extend(inner);

        self.start = self.current;
        self.advance();
        self.add_token(TokenType::RightBrace);
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if matches!(self.peek(), 'e' | 'E') {
            let after = self.peek_next();
            let has_sign = matches!(after, '+' | '-');
            let mut rest = self.source[self.current..].chars().skip(if has_sign { 2 } else { 1 });
            if after.is_ascii_digit() || (has_sign && rest.next().is_some_and(|d| d.is_ascii_digit())) {
                is_float = true;
                self.advance();
                if has_sign {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let number_slice = &self.source[self.start..self.current];
        // Integer literals too large for i64 are read as floats.
        if !is_float && number_slice.parse::<i64>().is_err() {
            is_float = true;
        }

        let (token_type, literal) = if is_float {
            let value = number_slice.parse::<f64>().unwrap_or(f64::INFINITY);
            (TokenType::Float, Value::Float(value))
        } else {
            let value = number_slice.parse::<i64>().map_or(Value::None, Value::Int);
            (TokenType::Integer, value)
        };
        let lexeme = number_slice.to_string();
        self.add_literal_token(token_type, lexeme, literal);
    }

    fn identifier(&mut self) -> Result<(), SyntaxError> {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);

        if token_type.is_unimplemented() {
            return Err(self.unimplemented(token_type));
        }

        let literal = match token_type {
            TokenType::True => Some(Value::Bool(true)),
            TokenType::False => Some(Value::Bool(false)),
            TokenType::None => Some(Value::None),
            _ => None,
        };
        match literal {
            Some(value) => {
                let lexeme = text.to_string();
                self.add_literal_token(token_type, lexeme, value);
            }
            None => self.add_token(token_type),
        }
        Ok(())
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_content(token_type, text.to_string());
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        let location = self.location();
        self.tokens.push(Token::new(token_type, lexeme, location));
    }

    fn add_literal_token(&mut self, token_type: TokenType, lexeme: String, literal: Value) {
        let location = self.location();
        self.tokens
            .push(Token::new(token_type, lexeme, location).with_literal(literal));
    }

    fn location(&self) -> Location {
        self.location_at(self.start, self.current)
    }

    fn location_at(&self, start: usize, end: usize) -> Location {
        let line_start = self.line_start.min(start);
        let mut column = self.source[line_start..start].chars().count() + 1;
        let mut offset = 0;
        if let Some(origin) = self.nested {
            offset = origin.start;
            column += origin.column - 1;
        }
        Location::new(start + offset, end + offset, self.line, column)
    }

    fn error(&self, error_type: SyntaxErrorType) -> SyntaxError {
        SyntaxError::bare(error_type, self.location())
    }

    fn error_with(&self, error_type: SyntaxErrorType, details: &str) -> SyntaxError {
        SyntaxError::new(
            error_type,
            self.location(),
            error_context([("details", details.to_string())]),
        )
    }

    fn unexpected_character(&self, c: char) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorType::UnexpectedCharacter,
            self.location(),
            error_context([("character", c.to_string())]),
        )
    }

    fn unimplemented(&self, token_type: TokenType) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorType::UnimplementedToken,
            self.location(),
            error_context([
                ("tokenType", format!("{:?}", token_type)),
                ("lexeme", self.source[self.start..self.current].to_string()),
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(source: &str) -> Vec<TokenType> {
        Lexer::new(source)
            .scan_tokens()
            .expect("source should scan")
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    fn scan_error(source: &str) -> SyntaxErrorType {
        Lexer::new(source)
            .scan_tokens()
            .expect_err("source should not scan")
            .error_type
    }

    #[test]
    fn literal_tokens_carry_their_values() {
        let literals: Vec<Option<Value>> = Lexer::new("12 1.5 'a\\tb' True None x 99999999999999999999")
            .scan_tokens()
            .expect("source should scan")
            .into_iter()
            .map(|t| t.literal)
            .collect();
        assert_eq!(
            literals,
            vec![
                Some(Value::Int(12)),
                Some(Value::Float(1.5)),
                Some(Value::Str("a\tb".to_string())),
                Some(Value::Bool(true)),
                Some(Value::None),
                None,
                Some(Value::Float(1e20)),
                None,
                None,
            ]
        );
    }

    #[test]
    fn emits_indent_and_dedent_per_level() {
        use TokenType::*;
        assert_eq!(
            types("if x:\n    y\nz"),
            vec![If, Identifier, Colon, Newline, Indent, Identifier, Newline, Dedent, Identifier, Newline, Eof]
        );
    }

    #[test]
    fn closes_open_blocks_at_end_of_input() {
        use TokenType::*;
        assert_eq!(
            types("if a:\n    if b:\n        c\n"),
            vec![
                If, Identifier, Colon, Newline, Indent, If, Identifier, Colon, Newline, Indent,
                Identifier, Newline, Dedent, Dedent, Eof
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_change_indentation() {
        use TokenType::*;
        assert_eq!(
            types("x = 1\n\n   # note\n\ny"),
            vec![Identifier, Equal, Integer, Newline, Identifier, Newline, Eof]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_joined() {
        use TokenType::*;
        assert_eq!(
            types("x = [1,\n  2]\n"),
            vec![Identifier, Equal, LeftBracket, Integer, Comma, Integer, RightBracket, Newline, Eof]
        );
    }

    #[test]
    fn scans_two_character_operators() {
        use TokenType::*;
        assert_eq!(
            types("a ** b // c % d != e"),
            vec![Identifier, StarStar, Identifier, SlashSlash, Identifier, Percent, Identifier, BangEqual, Identifier, Newline, Eof]
        );
    }

    #[test]
    fn numbers_with_fraction_and_exponent_are_floats() {
        let tokens = Lexer::new("12 1.5 2e3 4E-2 7.e").scan_tokens().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| (t.token_type, t.lexeme.as_str())).collect();
        assert_eq!(kinds[0], (TokenType::Integer, "12"));
        assert_eq!(kinds[1], (TokenType::Float, "1.5"));
        assert_eq!(kinds[2], (TokenType::Float, "2e3"));
        assert_eq!(kinds[3], (TokenType::Float, "4E-2"));
        assert_eq!(kinds[4], (TokenType::Integer, "7"));
    }

    #[test]
    fn strings_unescape_their_contents() {
        let tokens = Lexer::new(r#"'it\'s' "a\tb""#).scan_tokens().unwrap();
        assert_eq!(tokens[0].lexeme, "it's");
        assert_eq!(tokens[1].lexeme, "a\tb");
        assert_eq!(tokens[0].location.start, 0);
        assert_eq!(tokens[0].location.end, 7);
    }

    #[test]
    fn rejects_tabs_and_odd_indentation() {
        assert_eq!(scan_error("if x:\n\ty"), SyntaxErrorType::IndentationError);
        assert_eq!(scan_error("if x:\n   y"), SyntaxErrorType::IndentationError);
    }

    #[test]
    fn rejects_unsupported_keywords_and_characters() {
        assert_eq!(scan_error("import math"), SyntaxErrorType::UnimplementedToken);
        assert_eq!(scan_error("x = 1; y = 2"), SyntaxErrorType::UnimplementedToken);
        assert_eq!(scan_error("x = $"), SyntaxErrorType::UnexpectedCharacter);
        assert_eq!(scan_error("x = 'abc"), SyntaxErrorType::UnterminatedString);
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = Lexer::new("x = 1\nfoo = 22").scan_tokens().unwrap();
        let foo = &tokens[4];
        assert_eq!(foo.lexeme, "foo");
        assert_eq!((foo.location.line, foo.location.column), (2, 1));
        let value = &tokens[6];
        assert_eq!((value.location.line, value.location.column), (2, 7));
    }

    #[test]
    fn splits_fstrings_into_parts() {
        use TokenType::*;
        let tokens = Lexer::new("f\"a{x + 1}b{{c}}\"").scan_tokens().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![FStringStart, FStringText, LeftBrace, Identifier, Plus, Integer, RightBrace, FStringText, FStringEnd, Newline, Eof]
        );
        assert_eq!(tokens[7].lexeme, "b{c}");
        let x = &tokens[3];
        assert_eq!(x.location.to_code("f\"a{x + 1}b{{c}}\""), "x");
        assert_eq!(x.location.column, 5);
    }

    #[test]
    fn unclosed_fstring_field_is_reported() {
        assert_eq!(scan_error("f'{x'"), SyntaxErrorType::MissingRightBraceInFString);
    }
}

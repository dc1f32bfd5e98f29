use std::fmt;

use crate::diagnostics::{Diagnostic, DiagnosticKind, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Print,
    Use,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Print => "print",
            Keyword::Use => "use",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Identifier,
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    LParen,
    RParen,
    Comma,
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number => write!(f, "number"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Keyword(kw) => write!(f, "`{}`", kw.as_str()),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Slash => write!(f, "`/`"),
            TokenKind::Assign => write!(f, "`=`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Literal payload decoded at lex time.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token.
    pub lexeme: String,
    pub value: TokenValue,
    pub span: SourceSpan,
}

impl Token {
    pub fn position(&self) -> usize {
        self.span.start
    }
}

/// Converts source text into tokens. Always ends the stream with a single
/// `Eof` token; newlines are kept as statement separators.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).tokenize()
}

pub struct Lexer<'a> {
    source: &'a str,
    current: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, current: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += ch.len_utf8();
        Some(ch)
    }

    fn eat_while<F>(&mut self, mut predicate: F)
    where
        F: FnMut(char) -> bool,
    {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }
    }

    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('#') => self.eat_while(|ch| ch != '\n'),
                _ => break,
            }
        }
    }

    fn token(&self, kind: TokenKind, value: TokenValue, start: usize) -> Token {
        Token {
            kind,
            lexeme: self.source[start..self.current].to_string(),
            value,
            span: SourceSpan::new(start, self.current),
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Token {
        self.eat_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let kind = keyword_for(&self.source[start..self.current])
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Identifier);
        self.token(kind, TokenValue::None, start)
    }

    fn number_literal(&mut self, start: usize) -> Result<Token, Diagnostic> {
        self.eat_while(|ch| ch.is_ascii_digit());
        let is_float = self.peek() == Some('.')
            && self.peek_second().is_some_and(|ch| ch.is_ascii_digit());
        if is_float {
            self.bump();
            self.eat_while(|ch| ch.is_ascii_digit());
        }
        let text = &self.source[start..self.current];
        let span = SourceSpan::new(start, self.current);
        let value = if is_float {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => TokenValue::Float(value),
                _ => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lexer,
                        format!("float literal `{text}` is out of range"),
                    )
                    .with_span(span));
                }
            }
        } else {
            text.parse::<i64>().map(TokenValue::Int).map_err(|_| {
                Diagnostic::new(
                    DiagnosticKind::Lexer,
                    format!("integer literal `{text}` is out of range"),
                )
                .with_span(span)
            })?
        };
        Ok(self.token(TokenKind::Number, value, start))
    }

    fn string_literal(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let mut value = String::new();
        loop {
            let at = self.current;
            match self.bump() {
                Some('"') => {
                    return Ok(self.token(TokenKind::String, TokenValue::Text(value), start));
                }
                Some('\\') => value.push(self.escape(at)?),
                Some(ch) => value.push(ch),
                None => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lexer,
                        "unterminated string literal",
                    )
                    .with_span(SourceSpan::new(start, self.current)));
                }
            }
        }
    }

    /// Decodes one escape sequence; `at` is the offset of the backslash.
    fn escape(&mut self, at: usize) -> Result<char, Diagnostic> {
        let Some(esc) = self.bump() else {
            return Err(self.escape_error(at, "unterminated escape sequence"));
        };
        let decoded = match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|ch| ch.to_digit(8)) {
                        Some(digit) => {
                            self.bump();
                            code = code * 8 + digit;
                        }
                        None => break,
                    }
                }
                self.code_point(code, at)?
            }
            'x' => {
                let code = self.hex_digits(2, at)?;
                self.code_point(code, at)?
            }
            'u' if self.peek() == Some('{') => {
                self.bump();
                let digits_start = self.current;
                self.eat_while(|ch| ch.is_ascii_hexdigit());
                let digits_end = self.current;
                let closed = self.bump() == Some('}');
                let digits = &self.source[digits_start..digits_end];
                if !closed || digits.is_empty() || digits.len() > 6 {
                    return Err(self.escape_error(at, "malformed `\\u{...}` escape"));
                }
                let code = u32::from_str_radix(digits, 16)
                    .map_err(|_| self.escape_error(at, "malformed `\\u{...}` escape"))?;
                self.code_point(code, at)?
            }
            'u' => {
                let code = self.hex_digits(4, at)?;
                self.code_point(code, at)?
            }
            'U' => {
                let code = self.hex_digits(8, at)?;
                self.code_point(code, at)?
            }
            other => {
                return Err(self.escape_error(at, &format!("unknown escape sequence `\\{other}`")));
            }
        };
        Ok(decoded)
    }

    fn hex_digits(&mut self, count: usize, at: usize) -> Result<u32, Diagnostic> {
        let mut code = 0u32;
        for _ in 0..count {
            match self.peek().and_then(|ch| ch.to_digit(16)) {
                Some(digit) => {
                    self.bump();
                    code = code.wrapping_mul(16).wrapping_add(digit);
                }
                None => {
                    return Err(self.escape_error(
                        at,
                        &format!("expected {count} hex digits in escape sequence"),
                    ));
                }
            }
        }
        Ok(code)
    }

    fn code_point(&self, code: u32, at: usize) -> Result<char, Diagnostic> {
        char::from_u32(code).ok_or_else(|| {
            self.escape_error(at, &format!("escape encodes invalid code point U+{code:X}"))
        })
    }

    fn escape_error(&self, at: usize, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Lexer, message.to_string())
            .with_span(SourceSpan::new(at, self.current))
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_blanks_and_comments();
            let start = self.current;
            let Some(ch) = self.bump() else {
                tokens.push(self.token(TokenKind::Eof, TokenValue::None, start));
                break;
            };

            let token = match ch {
                '0'..='9' => self.number_literal(start)?,
                '"' => self.string_literal(start)?,
                'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start),
                '+' => self.token(TokenKind::Plus, TokenValue::None, start),
                '-' => self.token(TokenKind::Minus, TokenValue::None, start),
                '*' => self.token(TokenKind::Star, TokenValue::None, start),
                '/' => self.token(TokenKind::Slash, TokenValue::None, start),
                '=' => self.token(TokenKind::Assign, TokenValue::None, start),
                '(' => self.token(TokenKind::LParen, TokenValue::None, start),
                ')' => self.token(TokenKind::RParen, TokenValue::None, start),
                ',' => self.token(TokenKind::Comma, TokenValue::None, start),
                '\n' => self.token(TokenKind::Newline, TokenValue::None, start),
                other => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lexer,
                        format!("unexpected character {other:?} at offset {start}"),
                    )
                    .with_span(SourceSpan::new(start, self.current)));
                }
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

pub fn keyword_for(ident: &str) -> Option<Keyword> {
    match ident {
        "let" => Some(Keyword::Let),
        "print" => Some(Keyword::Print),
        "use" => Some(Keyword::Use),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("source should lex")
            .into_iter()
            .map(|tok| tok.kind)
            .collect()
    }

    #[test]
    fn keywords_are_reclassified_identifiers() {
        assert_eq!(
            kinds("let letter = print"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newlines_survive_and_comments_vanish() {
        assert_eq!(
            kinds("1 # one\n\n2"),
            vec![
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decimal_point_decides_number_kind() {
        let tokens = tokenize("7 7.25").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Int(7));
        assert_eq!(tokens[1].value, TokenValue::Float(7.25));
    }

    #[test]
    fn oversized_float_literal_is_rejected() {
        let source = format!("print 1{}.0", "0".repeat(400));
        let err = tokenize(&source).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lexer);
        assert_eq!(err.span.map(|s| s.start), Some(6));
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let err = tokenize("3.").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lexer);
        assert_eq!(err.span, Some(SourceSpan::new(1, 2)));
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = tokenize(r#""a\tb\n\"q\" \x41é\u{1F600}\101""#).unwrap();
        assert_eq!(
            tokens[0].value,
            TokenValue::Text("a\tb\n\"q\" Aé\u{1F600}A".into())
        );
    }

    #[test]
    fn malformed_escape_is_lexical_error() {
        let err = tokenize(r#"print "bad \q""#).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lexer);
        assert_eq!(err.span.map(|s| s.start), Some(11));

        let err = tokenize(r#""\xZZ""#).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lexer);
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let err = tokenize("\"open").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn unknown_character_names_its_offset() {
        let err = tokenize("let a = 1 ; 2").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Lexer);
        assert_eq!(err.span, Some(SourceSpan::new(10, 11)));
        assert!(err.message.contains("';'"));
    }

    #[test]
    fn eof_is_always_last_and_unique() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].span, SourceSpan::new(0, 0));

        let tokens = tokenize("x\r\n").unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    #[test]
    fn integer_overflow_is_rejected() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(err.message.contains("out of range"));
    }
}

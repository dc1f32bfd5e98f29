use crate::{
    ast::{BinaryOp, Node, Number, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind},
    lexer::{self, Keyword, Token, TokenKind, TokenValue},
};

pub fn parse_source(source: &str) -> Result<Node, Diagnostic> {
    let tokens = lexer::tokenize(source)?;
    parse(tokens)
}

/// Parses a full token stream into a `Node::Block`.
pub fn parse(tokens: Vec<Token>) -> Result<Node, Diagnostic> {
    Parser::new(tokens)?.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Result<Self, Diagnostic> {
        if tokens.last().map(|tok| tok.kind) != Some(TokenKind::Eof) {
            return Err(Diagnostic::new(
                DiagnosticKind::Parser,
                "token stream is not terminated by end of input",
            ));
        }
        Ok(Self { tokens, current: 0 })
    }

    fn parse_program(&mut self) -> Result<Node, Diagnostic> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            if !self.check(TokenKind::Eof) {
                self.consume(TokenKind::Newline, "end of statement")?;
            }
            self.skip_newlines();
        }
        Ok(Node::Block(statements))
    }

    fn parse_statement(&mut self) -> Result<Node, Diagnostic> {
        if self.matches(TokenKind::Keyword(Keyword::Let)) {
            let name = self.consume_identifier("variable name after `let`")?;
            self.consume(TokenKind::Assign, "`=`")?;
            let value = self.parse_expression()?;
            Ok(Node::Let {
                name,
                value: Box::new(value),
            })
        } else if self.matches(TokenKind::Keyword(Keyword::Print)) {
            let value = self.parse_expression()?;
            Ok(Node::Print(Box::new(value)))
        } else if self.matches(TokenKind::Keyword(Keyword::Use)) {
            let name = self.consume_identifier("extension name after `use`")?;
            Ok(Node::Use(name))
        } else {
            let value = self.parse_expression()?;
            Ok(Node::Expression(Box::new(value)))
        }
    }

    fn parse_expression(&mut self) -> Result<Node, Diagnostic> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_multiplicative()?;
        while let Some(op) = if self.matches(TokenKind::Plus) {
            Some(BinaryOp::Add)
        } else if self.matches(TokenKind::Minus) {
            Some(BinaryOp::Sub)
        } else {
            None
        } {
            let right = self.parse_multiplicative()?;
            expr = Node::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, Diagnostic> {
        let mut expr = self.parse_unary()?;
        while let Some(op) = if self.matches(TokenKind::Star) {
            Some(BinaryOp::Mul)
        } else if self.matches(TokenKind::Slash) {
            Some(BinaryOp::Div)
        } else {
            None
        } {
            let right = self.parse_unary()?;
            expr = Node::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Node, Diagnostic> {
        let op = if self.matches(TokenKind::Plus) {
            UnaryOp::Plus
        } else if self.matches(TokenKind::Minus) {
            UnaryOp::Minus
        } else {
            return self.parse_primary();
        };
        let operand = self.parse_unary()?;
        Ok(Node::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Node, Diagnostic> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number => match token.value {
                TokenValue::Int(n) => Ok(Node::Number(Number::Int(n))),
                TokenValue::Float(n) => Ok(Node::Number(Number::Float(n))),
                _ => Err(self.error(&token, "number token without a numeric value")),
            },
            TokenKind::String => match token.value {
                TokenValue::Text(text) => Ok(Node::Text(text)),
                _ => Err(self.error(&token, "string token without a text value")),
            },
            TokenKind::Identifier => {
                let name = token.lexeme;
                if !self.matches(TokenKind::LParen) {
                    return Ok(Node::Variable(name));
                }
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    while self.matches(TokenKind::Comma) {
                        args.push(self.parse_expression()?);
                    }
                }
                self.consume(TokenKind::RParen, "`)` to close the argument list")?;
                Ok(Node::Call { name, args })
            }
            TokenKind::LParen => {
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            _ => Err(self.unexpected(&token, "an expression")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.matches(TokenKind::Newline) {}
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(self.peek(), expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, Diagnostic> {
        Ok(self.consume(TokenKind::Identifier, expected)?.lexeme)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Never moves past the final `Eof` token.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn unexpected(&self, token: &Token, expected: &str) -> Diagnostic {
        let found = match token.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::String => {
                format!("{} `{}`", token.kind, token.lexeme)
            }
            other => other.to_string(),
        };
        self.error(token, &format!("expected {expected}, found {found}"))
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parser, message.to_string())
            .with_span(token.span)
            .with_note(format!("at offset {}", token.position()))
    }
}

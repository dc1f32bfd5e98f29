use std::fmt;

use crate::value::format_float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Syntax tree produced by the parser. A program is always a `Block`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Vec<Node>),
    Let {
        name: String,
        value: Box<Node>,
    },
    Print(Box<Node>),
    Use(String),
    Expression(Box<Node>),
    Number(Number),
    Text(String),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
}

/// Renders source text that parses back into the same tree. Nested
/// operators are fully parenthesised.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Block(statements) => {
                for stmt in statements {
                    writeln!(f, "{stmt}")?;
                }
                Ok(())
            }
            Node::Let { name, value } => write!(f, "let {name} = {value}"),
            Node::Print(value) => write!(f, "print {value}"),
            Node::Use(name) => write!(f, "use {name}"),
            Node::Expression(value) => write!(f, "{value}"),
            Node::Number(Number::Int(n)) => write!(f, "{n}"),
            Node::Number(Number::Float(n)) => write!(f, "{}", format_float(*n)),
            Node::Text(text) => write_quoted(f, text),
            Node::Variable(name) => write!(f, "{name}"),
            Node::Unary { op, operand } => write!(f, "{}({operand})", op.symbol()),
            Node::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Node::Call { name, args } => {
                write!(f, "{name}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in text.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            ch if ch.is_control() => write!(f, "\\u{{{:x}}}", ch as u32)?,
            ch => write!(f, "{ch}")?,
        }
    }
    write!(f, "\"")
}

use pretty_assertions::assert_eq;
use vesper::{
    DiagnosticKind,
    ast::{BinaryOp, Node, Number, UnaryOp},
    lexer,
    parser::{parse, parse_source},
};

fn parse_ok(source: &str) -> Node {
    parse_source(source).expect("source should parse")
}

fn statements(source: &str) -> Vec<Node> {
    match parse_ok(source) {
        Node::Block(statements) => statements,
        other => panic!("expected block, found {other:?}"),
    }
}

fn int(n: i64) -> Box<Node> {
    Box::new(Node::Number(Number::Int(n)))
}

#[test]
fn precedence_shapes_the_tree() {
    assert_eq!(
        statements("2 + 3 * 4"),
        vec![Node::Expression(Box::new(Node::Binary {
            op: BinaryOp::Add,
            left: int(2),
            right: Box::new(Node::Binary {
                op: BinaryOp::Mul,
                left: int(3),
                right: int(4),
            }),
        }))]
    );
}

#[test]
fn unary_is_right_recursive() {
    assert_eq!(
        statements("- -5"),
        vec![Node::Expression(Box::new(Node::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(Node::Unary {
                op: UnaryOp::Minus,
                operand: int(5),
            }),
        }))]
    );
}

#[test]
fn statements_of_every_kind() {
    assert_eq!(
        statements("let x = 1\nprint x\nuse math\nsqrt(x, \"s\")\nf()\n"),
        vec![
            Node::Let {
                name: "x".into(),
                value: int(1),
            },
            Node::Print(Box::new(Node::Variable("x".into()))),
            Node::Use("math".into()),
            Node::Expression(Box::new(Node::Call {
                name: "sqrt".into(),
                args: vec![Node::Variable("x".into()), Node::Text("s".into())],
            })),
            Node::Expression(Box::new(Node::Call {
                name: "f".into(),
                args: vec![],
            })),
        ]
    );
}

#[test]
fn blank_lines_and_comments_are_skipped() {
    assert_eq!(
        statements("\n\n# heading\nprint 1 # trailing\n\n\nprint 2\n\n"),
        vec![Node::Print(int(1)), Node::Print(int(2))]
    );
}

#[test]
fn missing_token_reports_position_and_kind() {
    let err = parse_source("let = 3").unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Parser);
    assert_eq!(err.span.map(|s| s.start), Some(4));
    assert!(err.message.contains("expected variable name"));
    assert!(err.message.contains("found `=`"));
}

#[test]
fn two_statements_on_one_line_are_rejected() {
    let err = parse_source("print 1 2").unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Parser);
    assert_eq!(err.span.map(|s| s.start), Some(8));
}

#[test]
fn unclosed_call_is_rejected() {
    let err = parse_source("f(1, 2").unwrap_err();
    assert!(err.message.contains("found end of input"));
}

#[test]
fn keyword_cannot_be_a_variable() {
    let err = parse_source("let print = 1").unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Parser);
}

#[test]
fn parse_accepts_token_streams() {
    let tokens = lexer::tokenize("print 1").unwrap();
    assert_eq!(parse(tokens).unwrap(), Node::Block(vec![Node::Print(int(1))]));
    assert!(parse(Vec::new()).is_err());
}

#[test]
fn rendering_and_reparsing_is_stable() {
    let programs = [
        "2 + 3 * 4\n(2 + 3) * 4",
        "let x = - -5\nprint x / 2.0\n",
        "use math\nprint pow(2, 10) - -(1)\n",
        "print \"tab\\tquote\\\" back\\\\slash\\nnew\" + \"\\u{1}\"\n",
        "let big = 100000000000000000000.0\nprint big * 0.25 + 3.0",
        "f()\ng(1, (2 - 3) - 4, h(\"x\"))\n+7",
        "",
    ];
    for source in programs {
        let first = parse_ok(source);
        let rendered = first.to_string();
        let second = parse_source(&rendered)
            .unwrap_or_else(|err| panic!("rendered source failed to parse: {err}\n{rendered}"));
        assert_eq!(first, second, "round trip of {source:?}");
        assert_eq!(second.to_string(), rendered);
    }
}

#[test]
fn float_literal_beyond_f64_range_does_not_parse() {
    let source = format!("print 1{}.0", "0".repeat(400));
    let err = parse_source(&source).unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Lexer);
    assert_eq!(err.span.map(|s| s.start), Some(6));
}

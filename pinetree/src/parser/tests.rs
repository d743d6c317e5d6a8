//! Parser tests for PineTree syntax

use crate::ast::*;
use crate::lexer::tokenize;
use crate::parser::parse;

/// Helper to parse a PineTree program
fn parse_program(source: &str) -> crate::Result<Program> {
    let tokens = tokenize(source)?;
    parse("test.pt", source, tokens)
}

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Program {
    parse_program(source).expect("Parse should succeed")
}

/// Helper to check if parsing fails
fn parse_fails(source: &str) -> bool {
    parse_program(source).is_err()
}

/// Parse a single expression statement
fn parse_expr(source: &str) -> Expr {
    let prog = parse_ok(&format!("{source};"));
    match prog.nodes.into_iter().next().map(|n| n.node) {
        Some(Node::Stmt(Stmt::Expr(e))) => e.node,
        other => panic!("Expected expression statement, got {other:?}"),
    }
}

fn only_class(prog: &Program) -> &ClassDecl {
    match &prog.nodes[0].node {
        Node::Class(c) => c,
        other => panic!("Expected class, got {other:?}"),
    }
}

fn only_method(prog: &Program) -> &MethodDecl {
    match &prog.nodes[0].node {
        Node::Method(m) => m,
        other => panic!("Expected method, got {other:?}"),
    }
}

// ============================================
// Declarations
// ============================================

#[test]
fn test_parse_var_decl() {
    let prog = parse_ok("var x = 5;");
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::VarDecl { name, ty, value }) => {
            assert_eq!(name, "x");
            assert_eq!(*ty, None);
            assert_eq!(
                value.as_ref().map(|v| &v.node),
                Some(&Expr::Literal(Literal::Int(5)))
            );
        }
        other => panic!("Expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_typed_decl_without_value() {
    let prog = parse_ok("int count;");
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::VarDecl { name, ty, value }) => {
            assert_eq!(name, "count");
            assert_eq!(ty.as_deref(), Some("int"));
            assert!(value.is_none());
        }
        other => panic!("Expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_array_type_decl() {
    let prog = parse_ok("int[] xs = new int[3];");
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::VarDecl { ty, value, .. }) => {
            assert_eq!(ty.as_deref(), Some("array"));
            assert!(matches!(
                value.as_ref().map(|v| &v.node),
                Some(Expr::NewArray { element, .. }) if element == "int"
            ));
        }
        other => panic!("Expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_top_level_method() {
    let prog = parse_ok("int square(int n) { return n * n; }");
    let method = only_method(&prog);
    assert_eq!(method.name, "square");
    assert_eq!(method.return_type, "int");
    assert_eq!(
        method.params,
        vec![Param {
            name: "n".to_string(),
            ty: "int".to_string()
        }]
    );
    assert_eq!(method.body.stmts.len(), 1);
    assert!(!method.is_static);
}

#[test]
fn test_parse_preconditions() {
    let prog = parse_ok(
        r#"int root(int n) requires (n >= 0, "n must not be negative") requires (n < 100) { return n; }"#,
    );
    let method = only_method(&prog);
    assert_eq!(method.preconditions.len(), 2);
    assert_eq!(method.preconditions[0].message(), "n must not be negative");
    assert_eq!(method.preconditions[1].message(), "Precondition failed.");
}

#[test]
fn test_parse_modifiers_make_a_method() {
    let prog = parse_ok("private static void helper() { }");
    let method = only_method(&prog);
    assert_eq!(method.visibility, Visibility::Private);
    assert!(method.is_static);
    assert_eq!(method.return_type, "void");
}

#[test]
fn test_parse_class_members() {
    let source = r#"
        class Point extends Shape {
            int x = 0;
            private int y;
            static int created;
            Point(int x, int y) requires (x >= 0) { this.x = x; this.y = y; }
            int sum() { return x + y; }
            int Y { get { return y; } set { y = value; } }
            int Twice { get { return x * 2; } }
        }
    "#;
    let prog = parse_ok(source);
    let class = only_class(&prog);

    assert_eq!(class.name, "Point");
    assert_eq!(class.supertype.as_deref(), Some("Shape"));

    assert_eq!(class.fields.len(), 3);
    assert!(class.fields[0].value.is_some());
    assert_eq!(class.fields[1].visibility, Visibility::Private);
    assert!(class.fields[2].is_static);

    assert_eq!(class.constructors.len(), 1);
    assert_eq!(class.constructors[0].params.len(), 2);
    assert_eq!(class.constructors[0].preconditions.len(), 1);

    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name, "sum");

    assert_eq!(class.properties.len(), 2);
    assert!(class.properties[0].setter.is_some());
    assert!(class.properties[1].setter.is_none());
}

#[test]
fn test_parse_class_without_supertype() {
    let prog = parse_ok("class Empty { }");
    let class = only_class(&prog);
    assert_eq!(class.supertype, None);
    assert!(class.fields.is_empty());
    assert!(class.methods.is_empty());
}

#[test]
fn test_parse_node_order_is_kept() {
    let prog = parse_ok("var a = 1; class C { } int f() { return 1; } a = 2;");
    assert_eq!(prog.nodes.len(), 4);
    assert!(matches!(prog.nodes[0].node, Node::Stmt(Stmt::VarDecl { .. })));
    assert!(matches!(prog.nodes[1].node, Node::Class(_)));
    assert!(matches!(prog.nodes[2].node, Node::Method(_)));
    assert!(matches!(prog.nodes[3].node, Node::Stmt(Stmt::Expr(_))));
}

// ============================================
// Expressions
// ============================================

#[test]
fn test_parse_precedence() {
    match parse_expr("1 + 2 * 3") {
        Expr::Arithmetic {
            op: ArithOp::Add,
            right,
            ..
        } => assert!(matches!(
            right.node,
            Expr::Arithmetic {
                op: ArithOp::Multiply,
                ..
            }
        )),
        other => panic!("Expected addition, got {other:?}"),
    }
}

#[test]
fn test_parse_comparison_binds_looser_than_bitwise() {
    match parse_expr("a & 1 == 0") {
        Expr::Logical {
            op: LogicOp::Equals,
            left,
            ..
        } => assert!(matches!(left.node, Expr::Bitwise { op: BitOp::And, .. })),
        other => panic!("Expected comparison, got {other:?}"),
    }
}

#[test]
fn test_parse_word_connectives() {
    match parse_expr("a and b or c") {
        Expr::Logical {
            op: LogicOp::Or,
            left,
            ..
        } => assert!(matches!(left.node, Expr::Logical { op: LogicOp::And, .. })),
        other => panic!("Expected disjunction, got {other:?}"),
    }
}

#[test]
fn test_parse_negative_literals_fold() {
    assert_eq!(parse_expr("-5"), Expr::Literal(Literal::Int(-5)));
    assert_eq!(parse_expr("-2.5"), Expr::Literal(Literal::Float(-2.5)));
    assert!(matches!(
        parse_expr("-x"),
        Expr::Unary {
            op: UnaryOp::Negate,
            prefix: true,
            ..
        }
    ));
}

#[test]
fn test_parse_numeric_literal_forms() {
    assert_eq!(parse_expr("0x1F"), Expr::Literal(Literal::Int(31)));
    assert_eq!(parse_expr("0o17"), Expr::Literal(Literal::Int(15)));
    assert_eq!(parse_expr("1e3"), Expr::Literal(Literal::Float(1000.0)));
}

#[test]
fn test_parse_string_escapes() {
    assert_eq!(
        parse_expr(r#""a\tb\n""#),
        Expr::Literal(Literal::Str("a\tb\n".to_string()))
    );
}

#[test]
fn test_parse_postfix_increment() {
    assert!(matches!(
        parse_expr("i++"),
        Expr::Unary {
            op: UnaryOp::Increment,
            prefix: false,
            ..
        }
    ));
    assert!(matches!(
        parse_expr("--i"),
        Expr::Unary {
            op: UnaryOp::Decrement,
            prefix: true,
            ..
        }
    ));
}

#[test]
fn test_parse_chain() {
    match parse_expr("p.origin.move(1, 2).x") {
        Expr::Chain { root, segments } => {
            assert_eq!(root.node, Expr::Ident("p".to_string()));
            assert_eq!(segments.len(), 3);
            assert_eq!(segments[0].node, Segment::Field("origin".to_string()));
            assert!(matches!(&segments[1].node, Segment::Call(c) if c.name == "move" && c.args.len() == 2));
            assert_eq!(segments[2].node, Segment::Field("x".to_string()));
        }
        other => panic!("Expected chain, got {other:?}"),
    }
}

#[test]
fn test_parse_index_on_plain_and_chain() {
    assert!(matches!(parse_expr("xs[0]"), Expr::Index { .. }));
    match parse_expr("p.items[1]") {
        Expr::Chain { segments, .. } => {
            assert!(matches!(segments.last().map(|s| &s.node), Some(Segment::Index(_))));
        }
        other => panic!("Expected chain, got {other:?}"),
    }
}

#[test]
fn test_parse_new_instance() {
    match parse_expr("new Point(3, 4)") {
        Expr::New { ty, args } => {
            assert_eq!(ty, "Point");
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected New, got {other:?}"),
    }
}

#[test]
fn test_parse_unqualified_call() {
    match parse_expr("square(5)") {
        Expr::Call(call) => {
            assert_eq!(call.name, "square");
            assert_eq!(call.args.len(), 1);
        }
        other => panic!("Expected call, got {other:?}"),
    }
}

#[test]
fn test_parse_compound_assignment() {
    match parse_expr("total += 2") {
        Expr::Assign { target, op, .. } => {
            assert_eq!(op, AssignOp::Add);
            assert_eq!(target.node, Expr::Ident("total".to_string()));
        }
        other => panic!("Expected assignment, got {other:?}"),
    }
}

#[test]
fn test_parse_assignment_is_right_associative() {
    match parse_expr("a = b = 1") {
        Expr::Assign { value, .. } => assert!(matches!(value.node, Expr::Assign { .. })),
        other => panic!("Expected assignment, got {other:?}"),
    }
}

#[test]
fn test_parse_single_param_lambda() {
    match parse_expr("x => x + 1") {
        Expr::Lambda(lambda) => {
            assert_eq!(lambda.params.len(), 1);
            assert_eq!(lambda.params[0].ty, "var");
            assert!(matches!(lambda.body, LambdaBody::Expr(_)));
        }
        other => panic!("Expected lambda, got {other:?}"),
    }
}

#[test]
fn test_parse_parenthesized_lambda() {
    match parse_expr("(int a, b) => { return a + b; }") {
        Expr::Lambda(lambda) => {
            assert_eq!(lambda.params[0].ty, "int");
            assert_eq!(lambda.params[1].ty, "var");
            assert!(matches!(&lambda.body, LambdaBody::Block(b) if b.stmts.len() == 1));
        }
        other => panic!("Expected lambda, got {other:?}"),
    }
    assert!(matches!(parse_expr("() => 1"), Expr::Lambda(l) if l.params.is_empty()));
}

#[test]
fn test_parse_grouping_is_not_a_lambda() {
    assert!(matches!(
        parse_expr("(1 + 2) * 3"),
        Expr::Arithmetic {
            op: ArithOp::Multiply,
            ..
        }
    ));
}

// ============================================
// Statements
// ============================================

#[test]
fn test_parse_if_else() {
    let prog = parse_ok("if (x > 1) { y = 1; } else y = 2;");
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::If { body, else_body, .. }) => {
            assert!(matches!(body.node, Stmt::Block(_)));
            assert!(matches!(
                else_body.as_deref().map(|s| &s.node),
                Some(Stmt::Expr(_))
            ));
        }
        other => panic!("Expected if, got {other:?}"),
    }
}

#[test]
fn test_parse_for_loop() {
    let prog = parse_ok("for (var i = 0; i < 3; i++) { total += i; }");
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::For {
            init,
            predicate,
            increment,
            ..
        }) => {
            assert!(matches!(
                init.as_deref().map(|s| &s.node),
                Some(Stmt::VarDecl { .. })
            ));
            assert!(predicate.is_some());
            assert!(increment.is_some());
        }
        other => panic!("Expected for, got {other:?}"),
    }
}

#[test]
fn test_parse_for_with_empty_clauses() {
    let prog = parse_ok("for (;;) { return; }");
    assert!(matches!(
        &prog.nodes[0].node,
        Node::Stmt(Stmt::For {
            init: None,
            predicate: None,
            increment: None,
            ..
        })
    ));
}

#[test]
fn test_parse_try_catch() {
    let prog = parse_ok(r#"try { raise new Error("x"); } catch (e) { return e.message; }"#);
    match &prog.nodes[0].node {
        Node::Stmt(Stmt::Try { body, catch }) => {
            assert!(matches!(body.stmts[0].node, Stmt::Raise(_)));
            assert_eq!(catch.variable.as_deref(), Some("e"));
        }
        other => panic!("Expected try, got {other:?}"),
    }

    let prog = parse_ok("try { } catch { }");
    assert!(matches!(
        &prog.nodes[0].node,
        Node::Stmt(Stmt::Try { catch, .. }) if catch.variable.is_none()
    ));
}

#[test]
fn test_parse_import_path() {
    let prog = parse_ok("import util.math;");
    assert_eq!(
        prog.nodes[0].node,
        Node::Stmt(Stmt::Import("util.math".to_string()))
    );
}

#[test]
fn test_parse_empty_statement_and_block() {
    let prog = parse_ok("; { var a = 1; }");
    assert!(matches!(prog.nodes[0].node, Node::Stmt(Stmt::Empty)));
    assert!(matches!(&prog.nodes[1].node, Node::Stmt(Stmt::Block(b)) if b.stmts.len() == 1));
}

#[test]
fn test_parse_spans_cover_statement() {
    let prog = parse_ok("var x = 1;");
    assert_eq!(prog.nodes[0].span, Span::new(0, 10));
}

// ============================================
// Errors
// ============================================

#[test]
fn test_parse_invalid_assignment_target() {
    let err = parse_program("f() = 1;").unwrap_err();
    assert_eq!(err.message(), "invalid assignment target");
}

#[test]
fn test_parse_missing_semicolon() {
    let err = parse_program("var x = 1").unwrap_err();
    assert_eq!(err.message(), "expected ';', found end of input");
}

#[test]
fn test_parse_unexpected_token_message() {
    let err = parse_program("var = 1;").unwrap_err();
    assert!(err.message().starts_with("expected identifier, found"));
}

#[test]
fn test_parse_failures() {
    assert!(parse_fails("class { }"));
    assert!(parse_fails("class A { int x"));
    assert!(parse_fails("int f(int) { }"));
    assert!(parse_fails("class A { int P { set { } } }"));
    assert!(parse_fails("int f() requires (true, 5) { }"));
    assert!(parse_fails("1 +;"));
}

//! End-to-end tests: build a tree, compile, assemble and run it.

mod common;

use bumpalo::Bump;
use common::{output, run};
use fool::ast::Type;
use fool::{AstBuilder, BuildError, Error, RuntimeError, Session};
use pretty_assertions::assert_eq;

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn subtraction() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.sub(b.int(5), b.int(2))));
    assert_eq!(output(&arena, program), vec![3]);
}

#[test]
fn multiplication_by_negative() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.mul(b.int(1), b.int(-2))));
    assert_eq!(output(&arena, program), vec![-2]);
}

#[test]
fn integer_division_truncates() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.div(b.int(7), b.int(2))));
    assert_eq!(output(&arena, program), vec![3]);
}

#[test]
fn conjunction_and_disjunction() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.and(b.bool(true), b.bool(false))));
    assert_eq!(output(&arena, program), vec![0]);

    let program = b.program(&[], b.print(b.or(b.bool(false), b.bool(true))));
    assert_eq!(output(&arena, program), vec![1]);
}

#[test]
fn logical_operators_skip_the_right_operand() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.and(b.bool(false), b.print(b.bool(true)))));
    assert_eq!(output(&arena, program), vec![0]);

    let program = b.program(&[], b.print(b.or(b.bool(true), b.print(b.bool(false)))));
    assert_eq!(output(&arena, program), vec![1]);

    let program = b.program(&[], b.print(b.and(b.bool(true), b.print(b.bool(false)))));
    assert_eq!(output(&arena, program), vec![0, 0]);
}

#[test]
fn comparisons() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let cases = [
        (b.le(b.int(10), b.int(10)), 1),
        (b.le(b.int(11), b.int(10)), 0),
        (b.ge(b.int(-10), b.int(-20)), 1),
        (b.ge(b.int(4), b.int(4)), 1),
        (b.ge(b.int(3), b.int(4)), 0),
        (b.eq(b.int(2), b.int(2)), 1),
        (b.eq(b.bool(true), b.bool(false)), 0),
    ];
    for (expr, expected) in cases {
        let program = b.program(&[], b.print(expr));
        assert_eq!(output(&arena, program), vec![expected]);
    }
}

#[test]
fn negation() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.not(b.bool(false))));
    assert_eq!(output(&arena, program), vec![1]);

    let program = b.program(&[], b.print(b.not(b.le(b.int(1), b.int(2)))));
    assert_eq!(output(&arena, program), vec![0]);
}

#[test]
fn conditional_picks_branch() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(
        &[],
        b.print(b.if_else(b.eq(b.int(2), b.int(2)), b.int(10), b.int(20))),
    );
    assert_eq!(output(&arena, program), vec![10]);
}

#[test]
fn print_yields_its_argument() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.add(b.print(b.int(1)), b.print(b.int(2)))));
    assert_eq!(output(&arena, program), vec![1, 2, 3]);
}

// ============================================================================
// Declarations and functions
// ============================================================================

#[test]
fn variables_see_earlier_declarations() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(
        &[
            b.var("x", Type::Int, b.int(4)),
            b.var("y", Type::Int, b.mul(b.id("x"), b.id("x"))),
        ],
        b.print(b.add(b.id("y"), b.int(1))),
    );
    assert_eq!(output(&arena, program), vec![17]);
}

#[test]
fn recursive_factorial() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let fact = b.fun(
        "fact",
        vec![b.param("n", Type::Int)],
        Type::Int,
        &[],
        b.if_else(
            b.le(b.id("n"), b.int(1)),
            b.int(1),
            b.mul(b.id("n"), b.call("fact", &[b.sub(b.id("n"), b.int(1))])),
        ),
    );
    let program = b.program(&[fact], b.print(b.call("fact", &[b.int(5)])));
    assert_eq!(output(&arena, program), vec![120]);
}

#[test]
fn nested_function_walks_static_chain() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let inner = b.fun(
        "inner",
        vec![b.param("c", Type::Int)],
        Type::Int,
        &[],
        b.add(b.add(b.id("a"), b.id("c")), b.id("x")),
    );
    let outer = b.fun(
        "outer",
        vec![b.param("a", Type::Int)],
        Type::Int,
        &[inner],
        b.call("inner", &[b.int(1)]),
    );
    let program = b.program(
        &[b.var("x", Type::Int, b.int(10)), outer],
        b.print(b.call("outer", &[b.int(5)])),
    );
    assert_eq!(output(&arena, program), vec![16]);
}

#[test]
fn arguments_bind_in_declaration_order() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let minus = b.fun(
        "minus",
        vec![b.param("a", Type::Int), b.param("c", Type::Int)],
        Type::Int,
        &[b.var("d", Type::Int, b.sub(b.id("a"), b.id("c")))],
        b.id("d"),
    );
    let program = b.program(&[minus], b.print(b.call("minus", &[b.int(9), b.int(4)])));
    assert_eq!(output(&arena, program), vec![5]);
}

// ============================================================================
// Classes
// ============================================================================

/// `Account(balance)` and `Savings(balance, rate) extends Account`, with a
/// global `bonus` read from inside a method.
fn accounts<'ast>(b: &AstBuilder<'ast>) -> Vec<fool::ast::Decl<'ast>> {
    let account = b.class(
        "Account",
        None,
        vec![b.field("balance", Type::Int)],
        vec![
            b.method("getBalance", vec![], Type::Int, &[], b.id("balance")),
            b.method(
                "deposit",
                vec![b.param("amount", Type::Int)],
                Type::Int,
                &[],
                b.add(b.id("balance"), b.id("amount")),
            ),
            b.method(
                "twice",
                vec![],
                Type::Int,
                &[],
                b.add(b.call("getBalance", &[]), b.call("getBalance", &[])),
            ),
            b.method(
                "withBonus",
                vec![],
                Type::Int,
                &[],
                b.add(b.id("balance"), b.id("bonus")),
            ),
        ],
    );
    let savings = b.class(
        "Savings",
        Some("Account"),
        vec![b.field("rate", Type::Int)],
        vec![b.method(
            "getBalance",
            vec![],
            Type::Int,
            &[],
            b.mul(b.id("balance"), b.id("rate")),
        )],
    );
    vec![
        b.var("bonus", Type::Int, b.int(7)),
        account,
        savings,
        b.var(
            "plain",
            b.class_ref("Account"),
            b.new_object("Account", &[b.int(100)]),
        ),
        b.var(
            "saver",
            b.class_ref("Account"),
            b.new_object("Savings", &[b.int(100), b.int(2)]),
        ),
    ]
}

#[test]
fn methods_dispatch_on_the_object() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = accounts(&b);
    let program = b.program(
        &decls,
        b.add(
            b.print(b.method_call("plain", "getBalance", &[])),
            b.print(b.method_call("saver", "getBalance", &[])),
        ),
    );
    assert_eq!(output(&arena, program), vec![100, 200]);
}

#[test]
fn inherited_method_keeps_its_slot() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = accounts(&b);
    let program = b.program(
        &decls,
        b.print(b.method_call("saver", "deposit", &[b.int(5)])),
    );
    assert_eq!(output(&arena, program), vec![105]);
}

#[test]
fn sibling_call_inside_method_is_dynamic() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = accounts(&b);
    let program = b.program(
        &decls,
        b.add(
            b.print(b.method_call("plain", "twice", &[])),
            b.print(b.method_call("saver", "twice", &[])),
        ),
    );
    assert_eq!(output(&arena, program), vec![200, 400]);
}

#[test]
fn method_reads_global_variable() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = accounts(&b);
    let program = b.program(&decls, b.print(b.method_call("saver", "withBonus", &[])));
    assert_eq!(output(&arena, program), vec![107]);
}

#[test]
fn null_compares_equal_to_unset_reference() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut decls = accounts(&b);
    decls.push(b.var("nobody", b.class_ref("Account"), b.null()));
    let program = b.program(
        &decls,
        b.print(b.if_else(b.eq(b.id("nobody"), b.null()), b.int(1), b.int(0))),
    );
    assert_eq!(output(&arena, program), vec![1]);
}

// ============================================================================
// Rejections and faults
// ============================================================================

#[test]
fn type_errors_block_code_generation() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.if_else(b.int(1), b.int(2), b.int(3))));

    let Err(Error::Build(error)) = run(&arena, program) else {
        panic!("expected a build error");
    };
    assert_eq!(error.errors().len(), 1);
    assert!(error.errors()[0].is_type_error());
}

#[test]
fn link_errors_block_code_generation() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.call("nowhere", &[])));

    let Err(Error::Build(error)) = run(&arena, program) else {
        panic!("expected a build error");
    };
    assert!(error.errors().iter().all(|e| e.is_link_error()));
}

#[test]
fn wrong_arity_is_rejected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let f = b.fun(
        "f",
        vec![b.param("a", Type::Int), b.param("c", Type::Int)],
        Type::Int,
        &[],
        b.id("a"),
    );

    for args in [vec![b.int(1)], vec![b.int(1), b.int(2), b.int(3)]] {
        let program = b.program(&[f], b.call("f", &args));
        let Err(Error::Build(BuildError::Rejected { errors })) = run(&arena, program) else {
            panic!("expected a rejected program");
        };
        assert!(errors[0].is_type_error());
    }
}

#[test]
fn unrelated_branches_are_rejected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = [
        b.class("Rock", None, vec![], vec![]),
        b.class("Tree", None, vec![], vec![]),
    ];
    let program = b.program(
        &decls,
        b.if_else(
            b.bool(true),
            b.new_object("Rock", &[]),
            b.new_object("Tree", &[]),
        ),
    );
    assert!(matches!(
        run(&arena, program),
        Err(Error::Build(BuildError::Rejected { .. }))
    ));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], b.print(b.div(b.int(1), b.int(0))));
    assert!(matches!(
        run(&arena, program),
        Err(Error::Runtime(RuntimeError::DivisionByZero { .. }))
    ));
}

#[test]
fn generated_text_reassembles_to_the_same_code() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let decls = accounts(&b);
    let program = b.program(&decls, b.print(b.method_call("saver", "twice", &[])));

    let session = Session::default();
    let compiled = session.compile(&arena, program).unwrap();
    assert_eq!(
        fool::assemble(&compiled.assembly, session.options().code_size).unwrap(),
        compiled.code
    );
    assert_eq!(session.run(compiled.code).unwrap(), vec![400]);
}

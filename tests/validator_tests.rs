// Integration tests for scope and type-name validation

use finch::config::{ColorChoice, Config, ShadowingPolicy};
use finch::diagnostic::{Diagnostic, Emitter, IntoDiagnostics, Severity, TerminalEmitter};
use finch::frontend::{check, check_and_emit, CompileError};
use finch::parser::ast::{FunctionBody, Statement};
use finch::parser::parse_module;
use finch::semantics::{validate_module, Binding, SemanticError};
use pretty_assertions::assert_eq;

fn config(shadowing: ShadowingPolicy) -> Config {
    Config {
        shadowing,
        color: ColorChoice::Never,
        ..Config::default()
    }
}

fn errors(source: &str, shadowing: ShadowingPolicy) -> Vec<SemanticError> {
    let module = parse_module("test.fn", source).expect("parsing failed");
    match validate_module(&module, &config(shadowing)) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    }
}

fn messages(source: &str, shadowing: ShadowingPolicy) -> Vec<String> {
    errors(source, shadowing).iter().map(|e| e.to_string()).collect()
}

#[test]
fn test_duplicate_parameter_points_at_both() {
    let mut collected: Vec<Diagnostic> = Vec::new();
    let result = check_and_emit(
        "dup.fn",
        "func f(x: i32, x: i32) {}",
        &config(ShadowingPolicy::Body),
        &mut collected,
    );

    assert!(result.is_none());
    let rendered: Vec<String> = collected.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "dup.fn:1:16: error: parameter 'x' is previously declared in function 'f'",
            "dup.fn:1:8: note: previous declaration is here",
        ]
    );
}

#[test]
fn test_body_variable_may_not_reuse_parameter() {
    assert_eq!(
        messages("func f(x: i32) { var x = 1; }", ShadowingPolicy::Body),
        vec!["'x' is previously declared as a parameter in function 'f'"]
    );
}

#[test]
fn test_nested_block_shadowing_depends_on_policy() {
    let source = "func f(x: i32) { var a = 1; { var x = 2; var a = 3; } }";

    assert!(errors(source, ShadowingPolicy::Body).is_empty());
    assert_eq!(
        messages(source, ShadowingPolicy::Strict),
        vec!["'x' is previously declared as a parameter in function 'f'"]
    );

    let source = "func f() { var a = 1; loop { var a = 2; break; } }";
    assert!(errors(source, ShadowingPolicy::Body).is_empty());
    assert_eq!(
        messages(source, ShadowingPolicy::Strict),
        vec!["'a' is previously declared as a variable in an enclosing scope"]
    );
}

#[test]
fn test_duplicate_in_same_block() {
    for policy in [ShadowingPolicy::Body, ShadowingPolicy::Strict] {
        assert_eq!(
            messages("func f() { { var a = 1; var a = 2; } }", policy),
            vec!["'a' is previously declared as a variable in same scope"]
        );
    }
}

#[test]
fn test_sibling_blocks_are_independent() {
    let source = "func f() { { var a = 1; } { var a = 2; } }";
    assert!(errors(source, ShadowingPolicy::Strict).is_empty());
}

#[test]
fn test_unknown_type() {
    let errors = errors("func f(x: Bogus) {}", ShadowingPolicy::Body);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "'Bogus' is not an imported or locally defined type");
    assert_eq!(errors[0].location().line, 1);
    assert_eq!(errors[0].note(), None);
}

#[test]
fn test_user_types_resolve_in_any_order() {
    let source = "
        func first(n: *Node): i32 => 0
        type Node struct { next: *Node, value: Value }
        type Value enum { small: u8, large: u64 }
    ";
    assert!(errors(source, ShadowingPolicy::Body).is_empty());
}

#[test]
fn test_recursive_type_by_value() {
    let errors = errors("type Node struct { next: Node }", ShadowingPolicy::Body);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SemanticError::RecursiveType { type_name, member, .. }
        if type_name == "Node" && member == "next"));
}

#[test]
fn test_misc_scope_errors() {
    assert_eq!(
        messages("func f() { y; }", ShadowingPolicy::Body),
        vec!["'y' is not declared in this scope"]
    );
    assert_eq!(
        messages("func f() { break; }", ShadowingPolicy::Body),
        vec!["'break' outside of a loop"]
    );
    assert_eq!(
        messages("func f() { var x = 1; x = 2; }", ShadowingPolicy::Body),
        vec!["cannot assign to 'x' because it is not declared 'mut'"]
    );
    assert_eq!(
        messages("func f() { var s = \"text\"; }", ShadowingPolicy::Body),
        vec!["type of 's' cannot be inferred; add a type annotation"]
    );
}

#[test]
fn test_analysis_bindings_and_types() {
    let source = "func double(n: i32): i32 => n * 2\nfunc main() { var mut total = double(21); total += 1; }";
    // Calls have no type to infer from
    let err = check("test.fn", source, &Config::default()).unwrap_err();
    assert!(matches!(err, CompileError::Semantic(ref errors) if errors.len() == 1));

    let source = "func double(n: i32): i32 => n * 2\nfunc main() { var mut total: i64 = double(21); total += 1; }";
    let checked = check("test.fn", source, &Config::default()).unwrap();
    let module = &checked.module;
    let analysis = &checked.analysis;

    let FunctionBody::Block(body) = &module.functions[1].body else {
        panic!("expected block body");
    };
    let Statement::Declaration { declaration, .. } = &body.statements[0] else {
        panic!("expected declaration");
    };
    let ty = analysis.declaration_type(*declaration).unwrap();
    assert_eq!(ty.display(module).to_string(), "i64");

    let parameter = module.functions[0].parameters[0];
    assert_eq!(
        analysis.declaration_type(parameter).map(|t| t.display(module).to_string()),
        Some("i32".to_string())
    );

    // n, double, total
    assert_eq!(analysis.binding_count(), 3);
    assert!(analysis.context().function("double").is_some());
    let Statement::Assignment(assignment) = &body.statements[1] else {
        panic!("expected assignment");
    };
    let finch::parser::ast::Expression::Symbol(target) = &assignment.lhs else {
        panic!("expected symbol target");
    };
    assert_eq!(analysis.binding(target), Some(Binding::Declaration(*declaration)));
}

#[test]
fn test_literal_inference() {
    let source = "func f() { var a = 1; var b = 0xff; var c = 1.5; var d = 'x'; var e = -(2); }";
    let checked = check("test.fn", source, &Config::default()).unwrap();
    let module = &checked.module;

    let names: Vec<String> = module
        .declarations
        .iter()
        .map(|d| checked.analysis.declaration_type(d.id).unwrap().display(module).to_string())
        .collect();
    assert_eq!(names, vec!["{integer}", "{unsigned integer}", "{float}", "char", "{integer}"]);
}

#[test]
fn test_terminal_output_end_to_end() {
    let mut emitter = TerminalEmitter::new(Vec::new(), false);
    let result = check_and_emit(
        "main.fn",
        "func f() {\n    var x: Bogus = 1;\n}",
        &Config::default(),
        &mut emitter,
    );
    assert!(result.is_none());

    let output = String::from_utf8(emitter.into_inner()).unwrap();
    assert_eq!(
        output,
        "main.fn:2:12: error: 'Bogus' is not an imported or locally defined type\n"
    );
}

#[test]
fn test_compile_error_diagnostics() {
    let err = check("a.fn", "func f() { 3 = 4; }", &Config::default()).unwrap_err();
    let diagnostics = err.to_diagnostics("a.fn");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].column, 12);

    let mut collected: Vec<Diagnostic> = Vec::new();
    collected.emit_all(&diagnostics);
    assert_eq!(collected, diagnostics);
}

#[test]
fn test_function_name_is_not_an_assignment_target() {
    let sources = [
        "func g(): i32 => 1 func f() { g = 5; }",
        "func g(): i32 => 1 func f() { g += 1; }",
        "func g(): i32 => 1 func f() { ++g; }",
    ];
    for source in sources {
        let found = errors(source, ShadowingPolicy::Body);
        assert_eq!(found.len(), 1, "{source}");
        assert_eq!(found[0].to_string(), "cannot assign to 'g' because it is a function");

        let diagnostics = found[0].to_diagnostics("test.fn");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[1].severity, Severity::Note);
        assert_eq!(diagnostics[1].message, "function is defined here");
        assert_eq!((diagnostics[1].line, diagnostics[1].column), (1, 6));
    }

    // Reading a function's name is still fine
    assert!(errors("func g(): i32 => 1 func f() { g; }", ShadowingPolicy::Body).is_empty());
}

#[test]
fn test_body_duplicate_names_the_function() {
    assert_eq!(
        messages("func main() { var a = 1; var a = 2; }", ShadowingPolicy::Body),
        vec!["'a' is previously declared as a variable in function 'main'"]
    );
    assert_eq!(
        messages("func main() { { var a = 1; var a = 2; } }", ShadowingPolicy::Body),
        vec!["'a' is previously declared as a variable in same scope"]
    );
}

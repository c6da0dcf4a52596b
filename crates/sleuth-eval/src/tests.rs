//! End-to-end interpreter tests over deserialized ESTree programs.

use ecow::EcoString;
use serde_json::{Value as Json, json};
use sleuth_library::checker::{CheckSite, Checker, SiteCallee, Status};
use sleuth_library::diag::Exception;
use sleuth_library::foundations::{Object, Value};
use sleuth_library::host::{self, DomApiChecker};
use sleuth_syntax::ast;

use crate::{Vm, eval};

fn program(body: Vec<Json>) -> ast::Program {
    serde_json::from_value(json!({"type": "Program", "body": body})).unwrap()
}

fn run_vm(vm: &mut Vm, body: Vec<Json>) -> Result<Value, Exception> {
    eval(&program(body), vm)
}

/// Run a program against a fresh browser context with no checker and assert
/// the machine ends quiescent.
#[track_caller]
fn run(body: Vec<Json>) -> Value {
    let mut vm = Vm::new(host::browser(), &(), "test.js");
    let output = run_vm(&mut vm, body).unwrap();
    assert!(!vm.flow.interrupted(), "a control-flow signal survived the run");
    assert!(!vm.check_flag, "the check flag survived the run");
    output
}

#[track_caller]
fn run_err(body: Vec<Json>) -> Exception {
    let mut vm = Vm::new(host::browser(), &(), "test.js");
    run_vm(&mut vm, body).unwrap_err()
}

fn items(value: &Value) -> Vec<Value> {
    value.as_object().and_then(Object::items).expect("expected an array")
}

// Node builders, in rough ESTree spelling.

fn stmt(expression: Json) -> Json {
    json!({"type": "ExpressionStatement", "expression": expression})
}

fn ident(name: &str) -> Json {
    json!({"type": "Identifier", "name": name})
}

fn num(n: f64) -> Json {
    json!({"type": "Literal", "value": n})
}

fn string(s: &str) -> Json {
    json!({"type": "Literal", "value": s, "raw": format!("'{s}'")})
}

fn boolean(b: bool) -> Json {
    json!({"type": "Literal", "value": b})
}

fn array(elements: Vec<Json>) -> Json {
    json!({"type": "ArrayExpression", "elements": elements})
}

fn object(props: Vec<(&str, Json)>) -> Json {
    let properties: Vec<Json> = props
        .into_iter()
        .map(|(key, value)| {
            json!({
                "type": "Property",
                "key": ident(key),
                "value": value,
                "kind": "init",
            })
        })
        .collect();
    json!({"type": "ObjectExpression", "properties": properties})
}

fn var(name: &str, init: Json) -> Json {
    json!({
        "type": "VariableDeclaration",
        "kind": "var",
        "declarations": [{
            "type": "VariableDeclarator",
            "id": ident(name),
            "init": init,
        }],
    })
}

fn var_names(declarators: Vec<(&str, Option<Json>)>) -> Json {
    let declarations: Vec<Json> = declarators
        .into_iter()
        .map(|(name, init)| {
            json!({
                "type": "VariableDeclarator",
                "id": ident(name),
                "init": init,
            })
        })
        .collect();
    json!({
        "type": "VariableDeclaration",
        "kind": "var",
        "declarations": declarations,
    })
}

fn binary(op: &str, left: Json, right: Json) -> Json {
    json!({"type": "BinaryExpression", "operator": op, "left": left, "right": right})
}

fn logical(op: &str, left: Json, right: Json) -> Json {
    json!({"type": "LogicalExpression", "operator": op, "left": left, "right": right})
}

fn unary(op: &str, argument: Json) -> Json {
    json!({"type": "UnaryExpression", "operator": op, "argument": argument})
}

fn update(op: &str, argument: Json, prefix: bool) -> Json {
    json!({
        "type": "UpdateExpression",
        "operator": op,
        "argument": argument,
        "prefix": prefix,
    })
}

fn assign(op: &str, left: Json, right: Json) -> Json {
    json!({
        "type": "AssignmentExpression",
        "operator": op,
        "left": left,
        "right": right,
    })
}

fn member(object: Json, property: &str) -> Json {
    json!({
        "type": "MemberExpression",
        "object": object,
        "property": ident(property),
        "computed": false,
    })
}

fn index(object: Json, property: Json) -> Json {
    json!({
        "type": "MemberExpression",
        "object": object,
        "property": property,
        "computed": true,
    })
}

fn call(callee: Json, arguments: Vec<Json>) -> Json {
    json!({"type": "CallExpression", "callee": callee, "arguments": arguments})
}

fn method(object: Json, name: &str, arguments: Vec<Json>) -> Json {
    call(member(object, name), arguments)
}

fn new_expr(callee: Json, arguments: Vec<Json>) -> Json {
    json!({"type": "NewExpression", "callee": callee, "arguments": arguments})
}

fn function(id: Option<&str>, params: Vec<&str>, body: Vec<Json>) -> Json {
    json!({
        "id": id.map(ident),
        "params": params.into_iter().map(ident).collect::<Vec<_>>(),
        "body": {"type": "BlockStatement", "body": body},
    })
}

fn func_expr(id: Option<&str>, params: Vec<&str>, body: Vec<Json>) -> Json {
    let mut node = function(id, params, body);
    node["type"] = json!("FunctionExpression");
    node
}

fn func_decl(id: &str, params: Vec<&str>, body: Vec<Json>) -> Json {
    let mut node = function(Some(id), params, body);
    node["type"] = json!("FunctionDeclaration");
    node
}

fn ret(argument: Json) -> Json {
    json!({"type": "ReturnStatement", "argument": argument})
}

fn block(body: Vec<Json>) -> Json {
    json!({"type": "BlockStatement", "body": body})
}

fn if_stmt(test: Json, consequent: Json, alternate: Option<Json>) -> Json {
    json!({
        "type": "IfStatement",
        "test": test,
        "consequent": consequent,
        "alternate": alternate,
    })
}

fn while_stmt(test: Json, body: Json) -> Json {
    json!({"type": "WhileStatement", "test": test, "body": body})
}

fn do_while(body: Json, test: Json) -> Json {
    json!({"type": "DoWhileStatement", "body": body, "test": test})
}

fn for_stmt(init: Json, test: Json, update: Json, body: Json) -> Json {
    json!({
        "type": "ForStatement",
        "init": init,
        "test": test,
        "update": update,
        "body": body,
    })
}

fn for_in(left: Json, right: Json, body: Json) -> Json {
    json!({"type": "ForInStatement", "left": left, "right": right, "body": body})
}

fn labeled(label: &str, body: Json) -> Json {
    json!({"type": "LabeledStatement", "label": ident(label), "body": body})
}

fn brk(label: Option<&str>) -> Json {
    json!({"type": "BreakStatement", "label": label.map(ident)})
}

fn cont(label: Option<&str>) -> Json {
    json!({"type": "ContinueStatement", "label": label.map(ident)})
}

fn switch(discriminant: Json, cases: Vec<(Option<Json>, Vec<Json>)>) -> Json {
    let cases: Vec<Json> = cases
        .into_iter()
        .map(|(test, consequent)| {
            json!({"type": "SwitchCase", "test": test, "consequent": consequent})
        })
        .collect();
    json!({"type": "SwitchStatement", "discriminant": discriminant, "cases": cases})
}

fn throw(argument: Json) -> Json {
    json!({"type": "ThrowStatement", "argument": argument})
}

fn try_stmt(
    body: Vec<Json>,
    handler: Option<(&str, Vec<Json>)>,
    finalizer: Option<Vec<Json>>,
) -> Json {
    json!({
        "type": "TryStatement",
        "block": block(body),
        "handler": handler.map(|(param, body)| json!({
            "type": "CatchClause",
            "param": ident(param),
            "body": block(body),
        })),
        "finalizer": finalizer.map(block),
    })
}

#[test]
fn test_var_and_compound_assignment() {
    let output = run(vec![
        var("a", num(1.0)),
        stmt(assign("+=", ident("a"), num(2.0))),
        stmt(ident("a")),
    ]);
    assert_eq!(output, Value::Num(3.0));
}

#[test]
fn test_function_declaration_and_call() {
    let output = run(vec![
        func_decl("f", vec!["x"], vec![ret(binary("*", ident("x"), ident("x")))]),
        stmt(call(ident("f"), vec![num(5.0)])),
    ]);
    assert_eq!(output, Value::Num(25.0));
}

#[test]
fn test_for_loop_accumulates() {
    let output = run(vec![
        for_stmt(
            var_names(vec![("i", Some(num(0.0))), ("s", Some(num(0.0)))]),
            binary("<", ident("i"), num(3.0)),
            update("++", ident("i"), false),
            stmt(assign("+=", ident("s"), ident("i"))),
        ),
        stmt(ident("s")),
    ]);
    assert_eq!(output, Value::Num(3.0));
}

#[test]
fn test_labeled_break_leaves_both_counters_visible() {
    // outer: for (var i = 0; i < 3; i++)
    //     for (var j = 0; j < 3; j++)
    //         if (j === 1) break outer;
    // [i, j]
    let output = run(vec![
        labeled(
            "outer",
            for_stmt(
                var("i", num(0.0)),
                binary("<", ident("i"), num(3.0)),
                update("++", ident("i"), false),
                for_stmt(
                    var("j", num(0.0)),
                    binary("<", ident("j"), num(3.0)),
                    update("++", ident("j"), false),
                    if_stmt(
                        binary("===", ident("j"), num(1.0)),
                        brk(Some("outer")),
                        None,
                    ),
                ),
            ),
        ),
        stmt(array(vec![ident("i"), ident("j")])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(0.0), Value::Num(1.0)]);
}

#[test]
fn test_labeled_continue_skips_inner_iterations() {
    let output = run(vec![
        var("n", num(0.0)),
        labeled(
            "outer",
            for_stmt(
                var("i", num(0.0)),
                binary("<", ident("i"), num(3.0)),
                update("++", ident("i"), false),
                for_stmt(
                    var("j", num(0.0)),
                    binary("<", ident("j"), num(3.0)),
                    update("++", ident("j"), false),
                    block(vec![
                        cont(Some("outer")),
                        stmt(assign("+=", ident("n"), num(1.0))),
                    ]),
                ),
            ),
        ),
        stmt(array(vec![ident("i"), ident("n")])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(3.0), Value::Num(0.0)]);
}

#[test]
fn test_named_function_expression_sees_itself() {
    let output = run(vec![
        var(
            "f",
            func_expr(
                Some("fact"),
                vec!["n"],
                vec![ret(json!({
                    "type": "ConditionalExpression",
                    "test": binary("<", ident("n"), num(2.0)),
                    "consequent": num(1.0),
                    "alternate": binary(
                        "*",
                        ident("n"),
                        call(ident("fact"), vec![binary("-", ident("n"), num(1.0))]),
                    ),
                }))],
            ),
        ),
        // The expression's own name leaks nowhere else.
        stmt(array(vec![
            call(ident("f"), vec![num(5.0)]),
            unary("typeof", ident("fact")),
        ])),
    ]);
    assert_eq!(
        items(&output),
        vec![Value::Num(120.0), Value::Str("undefined".into())],
    );
}

#[test]
fn test_return_is_contained_by_each_function() {
    // (function f() { return (function() { return 7 })() })()
    let output = run(vec![stmt(call(
        func_expr(
            Some("f"),
            vec![],
            vec![ret(call(func_expr(None, vec![], vec![ret(num(7.0))]), vec![]))],
        ),
        vec![],
    ))]);
    assert_eq!(output, Value::Num(7.0));
}

#[test]
fn test_hoisting_makes_names_visible_early() {
    // var r = f(); function f() { return x === undefined } var x = 1;
    let output = run(vec![
        var("r", call(ident("f"), vec![])),
        func_decl(
            "f",
            vec![],
            vec![ret(binary("===", ident("x"), ident("undefined")))],
        ),
        var("x", num(1.0)),
        stmt(ident("r")),
    ]);
    assert_eq!(output, Value::Bool(true));
}

#[test]
fn test_closures_share_their_captured_frames() {
    // var make = function() { var n = 0; return function() { n += 1; return n } };
    // var c = make(); c(); c()
    let output = run(vec![
        var(
            "make",
            func_expr(
                None,
                vec![],
                vec![
                    var("n", num(0.0)),
                    ret(func_expr(
                        None,
                        vec![],
                        vec![
                            stmt(assign("+=", ident("n"), num(1.0))),
                            ret(ident("n")),
                        ],
                    )),
                ],
            ),
        ),
        var("c", call(ident("make"), vec![])),
        stmt(call(ident("c"), vec![])),
        stmt(call(ident("c"), vec![])),
    ]);
    assert_eq!(output, Value::Num(2.0));
}

#[test]
fn test_try_catch_binds_the_error() {
    let output = run(vec![
        var("r", json!({"type": "Literal", "value": null})),
        try_stmt(
            vec![throw(string("boom"))],
            Some(("e", vec![stmt(assign("=", ident("r"), ident("e")))])),
            None,
        ),
        stmt(ident("r")),
    ]);
    assert_eq!(output, Value::Str("boom".into()));
}

#[test]
fn test_finally_overwrites_the_returned_value() {
    let output = run(vec![
        func_decl(
            "f",
            vec![],
            vec![try_stmt(vec![ret(num(1.0))], None, Some(vec![ret(num(2.0))]))],
        ),
        stmt(call(ident("f"), vec![])),
    ]);
    assert_eq!(output, Value::Num(2.0));
}

#[test]
fn test_uncaught_throw_propagates() {
    let error = run_err(vec![stmt(call(
        func_expr(None, vec![], vec![throw(string("kaput"))]),
        vec![],
    ))]);
    assert!(matches!(error, Exception::Thrown(Value::Str(s)) if s == "kaput"));
}

#[test]
fn test_environment_restored_after_throwing_call() {
    let output = run(vec![
        var("a", num(1.0)),
        func_decl("f", vec![], vec![var("a", num(99.0)), throw(string("x"))]),
        try_stmt(
            vec![stmt(call(ident("f"), vec![]))],
            Some(("e", vec![])),
            None,
        ),
        stmt(ident("a")),
    ]);
    assert_eq!(output, Value::Num(1.0));
}

#[test]
fn test_switch_falls_through_until_break() {
    let output = run(vec![
        var("r", string("")),
        switch(
            num(2.0),
            vec![
                (
                    Some(num(1.0)),
                    vec![stmt(assign("+=", ident("r"), string("a")))],
                ),
                (
                    Some(num(2.0)),
                    vec![stmt(assign("+=", ident("r"), string("b")))],
                ),
                (
                    Some(num(3.0)),
                    vec![stmt(assign("+=", ident("r"), string("c"))), brk(None)],
                ),
                (None, vec![stmt(assign("+=", ident("r"), string("d")))]),
            ],
        ),
        stmt(ident("r")),
    ]);
    assert_eq!(output, Value::Str("bc".into()));
}

#[test]
fn test_switch_inside_loop_keeps_the_loop_running() {
    let output = run(vec![
        var("n", num(0.0)),
        for_stmt(
            var("i", num(0.0)),
            binary("<", ident("i"), num(3.0)),
            update("++", ident("i"), false),
            switch(
                ident("i"),
                vec![
                    (Some(num(1.0)), vec![brk(None)]),
                    (None, vec![stmt(assign("+=", ident("n"), num(1.0)))]),
                ],
            ),
        ),
        stmt(ident("n")),
    ]);
    assert_eq!(output, Value::Num(2.0));
}

#[test]
fn test_for_in_visits_keys_in_host_order() {
    let output = run(vec![
        var("o", object(vec![("a", num(1.0)), ("b", num(2.0))])),
        var("r", string("")),
        for_in(var("k", json!(null)), ident("o"), stmt(assign("+=", ident("r"), ident("k")))),
        for_in(
            ident("k"),
            array(vec![num(10.0), num(20.0)]),
            stmt(assign("+=", ident("r"), ident("k"))),
        ),
        stmt(ident("r")),
    ]);
    assert_eq!(output, Value::Str("ab01".into()));
}

#[test]
fn test_short_circuit_is_observable() {
    let output = run(vec![
        var("calls", num(0.0)),
        func_decl(
            "t",
            vec![],
            vec![
                stmt(assign("+=", ident("calls"), num(1.0))),
                ret(boolean(true)),
            ],
        ),
        stmt(logical("&&", boolean(false), call(ident("t"), vec![]))),
        stmt(logical("||", boolean(true), call(ident("t"), vec![]))),
        var("before", ident("calls")),
        stmt(logical("&&", boolean(true), call(ident("t"), vec![]))),
        stmt(array(vec![ident("before"), ident("calls")])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(0.0), Value::Num(1.0)]);
}

#[test]
fn test_update_expressions_return_old_and_new() {
    let output = run(vec![
        var("i", num(5.0)),
        var("a", update("++", ident("i"), false)),
        var("b", update("++", ident("i"), true)),
        stmt(array(vec![ident("a"), ident("b"), ident("i")])),
    ]);
    assert_eq!(
        items(&output),
        vec![Value::Num(5.0), Value::Num(7.0), Value::Num(7.0)],
    );
}

#[test]
fn test_reference_roundtrip() {
    let output = run(vec![
        var("x", object(vec![])),
        stmt(assign("=", member(ident("x"), "y"), num(42.0))),
        stmt(member(ident("x"), "y")),
    ]);
    assert_eq!(output, Value::Num(42.0));
}

#[test]
fn test_delete_member_and_context_binding() {
    let output = run(vec![
        var("o", object(vec![("a", num(1.0))])),
        stmt(unary("delete", member(ident("o"), "a"))),
        // An undeclared assignment lands on the context...
        stmt(assign("=", ident("leaked"), num(5.0))),
        var("had", binary("in", string("leaked"), json!({"type": "ThisExpression"}))),
        // ...and deleting the bare name removes it again.
        stmt(unary("delete", ident("leaked"))),
        stmt(array(vec![
            binary("in", string("a"), ident("o")),
            ident("had"),
            binary("in", string("leaked"), json!({"type": "ThisExpression"})),
        ])),
    ]);
    assert_eq!(
        items(&output),
        vec![Value::Bool(false), Value::Bool(true), Value::Bool(false)],
    );
}

#[test]
fn test_this_and_arguments() {
    let output = run(vec![
        var(
            "o",
            object(vec![
                ("x", num(42.0)),
                (
                    "get",
                    func_expr(None, vec![], vec![ret(member(
                        json!({"type": "ThisExpression"}),
                        "x",
                    ))]),
                ),
            ]),
        ),
        func_decl(
            "spread",
            vec![],
            vec![ret(binary(
                "+",
                member(ident("arguments"), "length"),
                index(ident("arguments"), num(0.0)),
            ))],
        ),
        stmt(array(vec![
            method(ident("o"), "get", vec![]),
            call(ident("spread"), vec![num(7.0), num(8.0)]),
        ])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(42.0), Value::Num(9.0)]);
}

#[test]
fn test_plain_call_receiver_falls_back_to_context() {
    // function g() { return this === window } g()
    let output = run(vec![
        func_decl(
            "g",
            vec![],
            vec![ret(binary(
                "===",
                json!({"type": "ThisExpression"}),
                ident("window"),
            ))],
        ),
        stmt(call(ident("g"), vec![])),
    ]);
    assert_eq!(output, Value::Bool(true));
}

#[test]
fn test_new_expression_constructs_and_tags() {
    let output = run(vec![
        func_decl(
            "Point",
            vec!["x"],
            vec![stmt(assign(
                "=",
                member(json!({"type": "ThisExpression"}), "x"),
                ident("x"),
            ))],
        ),
        var("p", new_expr(ident("Point"), vec![num(3.0)])),
        stmt(array(vec![
            member(ident("p"), "x"),
            binary("instanceof", ident("p"), ident("Point")),
        ])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(3.0), Value::Bool(true)]);
}

#[test]
fn test_do_while_and_continue() {
    let output = run(vec![
        var_names(vec![("i", Some(num(0.0))), ("n", Some(num(0.0)))]),
        do_while(
            block(vec![
                stmt(update("++", ident("i"), true)),
                if_stmt(binary("%", ident("i"), num(2.0)), cont(None), None),
                stmt(assign("+=", ident("n"), ident("i"))),
            ]),
            binary("<", ident("i"), num(4.0)),
        ),
        stmt(array(vec![ident("i"), ident("n")])),
    ]);
    assert_eq!(items(&output), vec![Value::Num(4.0), Value::Num(6.0)]);
}

#[test]
fn test_while_returns_last_value() {
    let output = run(vec![
        var("i", num(0.0)),
        while_stmt(
            binary("<", ident("i"), num(3.0)),
            stmt(update("++", ident("i"), true)),
        ),
    ]);
    assert_eq!(output, Value::Num(3.0));
}

#[test]
fn test_regex_literal_matches() {
    let regex = json!({
        "type": "Literal",
        "value": {},
        "raw": "/ab+c/i",
        "regex": {"pattern": "ab+c", "flags": "i"},
    });
    let output = run(vec![stmt(method(regex, "test", vec![string("xABBC")]))]);
    assert_eq!(output, Value::Bool(true));
}

#[test]
fn test_string_members_autobox() {
    let output = run(vec![stmt(array(vec![
        member(string("abc"), "length"),
        index(string("abc"), num(1.0)),
    ]))]);
    assert_eq!(items(&output), vec![Value::Num(3.0), Value::Str("b".into())]);
}

#[test]
fn test_sequence_returns_last() {
    let output = run(vec![stmt(json!({
        "type": "SequenceExpression",
        "expressions": [num(1.0), num(2.0)],
    }))]);
    assert_eq!(output, Value::Num(2.0));
}

#[test]
fn test_top_level_break_is_a_fault() {
    assert!(matches!(run_err(vec![brk(None)]), Exception::Fault(_)));
}

#[test]
fn test_unsupported_declaration_kind_is_a_fault() {
    let error = run_err(vec![json!({
        "type": "VariableDeclaration",
        "kind": "let",
        "declarations": [{
            "type": "VariableDeclarator",
            "id": ident("x"),
            "init": num(1.0),
        }],
    })]);
    assert!(matches!(error, Exception::Fault(_)));
}

#[test]
fn test_style_assignment_is_recorded_against_the_element() {
    let context = host::browser();
    let el = host::element("div");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &DomApiChecker, "app.js");
    run_vm(
        &mut vm,
        vec![stmt(json!({
            "type": "AssignmentExpression",
            "operator": "=",
            "left": member(member(ident("host"), "style"), "color"),
            "right": string("red"),
            "loc": {"start": {"line": 1, "column": 0}},
        }))],
    )
    .unwrap();

    assert!(!vm.check_flag);
    let collection = vm.into_collection();
    assert_eq!(collection.len(), 1);
    let entry = &collection.entries()[0];
    assert_eq!(entry.element, el);
    assert_eq!(entry.kind, "style");
    assert_eq!(entry.info.code, "host.style.color = 'red'");
    assert_eq!(entry.info.loc, "app.js:1:0");
}

#[test]
fn test_class_list_and_jquery_record_against_the_element() {
    let context = host::browser();
    let el = host::element("div");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &DomApiChecker, "app.js");
    run_vm(
        &mut vm,
        vec![
            // host.classList.add('active')
            stmt(method(
                member(ident("host"), "classList"),
                "add",
                vec![string("active")],
            )),
            // $(host).addClass('selected')
            stmt(method(
                call(ident("$"), vec![ident("host")]),
                "addClass",
                vec![string("selected")],
            )),
        ],
    )
    .unwrap();

    let Value::Object(list) = el.get("classList") else { panic!() };
    assert_eq!(
        list.items().unwrap(),
        vec![Value::Str("active".into()), Value::Str("selected".into())],
    );

    let collection = vm.into_collection();
    assert_eq!(collection.len(), 2);
    assert!(collection.entries().iter().all(|entry| entry.element == el));
    assert!(collection.entries().iter().all(|entry| entry.kind == "attr"));
}

#[test]
fn test_attribute_node_records_against_its_owner() {
    let context = host::browser();
    let el = host::element("a");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &DomApiChecker, "app.js");
    run_vm(
        &mut vm,
        vec![
            stmt(method(ident("host"), "setAttribute", vec![string("href"), string("#")])),
            var("node", method(ident("host"), "getAttributeNode", vec![string("href")])),
            stmt(assign("=", member(ident("node"), "value"), string("#top"))),
        ],
    )
    .unwrap();

    let collection = vm.into_collection();
    assert_eq!(collection.len(), 2);
    assert!(collection.entries().iter().all(|entry| entry.element == el));
}

/// A checker that flags every method call, to exercise re-entrancy.
struct FlagAllMethods;

impl Checker for FlagAllMethods {
    fn dispatch(&self, site: CheckSite) -> Option<Status> {
        match site.callee {
            SiteCallee::Method { .. } => Some(Status::of_kind("op")),
            SiteCallee::Assign { .. } => None,
        }
    }
}

#[test]
fn test_check_flag_suppresses_nested_bookkeeping() {
    let context = host::browser();
    let el = host::element("div");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &FlagAllMethods, "app.js");
    run_vm(
        &mut vm,
        vec![
            var(
                "o",
                object(vec![(
                    "run",
                    func_expr(
                        None,
                        vec![],
                        vec![
                            stmt(method(
                                ident("host"),
                                "setAttribute",
                                vec![string("a"), string("b")],
                            )),
                            ret(num(1.0)),
                        ],
                    ),
                )]),
            ),
            stmt(method(ident("o"), "run", vec![])),
        ],
    )
    .unwrap();

    assert!(!vm.check_flag);
    // Only the outer call was booked; the nested one ran flagged.
    assert_eq!(vm.into_collection().len(), 1);
}

#[test]
fn test_check_flag_cleared_when_the_call_throws() {
    let context = host::browser();
    let mut vm = Vm::new(context, &FlagAllMethods, "app.js");
    let error = run_vm(
        &mut vm,
        vec![
            var(
                "o",
                object(vec![(
                    "run",
                    func_expr(None, vec![], vec![throw(string("inside"))]),
                )]),
            ),
            stmt(method(ident("o"), "run", vec![])),
        ],
    )
    .unwrap_err();

    assert!(matches!(error, Exception::Thrown(_)));
    assert!(!vm.check_flag);
    assert_eq!(vm.collection.len(), 1);
}

#[test]
fn test_typeof_and_void() {
    let output = run(vec![stmt(array(vec![
        unary("typeof", num(1.0)),
        unary("typeof", string("s")),
        unary("typeof", ident("missing")),
        unary("void", num(0.0)),
    ]))]);
    assert_eq!(
        items(&output),
        vec![
            Value::Str("number".into()),
            Value::Str("string".into()),
            Value::Str("undefined".into()),
            Value::Undefined,
        ],
    );
}

#[test]
fn test_computed_member_access() {
    let output = run(vec![
        var("o", object(vec![("ab", num(7.0))])),
        var("k", string("a")),
        stmt(index(ident("o"), binary("+", ident("k"), string("b")))),
    ]);
    assert_eq!(output, Value::Num(7.0));
}

#[test]
fn test_trace_info_uses_regenerated_source() {
    let context = host::browser();
    let el = host::element("div");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &DomApiChecker, "page.js");
    run_vm(
        &mut vm,
        vec![stmt(json!({
            "type": "CallExpression",
            "callee": member(member(ident("host"), "classList"), "add"),
            "arguments": [string("on")],
            "loc": {"start": {"line": 12, "column": 8}},
        }))],
    )
    .unwrap();

    let collection = vm.into_collection();
    let entry = &collection.entries()[0];
    assert_eq!(entry.info.code, "host.classList.add('on')");
    assert_eq!(entry.info.loc, "page.js:12:8");
    assert_eq!(entry.element, el);
}

#[test]
fn test_scripts_accumulate_into_one_collection() {
    let context = host::browser();
    let el = host::element("div");
    context.set("host", Value::Object(el.clone()));

    let mut vm = Vm::new(context, &DomApiChecker, "first.js");
    run_vm(
        &mut vm,
        vec![stmt(assign(
            "=",
            member(member(ident("host"), "style"), "color"),
            string("red"),
        ))],
    )
    .unwrap();

    vm.script_url = EcoString::from("second.js");
    run_vm(
        &mut vm,
        vec![stmt(method(
            ident("host"),
            "setAttribute",
            vec![string("id"), string("x")],
        ))],
    )
    .unwrap();

    let collection = vm.into_collection();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.entries_for(&el).count(), 2);
    assert!(collection.entries()[0].info.loc.starts_with("first.js"));
    assert!(collection.entries()[1].info.loc.starts_with("second.js"));
}

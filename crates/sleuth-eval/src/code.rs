use sleuth_library::diag::{EvalResult, bail};
use sleuth_library::foundations::{Object, Value, ops};
use sleuth_library::host;
use sleuth_syntax::ast;

use crate::call::declare_function;
use crate::{Eval, Vm, access, call, flow, ops as operator};

impl Eval for ast::Stmt {
    type Output = Value;

    fn eval(&self, vm: &mut Vm) -> EvalResult<Self::Output> {
        eval_stmt(vm, self, None)
    }
}

/// Evaluate a statement. A label is present when the statement is the direct
/// body of a labelled statement; loops consume it.
pub(crate) fn eval_stmt(
    vm: &mut Vm,
    stmt: &ast::Stmt,
    label: Option<&str>,
) -> EvalResult<Value> {
    match stmt {
        ast::Stmt::ExpressionStatement { expression } => expression.eval(vm),
        // Scoping is function-level, so a block is just its statements.
        ast::Stmt::BlockStatement { body } => eval_stmts(vm, body),
        ast::Stmt::EmptyStatement {} => Ok(Value::Undefined),
        ast::Stmt::ReturnStatement { argument } => {
            flow::eval_return(vm, argument.as_ref())
        }
        ast::Stmt::LabeledStatement { label, body } => {
            flow::eval_labeled(vm, label, body)
        }
        ast::Stmt::BreakStatement { label } => {
            vm.flow.set_break(label.as_ref().map(|label| label.name.clone()));
            Ok(Value::Undefined)
        }
        ast::Stmt::ContinueStatement { label } => {
            vm.flow.set_continue(label.as_ref().map(|label| label.name.clone()));
            Ok(Value::Undefined)
        }
        ast::Stmt::IfStatement { test, consequent, alternate } => {
            flow::eval_if(vm, test, consequent, alternate.as_deref())
        }
        ast::Stmt::SwitchStatement { discriminant, cases } => {
            flow::eval_switch(vm, discriminant, cases)
        }
        ast::Stmt::ThrowStatement { argument } => flow::eval_throw(vm, argument),
        ast::Stmt::TryStatement { block, handler, finalizer } => {
            flow::eval_try(vm, block, handler.as_ref(), finalizer.as_ref())
        }
        ast::Stmt::WhileStatement { test, body } => {
            flow::eval_while(vm, test, body, label)
        }
        ast::Stmt::DoWhileStatement { body, test } => {
            flow::eval_do_while(vm, body, test, label)
        }
        ast::Stmt::ForStatement { init, test, update, body } => flow::eval_for(
            vm,
            init.as_ref(),
            test.as_ref(),
            update.as_ref(),
            body,
            label,
        ),
        ast::Stmt::ForInStatement { left, right, body } => {
            flow::eval_for_in(vm, left, right, body, label)
        }
        ast::Stmt::FunctionDeclaration(function) => {
            // Normally bound up-front by the statement loop; binding again
            // here covers a declaration used as a direct statement body.
            declare_function(vm, function);
            Ok(Value::Undefined)
        }
        ast::Stmt::VariableDeclaration(declaration) => {
            eval_declaration(vm, declaration)
        }
    }
}

/// Evaluate a statement list: function declarations bind first, then the
/// remaining statements run in order until a control-flow signal stops them.
/// Returns the last produced value.
pub(crate) fn eval_stmts(vm: &mut Vm, stmts: &[ast::Stmt]) -> EvalResult<Value> {
    let refs: Vec<&ast::Stmt> = stmts.iter().collect();
    eval_stmt_refs(vm, &refs)
}

pub(crate) fn eval_stmt_refs(vm: &mut Vm, stmts: &[&ast::Stmt]) -> EvalResult<Value> {
    for stmt in stmts {
        if let ast::Stmt::FunctionDeclaration(function) = stmt {
            declare_function(vm, function);
        }
    }

    let mut output = Value::Undefined;
    for stmt in stmts {
        if matches!(stmt, ast::Stmt::FunctionDeclaration(_)) {
            continue;
        }
        output = stmt.eval(vm)?;
        if vm.flow.interrupted() {
            break;
        }
    }
    Ok(output)
}

/// Evaluate a `var` declaration. Initializers run in source order; a bare
/// declarator was already installed by the hoisting pre-pass.
pub(crate) fn eval_declaration(
    vm: &mut Vm,
    declaration: &ast::VarDeclaration,
) -> EvalResult<Value> {
    if declaration.kind != "var" {
        bail!("unsupported declaration kind: {}", declaration.kind);
    }
    for declarator in &declaration.declarations {
        if let Some(init) = &declarator.init {
            let value = init.eval(vm)?;
            vm.define(declarator.id.name.clone(), value);
        }
    }
    Ok(Value::Undefined)
}

impl Eval for ast::Expr {
    type Output = Value;

    fn eval(&self, vm: &mut Vm) -> EvalResult<Self::Output> {
        match self {
            Self::ThisExpression { .. } => Ok(vm.scopes.get("this")),
            Self::Identifier(ident) => Ok(eval_ident(vm, ident)),
            Self::Literal(literal) => Ok(eval_literal(literal)),
            Self::ArrayExpression { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(match element {
                        Some(element) => element.eval(vm)?,
                        // An elision holds a hole.
                        None => Value::Undefined,
                    });
                }
                Ok(Value::Object(Object::array(items)))
            }
            Self::ObjectExpression { properties, .. } => {
                let object = Object::new();
                for property in properties {
                    if property.kind != "init" {
                        bail!("unsupported property kind: {}", property.kind);
                    }
                    let key = match &property.key {
                        ast::PropertyKey::Identifier(ident) => ident.name.clone(),
                        ast::PropertyKey::Literal(literal) => {
                            ops::property_key(&eval_literal(literal))
                        }
                    };
                    object.set(key, property.value.eval(vm)?);
                }
                Ok(Value::Object(object))
            }
            Self::FunctionExpression(function) => Ok(call::eval_function_expr(
                vm, function,
            )),
            Self::UnaryExpression { operator, argument, .. } => {
                operator::eval_unary(vm, *operator, argument)
            }
            Self::UpdateExpression { .. } => access::eval_update(vm, self),
            Self::BinaryExpression { operator, left, right, .. } => {
                operator::eval_binary(vm, *operator, left, right)
            }
            Self::AssignmentExpression { .. } => access::eval_assignment(vm, self),
            Self::LogicalExpression { operator, left, right, .. } => {
                operator::eval_logical(vm, *operator, left, right)
            }
            Self::MemberExpression { .. } => access::eval_member(vm, self),
            Self::ConditionalExpression { test, consequent, alternate, .. } => {
                if ops::truthy(&test.eval(vm)?) {
                    consequent.eval(vm)
                } else {
                    alternate.eval(vm)
                }
            }
            Self::CallExpression { .. } => call::eval_call(vm, self),
            Self::NewExpression { .. } => call::eval_new(vm, self),
            Self::SequenceExpression { expressions, .. } => {
                let mut output = Value::Undefined;
                for expression in expressions {
                    output = expression.eval(vm)?;
                }
                Ok(output)
            }
        }
    }
}

/// Resolve an identifier. Some producers encode `null` and `undefined` as
/// identifiers rather than keywords, so those names are short-circuited
/// before the scope walk.
fn eval_ident(vm: &Vm, ident: &ast::Ident) -> Value {
    match ident.name.as_str() {
        "undefined" => Value::Undefined,
        "null" => Value::Null,
        name => vm.scopes.get(name),
    }
}

fn eval_literal(literal: &ast::Literal) -> Value {
    if let Some(regex) = &literal.regex {
        return Value::Object(host::regexp(&regex.pattern, &regex.flags));
    }
    match &literal.value {
        ast::LiteralValue::Null => Value::Null,
        ast::LiteralValue::Bool(b) => Value::Bool(*b),
        ast::LiteralValue::Num(n) => Value::Num(*n),
        ast::LiteralValue::Str(s) => Value::Str(s.clone()),
        ast::LiteralValue::Object(_) => Value::Undefined,
    }
}

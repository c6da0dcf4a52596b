use std::rc::Rc;

use ecow::eco_format;
use sleuth_library::checker::{CheckSite, SiteCallee};
use sleuth_library::diag::{EvalResult, Exception};
use sleuth_library::foundations::{Closure, Func, FuncRepr, Object, Value};
use sleuth_syntax::ast;

use crate::{Eval, Vm, access, code, hoist};

/// Evaluate a function expression to a callable value.
pub(crate) fn eval_function_expr(vm: &Vm, function: &Rc<ast::Function>) -> Value {
    Value::Func(make_closure(vm, function, true))
}

/// Bind a function declaration's name in the current scope.
pub(crate) fn declare_function(vm: &mut Vm, function: &Rc<ast::Function>) {
    let func = make_closure(vm, function, false);
    if let Some(id) = &function.id {
        let name = id.name.clone();
        vm.define(name, func);
    }
}

fn make_closure(vm: &Vm, function: &Rc<ast::Function>, expression: bool) -> Func {
    Func::interpreted(Closure {
        node: function.clone(),
        hoistings: hoist::collect(&function.body.body),
        captured: vm.scopes.clone(),
        script_url: vm.script_url.clone(),
        named_expression: expression && function.id.is_some(),
    })
}

/// Call a callable value with a receiver and evaluated arguments.
pub(crate) fn call_value(
    vm: &mut Vm,
    callee: &Value,
    this: Value,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let Value::Func(func) = callee else {
        return Err(Exception::thrown_message(eco_format!(
            "{} is not a function",
            callee.repr(),
        )));
    };

    match func.repr() {
        FuncRepr::Native(native) => {
            (native.body)(&this, &args).map_err(Exception::thrown_message)
        }
        FuncRepr::Interpreted(closure) => {
            let f = || eval_closure(vm, func, closure, this, args);

            #[cfg(target_arch = "wasm32")]
            return f();

            #[cfg(not(target_arch = "wasm32"))]
            stacker::maybe_grow(32 * 1024, 2 * 1024 * 1024, f)
        }
    }
}

/// Run an interpreted function.
///
/// The caller's environment is parked, the closure's captured stack is
/// installed with a fresh frame holding `this`, `arguments`, the hoisted
/// names, and the parameters, and the body runs. The caller's environment is
/// restored on every path out, including a throw, and the return signal
/// never escapes.
pub(crate) fn eval_closure(
    vm: &mut Vm,
    func: &Func,
    closure: &Closure,
    this: Value,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let mut scopes = closure.captured.clone();

    // A named function expression sees itself under its own name, in a
    // frame its callers never observe.
    if closure.named_expression
        && let Some(id) = &closure.node.id
    {
        scopes.enter();
        scopes.define(id.name.clone(), Value::Func(func.clone()));
    }

    scopes.enter();
    for name in &closure.hoistings {
        scopes.define(name.clone(), Value::Undefined);
    }

    let receiver = if this.is_nullish() {
        Value::Object(vm.context.clone())
    } else {
        this
    };
    scopes.define("this", receiver);
    scopes.define("arguments", Value::Object(Object::array(args.clone())));

    // Extra arguments are dropped, missing ones read as undefined.
    for (index, param) in closure.node.params.iter().enumerate() {
        scopes.define(
            param.name.clone(),
            args.get(index).cloned().unwrap_or_default(),
        );
    }

    let caller_scopes = std::mem::replace(&mut vm.scopes, scopes);
    let caller_url =
        std::mem::replace(&mut vm.script_url, closure.script_url.clone());

    let result = code::eval_stmts(vm, &closure.node.body.body);

    vm.scopes = caller_scopes;
    vm.script_url = caller_url;
    vm.flow.take_return();

    let output = result?;

    // A break or continue must not leak into the caller's loops.
    if let Some(fault) = vm.flow.forbidden() {
        return Err(fault);
    }
    Ok(output)
}

/// Evaluate a call expression. Method calls, those whose callee is a member
/// expression, pass the receiver through the checker hook first.
pub(crate) fn eval_call(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Value> {
    let ast::Expr::CallExpression { callee, arguments, .. } = expr else {
        unreachable!("node is a call");
    };

    match &**callee {
        ast::Expr::MemberExpression { object, property, computed, .. } => {
            let target = object.eval(vm)?;
            let key = access::member_key(vm, property, *computed)?;
            let args = eval_args(vm, arguments)?;
            checked_call(vm, expr, target, &key, args)
        }
        _ => {
            // A plain call has no receiver; `this` falls back to the context
            // inside the protocol.
            let method = callee.eval(vm)?;
            let args = eval_args(vm, arguments)?;
            call_value(vm, &method, Value::Undefined, args)
        }
    }
}

/// The checker hook around a method call. A positive verdict records the
/// site and suppresses nested bookkeeping until this call returns; the flag
/// is cleared even when the call throws.
fn checked_call(
    vm: &mut Vm,
    expr: &ast::Expr,
    target: Value,
    key: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let status = if vm.check_flag {
        None
    } else {
        vm.checker.dispatch(CheckSite {
            context: &vm.context,
            caller: &target,
            callee: SiteCallee::Method { key, args: &args },
        })
    };

    let flagged = status.is_some();
    if let Some(status) = status {
        vm.check_flag = true;
        let info = vm.info(expr);
        vm.record(status, &target, info);
    }

    let result = execute_method(vm, &target, key, args);
    if flagged {
        vm.check_flag = false;
    }
    result
}

/// Resolve and invoke `target[key]`, with the usual member-read rules.
fn execute_method(
    vm: &mut Vm,
    target: &Value,
    key: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let method = access::read_member(target, key)?;
    access::attach_parent(&method, target);
    call_value(vm, &method, target.clone(), args)
}

/// Evaluate a constructor call: a fresh object, classed and tagged by its
/// constructor, becomes the receiver; the constructor's explicit object
/// result wins over it.
pub(crate) fn eval_new(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Value> {
    let ast::Expr::NewExpression { callee, arguments, .. } = expr else {
        unreachable!("node is a new expression");
    };

    let constructor = callee.eval(vm)?;
    let args = eval_args(vm, arguments)?;

    let Value::Func(func) = &constructor else {
        return Err(Exception::thrown_message(eco_format!(
            "{} is not a constructor",
            constructor.repr(),
        )));
    };

    let object = match func.construct_class() {
        Some(class) => Object::of_class(class),
        None => Object::new(),
    };
    object.set_construct(func.clone());

    let result = call_value(vm, &constructor, Value::Object(object.clone()), args)?;
    Ok(match result {
        Value::Object(_) | Value::Func(_) => result,
        _ => Value::Object(object),
    })
}

fn eval_args(vm: &mut Vm, arguments: &[ast::Expr]) -> EvalResult<Vec<Value>> {
    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(argument.eval(vm)?);
    }
    Ok(args)
}

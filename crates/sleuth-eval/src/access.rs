use ecow::{EcoString, eco_format};
use sleuth_library::checker::{CheckSite, SiteCallee};
use sleuth_library::collection::Info;
use sleuth_library::diag::{EvalResult, Exception, bail};
use sleuth_library::foundations::{HostClass, Value, ops};
use sleuth_syntax::ast;

use crate::{Eval, Vm, ops as operator};

/// An addressable location: a named binding or a member slot on an already
/// evaluated receiver. Assignment, `delete`, and update expressions all
/// consume this one shape.
pub(crate) enum Place {
    /// A variable on the scope stack.
    Var(EcoString),
    /// A member slot `target[key]`.
    Member { target: Value, key: EcoString },
}

impl Place {
    /// Read the place's current value.
    pub fn read(&self, vm: &Vm) -> EvalResult<Value> {
        match self {
            Self::Var(name) => Ok(vm.scopes.get(name)),
            Self::Member { target, key } => read_member(target, key),
        }
    }

    /// Write the place. Member writes consult the checker; variable writes
    /// update the nearest defining scope.
    pub fn write(&self, vm: &mut Vm, value: Value, info: Info) -> EvalResult<()> {
        match self {
            Self::Var(name) => {
                vm.scopes.update(name, value);
                Ok(())
            }
            Self::Member { target, key } => {
                checked_assign(vm, target, key, value, info)
            }
        }
    }
}

/// Resolve an expression into a place, evaluating the receiver of a member
/// expression exactly once.
pub(crate) fn resolve(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Place> {
    match expr {
        ast::Expr::MemberExpression { object, property, computed, .. } => {
            let target = object.eval(vm)?;
            let key = member_key(vm, property, *computed)?;
            Ok(Place::Member { target, key })
        }
        ast::Expr::Identifier(ident) => Ok(Place::Var(ident.name.clone())),
        _ => bail!("cannot assign to this expression"),
    }
}

/// The property key of a member expression: the evaluated expression for a
/// computed access, the identifier or literal text otherwise.
pub(crate) fn member_key(
    vm: &mut Vm,
    property: &ast::Expr,
    computed: bool,
) -> EvalResult<EcoString> {
    if computed {
        return Ok(ops::property_key(&property.eval(vm)?));
    }
    match property {
        ast::Expr::Identifier(ident) => Ok(ident.name.clone()),
        ast::Expr::Literal(_) => Ok(ops::property_key(&property.eval(vm)?)),
        _ => bail!("invalid member property"),
    }
}

/// Read `target[key]`, with the language's autoboxing for the handful of
/// primitive members programs actually touch.
pub(crate) fn read_member(target: &Value, key: &str) -> EvalResult<Value> {
    Ok(match target {
        Value::Object(object) => object.get(key),
        Value::Str(s) => match key {
            "length" => Value::Num(s.chars().count() as f64),
            _ => match key.parse::<usize>() {
                Ok(index) => match s.chars().nth(index) {
                    Some(c) => Value::Str(c.into()),
                    None => Value::Undefined,
                },
                Err(_) => Value::Undefined,
            },
        },
        Value::Func(func) => match key {
            "length" => Value::Num(func.arity() as f64),
            "name" => Value::Str(func.name().unwrap_or_default()),
            _ => Value::Undefined,
        },
        Value::Undefined | Value::Null => {
            return Err(Exception::thrown_message(eco_format!(
                "cannot read properties of {} (reading '{key}')",
                target.type_name(),
            )));
        }
        _ => Value::Undefined,
    })
}

/// After a member read, remember which object a style declaration or token
/// list came from, so a later write through it can be attributed to its
/// element. The own-property check keeps the first owner.
pub(crate) fn attach_parent(value: &Value, target: &Value) {
    if let Value::Object(object) = value
        && matches!(
            object.class(),
            Some(HostClass::CssStyleDeclaration | HostClass::DomTokenList),
        )
        && !object.has("parent")
    {
        object.set("parent", target.clone());
    }
}

/// Evaluate a member expression as a value.
pub(crate) fn eval_member(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Value> {
    let ast::Expr::MemberExpression { object, property, computed, .. } = expr else {
        unreachable!("node is a member expression");
    };
    let target = object.eval(vm)?;
    let key = member_key(vm, property, *computed)?;
    let value = read_member(&target, &key)?;
    attach_parent(&value, &target);
    Ok(value)
}

/// Evaluate an assignment. A compound operator is rewritten to its binary
/// counterpart applied to the current value and the right-hand side.
pub(crate) fn eval_assignment(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Value> {
    let ast::Expr::AssignmentExpression { operator, left, right, .. } = expr else {
        unreachable!("node is an assignment");
    };

    let place = resolve(vm, left)?;
    let value = match operator.binary() {
        None => right.eval(vm)?,
        Some(binary) => {
            let current = place.read(vm)?;
            let rhs = right.eval(vm)?;
            operator::apply_binary(binary, &current, &rhs)?
        }
    };

    let info = vm.info(expr);
    place.write(vm, value.clone(), info)?;
    Ok(value)
}

/// Evaluate a prefix or postfix update.
pub(crate) fn eval_update(vm: &mut Vm, expr: &ast::Expr) -> EvalResult<Value> {
    let ast::Expr::UpdateExpression { operator, argument, prefix, .. } = expr else {
        unreachable!("node is an update");
    };

    let place = resolve(vm, argument)?;
    let current = place.read(vm)?;
    let updated = operator::apply_update(*operator, &current);

    let info = vm.info(expr);
    place.write(vm, updated.clone(), info)?;
    Ok(if *prefix { updated } else { current })
}

/// Evaluate `delete` on a member slot or a context binding. Anything else
/// is a no-op that reports success.
pub(crate) fn eval_delete(vm: &mut Vm, argument: &ast::Expr) -> EvalResult<Value> {
    match argument {
        ast::Expr::MemberExpression { object, property, computed, .. } => {
            let target = object.eval(vm)?;
            let key = member_key(vm, property, *computed)?;
            match &target {
                Value::Object(target) => Ok(Value::Bool(target.delete(&key))),
                Value::Undefined | Value::Null => {
                    Err(Exception::thrown_message(eco_format!(
                        "cannot convert {} to object",
                        target.type_name(),
                    )))
                }
                _ => Ok(Value::Bool(true)),
            }
        }
        // Deleting a bare name removes the process-wide host binding.
        ast::Expr::Identifier(ident) => {
            Ok(Value::Bool(vm.context.delete(&ident.name)))
        }
        _ => {
            argument.eval(vm)?;
            Ok(Value::Bool(true))
        }
    }
}

/// Write `target[key]`, consulting the checker first. The re-entrancy flag
/// is cleared on every exit path, including a failing write.
fn checked_assign(
    vm: &mut Vm,
    target: &Value,
    key: &str,
    value: Value,
    info: Info,
) -> EvalResult<()> {
    let status = if vm.check_flag {
        None
    } else {
        vm.checker.dispatch(CheckSite {
            context: &vm.context,
            caller: target,
            callee: SiteCallee::Assign { key, value: &value },
        })
    };

    let flagged = status.is_some();
    if let Some(status) = status {
        vm.check_flag = true;
        vm.record(status, target, info);
    }

    let result = write_member(target, key, value);
    if flagged {
        vm.check_flag = false;
    }
    result
}

fn write_member(target: &Value, key: &str, value: Value) -> EvalResult<()> {
    match target {
        Value::Object(object) => {
            object.set(key, value);
            Ok(())
        }
        Value::Undefined | Value::Null => Err(Exception::thrown_message(eco_format!(
            "cannot set properties of {} (setting '{key}')",
            target.type_name(),
        ))),
        // Writes to primitives vanish, as they do on the host.
        _ => Ok(()),
    }
}

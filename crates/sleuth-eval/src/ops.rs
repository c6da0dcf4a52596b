use sleuth_library::diag::{EvalResult, Exception};
use sleuth_library::foundations::{Value, ops};
use sleuth_syntax::ast::{BinaryOp, Expr, LogicalOp, UnaryOp, UpdateOp};

use crate::{Eval, Vm, access};

/// Evaluate a unary expression. `delete` goes through the reference layer;
/// every other operator works on the evaluated argument.
pub(crate) fn eval_unary(
    vm: &mut Vm,
    operator: UnaryOp,
    argument: &Expr,
) -> EvalResult<Value> {
    if operator == UnaryOp::Delete {
        return access::eval_delete(vm, argument);
    }

    let value = argument.eval(vm)?;
    Ok(match operator {
        UnaryOp::Neg => ops::neg(&value),
        UnaryOp::Pos => ops::pos(&value),
        UnaryOp::Not => ops::not(&value),
        UnaryOp::BitNot => ops::bitnot(&value),
        UnaryOp::Typeof => ops::type_of(&value),
        UnaryOp::Void => Value::Undefined,
        UnaryOp::Delete => unreachable!("handled above"),
    })
}

/// Evaluate a binary expression: both sides eagerly, then the operator.
pub(crate) fn eval_binary(
    vm: &mut Vm,
    operator: BinaryOp,
    left: &Expr,
    right: &Expr,
) -> EvalResult<Value> {
    let lhs = left.eval(vm)?;
    let rhs = right.eval(vm)?;
    apply_binary(operator, &lhs, &rhs)
}

/// Apply a binary operator to evaluated operands. Compound assignment
/// reuses this with the operator's trailing `=` stripped.
pub(crate) fn apply_binary(
    operator: BinaryOp,
    lhs: &Value,
    rhs: &Value,
) -> EvalResult<Value> {
    Ok(match operator {
        BinaryOp::Add => ops::add(lhs, rhs),
        BinaryOp::Sub => ops::sub(lhs, rhs),
        BinaryOp::Mul => ops::mul(lhs, rhs),
        BinaryOp::Div => ops::div(lhs, rhs),
        BinaryOp::Rem => ops::rem(lhs, rhs),
        BinaryOp::Eq => Value::Bool(ops::loose_eq(lhs, rhs)),
        BinaryOp::Neq => Value::Bool(!ops::loose_eq(lhs, rhs)),
        BinaryOp::StrictEq => Value::Bool(ops::strict_eq(lhs, rhs)),
        BinaryOp::StrictNeq => Value::Bool(!ops::strict_eq(lhs, rhs)),
        BinaryOp::Lt => ops::lt(lhs, rhs),
        BinaryOp::Leq => ops::leq(lhs, rhs),
        BinaryOp::Gt => ops::gt(lhs, rhs),
        BinaryOp::Geq => ops::geq(lhs, rhs),
        BinaryOp::Shl => ops::shl(lhs, rhs),
        BinaryOp::Shr => ops::shr(lhs, rhs),
        BinaryOp::UShr => ops::ushr(lhs, rhs),
        BinaryOp::BitAnd => ops::bitand(lhs, rhs),
        BinaryOp::BitOr => ops::bitor(lhs, rhs),
        BinaryOp::BitXor => ops::bitxor(lhs, rhs),
        BinaryOp::In => ops::in_(lhs, rhs).map_err(Exception::thrown_message)?,
        BinaryOp::Instanceof => {
            ops::instanceof(lhs, rhs).map_err(Exception::thrown_message)?
        }
    })
}

/// Evaluate a logical expression. The right operand only runs when the left
/// operand's truthiness requires it.
pub(crate) fn eval_logical(
    vm: &mut Vm,
    operator: LogicalOp,
    left: &Expr,
    right: &Expr,
) -> EvalResult<Value> {
    let lhs = left.eval(vm)?;
    match operator {
        LogicalOp::And if ops::truthy(&lhs) => right.eval(vm),
        LogicalOp::Or if !ops::truthy(&lhs) => right.eval(vm),
        _ => Ok(lhs),
    }
}

/// Apply an update operator to the current value.
pub(crate) fn apply_update(operator: UpdateOp, value: &Value) -> Value {
    match operator {
        UpdateOp::Incr => ops::incr(value),
        UpdateOp::Decr => ops::decr(value),
    }
}

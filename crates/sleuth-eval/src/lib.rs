//! Sleuth's tree-walking interpreter.
//!
//! The interpreter executes an ESTree program against a host context while a
//! checker watches every member call and member assignment, recording the
//! interesting ones (DOM manipulations, in the shipped checker) into a
//! [`Collection`](sleuth_library::collection::Collection). The host objects
//! are never shadowed or frozen; the evaluated program reads and writes them
//! directly.

mod access;
mod call;
mod code;
mod flow;
mod hoist;
mod ops;
mod vm;

pub use self::flow::{FlowState, Signal};
pub use self::vm::Vm;

use sleuth_library::diag::EvalResult;
use sleuth_library::foundations::Value;
use sleuth_syntax::ast;

use self::code::eval_stmts;

/// Evaluate a program against the machine's host context.
///
/// Returns the last value the program produced. The recorded trace stays on
/// the machine; run further scripts or take it with
/// [`Vm::into_collection`].
pub fn eval(program: &ast::Program, vm: &mut Vm) -> EvalResult<Value> {
    hoist::install(vm, &program.body);
    let output = eval_stmts(vm, &program.body)?;

    // A signal that survives to the top level has no construct to consume
    // it; that is a malformed program, and it would poison the next run.
    if let Some(fault) = vm.flow.forbidden() {
        return Err(fault);
    }

    Ok(output)
}

/// Evaluate an expression or statement.
pub trait Eval {
    /// The output of evaluating the node.
    type Output;

    /// Evaluate the node to the output value.
    fn eval(&self, vm: &mut Vm) -> EvalResult<Self::Output>;
}

#[cfg(test)]
mod tests;

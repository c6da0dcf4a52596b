use ecow::EcoString;
use sleuth_library::diag::{EvalResult, Exception, bail};
use sleuth_library::foundations::{Value, ops};
use sleuth_syntax::ast;

use crate::code::{eval_declaration, eval_stmt, eval_stmt_refs, eval_stmts};
use crate::{Eval, Vm};

bitflags::bitflags! {
    /// The pending control-flow signals.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Signal: u8 {
        /// A `break` is looking for its loop or switch.
        const BREAK = 1 << 0;
        /// A `continue` is looking for its loop.
        const CONTINUE = 1 << 1;
        /// A `return` is looking for its function.
        const RETURN = 1 << 2;
    }
}

/// The control-flow signal register.
///
/// Statements consult it between children; loops, switches, labelled
/// statements, and the function-call protocol clear exactly the signals they
/// own. The label is always `None` while no signal is pending.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    signal: Signal,
    label: Option<EcoString>,
}

impl FlowState {
    /// Whether any signal is pending.
    pub fn interrupted(&self) -> bool {
        !self.signal.is_empty()
    }

    /// Whether the given signal is pending.
    pub fn is(&self, signal: Signal) -> bool {
        self.signal.contains(signal)
    }

    /// The pending label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Raise a break, aimed at `label` if one is given.
    pub fn set_break(&mut self, label: Option<EcoString>) {
        self.signal.insert(Signal::BREAK);
        self.label = label;
    }

    /// Raise a continue, aimed at `label` if one is given.
    pub fn set_continue(&mut self, label: Option<EcoString>) {
        self.signal.insert(Signal::CONTINUE);
        self.label = label;
    }

    /// Raise a return.
    pub fn set_return(&mut self) {
        self.signal.insert(Signal::RETURN);
    }

    /// Clear a pending return, reporting whether one was pending. Only the
    /// function-exit protocol and `try` blocks use this.
    pub fn take_return(&mut self) -> bool {
        let had = self.is(Signal::RETURN);
        self.signal.remove(Signal::RETURN);
        self.normalize();
        had
    }

    /// The shared loop rule: whether the enclosing loop carrying `label`
    /// must stop iterating, clearing exactly the signals it owns.
    pub fn should_break(&mut self, label: Option<&str>) -> bool {
        if self.is(Signal::RETURN) {
            // Propagates outward untouched; only a function exit clears it.
            return true;
        }
        if self.is(Signal::BREAK) {
            if self.matches(label) {
                self.signal.remove(Signal::BREAK);
                self.label = None;
            }
            return true;
        }
        if self.is(Signal::CONTINUE) {
            if self.matches(label) {
                self.signal.remove(Signal::CONTINUE);
                self.label = None;
                return false;
            }
            // A labelled continue for an outer loop terminates this one.
            return true;
        }
        false
    }

    /// Consume a break aimed at `label` after a labelled statement body ran.
    /// Never touches a pending return.
    pub fn consume_label(&mut self, label: &str) {
        if self.label.as_deref() == Some(label) {
            self.signal.remove(Signal::BREAK);
            self.label = None;
        }
    }

    /// Consume an unlabelled break after a switch ran its matched cases.
    pub fn clear_break(&mut self) {
        self.signal.remove(Signal::BREAK);
        self.normalize();
    }

    /// A pending signal matches when it carries no label or exactly this one.
    fn matches(&self, label: Option<&str>) -> bool {
        match (&self.label, label) {
            (None, _) => true,
            (Some(pending), Some(label)) => pending == label,
            (Some(_), None) => false,
        }
    }

    fn normalize(&mut self) {
        if self.signal.is_empty() {
            self.label = None;
        }
    }

    /// The fault for a signal that reached a place with no construct left to
    /// consume it.
    pub fn forbidden(&self) -> Option<Exception> {
        let message = if self.is(Signal::BREAK) {
            "cannot break outside of a loop"
        } else if self.is(Signal::CONTINUE) {
            "cannot continue outside of a loop"
        } else if self.is(Signal::RETURN) {
            "cannot return outside of a function"
        } else {
            return None;
        };
        Some(Exception::Fault(message.into()))
    }
}

/// Evaluate a return statement.
///
/// The argument is evaluated before the signal is raised: the argument may
/// itself contain a call whose exit protocol clears a pending return.
pub(crate) fn eval_return(
    vm: &mut Vm,
    argument: Option<&ast::Expr>,
) -> EvalResult<Value> {
    let value = match argument {
        Some(argument) => argument.eval(vm)?,
        None => Value::Undefined,
    };
    vm.flow.set_return();
    Ok(value)
}

pub(crate) fn eval_if(
    vm: &mut Vm,
    test: &ast::Expr,
    consequent: &ast::Stmt,
    alternate: Option<&ast::Stmt>,
) -> EvalResult<Value> {
    if ops::truthy(&test.eval(vm)?) {
        consequent.eval(vm)
    } else if let Some(alternate) = alternate {
        alternate.eval(vm)
    } else {
        Ok(Value::Undefined)
    }
}

/// Evaluate a switch: find the matched case, then run the tail from there as
/// one statement sequence, so cases without a break fall through.
pub(crate) fn eval_switch(
    vm: &mut Vm,
    discriminant: &ast::Expr,
    cases: &[ast::SwitchCase],
) -> EvalResult<Value> {
    let discriminant = discriminant.eval(vm)?;

    let mut matched = None;
    for (index, case) in cases.iter().enumerate() {
        let hit = match &case.test {
            None => true,
            Some(test) => ops::strict_eq(&test.eval(vm)?, &discriminant),
        };
        if hit {
            matched = Some(index);
            break;
        }
    }

    let mut output = Value::Undefined;
    if let Some(start) = matched {
        let tail: Vec<&ast::Stmt> =
            cases[start..].iter().flat_map(|case| &case.consequent).collect();
        output = eval_stmt_refs(vm, &tail)?;
    }

    // The switch consumes a break; a return passes through untouched.
    vm.flow.clear_break();
    Ok(output)
}

pub(crate) fn eval_labeled(
    vm: &mut Vm,
    label: &ast::Ident,
    body: &ast::Stmt,
) -> EvalResult<Value> {
    let output = eval_stmt(vm, body, Some(&label.name))?;
    // A break that targeted this label and was not consumed by a loop below
    // ends here.
    vm.flow.consume_label(&label.name);
    Ok(output)
}

pub(crate) fn eval_while(
    vm: &mut Vm,
    test: &ast::Expr,
    body: &ast::Stmt,
    label: Option<&str>,
) -> EvalResult<Value> {
    let mut output = Value::Undefined;
    while ops::truthy(&test.eval(vm)?) {
        output = body.eval(vm)?;
        if vm.flow.should_break(label) {
            break;
        }
    }
    Ok(output)
}

pub(crate) fn eval_do_while(
    vm: &mut Vm,
    body: &ast::Stmt,
    test: &ast::Expr,
    label: Option<&str>,
) -> EvalResult<Value> {
    let output = body.eval(vm)?;
    if vm.flow.should_break(label) {
        return Ok(output);
    }
    eval_while(vm, test, body, label)
}

pub(crate) fn eval_for(
    vm: &mut Vm,
    init: Option<&ast::ForInit>,
    test: Option<&ast::Expr>,
    update: Option<&ast::Expr>,
    body: &ast::Stmt,
    label: Option<&str>,
) -> EvalResult<Value> {
    match init {
        Some(ast::ForInit::Declaration(declaration)) => {
            eval_declaration(vm, declaration)?;
        }
        Some(ast::ForInit::Expr(expression)) => {
            expression.eval(vm)?;
        }
        None => {}
    }

    let mut output = Value::Undefined;
    loop {
        // An absent test keeps the loop running.
        if let Some(test) = test
            && !ops::truthy(&test.eval(vm)?)
        {
            break;
        }
        output = body.eval(vm)?;
        if vm.flow.should_break(label) {
            break;
        }
        // A consumed continue still reaches the update.
        if let Some(update) = update {
            update.eval(vm)?;
        }
    }
    Ok(output)
}

pub(crate) fn eval_for_in(
    vm: &mut Vm,
    left: &ast::ForInTarget,
    right: &ast::Expr,
    body: &ast::Stmt,
    label: Option<&str>,
) -> EvalResult<Value> {
    let object = right.eval(vm)?;

    let name = match left {
        ast::ForInTarget::Declaration(declaration) => {
            eval_declaration(vm, declaration)?;
            match &declaration.declarations[..] {
                [declarator] => declarator.id.name.clone(),
                _ => bail!("for-in expects a single declared name"),
            }
        }
        ast::ForInTarget::Ident(ident) => ident.name.clone(),
    };

    let keys: Vec<EcoString> = match &object {
        Value::Object(object) => object.keys(),
        Value::Str(s) => {
            (0..s.chars().count()).map(|i| ecow::eco_format!("{i}")).collect()
        }
        _ => vec![],
    };

    let mut output = Value::Undefined;
    for key in keys {
        vm.scopes.update(&name, Value::Str(key));
        output = body.eval(vm)?;
        if vm.flow.should_break(label) {
            break;
        }
    }
    Ok(output)
}

pub(crate) fn eval_throw(vm: &mut Vm, argument: &ast::Expr) -> EvalResult<Value> {
    Err(Exception::Thrown(argument.eval(vm)?))
}

/// Evaluate a try statement.
///
/// A return observed in the block, the handler, or the finalizer is parked
/// while the remaining clauses run, then re-raised; the finalizer can
/// overwrite the parked value. An error left over after the handler had its
/// chance is re-thrown at the end.
pub(crate) fn eval_try(
    vm: &mut Vm,
    block: &ast::Block,
    handler: Option<&ast::CatchClause>,
    finalizer: Option<&ast::Block>,
) -> EvalResult<Value> {
    let mut returned = None;
    let mut raised = None;

    match eval_stmts(vm, &block.body) {
        Ok(value) => {
            if vm.flow.take_return() {
                returned = Some(value);
            }
        }
        Err(Exception::Thrown(error)) => raised = Some(error),
        Err(fault) => return Err(fault),
    }

    if let Some(handler) = handler
        && let Some(error) = raised.take()
    {
        vm.define(handler.param.name.clone(), error);
        match eval_stmts(vm, &handler.body.body) {
            Ok(value) => {
                if vm.flow.take_return() {
                    returned = Some(value);
                }
            }
            Err(Exception::Thrown(error)) => raised = Some(error),
            Err(fault) => return Err(fault),
        }
    }

    if let Some(finalizer) = finalizer {
        match eval_stmts(vm, &finalizer.body) {
            Ok(value) => {
                if vm.flow.take_return() {
                    returned = Some(value);
                }
            }
            Err(Exception::Thrown(error)) => raised = Some(error),
            Err(fault) => return Err(fault),
        }
    }

    if let Some(value) = returned {
        vm.flow.set_return();
        Ok(value)
    } else if let Some(error) = raised {
        Err(Exception::Thrown(error))
    } else {
        Ok(Value::Undefined)
    }
}

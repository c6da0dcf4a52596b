use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use ecow::EcoString;
use sleuth_syntax::ast;

use crate::diag::StrResult;
use crate::foundations::{HostClass, Scopes, Value};

/// A callable value: a host-provided native or an interpreted closure.
#[derive(Clone)]
pub struct Func(Rc<FuncRepr>);

/// The two kinds of callables.
pub enum FuncRepr {
    /// A function provided by the host layer.
    Native(NativeFunc),
    /// A function produced by evaluating a declaration or expression.
    Interpreted(Closure),
}

/// A host-provided function. Natives receive their receiver and arguments
/// and cannot re-enter the interpreter.
pub struct NativeFunc {
    /// The function's name.
    pub name: EcoString,
    /// The declared parameter count.
    pub arity: usize,
    /// Objects constructed with `new` through this function get this class.
    pub class: Option<HostClass>,
    /// The implementation. An error becomes a thrown, catchable value.
    pub body: Box<dyn Fn(&Value, &[Value]) -> StrResult<Value>>,
}

/// An interpreted function: its node plus the environment it closed over.
pub struct Closure {
    /// The function node, shared with the tree it came from.
    pub node: Rc<ast::Function>,
    /// The names hoisted from the body: `var` declarations and inner
    /// function declarations, pre-bound on every call.
    pub hoistings: Vec<EcoString>,
    /// The snapshot of the scope stack at creation time.
    pub captured: Scopes,
    /// The script the function came from, for trace locations.
    pub script_url: EcoString,
    /// Whether the node was a named function expression. Only then does the
    /// body see its own name as an implicit binding; a declaration's name
    /// lives in the surrounding scope instead.
    pub named_expression: bool,
}

impl Func {
    /// Create a native function.
    pub fn native(
        name: impl Into<EcoString>,
        arity: usize,
        class: Option<HostClass>,
        body: impl Fn(&Value, &[Value]) -> StrResult<Value> + 'static,
    ) -> Self {
        Self(Rc::new(FuncRepr::Native(NativeFunc {
            name: name.into(),
            arity,
            class,
            body: Box::new(body),
        })))
    }

    /// Create an interpreted function.
    pub fn interpreted(closure: Closure) -> Self {
        Self(Rc::new(FuncRepr::Interpreted(closure)))
    }

    /// Which kind of callable this is.
    pub fn repr(&self) -> &FuncRepr {
        &self.0
    }

    /// The function's name, if it has one.
    pub fn name(&self) -> Option<EcoString> {
        match self.repr() {
            FuncRepr::Native(native) => Some(native.name.clone()),
            FuncRepr::Interpreted(closure) => {
                closure.node.id.as_ref().map(|id| id.name.clone())
            }
        }
    }

    /// The declared parameter count, observable as the `length` property.
    pub fn arity(&self) -> usize {
        match self.repr() {
            FuncRepr::Native(native) => native.arity,
            FuncRepr::Interpreted(closure) => closure.node.params.len(),
        }
    }

    /// The host class `new` applies through this function, if any.
    pub fn construct_class(&self) -> Option<HostClass> {
        match self.repr() {
            FuncRepr::Native(native) => native.class,
            FuncRepr::Interpreted(_) => None,
        }
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Func {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Func({name})"),
            None => write!(f, "Func(anonymous)"),
        }
    }
}

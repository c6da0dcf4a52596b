use ecow::{EcoString, eco_format};
use sleuth_library::checker::{Checker, Status};
use sleuth_library::collection::{Collection, Info};
use sleuth_library::foundations::{HostClass, Object, Scopes, Value};
use sleuth_syntax::{ast, unparse};

use crate::FlowState;

/// A virtual machine.
///
/// Holds the state needed to [evaluate](crate::eval()) a program: the
/// control-flow register, the live scope stack, the host context, the
/// checker, and the trace recorded so far. One machine can run several
/// scripts in sequence against the same context.
pub struct Vm<'a> {
    /// A control-flow signal that is currently pending.
    pub flow: FlowState,
    /// The live stack of scopes.
    pub scopes: Scopes,
    /// The host context shared with the evaluated program.
    pub context: Object,
    /// The checker consulted at member calls and member assignments.
    pub checker: &'a dyn Checker,
    /// The manipulations recorded so far.
    pub collection: Collection,
    /// Set while a checker-recorded operation executes, so its inner calls
    /// are not booked a second time.
    pub check_flag: bool,
    /// The URL of the script currently evaluating, for trace locations.
    pub script_url: EcoString,
}

impl<'a> Vm<'a> {
    /// Create a new virtual machine around a host context.
    pub fn new(
        context: Object,
        checker: &'a dyn Checker,
        script_url: impl Into<EcoString>,
    ) -> Self {
        let mut scopes = Scopes::new(Some(context.clone()));
        // Top-level code sees the context as its receiver.
        scopes.define("this", Value::Object(context.clone()));
        Self {
            flow: FlowState::default(),
            scopes,
            context,
            checker,
            collection: Collection::new(),
            check_flag: false,
            script_url: script_url.into(),
        }
    }

    /// Bind a value in the innermost scope.
    pub fn define(&mut self, name: impl Into<EcoString>, value: impl Into<Value>) {
        self.scopes.define(name, value);
    }

    /// Build the trace info for a call or assignment node.
    pub fn info(&self, expr: &ast::Expr) -> Info {
        let loc = match expr.loc() {
            Some(loc) => eco_format!(
                "{}:{}:{}",
                self.script_url,
                loc.start.line,
                loc.start.column,
            ),
            None => self.script_url.clone(),
        };
        Info { code: unparse(expr), loc }
    }

    /// Record a positive checker verdict against the affected elements.
    pub(crate) fn record(&mut self, status: Status, caller: &Value, info: Info) {
        // Resolve the object the operation really affects: an explicit
        // target from the checker, the owning element of a style declaration
        // or token list, the owner of an attribute node, or the caller
        // itself.
        let target = match status.target {
            Some(target) => target,
            None => match caller.as_object() {
                Some(object)
                    if object.is(HostClass::CssStyleDeclaration)
                        || object.is(HostClass::DomTokenList) =>
                {
                    match object.get("parent") {
                        parent @ Value::Object(_) => parent,
                        _ => caller.clone(),
                    }
                }
                Some(object) if object.is(HostClass::Attr) => {
                    object.get("ownerElement")
                }
                _ => caller.clone(),
            },
        };

        // A jQuery-wrapped set stands for each of its elements.
        let elements = match target.as_object() {
            Some(object) if object.is(HostClass::JQuery) => {
                object.items().unwrap_or_default()
            }
            _ => vec![target],
        };

        for element in elements {
            if let Value::Object(element) = element {
                self.collection.record(element, status.kind.clone(), info.clone());
            }
        }
    }

    /// Consume the machine and return the recorded trace.
    pub fn into_collection(self) -> Collection {
        self.collection
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use ecow::EcoString;
use indexmap::IndexMap;

use crate::foundations::{Object, Value};

/// A stack of scopes.
///
/// Cloning copies the spine but shares the frames. A capture therefore
/// survives later pops of the live stack, while writes inside a shared frame
/// stay visible to every closure holding it, which is how closures observe
/// each other.
#[derive(Debug, Default, Clone)]
pub struct Scopes {
    /// The active, innermost scope.
    pub top: Scope,
    /// The enclosing scopes, outermost first.
    pub scopes: Vec<Scope>,
    /// The host context object backing unresolved names.
    pub base: Option<Object>,
}

impl Scopes {
    /// Create a new, empty hierarchy of scopes.
    pub fn new(base: Option<Object>) -> Self {
        Self { top: Scope::new(), scopes: vec![], base }
    }

    /// Enter a new scope.
    pub fn enter(&mut self) {
        self.scopes.push(std::mem::take(&mut self.top));
    }

    /// Exit the topmost scope.
    ///
    /// This panics if no scope was entered.
    pub fn exit(&mut self) {
        self.top = self.scopes.pop().expect("no pushed scope");
    }

    /// Bind a value in the innermost scope.
    pub fn define(&mut self, name: impl Into<EcoString>, value: impl Into<Value>) {
        self.top.define(name, value);
    }

    /// Look a name up, innermost scope first, then the host context.
    /// Unresolved names read as `undefined`.
    pub fn get(&self, var: &str) -> Value {
        std::iter::once(&self.top)
            .chain(self.scopes.iter().rev())
            .find_map(|scope| scope.get(var))
            .or_else(|| {
                let base = self.base.as_ref()?;
                base.has(var).then(|| base.get(var))
            })
            .unwrap_or_default()
    }

    /// Write the nearest scope that defines the name. When none does, the
    /// write lands on the host context, the process-wide outermost frame,
    /// so an undeclared top-level assignment behaves like a browser global.
    pub fn update(&mut self, var: &str, value: Value) {
        let defining = std::iter::once(&self.top)
            .chain(self.scopes.iter().rev())
            .find(|scope| scope.defines(var));
        match defining {
            Some(scope) => scope.define(var.to_owned(), value),
            None => match &self.base {
                Some(base) => base.set(var, value),
                None => self
                    .scopes
                    .first()
                    .unwrap_or(&self.top)
                    .define(var.to_owned(), value),
            },
        }
    }
}

/// A map from binding names to values.
///
/// Frames are shared handles: a closure that captured this frame and the
/// code still executing inside it write the same storage.
#[derive(Debug, Default, Clone)]
pub struct Scope(Rc<RefCell<IndexMap<EcoString, Value>>>);

impl Scope {
    /// Create a new empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a name, defining or overwriting it.
    pub fn define(&self, name: impl Into<EcoString>, value: impl Into<Value>) {
        self.0.borrow_mut().insert(name.into(), value.into());
    }

    /// Read a binding.
    pub fn get(&self, var: &str) -> Option<Value> {
        self.0.borrow().get(var).cloned()
    }

    /// Whether the scope defines the name.
    pub fn defines(&self, var: &str) -> bool {
        self.0.borrow().contains_key(var)
    }
}

//! Shared runtime values and environments.

pub mod ops;

mod func;
mod object;
mod scope;
mod value;

pub use self::func::{Closure, Func, FuncRepr, NativeFunc};
pub use self::object::{HostClass, Object};
pub use self::scope::{Scope, Scopes};
pub use self::value::Value;

//! The contract between the interpreter and a checker.
//!
//! The interpreter submits every member call and member assignment it
//! executes; the checker decides which of them count as manipulations worth
//! recording. The interpreter treats the verdict opaquely except for its
//! `kind` and optional `target`.

use ecow::EcoString;

use crate::foundations::{Object, Value};

/// A call or assignment site under scrutiny.
pub struct CheckSite<'a> {
    /// The host context the program runs against.
    pub context: &'a Object,
    /// The receiver of the operation.
    pub caller: &'a Value,
    /// The operation itself.
    pub callee: SiteCallee<'a>,
}

/// What happens at a checked site.
pub enum SiteCallee<'a> {
    /// A method call `caller.key(args)`.
    Method { key: &'a str, args: &'a [Value] },
    /// A member assignment `caller.key = value`.
    Assign { key: &'a str, value: &'a Value },
}

impl SiteCallee<'_> {
    /// The accessed property name.
    pub fn key(&self) -> &str {
        match self {
            Self::Method { key, .. } | Self::Assign { key, .. } => key,
        }
    }
}

/// A positive verdict.
pub struct Status {
    /// The checker's classification, copied into the trace entry.
    pub kind: EcoString,
    /// The object the operation really affects, when it is not the caller
    /// itself.
    pub target: Option<Value>,
}

impl Status {
    /// A verdict with the caller as the affected object.
    pub fn of_kind(kind: impl Into<EcoString>) -> Self {
        Self { kind: kind.into(), target: None }
    }
}

/// Classifies executed call and assignment sites.
pub trait Checker {
    /// The verdict for one site; `None` means not interesting.
    fn dispatch(&self, site: CheckSite) -> Option<Status>;
}

/// The unit checker records nothing.
impl Checker for () {
    fn dispatch(&self, _: CheckSite) -> Option<Status> {
        None
    }
}

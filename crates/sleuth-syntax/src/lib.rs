//! The ESTree node model consumed by the Sleuth interpreter.
//!
//! Nodes are produced by an external JavaScript parser (esprima, acorn, or
//! anything else that speaks the ESTree shape) and arrive here as JSON. The
//! types in [`ast`] deserialize that JSON directly; the interpreter never
//! mutates them.

pub mod ast;

mod unparse;

pub use self::unparse::unparse;

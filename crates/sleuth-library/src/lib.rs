//! The runtime foundations of Sleuth.
//!
//! This crate holds everything the interpreter manipulates but does not
//! itself define: the value model, scopes, value operations, the trace
//! collection, the checker contract, and a set of synthetic browser doubles
//! that stand in for a real host context.

pub mod checker;
pub mod collection;
pub mod diag;
pub mod foundations;
pub mod host;

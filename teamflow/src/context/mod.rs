//! Context management for team runs.
//!
//! This module provides:
//! - [`ContextValue`], the closed set of value shapes stages exchange
//! - [`Context`], the append/overwrite-only accumulator folded through a team

mod bag;
#[cfg(test)]
mod context_tests;
mod value;

pub use bag::Context;
pub use value::ContextValue;

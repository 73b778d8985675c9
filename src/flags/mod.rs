//! Flag translation.
//!
//! Turns a validated configuration into the ordered build-definition list
//! handed to the native build tool. Pure and deterministic: same recipe,
//! configuration, and installed metadata always produce the same output in
//! the same order.

pub mod define;
pub mod translate;

pub use define::BuildDefine;
pub use translate::translate;

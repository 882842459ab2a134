//! Input/output helpers.
//!
//! - the persisted CSV store (`store`)
//! - wide-form CSV export (`export`)

pub mod export;
pub mod store;

pub use export::*;
pub use store::*;

//! Core invoice types, contact registry, numbering, totals and session state.
//!
//! Everything here is pure data plus the operations on it; renderers,
//! reports and remote sync live behind their own features.

mod builder;
mod error;
mod format;
mod lifecycle;
mod numbering;
mod registry;
mod session;
mod store;
pub mod tables;
mod tax;
mod types;
mod validation;

pub use builder::*;
pub use error::*;
pub use format::*;
pub use lifecycle::*;
pub use numbering::*;
pub use registry::*;
pub use session::*;
pub use store::*;
pub use tables::{Table, contacts_from_table, contacts_table, documents_table};
pub use tax::*;
pub use types::*;
pub use validation::*;

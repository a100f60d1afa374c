//! Build Server Protocol wire types.
//!
//! Field names follow the protocol's camelCase JSON. Payloads that the protocol attaches as a
//! `dataKind`/`data` pair are modelled as adjacently tagged enums flattened into their parent.

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod jvm;
mod lifecycle;
mod log;
pub mod methods;
mod query;
mod run;
mod target;
mod task;

pub use jvm::*;
pub use lifecycle::*;
pub use log::*;
pub use query::*;
pub use run::*;
pub use target::*;
pub use task::*;
pub use test::*;

/// Protocol version implemented by the server.
pub const BSP_VERSION: &str = "2.1.0";

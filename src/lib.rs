//! Persist and resolve single-key values in a `.env` file.
//!
//! [`EnvStore`] reads `KEY=VALUE` lines from one file, resolves keys through
//! an environment table, the file, and construction-time defaults, and
//! rewrites the file atomically on every change.
//!
//! The default environment table is an in-memory snapshot of the process
//! environment. [`EnvTable::process`] writes through to the real process
//! environment instead and is `unsafe`, because callers must guarantee no
//! concurrent process-environment access.

mod env;
mod error;
mod model;
mod parser;
mod prompt;
mod store;
mod writer;

pub use env::EnvTable;
pub use error::Error;
pub use model::{Entry, EnvMap};
pub use parser::{parse_bytes, parse_reader, parse_str};
pub use prompt::Prompt;
pub use store::{EnvStore, lookup, lookup_in};
pub use writer::{render, write_atomic};

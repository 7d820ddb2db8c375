//! tally-ingest: bank statement and budget ledger loaders, few-shot history discovery.

pub mod error;
pub mod history;
pub mod parsers;

pub use error::{IngestError, Result};
pub use history::{latest_statement, load_history};
pub use parsers::dual_ledger::{load_ledger, parse_ledger};
pub use parsers::sg_statement::{load_statement, parse_statement};

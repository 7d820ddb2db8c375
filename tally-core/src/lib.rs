//! tally-core: statement/ledger types, taxonomy, prompt assembly and response parsing

pub mod amount;
pub mod completion;
pub mod ledger;
pub mod prompt;
pub mod response;
pub mod taxonomy;

pub use amount::{format_amount, parse_amount, sheet_amount};
pub use completion::{CannedCompleter, Completer};
pub use ledger::{CategorizedRow, Example, Ledger, Section, Transaction};
pub use prompt::{PromptBuilder, build_prompt};
pub use response::{ParsedResponse, SkipReason, SkippedLine, SkippedLinePolicy, parse_response};
pub use taxonomy::Taxonomy;

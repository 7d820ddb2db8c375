//! tally-ledger: renders categorized rows as the dual-table CSV and as a styled workbook

pub mod csv_writer;
pub mod sheet_writer;

pub use csv_writer::{save_ledger_csv, write_ledger_csv};
pub use sheet_writer::{CellStyle, SheetDate, SheetLayout, fill_workbook, parse_sheet_date};

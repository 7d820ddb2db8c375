//! Dual-table budget ledger (CSV export of the "Transactions" sheet)
//!
//! Two tables side by side, column 0 and 5 left empty:
//!
//! ```text
//! ,"Pour modifier ou ajouter des catégories, ...",,,,,,,,
//! ,Dépenses,,,,,Revenus,,,
//! ,,,,,,,,,
//! ,Date,Montant,Description,Catégorie,,Date,Montant,Description,Catégorie
//! ,02/03/2026,"42,50 €",MONOPRIX,Courses,,28/03/2026,"1800,00 €",SALAIRE,Salaire
//! ```

use csv::StringRecord;
use std::fs;
use std::path::Path;
use tally_core::{CategorizedRow, Ledger, Section};

use super::fold;
use crate::error::{IngestError, Result};

/// Rows above the column header (instruction, titles, blank)
pub const LEADING_ROWS: usize = 3;
/// First column of each table
pub const EXPENSE_COL: usize = 1;
pub const INCOME_COL: usize = 6;

const COLUMNS: [&str; 4] = ["date", "montant", "description", "categorie"];

pub fn load_ledger(path: impl AsRef<Path>) -> Result<Ledger> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
    parse_named(&text, &path.display().to_string())
}

pub fn parse_ledger(text: &str) -> Result<Ledger> {
    parse_named(text, "<ledger>")
}

fn parse_named(text: &str, origin: &str) -> Result<Ledger> {
    let text = text.trim_start_matches('\u{feff}');
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let records = rdr
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()
        .map_err(|e| IngestError::csv(origin, e))?;

    // Blank lines are skipped by the reader, so accept the header anywhere
    // within the leading block.
    let header_idx = records
        .iter()
        .take(LEADING_ROWS + 1)
        .position(is_header)
        .ok_or_else(|| {
            IngestError::malformed(
                origin,
                (LEADING_ROWS + 1) as u64,
                "missing Date/Montant/Description/Catégorie header for both tables",
            )
        })?;

    let mut ledger = Ledger::default();
    for record in &records[header_idx + 1..] {
        for (section, col) in [(Section::Expenses, EXPENSE_COL), (Section::Income, INCOME_COL)] {
            let row = row_at(record, col);
            if !row.is_blank() {
                ledger.push(section, row);
            }
        }
    }
    Ok(ledger)
}

fn is_header(record: &StringRecord) -> bool {
    [EXPENSE_COL, INCOME_COL].iter().all(|&start| {
        COLUMNS
            .iter()
            .enumerate()
            .all(|(i, name)| record.get(start + i).map(fold).as_deref() == Some(*name))
    })
}

fn row_at(record: &StringRecord, start: usize) -> CategorizedRow {
    let field = |i: usize| record.get(start + i).unwrap_or("").trim();
    CategorizedRow::new(field(0), field(1), field(2), field(3))
}

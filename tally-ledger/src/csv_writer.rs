//! Flat dual-table CSV, same shape as the budget sheet export.
//!
//! Four fixed rows, then one row per index up to the longer table; the
//! shorter table is padded with empty fields. Amounts go through
//! [`format_amount`] and get quoted since they contain a comma.

use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tally_core::{CategorizedRow, Ledger, Section, format_amount};

pub const INSTRUCTION: &str = "Pour modifier ou ajouter des catégories, modifiez les tableaux \
\"Dépenses\" et \"Revenus\" de la feuille \"Récapitulatif\".";

const COLUMNS: [&str; 4] = ["Date", "Montant", "Description", "Catégorie"];
const WIDTH: usize = 10;

/// Rows before the first data row
pub const HEADER_ROWS: usize = 4;

fn header_rows() -> Vec<[String; WIDTH]> {
    let mut instruction: [String; WIDTH] = Default::default();
    instruction[1] = INSTRUCTION.to_string();

    let mut titles: [String; WIDTH] = Default::default();
    titles[1] = Section::Expenses.title().to_string();
    titles[6] = Section::Income.title().to_string();

    let blank: [String; WIDTH] = Default::default();

    let mut columns: [String; WIDTH] = Default::default();
    for (i, c) in COLUMNS.iter().enumerate() {
        columns[1 + i] = c.to_string();
        columns[6 + i] = c.to_string();
    }

    vec![instruction, titles, blank, columns]
}

fn put(line: &mut [String; WIDTH], start: usize, row: Option<&CategorizedRow>) {
    if let Some(r) = row {
        line[start] = r.date.clone();
        line[start + 1] = format_amount(&r.amount);
        line[start + 2] = r.description.clone();
        line[start + 3] = r.category.clone();
    }
}

pub fn write_ledger_csv<W: Write>(ledger: &Ledger, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    for row in header_rows() {
        wtr.write_record(&row).context("write ledger header")?;
    }

    for i in 0..ledger.height() {
        let mut line: [String; WIDTH] = Default::default();
        put(&mut line, 1, ledger.expenses.get(i));
        put(&mut line, 6, ledger.income.get(i));
        wtr.write_record(&line).context("write ledger row")?;
    }

    wtr.flush().context("flush ledger csv")?;
    Ok(())
}

pub fn save_ledger_csv(ledger: &Ledger, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_ledger_csv(ledger, file).with_context(|| format!("write {}", path.display()))?;
    info!("ledger csv written to {}", path.display());
    Ok(())
}

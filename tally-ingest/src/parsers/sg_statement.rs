//! Société Générale account statement export (CSV)
//!
//! Layout: two meta lines (account number, period), then a `;`-separated
//! table in ISO-8859-1 with comma decimals:
//!
//! ```text
//! ="000123456789";Compte Bancaire;...
//! Solde au 31/03/2026;1 234,56 EUR
//! Date de l'opération;Libellé;Détail de l'écriture;Montant de l'opération;Devise
//! 05/03/2026;CARTE X1234;CARTE X1234 04/03 MONOPRIX;-42,50;EUR
//! ```

use log::debug;
use std::fs;
use std::path::Path;
use tally_core::{Taxonomy, Transaction};

use super::fold;
use crate::error::{IngestError, Result};

/// Meta lines preceding the column header
pub const SKIPPED_LINES: usize = 2;

/// Expected column header prefixes, after [`fold`]
pub const HEADER: [&str; 5] = ["date", "libelle", "detail", "montant", "devise"];

/// Decode statement bytes: UTF-8 when valid, ISO-8859-1 otherwise.
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            debug!("statement is not utf-8; decoding as iso-8859-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Parse a comma-decimal amount such as "-1 234,50".
fn parse_statement_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    cleaned.replace(',', ".").parse().ok()
}

/// Load a statement file, dropping rows matched by the taxonomy's exclusions.
pub fn load_statement(path: impl AsRef<Path>, taxonomy: &Taxonomy) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| IngestError::io(path, e))?;
    parse_named(&decode(&bytes), &path.display().to_string(), taxonomy)
}

/// Same as [`load_statement`] on already-decoded text.
pub fn parse_statement(text: &str, taxonomy: &Taxonomy) -> Result<Vec<Transaction>> {
    parse_named(text, "<statement>", taxonomy)
}

fn parse_named(text: &str, origin: &str, taxonomy: &Taxonomy) -> Result<Vec<Transaction>> {
    let body = text
        .splitn(SKIPPED_LINES + 1, '\n')
        .nth(SKIPPED_LINES)
        .ok_or_else(|| IngestError::malformed(origin, 1, "missing column header"))?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let header_line = SKIPPED_LINES as u64 + 1;
    let headers = rdr.headers().map_err(|e| IngestError::csv(origin, e))?.clone();
    let names: Vec<String> = headers.iter().map(fold).collect();
    let names = trim_extra_blanks(&names);
    if names.len() != HEADER.len() {
        return Err(IngestError::malformed(
            origin,
            header_line,
            format!("expected {} columns, found {}", HEADER.len(), names.len()),
        ));
    }
    for (name, expected) in names.iter().zip(HEADER) {
        if !name.starts_with(expected) {
            return Err(IngestError::malformed(
                origin,
                header_line,
                format!("unexpected column {name:?} (expected {expected})"),
            ));
        }
    }

    let mut out = Vec::new();
    let mut excluded = 0usize;
    for result in rdr.records() {
        let record = result.map_err(|e| IngestError::csv(origin, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0) + SKIPPED_LINES as u64;

        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        let fields = trim_extra_blanks(&fields);
        if fields.len() != HEADER.len() {
            return Err(IngestError::malformed(
                origin,
                line,
                format!("expected {} fields, found {}", HEADER.len(), fields.len()),
            ));
        }

        let amount = parse_statement_amount(&fields[3]).ok_or_else(|| {
            IngestError::malformed(origin, line, format!("invalid amount {:?}", fields[3]))
        })?;

        let txn = Transaction {
            date: fields[0].clone(),
            label: fields[1].clone(),
            detail: fields[2].clone(),
            amount,
            currency: fields[4].clone(),
        };

        if taxonomy.is_excluded(&txn.detail) {
            excluded += 1;
            continue;
        }
        out.push(txn);
    }

    debug!("{origin}: {} transactions kept, {excluded} excluded", out.len());
    Ok(out)
}

/// Drop empty fields past the fifth column; empty fields inside the
/// schema are kept.
fn trim_extra_blanks(fields: &[String]) -> &[String] {
    let last_filled = fields
        .iter()
        .rposition(|f| !f.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    &fields[..last_filled.max(HEADER.len().min(fields.len()))]
}

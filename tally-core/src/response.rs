//! Tolerant parser for the model's two-section CSV answer.
//!
//! Expected shape (see [`crate::prompt`]):
//!
//! ```text
//! --- DÉPENSES ---
//! Date;Montant;Description;Catégorie
//! 05/03/2026;-42,50;CARTE X1 MONOPRIX;Courses
//!
//! --- REVENUS ---
//! Date;Montant;Description;Catégorie
//! 28/03/2026;1800,00;VIR SALAIRE;Salaire
//! ```
//!
//! The model does not always honor that shape, so parsing never fails:
//! unusable lines are set aside in [`ParsedResponse::skipped`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ledger::{CategorizedRow, Ledger, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than four fields after splitting
    TooFewFields,
    /// Data seen before any section marker
    NoSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the raw response
    pub line_no: usize,
    pub text: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub ledger: Ledger,
    pub skipped: Vec<SkippedLine>,
}

/// What to do with lines the parser had to drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkippedLinePolicy {
    Silent,
    #[default]
    Warn,
}

impl ParsedResponse {
    /// Log dropped lines according to `policy`; returns how many there were.
    pub fn report_skipped(&self, policy: SkippedLinePolicy) -> usize {
        for s in &self.skipped {
            match policy {
                SkippedLinePolicy::Warn => {
                    warn!("dropped response line {} ({:?}): {}", s.line_no, s.reason, s.text)
                }
                SkippedLinePolicy::Silent => {
                    debug!("dropped response line {} ({:?}): {}", s.line_no, s.reason, s.text)
                }
            }
        }
        self.skipped.len()
    }
}

/// Section a marker line switches to, if it is one.
pub fn section_of(line: &str) -> Option<Section> {
    let upper = line.to_uppercase();
    if upper.contains("DÉPENSES") || upper.contains("DEPENSES") {
        Some(Section::Expenses)
    } else if upper.contains("REVENUS") {
        Some(Section::Income)
    } else {
        None
    }
}

fn is_header(line: &str) -> bool {
    line.to_lowercase().starts_with("date")
}

/// Split on `;` when present, else on `,`, keeping the first four fields.
fn split_row(line: &str) -> Option<CategorizedRow> {
    let parts: Vec<&str> = if line.contains(';') {
        line.split(';').collect()
    } else {
        line.split(',').collect()
    };
    if parts.len() < 4 {
        return None;
    }
    Some(CategorizedRow::new(
        parts[0].trim(),
        parts[1].trim(),
        parts[2].trim(),
        parts[3].trim(),
    ))
}

pub fn parse_response(text: &str) -> ParsedResponse {
    let mut out = ParsedResponse::default();
    let mut current: Option<Section> = None;

    for (i, line) in text.lines().enumerate() {
        let l = line.trim();
        if l.is_empty() {
            continue;
        }
        if let Some(section) = section_of(l) {
            current = Some(section);
            continue;
        }
        if is_header(l) {
            continue;
        }

        let skip = |reason| SkippedLine {
            line_no: i + 1,
            text: l.to_string(),
            reason,
        };
        match (split_row(l), current) {
            (Some(row), Some(section)) => out.ledger.push(section, row),
            (Some(_), None) => out.skipped.push(skip(SkipReason::NoSection)),
            (None, _) => out.skipped.push(skip(SkipReason::TooFewFields)),
        }
    }

    out
}

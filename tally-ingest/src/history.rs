//! Few-shot history: past statements paired with the budgets filed for them.
//!
//! Statements are named `<month><year>.csv` (`janvier2026.csv`); the matching
//! budget is the first CSV in the budgets directory whose lowercase name
//! contains both parts (`Budget Janvier 2026 - Transactions.csv`).

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::{Example, Taxonomy};

use crate::error::{IngestError, Result};
use crate::parsers::dual_ledger::load_ledger;
use crate::parsers::sg_statement::load_statement;

/// `.csv` files directly under `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))? {
        let p = entry.map_err(|e| IngestError::io(dir, e))?.path();
        let is_csv = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && p.is_file() {
            out.push(p);
        }
    }
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(out)
}

/// Last statement by file name, if any.
pub fn latest_statement(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(csv_files(dir)?.pop())
}

/// Split a statement stem into (period, year): "janvier2026" -> ("janvier", "2026").
pub fn period_of(stem: &str) -> (String, String) {
    let period = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    (period.to_lowercase(), stem[period.len()..].to_string())
}

fn file_name_lower(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Load every statement/budget pair found, skipping `exclude` (the statement
/// being categorized must not serve as its own example).
pub fn load_history(
    statements_dir: &Path,
    budgets_dir: &Path,
    taxonomy: &Taxonomy,
    exclude: Option<&Path>,
) -> Result<Vec<Example>> {
    info!(
        "loading examples from {} and {}",
        statements_dir.display(),
        budgets_dir.display()
    );
    let budgets = csv_files(budgets_dir)?;
    let mut out = Vec::new();

    for statement in csv_files(statements_dir)? {
        if exclude.is_some_and(|x| same_file(x, &statement)) {
            continue;
        }
        let stem = statement
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let (period, year) = period_of(&stem);
        if period.is_empty() {
            continue;
        }

        let Some(budget) = budgets.iter().find(|b| {
            let name = file_name_lower(b);
            name.contains(&period) && name.contains(&year)
        }) else {
            debug!("no budget for {}", statement.display());
            continue;
        };

        debug!("example {period}: {} + {}", statement.display(), budget.display());
        out.push(Example {
            period,
            statement: load_statement(&statement, taxonomy)?,
            ledger: load_ledger(budget)?,
        });
    }

    Ok(out)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "m\nm\nDate;Libellé;Détail;Montant;Devise\n02/01/2026;CB;MONOPRIX;-12,00;EUR\n";
    const BUDGET: &str = ",i,,,,,,,,\n,Dépenses,,,,,Revenus,,,\n,,,,,,,,,\n\
,Date,Montant,Description,Catégorie,,Date,Montant,Description,Catégorie\n\
,02/01/2026,\"12,00 €\",MONOPRIX,Courses,,,,,\n";

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(&["Courses"], &["Salaire"], &[])
    }

    #[test]
    fn test_period_of() {
        assert_eq!(period_of("janvier2026"), ("janvier".to_string(), "2026".to_string()));
        assert_eq!(period_of("Fevrier"), ("fevrier".to_string(), String::new()));
        assert_eq!(period_of("2026"), (String::new(), "2026".to_string()));
    }

    #[test]
    fn test_pairs_statements_with_budgets() {
        let dir = tempfile::tempdir().unwrap();
        let releves = dir.path().join("sog_releve");
        let budgets = dir.path().join("exemples_budget");
        fs::create_dir_all(&releves).unwrap();
        fs::create_dir_all(&budgets).unwrap();

        fs::write(releves.join("janvier2026.csv"), STATEMENT).unwrap();
        fs::write(releves.join("fevrier2026.csv"), STATEMENT).unwrap();
        fs::write(releves.join("mars2026.csv"), STATEMENT).unwrap();
        fs::write(budgets.join("Budget Janvier 2026 - Transactions.csv"), BUDGET).unwrap();
        fs::write(budgets.join("Budget Fevrier 2025 - Transactions.csv"), BUDGET).unwrap();
        fs::write(budgets.join("Budget Mars 2026 - Transactions.csv"), BUDGET).unwrap();

        let examples = load_history(
            &releves,
            &budgets,
            &taxonomy(),
            Some(releves.join("mars2026.csv").as_path()),
        )
        .unwrap();

        // fevrier has no 2026 budget, mars is the excluded target
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].period, "janvier");
        assert_eq!(examples[0].statement.len(), 1);
        assert_eq!(examples[0].ledger.expenses[0].category, "Courses");
    }

    #[test]
    fn test_missing_dirs_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let examples = load_history(&dir.path().join("a"), &dir.path().join("b"), &taxonomy(), None).unwrap();
        assert!(examples.is_empty());
    }

    #[test]
    fn test_latest_statement_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2026-01.csv"), "").unwrap();
        fs::write(dir.path().join("2026-03.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let latest = latest_statement(dir.path()).unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "2026-03.csv");

        let empty = tempfile::tempdir().unwrap();
        assert!(latest_statement(empty.path()).unwrap().is_none());
    }
}

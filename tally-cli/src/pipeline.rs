//! One run: statement -> prompt -> model -> parsed rows -> ledger files.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::{Completer, Ledger, PromptBuilder, SkippedLinePolicy, Taxonomy, parse_response};
use tally_ingest::{latest_statement, load_history, load_ledger, load_statement};
use tally_ledger::{SheetLayout, fill_workbook, save_ledger_csv};

use crate::state::ensure_parent;

#[derive(Debug, Clone)]
pub struct WorkbookOutput {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// Every path a run touches, resolved up front
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub statement: PathBuf,
    /// Blank dual-table CSV whose layout goes into the prompt
    pub template_csv: Option<PathBuf>,
    pub statements_dir: PathBuf,
    pub budgets_dir: PathBuf,
    pub output_csv: PathBuf,
    pub workbook: Option<WorkbookOutput>,
    pub debug_prompt: Option<PathBuf>,
    pub skipped_lines: SkippedLinePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub transactions: usize,
    pub examples: usize,
    pub expenses: usize,
    pub income: usize,
    pub skipped: usize,
}

/// The statement to process: `given` when set, else the last CSV by name in
/// `statements_dir`. `None` when there is nothing to process.
pub fn resolve_statement(given: Option<PathBuf>, statements_dir: &Path) -> Result<Option<PathBuf>> {
    if let Some(p) = given {
        return Ok(Some(p));
    }
    let latest = latest_statement(statements_dir)?;
    if let Some(name) = latest.as_deref().and_then(Path::file_name) {
        println!("Using statement: {}", name.to_string_lossy());
    }
    Ok(latest)
}

pub fn run(plan: &RunPlan, taxonomy: &Taxonomy, model: &dyn Completer) -> Result<RunSummary> {
    println!("Loading data...");
    let statement = load_statement(&plan.statement, taxonomy)
        .with_context(|| format!("loading statement {}", plan.statement.display()))?;
    println!(
        "Statement loaded: {} transactions from {}",
        statement.len(),
        plan.statement.display()
    );
    for t in statement.iter().take(3) {
        println!("  {} | {} | {:.2} {}", t.date, t.detail, t.amount, t.currency);
    }

    let template = match &plan.template_csv {
        Some(p) => Some(load_ledger(p).with_context(|| format!("loading template {}", p.display()))?),
        None => None,
    };

    let examples = load_history(
        &plan.statements_dir,
        &plan.budgets_dir,
        taxonomy,
        Some(plan.statement.as_path()),
    )
    .context("loading examples")?;
    let periods: Vec<_> = examples.iter().map(|e| e.period.as_str()).collect();
    println!("Examples loaded: {:?}", periods);

    let mut builder = PromptBuilder::new(taxonomy, &statement).examples(&examples);
    if let Some(t) = &template {
        builder = builder.template(t);
    }
    let prompt = builder.build();

    if let Some(p) = &plan.debug_prompt {
        ensure_parent(p)?;
        fs::write(p, &prompt).with_context(|| format!("write {}", p.display()))?;
        println!("Prompt saved to: {}", p.display());
    }

    println!("Calling the model...");
    let answer = model.complete(&prompt)?;

    let parsed = parse_response(&answer);
    let skipped = parsed.report_skipped(plan.skipped_lines);
    if skipped > 0 && plan.skipped_lines == SkippedLinePolicy::Warn {
        println!("Warning: {skipped} line(s) of the model answer could not be parsed and were dropped");
    }
    let ledger: &Ledger = &parsed.ledger;
    println!(
        "Categorized: {} expenses, {} income",
        ledger.expenses.len(),
        ledger.income.len()
    );

    ensure_parent(&plan.output_csv)?;
    save_ledger_csv(ledger, &plan.output_csv)?;
    println!("Result saved to: {}", plan.output_csv.display());

    if let Some(wb) = &plan.workbook {
        ensure_parent(&wb.output)?;
        fill_workbook(&wb.template, &wb.output, ledger, &SheetLayout::default())?;
        println!("Workbook saved to: {}", wb.output.display());
    }

    Ok(RunSummary {
        transactions: statement.len(),
        examples: examples.len(),
        expenses: ledger.expenses.len(),
        income: ledger.income.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tally_core::CannedCompleter;

    const STATEMENT: &str = "m\nm\nDate;Libellé;Détail;Montant;Devise\n\
05/03/2026;CB;CARTE MONOPRIX;-42,50;EUR\n\
10/03/2026;VIR;VIR PERM LIVRET;-100,00;EUR\n\
28/03/2026;VIR;VIR RECU SALAIRE;1800,00;EUR\n";

    const TEMPLATE: &str = ",x,,,,,,,,\n,Dépenses,,,,,Revenus,,,\n,,,,,,,,,\n\
,Date,Montant,Description,Catégorie,,Date,Montant,Description,Catégorie\n";

    const ANSWER: &str = "--- DÉPENSES ---\nDate;Montant;Description;Catégorie\n\
05/03/2026;-42.5;CARTE MONOPRIX;Courses\n\
bad line\n\n\
--- REVENUS ---\nDate;Montant;Description;Catégorie\n\
28/03/2026;1800;VIR RECU SALAIRE;Salaire\n";

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(&["Courses"], &["Salaire"], &["VIR PERM"])
    }

    fn plan(root: &Path) -> RunPlan {
        let statements_dir = root.join("inputs/sog_releve");
        fs::create_dir_all(&statements_dir).unwrap();
        let statement = statements_dir.join("mars2026.csv");
        fs::write(&statement, STATEMENT).unwrap();
        let template = root.join("template.csv");
        fs::write(&template, TEMPLATE).unwrap();

        RunPlan {
            statement,
            template_csv: Some(template),
            statements_dir,
            budgets_dir: root.join("inputs/exemples_budget"),
            output_csv: root.join("outputs/budget_mars2026.csv"),
            workbook: None,
            debug_prompt: Some(root.join("outputs/debug_prompt.txt")),
            skipped_lines: SkippedLinePolicy::Warn,
        }
    }

    #[test]
    fn test_resolve_statement_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let statements = dir.path().join("inputs/sog_releve");
        assert_eq!(resolve_statement(None, &statements).unwrap(), None);

        fs::create_dir_all(&statements).unwrap();
        fs::write(statements.join("notes.txt"), "").unwrap();
        assert_eq!(resolve_statement(None, &statements).unwrap(), None);
    }

    #[test]
    fn test_resolve_statement_picks_latest_or_given() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fevrier2026.csv"), "").unwrap();
        fs::write(dir.path().join("mars2026.csv"), "").unwrap();

        let latest = resolve_statement(None, dir.path()).unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "mars2026.csv");

        let given = PathBuf::from("elsewhere/janvier2026.csv");
        assert_eq!(resolve_statement(Some(given.clone()), dir.path()).unwrap(), Some(given));
    }

    #[test]
    fn test_run_writes_ledger_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());

        let summary = run(&plan, &taxonomy(), &CannedCompleter::new(ANSWER)).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                transactions: 2,
                examples: 0,
                expenses: 1,
                income: 1,
                skipped: 1,
            }
        );

        let csv = fs::read_to_string(&plan.output_csv).unwrap();
        assert_eq!(csv.lines().count(), 5);

        let prompt = fs::read_to_string(dir.path().join("outputs/debug_prompt.txt")).unwrap();
        assert!(prompt.contains("Voici le template vide à remplir"));
        assert!(!prompt.contains("VIR PERM LIVRET"));
    }

    #[test]
    fn test_model_sees_the_prompt_once() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        let calls = RefCell::new(Vec::new());
        let model = |p: &str| -> Result<String> {
            calls.borrow_mut().push(p.to_string());
            Ok(ANSWER.to_string())
        };

        run(&plan, &taxonomy(), &model).unwrap();
        let calls = calls.into_inner();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("05/03/2026;CARTE MONOPRIX;-42.5"));
    }

    #[test]
    fn test_model_failure_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        let model = |_: &str| -> Result<String> { anyhow::bail!("429 rate limited") };

        let err = run(&plan, &taxonomy(), &model).unwrap_err();
        assert!(err.to_string().contains("429"));
        assert!(!plan.output_csv.exists());
    }

    #[test]
    fn test_malformed_statement_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        fs::write(&plan.statement, "m\nm\nDate;Montant\n01/03/2026;-1\n").unwrap();

        let err = run(&plan, &taxonomy(), &CannedCompleter::new(ANSWER)).unwrap_err();
        assert!(format!("{err:#}").contains("malformed"));
    }
}

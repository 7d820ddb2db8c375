use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tally_core::Taxonomy;

mod config;
mod llm;
mod pipeline;
mod state;

use llm::{LlmClient, LlmConfig};
use pipeline::{RunPlan, WorkbookOutput};
use state::DataDirs;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Categorize a bank statement into the monthly budget ledger"
)]
struct Cli {
    /// Statement CSV (defaults to the last one in <data_dir>/inputs/sog_releve)
    statement: Option<PathBuf>,

    /// Output path for the filled ledger CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Blank ledger template CSV shown to the model
    #[arg(short, long)]
    template: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    let cfg = config::load_config()?;
    let taxonomy = Taxonomy::load(&cfg.paths.categories)
        .with_context(|| format!("loading categories {}", cfg.paths.categories.display()))?;
    let client = LlmClient::new(LlmConfig::from_section(&cfg.llm)?);
    log::info!("using model {}", client.model());

    let dirs = DataDirs::new(&cfg.paths.data_dir);

    let Some(statement) = pipeline::resolve_statement(cli.statement, &dirs.statements())? else {
        println!("Error: no statement found in {}", dirs.statements().display());
        return Ok(());
    };

    let template_csv = match cli.template {
        Some(p) => Some(p),
        None => Some(dirs.template_csv()).filter(|p| p.exists()),
    };

    let template_workbook = dirs.template_workbook();
    let workbook = template_workbook.exists().then(|| WorkbookOutput {
        template: template_workbook,
        output: dirs.output_for(&statement, "xlsx"),
    });

    let plan = RunPlan {
        output_csv: cli
            .output
            .unwrap_or_else(|| dirs.output_for(&statement, "csv")),
        statement,
        template_csv,
        statements_dir: dirs.statements(),
        budgets_dir: dirs.budgets(),
        workbook,
        debug_prompt: cfg.debug_prompt.then(|| dirs.debug_prompt()),
        skipped_lines: cfg.parser.skipped_lines,
    };

    pipeline::run(&plan, &taxonomy, &client)?;
    println!("Done!");
    Ok(())
}

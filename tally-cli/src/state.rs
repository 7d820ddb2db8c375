use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn tally_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tally"))
}

/// Working-data layout under the configured data dir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirs {
    pub root: PathBuf,
}

impl DataDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Raw bank exports, one per month
    pub fn statements(&self) -> PathBuf {
        self.root.join("inputs").join("sog_releve")
    }

    /// Budgets filed by hand for past months (few-shot examples)
    pub fn budgets(&self) -> PathBuf {
        self.root.join("inputs").join("exemples_budget")
    }

    pub fn template_csv(&self) -> PathBuf {
        self.root.join("template").join("template_feuille_transactions.csv")
    }

    pub fn template_workbook(&self) -> PathBuf {
        self.root.join("template").join("template_a_remplir.xlsx")
    }

    pub fn outputs(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn debug_prompt(&self) -> PathBuf {
        self.outputs().join("debug_prompt.txt")
    }

    pub fn output_for(&self, statement: &Path, ext: &str) -> PathBuf {
        let stem = statement
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "statement".to_string());
        self.outputs().join(format!("budget_{stem}.{ext}"))
    }
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}

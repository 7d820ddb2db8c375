//! Category taxonomy and statement exclusions.
//!
//! Loaded once from a JSON file shaped like:
//!
//! ```json
//! {
//!   "depenses": ["Courses", "Restaurant", "Transport"],
//!   "revenus": ["Salaire", "Remboursement"],
//!   "exclusions": ["VIR PERM", "BETCLIC"]
//! }
//! ```
//!
//! The value is immutable after construction and passed by reference to the
//! loaders and the prompt builder.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "depenses", alias = "expense_categories")]
    pub expense_categories: Vec<String>,
    #[serde(rename = "revenus", alias = "income_categories")]
    pub income_categories: Vec<String>,
    /// Substrings of the statement detail field that drop a transaction
    #[serde(rename = "exclusions", alias = "exclusion_patterns", default)]
    pub exclusion_patterns: Vec<String>,
}

impl Taxonomy {
    pub fn new(expenses: &[&str], income: &[&str], exclusions: &[&str]) -> Self {
        let own = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            expense_categories: own(expenses),
            income_categories: own(income),
            exclusion_patterns: own(exclusions),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let taxonomy: Taxonomy = serde_json::from_str(json).context("parse taxonomy json")?;
        if taxonomy.expense_categories.is_empty() || taxonomy.income_categories.is_empty() {
            bail!("taxonomy must list at least one expense and one income category");
        }
        Ok(taxonomy)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&s).with_context(|| format!("load {}", path.display()))
    }

    /// Case-insensitive substring match of any exclusion pattern.
    pub fn is_excluded(&self, detail: &str) -> bool {
        let detail = detail.to_uppercase();
        self.exclusion_patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .any(|p| detail.contains(&p.to_uppercase()))
    }
}

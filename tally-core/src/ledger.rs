//! Statement and ledger record types

use serde::{Deserialize, Serialize};

/// One row of a bank statement export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Operation date as printed by the bank (dd/mm/yyyy)
    pub date: String,
    /// Short bank label
    pub label: String,
    /// Full operation detail; exclusion patterns match against this
    pub detail: String,
    /// Signed amount: negative = debit, positive = credit
    pub amount: f64,
    /// Currency code (EUR)
    pub currency: String,
}

/// A categorized ledger row.
///
/// `amount` stays raw text: ledgers filled by hand may hold partial rows,
/// and the model answers in free text. Use [`crate::amount::parse_amount`]
/// for a numeric view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorizedRow {
    pub date: String,
    pub amount: String,
    pub description: String,
    pub category: String,
}

impl CategorizedRow {
    pub fn new(date: &str, amount: &str, description: &str, category: &str) -> Self {
        Self {
            date: date.to_string(),
            amount: amount.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        }
    }

    /// True when every field is blank.
    pub fn is_blank(&self) -> bool {
        [&self.date, &self.amount, &self.description, &self.category]
            .iter()
            .all(|f| f.trim().is_empty())
    }

    pub fn fields(&self) -> [&str; 4] {
        [&self.date, &self.amount, &self.description, &self.category]
    }
}

/// The two side-by-side tables of a monthly budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "depenses")]
    Expenses,
    #[serde(rename = "revenus")]
    Income,
}

impl Section {
    /// Heading used in prompts and expected back from the model
    pub fn heading(&self) -> &'static str {
        match self {
            Section::Expenses => "DÉPENSES",
            Section::Income => "REVENUS",
        }
    }

    /// Title printed above the table in the ledger file
    pub fn title(&self) -> &'static str {
        match self {
            Section::Expenses => "Dépenses",
            Section::Income => "Revenus",
        }
    }
}

/// One period's categorized rows, expenses and income kept apart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ledger {
    pub expenses: Vec<CategorizedRow>,
    pub income: Vec<CategorizedRow>,
}

impl Ledger {
    pub fn rows(&self, section: Section) -> &[CategorizedRow] {
        match section {
            Section::Expenses => &self.expenses,
            Section::Income => &self.income,
        }
    }

    pub fn push(&mut self, section: Section, row: CategorizedRow) {
        match section {
            Section::Expenses => self.expenses.push(row),
            Section::Income => self.income.push(row),
        }
    }

    /// Number of data rows needed to lay both tables side by side
    pub fn height(&self) -> usize {
        self.expenses.len().max(self.income.len())
    }

    pub fn len(&self) -> usize {
        self.expenses.len() + self.income.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.income.is_empty()
    }
}

/// A past month used as few-shot context: its statement and how it was filed
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Period key, e.g. "janvier"
    pub period: String,
    pub statement: Vec<Transaction>,
    pub ledger: Ledger,
}

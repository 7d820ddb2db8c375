//! Prompt assembly for the categorization model.
//!
//! Layout, top to bottom:
//! 1. role + task
//! 2. both category lists, verbatim, flagged as mutually exclusive
//! 3. one `--- Exemple <period> ---` block per past month
//! 4. the blank template to fill (optional)
//! 5. the statement to categorize (date, detail, amount only)
//! 6. literal output-format instructions
//!
//! The output contract in step 6 is what [`crate::response::parse_response`]
//! relies on. Keep the two in sync.

use crate::ledger::{Example, Ledger, Section, Transaction};
use crate::taxonomy::Taxonomy;

pub const STATEMENT_HEADER: [&str; 3] = ["Date", "Detail", "Montant"];
pub const LEDGER_HEADER: [&str; 4] = ["Date", "Montant", "Description", "Catégorie"];

pub struct PromptBuilder<'a> {
    taxonomy: &'a Taxonomy,
    statement: &'a [Transaction],
    examples: &'a [Example],
    template: Option<&'a Ledger>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(taxonomy: &'a Taxonomy, statement: &'a [Transaction]) -> Self {
        Self {
            taxonomy,
            statement,
            examples: &[],
            template: None,
        }
    }

    pub fn examples(mut self, examples: &'a [Example]) -> Self {
        self.examples = examples;
        self
    }

    /// Blank ledger whose column layout the model should reproduce.
    pub fn template(mut self, template: &'a Ledger) -> Self {
        self.template = Some(template);
        self
    }

    pub fn build(&self) -> String {
        let mut s = String::new();
        s.push_str(
            "Tu es un assistant comptable. En entrée tu prendras un csv avec l'export de mes \
             transactions bancaires mensuelles. Je veux que tu les tries et complète mon template \
             de budget csv.\n\n",
        );

        s.push_str("Voici les catégories disponibles :\n\n");
        s.push_str(&render_categories(self.taxonomy));
        s.push('\n');

        if !self.examples.is_empty() {
            s.push_str("Voici des exemples de relevés et templates remplis :\n");
            for ex in self.examples {
                s.push_str(&format!("\n--- Exemple {} ---\n", ex.period));
                s.push_str(&format!("Relevé:\n{}\n", render_statement(&ex.statement)));
                s.push_str(&format!(
                    "Template rempli - {}:\n{}\n",
                    Section::Expenses.heading(),
                    render_rows(&ex.ledger, Section::Expenses)
                ));
                s.push_str(&format!(
                    "Template rempli - {}:\n{}\n",
                    Section::Income.heading(),
                    render_rows(&ex.ledger, Section::Income)
                ));
            }
        }

        if let Some(template) = self.template {
            s.push_str("\nVoici le template vide à remplir :\n\n");
            for section in [Section::Expenses, Section::Income] {
                s.push_str(&format!("{}\n{}\n", section_marker(section), render_rows(template, section)));
            }
        }

        s.push_str(&format!(
            "\nVoici le relevé bancaire à traiter :\n{}\n",
            render_statement(self.statement)
        ));
        s.push_str(&render_instructions(!self.examples.is_empty()));
        s
    }
}

/// Prompt for `statement` with few-shot `examples` and no blank template.
pub fn build_prompt(statement: &[Transaction], examples: &[Example], taxonomy: &Taxonomy) -> String {
    PromptBuilder::new(taxonomy, statement).examples(examples).build()
}

pub fn section_marker(section: Section) -> String {
    format!("--- {} ---", section.heading())
}

fn render_categories(taxonomy: &Taxonomy) -> String {
    format!(
        "Catégories pour les DÉPENSES (uniquement pour les dépenses) : {}\n\
         Catégories pour les REVENUS (uniquement pour les revenus) : {}\n\
         ATTENTION : les catégories de dépenses et de revenus sont complètement indépendantes. \
         Ne mélange jamais les catégories entre les deux sections.\n",
        taxonomy.expense_categories.join(", "),
        taxonomy.income_categories.join(", "),
    )
}

fn render_statement(txns: &[Transaction]) -> String {
    let mut s = csv_line(&STATEMENT_HEADER);
    for t in txns {
        let amount = t.amount.to_string();
        s.push_str(&csv_line(&[t.date.as_str(), t.detail.as_str(), amount.as_str()]));
    }
    s
}

fn render_rows(ledger: &Ledger, section: Section) -> String {
    let mut s = csv_line(&LEDGER_HEADER);
    for row in ledger.rows(section) {
        s.push_str(&csv_line(&row.fields()));
    }
    s
}

fn render_instructions(has_examples: bool) -> String {
    let header = LEDGER_HEADER.join(";");
    let mut s = String::from("\nInstructions :\n");
    if has_examples {
        s.push_str("Prends exemple sur les mois précédents pour remplir le template du relevé donné. ");
    }
    s.push_str(
        "Ne change pas les descriptions, dates ou montants. Juste trie les transactions à ajouter \
         avec les catégories correspondantes en te basant sur les derniers relevés.\n\n",
    );
    s.push_str(
        "IMPORTANT : Retourne UNIQUEMENT le CSV brut avec des points-virgules (;) comme \
         séparateur, sans aucune phrase, sans explication, sans markdown, sans ```csv```, sans \
         commentaire. Juste les deux sections DÉPENSES et REVENUS au format CSV séparées par une \
         ligne vide.\n",
    );
    s.push_str("Format attendu exact :\n");
    s.push_str(&format!(
        "{}\n{header}\n...lignes...\n\n{}\n{header}\n...lignes...\n",
        section_marker(Section::Expenses),
        section_marker(Section::Income),
    ));
    s
}

/// `;`-joined line; fields holding `;`, quotes or line breaks are quoted.
fn csv_line(fields: &[&str]) -> String {
    let mut out = fields
        .iter()
        .map(|f| {
            if f.contains([';', '"', '\n', '\r']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";");
    out.push('\n');
    out
}

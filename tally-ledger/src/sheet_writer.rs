//! Styled spreadsheet output built from a copy of the budget workbook.
//!
//! The template's "Transactions" sheet holds two tables starting at row 5:
//! expenses in B-E, income in G-J. The first data row carries the look of
//! each column; it is captured as a [`CellStyle`] before the data region is
//! cleared, then stamped onto every cell written.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use log::{debug, info};
use std::path::Path;
use tally_core::{CategorizedRow, Ledger, Section, sheet_amount};
use umya_spreadsheet::{Style, Worksheet};

/// Where the tables live in the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub sheet: String,
    /// First data row (1-based)
    pub start_row: u32,
    /// Date, amount, description, category columns (1-based, A = 1)
    pub expense_columns: [u32; 4],
    pub income_columns: [u32; 4],
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet: "Transactions".to_string(),
            start_row: 5,
            expense_columns: [2, 3, 4, 5],
            income_columns: [7, 8, 9, 10],
        }
    }
}

impl SheetLayout {
    pub fn columns(&self, section: Section) -> [u32; 4] {
        match section {
            Section::Expenses => self.expense_columns,
            Section::Income => self.income_columns,
        }
    }

    fn all_columns(&self) -> impl Iterator<Item = u32> + '_ {
        self.expense_columns.iter().chain(self.income_columns.iter()).copied()
    }
}

/// Visual attributes copied from a template cell: font, borders, fill,
/// number format and alignment. Anything else on the source cell is left out.
#[derive(Debug, Clone, Default)]
pub struct CellStyle {
    style: Style,
}

impl CellStyle {
    pub fn capture(source: &Style) -> Self {
        let mut style = Style::default();
        if let Some(v) = source.get_font() {
            style.set_font(v.clone());
        }
        if let Some(v) = source.get_borders() {
            style.set_borders(v.clone());
        }
        if let Some(v) = source.get_fill() {
            style.set_fill(v.clone());
        }
        if let Some(v) = source.get_number_format() {
            style.set_number_format(v.clone());
        }
        if let Some(v) = source.get_alignment() {
            style.set_alignment(v.clone());
        }
        Self { style }
    }

    pub fn number_format_code(&self) -> Option<&str> {
        self.style.get_number_format().map(|f| f.get_format_code())
    }

    pub fn to_style(&self) -> Style {
        self.style.clone()
    }
}

/// A date cell: a real date when the text is dd/mm/yyyy, else the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetDate {
    Date(NaiveDate),
    Text(String),
}

pub fn parse_sheet_date(text: &str) -> SheetDate {
    match NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y") {
        Ok(d) => SheetDate::Date(d),
        Err(_) => SheetDate::Text(text.to_string()),
    }
}

/// Days since 1899-12-30, the spreadsheet date epoch.
pub fn serial_date(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    (date - epoch).num_days() as f64
}

/// Copy `template` to `output` with `ledger` written into the data region.
///
/// The template file itself is never written.
pub fn fill_workbook(
    template: impl AsRef<Path>,
    output: impl AsRef<Path>,
    ledger: &Ledger,
    layout: &SheetLayout,
) -> Result<()> {
    let template = template.as_ref();
    let output = output.as_ref();
    if same_path(template, output) {
        bail!("refusing to overwrite template {}", template.display());
    }

    let mut book = umya_spreadsheet::reader::xlsx::read(template)
        .map_err(|e| anyhow!("read {}: {e}", template.display()))?;
    let sheet = book
        .get_sheet_by_name_mut(&layout.sheet)
        .with_context(|| format!("sheet {:?} not found in {}", layout.sheet, template.display()))?;

    fill_sheet(sheet, ledger, layout);

    umya_spreadsheet::writer::xlsx::write(&book, output)
        .map_err(|e| anyhow!("write {}: {e}", output.display()))?;
    info!("workbook written to {}", output.display());
    Ok(())
}

/// Capture styles, clear the data region, write both tables.
pub fn fill_sheet(sheet: &mut Worksheet, ledger: &Ledger, layout: &SheetLayout) {
    let styles: Vec<(u32, CellStyle)> = layout
        .all_columns()
        .map(|col| {
            let style = sheet
                .get_cell((col, layout.start_row))
                .map(|c| CellStyle::capture(c.get_style()))
                .unwrap_or_default();
            (col, style)
        })
        .collect();

    let last_row = sheet.get_highest_row();
    for (col, style) in &styles {
        debug!("column {col}: number format {:?}", style.number_format_code());
    }
    debug!("clearing rows {}..={} of {}", layout.start_row, last_row, layout.sheet);
    for row in layout.start_row..=last_row {
        for col in layout.all_columns() {
            if sheet.get_cell((col, row)).is_some() {
                sheet.get_cell_mut((col, row)).set_blank();
            }
        }
    }

    for section in [Section::Expenses, Section::Income] {
        let columns = layout.columns(section);
        for (i, row) in ledger.rows(section).iter().enumerate() {
            let r = layout.start_row + i as u32;
            write_row(sheet, r, columns, row);
            for col in columns {
                if let Some((_, style)) = styles.iter().find(|(c, _)| *c == col) {
                    sheet.get_cell_mut((col, r)).set_style(style.to_style());
                }
            }
        }
    }
}

fn write_row(sheet: &mut Worksheet, r: u32, columns: [u32; 4], row: &CategorizedRow) {
    let [date_col, amount_col, desc_col, cat_col] = columns;

    let date_cell = sheet.get_cell_mut((date_col, r));
    match parse_sheet_date(&row.date) {
        SheetDate::Date(d) => {
            date_cell.set_value_number(serial_date(d));
        }
        SheetDate::Text(t) => {
            date_cell.set_value_string(t);
        }
    }
    sheet
        .get_cell_mut((amount_col, r))
        .set_value_number(sheet_amount(&row.amount));
    sheet
        .get_cell_mut((desc_col, r))
        .set_value_string(row.description.clone());
    sheet
        .get_cell_mut((cat_col, r))
        .set_value_string(row.category.clone());
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet_date() {
        assert_eq!(
            parse_sheet_date("05/03/2026"),
            SheetDate::Date(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap())
        );
        assert_eq!(parse_sheet_date("not-a-date"), SheetDate::Text("not-a-date".to_string()));
        assert_eq!(parse_sheet_date("31/02/2026"), SheetDate::Text("31/02/2026".to_string()));
    }

    #[test]
    fn test_serial_date() {
        assert_eq!(serial_date(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()), 2.0);
        assert_eq!(serial_date(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()), 46086.0);
    }

    #[test]
    fn test_cell_style_keeps_number_format() {
        let mut nf = umya_spreadsheet::NumberingFormat::default();
        nf.set_format_code("dd/mm/yyyy");
        let mut source = Style::default();
        source.set_number_format(nf);

        let captured = CellStyle::capture(&source);
        assert_eq!(captured.number_format_code(), Some("dd/mm/yyyy"));
        assert_eq!(
            captured.to_style().get_number_format().map(|f| f.get_format_code()),
            Some("dd/mm/yyyy")
        );
        assert!(CellStyle::default().number_format_code().is_none());
    }

    #[test]
    fn test_default_layout() {
        let layout = SheetLayout::default();
        assert_eq!(layout.sheet, "Transactions");
        assert_eq!(layout.start_row, 5);
        assert_eq!(layout.all_columns().collect::<Vec<_>>(), vec![2, 3, 4, 5, 7, 8, 9, 10]);
    }

    #[test]
    fn test_refuses_to_overwrite_template() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("template.xlsx");
        std::fs::write(&p, b"not really xlsx").unwrap();
        let err = fill_workbook(&p, &p, &Ledger::default(), &SheetLayout::default()).unwrap_err();
        assert!(err.to_string().contains("refusing"));
        assert_eq!(std::fs::read(&p).unwrap(), b"not really xlsx");
    }
}

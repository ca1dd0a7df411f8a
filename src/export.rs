use rust_xlsxwriter::{Format, Workbook};

use crate::{errors::AppError, structs::Expense};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_FILENAME: &str = "expenses.xlsx";

const HEADERS: [&str; 4] = ["Date", "Description", "Amount", "Method"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub method: String,
}

impl From<&Expense> for ExportRow {
    fn from(expense: &Expense) -> Self {
        ExportRow {
            date: expense.date.format("%Y-%m-%d").to_string(),
            description: expense.description.clone(),
            amount: expense.amount,
            method: expense.method.clone(),
        }
    }
}

pub fn export_rows(expenses: &[Expense]) -> Vec<ExportRow> {
    expenses.iter().map(ExportRow::from).collect()
}

/// Renders the rows as a single-sheet workbook: a header line, then one line per expense.
pub fn expenses_workbook(rows: &[ExportRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.date)?;
        sheet.write_string(r, 1, &row.description)?;
        sheet.write_number(r, 2, row.amount)?;
        sheet.write_string(r, 3, &row.method)?;
    }

    Ok(workbook.save_to_buffer()?)
}

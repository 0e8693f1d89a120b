//! Reshaping detected tables into the address table and line items.

use crate::document::Table;
use crate::domain::{AddressTable, LineItem};
use crate::error::{RedactorError, RedactorResult};

/// Zips the header row with the first data row, position by position.
pub fn address_table(table: &Table) -> AddressTable {
    let Some(values) = table.rows.first() else {
        return AddressTable::new();
    };
    table
        .header
        .iter()
        .zip(values)
        .map(|(h, v)| (h.as_str(), v.as_str()))
        .collect()
}

/// Reads every data row into a [`LineItem`], looking columns up by header name.
///
/// A row whose table lacks one of [`LineItem::COLUMNS`] is a
/// [`RedactorError::MissingColumn`]; the whole extraction fails rather than
/// yielding partial rows.
pub fn line_items(table: &Table) -> RedactorResult<Vec<LineItem>> {
    let column = |name: &str, row: usize| -> RedactorResult<usize> {
        table
            .header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RedactorError::MissingColumn {
                column: name.to_string(),
                row,
            })
    };

    table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let cell = |name: &str| -> RedactorResult<String> {
                let col = column(name, idx + 1)?;
                Ok(row.get(col).cloned().unwrap_or_default())
            };
            Ok(LineItem {
                code: cell("Code")?,
                description: cell("Description")?,
                quantity: cell("Quantity")?,
                uom: cell("UOM")?,
                rate: cell("Rate")?,
                amount: cell("Amount")?,
            })
        })
        .collect()
}

//! HTML table extraction
//!
//! Turns a listing page into an ordered list of records using a
//! [`TableLayout`]. Only the first `<table>` of the document is read and its
//! first row is treated as the header.

use crate::scrape::layout::{CellSource, Record, TableLayout};
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};

/// Extracts one record per data row of the first table in `html`
///
/// # Arguments
///
/// * `html` - The page markup
/// * `layout` - Field-to-column mapping for the page's entity
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Records in row order (empty if the table has only a header)
/// * `Err(ExtractionError)` - No table, a row too short for the layout, or a missing link
///
/// # Example
///
/// ```
/// use catalog_sync::scrape::{extract_records, STOCK_PRODUCT_LAYOUT};
///
/// let html = r#"<table>
///     <tr><th>Product</th><th>Quantity</th></tr>
///     <tr><td>PN-3474</td><td>5</td></tr>
/// </table>"#;
/// let records = extract_records(html, &STOCK_PRODUCT_LAYOUT).unwrap();
/// assert_eq!(records[0]["ProductName"], "PN-3474");
/// ```
pub fn extract_records(html: &str, layout: &TableLayout) -> Result<Vec<Record>, ExtractionError> {
    let document = Html::parse_document(html);

    let table = document
        .select(&selector("table")?)
        .next()
        .ok_or(ExtractionError::MissingTable)?;

    let row_selector = selector("tr")?;
    let link_selector = selector("a[href]")?;
    let min_columns = layout.min_columns();
    let mut records = Vec::new();

    // Row 0 holds the column headers
    for (index, row) in table.select(&row_selector).enumerate().skip(1) {
        let cells = data_cells(row);

        if cells.len() < min_columns {
            return Err(ExtractionError::MissingColumns {
                row: index,
                expected: min_columns,
                found: cells.len(),
            });
        }

        let mut record = Record::new();
        for spec in layout.fields {
            let cell = cells[spec.column];
            let value = match spec.source {
                CellSource::Text => cell_text(cell),
                CellSource::Href => cell
                    .select(&link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| href.trim().to_string())
                    .ok_or(ExtractionError::MissingLink {
                        row: index,
                        field: spec.field,
                    })?,
            };
            record.insert(spec.field.to_string(), value);
        }

        records.push(record);
    }

    Ok(records)
}

/// Direct `<td>` children of a row
fn data_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn selector(css: &'static str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::InvalidSelector(css))
}

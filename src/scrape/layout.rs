//! Column layouts of the scraped listing pages
//!
//! Each entity maps table cells to named fields by position. The mapping is
//! tied to the page markup; a row with fewer cells than the layout needs is an
//! extraction error rather than a record with missing fields.

use std::collections::BTreeMap;
use std::fmt;

/// One flat scraped or stored row, keyed by column name
pub type Record = BTreeMap<String, String>;

/// Where a field's value is read from within its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSource {
    /// Trimmed text content of the cell
    Text,
    /// `href` attribute of the first link inside the cell
    Href,
}

/// Mapping of one named field to a cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    pub column: usize,
    pub source: CellSource,
}

impl FieldSpec {
    const fn text(field: &'static str, column: usize) -> Self {
        Self {
            field,
            column,
            source: CellSource::Text,
        }
    }

    const fn href(field: &'static str, column: usize) -> Self {
        Self {
            field,
            column,
            source: CellSource::Href,
        }
    }
}

/// Field-to-column table for one entity's listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub entity: EntityKind,
    pub fields: &'static [FieldSpec],
}

impl TableLayout {
    /// Minimum number of cells a data row must have
    pub fn min_columns(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.column + 1)
            .max()
            .unwrap_or(0)
    }
}

/// The entity kinds scraped by the two workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Row of the companies listing
    Company,
    /// Row of a company's product listing
    CatalogProduct,
    /// Row of the product stock listing
    StockProduct,
    /// Row of a product's customer transactions listing
    CustomerTransaction,
}

pub const COMPANY_LAYOUT: TableLayout = TableLayout {
    entity: EntityKind::Company,
    fields: &[FieldSpec::text("Name", 0), FieldSpec::href("Link", 1)],
};

// Cell 0 of the product listing is a row counter
pub const CATALOG_PRODUCT_LAYOUT: TableLayout = TableLayout {
    entity: EntityKind::CatalogProduct,
    fields: &[
        FieldSpec::text("Product", 1),
        FieldSpec::text("DateAdded", 2),
        FieldSpec::text("Price", 3),
    ],
};

pub const STOCK_PRODUCT_LAYOUT: TableLayout = TableLayout {
    entity: EntityKind::StockProduct,
    fields: &[
        FieldSpec::text("ProductName", 0),
        FieldSpec::text("Quantity", 1),
    ],
};

pub const CUSTOMER_TRANSACTION_LAYOUT: TableLayout = TableLayout {
    entity: EntityKind::CustomerTransaction,
    fields: &[
        FieldSpec::text("CustomerName", 0),
        FieldSpec::text("TransactionDate", 1),
        FieldSpec::text("Total", 2),
    ],
};

impl EntityKind {
    /// Returns the column layout used to extract this entity
    pub fn layout(&self) -> &'static TableLayout {
        match self {
            Self::Company => &COMPANY_LAYOUT,
            Self::CatalogProduct => &CATALOG_PRODUCT_LAYOUT,
            Self::StockProduct => &STOCK_PRODUCT_LAYOUT,
            Self::CustomerTransaction => &CUSTOMER_TRANSACTION_LAYOUT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::CatalogProduct => "catalog_product",
            Self::StockProduct => "stock_product",
            Self::CustomerTransaction => "customer_transaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Table definitions
//!
//! This module contains the SQL shape of every table the workflows write.
//! The companies → products workflow owns `companies` and a catalog-shaped
//! `products`; the products → customers workflow owns a stock-shaped
//! `products` and `customers`. The two `products` tables live in separate
//! database files.

/// Column of a replace-set table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// Filled in by the store at insert time, never bound from a record
    pub store_assigned: bool,
}

impl ColumnDef {
    const fn scraped(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            store_assigned: false,
        }
    }

    const fn created_at() -> Self {
        Self {
            name: "CreatedAt",
            sql_type: "DATETIME DEFAULT (CURRENT_TIMESTAMP) NOT NULL",
            store_assigned: true,
        }
    }
}

/// Name and columns of one logical table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableSpec {
    /// Columns bound from records on insert
    pub fn insert_columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.columns.iter().filter(|c| !c.store_assigned)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn has_created_at(&self) -> bool {
        self.columns.iter().any(|c| c.store_assigned && c.name == "CreatedAt")
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", self.name, columns)
    }

    /// Positional `INSERT` statement over the insertable columns
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.insert_columns().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// `SELECT` of every column in insertion order
    pub fn select_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        format!(
            "SELECT {} FROM {} ORDER BY rowid",
            names.join(", "),
            self.name
        )
    }
}

pub const COMPANIES_TABLE: TableSpec = TableSpec {
    name: "companies",
    columns: &[
        ColumnDef::scraped("Name", "TEXT"),
        ColumnDef::scraped("Link", "TEXT"),
    ],
};

/// `products` as written by the companies → products workflow
pub const CATALOG_PRODUCTS_TABLE: TableSpec = TableSpec {
    name: "products",
    columns: &[
        ColumnDef::scraped("Product", "TEXT"),
        ColumnDef::scraped("DateAdded", "DATETIME"),
        ColumnDef::scraped("Price", "NUMERIC"),
        ColumnDef::created_at(),
    ],
};

/// `products` as written by the products → customers workflow
pub const STOCK_PRODUCTS_TABLE: TableSpec = TableSpec {
    name: "products",
    columns: &[
        ColumnDef::scraped("ProductName", "TEXT"),
        ColumnDef::scraped("Quantity", "NUMERIC"),
        ColumnDef::created_at(),
    ],
};

pub const CUSTOMERS_TABLE: TableSpec = TableSpec {
    name: "customers",
    columns: &[
        ColumnDef::scraped("ProductName", "TEXT"),
        ColumnDef::scraped("CustomerName", "TEXT"),
        ColumnDef::scraped("TransactionDate", "DATETIME"),
        ColumnDef::scraped("Total", "NUMERIC"),
        ColumnDef::created_at(),
    ],
};

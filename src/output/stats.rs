//! Statistics generation from a workflow database
//!
//! This module provides functionality for extracting and displaying row
//! counts and freshness of the tables a workflow writes.

use crate::storage::{Database, SqliteTable};
use crate::workflow::Workflow;
use crate::Result;
use std::fmt::Write;

/// Statistics of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatistics {
    pub table: &'static str,
    pub rows: u64,
    /// Most recent store-assigned `CreatedAt`; `None` for tables without one
    pub latest_created_at: Option<String>,
}

/// Statistics of every table of one workflow
#[derive(Debug, Clone)]
pub struct DatabaseStatistics {
    pub workflow: Workflow,
    pub path: String,
    pub tables: Vec<TableStatistics>,
}

/// Loads statistics for the tables of `workflow`
///
/// Tables that do not exist yet are created empty, so a fresh database
/// reports zero rows rather than failing.
pub fn load_statistics(workflow: Workflow, db: &Database) -> Result<DatabaseStatistics> {
    let mut conn = db.open()?;
    let mut tables = Vec::new();

    for spec in workflow.tables() {
        let table = SqliteTable::open(&mut conn, spec)?;
        tables.push(TableStatistics {
            table: spec.name,
            rows: table.count_rows()?,
            latest_created_at: table.latest_created_at()?,
        });
    }

    Ok(DatabaseStatistics {
        workflow,
        path: db.path().display().to_string(),
        tables,
    })
}

/// Renders statistics as the text printed by [`print_statistics`]
pub fn format_statistics(stats: &DatabaseStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} Statistics ===\n", stats.workflow);
    let _ = writeln!(out, "Database: {}", stats.path);
    let _ = writeln!(out);

    let _ = writeln!(out, "Tables:");
    for table in &stats.tables {
        match &table.latest_created_at {
            Some(latest) => {
                let _ = writeln!(
                    out,
                    "  {}: {} rows (latest insert {})",
                    table.table, table.rows, latest
                );
            }
            None => {
                let _ = writeln!(out, "  {}: {} rows", table.table, table.rows);
            }
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatabaseStatistics) {
    print!("{}", format_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::Record;
    use crate::storage::{ReplaceSet, CUSTOMERS_TABLE};

    #[test]
    fn test_statistics_of_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("products.db"));

        let stats = load_statistics(Workflow::Products, &db).unwrap();

        assert_eq!(stats.tables.len(), 2);
        assert_eq!(stats.tables[0].table, "companies");
        assert!(stats.tables.iter().all(|t| t.rows == 0));
        assert!(stats.tables.iter().all(|t| t.latest_created_at.is_none()));
    }

    #[test]
    fn test_statistics_count_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("customers.db"));
        {
            let mut conn = db.open().unwrap();
            let mut table = SqliteTable::open(&mut conn, &CUSTOMERS_TABLE).unwrap();
            let rows: Vec<Record> = (0..3)
                .map(|i| {
                    [
                        ("ProductName", "PN-3474".to_string()),
                        ("CustomerName", format!("CS-{}", i)),
                        ("TransactionDate", "9/7/19 23:00".to_string()),
                        ("Total", "12.5".to_string()),
                    ]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect()
                })
                .collect();
            table.replace_by_key("ProductName", "PN-3474", &rows).unwrap();
        }

        let stats = load_statistics(Workflow::Customers, &db).unwrap();
        let customers = &stats.tables[1];
        assert_eq!(customers.table, "customers");
        assert_eq!(customers.rows, 3);
        assert!(customers.latest_created_at.is_some());

        let text = format_statistics(&stats);
        assert!(text.contains("customers: 3 rows (latest insert"));
        assert!(text.contains("products: 0 rows"));
    }
}

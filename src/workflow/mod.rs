//! Workflow drivers
//!
//! The two concrete synchronizations built on the [`crate::sync`] pattern:
//! - `products`: companies catalog, products of every company fetched concurrently
//! - `customers`: products catalog, customers of every product fetched one at a time

mod customers;
mod products;

pub use customers::run_customers_workflow;
pub use products::run_products_workflow;

use crate::config::Config;
use crate::scrape::{extract_records, HttpFetcher, PageFetcher, Record, TableLayout};
use crate::storage::{
    TableSpec, CATALOG_PRODUCTS_TABLE, COMPANIES_TABLE, CUSTOMERS_TABLE, STOCK_PRODUCTS_TABLE,
};
use crate::sync::SyncReport;
use crate::{ConfigError, ConfigResult, Result, TransportError};
use clap::ValueEnum;
use std::fmt;
use std::time::Duration;

/// Which synchronization to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Workflow {
    /// Companies → products
    Products,
    /// Products → customers
    Customers,
}

impl Workflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Customers => "customers",
        }
    }

    /// Catalog table followed by dependents table
    pub fn tables(&self) -> [&'static TableSpec; 2] {
        match self {
            Self::Products => [&COMPANIES_TABLE, &CATALOG_PRODUCTS_TABLE],
            Self::Customers => [&STOCK_PRODUCTS_TABLE, &CUSTOMERS_TABLE],
        }
    }

    /// Database file of this workflow, failing if its section is absent
    pub fn database_path<'a>(&self, config: &'a Config) -> ConfigResult<&'a str> {
        let path = match self {
            Self::Products => config.products.as_ref().map(|p| p.database_path.as_str()),
            Self::Customers => config.customers.as_ref().map(|c| c.database_path.as_str()),
        };
        path.ok_or_else(|| ConfigError::MissingWorkflow(self.as_str().to_string()))
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs `workflow` against the live endpoints named in `config`
///
/// # Example
///
/// ```no_run
/// use catalog_sync::config::load_config;
/// use catalog_sync::{run_workflow, Workflow};
/// use std::path::Path;
///
/// # async fn run() -> catalog_sync::Result<()> {
/// let config = load_config(Path::new("catalog-sync.toml"))?;
/// let report = run_workflow(&config, Workflow::Customers).await?;
/// println!("{} keys failed", report.failed_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_workflow(config: &Config, workflow: Workflow) -> Result<SyncReport> {
    let fetcher = HttpFetcher::new(&config.http)?;
    let fetch_timeout = config.http.fetch_timeout();

    match workflow {
        Workflow::Products => {
            let section = config
                .products
                .as_ref()
                .ok_or_else(|| ConfigError::MissingWorkflow(workflow.to_string()))?;
            run_products_workflow(&fetcher, section, fetch_timeout).await
        }
        Workflow::Customers => {
            let section = config
                .customers
                .as_ref()
                .ok_or_else(|| ConfigError::MissingWorkflow(workflow.to_string()))?;
            run_customers_workflow(&fetcher, section, fetch_timeout).await
        }
    }
}

/// Fetches and extracts a catalog listing; any failure is fatal to the run
async fn fetch_catalog<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    layout: &TableLayout,
    fetch_timeout: Duration,
) -> Result<Vec<Record>> {
    tracing::info!(url = %url, entity = %layout.entity, "Fetching catalog");

    let markup = tokio::time::timeout(fetch_timeout, fetcher.fetch(url))
        .await
        .map_err(|_| TransportError::Timeout {
            url: url.to_string(),
        })??;

    Ok(extract_records(&markup, layout)?)
}

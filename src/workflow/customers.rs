//! Products → customers workflow

use super::fetch_catalog;
use crate::config::{CustomersConfig, PRODUCT_PLACEHOLDER};
use crate::scrape::{EntityKind, PageFetcher, Record};
use crate::storage::{Database, ReplaceSet, SqliteTable, CUSTOMERS_TABLE, STOCK_PRODUCTS_TABLE};
use crate::sync::{
    sync_dependents, CatalogOutcome, DependentPlan, DependentTask, FanOut, RunContext, RunPhase,
    SyncReport,
};
use crate::workflow::Workflow;
use crate::Result;
use std::collections::HashSet;
use std::time::Duration;
use tracing::Instrument;

const PRODUCT_KEY: &str = "ProductName";

/// Refreshes the products table, then mirrors the customers of every stored
/// product
///
/// Only the scraped product names are replaced, so products that vanished
/// from the listing keep their stored rows and are still synced. Customer
/// pages are fetched strictly one after another.
pub async fn run_customers_workflow<F: PageFetcher>(
    fetcher: &F,
    config: &CustomersConfig,
    fetch_timeout: Duration,
) -> Result<SyncReport> {
    let mut ctx = RunContext::new(Workflow::Customers);
    let span = ctx.span().clone();
    sync_customers(&mut ctx, fetcher, config, fetch_timeout)
        .instrument(span)
        .await
}

async fn sync_customers<F: PageFetcher>(
    ctx: &mut RunContext,
    fetcher: &F,
    config: &CustomersConfig,
    fetch_timeout: Duration,
) -> Result<SyncReport> {
    let db = Database::new(&config.database_path);
    tracing::info!("Starting customers workflow (database: {})", db.path().display());

    ctx.advance(RunPhase::SyncingCatalog)?;
    let layout = EntityKind::StockProduct.layout();
    let products = fetch_catalog(fetcher, &config.products_url, layout, fetch_timeout).await?;
    let names: Vec<String> = products
        .iter()
        .filter_map(|p| p.get(PRODUCT_KEY).cloned())
        .collect();
    let replaced = {
        let mut conn = db.open()?;
        let mut table = SqliteTable::open(&mut conn, &STOCK_PRODUCTS_TABLE)?;
        table.replace_by_keys(PRODUCT_KEY, &names, &products)?
    };
    tracing::info!(
        "Products replaced: {} deleted, {} inserted",
        replaced.deleted,
        replaced.inserted
    );
    let catalog = CatalogOutcome {
        table: STOCK_PRODUCTS_TABLE.name,
        scraped: products.len(),
        replaced,
    };

    ctx.advance(RunPhase::ReadingCatalogKeys)?;
    let keys = {
        let mut conn = db.open()?;
        let table = SqliteTable::open(&mut conn, &STOCK_PRODUCTS_TABLE)?;
        product_keys(table.read_all()?)
    };
    tracing::info!("Read {} distinct product names from store", keys.len());

    ctx.advance(RunPhase::SyncingDependents)?;
    let plan = DependentPlan {
        layout: EntityKind::CustomerTransaction.layout(),
        join_key: Some(PRODUCT_KEY),
        fan_out: FanOut::Sequential,
        fetch_timeout,
    };
    let tasks: Vec<DependentTask> = keys
        .iter()
        .map(|key| {
            let url = customers_url(&config.customers_url_template, key);
            DependentTask::new(key.as_str(), url)
        })
        .collect();

    let dependents = sync_dependents(fetcher, &plan, tasks, |task, records| {
        let mut conn = db.open()?;
        let mut table = SqliteTable::open(&mut conn, &CUSTOMERS_TABLE)?;
        Ok(Some(table.replace_by_key(PRODUCT_KEY, &task.key, &records)?))
    })
    .await?;

    ctx.advance(RunPhase::Done)?;
    let report = SyncReport::new(ctx, catalog, keys.len(), dependents, None);
    tracing::info!(
        "Customers workflow finished: {} products synced, {} failed",
        report.synced_count(),
        report.failed_count()
    );
    Ok(report)
}

/// Distinct non-empty product names, in store order
fn product_keys(rows: Vec<Record>) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|mut row| row.remove(PRODUCT_KEY))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Fills the placeholder with the product name encoded as one path segment
fn customers_url(template: &str, product: &str) -> String {
    template.replace(PRODUCT_PLACEHOLDER, &urlencoding::encode(product))
}

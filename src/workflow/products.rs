//! Companies → products workflow

use super::fetch_catalog;
use crate::config::ProductsConfig;
use crate::scrape::{EntityKind, PageFetcher, Record};
use crate::storage::{
    Database, ReplaceSet, SqliteTable, CATALOG_PRODUCTS_TABLE, COMPANIES_TABLE,
};
use crate::sync::{
    sync_dependents, CatalogOutcome, DependentOutcome, DependentPlan, DependentStatus,
    DependentTask, FailureStage, FanOut, RunContext, RunPhase, SyncReport,
};
use crate::workflow::Workflow;
use crate::{Result, SyncError};
use std::time::Duration;
use tracing::Instrument;
use url::Url;

/// Refreshes the companies table, then rebuilds the products table from
/// every company's product listing
///
/// Company product pages are fetched concurrently. A company whose page
/// fails contributes no rows to this run's products table, since that table
/// is replaced as a whole.
pub async fn run_products_workflow<F: PageFetcher>(
    fetcher: &F,
    config: &ProductsConfig,
    fetch_timeout: Duration,
) -> Result<SyncReport> {
    let mut ctx = RunContext::new(Workflow::Products);
    let span = ctx.span().clone();
    sync_products(&mut ctx, fetcher, config, fetch_timeout)
        .instrument(span)
        .await
}

async fn sync_products<F: PageFetcher>(
    ctx: &mut RunContext,
    fetcher: &F,
    config: &ProductsConfig,
    fetch_timeout: Duration,
) -> Result<SyncReport> {
    let db = Database::new(&config.database_path);
    tracing::info!("Starting products workflow (database: {})", db.path().display());

    ctx.advance(RunPhase::SyncingCatalog)?;
    let companies =
        fetch_catalog(fetcher, &config.companies_url, EntityKind::Company.layout(), fetch_timeout)
            .await?;
    let replaced = {
        let mut conn = db.open()?;
        let mut table = SqliteTable::open(&mut conn, &COMPANIES_TABLE)?;
        table.replace_all(&companies)?
    };
    tracing::info!(
        "Companies replaced: {} deleted, {} inserted",
        replaced.deleted,
        replaced.inserted
    );
    let catalog = CatalogOutcome {
        table: COMPANIES_TABLE.name,
        scraped: companies.len(),
        replaced,
    };

    // The store, not the scrape, decides which companies are synced
    ctx.advance(RunPhase::ReadingCatalogKeys)?;
    let stored = {
        let mut conn = db.open()?;
        let table = SqliteTable::open(&mut conn, &COMPANIES_TABLE)?;
        table.read_all()?
    };
    let base = Url::parse(&config.company_base_url).map_err(|source| SyncError::InvalidUrl {
        url: config.company_base_url.clone(),
        source,
    })?;
    let (tasks, unlinked) = company_tasks(&base, &stored);
    tracing::info!("Read {} companies from store", stored.len());

    ctx.advance(RunPhase::SyncingDependents)?;
    let plan = DependentPlan {
        layout: EntityKind::CatalogProduct.layout(),
        join_key: None,
        fan_out: FanOut::Concurrent,
        fetch_timeout,
    };
    let mut products: Vec<Record> = Vec::new();
    let mut dependents = sync_dependents(fetcher, &plan, tasks, |_, records| {
        products.extend(records);
        Ok(None)
    })
    .await?;
    dependents.extend(unlinked);

    let aggregate = {
        let mut conn = db.open()?;
        let mut table = SqliteTable::open(&mut conn, &CATALOG_PRODUCTS_TABLE)?;
        table.replace_all(&products)?
    };
    tracing::info!(
        "Products replaced: {} deleted, {} inserted",
        aggregate.deleted,
        aggregate.inserted
    );

    ctx.advance(RunPhase::Done)?;
    let report = SyncReport::new(ctx, catalog, stored.len(), dependents, Some(aggregate));
    tracing::info!(
        "Products workflow finished: {} companies synced, {} failed",
        report.synced_count(),
        report.failed_count()
    );
    Ok(report)
}

/// Resolves each stored company's link into a fetch task
///
/// Companies whose link is missing or unresolvable come back as failed
/// outcomes instead.
fn company_tasks(base: &Url, companies: &[Record]) -> (Vec<DependentTask>, Vec<DependentOutcome>) {
    let mut tasks = Vec::with_capacity(companies.len());
    let mut unlinked = Vec::new();

    for company in companies {
        let name = company.get("Name").cloned().unwrap_or_default();
        let link = company.get("Link").map(String::as_str).unwrap_or("");

        let error = if link.is_empty() {
            SyncError::MissingKeyField {
                key: name.clone(),
                field: "Link".to_string(),
            }
        } else {
            match base.join(link) {
                Ok(url) => {
                    tasks.push(DependentTask::new(name, url.to_string()));
                    continue;
                }
                Err(source) => SyncError::InvalidUrl {
                    url: link.to_string(),
                    source,
                },
            }
        };

        tracing::warn!(key = %name, error = %error, "Skipping company without usable link");
        unlinked.push(DependentOutcome {
            key: name,
            url: link.to_string(),
            status: DependentStatus::Failed {
                stage: FailureStage::Fetch,
                error,
            },
        });
    }

    (tasks, unlinked)
}

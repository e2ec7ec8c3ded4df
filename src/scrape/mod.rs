//! Scrape module: page fetching and table extraction
//!
//! This module contains the two collaborators every sync step relies on:
//! - An HTTP fetcher that returns raw markup for a URL
//! - A table extractor that turns markup into flat records using a
//!   per-entity column layout

mod extractor;
mod fetcher;
mod layout;

pub use extractor::extract_records;
pub use fetcher::{build_http_client, fetch_page, HttpFetcher, PageFetcher};
pub use layout::{
    CellSource, EntityKind, FieldSpec, Record, TableLayout, CATALOG_PRODUCT_LAYOUT,
    COMPANY_LAYOUT, CUSTOMER_TRANSACTION_LAYOUT, STOCK_PRODUCT_LAYOUT,
};

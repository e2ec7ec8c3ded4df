//! Shared fixtures for the workflow integration tests
//!
//! Pages are built in the shape of the listing sites: one `table`, a header
//! row of `th` cells, then one `tr` of `td` cells per entry.

#![allow(dead_code)]

use catalog_sync::config::HttpConfig;
use catalog_sync::storage::{Database, SqliteTable, TableSpec};
use catalog_sync::{Record, ReplaceSet};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn http_config() -> HttpConfig {
    HttpConfig {
        user_agent: "catalog-sync-test/1.0".to_string(),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        fetch_timeout_secs: 10,
    }
}

fn listing(header: &[&str], rows: Vec<String>) -> String {
    let header: String = header.iter().map(|h| format!("<th>{}</th>", h)).collect();
    format!(
        "<html><body><h1>Listing</h1><table>\n<tr>{}</tr>\n{}\n</table></body></html>",
        header,
        rows.join("\n")
    )
}

/// Products listing of the customers workflow: name, quantity
pub fn stock_page(products: &[(&str, u32)]) -> String {
    let rows = products
        .iter()
        .map(|(name, qty)| format!("<tr><td>{}</td><td>{}</td></tr>", name, qty))
        .collect();
    listing(&["Product", "Quantity"], rows)
}

/// Customer transactions of one product: name, date, total
pub fn customers_page(customers: &[(String, String, String)]) -> String {
    let rows = customers
        .iter()
        .map(|(name, date, total)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                name, date, total
            )
        })
        .collect();
    listing(&["Customer", "Date", "Total"], rows)
}

/// `count` distinct customers whose names start with `prefix`
pub fn generated_customers(prefix: &str, count: usize) -> Vec<(String, String, String)> {
    (0..count)
        .map(|i| {
            (
                format!("{}-{:04}", prefix, i),
                format!("9/{}/19 23:00", i % 28 + 1),
                format!("{}.25", i + 10),
            )
        })
        .collect()
}

pub fn customer(name: &str, date: &str, total: &str) -> (String, String, String) {
    (name.to_string(), date.to_string(), total.to_string())
}

/// Companies listing: name, link cell
pub fn companies_page(companies: &[(&str, Option<&str>)]) -> String {
    let rows = companies
        .iter()
        .map(|(name, link)| match link {
            Some(link) => format!(
                "<tr><td>{}</td><td><a href=\"{}\">Products</a></td></tr>",
                name, link
            ),
            None => format!("<tr><td>{}</td><td>n/a</td></tr>", name),
        })
        .collect();
    listing(&["Company", "Products"], rows)
}

/// Product listing of one company: row number, product, date added, price
pub fn catalog_page(products: &[(&str, &str, &str)]) -> String {
    let rows = products
        .iter()
        .enumerate()
        .map(|(i, (product, date, price))| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                i + 1,
                product,
                date,
                price
            )
        })
        .collect();
    listing(&["#", "Product", "Date added", "Price"], rows)
}

pub async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, page_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Every row of `spec` in insertion order
pub fn read_table(db_path: &Path, spec: &'static TableSpec) -> Vec<Record> {
    let mut conn = Database::new(db_path).open().unwrap();
    let table = SqliteTable::open(&mut conn, spec).unwrap();
    table.read_all().unwrap()
}

/// Rows with the store-assigned timestamp removed
pub fn without_created_at(rows: Vec<Record>) -> Vec<Record> {
    rows.into_iter()
        .map(|mut row| {
            row.remove("CreatedAt");
            row
        })
        .collect()
}

/// Values of `field` across the rows whose `key` column equals `value`
pub fn column_where(rows: &[Record], key: &str, value: &str, field: &str) -> Vec<String> {
    rows.iter()
        .filter(|r| r.get(key).map(String::as_str) == Some(value))
        .map(|r| r[field].clone())
        .collect()
}

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Sync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub http: HttpConfig,

    /// Companies → products workflow; optional so a config may carry one workflow only
    #[serde(default)]
    pub products: Option<ProductsConfig>,

    /// Products → customers workflow
    #[serde(default)]
    pub customers: Option<CustomersConfig>,
}

/// HTTP client and fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total time allowed for one HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Hard upper bound on one dependent fetch, enforced by the synchronizer (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Companies → products workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsConfig {
    /// Path to the SQLite database file holding `companies` and `products`
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Listing page with one row per company
    #[serde(rename = "companies-url")]
    pub companies_url: String,

    /// Base URL that company links are resolved against
    #[serde(rename = "company-base-url")]
    pub company_base_url: String,
}

/// Products → customers workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CustomersConfig {
    /// Path to the SQLite database file holding `products` and `customers`
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Listing page with one row per product
    #[serde(rename = "products-url")]
    pub products_url: String,

    /// Customer listing URL; `{product}` is replaced by the product name
    #[serde(rename = "customers-url-template")]
    pub customers_url_template: String,
}

/// Placeholder substituted in `customers-url-template`
pub const PRODUCT_PLACEHOLDER: &str = "{product}";

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_fetch_timeout() -> u64 {
    60
}

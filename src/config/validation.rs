use crate::config::types::{
    Config, CustomersConfig, HttpConfig, ProductsConfig, PRODUCT_PLACEHOLDER,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;

    if let Some(products) = &config.products {
        validate_products_config(products)?;
    }

    if let Some(customers) = &config.customers {
        validate_customers_config(customers)?;
    }

    // Both workflows own a `products` table with a different shape
    if let (Some(products), Some(customers)) = (&config.products, &config.customers) {
        if products.database_path == customers.database_path {
            return Err(ConfigError::Validation(format!(
                "products and customers workflows must use different databases, both use '{}'",
                products.database_path
            )));
        }
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("request_timeout_secs", config.request_timeout_secs),
        ("connect_timeout_secs", config.connect_timeout_secs),
        ("fetch_timeout_secs", config.fetch_timeout_secs),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates the companies → products workflow
fn validate_products_config(config: &ProductsConfig) -> Result<(), ConfigError> {
    validate_database_path(&config.database_path)?;
    validate_http_url("companies_url", &config.companies_url)?;
    validate_http_url("company_base_url", &config.company_base_url)?;
    Ok(())
}

/// Validates the products → customers workflow
fn validate_customers_config(config: &CustomersConfig) -> Result<(), ConfigError> {
    validate_database_path(&config.database_path)?;
    validate_http_url("products_url", &config.products_url)?;

    if !config.customers_url_template.contains(PRODUCT_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "customers_url_template must contain '{}', got '{}'",
            PRODUCT_PLACEHOLDER, config.customers_url_template
        )));
    }

    let sample = config
        .customers_url_template
        .replace(PRODUCT_PLACEHOLDER, "PN-0000");
    validate_http_url("customers_url_template", &sample)?;

    Ok(())
}

fn validate_database_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a value parses as an absolute http(s) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

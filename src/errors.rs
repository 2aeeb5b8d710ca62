use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Transport and protocol failures abort a whole fetch.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::HttpStatus { .. } | AppError::Protocol(_)
        )
    }
}

/// Per-record problems found while normalizing upstream data. These never abort a run;
/// the offending record is excluded and counted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no catalog entry for product {product_id}")]
    MissingCatalogEntry { product_id: String },

    #[error("invalid price {price} for {item_key}")]
    InvalidPrice { item_key: String, price: f64 },

    #[error("missing or malformed {field} for {item_key:?}")]
    MissingField {
        item_key: String,
        field: &'static str,
    },

    #[error("empty item key")]
    EmptyItemKey,
}

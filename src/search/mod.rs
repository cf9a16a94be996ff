//! Search Module
//!
//! External knowledge lookups the agents can ground their answers in.
//! Currently Wikipedia, through the MediaWiki action API.

pub mod wikipedia;

pub use wikipedia::{SearchError, WikiPage, WikipediaClient};

use crate::types::AppError;

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        AppError::Tool(e.to_string())
    }
}

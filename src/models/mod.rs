//! Data models for Open Notebook

pub mod notebook;
pub mod source;
pub mod user;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Re-export commonly used types
pub use notebook::{Notebook, NotebookOrder};
pub use source::Source;
pub use user::{User, UserClaims, UserResponse};

/// Plain confirmation message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a record id given either as `<uuid>` or `<table>:<uuid>`
pub fn parse_record_id(table: &str, raw: &str) -> Option<Uuid> {
    let key = match raw.split_once(':') {
        Some((prefix, key)) if prefix == table => key,
        Some(_) => return None,
        None => raw,
    };
    Uuid::parse_str(key).ok()
}

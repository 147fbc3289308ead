//! Notebook model and related types

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;

/// Notebook with its edge counts
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Notebook {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub archived: bool,
    /// Owning user; `None` for notebooks created in single-user mode
    #[serde(skip_serializing)]
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Number of sources linked through reference edges
    pub source_count: i64,
    /// Number of notes linked through artifact edges
    pub note_count: i64,
}

/// Values needed to insert a notebook
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotebook {
    pub name: String,
    pub description: String,
    pub user_id: Option<Uuid>,
}

/// Create notebook request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNotebook {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Update notebook request; absent fields are left unchanged
#[derive(Debug, Default, Clone, PartialEq, Deserialize, ToSchema)]
pub struct UpdateNotebook {
    pub name: Option<String>,
    pub description: Option<String>,
    pub archived: Option<bool>,
}

/// Notebook list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct NotebookQuery {
    /// Filter by archived status
    pub archived: Option<bool>,
    /// `<name|created|updated> [asc|desc]`, default `updated desc`
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookSortField {
    Name,
    Created,
    Updated,
}

impl NotebookSortField {
    pub fn column(&self) -> &'static str {
        match self {
            NotebookSortField::Name => "name",
            NotebookSortField::Created => "created",
            NotebookSortField::Updated => "updated",
        }
    }
}

/// Validated ordering for notebook listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookOrder {
    pub field: NotebookSortField,
    pub descending: bool,
}

impl NotebookOrder {
    /// SQL `ORDER BY` body; only ever built from whitelisted parts
    pub fn sql(&self) -> String {
        format!(
            "n.{} {}",
            self.field.column(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

impl Default for NotebookOrder {
    fn default() -> Self {
        Self {
            field: NotebookSortField::Updated,
            descending: true,
        }
    }
}

impl fmt::Display for NotebookOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.field.column(),
            if self.descending { "desc" } else { "asc" }
        )
    }
}

impl FromStr for NotebookOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("Invalid order_by value: '{}'", s));
        let mut parts = s.split_whitespace();

        let field = match parts.next().map(str::to_lowercase).as_deref() {
            Some("name") => NotebookSortField::Name,
            Some("created") => NotebookSortField::Created,
            Some("updated") => NotebookSortField::Updated,
            _ => return Err(invalid()),
        };
        let descending = match parts.next().map(str::to_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { field, descending })
    }
}

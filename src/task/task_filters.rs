//! List-query handling for the task collection: search, the `completed`
//! filter, client-selected ordering and page-number pagination.

use serde::Deserialize;

use crate::error::{AppError, Result};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query string of `GET /tasks/`. Everything arrives as text so that bad
/// values produce our own error bodies instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub search: Option<String>,
    pub completed: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Completed,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "created_at" => Some(SortField::CreatedAt),
            "completed" => Some(SortField::Completed),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Every term must match title or description.
    pub search_terms: Vec<String>,
    pub completed: Option<bool>,
    pub ordering: Vec<SortKey>,
    pub page: u32,
    pub page_size: u32,
}

impl TaskQuery {
    pub fn from_params(params: TaskListParams, default_page_size: u32) -> Result<Self> {
        let completed = match params.completed.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_bool(raw)?),
        };

        let page = match params.page.as_deref() {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| AppError::NotFound("Invalid page.".to_string()))?,
        };

        let page_size = params
            .page_size
            .as_deref()
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|size| *size >= 1)
            .unwrap_or(default_page_size)
            .min(MAX_PAGE_SIZE);

        Ok(Self {
            search_terms: params.search.as_deref().map(search_terms).unwrap_or_default(),
            completed,
            ordering: params.ordering.as_deref().map(parse_ordering).unwrap_or_default(),
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Effective sort keys; `-created_at` when the client chose none.
    pub fn sort_keys(&self) -> Vec<SortKey> {
        if self.ordering.is_empty() {
            vec![SortKey {
                field: SortField::CreatedAt,
                descending: true,
            }]
        } else {
            self.ordering.clone()
        }
    }

    /// `ORDER BY` body built only from whitelisted column names, with `id` as
    /// the final tiebreaker.
    pub fn order_by_clause(&self) -> String {
        let mut parts: Vec<String> = self
            .sort_keys()
            .iter()
            .map(|key| {
                format!(
                    "{} {}",
                    key.field.column(),
                    if key.descending { "DESC" } else { "ASC" }
                )
            })
            .collect();
        parts.push("id ASC".to_string());
        parts.join(", ")
    }

    pub fn total_pages(&self, total: i64) -> u32 {
        let page_size = i64::from(self.page_size);
        ((total + page_size - 1) / page_size) as u32
    }
}

/// Splits a search string on whitespace and commas. NUL characters are
/// dropped since no stored text can contain them.
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .map(|term| term.replace('\0', ""))
        .filter(|term| !term.is_empty())
        .collect()
}

pub fn parse_bool(raw: &str) -> Result<bool> {
    match raw {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        other => Err(AppError::Validation(format!(
            "completed: '{}' is not a valid boolean",
            other
        ))),
    }
}

/// Parses `created_at,-completed` style ordering. Unknown fields and
/// repeated fields are dropped.
pub fn parse_ordering(raw: &str) -> Vec<SortKey> {
    let mut keys: Vec<SortKey> = Vec::new();
    for part in raw.split(',').map(str::trim) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, part),
        };
        if let Some(field) = SortField::parse(name) {
            if !keys.iter().any(|key| key.field == field) {
                keys.push(SortKey { field, descending });
            }
        }
    }
    keys
}

/// Builds an `ILIKE` pattern matching `term` as a literal substring.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

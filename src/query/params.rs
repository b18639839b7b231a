use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_FROM: u32 = 0;
pub const DEFAULT_SIZE: u32 = 10;

/// Flat query-string parameters accepted by the story search endpoint.
///
/// Everything is kept as a raw string; interpretation (lists, flags,
/// integers) happens at compile time so that malformed values can fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub arc_site: Option<String>,
    #[serde(rename = "arc-site")]
    pub arc_site_alias: Option<String>,
    pub days_back: Option<String>,
    pub include_content_types: Option<String>,
    pub include_subtypes: Option<String>,
    pub include_sections: Option<String>,
    pub include_distributor: Option<String>,
    pub include_tags: Option<String>,
    pub must_include_all_tags: Option<String>,
    pub must_include_thumbnail: Option<String>,
    pub exclude_content_types: Option<String>,
    pub exclude_subtypes: Option<String>,
    pub exclude_sections: Option<String>,
    pub exclude_distributor: Option<String>,
    pub exclude_tags: Option<String>,
    pub exclude_these_story_ids: Option<String>,
    pub from: Option<String>,
    pub size: Option<String>,
}

/// Offset/limit window of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub from: u32,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM,
            size: DEFAULT_SIZE,
        }
    }
}

impl QueryParams {
    /// The site every query is scoped to. `arcSite` wins over `arc-site`.
    pub fn active_site(&self) -> Result<&str, AppError> {
        [&self.arc_site, &self.arc_site_alias]
            .into_iter()
            .flatten()
            .map(|site| site.trim())
            .find(|site| !site.is_empty())
            .ok_or(AppError::MissingScope)
    }

    /// Negative or non-numeric values fall back to the defaults.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            from: parse_non_negative(self.from.as_deref()).unwrap_or(DEFAULT_FROM),
            size: parse_non_negative(self.size.as_deref()).unwrap_or(DEFAULT_SIZE),
        }
    }
}

/// Split a comma-separated parameter, trimming entries and dropping empty ones.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// A flag is set only by the exact string `"true"`.
pub fn is_flag_set(raw: Option<&str>) -> bool {
    raw == Some("true")
}

pub fn parse_non_negative(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

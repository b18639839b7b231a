use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{json, Value};

/// How the index treats fields that are not declared in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// Undeclared fields make the write fail.
    #[default]
    Strict,
    /// Undeclared fields are kept in the source but not indexed.
    Loose,
}

impl MappingMode {
    fn dynamic(&self) -> Value {
        match self {
            MappingMode::Strict => json!("strict"),
            MappingMode::Loose => json!(false),
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingMode::Strict => write!(f, "strict"),
            MappingMode::Loose => write!(f, "loose"),
        }
    }
}

impl FromStr for MappingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(MappingMode::Strict),
            "loose" => Ok(MappingMode::Loose),
            other => Err(format!(
                "Invalid mapping mode '{other}'. Expected: strict, loose"
            )),
        }
    }
}

/// The `mappings` object for the story index.
pub fn mappings(mode: MappingMode) -> Value {
    json!({
        "dynamic": mode.dynamic(),
        "properties": {
            "display_date": {
                "type": "date",
                "format": "strict_date_optional_time||epoch_millis"
            },
            "canonical_website": { "type": "keyword" },
            "type": { "type": "keyword" },
            "subtype": { "type": "keyword" },
            "distributor": {
                "properties": {
                    "reference_id": { "type": "keyword" }
                }
            },
            "taxonomy": {
                "properties": {
                    "sections": {
                        "type": "nested",
                        "properties": {
                            "_id": { "type": "keyword" }
                        }
                    },
                    "tags": {
                        "type": "nested",
                        "properties": {
                            "text": { "type": "keyword" },
                            "slug": { "type": "keyword" }
                        }
                    }
                }
            },
            "websites": { "type": "flat_object" },
            "promo_items": {
                "properties": {
                    "basic": {
                        "properties": {
                            "_id": { "type": "keyword" },
                            "type": { "type": "keyword" },
                            "url": { "type": "keyword", "index": false }
                        }
                    }
                }
            }
        }
    })
}

/// Full body for an index-creation request.
pub fn index_body(mode: MappingMode) -> Value {
    json!({ "mappings": mappings(mode) })
}

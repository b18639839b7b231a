use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Field names of the indexed document, as seen by the engine.
pub mod fields {
    /// Engine metadata id. Used in queries, never stored inside the source.
    pub const ID: &str = "_id";
    pub const DISPLAY_DATE: &str = "display_date";
    pub const CANONICAL_WEBSITE: &str = "canonical_website";
    pub const TYPE: &str = "type";
    pub const SUBTYPE: &str = "subtype";
    pub const DISTRIBUTOR_REFERENCE_ID: &str = "distributor.reference_id";
    pub const SECTIONS: &str = "taxonomy.sections";
    pub const SECTION_ID: &str = "taxonomy.sections._id";
    pub const TAGS: &str = "taxonomy.tags";
    pub const TAG_TEXT: &str = "taxonomy.tags.text";
    pub const TAG_SLUG: &str = "taxonomy.tags.slug";
    /// Presence of this object marks a story as having a thumbnail.
    pub const THUMBNAIL: &str = "promo_items.basic";
}

/// A story as stored in the search index.
///
/// This is the indexed subset of an ANS story; the body never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Story id. Doubles as the engine document id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Publish date, or creation date for content that was never published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<DateTime<Utc>>,
    /// The site that owns the story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_website: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributor: Option<Distributor>,
    #[serde(default)]
    pub taxonomy: Taxonomy,
    /// Per-site attributes, kept as an opaque blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websites: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_items: Option<PromoItems>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Nested: every entry is matched on its own.
    #[serde(default)]
    pub sections: Vec<SectionRef>,
    /// Nested: every entry is matched on its own.
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRef {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoItems {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<PromoImage>,
}

/// The lead image, reduced to what is needed to render a thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoImage {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl IndexedDocument {
    /// The body sent to the engine: the document minus its `_id`,
    /// which travels in the request path instead.
    pub fn to_source(&self) -> Result<serde_json::Value, AppError> {
        let mut source = serde_json::to_value(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize document: {e}")))?;
        if let Some(object) = source.as_object_mut() {
            object.remove(fields::ID);
        }
        Ok(source)
    }
}

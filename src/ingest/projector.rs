use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::schema::document::{
    Distributor, IndexedDocument, PromoImage, PromoItems, SectionRef, TagRef, Taxonomy,
};

/// The parts of an ANS story the index cares about.
///
/// Anything not declared here (the `content_elements` body in particular)
/// is dropped while deserializing and can never reach the index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsStory {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_date: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub canonical_website: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub distributor: Option<AnsDistributor>,
    #[serde(default)]
    pub taxonomy: Option<AnsTaxonomy>,
    #[serde(default)]
    pub websites: Option<serde_json::Value>,
    #[serde(default)]
    pub promo_items: Option<AnsPromoItems>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsDistributor {
    #[serde(default)]
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsTaxonomy {
    #[serde(default)]
    pub sections: Option<Vec<AnsSection>>,
    #[serde(default)]
    pub tags: Option<Vec<AnsTag>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsSection {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsTag {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsPromoItems {
    #[serde(default)]
    pub basic: Option<AnsPromoImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnsPromoImage {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl AnsStory {
    /// Read a story out of a raw event payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, AppError> {
        if payload.is_null() {
            return Ok(AnsStory::default());
        }
        AnsStory::deserialize(payload)
            .map_err(|e| AppError::Validation(format!("Malformed story payload: {e}")))
    }

    /// The story id, if present and non-blank.
    pub fn story_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Project a story onto its indexed subset.
pub fn project(story: &AnsStory) -> Result<IndexedDocument, AppError> {
    let id = story
        .story_id()
        .ok_or_else(|| AppError::Validation("missing id for index".into()))?;

    // Unpublished stories have no display date yet, or an empty one
    let display_date = non_blank(story.display_date.as_deref())
        .or(non_blank(story.created_date.as_deref()))
        .map(parse_timestamp)
        .transpose()?;

    let taxonomy = story.taxonomy.as_ref();
    let sections = taxonomy
        .and_then(|t| t.sections.as_ref())
        .map(|sections| {
            sections
                .iter()
                .filter_map(|section| section.id.clone())
                .map(|id| SectionRef { id })
                .collect()
        })
        .unwrap_or_default();
    let tags = taxonomy
        .and_then(|t| t.tags.as_ref())
        .map(|tags| {
            tags.iter()
                .map(|tag| TagRef {
                    text: tag.text.clone(),
                    slug: tag.slug.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let promo_items = story
        .promo_items
        .as_ref()
        .and_then(|promo| promo.basic.as_ref())
        .map(|basic| PromoItems {
            basic: Some(PromoImage {
                id: basic.id.clone(),
                image_type: basic.image_type.clone(),
                url: basic.url.clone(),
            }),
        });

    Ok(IndexedDocument {
        id: id.to_string(),
        display_date,
        canonical_website: story.canonical_website.clone(),
        content_type: story.content_type.clone(),
        subtype: story.subtype.clone(),
        distributor: story
            .distributor
            .as_ref()
            .and_then(|d| d.reference_id.clone())
            .map(|reference_id| Distributor {
                reference_id: Some(reference_id),
            }),
        taxonomy: Taxonomy { sections, tags },
        websites: story.websites.clone(),
        promo_items,
    })
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("Invalid timestamp '{raw}': {e}")))
}

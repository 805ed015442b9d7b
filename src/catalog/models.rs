use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content classification for a cataloged presentation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Image,
    Video,
    Powerpoint,
    Link,
}

impl ContentCategory {
    /// Whether items of this category own a blob in the object store.
    pub fn owns_blob(&self) -> bool {
        !matches!(self, ContentCategory::Link)
    }
}

/// A lesson record stored in redb. Lessons own presentations; deleting a
/// lesson cascades to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub quarter_id: String,
    /// Sequence position within the quarter, assigned at creation.
    pub lesson_number: u32,
    pub title: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// A cataloged content item referencing a stored blob or an external link.
///
/// Immutable after creation except `display_order`, which only renumbering
/// on sibling deletion may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub id: String,
    pub lesson_id: String,
    pub category: ContentCategory,
    /// Public retrieval address. For `link` items this is the caller-supplied
    /// URL verbatim; otherwise a storage-backend URL.
    pub file_url: String,
    /// Opaque handle for deleting the blob. Always `None` for `link` items.
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// 1-based rank within the lesson. The set of orders for a lesson is
    /// always exactly {1..N}.
    pub display_order: u32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields the caller supplies when cataloging a new presentation.
/// `display_order` is assigned by the catalog, never by the caller.
#[derive(Debug, Clone)]
pub struct NewPresentation {
    pub category: ContentCategory,
    pub file_url: String,
    pub external_ref: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_by: i64,
}

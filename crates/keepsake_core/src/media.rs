//! Gallery media items.

use serde::{Deserialize, Serialize};

/// Kind of media a guest uploaded.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image
    #[display("photo")]
    Photo,
    /// Video clip
    #[display("video")]
    Video,
}

impl MediaType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    /// File extension used when saving a download of this kind.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaType::Photo => "jpg",
            MediaType::Video => "mp4",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaType::Photo),
            "video" => Ok(MediaType::Video),
            _ => Err(format!("Unknown media type: {}", s)),
        }
    }
}

/// A single photo or video in the gallery.
///
/// Items arrive from the gallery listing and are never mutated by the
/// components that display them.
///
/// # Examples
///
/// ```
/// use keepsake_core::{MediaItem, MediaType};
///
/// let item = MediaItem::builder()
///     .id("m-1")
///     .media_type(MediaType::Photo)
///     .media_url("https://cdn.example.com/m-1.jpg")
///     .title("First dance")
///     .build()
///     .unwrap();
///
/// assert_eq!(item.id(), "m-1");
/// assert_eq!(item.title().as_deref(), Some("First dance"));
/// assert!(item.uploader_name().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct MediaItem {
    /// Unique identifier
    id: String,
    /// Photo or video
    media_type: MediaType,
    /// Remote object URL
    media_url: String,
    /// Poster frame for videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    thumbnail_url: Option<String>,
    /// Caption supplied by the uploader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    title: Option<String>,
    /// Display name of the guest who uploaded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    uploader_name: Option<String>,
}

impl MediaItem {
    /// Start building a media item.
    pub fn builder() -> MediaItemBuilder {
        MediaItemBuilder::default()
    }

    /// Whether this item is a video.
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Filename offered when a guest saves this item.
    ///
    /// Uses the title when present, otherwise `keepsake-<id>`, and appends the
    /// media type's extension unless the name already carries one.
    ///
    /// ```
    /// use keepsake_core::{MediaItem, MediaType};
    ///
    /// let clip = MediaItem::builder()
    ///     .id("42")
    ///     .media_type(MediaType::Video)
    ///     .media_url("https://cdn.example.com/42.mp4")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(clip.suggested_filename(), "keepsake-42.mp4");
    /// ```
    pub fn suggested_filename(&self) -> String {
        let stem = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("keepsake-{}", self.id),
        };
        let has_extension = std::path::Path::new(&stem)
            .extension()
            .is_some_and(|ext| !ext.is_empty() && ext.len() <= 4);
        if has_extension {
            stem
        } else {
            format!("{}.{}", stem, self.media_type.default_extension())
        }
    }
}

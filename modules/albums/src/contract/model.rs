use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque album identifier. The backend sends either a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AlbumId(String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlbumId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AlbumId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Self(n.to_string()),
            Raw::Str(s) => Self(s),
        })
    }
}

/// Album list ordering; the wire label is what the backend expects in `sort=`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlbumSort {
    #[default]
    Latest,
    Oldest,
    Popular,
}

impl AlbumSort {
    pub const ALL: [AlbumSort; 3] = [Self::Latest, Self::Oldest, Self::Popular];

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Latest => "LATEST",
            Self::Oldest => "OLDEST",
            Self::Popular => "POPULAR",
        }
    }
}

impl fmt::Display for AlbumSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for AlbumSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_wire().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort '{s}', expected one of LATEST, OLDEST, POPULAR"))
    }
}

/// One entry of `GET /albums`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: AlbumId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// `GET /albums/{id}`. Every field is optional on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDetail {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_nickname: Option<String>,
    #[serde(default)]
    pub song_count: Option<u32>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What the detail lookup told us about a row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAccess {
    /// No detail available (disabled, or the lookup failed).
    #[default]
    Unknown,
    Visible,
    /// The album belongs to someone else and is not shared.
    PrivateToOther,
}

/// A list row: the summary plus whatever enrichment produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlbumRow {
    pub summary: AlbumSummary,
    pub detail: Option<AlbumDetail>,
    pub access: RowAccess,
}

impl AlbumRow {
    pub fn id(&self) -> &AlbumId {
        &self.summary.id
    }

    pub fn is_private(&self) -> bool {
        self.access == RowAccess::PrivateToOther
    }

    /// Title from the detail if known, otherwise from the summary.
    pub fn title(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.title.as_deref())
            .or(self.summary.title.as_deref())
    }

    pub fn with_detail(self, detail: AlbumDetail) -> Self {
        Self {
            detail: Some(detail),
            access: RowAccess::Visible,
            ..self
        }
    }

    pub fn private_to_other(self) -> Self {
        Self {
            detail: None,
            access: RowAccess::PrivateToOther,
            ..self
        }
    }
}

impl From<AlbumSummary> for AlbumRow {
    fn from(summary: AlbumSummary) -> Self {
        Self {
            summary,
            detail: None,
            access: RowAccess::Unknown,
        }
    }
}

/// Settled state of the album list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlbumPage {
    pub rows: Vec<AlbumRow>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub sort: AlbumSort,
}

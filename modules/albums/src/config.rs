use serde::{Deserialize, Serialize};

use crate::contract::model::AlbumSort;

/// Configuration for the albums module (`modules.albums` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlbumsConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub default_sort: AlbumSort,
    /// Fetch `GET /albums/{id}` for every listed row.
    #[serde(default = "default_enrich_details")]
    pub enrich_details: bool,
}

impl Default for AlbumsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: AlbumSort::default(),
            enrich_details: default_enrich_details(),
        }
    }
}

impl AlbumsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.page_size > 0, "albums.page_size must be at least 1");
        Ok(())
    }
}

fn default_page_size() -> u32 {
    4
}

fn default_enrich_details() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: AlbumsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.page_size, 4);
        assert_eq!(cfg.default_sort, AlbumSort::Latest);
        assert!(cfg.enrich_details);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn section_overrides_and_validation() {
        let cfg: AlbumsConfig = serde_json::from_value(serde_json::json!({
            "page_size": 0,
            "default_sort": "POPULAR",
            "enrich_details": false
        }))
        .unwrap();
        assert_eq!(cfg.default_sort, AlbumSort::Popular);
        assert!(!cfg.enrich_details);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = serde_json::from_value::<AlbumsConfig>(serde_json::json!({ "pageSize": 8 }));
        assert!(res.is_err());
    }
}

use async_trait::async_trait;
use url::Url;

use crate::error::CookbookError;
use crate::geo::Coordinates;

#[async_trait]
pub trait MapLauncher: Send + Sync {
    /// Shows `at` in a map application; returns what was opened.
    async fn open(&self, at: Coordinates, label: &str) -> Result<String, CookbookError>;
}

/// Renders an OpenStreetMap link instead of launching an app.
pub struct OsmLinkMaps {
    pub base: String,
}

impl Default for OsmLinkMaps {
    fn default() -> Self {
        Self { base: "https://www.openstreetmap.org/".to_string() }
    }
}

pub fn osm_url(base: &str, at: Coordinates) -> Result<Url, CookbookError> {
    if !at.is_valid() {
        return Err(CookbookError::MapsUnavailable(format!(
            "coordinates out of range: {}, {}",
            at.latitude, at.longitude
        )));
    }
    let mut url = Url::parse(base).map_err(|e| CookbookError::MapsUnavailable(format!("bad map base url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("mlat", &at.latitude.to_string())
        .append_pair("mlon", &at.longitude.to_string());
    url.set_fragment(Some(&format!("map=14/{}/{}", at.latitude, at.longitude)));
    Ok(url)
}

#[async_trait]
impl MapLauncher for OsmLinkMaps {
    async fn open(&self, at: Coordinates, label: &str) -> Result<String, CookbookError> {
        let url = osm_url(&self.base, at)?;
        tracing::info!(label, url = %url, "map link");
        Ok(url.to_string())
    }
}

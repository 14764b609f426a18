use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::CookbookError;
use crate::geo::Coordinates;

/// One dish as published by the recipe feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "Name", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "Location", default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(rename = "Details", default, deserialize_with = "null_as_empty")]
    pub details: String,
    /// Absolute or relative reference, kept as published.
    #[serde(rename = "Image", default, deserialize_with = "null_as_empty")]
    pub image: String,
    // Unused by the app; kept so the feed round-trips unchanged.
    #[serde(rename = "Population")]
    pub population: i64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl Recipe {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Resolves the image reference, joining a relative one onto `base`.
    pub fn image_url(&self, base: Option<&Url>) -> Option<Url> {
        if self.image.is_empty() {
            return None;
        }
        match Url::parse(&self.image) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => base.and_then(|b| b.join(&self.image).ok()),
            Err(_) => None,
        }
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

pub fn from_json(body: &[u8]) -> Result<Vec<Recipe>, CookbookError> {
    let recipes: Vec<Recipe> = serde_json::from_slice(body)?;
    Ok(recipes)
}

pub fn to_json(recipes: &[Recipe]) -> Result<String, CookbookError> {
    Ok(serde_json::to_string(recipes)?)
}

#[cfg(test)]
pub(crate) fn sample(name: &str, latitude: f64, longitude: f64) -> Recipe {
    Recipe {
        name: name.to_string(),
        location: format!("{name} town"),
        details: "...".to_string(),
        image: "http://x/i.png".to_string(),
        population: 0,
        latitude,
        longitude,
    }
}

use serde::{Deserialize, Serialize};

/// TMDB image rendition sizes used by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    #[default]
    Poster,
    Backdrop,
    Thumbnail,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Poster => "w500",
            ImageSize::Backdrop => "w1280",
            ImageSize::Thumbnail => "w200",
        }
    }
}

/// Build the full image URL for a TMDB image path.
/// Returns None when the movie has no image of that kind.
pub fn image_url(base_url: &str, path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{}{}{}", base_url, size.as_str(), path))
}

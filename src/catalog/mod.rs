use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::Result;

pub mod jikan;

pub use jikan::JikanClient;

/// A single anime record as returned by the API. Search pages and the
/// detail endpoint share this shape; the extended fields are simply
/// absent from search results for some titles.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Anime {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Images,
    pub score: Option<f64>,
    pub episodes: Option<u32>,
    pub year: Option<i32>,
    pub popularity: Option<u32>,
    pub rank: Option<u32>,
    pub favorites: Option<u32>,
    pub synopsis: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    #[serde(default)]
    pub genres: Vec<Named>,
    #[serde(default)]
    pub themes: Vec<Named>,
    #[serde(default)]
    pub studios: Vec<Named>,
    #[serde(default)]
    pub producers: Vec<Named>,
    pub trailer: Option<Trailer>,
}

impl Anime {
    pub fn image_url(&self) -> Option<&str> {
        self.images.jpg.as_ref()?.image_url.as_deref()
    }

    /// Prefer the large rendition for the detail poster.
    pub fn poster_url(&self) -> Option<&str> {
        let jpg = self.images.jpg.as_ref()?;
        jpg.large_image_url.as_deref().or(jpg.image_url.as_deref())
    }

    pub fn trailer_url(&self) -> Option<&str> {
        let trailer = self.trailer.as_ref()?;
        trailer.embed_url.as_deref().or(trailer.url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Images {
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

/// Named reference entry (genre, theme, studio, producer). The API
/// sends mal_id/type/url alongside; only the name is rendered.
#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Trailer {
    pub url: Option<String>,
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_last_page")]
    pub last_visible_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
    pub current_page: Option<u32>,
}

fn default_last_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            last_visible_page: 1,
            has_next_page: false,
            current_page: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<Anime>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterEdge {
    pub character: Character,
    pub role: Option<String>,
    pub favorites: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Character {
    pub mal_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub review: String,
    pub score: Option<u8>,
    pub date: Option<String>,
    pub user: Option<Reviewer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reviewer {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub entry: Option<RecommendationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationEntry {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub images: Images,
}

/// Read-only catalog source. Every fetch replaces the previous data
/// wholesale; implementations never cache across calls.
#[async_trait::async_trait]
pub trait CatalogProvider {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage>;
    async fn anime(&self, id: u64) -> Result<Anime>;
    async fn characters(&self, id: u64) -> Result<Vec<CharacterEdge>>;
    async fn reviews(&self, id: u64) -> Result<Vec<Review>>;
    async fn streaming(&self, id: u64) -> Result<Vec<StreamingLink>>;
    async fn recommendations(&self, id: u64) -> Result<Vec<Recommendation>>;
}

// MAL-sourced synopses carry a trailing attribution tag
static SOURCE_TAG: OnceLock<Regex> = OnceLock::new();

fn source_tag() -> &'static Regex {
    SOURCE_TAG.get_or_init(|| {
        Regex::new(r"(?i)\s*\[written by mal rewrite\]\s*$").unwrap()
    })
}

/// Strip the "[Written by MAL Rewrite]" tag and trim the synopsis.
pub fn clean_synopsis(synopsis: &str) -> String {
    source_tag().replace(synopsis, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_synopsis_strips_tag() {
        let raw = "A boy becomes a ninja.\n\n[Written by MAL Rewrite]";
        assert_eq!(clean_synopsis(raw), "A boy becomes a ninja.");
    }

    #[test]
    fn test_clean_synopsis_case_insensitive() {
        let raw = "Plot.\n[written by MAL rewrite]  ";
        assert_eq!(clean_synopsis(raw), "Plot.");
    }

    #[test]
    fn test_clean_synopsis_without_tag() {
        assert_eq!(clean_synopsis("  Just a plot.  "), "Just a plot.");
    }

    #[test]
    fn test_poster_prefers_large() {
        let anime = Anime {
            images: Images {
                jpg: Some(ImageSet {
                    image_url: Some("small.jpg".into()),
                    large_image_url: Some("large.jpg".into()),
                }),
            },
            ..Anime::default()
        };
        assert_eq!(anime.poster_url(), Some("large.jpg"));
        assert_eq!(anime.image_url(), Some("small.jpg"));
    }
}

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::{
    Anime, CatalogProvider, CharacterEdge, Recommendation, Review, SearchPage, StreamingLink,
};
use crate::error::{Error, Result};

pub const JIKAN_API_BASE: &str = "https://api.jikan.moe/v4";

/// Server-side page size for search results.
pub const SEARCH_PAGE_LIMIT: u32 = 12;

const CHARACTERS_LIMIT: u32 = 24;
const REVIEWS_LIMIT: u32 = 48;
const RECOMMENDATIONS_LIMIT: u32 = 20;

/// Everything except search comes wrapped in a `data` envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

pub struct JikanClient {
    client: reqwest::Client,
    base_url: String,
}

impl JikanClient {
    pub fn new() -> Self {
        Self::with_base_url(JIKAN_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("yomu/0.1")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!("{}/anime?", self.base_url);
        if !query.is_empty() {
            url.push_str(&format!("q={}&", urlencoding::encode(query)));
        }
        url.push_str(&format!("page={}&limit={}", page, SEARCH_PAGE_LIMIT));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Fetching from Jikan");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::Api(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CatalogProvider for JikanClient {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        let url = self.search_url(query, page);
        let result: SearchPage = self.get_json(&url).await?;
        debug!(count = result.data.len(), "Parsed search results");
        Ok(result)
    }

    async fn anime(&self, id: u64) -> Result<Anime> {
        let url = format!("{}/anime/{}", self.base_url, id);
        let resp: Envelope<Anime> = self.get_json(&url).await?;
        Ok(resp.data)
    }

    async fn characters(&self, id: u64) -> Result<Vec<CharacterEdge>> {
        let url = format!(
            "{}/anime/{}/characters?limit={}",
            self.base_url, id, CHARACTERS_LIMIT
        );
        let resp: Envelope<Vec<CharacterEdge>> = self.get_json(&url).await?;
        Ok(resp.data)
    }

    async fn reviews(&self, id: u64) -> Result<Vec<Review>> {
        let url = format!(
            "{}/anime/{}/reviews?limit={}",
            self.base_url, id, REVIEWS_LIMIT
        );
        let resp: Envelope<Vec<Review>> = self.get_json(&url).await?;
        Ok(resp.data)
    }

    async fn streaming(&self, id: u64) -> Result<Vec<StreamingLink>> {
        let url = format!("{}/anime/{}/streaming", self.base_url, id);
        let resp: Envelope<Vec<StreamingLink>> = self.get_json(&url).await?;
        Ok(resp.data)
    }

    async fn recommendations(&self, id: u64) -> Result<Vec<Recommendation>> {
        let url = format!(
            "{}/anime/{}/recommendations?limit={}",
            self.base_url, id, RECOMMENDATIONS_LIMIT
        );
        let resp: Envelope<Vec<Recommendation>> = self.get_json(&url).await?;
        Ok(resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_with_query() {
        let client = JikanClient::new();
        assert_eq!(
            client.search_url("naruto", 1),
            "https://api.jikan.moe/v4/anime?q=naruto&page=1&limit=12"
        );
    }

    #[test]
    fn test_search_url_encodes_query() {
        let client = JikanClient::new();
        assert_eq!(
            client.search_url("cowboy bebop", 3),
            "https://api.jikan.moe/v4/anime?q=cowboy%20bebop&page=3&limit=12"
        );
    }

    #[test]
    fn test_search_url_empty_query_browses() {
        let client = JikanClient::new();
        assert_eq!(
            client.search_url("", 1),
            "https://api.jikan.moe/v4/anime?page=1&limit=12"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = JikanClient::with_base_url("http://localhost:8080/");
        assert_eq!(
            client.search_url("", 2),
            "http://localhost:8080/anime?page=2&limit=12"
        );
    }

    #[test]
    fn test_parse_search_page() {
        let json = r#"{
            "pagination": {
                "last_visible_page": 5,
                "has_next_page": true,
                "current_page": 1
            },
            "data": [
                {
                    "mal_id": 20,
                    "url": "https://myanimelist.net/anime/20/Naruto",
                    "images": {"jpg": {"image_url": "https://cdn.example/20.jpg"}},
                    "title": "Naruto",
                    "type": "TV",
                    "episodes": 220,
                    "score": 8.01,
                    "year": 2002,
                    "popularity": 8,
                    "genres": [{"mal_id": 1, "type": "anime", "name": "Action"}]
                }
            ]
        }"#;

        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.pagination.last_visible_page, 5);
        assert!(page.pagination.has_next_page);
        assert_eq!(page.data.len(), 1);

        let anime = &page.data[0];
        assert_eq!(anime.mal_id, 20);
        assert_eq!(anime.title, "Naruto");
        assert_eq!(anime.score, Some(8.01));
        assert_eq!(anime.year, Some(2002));
        assert_eq!(anime.kind.as_deref(), Some("TV"));
        assert_eq!(anime.genres[0].name, "Action");
        assert_eq!(anime.image_url(), Some("https://cdn.example/20.jpg"));
    }

    #[test]
    fn test_parse_search_page_missing_pagination() {
        let page: SearchPage = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(page.pagination.last_visible_page, 1);
        assert!(!page.pagination.has_next_page);
    }

    #[test]
    fn test_parse_detail_envelope() {
        let json = r#"{
            "data": {
                "mal_id": 1,
                "title": "Cowboy Bebop",
                "synopsis": "Bounty hunters in space.",
                "rank": 47,
                "favorites": 80000,
                "status": "Finished Airing",
                "duration": "24 min per ep",
                "rating": "R - 17+",
                "trailer": {"embed_url": "https://www.youtube.com/embed/abc"},
                "studios": [{"mal_id": 14, "type": "anime", "name": "Sunrise"}]
            }
        }"#;

        let resp: Envelope<Anime> = serde_json::from_str(json).unwrap();
        let anime = resp.data;
        assert_eq!(anime.rank, Some(47));
        assert_eq!(anime.studios[0].name, "Sunrise");
        assert_eq!(
            anime.trailer_url(),
            Some("https://www.youtube.com/embed/abc")
        );
    }

    #[test]
    fn test_parse_characters() {
        let json = r#"{
            "data": [
                {
                    "character": {
                        "mal_id": 17,
                        "name": "Naruto Uzumaki",
                        "images": {"jpg": {"image_url": "https://cdn.example/c17.jpg"}}
                    },
                    "role": "Main",
                    "favorites": 5000
                },
                {
                    "character": {"name": "Extra"},
                    "role": "Supporting"
                }
            ]
        }"#;

        let resp: Envelope<Vec<CharacterEdge>> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].character.name, "Naruto Uzumaki");
        assert_eq!(resp.data[0].favorites, Some(5000));
        assert_eq!(resp.data[1].role.as_deref(), Some("Supporting"));
    }

    #[test]
    fn test_parse_reviews_and_streaming() {
        let json = r#"{
            "data": [
                {
                    "review": "A classic.",
                    "score": 9,
                    "date": "2020-01-15T04:20:00+00:00",
                    "user": {"username": "viewer1"}
                }
            ]
        }"#;
        let resp: Envelope<Vec<Review>> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].score, Some(9));
        assert_eq!(
            resp.data[0].user.as_ref().unwrap().username.as_deref(),
            Some("viewer1")
        );

        let json = r#"{"data": [{"name": "Crunchyroll", "url": "https://crunchyroll.com/x"}]}"#;
        let resp: Envelope<Vec<StreamingLink>> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].name, "Crunchyroll");
    }

    #[test]
    fn test_parse_recommendations() {
        let json = r#"{
            "data": [
                {
                    "entry": {
                        "mal_id": 30,
                        "title": "NGE",
                        "images": {"jpg": {"image_url": "https://cdn.example/30.jpg"}}
                    }
                },
                {}
            ]
        }"#;
        let resp: Envelope<Vec<Recommendation>> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].entry.as_ref().unwrap().mal_id, 30);
        assert!(resp.data[1].entry.is_none());
    }
}

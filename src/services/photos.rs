//! Best-effort place photos from Wikipedia.
//!
//! Two lookups: the page summary for the place name, and a geosearch for the
//! nearest article within 1 km. Every failure resolves to `None`.

use futures::future::BoxFuture;
use serde::Deserialize;

/// Source of thumbnail URLs for a selected place.
pub trait PhotoSource: Send + Sync {
    fn photo_by_name(&self, name: &str) -> BoxFuture<'static, Option<String>>;
    fn photo_near(&self, latitude: f64, longitude: f64) -> BoxFuture<'static, Option<String>>;
}

/// Geosearch radius in metres.
const GEOSEARCH_RADIUS_M: u32 = 1000;

#[derive(Debug, Clone)]
pub struct WikipediaPhotos {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    query: Option<GeoSearchQuery>,
}

#[derive(Debug, Deserialize)]
struct GeoSearchQuery {
    #[serde(default)]
    geosearch: Vec<GeoSearchHit>,
}

#[derive(Debug, Deserialize)]
struct GeoSearchHit {
    title: String,
}

impl WikipediaPhotos {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Thumbnail of the article titled `title`.
    pub async fn summary_thumbnail(&self, title: &str) -> Option<String> {
        if title.trim().is_empty() {
            return None;
        }

        let mut url = reqwest::Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .extend(["api", "rest_v1", "page", "summary", title]);

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Photo summary request for '{}' failed: {}", title, e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(
                "Photo summary for '{}' returned HTTP {}",
                title,
                response.status()
            );
            return None;
        }

        let summary: PageSummary = response.json().await.ok()?;
        summary.thumbnail.and_then(|t| t.source)
    }

    /// Thumbnail of the article nearest to the coordinates.
    pub async fn nearest_thumbnail(&self, latitude: f64, longitude: f64) -> Option<String> {
        let url = format!("{}/w/api.php", self.base_url);
        let gscoord = format!("{}|{}", latitude, longitude);
        let radius = GEOSEARCH_RADIUS_M.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("action", "query"),
                ("list", "geosearch"),
                ("gscoord", gscoord.as_str()),
                ("gsradius", radius.as_str()),
                ("gslimit", "1"),
                ("format", "json"),
                ("origin", "*"),
            ])
            .send()
            .await
            .map_err(|e| tracing::debug!("Geosearch request failed: {}", e))
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let found: GeoSearchResponse = response.json().await.ok()?;
        let title = found.query?.geosearch.into_iter().next()?.title;
        self.summary_thumbnail(&title).await
    }
}

impl PhotoSource for WikipediaPhotos {
    fn photo_by_name(&self, name: &str) -> BoxFuture<'static, Option<String>> {
        let this = self.clone();
        let name = name.to_string();
        Box::pin(async move { this.summary_thumbnail(&name).await })
    }

    fn photo_near(&self, latitude: f64, longitude: f64) -> BoxFuture<'static, Option<String>> {
        let this = self.clone();
        Box::pin(async move { this.nearest_thumbnail(latitude, longitude).await })
    }
}

/// Look up a photo by name, falling back to the nearest article.
pub async fn lookup_place_photo(
    source: &dyn PhotoSource,
    name: Option<&str>,
    latitude: f64,
    longitude: f64,
) -> Option<String> {
    let by_name = match name {
        Some(n) => source.photo_by_name(n).await,
        None => None,
    };
    match by_name {
        Some(url) => Some(url),
        None => source.photo_near(latitude, longitude).await,
    }
}

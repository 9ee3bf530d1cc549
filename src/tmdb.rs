use crate::config::Config;
use crate::error::ClientError;
use crate::models::{MovieDetail, MovieSummary, SearchPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w1280";

/// Raw outcome of a GET: status code plus body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam under [`TmdbClient`]. One call is one outbound request.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

#[async_trait]
impl HttpGet for Client {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        // reqwest errors carry the URL, which holds the api key.
        let res = Client::get(self, url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request failed")?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("reading body failed")?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ClientError>;
    async fn fetch_details(&self, id: i64) -> Result<MovieDetail, ClientError>;
}

#[derive(Clone)]
pub struct TmdbClient {
    http: Arc<dyn HttpGet>,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(
        http: Arc<dyn HttpGet>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let user_agent = format!("cinefav/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self::new(
            Arc::new(client),
            config.tmdb_base_url.clone(),
            config.tmdb_api_key.clone(),
            config.language.clone(),
        ))
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search/movie?api_key={}&query={}&language={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(query),
            self.language
        )
    }

    pub fn details_url(&self, id: i64) -> String {
        format!(
            "{}/movie/{id}?api_key={}&language={}",
            self.base_url, self.api_key, self.language
        )
    }

    /// Full error chain with the api key masked.
    fn describe(&self, err: &anyhow::Error) -> String {
        let text = format!("{err:#}");
        if self.api_key.is_empty() {
            return text;
        }
        text.replace(&self.api_key, "***")
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self.http.get(url).await?;
        if !res.is_success() {
            return Err(anyhow!("HTTP {} -> {}", res.status, res.body));
        }
        let parsed: T = serde_json::from_str(&res.body).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ClientError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        debug!(query, "searching TMDB");
        let page: SearchPage = self
            .get_json(&self.search_url(query))
            .await
            .map_err(|e| {
                let cause = self.describe(&e);
                warn!("TMDB search for '{}' failed: {}", query, cause);
                ClientError::SearchFailed(cause)
            })?;
        debug!(
            page = page.page,
            total_pages = page.total_pages,
            total_results = page.total_results,
            "TMDB search returned {} results",
            page.results.len()
        );
        Ok(page.results)
    }

    async fn fetch_details(&self, id: i64) -> Result<MovieDetail, ClientError> {
        debug!(movie_id = id, "fetching TMDB details");
        self.get_json(&self.details_url(id)).await.map_err(|e| {
            let cause = self.describe(&e);
            warn!("TMDB details for {} failed: {}", id, cause);
            ClientError::DetailsFailed(cause)
        })
    }
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{POSTER_BASE}{p}"))
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{BACKDROP_BASE}{p}"))
}

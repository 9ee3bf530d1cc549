use serde::{Deserialize, Serialize};

/// Search result record, also the shape persisted for favorites.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub adult: bool,
}

impl MovieSummary {
    /// Minimal record, mostly useful for favorites built by hand.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            overview: String::new(),
            release_date: String::new(),
            vote_average: 0.0,
            vote_count: 0,
            genre_ids: Vec::new(),
            original_language: String::new(),
            original_title: String::new(),
            popularity: 0.0,
            adult: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tagline: String,
}

impl MovieDetail {
    /// Summary view of the detail record, used when bookmarking from the
    /// details screen.
    pub fn to_summary(&self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            overview: self.overview.clone(),
            release_date: self.release_date.clone(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            genre_ids: self.genres.iter().map(|g| g.id).collect(),
            original_language: self.original_language.clone(),
            original_title: self.original_title.clone(),
            popularity: self.popularity,
            adult: self.adult,
        }
    }
}

/// First page of a title search. Pagination fields are read but never
/// followed.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

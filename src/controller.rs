//! View-state controller.
//!
//! Owns the current screen, the search text, the result slots and the
//! favorites store. User intents are handled synchronously; network work is
//! spawned and its outcome comes back as a [`Completion`] that the owner
//! feeds to [`Controller::apply`]. Every state change therefore happens on
//! the task that owns the controller.

use crate::debounce::Debouncer;
use crate::error::ClientError;
use crate::favorites::FavoritesStore;
use crate::models::{MovieDetail, MovieSummary};
use crate::tmdb::TmdbApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Typed text shorter than this never triggers an automatic search.
const MIN_AUTO_SEARCH_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Search,
    Favorites,
    Details,
}

/// Views reachable through the tab buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Search,
    Favorites,
}

impl From<Tab> for ViewMode {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Search => ViewMode::Search,
            Tab::Favorites => ViewMode::Favorites,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Intent {
    /// Search text submitted explicitly.
    SubmitSearch(String),
    /// Search box content changed; searches once the text settles.
    InputChanged(String),
    ClearSearch,
    Select(MovieSummary),
    Back,
    ShowTab(Tab),
    ToggleFavorite(MovieSummary),
}

#[derive(Debug)]
pub enum Completion {
    Search {
        query: String,
        result: Result<Vec<MovieSummary>, ClientError>,
    },
    Details {
        request: u64,
        result: Result<MovieDetail, ClientError>,
    },
    Settled {
        input: u64,
        text: String,
    },
}

/// Data shown by a view, with its loading flag and user-facing error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Controller {
    api: Arc<dyn TmdbApi>,
    favorites: FavoritesStore,
    view: ViewMode,
    query: String,
    return_to: ViewMode,
    movies: Slot<Vec<MovieSummary>>,
    details: Slot<Option<MovieDetail>>,
    searches_in_flight: usize,
    detail_request: u64,
    detail_task: Option<AbortHandle>,
    input_generation: u64,
    debouncer: Debouncer,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Controller {
    pub fn new(api: Arc<dyn TmdbApi>, favorites: FavoritesStore, quiescence: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            favorites,
            view: ViewMode::Search,
            query: String::new(),
            return_to: ViewMode::Search,
            movies: Slot::default(),
            details: Slot::default(),
            searches_in_flight: 0,
            detail_request: 0,
            detail_task: None,
            input_generation: 0,
            debouncer: Debouncer::new(quiescence),
            tx,
            rx,
        }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// View that "back" returns to from the details screen.
    pub fn return_view(&self) -> ViewMode {
        self.return_to
    }

    pub fn movies(&self) -> &Slot<Vec<MovieSummary>> {
        &self.movies
    }

    pub fn details(&self) -> &Slot<Option<MovieDetail>> {
        &self.details
    }

    pub fn favorites(&self) -> &[MovieSummary] {
        self.favorites.favorites()
    }

    pub fn favorites_count(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.favorites.is_favorite(id)
    }

    /// Handles one user intent. Must run inside a tokio runtime.
    pub fn dispatch(&mut self, intent: Intent) {
        debug!(?intent, view = ?self.view, "dispatch");
        match intent {
            Intent::SubmitSearch(text) => {
                self.debouncer.cancel();
                self.submit_search(text);
            }
            Intent::InputChanged(text) => self.input_changed(text),
            Intent::ClearSearch => {
                self.debouncer.cancel();
                self.submit_search(String::new());
            }
            Intent::Select(movie) => self.select(movie.id),
            Intent::Back => self.back(),
            Intent::ShowTab(tab) => self.show_tab(tab),
            Intent::ToggleFavorite(movie) => self.toggle_favorite(movie),
        }
    }

    /// Waits for the next finished background job.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Waits for one background job and applies it.
    pub async fn settle_one(&mut self) {
        if let Some(completion) = self.next_completion().await {
            self.apply(completion);
        }
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Search { query, result } => {
                self.searches_in_flight = self.searches_in_flight.saturating_sub(1);
                self.movies.loading = self.searches_in_flight > 0;
                match result {
                    Ok(movies) => {
                        info!("Search '{}' returned {} movies", query, movies.len());
                        self.movies.data = movies;
                        self.movies.error = None;
                    }
                    Err(e) => {
                        warn!("Search '{}' failed: {}", query, e);
                        self.movies.data.clear();
                        self.movies.error = Some(e.user_message().to_string());
                    }
                }
            }
            Completion::Details { request, result } => {
                if request != self.detail_request {
                    debug!(request, current = self.detail_request, "dropping superseded details");
                    return;
                }
                self.detail_task = None;
                self.details.loading = false;
                match result {
                    Ok(detail) => {
                        info!("Loaded details for '{}'", detail.title);
                        self.details.data = Some(detail);
                        self.details.error = None;
                    }
                    Err(e) => {
                        warn!("Details request {} failed: {}", request, e);
                        self.details.data = None;
                        self.details.error = Some(e.user_message().to_string());
                    }
                }
            }
            Completion::Settled { input, text } => {
                if input == self.input_generation {
                    self.submit_search(text);
                } else {
                    debug!(input, "ignoring settled input superseded by newer typing");
                }
            }
        }
    }

    fn submit_search(&mut self, text: String) {
        self.query = text;
        if self.query.trim().is_empty() {
            self.movies.data.clear();
            self.movies.error = None;
        } else {
            self.searches_in_flight += 1;
            self.movies.loading = true;
            self.movies.error = None;
            let api = self.api.clone();
            let tx = self.tx.clone();
            let query = self.query.clone();
            tokio::spawn(async move {
                let result = api.search_movies(&query).await;
                let _ = tx.send(Completion::Search { query, result });
            });
            if self.view == ViewMode::Details {
                self.discard_details();
            }
            self.view = ViewMode::Search;
        }
    }

    fn input_changed(&mut self, text: String) {
        self.input_generation += 1;
        self.debouncer.cancel();
        if text.is_empty() {
            self.submit_search(text);
            return;
        }
        if text.chars().count() < MIN_AUTO_SEARCH_CHARS {
            return;
        }
        let input = self.input_generation;
        let tx = self.tx.clone();
        self.debouncer.schedule(async move {
            let _ = tx.send(Completion::Settled { input, text });
        });
    }

    fn select(&mut self, id: i64) {
        if self.view != ViewMode::Details {
            self.return_to = self.view;
        }
        self.view = ViewMode::Details;
        self.abort_details();
        self.details = Slot {
            data: None,
            loading: true,
            error: None,
        };

        let request = self.detail_request;
        let api = self.api.clone();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let result = api.fetch_details(id).await;
            let _ = tx.send(Completion::Details { request, result });
        });
        self.detail_task = Some(handle.abort_handle());
    }

    fn back(&mut self) {
        if self.view != ViewMode::Details {
            return;
        }
        self.discard_details();
        self.view = self.return_to;
    }

    fn show_tab(&mut self, tab: Tab) {
        if self.view == ViewMode::Details {
            self.discard_details();
        }
        self.view = tab.into();
    }

    fn toggle_favorite(&mut self, movie: MovieSummary) {
        let title = movie.title.clone();
        match self.favorites.toggle(movie) {
            Ok(true) => info!("Added '{}' to favorites", title),
            Ok(false) => info!("Removed '{}' from favorites", title),
            Err(e) => warn!("Favorites for '{}' not persisted: {}", title, e),
        }
    }

    /// Cancels any outstanding detail fetch and invalidates its result.
    fn abort_details(&mut self) {
        if let Some(task) = self.detail_task.take() {
            task.abort();
        }
        self.detail_request += 1;
    }

    fn discard_details(&mut self) {
        self.abort_details();
        self.details = Slot::default();
    }
}

use cinefav::controller::{Controller, Intent, Tab, ViewMode};
use cinefav::error::{ClientError, DETAILS_FAILED_MESSAGE, SEARCH_FAILED_MESSAGE};
use cinefav::favorites::{FavoritesStore, FAVORITES_KEY};
use cinefav::models::{MovieDetail, MovieSummary};
use cinefav::storage::MemorySlot;
use cinefav::tmdb::TmdbApi;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const QUIESCENCE: Duration = Duration::from_millis(500);

type Delayed<T> = (Duration, Result<T, ClientError>);

#[derive(Default)]
struct FakeTmdb {
    searches: HashMap<String, Delayed<Vec<MovieSummary>>>,
    details: HashMap<i64, Delayed<MovieDetail>>,
    search_calls: Mutex<Vec<String>>,
    detail_calls: Mutex<Vec<i64>>,
}

impl FakeTmdb {
    fn search(mut self, query: &str, delay_ms: u64, result: Result<Vec<MovieSummary>, ClientError>) -> Self {
        self.searches
            .insert(query.to_string(), (Duration::from_millis(delay_ms), result));
        self
    }

    fn detail(mut self, id: i64, delay_ms: u64, result: Result<MovieDetail, ClientError>) -> Self {
        self.details
            .insert(id, (Duration::from_millis(delay_ms), result));
        self
    }

    fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    fn detail_calls(&self) -> Vec<i64> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ClientError> {
        self.search_calls.lock().unwrap().push(query.to_string());
        let (delay, result) = self
            .searches
            .get(query)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(Vec::new())));
        tokio::time::sleep(delay).await;
        result
    }

    async fn fetch_details(&self, id: i64) -> Result<MovieDetail, ClientError> {
        self.detail_calls.lock().unwrap().push(id);
        let (delay, result) = self
            .details
            .get(&id)
            .cloned()
            .unwrap_or_else(|| (Duration::ZERO, Err(ClientError::DetailsFailed("404".into()))));
        tokio::time::sleep(delay).await;
        result
    }
}

fn dune_results() -> Vec<MovieSummary> {
    let mut first = MovieSummary::new(438631, "Dune");
    first.release_date = "2021-09-15".to_string();
    first.vote_average = 7.8;
    let mut second = MovieSummary::new(841, "Dune");
    second.release_date = "1984-12-14".to_string();
    vec![first, second]
}

fn detail(id: i64, title: &str) -> MovieDetail {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "runtime": 155,
        "genres": [{"id": 878, "name": "Science Fiction"}],
        "production_companies": [{"id": 923, "name": "Legendary Pictures", "logo_path": null}],
        "budget": 165000000,
        "revenue": 402027830,
        "status": "Released",
        "tagline": "Beyond fear, destiny awaits."
    }))
    .expect("valid detail fixture")
}

fn controller_with(fake: FakeTmdb) -> (Controller, Arc<FakeTmdb>, MemorySlot) {
    let slot = MemorySlot::new();
    let store = FavoritesStore::load(Box::new(slot.clone()));
    let fake = Arc::new(fake);
    let controller = Controller::new(fake.clone(), store, QUIESCENCE);
    (controller, fake, slot)
}

async fn assert_quiet(controller: &mut Controller) {
    let next = tokio::time::timeout(Duration::from_secs(5), controller.next_completion()).await;
    assert!(next.is_err(), "unexpected completion: {next:?}");
}

#[tokio::test(start_paused = true)]
async fn empty_search_skips_network_and_dune_search_fills_list() {
    let (mut c, fake, _) = controller_with(FakeTmdb::default().search("dune", 20, Ok(dune_results())));

    c.dispatch(Intent::SubmitSearch(String::new()));
    assert!(c.movies().data.is_empty());
    assert!(fake.search_calls().is_empty());

    c.dispatch(Intent::SubmitSearch("dune".to_string()));
    assert!(c.movies().loading);
    c.settle_one().await;

    assert_eq!(c.movies().data, dune_results());
    assert!(!c.movies().loading);
    assert_eq!(c.movies().error, None);
    assert_eq!(c.view(), ViewMode::Search);
    assert_eq!(c.query(), "dune");
    assert_eq!(fake.search_calls(), vec!["dune".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn search_from_favorites_moves_to_search() {
    let (mut c, _, _) = controller_with(FakeTmdb::default().search("dune", 0, Ok(dune_results())));
    c.dispatch(Intent::ShowTab(Tab::Favorites));

    c.dispatch(Intent::SubmitSearch(String::new()));
    assert_eq!(c.view(), ViewMode::Favorites);

    c.dispatch(Intent::SubmitSearch("dune".to_string()));
    assert_eq!(c.view(), ViewMode::Search);
}

#[tokio::test(start_paused = true)]
async fn failed_search_attaches_message_and_keeps_view() {
    let (mut c, _, _) = controller_with(
        FakeTmdb::default()
            .search("dune", 0, Ok(dune_results()))
            .search("zzz", 0, Err(ClientError::SearchFailed("HTTP 500".into()))),
    );
    c.dispatch(Intent::SubmitSearch("dune".to_string()));
    c.settle_one().await;

    c.dispatch(Intent::SubmitSearch("zzz".to_string()));
    c.settle_one().await;

    assert_eq!(c.view(), ViewMode::Search);
    assert!(c.movies().data.is_empty());
    assert_eq!(c.movies().error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
    assert!(!c.movies().loading);
}

#[tokio::test(start_paused = true)]
async fn clearing_search_empties_results_without_a_call() {
    let (mut c, fake, _) = controller_with(FakeTmdb::default().search("dune", 0, Ok(dune_results())));
    c.dispatch(Intent::SubmitSearch("dune".to_string()));
    c.settle_one().await;

    c.dispatch(Intent::ClearSearch);
    assert!(c.movies().data.is_empty());
    assert_eq!(c.query(), "");
    assert_eq!(c.view(), ViewMode::Search);
    assert_eq!(fake.search_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn later_search_completion_wins() {
    let aliens = vec![MovieSummary::new(679, "Aliens")];
    let alien = vec![MovieSummary::new(348, "Alien")];
    let (mut c, _, _) = controller_with(
        FakeTmdb::default()
            .search("alien", 200, Ok(alien.clone()))
            .search("aliens", 10, Ok(aliens.clone())),
    );

    c.dispatch(Intent::SubmitSearch("alien".to_string()));
    c.dispatch(Intent::SubmitSearch("aliens".to_string()));

    c.settle_one().await;
    assert_eq!(c.movies().data, aliens);
    assert!(c.movies().loading);

    c.settle_one().await;
    assert_eq!(c.movies().data, alien);
    assert!(!c.movies().loading);
}

#[tokio::test(start_paused = true)]
async fn failed_details_still_shows_details_view() {
    let (mut c, fake, _) = controller_with(
        FakeTmdb::default().detail(42, 5, Err(ClientError::DetailsFailed("HTTP 404".into()))),
    );
    c.dispatch(Intent::Select(MovieSummary::new(42, "Dune")));
    assert_eq!(c.view(), ViewMode::Details);
    assert!(c.details().loading);

    c.settle_one().await;
    assert_eq!(c.view(), ViewMode::Details);
    assert_eq!(c.details().error.as_deref(), Some(DETAILS_FAILED_MESSAGE));
    assert!(c.details().data.is_none());
    assert!(!c.details().loading);
    assert_eq!(fake.detail_calls(), vec![42]);
}

#[tokio::test(start_paused = true)]
async fn details_load_and_back_returns_to_search() {
    let (mut c, _, _) = controller_with(
        FakeTmdb::default()
            .search("dune", 0, Ok(dune_results()))
            .detail(438631, 5, Ok(detail(438631, "Dune"))),
    );
    c.dispatch(Intent::SubmitSearch("dune".to_string()));
    c.settle_one().await;

    let first = c.movies().data[0].clone();
    c.dispatch(Intent::Select(first));
    c.settle_one().await;
    assert_eq!(c.details().data.as_ref().map(|d| d.id), Some(438631));

    c.dispatch(Intent::Back);
    assert_eq!(c.view(), ViewMode::Search);
    assert!(c.details().data.is_none());
    assert_eq!(c.movies().data.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn search_from_details_moves_to_search() {
    let alien = vec![MovieSummary::new(348, "Alien")];
    let (mut c, _, _) = controller_with(
        FakeTmdb::default()
            .detail(42, 5, Ok(detail(42, "Dune")))
            .search("alien", 5, Ok(alien.clone())),
    );
    c.dispatch(Intent::Select(MovieSummary::new(42, "Dune")));
    c.settle_one().await;
    assert_eq!(c.details().data.as_ref().map(|d| d.id), Some(42));

    c.dispatch(Intent::SubmitSearch("alien".to_string()));
    assert_eq!(c.view(), ViewMode::Search);
    assert!(c.details().data.is_none());

    c.settle_one().await;
    assert_eq!(c.view(), ViewMode::Search);
    assert_eq!(c.movies().data, alien);
    assert_quiet(&mut c).await;
}

#[tokio::test(start_paused = true)]
async fn blank_search_from_details_stays_on_details() {
    let (mut c, _, _) = controller_with(FakeTmdb::default().detail(42, 5, Ok(detail(42, "Dune"))));
    c.dispatch(Intent::Select(MovieSummary::new(42, "Dune")));
    c.settle_one().await;

    c.dispatch(Intent::ClearSearch);
    assert_eq!(c.view(), ViewMode::Details);
    assert!(c.details().data.is_some());
}

#[tokio::test(start_paused = true)]
async fn back_from_details_opened_in_favorites_returns_to_favorites() {
    let (mut c, _, _) = controller_with(FakeTmdb::default().detail(42, 5, Ok(detail(42, "Dune"))));
    c.dispatch(Intent::ToggleFavorite(MovieSummary::new(42, "Dune")));
    c.dispatch(Intent::ShowTab(Tab::Favorites));

    let favorite = c.favorites()[0].clone();
    c.dispatch(Intent::Select(favorite));
    assert_eq!(c.return_view(), ViewMode::Favorites);
    c.settle_one().await;

    c.dispatch(Intent::Back);
    assert_eq!(c.view(), ViewMode::Favorites);
    assert!(c.details().data.is_none());
}

#[tokio::test(start_paused = true)]
async fn tab_switch_discards_pending_details() {
    let (mut c, _, _) = controller_with(FakeTmdb::default().detail(42, 100, Ok(detail(42, "Dune"))));
    c.dispatch(Intent::Select(MovieSummary::new(42, "Dune")));
    c.dispatch(Intent::ShowTab(Tab::Search));

    assert_eq!(c.view(), ViewMode::Search);
    assert!(!c.details().loading);
    assert_quiet(&mut c).await;
    assert!(c.details().data.is_none());
}

#[tokio::test(start_paused = true)]
async fn newer_selection_supersedes_slow_details() {
    let (mut c, _, _) = controller_with(
        FakeTmdb::default()
            .detail(1, 300, Ok(detail(1, "Slow")))
            .detail(2, 10, Ok(detail(2, "Fast"))),
    );
    c.dispatch(Intent::Select(MovieSummary::new(1, "Slow")));
    c.dispatch(Intent::Select(MovieSummary::new(2, "Fast")));

    c.settle_one().await;
    assert_eq!(c.details().data.as_ref().map(|d| d.title.as_str()), Some("Fast"));
    assert_quiet(&mut c).await;
    assert_eq!(c.details().data.as_ref().map(|d| d.title.as_str()), Some("Fast"));
}

#[tokio::test(start_paused = true)]
async fn typing_searches_once_after_quiescence() {
    let (mut c, fake, _) = controller_with(FakeTmdb::default().search("dune", 0, Ok(dune_results())));

    for text in ["d", "du", "dun", "dune"] {
        c.dispatch(Intent::InputChanged(text.to_string()));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(fake.search_calls().is_empty());

    // settled input, then the search it started
    c.settle_one().await;
    c.settle_one().await;
    assert_eq!(fake.search_calls(), vec!["dune".to_string()]);
    assert_eq!(c.movies().data, dune_results());
    assert_quiet(&mut c).await;
}

#[tokio::test(start_paused = true)]
async fn short_or_cleared_input_never_auto_searches() {
    let (mut c, fake, _) = controller_with(FakeTmdb::default());
    c.dispatch(Intent::InputChanged("du".to_string()));
    assert_quiet(&mut c).await;

    c.dispatch(Intent::InputChanged("dun".to_string()));
    c.dispatch(Intent::InputChanged(String::new()));
    assert_quiet(&mut c).await;
    assert!(fake.search_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn explicit_submit_cancels_pending_auto_search() {
    let (mut c, fake, _) = controller_with(FakeTmdb::default().search("dune", 0, Ok(dune_results())));
    c.dispatch(Intent::InputChanged("dune".to_string()));
    c.dispatch(Intent::SubmitSearch("dune".to_string()));

    c.settle_one().await;
    assert_quiet(&mut c).await;
    assert_eq!(fake.search_calls().len(), 1);
}

#[tokio::test]
async fn one_click_toggles_once() {
    let (mut c, _, slot) = controller_with(FakeTmdb::default());
    let dune = MovieSummary::new(42, "Dune");

    c.dispatch(Intent::ToggleFavorite(dune.clone()));
    assert_eq!(slot.writes(), 1);
    assert!(c.is_favorite(42));
    assert_eq!(c.favorites_count(), 1);

    c.dispatch(Intent::ToggleFavorite(dune));
    assert_eq!(slot.writes(), 2);
    assert!(!c.is_favorite(42));

    let stored: Vec<MovieSummary> =
        serde_json::from_str(&slot.get(FAVORITES_KEY).unwrap()).unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn favorites_survive_restart() {
    let slot = MemorySlot::new();
    {
        let store = FavoritesStore::load(Box::new(slot.clone()));
        let mut c = Controller::new(Arc::new(FakeTmdb::default()), store, QUIESCENCE);
        c.dispatch(Intent::ToggleFavorite(MovieSummary::new(3, "Brazil")));
        c.dispatch(Intent::ToggleFavorite(MovieSummary::new(1, "Alien")));
    }
    let store = FavoritesStore::load(Box::new(slot));
    let c = Controller::new(Arc::new(FakeTmdb::default()), store, QUIESCENCE);
    let ids: Vec<i64> = c.favorites().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(c.view(), ViewMode::Search);
}

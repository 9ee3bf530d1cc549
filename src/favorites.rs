//! Bookmarked movies, mirrored to a [`KeyValueSlot`].
//!
//! The in-memory list is the source of truth. The slot is read once by
//! [`FavoritesStore::load`] and rewritten in full after every mutation.

use crate::error::StorageError;
use crate::models::MovieSummary;
use crate::storage::KeyValueSlot;
use tracing::{debug, info, warn};

pub const FAVORITES_KEY: &str = "movie-favorites";

pub struct FavoritesStore {
    slot: Box<dyn KeyValueSlot>,
    favorites: Vec<MovieSummary>,
}

impl FavoritesStore {
    /// Reads the slot once. Missing, empty, unreadable or malformed content
    /// yields an empty store; the problem is logged and not returned.
    pub fn load(slot: Box<dyn KeyValueSlot>) -> Self {
        let favorites = match slot.read(FAVORITES_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => match parse_favorites(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("Ignoring stored favorites: {}", e);
                    Vec::new()
                }
            },
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Could not read stored favorites: {}", e);
                Vec::new()
            }
        };
        info!("Loaded {} favorites", favorites.len());
        Self { slot, favorites }
    }

    pub fn favorites(&self) -> &[MovieSummary] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.favorites.iter().any(|m| m.id == id)
    }

    /// Appends `movie` unless its id is already present. The list is written
    /// back either way.
    pub fn add(&mut self, movie: MovieSummary) -> Result<(), StorageError> {
        if self.is_favorite(movie.id) {
            debug!(movie_id = movie.id, "already a favorite");
        } else {
            debug!(movie_id = movie.id, "adding favorite");
            self.favorites.push(movie);
        }
        self.save()
    }

    pub fn remove(&mut self, id: i64) -> Result<(), StorageError> {
        debug!(movie_id = id, "removing favorite");
        self.favorites.retain(|m| m.id != id);
        self.save()
    }

    /// Flips membership of `movie` and returns whether it is now a favorite.
    pub fn toggle(&mut self, movie: MovieSummary) -> Result<bool, StorageError> {
        if self.is_favorite(movie.id) {
            self.remove(movie.id)?;
            Ok(false)
        } else {
            self.add(movie)?;
            Ok(true)
        }
    }

    /// Serializes the full list into the slot.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.favorites)?;
        self.slot.write(FAVORITES_KEY, &json)
    }
}

/// Parses stored favorites, keeping the first record for any repeated id.
fn parse_favorites(raw: &str) -> Result<Vec<MovieSummary>, StorageError> {
    let list: Vec<MovieSummary> = serde_json::from_str(raw)
        .map_err(|e| StorageError::PersistenceParseFailed(e.to_string()))?;
    let mut unique: Vec<MovieSummary> = Vec::with_capacity(list.len());
    for movie in list {
        if !unique.iter().any(|m| m.id == movie.id) {
            unique.push(movie);
        }
    }
    Ok(unique)
}

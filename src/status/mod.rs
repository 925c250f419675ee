//! Per-item reader status: favorite, read and new.
//!
//! Favorites and read ids are persisted through a [`KeyValueStore`]; the new
//! set is recomputed on every visit from the previous last-visit marker. A
//! visit is an explicit value ([`Visit`]) so the marker can only be written
//! once every feed of that visit has been absorbed.

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashSet;

use crate::feed::FeedItem;
use crate::store::{load_json, save_json, KeyValueStore, StateKey, StoreError};

/// Insertion-ordered set of item ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Returns `true` if the id was not present.
    pub fn insert(&mut self, id: &str) -> bool {
        if !self.members.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

impl FromIterator<String> for IdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = IdSet::new();
        for id in iter {
            set.insert(&id);
        }
        set
    }
}

/// Favorite, read and new ids, bound to the store they persist to.
pub struct StatusBook<S> {
    store: S,
    favorites: IdSet,
    read: IdSet,
    new: IdSet,
}

impl<S: KeyValueStore> StatusBook<S> {
    /// Load favorites and read ids. Missing or undecodable values start empty.
    pub async fn load(store: S) -> Result<Self, StoreError> {
        let favorites: Vec<String> = load_json(&store, StateKey::Favorites)
            .await?
            .unwrap_or_default();
        let read: Vec<String> = load_json(&store, StateKey::ReadItems)
            .await?
            .unwrap_or_default();

        Ok(Self {
            store,
            favorites: favorites.into_iter().collect(),
            read: read.into_iter().collect(),
            new: IdSet::new(),
        })
    }

    /// Start a visit: load the persisted status and the previous marker.
    pub async fn begin_visit(store: S) -> Result<Visit<S>, StoreError> {
        let previous_marker = load_marker(&store).await?;
        let book = Self::load(store).await?;
        tracing::debug!(
            favorites = book.favorites.len(),
            read = book.read.len(),
            previous = ?previous_marker,
            "Visit started"
        );
        Ok(Visit {
            book,
            previous_marker,
        })
    }

    /// Flip favorite membership and persist the list.
    ///
    /// Returns the new membership. The in-memory state is updated even when
    /// the write fails.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<bool, StoreError> {
        let now_favorite = if self.favorites.remove(id) {
            false
        } else {
            self.favorites.insert(id);
            true
        };
        save_json(&self.store, StateKey::Favorites, self.favorites.as_slice()).await?;
        Ok(now_favorite)
    }

    /// Record `id` as read. Only writes when the id is newly added.
    pub async fn mark_read(&mut self, id: &str) -> Result<bool, StoreError> {
        if !self.read.insert(id) {
            return Ok(false);
        }
        save_json(&self.store, StateKey::ReadItems, self.read.as_slice()).await?;
        Ok(true)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn is_new(&self, id: &str) -> bool {
        self.new.contains(id)
    }

    pub fn favorites(&self) -> &IdSet {
        &self.favorites
    }

    pub fn read(&self) -> &IdSet {
        &self.read
    }

    pub fn new_items(&self) -> &IdSet {
        &self.new
    }

    /// Adopt the new set computed by a visit that ran on another book.
    pub fn replace_new(&mut self, new: IdSet) {
        self.new = new;
    }
}

async fn load_marker<S: KeyValueStore>(
    store: &S,
) -> Result<Option<DateTime<FixedOffset>>, StoreError> {
    let raw: Option<String> = load_json(store, StateKey::LastVisit).await?;
    Ok(raw.and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
        Ok(marker) => Some(marker),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "Ignoring unparseable last-visit marker");
            None
        }
    }))
}

/// An open visit: status loaded, previous marker pinned, marker not yet
/// rewritten.
pub struct Visit<S> {
    book: StatusBook<S>,
    previous_marker: Option<DateTime<FixedOffset>>,
}

impl<S: KeyValueStore> Visit<S> {
    pub fn previous_marker(&self) -> Option<DateTime<FixedOffset>> {
        self.previous_marker
    }

    /// Union into the new set every item published strictly after the
    /// previous marker. Without a marker, every dated item is new.
    /// Returns how many ids were added.
    pub fn absorb(&mut self, items: &[FeedItem]) -> usize {
        let mut added = 0;
        for item in items {
            let Some(published) = item.published_at() else {
                continue;
            };
            let is_new = match self.previous_marker {
                Some(marker) => published > marker,
                None => true,
            };
            if is_new && self.book.new.insert(&item.id) {
                added += 1;
            }
        }
        added
    }

    /// Read access to the status being built.
    pub fn book(&self) -> &StatusBook<S> {
        &self.book
    }

    /// Persist `now` as the last-visit marker and hand back the status.
    ///
    /// A failed write is logged; the returned book is still complete.
    pub async fn commit(self, now: DateTime<Utc>) -> StatusBook<S> {
        let marker = now.to_rfc3339();
        if let Err(e) = save_json(&self.book.store, StateKey::LastVisit, &marker).await {
            tracing::warn!(error = %e, "Failed to persist last-visit marker");
        }
        tracing::debug!(new = self.book.new.len(), marker = %marker, "Visit committed");
        self.book
    }
}

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::model::*;
use crate::seed::seed_titles;
use crate::storage::{Conflict, Storage};
use chrono::Utc;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const USERS: &str = "users";
pub const TITLES: &str = "movies";
pub const REVIEWS: &str = "reviews";
pub const FAVORITES: &str = "favorites";
pub const WATCH_LATER: &str = "watchlater";
pub const CURRENT_USER: &str = "current_user";

/// A record kept as one element of a JSON array stored under `KEY`.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;

    fn id(&self) -> &str;

    /// Contents installed when the collection has never been written.
    fn seed(_now: Timestamp) -> Option<Vec<Self>> {
        None
    }

    /// Called on every update; refreshes the update timestamp if the record has one.
    fn touch(&mut self, _now: Timestamp) {}
}

/// Caller-supplied fields of a record that is about to be inserted.
pub trait Draft: Clone {
    type Record: Record;

    fn into_record(self, id: String, now: Timestamp) -> Self::Record;
}

pub trait Patch<R> {
    fn apply(&self, record: &mut R);
}

impl Record for User {
    const KEY: &'static str = USERS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Title {
    const KEY: &'static str = TITLES;

    fn id(&self) -> &str {
        &self.id
    }

    fn seed(now: Timestamp) -> Option<Vec<Self>> {
        Some(seed_titles(now))
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

impl Record for Review {
    const KEY: &'static str = REVIEWS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Favorite {
    const KEY: &'static str = FAVORITES;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for WatchLater {
    const KEY: &'static str = WATCH_LATER;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Draft for NewUser {
    type Record = User;

    fn into_record(self, id: String, now: Timestamp) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            is_admin: self.is_admin,
            created_at: now,
            password_hash: self.password_hash,
        }
    }
}

impl Draft for NewTitle {
    type Record = Title;

    fn into_record(self, id: String, now: Timestamp) -> Title {
        Title {
            id,
            title: self.title,
            description: self.description,
            kind: self.kind,
            genres: self.genres,
            release_year: self.release_year,
            duration: self.duration,
            image_url: self.image_url,
            video_url: self.video_url,
            rating: 0.0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Draft for NewReview {
    type Record = Review;

    fn into_record(self, id: String, now: Timestamp) -> Review {
        Review {
            id,
            title_id: self.title_id,
            user_id: self.user_id,
            user_name: self.user_name,
            rating: self.rating,
            comment: self.comment,
            created_at: now,
        }
    }
}

impl Patch<Title> for TitleUpdate {
    fn apply(&self, title: &mut Title) {
        if let Some(value) = &self.title {
            title.title = value.clone();
        }
        if let Some(value) = &self.description {
            title.description = value.clone();
        }
        if let Some(value) = self.kind {
            title.kind = value;
        }
        if let Some(value) = &self.genres {
            title.genres = value.clone();
        }
        if let Some(value) = self.release_year {
            title.release_year = value;
        }
        if let Some(value) = self.duration {
            title.duration = value;
        }
        if let Some(value) = &self.image_url {
            title.image_url = value.clone();
        }
        if let Some(value) = &self.video_url {
            title.video_url = value.clone();
        }
        if let Some(value) = self.rating {
            title.rating = value;
        }
        if let Some(value) = self.rating_count {
            title.rating_count = value;
        }
    }
}

fn decode<R: Record>(bytes: &[u8]) -> Vec<R> {
    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        warn!("Malformed {} collection, treating as empty: {}", R::KEY, err);
        Vec::new()
    })
}

/// Named collections of JSON records on top of a key/value [`Storage`].
///
/// Reads decode the whole collection. Writes are a read-modify-write of one
/// key, committed with compare-and-swap and retried when another writer got
/// there first.
pub struct RecordStore<S> {
    storage: S,
    config: Config,
}

impl<S: Storage> RecordStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, Config::default())
    }

    pub fn with_config(storage: S, config: Config) -> Self {
        RecordStore { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn flush(&self) -> Result<()> {
        self.storage.flush().map_err(StoreError::storage)
    }

    pub(crate) fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage.get(key).map_err(StoreError::storage)
    }

    pub(crate) fn put_raw(&self, key: &str, value: Option<Vec<u8>>) -> Result<()> {
        self.storage.put(key, value).map_err(StoreError::storage)
    }

    /// Loads a collection. A collection that was never written yields its
    /// seed (persisted before returning) or nothing; malformed data yields
    /// nothing.
    pub fn load<R: Record>(&self) -> Result<Vec<R>> {
        loop {
            if let Some(bytes) = self.get_raw(R::KEY)? {
                return Ok(decode(&bytes));
            }
            let seed = match R::seed(Utc::now()) {
                Some(seed) => seed,
                None => return Ok(Vec::new()),
            };
            let encoded = serde_json::to_vec(&seed)?;
            match self
                .storage
                .compare_and_swap(R::KEY, None, Some(encoded))
                .map_err(StoreError::storage)?
            {
                Ok(()) => {
                    info!("Seeded {} with {} records", R::KEY, seed.len());
                    return Ok(seed);
                }
                Err(Conflict) => debug!("{} was written concurrently, reloading", R::KEY),
            }
        }
    }

    pub fn save<R: Record>(&self, records: &[R]) -> Result<()> {
        debug!("Saving {} records to {}", records.len(), R::KEY);
        self.put_raw(R::KEY, Some(serde_json::to_vec(records)?))
    }

    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        Ok(self.load::<R>()?.into_iter().find(|r| r.id() == id))
    }

    pub fn insert<D: Draft>(&self, draft: D) -> Result<D::Record> {
        let now = Utc::now();
        self.modify(|records: &mut Vec<D::Record>| {
            let id = self.next_id(records)?;
            let record = draft.clone().into_record(id, now);
            records.push(record.clone());
            Ok(record)
        })
    }

    /// Returns `None` when no record has this id.
    pub fn update<R, P>(&self, id: &str, patch: &P) -> Result<Option<R>>
    where
        R: Record,
        P: Patch<R>,
    {
        let now = Utc::now();
        self.modify(|records: &mut Vec<R>| {
            Ok(records.iter_mut().find(|r| r.id() == id).map(|record| {
                patch.apply(record);
                record.touch(now);
                record.clone()
            }))
        })
    }

    pub fn remove<R: Record>(&self, id: &str) -> Result<bool> {
        self.modify(|records: &mut Vec<R>| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            Ok(records.len() != before)
        })
    }

    /// Applies `f` to the decoded collection and commits the result. An
    /// error from `f` aborts without writing; an unchanged collection is not
    /// rewritten.
    pub(crate) fn modify<R, T, F>(&self, mut f: F) -> Result<T>
    where
        R: Record,
        F: FnMut(&mut Vec<R>) -> Result<T>,
    {
        loop {
            let raw = self.get_raw(R::KEY)?;
            let (mut records, baseline) = match &raw {
                Some(bytes) => {
                    let records: Vec<R> = decode(bytes);
                    let baseline = serde_json::to_vec(&records)?;
                    (records, Some(baseline))
                }
                None => (R::seed(Utc::now()).unwrap_or_default(), None),
            };
            let out = f(&mut records)?;
            let encoded = serde_json::to_vec(&records)?;
            // compared against what was decoded, so unreadable bytes survive a no-op
            if baseline.as_deref() == Some(encoded.as_slice()) {
                return Ok(out);
            }
            match self
                .storage
                .compare_and_swap(R::KEY, raw.as_deref(), Some(encoded))
                .map_err(StoreError::storage)?
            {
                Ok(()) => {
                    debug!("Wrote {} records to {}", records.len(), R::KEY);
                    return Ok(out);
                }
                Err(Conflict) => debug!("{} was written concurrently, retrying", R::KEY),
            }
        }
    }

    /// A backend id not already used by a record of the collection.
    pub(crate) fn next_id<R: Record>(&self, records: &[R]) -> Result<String> {
        loop {
            let id = self
                .storage
                .generate_id()
                .map_err(StoreError::storage)?
                .to_string();
            if !records.iter().any(|r| r.id() == id) {
                return Ok(id);
            }
        }
    }
}

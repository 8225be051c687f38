use crate::database::{Record, RecordStore};
use crate::error::{Result, StoreError};
use crate::model::*;
use crate::query::{self, BrowseFilter};
use crate::storage::Storage;
use chrono::Utc;
use log::{debug, warn};

/// A join record between a user and a title. At most one exists per pair.
pub trait Membership: Record {
    fn create(id: String, title_id: &str, user_id: &str, now: Timestamp) -> Self;
    fn title_id(&self) -> &str;
    fn user_id(&self) -> &str;

    fn is_pair(&self, title_id: &str, user_id: &str) -> bool {
        self.title_id() == title_id && self.user_id() == user_id
    }
}

impl Membership for Favorite {
    fn create(id: String, title_id: &str, user_id: &str, now: Timestamp) -> Self {
        Favorite {
            id,
            title_id: title_id.to_owned(),
            user_id: user_id.to_owned(),
            created_at: now,
        }
    }

    fn title_id(&self) -> &str {
        &self.title_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Membership for WatchLater {
    fn create(id: String, title_id: &str, user_id: &str, now: Timestamp) -> Self {
        WatchLater {
            id,
            title_id: title_id.to_owned(),
            user_id: user_id.to_owned(),
            created_at: now,
        }
    }

    fn title_id(&self) -> &str {
        &self.title_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(StoreError::MissingField(field))
    } else {
        Ok(())
    }
}

impl<S: Storage> RecordStore<S> {
    pub fn titles(&self) -> Result<Vec<Title>> {
        self.load()
    }

    pub fn title(&self, id: &str) -> Result<Option<Title>> {
        self.get(id)
    }

    /// Adds a title with no ratings yet.
    pub fn add_title(&self, title: NewTitle) -> Result<Title> {
        require(&title.title, "title")?;
        require(&title.description, "description")?;
        if title.genres.iter().all(|g| g.trim().is_empty()) {
            return Err(StoreError::MissingField("genre"));
        }
        let title = self.insert(title)?;
        debug!("Added title {} ({})", title.id, title.title);
        Ok(title)
    }

    pub fn update_title(&self, id: &str, update: &TitleUpdate) -> Result<Option<Title>> {
        self.update(id, update)
    }

    /// Reviews and join records pointing at the title are left in place.
    pub fn delete_title(&self, id: &str) -> Result<bool> {
        self.remove::<Title>(id)
    }

    pub fn trending(&self) -> Result<Vec<Title>> {
        Ok(query::trending(self.titles()?))
    }

    pub fn new_releases(&self) -> Result<Vec<Title>> {
        Ok(query::new_releases(self.titles()?, Utc::now()))
    }

    pub fn search(&self, query: &str) -> Result<Vec<Title>> {
        Ok(query::search(self.titles()?, query))
    }

    pub fn titles_of_kind(&self, kind: &str) -> Result<Vec<Title>> {
        Ok(query::of_kind(self.titles()?, kind))
    }

    pub fn titles_in_genre(&self, genre: &str) -> Result<Vec<Title>> {
        Ok(query::in_genre(self.titles()?, genre))
    }

    pub fn browse(&self, filter: &BrowseFilter) -> Result<Vec<Title>> {
        Ok(query::browse(self.titles()?, filter))
    }

    pub fn genres(&self) -> Result<Vec<String>> {
        Ok(query::genres(&self.titles()?))
    }

    /// All reviews, or only those of one title.
    pub fn reviews(&self, title_id: Option<&str>) -> Result<Vec<Review>> {
        let reviews: Vec<Review> = self.load()?;
        Ok(match title_id {
            Some(title_id) => reviews
                .into_iter()
                .filter(|r| r.title_id == title_id)
                .collect(),
            None => reviews,
        })
    }

    /// Stores the review and recomputes the reviewed title's rating.
    pub fn add_review(&self, review: NewReview) -> Result<Review> {
        if !(1..=5).contains(&review.rating) {
            return Err(StoreError::InvalidRating(review.rating));
        }
        require(&review.comment, "comment")?;
        let review = self.insert(review)?;
        self.refresh_rating(&review.title_id)?;
        Ok(review)
    }

    fn refresh_rating(&self, title_id: &str) -> Result<Option<Title>> {
        let ratings = self.reviews(Some(title_id))?.into_iter().map(|r| r.rating);
        let (rating, rating_count) = match query::aggregate_rating(ratings) {
            Some(aggregate) => aggregate,
            None => return Ok(None),
        };
        let update = TitleUpdate {
            rating: Some(rating),
            rating_count: Some(rating_count),
            ..TitleUpdate::default()
        };
        let updated = self.update_title(title_id, &update)?;
        if updated.is_none() {
            warn!("Review for unknown title {}", title_id);
        }
        Ok(updated)
    }

    /// Adds the pair unless it already exists, in which case the existing
    /// record is returned.
    pub fn add_membership<M: Membership>(&self, title_id: &str, user_id: &str) -> Result<M> {
        let now = Utc::now();
        self.modify(|records: &mut Vec<M>| {
            if let Some(existing) = records.iter().find(|m| m.is_pair(title_id, user_id)) {
                return Ok(existing.clone());
            }
            let record = M::create(self.next_id(records)?, title_id, user_id, now);
            records.push(record.clone());
            Ok(record)
        })
    }

    pub fn remove_membership<M: Membership>(&self, title_id: &str, user_id: &str) -> Result<bool> {
        self.modify(|records: &mut Vec<M>| {
            let before = records.len();
            records.retain(|m| !m.is_pair(title_id, user_id));
            Ok(records.len() != before)
        })
    }

    pub fn is_member<M: Membership>(&self, title_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .load::<M>()?
            .iter()
            .any(|m| m.is_pair(title_id, user_id)))
    }

    /// Adds the pair if absent, removes it if present, in one atomic write.
    /// Returns whether the pair is a member afterwards.
    pub fn toggle_membership<M: Membership>(&self, title_id: &str, user_id: &str) -> Result<bool> {
        let now = Utc::now();
        self.modify(|records: &mut Vec<M>| {
            let before = records.len();
            records.retain(|m| !m.is_pair(title_id, user_id));
            if records.len() != before {
                return Ok(false);
            }
            let id = self.next_id(records)?;
            records.push(M::create(id, title_id, user_id, now));
            Ok(true)
        })
    }

    pub fn memberships<M: Membership>(&self, user_id: &str) -> Result<Vec<M>> {
        Ok(self
            .load::<M>()?
            .into_iter()
            .filter(|m| m.user_id() == user_id)
            .collect())
    }

    /// The user's titles in catalog order. Join records whose title was
    /// deleted are skipped.
    pub fn member_titles<M: Membership>(&self, user_id: &str) -> Result<Vec<Title>> {
        let memberships = self.memberships::<M>(user_id)?;
        Ok(self
            .titles()?
            .into_iter()
            .filter(|t| memberships.iter().any(|m| m.title_id() == t.id))
            .collect())
    }

    /// The user's titles in the order they were added. Join records whose
    /// title was deleted are skipped.
    pub fn member_titles_by_added<M: Membership>(&self, user_id: &str) -> Result<Vec<Title>> {
        let titles = self.titles()?;
        Ok(self
            .memberships::<M>(user_id)?
            .iter()
            .filter_map(|m| titles.iter().find(|t| t.id == m.title_id()).cloned())
            .collect())
    }

    pub fn favorites(&self, user_id: &str) -> Result<Vec<Title>> {
        self.member_titles::<Favorite>(user_id)
    }

    /// Queue order: oldest entry first.
    pub fn watch_later(&self, user_id: &str) -> Result<Vec<Title>> {
        self.member_titles_by_added::<WatchLater>(user_id)
    }
}

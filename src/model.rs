use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Timestamp = DateTime<Utc>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: Timestamp,
    /// Empty for accounts imported from data that carried no hash, and
    /// always empty in the persisted session pointer.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password_hash: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleKind {
    Movie,
    Series,
}

impl TitleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TitleKind::Movie => "Movie",
            TitleKind::Series => "Series",
        }
    }

    /// Case-insensitive comparison against a free-form kind tag.
    pub fn matches(self, tag: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(tag.trim())
    }
}

impl fmt::Display for TitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown title kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for TitleKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [TitleKind::Movie, TitleKind::Series]
            .iter()
            .copied()
            .find(|kind| kind.matches(s))
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Stored kind tags are matched case-insensitively, so `"series"` reads as
/// [`TitleKind::Series`].
impl<'de> Deserialize<'de> for TitleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// A movie or series in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TitleKind,
    #[serde(rename = "genre")]
    pub genres: Vec<String>,
    pub release_year: u16,
    /// Minutes; for series this is the length of one episode.
    pub duration: u32,
    pub image_url: String,
    pub video_url: String,
    pub rating: f64,
    #[serde(rename = "totalRatings")]
    pub rating_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Title {
    pub fn popularity(&self) -> f64 {
        self.rating * f64::from(self.rating_count)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    #[serde(rename = "movieId")]
    pub title_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    #[serde(rename = "movieId")]
    pub title_id: String,
    pub user_id: String,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchLater {
    pub id: String,
    #[serde(rename = "movieId")]
    pub title_id: String,
    pub user_id: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub password_hash: String,
}

/// Title fields supplied by an administrator; id, rating and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTitle {
    pub title: String,
    pub description: String,
    pub kind: TitleKind,
    pub genres: Vec<String>,
    pub release_year: u16,
    pub duration: u32,
    pub image_url: String,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub title_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

/// Partial update of a [`Title`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<TitleKind>,
    pub genres: Option<Vec<String>>,
    pub release_year: Option<u16>,
    pub duration: Option<u32>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("series".parse::<TitleKind>(), Ok(TitleKind::Series));
        assert_eq!(" MOVIE ".parse::<TitleKind>(), Ok(TitleKind::Movie));
        assert!("documentary".parse::<TitleKind>().is_err());
    }

    #[test]
    fn kind_tag_case_is_ignored_when_reading() {
        let kinds: Vec<TitleKind> = serde_json::from_str(r#"["series", "MOVIE", "Series"]"#).unwrap();
        assert_eq!(kinds, [TitleKind::Series, TitleKind::Movie, TitleKind::Series]);
        assert!(serde_json::from_str::<TitleKind>(r#""anime""#).is_err());
        assert_eq!(serde_json::to_string(&TitleKind::Series).unwrap(), r#""Series""#);
    }

    #[test]
    fn title_uses_catalog_field_names() {
        let now = Utc::now();
        let title = Title {
            id: "7".to_owned(),
            title: "Heat".to_owned(),
            description: "A heist.".to_owned(),
            kind: TitleKind::Movie,
            genres: vec!["Crime".to_owned()],
            release_year: 1995,
            duration: 170,
            image_url: String::new(),
            video_url: String::new(),
            rating: 4.1,
            rating_count: 12,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&title).unwrap();
        assert_eq!(json["type"], "Movie");
        assert_eq!(json["genre"][0], "Crime");
        assert_eq!(json["totalRatings"], 12);
        assert_eq!(json["releaseYear"], 1995);
        let back: Title = serde_json::from_value(json).unwrap();
        assert_eq!(back, title);
    }

    #[test]
    fn user_without_hash_round_trips() {
        let json = r#"{"id":"1","email":"a@b.c","name":"A","isAdmin":false,"createdAt":"2024-01-01T00:00:00Z"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.password_hash.is_empty());
        assert!(!serde_json::to_string(&user).unwrap().contains("passwordHash"));
    }
}

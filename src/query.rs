//! Catalog views computed from a loaded title list. Nothing here touches
//! storage; every function keeps the input order unless it sorts.

use crate::model::{Timestamp, Title, TitleKind};
use chrono::Duration;
use std::cmp::Ordering;

pub const TRENDING_LIMIT: usize = 10;
pub const NEW_RELEASES_LIMIT: usize = 10;
pub const NEW_RELEASE_WINDOW_DAYS: i64 = 7;

/// Highest `rating * rating_count` first; equal scores keep catalog order.
pub fn trending(mut titles: Vec<Title>) -> Vec<Title> {
    titles.sort_by(|a, b| {
        b.popularity()
            .partial_cmp(&a.popularity())
            .unwrap_or(Ordering::Equal)
    });
    titles.truncate(TRENDING_LIMIT);
    titles
}

/// Titles created less than a week before `now`, newest first.
pub fn new_releases(titles: Vec<Title>, now: Timestamp) -> Vec<Title> {
    let cutoff = now - Duration::days(NEW_RELEASE_WINDOW_DAYS);
    let mut recent: Vec<Title> = titles
        .into_iter()
        .filter(|title| title.created_at > cutoff)
        .collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(NEW_RELEASES_LIMIT);
    recent
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive substring match on title, description or any genre.
pub fn search(titles: Vec<Title>, query: &str) -> Vec<Title> {
    let needle = query.to_lowercase();
    titles
        .into_iter()
        .filter(|title| {
            contains_ignore_case(&title.title, &needle)
                || contains_ignore_case(&title.description, &needle)
                || title
                    .genres
                    .iter()
                    .any(|genre| contains_ignore_case(genre, &needle))
        })
        .collect()
}

pub fn of_kind(titles: Vec<Title>, kind: &str) -> Vec<Title> {
    titles
        .into_iter()
        .filter(|title| title.kind.matches(kind))
        .collect()
}

pub fn in_genre(titles: Vec<Title>, genre: &str) -> Vec<Title> {
    titles
        .into_iter()
        .filter(|title| title.has_genre(genre))
        .collect()
}

/// The catalog page filter. Unlike [`search`], the query only looks at
/// title and description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    pub query: Option<String>,
    pub genre: Option<String>,
    pub kind: Option<TitleKind>,
}

impl BrowseFilter {
    pub fn matches(&self, title: &Title) -> bool {
        let query_ok = match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => {
                let needle = query.to_lowercase();
                contains_ignore_case(&title.title, &needle)
                    || contains_ignore_case(&title.description, &needle)
            }
            None => true,
        };
        let genre_ok = self
            .genre
            .as_deref()
            .map_or(true, |genre| title.has_genre(genre));
        let kind_ok = self.kind.map_or(true, |kind| title.kind == kind);
        query_ok && genre_ok && kind_ok
    }
}

pub fn browse(titles: Vec<Title>, filter: &BrowseFilter) -> Vec<Title> {
    titles
        .into_iter()
        .filter(|title| filter.matches(title))
        .collect()
}

/// Distinct genres in order of first appearance.
pub fn genres(titles: &[Title]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for genre in titles.iter().flat_map(|title| &title.genres) {
        if !seen.contains(genre) {
            seen.push(genre.clone());
        }
    }
    seen
}

/// Mean rating rounded to one decimal place, with the number of ratings.
/// `None` when there are no ratings.
pub fn aggregate_rating<I: IntoIterator<Item = u8>>(ratings: I) -> Option<(f64, u32)> {
    let (sum, count) = ratings
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), r| (sum + u32::from(r), count + 1));
    if count == 0 {
        return None;
    }
    let mean = f64::from(sum) / f64::from(count);
    Some(((mean * 10.0).round() / 10.0, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_titles;
    use chrono::Utc;

    fn titles() -> Vec<Title> {
        seed_titles(Utc::now())
    }

    fn names(titles: &[Title]) -> Vec<&str> {
        titles.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn trending_orders_by_popularity() {
        let mut titles: Vec<Title> = titles().into_iter().take(3).collect();
        for (title, count) in titles.iter_mut().zip(&[10, 30, 20]) {
            title.rating = 1.0;
            title.rating_count = *count;
        }
        let ids: Vec<_> = trending(titles).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[test]
    fn trending_ties_keep_catalog_order() {
        let mut titles = titles();
        for title in titles.iter_mut() {
            title.rating = 2.0;
            title.rating_count = 5;
        }
        let ids: Vec<_> = trending(titles).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn trending_is_capped() {
        let template = titles().remove(0);
        let many: Vec<Title> = (0..15)
            .map(|i| Title {
                id: i.to_string(),
                rating_count: i,
                ..template.clone()
            })
            .collect();
        let top = trending(many);
        assert_eq!(top.len(), TRENDING_LIMIT);
        assert_eq!(top[0].id, "14");
    }

    #[test]
    fn seed_trending() {
        assert_eq!(
            names(&trending(titles())),
            [
                "Avengers: Endgame",
                "Stranger Things",
                "The Witcher",
                "The Dark Knight",
                "Inception"
            ]
        );
    }

    #[test]
    fn new_release_window() {
        let now = Utc::now();
        let mut titles = titles();
        titles[0].created_at = now - Duration::days(8);
        titles[1].created_at = now - Duration::days(6);
        titles[2].created_at = now - Duration::days(30);
        titles[3].created_at = now - Duration::days(1);
        titles[4].created_at = now;
        assert_eq!(
            names(&new_releases(titles, now)),
            ["The Witcher", "Avengers: Endgame", "Inception"]
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        assert_eq!(names(&search(titles(), "dark")), ["The Dark Knight"]);
        assert_eq!(names(&search(titles(), "DARK")), ["The Dark Knight"]);
    }

    #[test]
    fn search_matches_genres_and_descriptions() {
        assert_eq!(
            names(&search(titles(), "fantasy")),
            ["Stranger Things", "The Witcher"]
        );
        assert_eq!(names(&search(titles(), "gotham")), ["The Dark Knight"]);
        assert_eq!(search(titles(), "").len(), 5);
        assert!(search(titles(), "zzz").is_empty());
    }

    #[test]
    fn kind_and_genre_filters() {
        assert_eq!(
            names(&of_kind(titles(), "series")),
            ["Stranger Things", "The Witcher"]
        );
        assert_eq!(
            names(&in_genre(titles(), "Adventure")),
            ["Avengers: Endgame", "The Witcher"]
        );
        assert!(in_genre(titles(), "adventure").is_empty());
    }

    #[test]
    fn browse_combines_filters() {
        let filter = BrowseFilter {
            query: Some("the".to_owned()),
            genre: Some("Action".to_owned()),
            kind: Some(TitleKind::Movie),
        };
        assert_eq!(
            names(&browse(titles(), &filter)),
            ["The Dark Knight", "Inception", "Avengers: Endgame"]
        );
        assert_eq!(browse(titles(), &BrowseFilter::default()).len(), 5);
        let genre_word = BrowseFilter {
            query: Some("horror".to_owned()),
            ..BrowseFilter::default()
        };
        assert!(browse(titles(), &genre_word).is_empty());
    }

    #[test]
    fn genre_listing() {
        assert_eq!(
            genres(&titles()),
            [
                "Action",
                "Crime",
                "Drama",
                "Sci-Fi",
                "Thriller",
                "Fantasy",
                "Horror",
                "Adventure"
            ]
        );
    }

    #[test]
    fn rating_aggregation() {
        assert_eq!(aggregate_rating(vec![3, 4, 5]), Some((4.0, 3)));
        assert_eq!(aggregate_rating(vec![4, 5]), Some((4.5, 2)));
        assert_eq!(aggregate_rating(vec![5, 4, 4]), Some((4.3, 3)));
        assert_eq!(aggregate_rating(Vec::new()), None);
    }
}

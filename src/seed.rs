use crate::model::{Timestamp, Title, TitleKind};
use chrono::Duration;

struct SeedTitle {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    kind: TitleKind,
    genres: &'static [&'static str],
    release_year: u16,
    duration: u32,
    image_url: &'static str,
    video_url: &'static str,
    rating: f64,
    rating_count: u32,
    age_days: i64,
}

const SEED: &[SeedTitle] = &[
    SeedTitle {
        id: "1",
        title: "The Dark Knight",
        description: "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",
        kind: TitleKind::Movie,
        genres: &["Action", "Crime", "Drama"],
        release_year: 2008,
        duration: 152,
        image_url: "https://images.unsplash.com/photo-1509347528160-9a9e33742cdb?w=400",
        video_url: "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4",
        rating: 4.5,
        rating_count: 1250,
        age_days: 0,
    },
    SeedTitle {
        id: "2",
        title: "Inception",
        description: "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",
        kind: TitleKind::Movie,
        genres: &["Action", "Sci-Fi", "Thriller"],
        release_year: 2010,
        duration: 148,
        image_url: "https://images.unsplash.com/photo-1440404653325-ab127d49abc1?w=400",
        video_url: "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_2mb.mp4",
        rating: 4.3,
        rating_count: 980,
        age_days: 0,
    },
    SeedTitle {
        id: "3",
        title: "Stranger Things",
        description: "When a young boy disappears, his mother, a police chief and his friends must confront terrifying supernatural forces in order to get him back.",
        kind: TitleKind::Series,
        genres: &["Drama", "Fantasy", "Horror"],
        release_year: 2016,
        duration: 45,
        image_url: "https://orangeflixx.vercel.app/images/Supernatural.jpg",
        video_url: "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4",
        rating: 4.7,
        rating_count: 2100,
        age_days: 0,
    },
    SeedTitle {
        id: "4",
        title: "Avengers: Endgame",
        description: "The grave course of events set in motion by Thanos that wiped out half the universe and fractured the Avengers ranks compels the remaining Avengers to take one final stand.",
        kind: TitleKind::Movie,
        genres: &["Action", "Adventure", "Drama"],
        release_year: 2019,
        duration: 181,
        image_url: "https://images.unsplash.com/photo-1635805737707-575885ab0820?w=400",
        video_url: "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4",
        rating: 4.8,
        rating_count: 3200,
        age_days: 1,
    },
    SeedTitle {
        id: "5",
        title: "The Witcher",
        description: "Geralt of Rivia, a solitary monster hunter, struggles to find his place in a world where people often prove more wicked than beasts.",
        kind: TitleKind::Series,
        genres: &["Action", "Adventure", "Fantasy"],
        release_year: 2023,
        duration: 60,
        image_url: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400",
        video_url: "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_2mb.mp4",
        rating: 4.6,
        rating_count: 1800,
        age_days: 2,
    },
];

/// The default catalog installed the first time titles are loaded. Creation
/// times are relative to `now`, so a fresh install has new releases to show.
pub fn seed_titles(now: Timestamp) -> Vec<Title> {
    SEED.iter()
        .map(|seed| {
            let created_at = now - Duration::days(seed.age_days);
            Title {
                id: seed.id.to_owned(),
                title: seed.title.to_owned(),
                description: seed.description.to_owned(),
                kind: seed.kind,
                genres: seed.genres.iter().map(|g| (*g).to_owned()).collect(),
                release_year: seed.release_year,
                duration: seed.duration,
                image_url: seed.image_url.to_owned(),
                video_url: seed.video_url.to_owned(),
                rating: seed.rating,
                rating_count: seed.rating_count,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

//! Shared infrastructure for the end-to-end suite tests.

mod fake_api;

pub use fake_api::{Drift, FakeApi};

use posts_contract::fixtures::{DbSnapshot, DefaultData, FixtureSet};
use posts_contract::posts::Post;
use posts_contract::session::Credentials;

/// The five-post baseline, identical to `fixtures/defaultData.json`.
pub fn baseline_posts() -> Vec<Post> {
    ["1st", "2nd", "3rd", "4th", "5th"]
        .iter()
        .enumerate()
        .map(|(i, ordinal)| {
            Post::new(
                i as u64 + 1,
                format!("Title of the {ordinal} post"),
                format!("{ordinal} Author"),
            )
        })
        .collect()
}

pub fn fixture_set() -> FixtureSet {
    FixtureSet {
        user: Credentials {
            email: "contract-tester@example.com".to_string(),
            password: "correct-horse-battery".to_string(),
        },
        default_data: DefaultData {
            posts: baseline_posts(),
        },
        snapshot: DbSnapshot {
            posts: baseline_posts(),
        },
    }
}

//! Loading of the version-controlled fixture files.
//!
//! Layout:
//!
//! - `<fixtures_dir>/user.json` — credentials of the throwaway test user.
//! - `<fixtures_dir>/defaultData.json` — `{ "posts": [...] }`, the baseline
//!   restored before and after every scenario.
//! - `db.json` — snapshot of the store, used as the expected state for
//!   GET assertions.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{ContractError, Result};
use crate::posts::Post;
use crate::session::Credentials;

pub const USER_FIXTURE: &str = "user.json";
pub const DEFAULT_DATA_FIXTURE: &str = "defaultData.json";

/// The `defaultData` fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultData {
    pub posts: Vec<Post>,
}

/// The `db.json` snapshot. Collections other than `posts` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DbSnapshot {
    pub posts: Vec<Post>,
}

/// Everything the suite reads from disk.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    pub user: Credentials,
    pub default_data: DefaultData,
    pub snapshot: DbSnapshot,
}

impl FixtureSet {
    /// Reads and validates all three fixture files.
    ///
    /// # Errors
    ///
    /// `ContractError::Fixture` naming the file when it is missing,
    /// not valid JSON, or when a post collection repeats an id.
    pub fn load(fixtures_dir: &Path, db_snapshot: &Path) -> Result<Self> {
        let user = load_json::<Credentials>(&fixtures_dir.join(USER_FIXTURE))?;

        let default_path = fixtures_dir.join(DEFAULT_DATA_FIXTURE);
        let default_data = load_json::<DefaultData>(&default_path)?;
        ensure_unique_ids(&default_path, &default_data.posts)?;

        let snapshot = load_json::<DbSnapshot>(db_snapshot)?;
        ensure_unique_ids(db_snapshot, &snapshot.posts)?;

        Ok(FixtureSet {
            user,
            default_data,
            snapshot,
        })
    }

    /// The canonical post baseline.
    pub fn baseline(&self) -> &[Post] {
        &self.default_data.posts
    }
}

/// Reads a JSON fixture file into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| fixture_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| fixture_error(path, e))
}

fn ensure_unique_ids(path: &Path, posts: &[Post]) -> Result<()> {
    let mut seen = HashSet::new();
    for post in posts {
        if !seen.insert(post.id) {
            return Err(fixture_error(
                path,
                format!("duplicate post id {}", post.id),
            ));
        }
    }
    Ok(())
}

fn fixture_error(
    path: &Path,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> ContractError {
    ContractError::Fixture {
        path: PathBuf::from(path),
        source: source.into(),
    }
}

//! Slug rules and link creation shared by the admin API and CLI

use anyhow::anyhow;

use crate::models::TrackingLink;
use crate::storage::{Storage, StorageError, StorageResult};

pub const MAX_SLUG_LENGTH: usize = 64;
pub const GENERATED_SLUG_LENGTH: usize = 6;
pub const MAX_SLUG_ATTEMPTS: usize = 10;
const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase alphanumeric slug
pub fn generate_slug() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    (0..GENERATED_SLUG_LENGTH)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Slugs are 1-64 characters of lowercase ASCII letters, digits and `-`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Create a link under a random slug, retrying on collisions
pub async fn create_with_generated_slug(
    storage: &dyn Storage,
    name: &str,
    created_by: Option<&str>,
) -> StorageResult<TrackingLink> {
    create_with_slug_source(storage, name, created_by, generate_slug).await
}

async fn create_with_slug_source<F>(
    storage: &dyn Storage,
    name: &str,
    created_by: Option<&str>,
    mut next_slug: F,
) -> StorageResult<TrackingLink>
where
    F: FnMut() -> String,
{
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let slug = next_slug();
        match storage.create_link(name, &slug, created_by).await {
            Err(StorageError::Conflict) => continue,
            other => return other,
        }
    }

    Err(StorageError::Other(anyhow!(
        "failed to generate a unique slug after {MAX_SLUG_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    async fn setup_sqlite() -> SqliteStorage {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
    }

    #[test]
    fn test_generated_slug_is_valid() {
        for _ in 0..100 {
            let slug = generate_slug();
            assert_eq!(slug.len(), GENERATED_SLUG_LENGTH);
            assert!(is_valid_slug(&slug), "generated slug {slug} is invalid");
        }
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("my-link"));
        assert!(is_valid_slug("abc123"));
        assert!(is_valid_slug(&"a".repeat(MAX_SLUG_LENGTH)));

        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("My-Link"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("under_score"));
        assert!(!is_valid_slug("slash/slug"));
        assert!(!is_valid_slug("ảnh"));
        assert!(!is_valid_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)));
    }

    #[tokio::test]
    async fn test_collision_retries_until_free_slug() {
        let storage = setup_sqlite().await;
        storage.create_link("Existing", "taken", None).await.unwrap();

        let mut candidates = vec!["fresh", "taken", "taken"];
        let mut calls = 0;
        let link = create_with_slug_source(&storage, "New", None, || {
            calls += 1;
            candidates.pop().unwrap().to_string()
        })
        .await
        .unwrap();

        assert_eq!(link.slug, "fresh");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_collision_gives_up_after_max_attempts() {
        let storage = setup_sqlite().await;
        storage.create_link("Existing", "taken", None).await.unwrap();

        let mut calls = 0;
        let result = create_with_slug_source(&storage, "New", None, || {
            calls += 1;
            "taken".to_string()
        })
        .await;

        assert!(matches!(result, Err(StorageError::Other(_))));
        assert_eq!(calls, MAX_SLUG_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_generated_slug_link_is_created() {
        let storage = setup_sqlite().await;
        let link = create_with_generated_slug(&storage, "Random", Some("cli"))
            .await
            .unwrap();
        assert!(is_valid_slug(&link.slug));
        assert_eq!(link.created_by.as_deref(), Some("cli"));
    }
}

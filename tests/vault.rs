// ../tests/vault.rs
mod common;

use projectx_ratatui::error::VaultError;
use projectx_ratatui::rate_limiter::RateLimiter;
use projectx_ratatui::storage::{KeyValueStoreExt, VAULT_API_KEY};
use projectx_ratatui::vault::{
    AccessGate, DataVault, Dataset, DatasetSource, KeyPolicy, QueryOptions, generate_api_key,
    is_valid_filename, is_well_formed,
};
use std::time::Duration;
use tempfile::tempdir;

fn vault() -> DataVault {
    DataVault::new(
        DatasetSource::Embedded,
        AccessGate::new(common::memory_store(), "open-sesame"),
    )
}

fn ids(page: &projectx_ratatui::vault::QueryPage) -> Vec<String> {
    page.rows.iter().map(|row| row["id"].clone()).collect()
}

#[tokio::test]
async fn test_lists_manifest_files() {
    let files = vault().list_files();
    assert_eq!(files.len(), 6);
    assert!(files.contains(&"ecobot_tweets.csv".to_string()));
    assert!(files.iter().all(|f| is_valid_filename(f)));
}

#[tokio::test]
async fn test_reads_embedded_file_skipping_blank_lines() {
    let page = vault()
        .get_file_contents("ecobot_tweets.csv", None, &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(page.headers, vec!["id", "date", "username", "category", "text"]);
    assert_eq!(page.total, 8);
    assert_eq!(page.rows.len(), 8);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 20);
    assert_eq!(page.total_pages(), 1);
    assert!(page.rows[0]["text"].contains("Glacier melt rate"));
}

#[tokio::test]
async fn test_paginates() {
    let options = QueryOptions::default().page(3).page_size(3);
    let page = vault()
        .get_file_contents("ecobot_tweets.csv", None, &options)
        .await
        .unwrap();

    assert_eq!(page.total, 8);
    assert_eq!(page.total_pages(), 3);
    assert_eq!(ids(&page), vec!["7", "8"]);

    let beyond = vault()
        .get_file_contents("ecobot_tweets.csv", None, &options.page(9))
        .await
        .unwrap();
    assert!(beyond.rows.is_empty());
    assert_eq!(beyond.total, 8);
}

fn embedded_datasets() -> Vec<Dataset> {
    vault()
        .list_files()
        .iter()
        .map(|file| {
            let bytes = DatasetSource::Embedded.read(file).unwrap();
            Dataset::parse(file, &bytes).unwrap()
        })
        .collect()
}

#[test]
fn test_page_length_matches_remaining_rows() {
    for dataset in embedded_datasets() {
        let total = dataset.rows.len();
        for page_size in 1..=total + 2 {
            for page in 1..=total + 2 {
                let options = QueryOptions::default().page(page).page_size(page_size);
                let result = dataset.query(&options).unwrap();
                let expected = page_size.min(total.saturating_sub((page - 1) * page_size));
                assert_eq!(
                    result.rows.len(),
                    expected,
                    "{} page {page} size {page_size}",
                    dataset.filename
                );
                assert_eq!(result.total, total);
            }
        }
    }
}

#[test]
fn test_adding_a_filter_narrows_the_result() {
    for dataset in embedded_datasets() {
        let everything = QueryOptions::default().page_size(10_000);
        for (i, row) in dataset.rows.iter().enumerate() {
            let other = &dataset.rows[(i + 1) % dataset.rows.len()];
            for first in &dataset.headers {
                for second in dataset.headers.iter().filter(|h| *h != first) {
                    let a: String = row[first].chars().take(3).collect();
                    let b: String = other[second].chars().take(2).collect();

                    let wide = dataset.query(&everything.clone().filter(first, &a)).unwrap();
                    let narrow = dataset
                        .query(&everything.clone().filter(first, &a).filter(second, &b))
                        .unwrap();

                    assert!(narrow.total <= wide.total);
                    assert!(
                        narrow.rows.iter().all(|r| wide.rows.contains(r)),
                        "{}: {first}={a:?} and {second}={b:?}",
                        dataset.filename
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_filters_and_search_are_case_insensitive() {
    let vault = vault();

    let tech = vault
        .get_file_contents(
            "ecobot_tweets.csv",
            None,
            &QueryOptions::default().filter("category", "tech news"),
        )
        .await
        .unwrap();
    assert_eq!(ids(&tech), vec!["4", "8"]);

    let glacier = vault
        .get_file_contents(
            "ecobot_tweets.csv",
            None,
            &QueryOptions::default().search("GLACIER"),
        )
        .await
        .unwrap();
    assert_eq!(ids(&glacier), vec!["1"]);

    let both = vault
        .get_file_contents(
            "ecobot_tweets.csv",
            None,
            &QueryOptions::default()
                .filter("category", "tech")
                .search("satellite"),
        )
        .await
        .unwrap();
    assert_eq!(ids(&both), vec!["8"]);

    let unknown_column = vault
        .get_file_contents(
            "ecobot_tweets.csv",
            None,
            &QueryOptions::default().filter("mood", "x"),
        )
        .await
        .unwrap();
    assert_eq!(unknown_column.total, 0);
}

#[tokio::test]
async fn test_query_text_parsing() {
    let options = QueryOptions::from_query_text("category:tech  satellite  methane");
    assert_eq!(options.filters.get("category").map(String::as_str), Some("tech"));
    assert_eq!(options.search.as_deref(), Some("satellite methane"));

    let page = vault()
        .get_file_contents("ecobot_tweets.csv", None, &options)
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["8"]);

    let plain = QueryOptions::from_query_text("");
    assert_eq!(plain, QueryOptions::default());
}

#[tokio::test]
async fn test_rejects_zero_pagination() {
    let vault = vault();
    for options in [
        QueryOptions::default().page(0),
        QueryOptions::default().page_size(0),
    ] {
        let err = vault
            .get_file_contents("ecobot_tweets.csv", None, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidPagination));
    }
}

#[tokio::test]
async fn test_rejects_bad_filenames() {
    let vault = vault();
    for name in ["../secrets.csv", "notes.txt", "with space.csv", ""] {
        let err = vault
            .get_file_contents(name, None, &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidFilename(_)), "{name}");
        assert_eq!(err.to_string(), "Invalid filename");
    }

    let missing = vault
        .get_file_contents("missing.csv", None, &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(missing, VaultError::FileNotFound(_)));
}

#[tokio::test]
async fn test_keyed_access_checks_format() {
    let vault = vault();

    let err = vault
        .get_file_contents("ufobot_tweets.csv", Some("px_123"), &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidApiKey));

    let key = generate_api_key();
    let page = vault
        .get_file_contents("ufobot_tweets.csv", Some(&key), &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(page.total, 6);
}

#[tokio::test]
async fn test_keyed_access_is_rate_limited() {
    let vault = vault().with_rate_limiter(RateLimiter::new(2, Duration::from_secs(60)));
    let key = generate_api_key();
    let options = QueryOptions::default();

    vault
        .get_file_contents("ufobot_tweets.csv", Some(&key), &options)
        .await
        .unwrap();
    vault
        .get_file_contents("ufobot_tweets.csv", Some(&key), &options)
        .await
        .unwrap();
    let err = vault
        .get_file_contents("ufobot_tweets.csv", Some(&key), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::RateLimited { .. }));
    assert!(err.is_retryable());
    assert!(err.to_string().starts_with("Rate limit exceeded. Try again in"));
    assert_eq!(vault.remaining_requests(), 0);

    // Anonymous reads skip the limiter.
    vault
        .get_file_contents("ufobot_tweets.csv", None, &options)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rate_limit_is_checked_before_the_key() {
    let vault = vault().with_rate_limiter(RateLimiter::new(1, Duration::from_secs(60)));
    let options = QueryOptions::default();

    let first = vault
        .get_file_contents("ufobot_tweets.csv", Some("garbage"), &options)
        .await
        .unwrap_err();
    assert!(matches!(first, VaultError::InvalidApiKey));

    let second = vault
        .get_file_contents("ufobot_tweets.csv", Some("garbage"), &options)
        .await
        .unwrap_err();
    assert!(matches!(second, VaultError::RateLimited { .. }));
}

#[tokio::test]
async fn test_api_response_envelope() {
    let vault = vault();

    let ok = vault
        .query("drugbot_tweets.csv", None, &QueryOptions::default().page_size(2))
        .await;
    assert!(ok.success);
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["data"]["pageSize"], 2);
    assert_eq!(json["data"]["total"], 7);
    assert_eq!(json["data"]["data"].as_array().unwrap().len(), 2);
    assert!(json.get("error").is_none());

    let failed = vault
        .query("../etc/passwd", None, &QueryOptions::default())
        .await;
    assert!(!failed.success);
    assert_eq!(failed.error.as_deref(), Some("Invalid filename"));
    let json = serde_json::to_value(&failed).unwrap();
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_context_rows_flatten_every_file() {
    let vault = vault();

    let all = vault.context_rows(1_000).await;
    assert_eq!(all.len(), 42);
    assert!(all[0].starts_with("1 2024-03-02 ecobot Climate"));

    let capped = vault.context_rows(5).await;
    assert_eq!(capped.len(), 5);
}

#[tokio::test]
async fn test_directory_source_pads_short_rows() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("scores.csv"),
        " name , score \nalpha,1\n\nbeta\ngamma,3,extra\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("empty.csv"), "").unwrap();

    let vault = DataVault::new(
        DatasetSource::Directory(dir.path().to_path_buf()),
        AccessGate::new(common::memory_store(), ""),
    );

    let page = vault
        .get_file_contents("scores.csv", None, &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(page.headers, vec!["name", "score"]);
    assert_eq!(page.total, 3);
    assert_eq!(page.rows[1]["name"], "beta");
    assert_eq!(page.rows[1]["score"], "");
    assert_eq!(page.rows[2].len(), 2);

    let err = vault
        .get_file_contents("empty.csv", None, &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidFormat(_)));
}

#[test]
fn test_dataset_parse_directly() {
    let dataset = Dataset::parse("inline.csv", b"a,b\n1,2\n3,4\n").unwrap();
    assert_eq!(dataset.filename, "inline.csv");
    assert_eq!(dataset.rows.len(), 2);
    assert_eq!(dataset.rows[1]["b"], "4");
}

#[test]
fn test_passcode_issues_and_stores_a_key() {
    let store = common::memory_store();
    let gate = AccessGate::new(store.clone(), "open-sesame");

    assert!(!gate.is_unlocked());
    assert!(matches!(
        gate.unlock_with_passcode("wrong"),
        Err(VaultError::InvalidCredentials)
    ));

    let key = gate.unlock_with_passcode(" open-sesame ").unwrap();
    assert!(is_well_formed(&key));
    assert_eq!(key.len(), 3 + 64);
    assert!(gate.is_unlocked());
    assert_eq!(store.load::<String>(VAULT_API_KEY).unwrap(), Some(key));

    gate.lock().unwrap();
    assert!(!gate.is_unlocked());
}

#[test]
fn test_empty_passcode_disables_passcode_unlock() {
    let gate = AccessGate::new(common::memory_store(), "");
    assert!(matches!(
        gate.unlock_with_passcode(""),
        Err(VaultError::InvalidCredentials)
    ));
}

#[test]
fn test_key_policies() {
    let foreign = format!("PX_{}", "AB".repeat(32));
    assert!(is_well_formed(&foreign));
    assert!(!is_well_formed("px_xyz"));

    let format_only = AccessGate::new(common::memory_store(), "pass");
    assert_eq!(format_only.policy(), KeyPolicy::FormatOnly);
    assert!(format_only.validate(&foreign));
    format_only.unlock_with_key(&foreign).unwrap();
    assert!(format_only.is_unlocked());

    let issued_only =
        AccessGate::new(common::memory_store(), "pass").with_policy(KeyPolicy::IssuedOnly);
    assert!(!issued_only.validate(&foreign));
    let issued = issued_only.unlock_with_passcode("pass").unwrap();
    assert!(issued_only.validate(&issued));
    assert!(!issued_only.validate(&foreign));
    assert!(matches!(
        issued_only.unlock_with_key("px_short"),
        Err(VaultError::InvalidApiKey)
    ));
}

//! Source fetchers and record fan-out.
//!
//! Each fetcher runs independently. A fetcher that fails contributes zero
//! records and one [`FetchFailure`]; it never aborts the gather.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tra_core::{BatchInput, ItemError, RawClaim, RawRecord};

use crate::error::{Error, Result};

/// Concurrent fetchers in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// What one fetcher produced
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub records: Vec<RawRecord>,
    pub claims: Vec<RawClaim>,
    /// Items the source returned that could not be parsed
    pub rejected: Vec<ItemError>,
}

/// A source of raw records and claims
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Name used in logs and failure reports
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Fetched>;
}

/// A fetcher that failed, reported next to the gathered batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub source_name: String,
    pub error: String,
}

/// Records and claims gathered from every fetcher
#[derive(Debug, Clone, Default)]
pub struct Gathered {
    pub batch: BatchInput,
    pub rejected: Vec<ItemError>,
    pub failures: Vec<FetchFailure>,
}

/// Run every fetcher with at most `concurrency` in flight and merge the results.
///
/// Output order follows the fetcher list, not completion order.
pub async fn gather_records(fetchers: Vec<Arc<dyn SourceFetcher>>, concurrency: usize) -> Gathered {
    let total = fetchers.len();
    let mut results: Vec<(usize, String, Result<Fetched>)> =
        stream::iter(fetchers.into_iter().enumerate().map(|(i, fetcher)| async move {
            let result = fetcher.fetch().await;
            (i, fetcher.name().to_string(), result)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(i, _, _)| *i);

    let mut gathered = Gathered::default();
    for (_, name, result) in results {
        match result {
            Ok(fetched) => {
                gathered.batch.records.extend(fetched.records);
                gathered.batch.claims.extend(fetched.claims);
                gathered.rejected.extend(fetched.rejected);
            }
            Err(e) => {
                warn!(source = %name, error = %e, "fetch failed");
                gathered.failures.push(FetchFailure {
                    source_name: name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        fetchers = total,
        records = gathered.batch.records.len(),
        claims = gathered.batch.claims.len(),
        failures = gathered.failures.len(),
        "sources gathered"
    );
    gathered
}

/// Reads a batch from a JSON file.
///
/// Accepts either `{"records": [...], "claims": [...]}` or a bare array of
/// records.
#[derive(Debug, Clone)]
pub struct JsonFileFetcher {
    name: String,
    path: PathBuf,
}

impl JsonFileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
        }
    }

    fn shape_error(&self, message: String) -> Error {
        Error::Fetch {
            source_name: self.name.clone(),
            message,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl SourceFetcher for JsonFileFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Fetched> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&text)?;
        let value = match value {
            Value::Array(records) => serde_json::json!({ "records": records }),
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(self.shape_error(format!(
                    "expected an object or an array of records, found {}",
                    json_kind(&other)
                )))
            }
        };

        let (batch, rejected) = BatchInput::from_value(value).map_err(|e| self.shape_error(e.to_string()))?;
        for e in &rejected {
            warn!(source = %self.name, item = %e.item_id, reason = %e.reason, "item rejected");
        }
        Ok(Fetched {
            records: batch.records,
            claims: batch.claims,
            rejected: rejected.into_iter().map(ItemError::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixed(&'static str, usize);

    #[async_trait]
    impl SourceFetcher for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn fetch(&self) -> Result<Fetched> {
            let records: Vec<RawRecord> = (0..self.1)
                .map(|i| {
                    serde_json::from_value(json!({
                        "source_id": format!("{}-{}", self.0, i),
                        "source_type": "github",
                        "extraction_confidence": 0.9
                    }))
                    .unwrap()
                })
                .collect();
            Ok(Fetched {
                records,
                ..Fetched::default()
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl SourceFetcher for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch(&self) -> Result<Fetched> {
            Err(Error::Fetch {
                source_name: "broken".into(),
                message: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn failing_fetcher_contributes_nothing() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> =
            vec![Arc::new(Fixed("a", 2)), Arc::new(Broken), Arc::new(Fixed("b", 1))];
        let gathered = gather_records(fetchers, 2).await;

        let ids: Vec<&str> = gathered.batch.records.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a-0", "a-1", "b-0"]);
        assert_eq!(gathered.failures.len(), 1);
        assert_eq!(gathered.failures[0].source_name, "broken");
    }

    #[tokio::test]
    async fn json_file_accepts_bare_record_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            json!([
                {"source_id": "gh-1", "source_type": "github", "extraction_confidence": 0.9},
                {"source_id": "gh-2", "content": ["not", "a", "map"]}
            ])
            .to_string(),
        )
        .unwrap();

        let fetched = JsonFileFetcher::new(&path).fetch().await.unwrap();
        assert_eq!(fetched.records.len(), 1);
        assert!(fetched.claims.is_empty());
        assert_eq!(fetched.rejected.len(), 1);
        assert_eq!(fetched.rejected[0].item_id, "gh-2");
    }

    #[tokio::test]
    async fn json_file_with_wrong_shape_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let scalar = dir.path().join("scalar.json");
        std::fs::write(&scalar, "42").unwrap();
        let bad_records = dir.path().join("bad_records.json");
        std::fs::write(&bad_records, json!({"records": "gh-1"}).to_string()).unwrap();

        for path in [scalar.as_path(), bad_records.as_path()] {
            let fetcher = JsonFileFetcher::new(path);
            match fetcher.fetch().await {
                Err(Error::Fetch { source_name, .. }) => assert_eq!(source_name, fetcher.name()),
                other => panic!("expected a fetch error, got {:?}", other),
            }
        }

        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![Arc::new(JsonFileFetcher::new(&scalar))];
        let gathered = gather_records(fetchers, DEFAULT_CONCURRENCY).await;
        assert_eq!(gathered.failures.len(), 1);
        assert!(gathered.failures[0].error.contains("found a number"));
    }

    #[tokio::test]
    async fn missing_file_is_a_failure_not_a_panic() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> =
            vec![Arc::new(JsonFileFetcher::new("/nonexistent/records.json"))];
        let gathered = gather_records(fetchers, DEFAULT_CONCURRENCY).await;
        assert!(gathered.batch.records.is_empty());
        assert_eq!(gathered.failures.len(), 1);
    }
}

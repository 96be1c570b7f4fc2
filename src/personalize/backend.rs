use std::{fs, path::{Path, PathBuf}};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// One retrieved document
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    /// opaque relevance score from the backend
    pub score: f64,
    /// stored fields (`text`, `user_name`, `date`, ...)
    pub source: Value,
}

impl Hit {
    /// A string field of the stored document, empty if absent
    pub fn field(&self, name: &str) -> &str {
        self.source.get(name).and_then(Value::as_str).unwrap_or("")
    }
}

/// Full-text search backend
/// The query tree is passed through untouched.
pub trait SearchBackend {
    fn search(&self, index: &str, query: &Value, max_results: usize) -> Result<Vec<Hit>>;
}

#[derive(Deserialize)]
struct EsResponse {
    hits: EsHits,
}

#[derive(Deserialize)]
struct EsHits {
    #[serde(default)]
    hits: Vec<EsHit>,
}

#[derive(Deserialize)]
struct EsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Value,
}

/// Extract hits from an Elasticsearch-style response body (`hits.hits[]`)
/// A missing `_score` counts as 0.
pub fn hits_from_response(body: &str) -> std::result::Result<Vec<Hit>, serde_json::Error> {
    let res: EsResponse = serde_json::from_str(body)?;
    Ok(res
        .hits
        .hits
        .into_iter()
        .map(|h| Hit {
            id: h.id,
            score: h.score.unwrap_or(0.0),
            source: h.source,
        })
        .collect())
}

/// Replays a saved search response from disk, ignoring index and query
#[derive(Debug, Clone)]
pub struct ResponseFileBackend {
    path: PathBuf,
}

impl ResponseFileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SearchBackend for ResponseFileBackend {
    fn search(&self, _index: &str, _query: &Value, max_results: usize) -> Result<Vec<Hit>> {
        let body = fs::read_to_string(&self.path).map_err(|e| Error::SearchResponse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let mut hits = hits_from_response(&body).map_err(|e| Error::SearchResponse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        hits.truncate(max_results);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BODY: &str = r#"{
        "took": 3,
        "hits": {
            "total": {"value": 3},
            "hits": [
                {"_id": "a", "_score": 7.5, "_source": {"text": "first @x", "user_name": "NASA"}},
                {"_id": "b", "_score": 2.0, "_source": {"text": "second"}},
                {"_id": "c", "_source": {}}
            ]
        }
    }"#;

    #[test]
    fn parses_hits() {
        let hits = hits_from_response(BODY).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].score, 7.5);
        assert_eq!(hits[0].field("user_name"), "NASA");
        assert_eq!(hits[2].score, 0.0);
        assert_eq!(hits[2].field("text"), "");
    }

    #[test]
    fn file_backend_truncates_and_reports_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("res.json");
        fs::write(&path, BODY).unwrap();
        let backend = ResponseFileBackend::new(&path);
        let query = json!({"match": {"text": "anything"}});
        assert_eq!(backend.search("twitter_index", &query, 2).unwrap().len(), 2);

        let missing = ResponseFileBackend::new(dir.path().join("none.json"));
        assert!(matches!(missing.search("i", &query, 10), Err(Error::SearchResponse { .. })));
        fs::write(&path, "{\"nope\": 1}").unwrap();
        assert!(matches!(backend.search("i", &query, 10), Err(Error::SearchResponse { .. })));
    }
}

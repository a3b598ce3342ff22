use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fixed-length face embedding with its enrollment metadata.
///
/// Immutable once produced; owned by the identity it was enrolled under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Raw vector produced by the embedding model.
    pub vector: Vec<f32>,
    /// Filename the embedding was enrolled from.
    pub filename: String,
    /// When the embedding was enrolled.
    pub uploaded_at: DateTime<Utc>,
}

/// An enrolled person: stable identifier, display name, and one or more
/// embeddings. A scan compares the query against all of them and keeps the
/// best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    /// Facility the identity is enrolled at, when known.
    pub facility: Option<String>,
    pub embeddings: Vec<Embedding>,
}

/// The caller performing a recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

/// Which metric accepted a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Cosine,
    Euclidean,
    None,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Persisted fact of one accepted, non-suppressed match.
///
/// Created exactly once per cooldown window per identity; immutable after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub identity_id: String,
    pub identity_name: String,
    pub facility: Option<String>,
    /// Reported confidence in [0, 1].
    pub score: f32,
    pub method: MatchMethod,
    /// Id of the actor whose recognition produced the match.
    pub recognized_by: String,
    pub recognized_at: DateTime<Utc>,
}

/// What the caller gets back from one recognition call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    /// Matched identity, or None on rejection.
    pub identity_id: Option<String>,
    pub name: Option<String>,
    pub facility: Option<String>,
    pub method: MatchMethod,
    /// Reported confidence in [0, 1]; diagnostic even on rejection.
    pub score: f32,
    /// True when this call wrote the ledger and broadcast the event. A
    /// match suppressed by the cooldown window still carries the identity
    /// and score above, with this set to false.
    pub newly_logged: bool,
}

/// Controls matching behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeConfig {
    /// Embedding dimension (e.g. 512 for facenet-style models).
    pub dim: usize,
    /// Minimum cosine similarity to accept a match outright.
    pub cosine_threshold: f32,
    /// Maximum euclidean distance to accept when cosine is inconclusive.
    pub euclidean_threshold: f32,
    /// Minimum time between two logged matches for the same identity.
    pub cooldown: Duration,
}

impl Default for RecognizeConfig {
    fn default() -> Self {
        Self {
            dim: 512,
            cosine_threshold: 0.85,
            euclidean_threshold: 0.6,
            cooldown: Duration::from_secs(30),
        }
    }
}

//! Face recognition matching engine.
//!
//! # Architecture
//!
//! One recognition call flows through four stages:
//!
//! 1. [`Gallery::scan`]: enumerate every embedding of every enrolled
//!    identity and track the best cosine and best euclidean candidates
//!    (full scan, global best, no early exit).
//! 2. [`choose_match`]: hybrid accept/reject decision. Cosine similarity is
//!    the primary, scale-invariant signal; euclidean distance is consulted
//!    only when cosine is inconclusive.
//! 3. [`CooldownTracker::should_accept`]: per-identity duplicate
//!    suppression. The check and the timestamp update are one atomic step,
//!    so concurrent matches for the same identity log at most once per
//!    window.
//! 4. Side effects: append a [`MatchRecord`] to the [`MatchLedger`] and
//!    broadcast an activity event. Only accepted, non-suppressed matches
//!    reach this stage, at most once per call.
//!
//! The [`Recognizer`] is a long-lived instance owning the cooldown state
//! and the hub handle; request handlers share it behind an `Arc` and call
//! [`Recognizer::recognize`] concurrently.

mod cooldown;
mod engine;
mod error;
mod metric;
mod policy;
mod store;
mod types;

pub use cooldown::CooldownTracker;
pub use engine::Recognizer;
pub use error::{RecognizeError, StoreError};
pub use metric::{cosine_similarity, distance_to_score, euclidean_distance};
pub use policy::{Candidate, MatchDecision, choose_match};
pub use store::{Gallery, MatchLedger, MemoryGallery, MemoryLedger};
pub use types::{
    Actor, Embedding, Identity, MatchMethod, MatchRecord, RecognitionResult, RecognizeConfig,
};

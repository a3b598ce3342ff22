use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use facegate_activity::{ActivityEvent, ActivityHub};
use tracing::{debug, info};

use crate::cooldown::CooldownTracker;
use crate::error::RecognizeError;
use crate::metric::{cosine_similarity, euclidean_distance};
use crate::policy::{Candidate, choose_match};
use crate::store::{Gallery, MatchLedger};
use crate::types::{Actor, MatchMethod, MatchRecord, RecognitionResult, RecognizeConfig};

/// Long-lived recognition engine.
///
/// Owns the cooldown state and the activity hub handle; request handlers
/// share one instance behind an `Arc` and call [`Recognizer::recognize`]
/// concurrently. The cooldown tracker is the only serialization point, and
/// only per identity.
pub struct Recognizer {
    gallery: Arc<dyn Gallery>,
    ledger: Arc<dyn MatchLedger>,
    hub: Arc<ActivityHub>,
    cooldown: CooldownTracker,
    config: RecognizeConfig,
}

impl Recognizer {
    /// Creates an engine over the given collaborators. Panics if
    /// `config.dim` is 0.
    pub fn new(
        gallery: Arc<dyn Gallery>,
        ledger: Arc<dyn MatchLedger>,
        hub: Arc<ActivityHub>,
        config: RecognizeConfig,
    ) -> Self {
        assert!(config.dim > 0, "recognize: config.dim must be positive");
        Self {
            gallery,
            ledger,
            hub,
            cooldown: CooldownTracker::new(config.cooldown),
            config,
        }
    }

    pub fn config(&self) -> &RecognizeConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<ActivityHub> {
        &self.hub
    }

    /// Identifies the person behind `query` against the whole gallery.
    ///
    /// Scans every embedding of every identity (global best, no early
    /// exit) and applies the hybrid cosine/euclidean decision. For an
    /// accepted match outside the identity's cooldown window, appends a
    /// [`MatchRecord`] to the ledger and broadcasts an activity event.
    /// A match inside the window is returned with `newly_logged = false`
    /// and produces no side effects.
    ///
    /// A ledger failure surfaces as [`RecognizeError::Ledger`] after the
    /// cooldown window has already started; the window is not rolled back,
    /// so an immediate retry is suppressed until it lapses.
    pub async fn recognize(
        &self,
        query: &[f32],
        actor: &Actor,
    ) -> Result<RecognitionResult, RecognizeError> {
        if query.len() != self.config.dim {
            return Err(RecognizeError::DimensionMismatch {
                expected: self.config.dim,
                got: query.len(),
            });
        }

        let identities = self
            .gallery
            .scan()
            .await
            .map_err(RecognizeError::Gallery)?;

        let mut best_cosine: Option<Candidate> = None;
        let mut best_euclidean: Option<Candidate> = None;

        for (index, identity) in identities.iter().enumerate() {
            for embedding in &identity.embeddings {
                if embedding.vector.len() != query.len() {
                    debug!(
                        "skipping embedding {} of {}: dimension {} != {}",
                        embedding.filename,
                        identity.id,
                        embedding.vector.len(),
                        query.len()
                    );
                    continue;
                }

                let score = cosine_similarity(query, &embedding.vector);
                if score > 0.0 && best_cosine.is_none_or(|c| score > c.value) {
                    best_cosine = Some(Candidate {
                        index,
                        value: score,
                    });
                }

                let dist = euclidean_distance(query, &embedding.vector);
                if best_euclidean.is_none_or(|c| dist < c.value) {
                    best_euclidean = Some(Candidate { index, value: dist });
                }
            }
        }

        let decision = choose_match(
            best_cosine,
            best_euclidean,
            self.config.cosine_threshold,
            self.config.euclidean_threshold,
        );

        let Some(index) = decision.index else {
            debug!(
                "no match above thresholds (best diagnostic score {:.3})",
                decision.score
            );
            return Ok(RecognitionResult {
                identity_id: None,
                name: None,
                facility: None,
                method: MatchMethod::None,
                score: decision.score,
                newly_logged: false,
            });
        };

        let identity = &identities[index];

        if !self.cooldown.should_accept(&identity.id, Instant::now()) {
            debug!(
                "skipped logging {} (recognized too recently)",
                identity.id
            );
            return Ok(RecognitionResult {
                identity_id: Some(identity.id.clone()),
                name: Some(identity.name.clone()),
                facility: identity.facility.clone(),
                method: decision.method,
                score: decision.score,
                newly_logged: false,
            });
        }

        let record = MatchRecord {
            identity_id: identity.id.clone(),
            identity_name: identity.name.clone(),
            facility: identity.facility.clone(),
            score: decision.score,
            method: decision.method,
            recognized_by: actor.id.clone(),
            recognized_at: Utc::now(),
        };

        self.ledger
            .append(&record)
            .await
            .map_err(RecognizeError::Ledger)?;

        let delivered = self.hub.broadcast(&ActivityEvent {
            identity_id: record.identity_id.clone(),
            identity_name: record.identity_name.clone(),
            facility: record.facility.clone(),
            actor_name: actor.name.clone(),
            score: record.score,
            method: record.method.to_string(),
            recognized_at: record.recognized_at,
        });

        info!(
            "matched {} via {} (score {:.3}), notified {} observers",
            identity.id, decision.method, decision.score, delivered
        );

        Ok(RecognitionResult {
            identity_id: Some(record.identity_id),
            name: Some(record.identity_name),
            facility: record.facility,
            method: record.method,
            score: record.score,
            newly_logged: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::StoreError;
    use crate::store::{MemoryGallery, MemoryLedger};
    use crate::types::{Embedding, Identity};

    use super::*;

    fn actor() -> Actor {
        Actor {
            id: "officer-7".into(),
            name: "J. Keller".into(),
        }
    }

    fn identity(id: &str, vectors: &[&[f32]]) -> Identity {
        Identity {
            id: id.to_string(),
            name: format!("name-{id}"),
            facility: Some("north-wing".into()),
            embeddings: vectors
                .iter()
                .enumerate()
                .map(|(i, v)| Embedding {
                    vector: v.to_vec(),
                    filename: format!("{id}-{i}.jpg"),
                    uploaded_at: Utc::now(),
                })
                .collect(),
        }
    }

    struct Fixture {
        gallery: Arc<MemoryGallery>,
        ledger: Arc<MemoryLedger>,
        hub: Arc<ActivityHub>,
        engine: Recognizer,
    }

    fn fixture(identities: Vec<Identity>, config: RecognizeConfig) -> Fixture {
        let gallery = Arc::new(MemoryGallery::new());
        for identity in identities {
            gallery.enroll(identity);
        }
        let ledger = Arc::new(MemoryLedger::new());
        let hub = Arc::new(ActivityHub::new());
        let engine = Recognizer::new(
            Arc::clone(&gallery) as Arc<dyn Gallery>,
            Arc::clone(&ledger) as Arc<dyn MatchLedger>,
            Arc::clone(&hub),
            config,
        );
        Fixture {
            gallery,
            ledger,
            hub,
            engine,
        }
    }

    fn dim4() -> RecognizeConfig {
        RecognizeConfig {
            dim: 4,
            ..RecognizeConfig::default()
        }
    }

    #[tokio::test]
    async fn exact_match_is_accepted_via_cosine() {
        let f = fixture(
            vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])],
            dim4(),
        );

        let result = f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(result.identity_id.as_deref(), Some("a"));
        assert_eq!(result.method, MatchMethod::Cosine);
        assert!((result.score - 1.0).abs() < 1e-5);
        assert!(result.newly_logged);

        let records = f.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity_id, "a");
        assert_eq!(records[0].recognized_by, "officer-7");
    }

    #[tokio::test]
    async fn empty_gallery_always_rejects() {
        let f = fixture(vec![], dim4());
        let (_obs, mut rx) = f.hub.connect(4);

        let result = f.engine.recognize(&[1.0, 0.0, 0.0, 0.0], &actor()).await.unwrap();
        assert_eq!(result.identity_id, None);
        assert_eq!(result.method, MatchMethod::None);
        assert_eq!(result.score, 0.0);
        assert!(!result.newly_logged);

        assert!(f.ledger.is_empty());
        assert!(rx.try_recv().is_err(), "no broadcast on rejection");
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_before_any_side_effect() {
        let f = fixture(vec![identity("a", &[&[1.0, 0.0, 0.0, 0.0]])], dim4());

        let err = f.engine.recognize(&[1.0, 0.0], &actor()).await.unwrap_err();
        assert!(matches!(
            err,
            RecognizeError::DimensionMismatch {
                expected: 4,
                got: 2
            }
        ));
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn dissimilar_query_rejects_with_diagnostic_score() {
        let f = fixture(vec![identity("a", &[&[1.0, 0.0, 0.0, 0.0]])], dim4());

        let result = f.engine.recognize(&[0.0, 1.0, 0.0, 0.0], &actor()).await.unwrap();
        assert_eq!(result.identity_id, None);
        assert_eq!(result.method, MatchMethod::None);
        // Orthogonal unit vectors: cosine 0 (no candidate), distance √2.
        let expected = crate::metric::distance_to_score(2f32.sqrt());
        assert!((result.score - expected).abs() < 1e-5);
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn close_small_vectors_are_rescued_by_euclidean() {
        // Orthogonal (cosine 0) but only 0.14 apart: euclidean accepts.
        let f = fixture(vec![identity("a", &[&[0.1, 0.0, 0.0, 0.0]])], dim4());

        let result = f.engine.recognize(&[0.0, 0.1, 0.0, 0.0], &actor()).await.unwrap();
        assert_eq!(result.identity_id.as_deref(), Some("a"));
        assert_eq!(result.method, MatchMethod::Euclidean);
        assert!(result.newly_logged);
        assert_eq!(f.ledger.records()[0].method, MatchMethod::Euclidean);
    }

    #[tokio::test]
    async fn best_identity_wins_over_earlier_weaker_one() {
        let f = fixture(
            vec![
                identity("weak", &[&[0.8, 0.6, 0.0, 0.0]]),
                identity("strong", &[&[0.2, 0.4, 0.1, 0.8]]),
            ],
            dim4(),
        );

        let result = f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(result.identity_id.as_deref(), Some("strong"));
    }

    #[tokio::test]
    async fn best_embedding_counts_across_multiple_per_identity() {
        let f = fixture(
            vec![identity("a", &[&[0.0, 1.0, 0.0, 0.0], &[0.2, 0.4, 0.1, 0.8]])],
            dim4(),
        );

        let result = f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(result.identity_id.as_deref(), Some("a"));
        assert!((result.score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn foreign_dimension_embeddings_are_skipped_not_fatal() {
        let mut bad = identity("a", &[&[0.2, 0.4, 0.1, 0.8]]);
        bad.embeddings.push(Embedding {
            vector: vec![1.0, 0.0],
            filename: "corrupt.jpg".into(),
            uploaded_at: Utc::now(),
        });
        let f = fixture(vec![bad], dim4());

        let result = f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(result.identity_id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn repeat_match_inside_window_is_suppressed_but_still_reported() {
        let f = fixture(vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])], dim4());
        let (_obs, mut rx) = f.hub.connect(4);
        let query = [0.2, 0.4, 0.1, 0.8];

        let first = f.engine.recognize(&query, &actor()).await.unwrap();
        assert!(first.newly_logged);

        let second = f.engine.recognize(&query, &actor()).await.unwrap();
        assert!(!second.newly_logged);
        assert_eq!(second.identity_id.as_deref(), Some("a"));
        assert!((second.score - 1.0).abs() < 1e-5, "score still reported");

        assert_eq!(f.ledger.len(), 1, "exactly one ledger append");
        assert!(rx.try_recv().is_ok(), "first match broadcast");
        assert!(rx.try_recv().is_err(), "suppressed match not broadcast");
    }

    #[tokio::test]
    async fn matches_spaced_past_the_window_both_log() {
        let config = RecognizeConfig {
            dim: 4,
            cooldown: Duration::from_millis(20),
            ..RecognizeConfig::default()
        };
        let f = fixture(vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])], config);
        let query = [0.2, 0.4, 0.1, 0.8];

        assert!(f.engine.recognize(&query, &actor()).await.unwrap().newly_logged);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(f.engine.recognize(&query, &actor()).await.unwrap().newly_logged);

        assert_eq!(f.ledger.len(), 2);
    }

    #[tokio::test]
    async fn accepted_match_broadcasts_the_derived_event() {
        let f = fixture(vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])], dim4());
        let (_obs, mut rx) = f.hub.connect(4);

        f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.identity_id, "a");
        assert_eq!(event.identity_name, "name-a");
        assert_eq!(event.facility.as_deref(), Some("north-wing"));
        assert_eq!(event.actor_name, "J. Keller");
        assert_eq!(event.method, "cosine");
    }

    #[tokio::test]
    async fn removal_from_gallery_takes_effect_next_scan() {
        let f = fixture(vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])], dim4());
        f.gallery.remove("a");

        let result = f.engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(result.identity_id, None);
    }

    #[tokio::test]
    async fn concurrent_same_identity_logs_exactly_once() {
        let f = fixture(vec![identity("a", &[&[0.2, 0.4, 0.1, 0.8]])], dim4());
        let engine = Arc::new(f.engine);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap()
            }));
        }

        let mut logged = 0;
        for handle in handles {
            if handle.await.unwrap().newly_logged {
                logged += 1;
            }
        }
        assert_eq!(logged, 1);
        assert_eq!(f.ledger.len(), 1);
    }

    struct FailingGallery;

    #[async_trait]
    impl Gallery for FailingGallery {
        async fn scan(&self) -> Result<Vec<Identity>, StoreError> {
            Err(StoreError::Backend("gallery offline".into()))
        }
    }

    #[tokio::test]
    async fn gallery_failure_surfaces_as_gallery_error() {
        let engine = Recognizer::new(
            Arc::new(FailingGallery),
            Arc::new(MemoryLedger::new()),
            Arc::new(ActivityHub::new()),
            dim4(),
        );

        let err = engine.recognize(&[1.0, 0.0, 0.0, 0.0], &actor()).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Gallery(_)));
    }

    struct FailingLedger;

    #[async_trait]
    impl MatchLedger for FailingLedger {
        async fn append(&self, _record: &MatchRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk full".into()))
        }
    }

    #[tokio::test]
    async fn ledger_failure_surfaces_and_cooldown_stands() {
        let gallery = Arc::new(MemoryGallery::new());
        gallery.enroll(identity("a", &[&[0.2, 0.4, 0.1, 0.8]]));
        let engine = Recognizer::new(
            gallery,
            Arc::new(FailingLedger),
            Arc::new(ActivityHub::new()),
            dim4(),
        );

        let err = engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Ledger(_)));

        // The window started despite the failed append: an immediate retry
        // reports the match but is suppressed from logging again.
        let retry = engine.recognize(&[0.2, 0.4, 0.1, 0.8], &actor()).await.unwrap();
        assert_eq!(retry.identity_id.as_deref(), Some("a"));
        assert!(!retry.newly_logged);
    }
}

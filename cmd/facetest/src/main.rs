//! facetest - exercise tool for the facegate recognition engine.
//!
//! Enrolls synthetic identities, fires known-face, repeat and stranger
//! queries, and prints the recognition results alongside the live activity
//! stream a connected observer sees.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use facegate_activity::ActivityHub;
use facegate_extract::{ExtractError, FaceEmbedder};
use facegate_recognize::{
    Actor, Embedding, Gallery, Identity, MatchLedger, MemoryGallery, MemoryLedger,
    RecognizeConfig, Recognizer,
};

/// Exercise the facegate recognition engine with synthetic faces.
#[derive(Parser, Debug)]
#[command(name = "facetest")]
#[command(about = "Exercise the facegate recognition engine with synthetic faces")]
struct Args {
    /// Number of identities to enroll
    #[arg(short, long, default_value_t = 25)]
    identities: usize,

    /// Embedding dimension
    #[arg(short, long, default_value_t = 512)]
    dim: usize,

    /// Number of known-face queries to fire
    #[arg(short, long, default_value_t = 5)]
    queries: usize,

    /// Cooldown window in seconds
    #[arg(long, default_value_t = 30)]
    cooldown_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn random_unit_vec(dim: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dim);
    let mut state = seed;
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        v.push(((state >> 33) as f32) / (u32::MAX as f32) - 0.5);
    }
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let s = (1.0 / norm) as f32;
        for x in &mut v {
            *x *= s;
        }
    }
    v
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Deterministic embedder: the vector is derived from a hash of the image
/// bytes, so the same "image" always yields the same embedding and two
/// different images yield unrelated ones.
struct SyntheticEmbedder {
    dim: usize,
}

#[async_trait::async_trait]
impl FaceEmbedder for SyntheticEmbedder {
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError> {
        if image.is_empty() {
            return Err(ExtractError::NoFaceDetected);
        }
        Ok(random_unit_vec(self.dim, fnv1a(image)))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    let embedder = SyntheticEmbedder { dim: args.dim };

    let gallery = Arc::new(MemoryGallery::new());
    for i in 0..args.identities {
        let filename = format!("face-{i:03}.jpg");
        let vector = embedder.extract(filename.as_bytes()).await?;
        gallery.enroll(Identity {
            id: format!("person-{i:03}"),
            name: format!("Person {i:03}"),
            facility: Some("demo-site".into()),
            embeddings: vec![Embedding {
                vector,
                filename,
                uploaded_at: Utc::now(),
            }],
        });
    }
    println!(
        "enrolled {} identities at dimension {}",
        gallery.len(),
        args.dim
    );

    let ledger = Arc::new(MemoryLedger::new());
    let hub = Arc::new(ActivityHub::new());
    let engine = Recognizer::new(
        Arc::clone(&gallery) as Arc<dyn Gallery>,
        Arc::clone(&ledger) as Arc<dyn MatchLedger>,
        Arc::clone(&hub),
        RecognizeConfig {
            dim: args.dim,
            cooldown: Duration::from_secs(args.cooldown_secs),
            ..RecognizeConfig::default()
        },
    );

    // A live observer printing the activity stream as a transport would.
    let (observer, mut rx) = hub.connect(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!(
                "  [activity] {} seen by {} ({} {:.3})",
                event.identity_name, event.actor_name, event.method, event.score
            );
        }
    });

    let actor = Actor {
        id: "tester-1".into(),
        name: "facetest".into(),
    };

    for q in 0..args.queries {
        let i = q % args.identities;
        let filename = format!("face-{i:03}.jpg");
        let embedding = embedder.extract(filename.as_bytes()).await?;

        let hit = engine.recognize(&embedding, &actor).await?;
        println!(
            "query {q}: {filename} -> {} ({}, score {:.3}, newly_logged {})",
            hit.name.as_deref().unwrap_or("<none>"),
            hit.method,
            hit.score,
            hit.newly_logged
        );

        // Fire again immediately: same identity, inside the cooldown window.
        let repeat = engine.recognize(&embedding, &actor).await?;
        println!("         repeat -> newly_logged {}", repeat.newly_logged);
    }

    // A face nobody enrolled.
    let stranger = embedder.extract(b"stranger-cam-frame").await?;
    let miss = engine.recognize(&stranger, &actor).await?;
    println!(
        "stranger -> method {}, score {:.3}",
        miss.method, miss.score
    );

    // Let the observer drain before summarizing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    hub.unregister(observer);
    printer.abort();

    println!("\nrecent ledger entries:");
    for record in ledger.recent(10) {
        println!(
            "  {} score {:.3} via {} at {}",
            record.identity_id, record.score, record.method, record.recognized_at
        );
    }

    Ok(())
}

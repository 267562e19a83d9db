//! AI enrichment backfill.
//!
//! Candidates are processed in fixed-size batches. Every call in a batch
//! runs at once, results are written when the batch is done, and the runner
//! sleeps a flat delay before the next batch. A failed photo is logged and
//! counted; it is not retried in the same run.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::EnrichmentConfig;
use crate::db::{Database, EnrichmentCandidate};
use crate::vision::{PhotoAnalysis, VisionClient, VisionError};

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub limit: Option<usize>,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub dry_run: bool,
}

impl EnrichOptions {
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            limit: config.limit,
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub candidates: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Left untouched because of cancellation or a dry run.
    pub skipped: usize,
    /// Failures that were HTTP 429 responses.
    pub rate_limited: usize,
    pub total_cost: f64,
    pub elapsed_secs: f64,
    pub cancelled: bool,
    pub dry_run: bool,
}

/// List what a run would enrich, without a provider.
pub fn preview_enrichment(db: &Database, options: &EnrichOptions) -> Result<(Vec<EnrichmentCandidate>, EnrichmentReport)> {
    let started = Instant::now();
    let candidates = db.photos_needing_enrichment(options.limit)?;
    for candidate in &candidates {
        info!(
            image_key = %candidate.image_key,
            album = %candidate.album_name,
            "Would enrich"
        );
    }
    let report = EnrichmentReport {
        candidates: candidates.len(),
        skipped: candidates.len(),
        dry_run: true,
        elapsed_secs: started.elapsed().as_secs_f64(),
        ..Default::default()
    };
    Ok((candidates, report))
}

/// Enrich every photo that has not been enriched yet, up to `limit`.
///
/// `cancel` is checked before each batch; a batch already in flight always
/// finishes and is written.
pub fn run_enrichment(
    db: &Database,
    client: &VisionClient,
    options: &EnrichOptions,
    cancel: &AtomicBool,
) -> Result<EnrichmentReport> {
    if options.dry_run {
        return preview_enrichment(db, options).map(|(_, report)| report);
    }

    let started = Instant::now();
    let candidates = db.photos_needing_enrichment(options.limit)?;
    let batch_size = options.batch_size.max(1);

    let mut report = EnrichmentReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    if candidates.is_empty() {
        info!("No photos need enrichment");
        return Ok(report);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(batch_size.min(candidates.len()))
        .thread_name(|i| format!("enrich-{}", i))
        .build()
        .context("Failed to build enrichment thread pool")?;

    let batches = candidates.len().div_ceil(batch_size);
    info!(
        candidates = candidates.len(),
        batches,
        batch_size,
        provider = client.provider_name(),
        model = client.model(),
        "Starting enrichment"
    );

    for (index, batch) in candidates.chunks(batch_size).enumerate() {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            report.skipped = candidates.len() - report.attempted;
            warn!(skipped = report.skipped, "Enrichment cancelled");
            break;
        }

        let results: Vec<(&EnrichmentCandidate, Result<PhotoAnalysis, VisionError>)> = pool.install(|| {
            batch
                .par_iter()
                .map(|candidate| (candidate, client.analyze_photo(candidate)))
                .collect()
        });

        for (candidate, result) in results {
            report.attempted += 1;
            match result {
                Ok(analysis) => {
                    match db.save_enrichment(
                        &candidate.image_key,
                        &analysis.enrichment,
                        client.provider_name(),
                        Some(analysis.cost),
                    ) {
                        Ok(()) => {
                            report.succeeded += 1;
                            report.total_cost += analysis.cost;
                            debug!(
                                image_key = %candidate.image_key,
                                input_tokens = analysis.usage.input_tokens,
                                output_tokens = analysis.usage.output_tokens,
                                cost = analysis.cost,
                                "Enriched photo"
                            );
                        }
                        Err(e) => {
                            report.failed += 1;
                            error!(image_key = %candidate.image_key, error = %e, "Failed to store enrichment");
                        }
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    if e.is_rate_limited() {
                        report.rate_limited += 1;
                    }
                    warn!(image_key = %candidate.image_key, error = %e, "Enrichment failed");
                }
            }
        }

        info!(
            batch = index + 1,
            batches,
            succeeded = report.succeeded,
            failed = report.failed,
            cost = report.total_cost,
            "Batch complete"
        );

        if index + 1 < batches && !options.batch_delay.is_zero() {
            std::thread::sleep(options.batch_delay);
        }
    }

    if report.succeeded > 0 {
        db.refresh_albums_summary()?;
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        total_cost = report.total_cost,
        elapsed_secs = report.elapsed_secs,
        "Enrichment finished"
    );
    Ok(report)
}

/// Flag set once Ctrl+C (or SIGTERM on unix) arrives.
///
/// The signal listener runs on a small current-thread runtime in its own
/// thread, so the blocking database and HTTP code never runs inside tokio.
pub fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    let thread_flag = Arc::clone(&flag);
    std::thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                shutdown_signal().await;
                warn!("Interrupt received, finishing the current batch");
                thread_flag.store(true, Ordering::SeqCst);
            });
        })
        .context("Failed to spawn signal thread")?;

    Ok(flag)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionConfig;
    use crate::db::test_support::temp_database;
    use crate::db::NewPhoto;
    use crate::vision::{ImagePayload, TokenUsage, VisionProvider, VisionResponse};
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    /// Answers with a fixed analysis; fails for prompts naming the "Broken"
    /// album, and can raise the cancel flag after its first call.
    struct MockProvider {
        calls: AtomicUsize,
        cancel_after_first: Option<Arc<AtomicBool>>,
        status_on_failure: u16,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                cancel_after_first: None,
                status_on_failure: 500,
            }
        }
    }

    impl VisionProvider for MockProvider {
        fn analyze(&self, _image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(flag) = &self.cancel_after_first {
                flag.store(true, Ordering::SeqCst);
            }
            if prompt.contains("Album: Broken") {
                return Err(VisionError::Status {
                    provider: "mock",
                    status: self.status_on_failure,
                    body: "nope".to_string(),
                });
            }
            Ok(VisionResponse {
                text: r#"{"sharpness": 8, "sport_type": "volleyball", "team_names": ["Lions", "Tigers"]}"#
                    .to_string(),
                usage: TokenUsage {
                    input_tokens: 1000,
                    output_tokens: 100,
                },
            })
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-vision"
        }
    }

    fn client(provider: Arc<MockProvider>) -> VisionClient {
        let config = VisionConfig {
            input_cost_per_mtok: 1.0,
            output_cost_per_mtok: 10.0,
            ..Default::default()
        };
        VisionClient::with_provider(provider, &config, None)
    }

    fn add_photo(db: &Database, dir: &Path, key: &str, album: &str, date: &str) {
        let path = dir.join(format!("{}.png", key));
        image::RgbImage::new(4, 4).save(&path).unwrap();
        db.upsert_photo(&NewPhoto {
            image_key: key.to_string(),
            album_key: album.to_lowercase(),
            album_name: album.to_string(),
            filename: format!("{}.png", key),
            local_path: Some(path.to_string_lossy().to_string()),
            photo_date: Some(date.to_string()),
            ..Default::default()
        })
        .unwrap();
    }

    fn options(batch_size: usize) -> EnrichOptions {
        EnrichOptions {
            limit: None,
            batch_size,
            batch_delay: Duration::ZERO,
            dry_run: false,
        }
    }

    fn seeded(count: usize, album: &str) -> (TempDir, TempDir, Database) {
        let (db_dir, db) = temp_database();
        let photos = tempfile::tempdir().unwrap();
        for i in 0..count {
            add_photo(&db, photos.path(), &format!("p{}", i), album, &format!("2024-10-05 10:{:02}:00", i));
        }
        (db_dir, photos, db)
    }

    #[test]
    fn test_enriches_all_candidates() {
        let (_d, _p, db) = seeded(5, "Finals");
        let provider = Arc::new(MockProvider::new());

        let report = run_enrichment(&db, &client(provider.clone()), &options(2), &AtomicBool::new(false)).unwrap();
        assert_eq!(report.candidates, 5);
        assert_eq!(report.attempted, 5);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.failed, 0);
        assert!(!report.cancelled);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
        // 1000 * 1 / 1e6 + 100 * 10 / 1e6 per photo
        assert!((report.total_cost - 5.0 * 0.002).abs() < 1e-9);

        let photo = db.get_photo("p0").unwrap().unwrap();
        assert_eq!(photo.sharpness, Some(8.0));
        assert_eq!(photo.ai_provider.as_deref(), Some("mock"));
        assert_eq!(photo.team_names, vec!["Lions", "Tigers"]);
        assert!(photo.enriched_at.is_some());

        let summary = db.albums_summary().unwrap();
        assert_eq!(summary[0].enriched_count, 5);

        // Nothing left on a second run
        let again = run_enrichment(&db, &client(provider.clone()), &options(2), &AtomicBool::new(false)).unwrap();
        assert_eq!(again.candidates, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_failures_are_counted_not_retried() {
        let (_d, photos, db) = seeded(2, "Finals");
        add_photo(&db, photos.path(), "bad1", "Broken", "2024-10-06 10:00:00");
        let provider = Arc::new(MockProvider {
            status_on_failure: 429,
            ..MockProvider::new()
        });

        let report = run_enrichment(&db, &client(provider.clone()), &options(10), &AtomicBool::new(false)).unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.rate_limited, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert!(db.get_photo("bad1").unwrap().unwrap().enriched_at.is_none());
    }

    #[test]
    fn test_missing_image_fails_without_provider_call() {
        let (_d, db) = temp_database();
        db.upsert_photo(&NewPhoto {
            image_key: "ghost".to_string(),
            album_key: "a".to_string(),
            album_name: "A".to_string(),
            filename: "ghost.jpg".to_string(),
            local_path: Some("/nowhere/ghost.jpg".to_string()),
            ..Default::default()
        })
        .unwrap();
        let provider = Arc::new(MockProvider::new());

        let report = run_enrichment(&db, &client(provider.clone()), &options(4), &AtomicBool::new(false)).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_limit_and_dry_run() {
        let (_d, _p, db) = seeded(4, "Finals");
        let provider = Arc::new(MockProvider::new());

        let dry = EnrichOptions {
            dry_run: true,
            ..options(2)
        };
        let report = run_enrichment(&db, &client(provider.clone()), &dry, &AtomicBool::new(false)).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.attempted, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let limited = EnrichOptions {
            limit: Some(3),
            ..options(2)
        };
        let report = run_enrichment(&db, &client(provider.clone()), &limited, &AtomicBool::new(false)).unwrap();
        assert_eq!(report.succeeded, 3);
        assert_eq!(db.photos_needing_enrichment(None).unwrap().len(), 1);
    }

    #[test]
    fn test_preview_needs_no_provider() {
        let (_d, _p, db) = seeded(3, "Finals");
        // No API key anywhere: a real provider could not be built
        let keyless = VisionConfig {
            api_key: None,
            api_key_env: Some("FOLIO_TEST_UNSET_KEY".to_string()),
            ..Default::default()
        };
        assert!(crate::vision::create_provider(&keyless).is_err());

        let (candidates, report) = preview_enrichment(&db, &EnrichOptions { limit: Some(2), ..options(2) }).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].image_key, "p2");
        assert!(report.dry_run);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.attempted, 0);
        assert_eq!(db.photos_needing_enrichment(None).unwrap().len(), 3);
    }

    #[test]
    fn test_cancel_before_start() {
        let (_d, _p, db) = seeded(3, "Finals");
        let provider = Arc::new(MockProvider::new());

        let report = run_enrichment(&db, &client(provider.clone()), &options(2), &AtomicBool::new(true)).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_lets_in_flight_batch_finish() {
        let (_d, _p, db) = seeded(5, "Finals");
        let cancel = Arc::new(AtomicBool::new(false));
        let provider = Arc::new(MockProvider {
            cancel_after_first: Some(Arc::clone(&cancel)),
            ..MockProvider::new()
        });

        let report = run_enrichment(&db, &client(provider.clone()), &options(2), &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(db.photos_needing_enrichment(None).unwrap().len(), 3);
    }

    #[test]
    fn test_options_from_config() {
        let opts = EnrichOptions::from_config(&EnrichmentConfig::default());
        assert_eq!(opts.batch_size, 50);
        assert_eq!(opts.batch_delay, Duration::from_millis(1000));
        assert!(!opts.dry_run);
    }
}

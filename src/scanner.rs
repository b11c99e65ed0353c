use crate::cert;
use crate::config::ScanConfig;
use crate::error::HandshakeError;
use crate::output::Emitter;
use crate::targets::{enumerate_targets, DialTarget};
use crate::tls::CertFetcher;
use crate::types::{CertificateRecord, ScanStats};
use anyhow::{Context, Result};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Live counters shared by the feeder and the workers.
#[derive(Clone, Debug, Default)]
pub struct ScanProgress {
    pub dispatched: Arc<AtomicU64>,
    pub succeeded: Arc<AtomicU64>,
    pub failed: Arc<AtomicU64>,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ScanStats {
        ScanStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Scan every host spec in `specs` on every configured port, dialing with a
/// real TLS client.
///
/// - Starts `config.concurrency` workers before the first target is queued.
/// - Each handshake is bounded by `config.timeout`.
/// - Per-target failures are counted and never abort the session.
pub async fn scan<W>(
    config: Arc<ScanConfig>,
    specs: Vec<String>,
    emitter: &Emitter<W>,
) -> Result<ScanStats>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let fetcher =
        Arc::new(CertFetcher::new(config.timeout).context("failed to build TLS connector")?);
    scan_with(config, specs, emitter, move |target| {
        let fetcher = Arc::clone(&fetcher);
        async move { fetcher.fetch(target).await }
    })
    .await
}

/// Variant of [`scan`] with the certificate fetch step supplied by the caller.
///
/// `fetch` returns the DER of the leaf certificate for one target.
pub async fn scan_with<W, F, Fut>(
    config: Arc<ScanConfig>,
    specs: Vec<String>,
    emitter: &Emitter<W>,
    fetch: F,
) -> Result<ScanStats>
where
    W: AsyncWrite + Unpin + Send + 'static,
    F: Fn(DialTarget) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, HandshakeError>> + Send + 'static,
{
    info!(
        specs = specs.len(),
        ports = config.ports.len(),
        concurrency = config.concurrency,
        "starting certificate scan"
    );

    let progress = ScanProgress::new();
    let fetch = Arc::new(fetch);
    let (tx, rx) = mpsc::channel::<DialTarget>(config.concurrency);
    let rx = Arc::new(Mutex::new(rx));

    // Workers must exist before the feeder blocks on a full channel.
    let mut set = JoinSet::new();
    for id in 0..config.concurrency {
        set.spawn(worker(
            id,
            Arc::clone(&rx),
            Arc::clone(&fetch),
            emitter.clone(),
            progress.clone(),
        ));
    }

    for target in enumerate_targets(specs, &config.ports) {
        if tx.send(target).await.is_err() {
            break;
        }
        progress.dispatched.fetch_add(1, Ordering::Relaxed);
    }
    // Closing the stream is the only stop signal the workers get.
    drop(tx);

    while let Some(res) = set.join_next().await {
        res.context("scan worker panicked")?;
    }

    let stats = progress.snapshot();
    info!(
        dispatched = stats.dispatched,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "certificate scan finished"
    );
    Ok(stats)
}

async fn worker<W, F, Fut>(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<DialTarget>>>,
    fetch: Arc<F>,
    emitter: Emitter<W>,
    progress: ScanProgress,
) where
    W: AsyncWrite + Unpin + Send,
    F: Fn(DialTarget) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, HandshakeError>>,
{
    loop {
        let next = rx.lock().await.recv().await;
        let Some(target) = next else { break };

        let outcome = fetch(target).await.and_then(|der| {
            cert::extract(&der).map_err(|e| HandshakeError::BadCertificate {
                target,
                reason: e.to_string(),
            })
        });

        match outcome {
            Ok(details) => {
                progress.succeeded.fetch_add(1, Ordering::Relaxed);
                let record = CertificateRecord::new(target, details);
                if let Err(e) = emitter.emit(&record).await {
                    debug!(
                        worker = id,
                        %target,
                        error = &e as &(dyn StdError + 'static),
                        "dropping record"
                    );
                }
            }
            Err(e) => {
                progress.failed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    worker = id,
                    error = &e as &(dyn StdError + 'static),
                    "certificate fetch failed"
                );
                if let Err(e) = emitter.emit_failure(target).await {
                    debug!(
                        worker = id,
                        %target,
                        error = &e as &(dyn StdError + 'static),
                        "dropping failure notice"
                    );
                }
            }
        }
    }
    debug!(worker = id, "target stream closed");
}

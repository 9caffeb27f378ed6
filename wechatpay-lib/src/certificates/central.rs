//! Live platform certificate set with background refresh.
//!
//! ## Lifecycle
//!
//! Construction loads whatever the store persisted and re-inserts it; a
//! blob that no longer parses aborts construction. Once built, the central
//! is active for good. [`CertificateCentral::start`] spawns the refresh
//! task, which refreshes immediately and then once per interval until
//! stopped.
//!
//! ## Refresh
//!
//! One cycle fetches the full listing, decrypts every entry with the API v3
//! key and upserts it. A bad entry is logged and skipped; a failed listing
//! call ends the cycle and the next tick tries again. Entries become
//! visible one by one as each `set` completes.
//!
//! Cycles never overlap: the scheduled loop and on-demand callers of
//! [`CertificateCentral::refresh_once`] queue on the same lock.
//!
//! Certificates are keyed by the serial inside the certificate, so a
//! bootstrap from persisted blobs and a refresh agree on every key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::{CertificateEntry, CertificateListResponse, CertificateStore, PlatformCertificate};
use crate::crypto::{ApiV3Key, AEAD_AES_256_GCM};
use crate::{Result, WechatPayError};

/// Source of the gateway's current certificate listing.
///
/// Implemented by the client's request orchestrator, which signs the call
/// but does not verify the response (there is nothing to verify it with
/// until the listing has been stored).
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Fetch the current certificate listing.
    async fn fetch_certificates(&self) -> Result<CertificateListResponse>;
}

/// Outcome of one refresh cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries decrypted and stored
    pub updated: usize,
    /// Entries skipped because they failed to decrypt, parse or store
    pub skipped: usize,
    /// Certificates held after the cycle
    pub total: usize,
}

/// Owner of the active platform certificate set.
pub struct CertificateCentral {
    store: Arc<dyn CertificateStore>,
    fetcher: Arc<dyn CertificateFetcher>,
    api_v3_key: ApiV3Key,
    refresh_lock: Mutex<()>,
}

impl CertificateCentral {
    /// Bootstrap from the store's persisted certificates.
    ///
    /// Any persisted blob that fails to parse or store is returned as an
    /// error; a corrupt persisted set never starts silently empty.
    pub async fn new(
        store: Arc<dyn CertificateStore>,
        fetcher: Arc<dyn CertificateFetcher>,
        api_v3_key: ApiV3Key,
    ) -> Result<Self> {
        let persisted = store.load().await?;
        let loaded = persisted.len();

        for raw in persisted {
            let cert = PlatformCertificate::parse(&raw)?;
            store.set(cert.serial_no(), &raw).await?;
        }

        tracing::info!(loaded, "platform certificates bootstrapped from store");

        Ok(Self {
            store,
            fetcher,
            api_v3_key,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Look up the certificate for a serial number.
    ///
    /// A miss is not followed by a refresh, so forged serials cannot drive
    /// extra listing calls.
    pub async fn get_cert(&self, serial_no: &str) -> Result<Arc<PlatformCertificate>> {
        Ok(self.store.get(serial_no).await?)
    }

    /// Number of certificates held.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.count().await?)
    }

    /// Run a single refresh cycle.
    ///
    /// Only a failure of the listing call itself (or of the final count) is
    /// returned as an error; per-entry failures are counted in the report.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_once(&self) -> Result<RefreshReport> {
        let _cycle = self.refresh_lock.lock().await;
        tracing::debug!("refreshing platform certificates");

        let listing = self.fetcher.fetch_certificates().await?;
        let mut report = RefreshReport::default();

        for entry in &listing.data {
            match self.store_entry(entry).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(
                        serial_no = %entry.serial_no,
                        error = %e,
                        "skipping platform certificate"
                    );
                }
            }
        }

        report.total = self.store.count().await?;
        tracing::info!(
            updated = report.updated,
            skipped = report.skipped,
            total = report.total,
            "platform certificates refreshed"
        );
        Ok(report)
    }

    async fn store_entry(&self, entry: &CertificateEntry) -> Result<()> {
        let sealed = &entry.encrypt_certificate;
        if sealed.algorithm != AEAD_AES_256_GCM {
            return Err(WechatPayError::Decryption(format!(
                "unsupported algorithm {}",
                sealed.algorithm
            )));
        }

        let raw = self
            .api_v3_key
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.associated_data)?;
        let cert = PlatformCertificate::parse(&raw)?;

        let serial_no = cert.serial_no();
        if !entry.serial_no.is_empty() && !entry.serial_no.eq_ignore_ascii_case(serial_no) {
            tracing::warn!(
                listed = %entry.serial_no,
                parsed = %cert.serial_no(),
                "listed serial differs from certificate serial"
            );
        }
        if cert.is_expired_at(chrono::Utc::now().timestamp()) {
            tracing::warn!(
                serial_no = %serial_no,
                not_after = cert.not_after(),
                "storing platform certificate past its validity window"
            );
        }

        self.store.set(serial_no, &raw).await?;
        Ok(())
    }

    /// Spawn the periodic refresh task.
    ///
    /// The first cycle runs immediately. Must be called inside a Tokio
    /// runtime.
    pub fn start(self: &Arc<Self>, interval: Duration) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let central = Arc::clone(self);
        let task = tokio::spawn(async move { central.run(interval, shutdown_rx).await });

        RefreshHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means the owner is gone.
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("certificate refresh loop stopped");
                        return;
                    }
                }

                _ = ticker.tick() => {
                    if let Err(e) = self.refresh_once().await {
                        tracing::warn!(error = %e, "certificate listing failed, will retry on next tick");
                    }
                }
            }
        }
    }
}

/// Handle to a running refresh task.
///
/// Dropping the handle signals the task to stop after any in-flight cycle.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "certificate refresh task ended abnormally");
            }
        }
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::{EncryptedCertificate, InMemoryStore, StoreResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const KEY: &[u8] = b"a7cde1ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const CERT_1: &str = include_str!("../../tests/fixtures/platform_cert_1.pem");
    const CERT_2: &str = include_str!("../../tests/fixtures/platform_cert_2.pem");
    const CERT_1_REISSUED: &str =
        include_str!("../../tests/fixtures/platform_cert_1_reissued.pem");
    const SERIAL_1: &str = "5157F09EFDC096DE15EBE81A47057A7232F1B8E1";
    const SERIAL_2: &str = "3775B6A45ACD588826D15E583A95F5DD2FBD7A8D";

    fn api_key() -> ApiV3Key {
        ApiV3Key::new(KEY.to_vec()).unwrap()
    }

    fn entry(serial_no: &str, pem: &str) -> CertificateEntry {
        let nonce = "4de73afd28b6";
        CertificateEntry {
            serial_no: serial_no.to_string(),
            effective_time: String::new(),
            expire_time: String::new(),
            encrypt_certificate: EncryptedCertificate {
                algorithm: AEAD_AES_256_GCM.to_string(),
                nonce: nonce.to_string(),
                associated_data: "certificate".to_string(),
                ciphertext: api_key()
                    .encrypt(pem.as_bytes(), nonce, "certificate")
                    .unwrap(),
            },
        }
    }

    /// Serves whatever listing the test last installed.
    #[derive(Default)]
    struct ListingFetcher {
        listing: Mutex<Option<CertificateListResponse>>,
        calls: AtomicUsize,
    }

    impl ListingFetcher {
        fn serve(&self, entries: Vec<CertificateEntry>) {
            *self.listing.lock().unwrap() = Some(CertificateListResponse { data: entries });
        }
    }

    #[async_trait]
    impl CertificateFetcher for ListingFetcher {
        async fn fetch_certificates(&self) -> Result<CertificateListResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.listing
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| WechatPayError::Transport("listing unavailable".into()))
        }
    }

    /// Store whose `load` hands back fixed blobs.
    struct PersistedStore {
        blobs: Vec<Vec<u8>>,
        inner: InMemoryStore,
    }

    #[async_trait]
    impl CertificateStore for PersistedStore {
        async fn load(&self) -> StoreResult<Vec<Vec<u8>>> {
            Ok(self.blobs.clone())
        }
        async fn get(&self, serial_no: &str) -> StoreResult<Arc<PlatformCertificate>> {
            self.inner.get(serial_no).await
        }
        async fn set(&self, serial_no: &str, raw: &[u8]) -> StoreResult<()> {
            self.inner.set(serial_no, raw).await
        }
        async fn count(&self) -> StoreResult<usize> {
            self.inner.count().await
        }
    }

    async fn central_with(fetcher: Arc<ListingFetcher>) -> CertificateCentral {
        CertificateCentral::new(Arc::new(InMemoryStore::new()), fetcher, api_key())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_loads_persisted_certificates() {
        let store = Arc::new(PersistedStore {
            blobs: vec![CERT_1.as_bytes().to_vec(), CERT_2.as_bytes().to_vec()],
            inner: InMemoryStore::new(),
        });
        let central = CertificateCentral::new(store, Arc::new(ListingFetcher::default()), api_key())
            .await
            .unwrap();

        assert_eq!(central.count().await.unwrap(), 2);
        assert_eq!(central.get_cert(SERIAL_2).await.unwrap().serial_no(), SERIAL_2);
    }

    #[tokio::test]
    async fn test_bootstrap_fails_on_corrupt_blob() {
        let store = Arc::new(PersistedStore {
            blobs: vec![CERT_1.as_bytes().to_vec(), b"corrupt".to_vec()],
            inner: InMemoryStore::new(),
        });
        let result =
            CertificateCentral::new(store, Arc::new(ListingFetcher::default()), api_key()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_adds_new_serial_and_keeps_existing() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;

        fetcher.serve(vec![entry(SERIAL_1, CERT_1)]);
        let report = central.refresh_once().await.unwrap();
        assert_eq!(report, RefreshReport { updated: 1, skipped: 0, total: 1 });
        let existing = central.get_cert(SERIAL_1).await.unwrap();

        fetcher.serve(vec![entry(SERIAL_1, CERT_1), entry(SERIAL_2, CERT_2)]);
        let report = central.refresh_once().await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(*central.get_cert(SERIAL_1).await.unwrap(), *existing);
    }

    #[tokio::test]
    async fn test_refresh_replaces_same_serial() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;

        fetcher.serve(vec![entry(SERIAL_1, CERT_1)]);
        central.refresh_once().await.unwrap();
        let before = central.get_cert(SERIAL_1).await.unwrap();

        fetcher.serve(vec![entry(SERIAL_1, CERT_1_REISSUED)]);
        let report = central.refresh_once().await.unwrap();
        let after = central.get_cert(SERIAL_1).await.unwrap();

        assert_eq!(report.total, 1);
        assert_ne!(before.public_key(), after.public_key());
        assert_eq!(after.raw(), CERT_1_REISSUED.as_bytes());
    }

    #[tokio::test]
    async fn test_bad_entry_is_skipped() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;

        let mut tampered = entry(SERIAL_1, CERT_1);
        tampered.encrypt_certificate.associated_data = "transaction".to_string();
        let mut not_a_cert = entry(SERIAL_1, "garbage");
        not_a_cert.serial_no = "0000".to_string();

        fetcher.serve(vec![tampered, not_a_cert, entry(SERIAL_2, CERT_2)]);
        let report = central.refresh_once().await.unwrap();

        assert_eq!(report, RefreshReport { updated: 1, skipped: 2, total: 1 });
        assert!(central.get_cert(SERIAL_1).await.is_err());
        assert!(central.get_cert(SERIAL_2).await.is_ok());
    }

    #[tokio::test]
    async fn test_lowercase_listed_serial_is_canonicalized() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;

        fetcher.serve(vec![entry(&SERIAL_1.to_lowercase(), CERT_1)]);
        central.refresh_once().await.unwrap();
        assert!(central.get_cert(SERIAL_1).await.is_ok());
    }

    #[tokio::test]
    async fn test_mismatched_listed_serial_keyed_by_certificate() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;

        fetcher.serve(vec![entry("DEADBEEF", CERT_1)]);
        central.refresh_once().await.unwrap();

        assert!(central.get_cert(SERIAL_1).await.is_ok());
        assert!(central.get_cert("DEADBEEF").await.is_err());
        assert_eq!(central.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_entry_missing_fields_is_skipped_alone() {
        let sealed = entry(SERIAL_2, CERT_2);
        let json = serde_json::json!({
            "data": [
                { "effective_time": "2023-12-31T08:00:00+08:00" },
                { "encrypt_certificate": sealed.encrypt_certificate }
            ]
        });
        let listing: CertificateListResponse = serde_json::from_value(json).unwrap();

        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;
        fetcher.serve(listing.data);

        let report = central.refresh_once().await.unwrap();
        assert_eq!(report, RefreshReport { updated: 1, skipped: 1, total: 1 });
        assert!(central.get_cert(SERIAL_2).await.is_ok());
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher).await;
        let err = central.refresh_once().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_miss_does_not_trigger_refresh() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = central_with(fetcher.clone()).await;
        assert!(central.get_cert("DEADBEEF").await.is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_runs_immediately_then_on_interval() {
        let fetcher = Arc::new(ListingFetcher::default());
        fetcher.serve(vec![entry(SERIAL_1, CERT_1)]);
        let central = Arc::new(central_with(fetcher.clone()).await);

        let handle = central.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(central.count().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        assert!(handle.is_running());
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_listing_failures() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = Arc::new(central_with(fetcher.clone()).await);

        let handle = central.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(central.count().await.unwrap(), 0);

        fetcher.serve(vec![entry(SERIAL_2, CERT_2)]);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(central.count().await.unwrap(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_loop() {
        let fetcher = Arc::new(ListingFetcher::default());
        let central = Arc::new(central_with(fetcher.clone()).await);

        let handle = central.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(Arc::strong_count(&central), 1);
    }

    /// Records how many cycles are inside the fetcher at once.
    #[derive(Default)]
    struct SlowFetcher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CertificateFetcher for SlowFetcher {
        async fn fetch_certificates(&self) -> Result<CertificateListResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(CertificateListResponse {
                data: vec![entry(SERIAL_1, CERT_1)],
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_demand_refresh_waits_for_scheduled_cycle() {
        let fetcher = Arc::new(SlowFetcher::default());
        let central = Arc::new(
            CertificateCentral::new(Arc::new(InMemoryStore::new()), fetcher.clone(), api_key())
                .await
                .unwrap(),
        );

        let handle = central.start(Duration::from_secs(12 * 60 * 60));
        tokio::task::yield_now().await;
        central.refresh_once().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);

        handle.stop().await;
    }
}

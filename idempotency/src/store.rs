//! Keyed at-most-once execution.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::IdempotencyConfig;
use crate::error::IdempotencyError;
use crate::hash::request_hash;
use crate::record::{IdempotencyRecord, Lease};
use crate::sink::IdempotencySink;

/// Runs a computation at most once per `(scope, key)` and replays its result.
pub struct IdempotencyStore {
    sink: Arc<dyn IdempotencySink>,
    config: IdempotencyConfig,
}

impl IdempotencyStore {
    pub fn new(sink: Arc<dyn IdempotencySink>, config: IdempotencyConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &IdempotencyConfig {
        &self.config
    }

    /// Run `f` unless `(scope, key)` already has a response for `body`.
    ///
    /// A key reused with a different body is a conflict. A key held by another
    /// caller is polled until it commits, its lease goes stale, or the wait
    /// timeout passes. If `f` fails the lease is released and the key may be
    /// retried.
    #[instrument(skip(self, body, f), fields(scope = %scope, key = %key))]
    pub async fn with_idempotency<B, T, E, F, Fut>(
        &self,
        scope: &str,
        key: &str,
        body: &B,
        f: F,
    ) -> Result<T, E>
    where
        B: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<IdempotencyError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let hash = request_hash(body)?;
        let deadline = Instant::now() + self.config.wait_timeout;

        loop {
            let lease = Lease::new(Utc::now());
            let record = IdempotencyRecord::pending(scope, key, &hash, lease);
            if self.sink.put_pending(record).await? {
                return self.run(scope, key, lease.token, f).await;
            }

            let Some(existing) = self.sink.get(scope, key).await? else {
                // released between the insert attempt and the read
                continue;
            };

            if existing.request_hash != hash {
                warn!("Idempotency key reused with a different body");
                return Err(IdempotencyError::Conflict {
                    scope: scope.to_string(),
                    key: key.to_string(),
                }
                .into());
            }

            if existing.is_committed() {
                let response = existing.response.unwrap_or(serde_json::Value::Null);
                debug!("Replaying committed response");
                return serde_json::from_value(response)
                    .map_err(|e| IdempotencyError::from(e).into());
            }

            let now = Utc::now();
            if existing.lease.is_stale(self.config.lease_span(), now) {
                let lease = Lease::new(now);
                if self
                    .sink
                    .reclaim(scope, key, existing.lease.locked_at, lease)
                    .await?
                {
                    warn!(locked_at = %existing.lease.locked_at, "Reclaimed stale lease");
                    return self.run(scope, key, lease.token, f).await;
                }
                continue;
            }

            if Instant::now() >= deadline {
                return Err(IdempotencyError::Timeout {
                    scope: scope.to_string(),
                    key: key.to_string(),
                }
                .into());
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Run `f` under the lease `token`, renewing it until `f` settles.
    async fn run<T, E, F, Fut>(&self, scope: &str, key: &str, token: Uuid, f: F) -> Result<T, E>
    where
        T: Serialize,
        E: From<IdempotencyError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let work = f();
        tokio::pin!(work);

        let period = (self.config.lease_ttl / 2).max(Duration::from_millis(1));
        let mut renewals = tokio::time::interval_at(Instant::now() + period, period);
        let outcome = loop {
            tokio::select! {
                outcome = &mut work => break outcome,
                _ = renewals.tick() => {
                    match self.sink.renew(scope, key, &token, Utc::now()).await {
                        Ok(true) => debug!("Lease renewed"),
                        Ok(false) => warn!("Lease lost while running"),
                        Err(e) => warn!(error = %e, "Lease renewal failed"),
                    }
                }
            }
        };

        match outcome {
            Ok(value) => {
                let response = serde_json::to_value(&value).map_err(IdempotencyError::from)?;
                if self.sink.commit(scope, key, &token, response).await? {
                    info!("Idempotent response committed");
                } else {
                    warn!("Lease lost before commit; response not stored");
                }
                Ok(value)
            }
            Err(e) => {
                match self.sink.release(scope, key, &token).await {
                    Ok(_) => debug!("Lease released after failure"),
                    Err(release_err) => warn!(error = %release_err, "Lease release failed"),
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use futures::future::join_all;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Idempotency(IdempotencyError),
        Failed,
    }

    impl From<IdempotencyError> for TestError {
        fn from(e: IdempotencyError) -> Self {
            TestError::Idempotency(e)
        }
    }

    fn store_with(sink: Arc<MemorySink>, config: IdempotencyConfig) -> IdempotencyStore {
        IdempotencyStore::new(sink, config)
    }

    fn fast_config() -> IdempotencyConfig {
        IdempotencyConfig {
            lease_ttl: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_second_call_replays() {
        let store = store_with(Arc::new(MemorySink::new()), fast_config());
        let runs = AtomicUsize::new(0);
        let body = json!({"lane": "CN-US", "value": "100.00"});

        for _ in 0..2 {
            let total: Result<String, TestError> = store
                .with_idempotency("quotes", "k1", &body, || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok("1394.07".to_string())
                })
                .await;
            assert_eq!(total.unwrap(), "1394.07");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_run_once() {
        let store = Arc::new(store_with(Arc::new(MemorySink::new()), fast_config()));
        let runs = Arc::new(AtomicUsize::new(0));
        let body = json!({"items": 3});

        let calls = (0..8).map(|_| {
            let store = store.clone();
            let runs = runs.clone();
            let body = body.clone();
            tokio::spawn(async move {
                store
                    .with_idempotency("pools", "batch-7", &body, || async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        Ok::<_, TestError>(42u32)
                    })
                    .await
            })
        });

        for result in join_all(calls).await {
            assert_eq!(result.unwrap().unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_body_conflicts() {
        let store = store_with(Arc::new(MemorySink::new()), fast_config());
        let _: u32 = store
            .with_idempotency("quotes", "k1", &json!({"value": 1}), || async {
                Ok::<_, TestError>(1)
            })
            .await
            .unwrap();

        let err = store
            .with_idempotency("quotes", "k1", &json!({"value": 2}), || async {
                Ok::<u32, TestError>(2)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::Idempotency(IdempotencyError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_releases_lease() {
        let sink = Arc::new(MemorySink::new());
        let store = store_with(sink.clone(), fast_config());
        let body = json!({"value": 1});

        let failed = store
            .with_idempotency("quotes", "k1", &body, || async { Err::<u32, _>(TestError::Failed) })
            .await;
        assert_eq!(failed, Err(TestError::Failed));
        assert!(sink.is_empty());

        let retried = store
            .with_idempotency("quotes", "k1", &body, || async { Ok::<u32, TestError>(7) })
            .await;
        assert_eq!(retried, Ok(7));
    }

    #[tokio::test]
    async fn test_stale_lease_is_reclaimed() {
        let sink = Arc::new(MemorySink::new());
        let body = json!({"value": 1});
        let abandoned = Lease::new(Utc::now() - chrono::Duration::minutes(5));
        sink.put_pending(IdempotencyRecord::pending(
            "quotes",
            "k1",
            &request_hash(&body).unwrap(),
            abandoned,
        ))
        .await
        .unwrap();

        let store = store_with(sink.clone(), fast_config());
        let value = store
            .with_idempotency("quotes", "k1", &body, || async { Ok::<u32, TestError>(9) })
            .await;
        assert_eq!(value, Ok(9));

        let row = sink.get("quotes", "k1").await.unwrap().unwrap();
        assert!(row.is_committed());
        assert_ne!(row.lease.token, abandoned.token);
    }

    #[tokio::test]
    async fn test_live_lease_times_out() {
        let sink = Arc::new(MemorySink::new());
        let body = json!({"value": 1});
        sink.put_pending(IdempotencyRecord::pending(
            "quotes",
            "k1",
            &request_hash(&body).unwrap(),
            Lease::new(Utc::now()),
        ))
        .await
        .unwrap();

        let config = IdempotencyConfig {
            wait_timeout: Duration::from_millis(30),
            ..fast_config()
        };
        let store = store_with(sink, config);
        let err = store
            .with_idempotency("quotes", "k1", &body, || async { Ok::<u32, TestError>(1) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::Idempotency(IdempotencyError::Timeout { .. })
        ));
    }
}

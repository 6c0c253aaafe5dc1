//! Result cache keyed by simulation count.
//!
//! Each key owns a [`tokio::sync::OnceCell`]. The first request for a key
//! runs the computation; concurrent requests for the same key wait on the
//! same cell and receive the same `Arc`. Failures leave the cell empty so
//! the next request retries. Computations run in a detached task, so a
//! request that times out or disconnects does not lose the work.

pub mod artifact;
pub mod policy;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, ConfigError};
use crate::error::{AepError, Result};
use crate::sim::SimulationResult;

pub use artifact::ArtifactStore;
pub use policy::CachePolicy;

/// Produces a simulation result for a count. Called from a blocking thread.
pub trait SimulationBackend: Send + Sync + 'static {
    fn compute(&self, num_simulations: usize) -> Result<SimulationResult>;
}

impl<F> SimulationBackend for F
where
    F: Fn(usize) -> Result<SimulationResult> + Send + Sync + 'static,
{
    fn compute(&self, num_simulations: usize) -> Result<SimulationResult> {
        self(num_simulations)
    }
}

/// Where a cached entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    Computed,
    Artifact,
}

/// A cached, immutable result.
#[derive(Debug)]
pub struct CacheEntry {
    pub result: SimulationResult,
    pub created_at: DateTime<Utc>,
    pub origin: EntryOrigin,
}

impl CacheEntry {
    fn new(result: SimulationResult, origin: EntryOrigin) -> Self {
        Self {
            result,
            created_at: Utc::now(),
            origin,
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheOutcome {
    Ready(Arc<CacheEntry>),
    /// Precomputed policy only: no artifact exists for this count.
    NotAvailable { num_simulations: usize },
}

/// Listing row for the cache status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub num_simulations: usize,
    pub origin: EntryOrigin,
    pub created_at: DateTime<Utc>,
    pub mean_aep_gwh: f64,
}

type Slot = Arc<OnceCell<Arc<CacheEntry>>>;

#[derive(Default)]
struct Slots {
    map: HashMap<usize, (Slot, u64)>,
    tick: u64,
}

/// Why an artifact fill left the cell empty.
enum ArtifactFill {
    Missing,
    Failed(AepError),
}

/// Simulation results keyed by count, populated according to a [`CachePolicy`].
pub struct ResultCache {
    policy: CachePolicy,
    backend: Arc<dyn SimulationBackend>,
    artifacts: Option<ArtifactStore>,
    timeout: Option<Duration>,
    slots: Mutex<Slots>,
}

impl ResultCache {
    pub fn new(policy: CachePolicy, backend: Arc<dyn SimulationBackend>) -> Self {
        Self {
            policy,
            backend,
            artifacts: None,
            timeout: None,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// Reads artifacts from `store` before computing.
    pub fn with_artifacts(mut self, store: ArtifactStore) -> Self {
        self.artifacts = Some(store);
        self
    }

    /// Bounds how long a request waits for a computation. The computation
    /// itself keeps running and populates the cache when done.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a cache from the `[cache]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the policy cannot be built.
    pub fn from_config(
        cfg: &CacheConfig,
        backend: Arc<dyn SimulationBackend>,
    ) -> std::result::Result<Self, ConfigError> {
        let policy = CachePolicy::from_config(cfg)?;
        let mut cache = Self::new(policy, backend);
        if matches!(cache.policy, CachePolicy::Precomputed { .. }) {
            cache = cache.with_artifacts(ArtifactStore::new(&cfg.artifact_dir));
        }
        if let Some(secs) = cfg.compute_timeout_secs {
            cache = cache.with_timeout(Duration::from_secs(secs));
        }
        Ok(cache)
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Maps a raw `num_sim` query value to the count to serve.
    ///
    /// # Errors
    ///
    /// See [`CachePolicy::resolve`].
    pub fn resolve(&self, requested: Option<&str>) -> Result<usize> {
        self.policy.resolve(requested)
    }

    /// Returns the cached result for `num_simulations`, populating it first
    /// if needed.
    ///
    /// Under the precomputed policy a missing artifact yields
    /// [`CacheOutcome::NotAvailable`] unless `compute_missing` is set.
    ///
    /// # Errors
    ///
    /// Propagates backend and artifact failures, and returns
    /// `AepError::Timeout` if a configured wait bound elapses. Nothing is
    /// cached on error.
    pub async fn get_or_compute(&self, num_simulations: usize) -> Result<CacheOutcome> {
        let key = self.policy.key_for(num_simulations);
        if key == 0 {
            return Err(AepError::InvalidSimulationCount(key));
        }

        let slot = self.slot(key);
        if let Some(entry) = slot.get() {
            debug!(num_simulations = key, "cache hit");
            return Ok(CacheOutcome::Ready(Arc::clone(entry)));
        }

        if let CachePolicy::Precomputed {
            compute_missing, ..
        } = &self.policy
        {
            if let Some(entry) = self.fill_from_artifact(&slot, key).await? {
                return Ok(CacheOutcome::Ready(entry));
            }
            if !compute_missing {
                debug!(num_simulations = key, "no artifact");
                return Ok(CacheOutcome::NotAvailable {
                    num_simulations: key,
                });
            }
        }

        self.compute_into(slot, key).await.map(CacheOutcome::Ready)
    }

    /// Populates entries the policy expects to have before serving.
    ///
    /// Single-slot computes its one count. Precomputed loads every artifact
    /// that exists and logs the ones that do not. On-demand does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first computation or artifact failure.
    pub async fn warm(&self) -> Result<()> {
        match &self.policy {
            CachePolicy::SingleSlot { num_simulations } => {
                self.get_or_compute(*num_simulations).await?;
                info!(num_simulations, "single slot ready");
            }
            CachePolicy::Precomputed { allowed, .. } => {
                for &n in allowed {
                    let slot = self.slot(n);
                    match self.fill_from_artifact(&slot, n).await? {
                        Some(_) => info!(num_simulations = n, "artifact cached"),
                        None => warn!(num_simulations = n, "artifact missing"),
                    }
                }
            }
            CachePolicy::OnDemand { .. } => {}
        }
        Ok(())
    }

    /// Populated entries, ordered by count.
    pub fn entries(&self) -> Vec<EntrySummary> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<EntrySummary> = slots
            .map
            .iter()
            .filter_map(|(&n, (slot, _))| {
                slot.get().map(|entry| EntrySummary {
                    num_simulations: n,
                    origin: entry.origin,
                    created_at: entry.created_at,
                    mean_aep_gwh: entry.result.mean_aep_gwh,
                })
            })
            .collect();
        out.sort_by_key(|e| e.num_simulations);
        out
    }

    /// Returns the cell for `key`, creating it and evicting if over capacity.
    fn slot(&self, key: usize) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.tick += 1;
        let tick = slots.tick;

        if let Some((slot, used)) = slots.map.get_mut(&key) {
            *used = tick;
            return Arc::clone(slot);
        }

        let slot: Slot = Arc::new(OnceCell::new());
        slots.map.insert(key, (Arc::clone(&slot), tick));

        if let Some(capacity) = self.policy.capacity() {
            while slots.map.len() > capacity {
                // In-flight cells are never evicted; a second cell for the
                // same key would start a duplicate computation.
                let victim = slots
                    .map
                    .iter()
                    .filter(|&(&n, (cell, _))| {
                        n != key && (cell.initialized() || Arc::strong_count(cell) == 1)
                    })
                    .min_by_key(|(_, (_, used))| *used)
                    .map(|(&n, _)| n);
                let Some(victim) = victim else { break };
                slots.map.remove(&victim);
                debug!(num_simulations = victim, "cache entry evicted");
            }
        }
        slot
    }

    async fn fill_from_artifact(&self, slot: &Slot, key: usize) -> Result<Option<Arc<CacheEntry>>> {
        let Some(store) = self.artifacts.clone() else {
            return Ok(None);
        };
        let filled = slot
            .get_or_try_init(|| async move {
                let loaded = tokio::task::spawn_blocking(move || store.load(key))
                    .await
                    .map_err(|e| ArtifactFill::Failed(AepError::Task(e.to_string())))?;
                match loaded {
                    Ok(Some(result)) => Ok::<_, ArtifactFill>(Arc::new(CacheEntry::new(
                        result,
                        EntryOrigin::Artifact,
                    ))),
                    Ok(None) => Err(ArtifactFill::Missing),
                    Err(e) => Err(ArtifactFill::Failed(e)),
                }
            })
            .await;
        match filled {
            Ok(entry) => Ok(Some(Arc::clone(entry))),
            Err(ArtifactFill::Missing) => Ok(None),
            Err(ArtifactFill::Failed(e)) => Err(e),
        }
    }

    async fn compute_into(&self, slot: Slot, key: usize) -> Result<Arc<CacheEntry>> {
        let backend = Arc::clone(&self.backend);
        let task = tokio::spawn(async move {
            slot.get_or_try_init(|| async move {
                info!(num_simulations = key, "cache miss, computing");
                let result = tokio::task::spawn_blocking(move || backend.compute(key))
                    .await
                    .map_err(|e| AepError::Task(e.to_string()))??;
                Ok::<_, AepError>(Arc::new(CacheEntry::new(result, EntryOrigin::Computed)))
            })
            .await
            .cloned()
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        num_simulations = key,
                        timeout_s = limit.as_secs(),
                        "request gave up waiting, computation continues"
                    );
                    return Err(AepError::Timeout {
                        num_simulations: key,
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => task.await,
        };
        joined.map_err(|e| AepError::Task(e.to_string()))?
    }
}

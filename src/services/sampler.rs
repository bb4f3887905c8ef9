// src/services/sampler.rs
//
// Resolution Sampler - draws a not-yet-used candidate from the pool and
// resolves it, retrying within a fixed bound.
//
// CRITICAL RULES:
// - An identifier is marked used the moment resolution is attempted,
//   success or failure; used identifiers are never drawn again this session
// - Avoid-set skips consume an attempt but do NOT mark the identifier used
// - Source-level failures are absorbed and logged; only exhausting the
//   attempt bound surfaces an error
// - A resolved artwork whose image URL string-equals the avoid URL is
//   rejected (string compare only; identical bytes behind different URLs
//   are not caught)

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Artwork, ArtworkId};
use crate::error::{AppError, AppResult};
use crate::services::pool_service::{IdentifierPool, PoolService};

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Draw/resolve attempts before giving up with PoolExhausted.
    pub max_attempts: usize,
    /// Fixed seed for the draw sequence; None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            seed: None,
        }
    }
}

/// The pool plus the used-set for its lifetime. Locked only for draws and
/// bookkeeping, never across resolution I/O, so the background filler and a
/// foreground swipe can sample concurrently.
#[derive(Debug, Default)]
pub struct SamplerState {
    pub pool: IdentifierPool,
    pub used: HashSet<ArtworkId>,
}

impl SamplerState {
    /// Install a freshly built pool and forget every attempted identifier.
    pub fn rebuild(&mut self, pool: IdentifierPool) {
        self.pool = pool;
        self.used.clear();
    }

    pub fn clear(&mut self) {
        self.pool = IdentifierPool::empty();
        self.used.clear();
    }
}

pub struct SamplerService {
    pool_service: Arc<PoolService>,
    config: SamplerConfig,
    rng: Mutex<SmallRng>,
}

impl SamplerService {
    pub fn new(pool_service: Arc<PoolService>) -> Self {
        Self::with_config(pool_service, SamplerConfig::default())
    }

    pub fn with_config(pool_service: Arc<PoolService>, config: SamplerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            pool_service,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Resolve one fresh artwork from the pool.
    ///
    /// `avoid_ids` excludes identifiers that are currently displayed or
    /// staged; `avoid_image_url` guards against two identifiers pointing at
    /// the same underlying image.
    pub async fn pick_next(
        &self,
        state: &Mutex<SamplerState>,
        avoid_ids: &HashSet<ArtworkId>,
        avoid_image_url: Option<&str>,
    ) -> AppResult<Artwork> {
        for _ in 0..self.config.max_attempts {
            let candidate = {
                let mut guard = state.lock().unwrap();
                if guard.pool.is_empty() {
                    return Err(AppError::PoolExhausted);
                }

                let remaining = guard
                    .pool
                    .ids()
                    .iter()
                    .any(|id| !guard.used.contains(id) && !avoid_ids.contains(id));
                if !remaining {
                    return Err(AppError::PoolExhausted);
                }

                let index = self.rng.lock().unwrap().gen_range(0..guard.pool.len());
                // Bounds hold: the pool is non-empty and immutable while locked
                let id = guard.pool.ids()[index].clone();
                if guard.used.contains(&id) || avoid_ids.contains(&id) {
                    continue;
                }

                guard.used.insert(id.clone());
                id
            };

            match self.pool_service.resolve_by_id(&candidate).await {
                Ok(artwork) => {
                    if let Some(avoid) = avoid_image_url {
                        if artwork.image_url == avoid {
                            debug!(
                                "sampler: '{}' resolved to the avoided image url, skipping",
                                candidate
                            );
                            continue;
                        }
                    }
                    return Ok(artwork);
                }
                Err(e) if e.is_absorbable() => {
                    warn!("sampler: resolving '{}' failed: {}", candidate, e);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::PoolExhausted)
    }
}

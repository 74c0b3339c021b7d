//! PostgreSQL pool for the location tables.
//!
//! Every request runs a handful of short statements (a cache lookup, at most
//! two inserts, a history append and prune), so a small pool is enough and
//! callers should fail fast rather than queue behind a saturated one.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use geofind_core::{Error, Result};

const MAX_CONNECTIONS_VAR: &str = "DB_MAX_CONNECTIONS";
const ACQUIRE_TIMEOUT_VAR: &str = "DB_ACQUIRE_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sizing of the location store pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a query waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT_SECS`; unset, zero, or
    /// unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: positive(MAX_CONNECTIONS_VAR, lookup(MAX_CONNECTIONS_VAR))
                .unwrap_or(defaults.max_connections),
            acquire_timeout: positive(ACQUIRE_TIMEOUT_VAR, lookup(ACQUIRE_TIMEOUT_VAR))
                .map(|secs| Duration::from_secs(secs.into()))
                .unwrap_or(defaults.acquire_timeout),
        }
    }
}

fn positive(name: &str, raw: Option<String>) -> Option<u32> {
    let raw = raw?;
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(
                subsystem = "db",
                component = "pool",
                var = name,
                value = %raw,
                "Ignoring invalid pool setting"
            );
            None
        }
    }
}

/// Connect to `database_url` with the given sizing.
pub async fn create_pool_with_config(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        max_connections = config.max_connections,
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Log how many connections are busy; warns when none is free.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;
    let busy = size.saturating_sub(idle);

    if size > 0 && idle == 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            busy,
            "Every pooled connection is in use"
        );
    } else {
        debug!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            pool_idle = idle,
            busy,
            "Pool usage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> PoolConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PoolConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_unset_vars_keep_defaults() {
        assert_eq!(config_from(&[]), PoolConfig::default());
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = config_from(&[
            ("DB_MAX_CONNECTIONS", "12"),
            ("DB_ACQUIRE_TIMEOUT_SECS", " 2 "),
        ]);
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_zero_or_garbage_is_ignored() {
        let config = config_from(&[
            ("DB_MAX_CONNECTIONS", "0"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "soon"),
        ]);
        assert_eq!(config, PoolConfig::default());
    }
}

//! # Governor configuration.
//!
//! Provides [`GovernorConfig`], the settings of one governed task class.
//!
//! ## Key layout
//! ```text
//! key_prefix = "{namespace}:governor:{name}"      (unless overridden)
//! slot key   = "{key_prefix}:{slot}"              slot in [0, max_concurrency)
//! ```
//!
//! ## Validation
//! [`GovernorConfig::validate`] runs at construction; invalid values are rejected with
//! [`ConfigError`] and never reach the admission race.

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration of one governed task class.
///
/// ## Field semantics
/// - `name`: task class name, part of the default key prefix
/// - `namespace`: environment namespace, part of the default key prefix
/// - `key_prefix`: explicit key prefix (`None` = derived from namespace and name)
/// - `max_concurrency`: global cap on simultaneous executions (must be `>= 1`)
/// - `ttl`: how long a slot lock lives before the provider reclaims it
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct GovernorConfig {
    /// Task class name.
    pub name: String,

    /// Environment namespace shared by every governor of one deployment.
    pub namespace: String,

    /// Explicit lock-key prefix, replacing `"{namespace}:governor:{name}"`.
    pub key_prefix: Option<String>,

    /// Maximum simultaneous executions across the whole system.
    ///
    /// Also the number of lock attempts issued by every `submit`.
    pub max_concurrency: usize,

    /// Lock TTL for every slot.
    ///
    /// Safety net for a winner that crashes mid-task; long tasks should extend.
    pub ttl: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl GovernorConfig {
    /// Creates a config for the named task class with default limits.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a config with updated concurrency limit.
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Returns a config with updated lock TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns a config with updated namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns a config with an explicit key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Returns a config with updated event bus capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Returns the lock-key namespace of this task class.
    pub fn key_prefix(&self) -> String {
        match &self.key_prefix {
            Some(p) => p.clone(),
            None => format!("{}:governor:{}", self.namespace, self.name),
        }
    }

    /// Returns the lock key of `slot`.
    #[inline]
    pub fn slot_key(&self, slot: usize) -> String {
        format!("{}:{slot}", self.key_prefix())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the config; called by every governor constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        match &self.key_prefix {
            Some(p) if p.trim().is_empty() => Err(ConfigError::EmptyKeyPrefix),
            Some(_) => Ok(()),
            None if self.name.trim().is_empty() => Err(ConfigError::EmptyName),
            None => Ok(()),
        }
    }
}

impl Default for GovernorConfig {
    /// Default configuration:
    ///
    /// - `name = "default"`, `namespace = "default"`
    /// - `max_concurrency = 2`
    /// - `ttl = 55s` (time to finish a task before its slot expires)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            namespace: "default".to_string(),
            key_prefix: None,
            max_concurrency: 2,
            ttl: Duration::from_secs(55),
            bus_capacity: 1024,
        }
    }
}

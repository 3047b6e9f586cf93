//! Breaker registry keyed by breaker identifier.
//!
//! # Responsibilities
//! - Hold the one breaker instance per protected dependency
//! - Populate from configuration at startup
//! - Create unknown identifiers on first use with the default settings
//!
//! Lives for the whole process, shared through `Arc`.

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::config::schema::{BreakerSettings, GatewayConfig};
use crate::config::validation::validate_breaker;
use crate::resilience::circuit_breaker::{
    BreakerSnapshot, CircuitBreaker, CircuitState, CountBasedBreaker,
};

pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<dyn CircuitBreaker>>,
    defaults: BreakerSettings,
}

impl BreakerRegistry {
    /// Empty registry; `defaults` apply to breakers created on demand.
    pub fn new(defaults: BreakerSettings) -> Result<Self, ConfigError> {
        validate_breaker("<defaults>", &defaults)?;
        Ok(Self {
            breakers: DashMap::new(),
            defaults,
        })
    }

    /// Build every configured breaker, plus the upstream's if not listed.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let registry = Self::new(config.breaker_defaults)?;

        for breaker in &config.circuit_breakers {
            let cb = CountBasedBreaker::new(breaker.name.clone(), breaker.settings)?;
            registry.register(Arc::new(cb));
        }
        registry.breaker(&config.upstream.breaker)?;

        tracing::info!(
            breakers = registry.breakers.len(),
            "Circuit breaker registry initialized"
        );
        Ok(registry)
    }

    /// Insert or replace a breaker under its own name.
    pub fn register(&self, breaker: Arc<dyn CircuitBreaker>) {
        self.breakers.insert(breaker.name().to_string(), breaker);
    }

    /// Look up an existing breaker.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Look up a breaker, creating it with the defaults if absent.
    pub fn breaker(&self, name: &str) -> Result<Arc<dyn CircuitBreaker>, ConfigError> {
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let entry = self.breakers.entry(name.to_string()).or_try_insert_with(|| {
            tracing::info!(breaker = %name, "Creating circuit breaker with default settings");
            CountBasedBreaker::new(name, self.defaults).map(|cb| Arc::new(cb) as Arc<dyn CircuitBreaker>)
        })?;
        Ok(entry.value().clone())
    }

    /// All breakers ordered by name.
    pub fn all(&self) -> Vec<Arc<dyn CircuitBreaker>> {
        let mut breakers: Vec<_> = self.breakers.iter().map(|r| r.value().clone()).collect();
        breakers.sort_by(|a, b| a.name().cmp(b.name()));
        breakers
    }

    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        self.all().iter().map(|cb| cb.snapshot()).collect()
    }

    /// Administrative override. Returns false for unknown breakers.
    pub fn transition(&self, name: &str, state: CircuitState) -> bool {
        match self.get(name) {
            Some(cb) => {
                cb.transition_to(state);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

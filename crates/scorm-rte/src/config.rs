use crate::errors::RteError;
use crate::retry::DeliveryPolicy;

pub const ENV_MAX_ATTEMPTS: &str = "SCORM_RTE_MAX_ATTEMPTS";
pub const ENV_ATTEMPT_TIMEOUT_MS: &str = "SCORM_RTE_ATTEMPT_TIMEOUT_MS";
pub const ENV_HYDRATE_TIMEOUT_MS: &str = "SCORM_RTE_HYDRATE_TIMEOUT_MS";
pub const ENV_MAX_DISCOVERY_DEPTH: &str = "SCORM_RTE_MAX_DISCOVERY_DEPTH";

/// Runtime configuration shared by every session a runtime mounts.
#[derive(Clone, Debug, PartialEq)]
pub struct RteConfig {
    pub delivery: DeliveryPolicy,
    /// Upper bound on waiting for earlier in-flight deliveries of the same
    /// (enrollment, content item) before hydrating.
    pub hydrate_timeout_ms: u64,
    /// Parents content walks through when looking for the API object.
    pub max_discovery_depth: usize,
}

impl Default for RteConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryPolicy::default(),
            hydrate_timeout_ms: 10_000,
            max_discovery_depth: 10,
        }
    }
}

impl RteConfig {
    /// Defaults overlaid with whatever `lookup` returns for the
    /// `SCORM_RTE_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(attempts) = parse_setting::<u32, _>(&lookup, ENV_MAX_ATTEMPTS)? {
            config.delivery.max_attempts = attempts;
        }
        if let Some(timeout) = parse_setting::<u64, _>(&lookup, ENV_ATTEMPT_TIMEOUT_MS)? {
            config.delivery.attempt_timeout_ms = timeout;
        }
        if let Some(timeout) = parse_setting::<u64, _>(&lookup, ENV_HYDRATE_TIMEOUT_MS)? {
            config.hydrate_timeout_ms = timeout;
        }
        if let Some(depth) = parse_setting::<usize, _>(&lookup, ENV_MAX_DISCOVERY_DEPTH)? {
            config.max_discovery_depth = depth;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, RteError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<(), RteError> {
        if self.delivery.max_attempts == 0 {
            return Err(RteError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.delivery.attempt_timeout_ms == 0 {
            return Err(RteError::InvalidConfiguration(
                "attempt_timeout_ms must be positive".to_string(),
            ));
        }
        if self.delivery.backoff.backoff_factor < 1.0 {
            return Err(RteError::InvalidConfiguration(
                "backoff_factor must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_setting<T, F>(lookup: &F, key: &str) -> Result<Option<T>, RteError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>().map(Some).map_err(|_| {
        RteError::InvalidConfiguration(format!("{key} has invalid value '{raw}'"))
    })
}

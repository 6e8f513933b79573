use std::time::Duration;

use rand::Rng;

use crate::{Error, Result};

/// Idle pause between a virtual user's consecutive requests, drawn uniformly from `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    pub min: Duration,
    pub max: Duration,
}

impl ThinkTime {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidThinkTime { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub base_url: String,
    pub users: u64,
    /// `None` runs until the run signal is set.
    pub duration: Option<Duration>,
    pub think_time: ThinkTime,
    pub request_timeout: Duration,
    pub probe_path: String,
    pub probe_timeout: Duration,
    /// Worker `i` gets `seed + i`; unseeded workers draw from the OS.
    pub seed: Option<u64>,
    pub progress_interval: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            users: 20,
            duration: Some(Duration::from_secs(300)),
            think_time: ThinkTime::default(),
            request_timeout: Duration::from_secs(10),
            probe_path: "/health".to_string(),
            probe_timeout: Duration::from_secs(5),
            seed: None,
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.users == 0 {
            return Err(Error::InvalidUsers);
        }
        if self.think_time.min > self.think_time.max {
            return Err(Error::InvalidThinkTime {
                min: self.think_time.min,
                max: self.think_time.max,
            });
        }
        if self.request_timeout.is_zero() || self.probe_timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }

        match url::Url::parse(&self.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
            _ => Err(Error::InvalidBaseUrl(self.base_url.clone())),
        }
    }
}

use std::sync::Arc;

use http::Method;

use crate::template::UrlTemplate;
use crate::{Error, Result};

/// A named, weighted template for one kind of simulated request.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: Arc<str>,
    pub method: Method,
    pub url: UrlTemplate,
    pub weight: f64,
}

impl Scenario {
    pub fn new(name: &str, method: Method, url: UrlTemplate, weight: f64) -> Self {
        Self {
            name: Arc::from(name),
            method,
            url,
            weight,
        }
    }

    pub fn get(name: &str, url: UrlTemplate, weight: f64) -> Self {
        Self::new(name, Method::GET, url, weight)
    }

    pub fn post(name: &str, url: UrlTemplate, weight: f64) -> Self {
        Self::new(name, Method::POST, url, weight)
    }
}

/// Fixed, non-empty, ordered list of scenarios.
///
/// Immutable after construction, so it can be shared between workers without locking.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
    total_weight: f64,
}

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self> {
        if scenarios.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        for s in &scenarios {
            if !s.weight.is_finite() || s.weight <= 0.0 {
                return Err(Error::InvalidWeight {
                    name: s.name.to_string(),
                    weight: s.weight,
                });
            }
        }

        let total_weight: f64 = scenarios.iter().map(|s| s.weight).sum();
        if !total_weight.is_finite() {
            return Err(Error::WeightOverflow);
        }

        Ok(Self {
            scenarios,
            total_weight,
        })
    }

    /// The traffic mix of the demo service: browsing, lookups, orders, logins and a
    /// tail of requests that are expected to fail or respond slowly.
    pub fn demo() -> Self {
        let scenarios = vec![
            Scenario::get("home page", UrlTemplate::fixed("/"), 20.0),
            Scenario::get("health check", UrlTemplate::fixed("/health"), 5.0),
            Scenario::get(
                "user lookup",
                UrlTemplate::with_id("/api/user/", 1, 1200),
                20.0,
            ),
            Scenario::get(
                "product lookup",
                UrlTemplate::with_id("/api/product/", 1, 500),
                15.0,
            ),
            Scenario::get("order list", UrlTemplate::fixed("/api/order"), 10.0),
            Scenario::post("create order", UrlTemplate::fixed("/api/order"), 8.0),
            Scenario::post("login", UrlTemplate::fixed("/api/login"), 7.0),
            Scenario::get("trigger 404", UrlTemplate::fixed("/error/404"), 6.0),
            Scenario::get("trigger 500", UrlTemplate::fixed("/error/500"), 4.0),
            Scenario::get(
                "missing page",
                UrlTemplate::with_id("/nonexistent/", 1, 100),
                3.0,
            ),
            Scenario::get("slow request", UrlTemplate::fixed("/error/timeout"), 2.0),
        ];
        let total_weight = scenarios.iter().map(|s| s.weight).sum();

        Self {
            scenarios,
            total_weight,
        }
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    #[must_use]
    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Expected selection probability of each scenario, in catalog order.
    pub fn shares(&self) -> impl Iterator<Item = (&Scenario, f64)> {
        self.scenarios
            .iter()
            .map(|s| (s, s.weight / self.total_weight))
    }
}

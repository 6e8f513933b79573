use std::time::{Duration, Instant};

use bytes::Bytes;
use http::Method;
use logstorm_http::{HttpClient, HttpRequest};
use rand::Rng;
use rand::seq::IndexedRandom as _;

use crate::catalog::Scenario;
use crate::outcome::{ErrorKind, OutcomeKind, RequestOutcome};

pub const USER_AGENTS: [&str; 10] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:118.0) Gecko/20100101 Firefox/118.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.5993.90 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 12; SM-G9980) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.5993.90 Mobile Safari/537.36 EdgA/118.0.2088.81",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.1108.62",
    "curl/8.2.1",
];

pub const ACCEPT_LANGUAGES: [&str; 3] = ["en-US,en;q=0.9", "zh-CN,zh;q=0.9", "en-GB,en;q=0.8"];

const JSON_EMPTY_OBJECT: &[u8] = b"{}";

/// Issues one request per call against a fixed base URL. Never retries.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl RequestExecutor {
    /// Builds an executor with its own client (and therefore its own connection pool).
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(Some(timeout)),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub async fn execute<R: Rng>(&self, scenario: &Scenario, rng: &mut R) -> RequestOutcome {
        let url = self.url_for(&scenario.url.resolve(rng));

        let user_agent = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);
        let locale = ACCEPT_LANGUAGES
            .choose(rng)
            .copied()
            .unwrap_or(ACCEPT_LANGUAGES[0]);

        let mut req = HttpRequest::new(scenario.method.clone(), url.clone())
            .with_header("user-agent", user_agent)
            .with_header("accept-language", locale)
            .with_timeout(self.timeout);
        if carries_body(&scenario.method) {
            req = req
                .with_header("content-type", "application/json")
                .with_body(Bytes::from_static(JSON_EMPTY_OBJECT));
        }

        let started = Instant::now();
        let res = self.client.request(req).await;
        let elapsed = started.elapsed();

        let kind = match res {
            Ok(res) => OutcomeKind::Received { status: res.status },
            Err(err) => OutcomeKind::Failed {
                kind: ErrorKind::from(&err),
                message: err.to_string(),
            },
        };

        RequestOutcome {
            scenario: scenario.name.clone(),
            method: scenario.method.clone(),
            url,
            elapsed,
            kind,
        }
    }

    /// Single plain GET used to check that the target answers at all.
    pub async fn probe(&self, path: &str, timeout: Duration) -> logstorm_http::Result<u16> {
        let req = HttpRequest::get(&self.url_for(path)).with_timeout(timeout);
        self.client.request(req).await.map(|res| res.status)
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

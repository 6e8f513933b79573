use std::fmt;
use std::sync::Arc;

use rand::{Rng as _, RngCore};

use crate::{Error, Result};

/// Produces a request path from the calling worker's random source.
pub type PathFn = Arc<dyn Fn(&mut dyn RngCore) -> String + Send + Sync>;

/// Where a scenario's request path comes from.
#[derive(Clone)]
pub enum UrlTemplate {
    Static(String),
    Generated {
        /// Human-readable form, e.g. `/api/user/{1..1200}`.
        label: String,
        produce: PathFn,
    },
}

impl UrlTemplate {
    pub fn fixed(path: impl Into<String>) -> Self {
        Self::Static(path.into())
    }

    pub fn generated(
        label: impl Into<String>,
        produce: impl Fn(&mut dyn RngCore) -> String + Send + Sync + 'static,
    ) -> Self {
        Self::Generated {
            label: label.into(),
            produce: Arc::new(produce),
        }
    }

    /// `prefix` followed by a uniform random id in `min..=max`.
    pub fn with_id(prefix: &str, min: u64, max: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self::from_segments(vec![
            Segment::Literal(prefix.to_string()),
            Segment::Range { min, max },
        ])
    }

    /// Parses a path with optional `{MIN..MAX}` placeholders.
    ///
    /// A path without placeholders becomes [`UrlTemplate::Static`]; every placeholder is
    /// replaced by a fresh uniform integer in the inclusive range each time the template
    /// is resolved.
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidUrlTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
            let (lo, hi) = after[..close]
                .split_once("..")
                .ok_or_else(|| invalid("placeholder must look like {MIN..MAX}"))?;
            let min: u64 = lo
                .trim()
                .parse()
                .map_err(|_| invalid("placeholder bounds must be non-negative integers"))?;
            let max: u64 = hi
                .trim()
                .parse()
                .map_err(|_| invalid("placeholder bounds must be non-negative integers"))?;
            if min > max {
                return Err(invalid("placeholder MIN must not exceed MAX"));
            }
            segments.push(Segment::Range { min, max });
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(invalid("unmatched `}`"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Ok(Self::Static(template.to_string()));
        }
        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let label = segments.iter().map(Segment::to_string).collect::<String>();
        Self::generated(label, move |rng| {
            let mut out = String::new();
            for seg in &segments {
                match seg {
                    Segment::Literal(s) => out.push_str(s),
                    Segment::Range { min, max } => {
                        let v: u64 = rng.random_range(*min..=*max);
                        out.push_str(&v.to_string());
                    }
                }
            }
            out
        })
    }

    pub fn resolve(&self, rng: &mut dyn RngCore) -> String {
        match self {
            Self::Static(path) => path.clone(),
            Self::Generated { produce, .. } => produce(rng),
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => f.write_str(path),
            Self::Generated { label, .. } => f.write_str(label),
        }
    }
}

impl fmt::Debug for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => f.debug_tuple("Static").field(path).finish(),
            Self::Generated { label, .. } => f.debug_tuple("Generated").field(label).finish(),
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Range { min: u64, max: u64 },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::Range { min, max } => write!(f, "{{{min}..{max}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    #[test]
    fn plain_path_is_static() {
        let t = UrlTemplate::parse("/api/order").unwrap();
        assert!(t.is_static());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(t.resolve(&mut rng), "/api/order");
    }

    #[test]
    fn placeholders_resolve_within_bounds() {
        let t = UrlTemplate::parse("/api/user/{1..3}/orders/{7..7}").unwrap();
        assert!(!t.is_static());
        assert_eq!(t.to_string(), "/api/user/{1..3}/orders/{7..7}");

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let path = t.resolve(&mut rng);
            let rest = path.strip_prefix("/api/user/").unwrap();
            let (id, tail) = rest.split_once('/').unwrap();
            let id: u64 = id.parse().unwrap();
            assert!((1..=3).contains(&id), "id out of range: {path}");
            assert_eq!(tail, "orders/7");
        }
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        for bad in ["/x/{1..", "/x/{a..b}", "/x/{5..1}", "/x/{12}", "/x/}"] {
            let err = UrlTemplate::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidUrlTemplate { .. }),
                "expected template error for {bad}, got {err}"
            );
        }
    }

    #[test]
    fn with_id_matches_parsed_label() {
        let t = UrlTemplate::with_id("/api/product/", 1, 500);
        assert_eq!(t.to_string(), "/api/product/{1..500}");
    }

    #[test]
    fn same_seed_yields_same_paths() {
        let t = UrlTemplate::with_id("/nonexistent/", 1, 100);
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let left: Vec<String> = (0..16).map(|_| t.resolve(&mut a)).collect();
        let right: Vec<String> = (0..16).map(|_| t.resolve(&mut b)).collect();
        assert_eq!(left, right);
    }
}

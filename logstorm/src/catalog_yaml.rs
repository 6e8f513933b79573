use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use logstorm_core::{Scenario, ScenarioCatalog, UrlTemplate};
use serde::{Deserialize, Serialize};

use crate::run_error::RunError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CatalogDocYaml {
    pub scenarios: Vec<ScenarioYaml>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioYaml {
    pub name: String,

    /// HTTP method; GET when omitted.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request path, optionally with `{MIN..MAX}` placeholders.
    pub path: String,

    pub weight: f64,
}

fn default_method() -> String {
    "GET".to_string()
}

pub fn looks_like_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase()),
        Some(ext) if ext == "yml" || ext == "yaml"
    )
}

/// The built-in catalog, or the one described by `path`.
pub async fn resolve_catalog(path: Option<&Path>) -> Result<Arc<ScenarioCatalog>, RunError> {
    match path {
        None => Ok(Arc::new(ScenarioCatalog::demo())),
        Some(path) => load_catalog(path).await.map(Arc::new),
    }
}

pub async fn load_catalog(path: &Path) -> Result<ScenarioCatalog, RunError> {
    if !looks_like_yaml_path(path) {
        return Err(RunError::InvalidInput(anyhow::anyhow!(
            "unsupported catalog file `{}` (expected .yaml or .yml)",
            path.display()
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read catalog file: {}", path.display()))
        .map_err(RunError::InvalidInput)?;

    let doc: CatalogDocYaml = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("failed to parse YAML: {}", path.display()))
        .map_err(RunError::InvalidInput)?;

    catalog_from_doc(doc)
        .with_context(|| format!("invalid catalog: {}", path.display()))
        .map_err(RunError::InvalidInput)
}

pub(crate) fn catalog_from_doc(doc: CatalogDocYaml) -> anyhow::Result<ScenarioCatalog> {
    let scenarios = doc
        .scenarios
        .into_iter()
        .map(|s| -> anyhow::Result<Scenario> {
            let method = http::Method::from_bytes(s.method.trim().to_ascii_uppercase().as_bytes())
                .with_context(|| format!("scenario `{}`: invalid method `{}`", s.name, s.method))?;
            let url = UrlTemplate::parse(&s.path)
                .with_context(|| format!("scenario `{}`", s.name))?;
            Ok(Scenario::new(&s.name, method, url, s.weight))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ScenarioCatalog::new(scenarios)?)
}

pub(crate) fn doc_from_catalog(catalog: &ScenarioCatalog) -> CatalogDocYaml {
    CatalogDocYaml {
        scenarios: catalog
            .all()
            .iter()
            .map(|s| ScenarioYaml {
                name: s.name.to_string(),
                method: s.method.to_string(),
                path: s.url.to_string(),
                weight: s.weight,
            })
            .collect(),
    }
}

pub(crate) fn render_yaml(catalog: &ScenarioCatalog) -> anyhow::Result<String> {
    serde_yaml::to_string(&doc_from_catalog(catalog)).context("failed to render catalog YAML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(yaml: &str) -> anyhow::Result<ScenarioCatalog> {
        let doc: CatalogDocYaml = serde_yaml::from_str(yaml)?;
        catalog_from_doc(doc)
    }

    #[test]
    fn looks_like_yaml_path_checks_extension() {
        assert!(looks_like_yaml_path(Path::new("a.yml")));
        assert!(looks_like_yaml_path(Path::new("a.YAML")));
        assert!(!looks_like_yaml_path(Path::new("a.json")));
        assert!(!looks_like_yaml_path(Path::new("main")));
    }

    #[test]
    fn method_defaults_to_get() {
        let catalog = parse(
            r#"
scenarios:
  - name: home
    path: /
    weight: 3
  - name: login
    method: post
    path: /api/login
    weight: 1
"#,
        )
        .unwrap_or_else(|e| panic!("{e:#}"));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all()[0].method, http::Method::GET);
        assert_eq!(catalog.all()[1].method, http::Method::POST);
        assert_eq!(catalog.total_weight(), 4.0);
        assert!(catalog.all()[0].url.is_static());
    }

    #[test]
    fn placeholders_become_generated_paths() {
        let catalog = parse(
            r#"
scenarios:
  - name: user lookup
    path: /api/user/{1..1200}
    weight: 20
"#,
        )
        .unwrap_or_else(|e| panic!("{e:#}"));

        let url = &catalog.all()[0].url;
        assert!(!url.is_static());
        assert_eq!(url.to_string(), "/api/user/{1..1200}");
    }

    #[test]
    fn rejects_invalid_documents() {
        assert!(parse("scenarios: []").is_err());
        assert!(
            parse(
                r#"
scenarios:
  - name: zero
    path: /
    weight: 0
"#
            )
            .is_err()
        );
        assert!(
            parse(
                r#"
scenarios:
  - name: bad range
    path: /api/user/{9..1}
    weight: 1
"#
            )
            .is_err()
        );
        assert!(serde_yaml::from_str::<CatalogDocYaml>("scenarios:\n  - name: x\n    path: /\n    weight: 1\n    typo: 1\n").is_err());
    }

    #[test]
    fn demo_catalog_survives_export() {
        let demo = ScenarioCatalog::demo();
        let yaml = render_yaml(&demo).unwrap_or_else(|e| panic!("{e:#}"));
        let back = parse(&yaml).unwrap_or_else(|e| panic!("{e:#}"));

        assert_eq!(back.len(), demo.len());
        for (a, b) in demo.all().iter().zip(back.all()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.method, b.method);
            assert_eq!(a.url.to_string(), b.url.to_string());
            assert_eq!(a.weight, b.weight);
        }
    }

    #[tokio::test]
    async fn missing_file_is_invalid_input() {
        let err = load_catalog(&PathBuf::from("/definitely/not/here.yaml"))
            .await
            .err()
            .unwrap_or_else(|| panic!("expected an error"));
        assert!(matches!(err, RunError::InvalidInput(_)));
    }
}

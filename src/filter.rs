//! Selection of tests, variations, metrics and views for a traversal
//!
//! Supports `-e` expressions of the form:
//! - Explicit names: `-e metrics=loadTime,bytesIn`
//! - Regex patterns: `-e tests=/example\.com/`
//! - Views: `-e views=first` (`first`, `repeat`, `0`, `1`)

use crate::dataset::{CacheState, Dataset, MetricQuery};
use crate::error::{AnalysisError, Result};
use regex::Regex;

/// Names to include along one axis
#[derive(Debug, Clone)]
pub enum NameFilter {
    /// Exactly these names, in this order
    Names(Vec<String>),
    /// Default names matching a pattern, in default order
    Pattern(Regex),
}

impl NameFilter {
    fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Some(pattern) = spec
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            return Ok(NameFilter::Pattern(Regex::new(pattern)?));
        }

        let names = spec
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(NameFilter::Names(names))
    }

    /// Resolve against the default list for this axis
    fn resolve(&self, defaults: impl FnOnce() -> Vec<String>) -> Vec<String> {
        match self {
            NameFilter::Names(names) => names.clone(),
            NameFilter::Pattern(re) => defaults().into_iter().filter(|n| re.is_match(n)).collect(),
        }
    }
}

/// Traversal filters; an unset axis means "walker default"
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub tests: Option<NameFilter>,
    pub variations: Option<NameFilter>,
    pub metrics: Option<NameFilter>,
    pub views: Option<Vec<CacheState>>,
}

/// Explicit lists produced by [`Selection::resolve`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub tests: Option<Vec<String>>,
    pub variations: Option<Vec<String>>,
    pub metrics: Option<Vec<String>>,
    pub views: Option<Vec<CacheState>>,
}

impl Selection {
    /// Select everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse one expression like `metrics=a,b` or `tests=/regex/`
    pub fn from_expr(expr: &str) -> Result<Self> {
        let mut selection = Self::all();
        selection.add_expr(expr)?;
        Ok(selection)
    }

    /// Parse several expressions; later ones override earlier ones on the same axis
    pub fn from_exprs<I, S>(exprs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::all();
        for expr in exprs {
            selection.add_expr(expr.as_ref())?;
        }
        Ok(selection)
    }

    fn add_expr(&mut self, expr: &str) -> Result<()> {
        let Some((key, spec)) = expr.split_once('=') else {
            return Err(AnalysisError::InvalidExpression(format!(
                "{}. Expected format: KEY=SPEC",
                expr
            )));
        };

        match key.trim() {
            "tests" | "test" => self.tests = Some(NameFilter::parse(spec)?),
            "variations" | "variation" => self.variations = Some(NameFilter::parse(spec)?),
            "metrics" | "metric" => self.metrics = Some(NameFilter::parse(spec)?),
            "views" | "view" => self.views = Some(parse_views(spec)?),
            other => {
                return Err(AnalysisError::InvalidExpression(format!(
                    "unknown key '{}' in {}",
                    other, expr
                )))
            }
        }
        Ok(())
    }

    pub fn with_tests(mut self, tests: &[&str]) -> Self {
        self.tests = Some(NameFilter::Names(to_owned(tests)));
        self
    }

    pub fn with_variations(mut self, variations: &[&str]) -> Self {
        self.variations = Some(NameFilter::Names(to_owned(variations)));
        self
    }

    pub fn with_metrics(mut self, metrics: &[&str]) -> Self {
        self.metrics = Some(NameFilter::Names(to_owned(metrics)));
        self
    }

    pub fn with_views(mut self, views: &[CacheState]) -> Self {
        self.views = Some(views.to_vec());
        self
    }

    /// Turn patterns into explicit name lists for a dataset
    pub fn resolve(&self, data: &Dataset) -> ResolvedSelection {
        ResolvedSelection {
            tests: self.tests.as_ref().map(|f| f.resolve(|| data.tests())),
            variations: self.variations.as_ref().map(|f| f.resolve(|| data.variations())),
            metrics: self
                .metrics
                .as_ref()
                .map(|f| f.resolve(|| data.metric_names(&MetricQuery::all()))),
            views: self.views.clone(),
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn parse_views(spec: &str) -> Result<Vec<CacheState>> {
    let mut views = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let view = match part {
            "first" | "fv" => CacheState::FirstView,
            "repeat" | "rv" => CacheState::RepeatView,
            "both" => {
                views.extend(CacheState::BOTH);
                continue;
            }
            other => other
                .parse::<usize>()
                .ok()
                .and_then(CacheState::from_index)
                .ok_or_else(|| {
                    AnalysisError::InvalidExpression(format!("unknown view '{}'", other))
                })?,
        };
        views.push(view);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        Dataset::from_json_str(
            r#"{
                "a.example.com": {"v1": [{"load": [1, 2], "ttfb": [3, 4]}, {}]},
                "b.example.com": {"v2": [{"load": [1, 2], "ttfb": [3, 4]}, {}]},
                "other.org": {"v1": [{"load": [1, 2], "ttfb": [3, 4]}, {}]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_all_resolves_to_defaults() {
        let resolved = Selection::all().resolve(&data());
        assert_eq!(resolved, ResolvedSelection::default());
    }

    #[test]
    fn test_explicit_names_keep_order() {
        let selection = Selection::from_expr("metrics=ttfb, load").unwrap();
        let resolved = selection.resolve(&data());
        assert_eq!(resolved.metrics, Some(vec!["ttfb".to_string(), "load".to_string()]));
    }

    #[test]
    fn test_pattern_filters_defaults() {
        let selection = Selection::from_expr(r"tests=/example\.com$/").unwrap();
        let resolved = selection.resolve(&data());
        assert_eq!(
            resolved.tests,
            Some(vec!["a.example.com".to_string(), "b.example.com".to_string()])
        );
    }

    #[test]
    fn test_views() {
        let selection = Selection::from_expr("views=repeat").unwrap();
        assert_eq!(selection.views, Some(vec![CacheState::RepeatView]));
        let selection = Selection::from_expr("views=0,1").unwrap();
        assert_eq!(selection.views, Some(CacheState::BOTH.to_vec()));
        assert!(Selection::from_expr("views=warm").is_err());
        assert!(Selection::from_expr("views=2").is_err());
    }

    #[test]
    fn test_multiple_exprs() {
        let selection = Selection::from_exprs(["variations=v1", "metrics=load"]).unwrap();
        let resolved = selection.resolve(&data());
        assert_eq!(resolved.variations, Some(vec!["v1".to_string()]));
        assert_eq!(resolved.metrics, Some(vec!["load".to_string()]));
        assert!(resolved.tests.is_none());
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(Selection::from_expr("metrics").is_err());
        assert!(Selection::from_expr("runs=1").is_err());
        assert!(Selection::from_expr("tests=/(unclosed/").is_err());
    }

    #[test]
    fn test_empty_spec_selects_nothing() {
        let selection = Selection::from_expr("metrics=").unwrap();
        assert_eq!(selection.resolve(&data()).metrics, Some(Vec::new()));
    }

    #[test]
    fn test_builders() {
        let selection = Selection::all()
            .with_tests(&["other.org"])
            .with_views(&[CacheState::FirstView]);
        let resolved = selection.resolve(&data());
        assert_eq!(resolved.tests, Some(vec!["other.org".to_string()]));
        assert_eq!(resolved.views, Some(vec![CacheState::FirstView]));
    }
}

// Depth-first traversal of benchmark result datasets
//
// The walker visits a dataset in a fixed order:
//
//   test → variation → cache state → metric
//
// and calls a Visitor hook at every level boundary. It keeps no aggregation
// state of its own: each visitor accumulates exactly one output shape and
// hands it back from `finish`.
//
// Fallbacks:
// - a metric missing from a metric-set is visited as an empty sequence
// - a variation missing from a test is replaced by the test's first variation
// - an absent or empty metric-set is skipped without `post_cached`

use crate::dataset::{CacheState, Dataset, MetricQuery, MetricValue};
use crate::error::{AnalysisError, KeyKind, Result};
use crate::filter::Selection;

/// Read-only state shared with visitor hooks during one walk
#[derive(Debug, Clone, Copy)]
pub struct WalkContext<'a> {
    dataset: &'a Dataset,
    metrics: &'a [String],
}

impl<'a> WalkContext<'a> {
    /// The dataset being walked
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Metrics visited at every cache state, in visiting order
    pub fn metrics(&self) -> &'a [String] {
        self.metrics
    }
}

/// Hooks invoked by [`Walker`]
///
/// Every hook defaults to a no-op. Returning an error aborts the walk.
#[allow(unused_variables)]
pub trait Visitor {
    type Output;

    fn pre_test(&mut self, cx: &WalkContext<'_>, test: &str) -> Result<()> {
        Ok(())
    }

    fn pre_variation(&mut self, cx: &WalkContext<'_>, variation: &str, test: &str) -> Result<()> {
        Ok(())
    }

    fn pre_cached(
        &mut self,
        cx: &WalkContext<'_>,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn metric(
        &mut self,
        cx: &WalkContext<'_>,
        metric: &str,
        value: &MetricValue,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn post_cached(
        &mut self,
        cx: &WalkContext<'_>,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn post_variation(&mut self, cx: &WalkContext<'_>, variation: &str, test: &str) -> Result<()> {
        Ok(())
    }

    fn post_test(&mut self, cx: &WalkContext<'_>, test: &str) -> Result<()> {
        Ok(())
    }

    /// Consume the visitor and return what it accumulated
    fn finish(self) -> Self::Output
    where
        Self: Sized;
}

/// Drives a [`Visitor`] over a dataset
///
/// Unset axes fall back to the dataset defaults: complete tests, all
/// metrics, all variations and both cache states.
///
/// # Example
/// ```
/// use pagestat::dataset::Dataset;
/// use pagestat::visitors::RunsVisitor;
/// use pagestat::walker::Walker;
///
/// let data = Dataset::from_json_str(r#"{"t": {"v": [{"load": [1, 2]}, {}]}}"#).unwrap();
/// let runs = Walker::new(&data).walk(RunsVisitor::new(&data)).unwrap();
/// assert_eq!(runs[0]["v"].len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    data: &'a Dataset,
    tests: Option<Vec<String>>,
    variations: Option<Vec<String>>,
    metrics: Option<Vec<String>>,
    views: Option<Vec<CacheState>>,
}

impl<'a> Walker<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self {
            data,
            tests: None,
            variations: None,
            metrics: None,
            views: None,
        }
    }

    pub fn tests<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tests = Some(tests.into_iter().map(Into::into).collect());
        self
    }

    pub fn variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = Some(variations.into_iter().map(Into::into).collect());
        self
    }

    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = Some(metrics.into_iter().map(Into::into).collect());
        self
    }

    pub fn views(mut self, views: &[CacheState]) -> Self {
        self.views = Some(views.to_vec());
        self
    }

    /// Apply a selection; axes it leaves unset keep their current value
    pub fn with_selection(mut self, selection: &Selection) -> Self {
        let resolved = selection.resolve(self.data);
        self.tests = resolved.tests.or(self.tests);
        self.variations = resolved.variations.or(self.variations);
        self.metrics = resolved.metrics.or(self.metrics);
        self.views = resolved.views.or(self.views);
        self
    }

    /// Walk the dataset and return the visitor's output
    pub fn walk<V: Visitor>(&self, mut visitor: V) -> Result<V::Output> {
        self.drive(&mut visitor)?;
        Ok(visitor.finish())
    }

    /// Walk the dataset, leaving the visitor in place
    pub fn drive<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        let tests = self.tests.clone().unwrap_or_else(|| self.data.tests());
        let variations = self
            .variations
            .clone()
            .unwrap_or_else(|| self.data.variations());
        let metrics = self
            .metrics
            .clone()
            .unwrap_or_else(|| self.data.metric_names(&MetricQuery::all()));
        let views = self
            .views
            .clone()
            .unwrap_or_else(|| CacheState::BOTH.to_vec());

        tracing::debug!(
            tests = tests.len(),
            variations = variations.len(),
            metrics = metrics.len(),
            views = views.len(),
            "walking dataset"
        );

        let cx = WalkContext {
            dataset: self.data,
            metrics: &metrics,
        };
        let missing = MetricValue::empty();

        for test in &tests {
            visitor.pre_test(&cx, test)?;
            let record = self.data.test(test)?;
            tracing::trace!(test = %test, "visiting test");

            for variation in &variations {
                visitor.pre_variation(&cx, variation, test)?;
                let variation_record = match record.get(variation) {
                    Some(found) => found,
                    None => {
                        tracing::trace!(
                            test = %test,
                            variation = %variation,
                            "variation missing, using first variation"
                        );
                        record
                            .values()
                            .next()
                            .ok_or_else(|| AnalysisError::missing(KeyKind::Variation, variation.as_str()))?
                    }
                };

                for &cached in &views {
                    visitor.pre_cached(&cx, cached, variation, test)?;
                    let Some(metric_set) = variation_record.view(cached) else {
                        continue;
                    };
                    for metric in &metrics {
                        let value = metric_set.get(metric).unwrap_or(&missing);
                        visitor.metric(&cx, metric, value, cached, variation, test)?;
                    }
                    visitor.post_cached(&cx, cached, variation, test)?;
                }

                visitor.post_variation(&cx, variation, test)?;
            }

            visitor.post_test(&cx, test)?;
        }

        Ok(())
    }
}

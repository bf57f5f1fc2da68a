use anyhow::{Context, Result};
use clap::Parser;
use pagestat::cli::{Cli, Command};
use pagestat::config::AnalysisConfig;
use pagestat::dataset::{Dataset, DatasetScope, MetricQuery};
use pagestat::filter::Selection;
use pagestat::reduce::{Delta, ReprStat};
use pagestat::summary::DatasetSummary;
use pagestat::visitors::{
    AggregatePoolVisitor, BasicStatVisitor, CorrelationVisitor, FlatRecordVisitor,
    RunsVisitor, SignificanceVisitor, ViewDataVisitor,
};
use pagestat::walker::Walker;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Config file values, then command-line overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(kind) = args.reprstat {
        config.reprstat = kind;
    }
    if args.filter_outliers {
        config.filter_outliers = true;
    }
    Ok(config)
}

fn parse_delta(spec: &str, repr: ReprStat, config: &AnalysisConfig) -> Result<Delta> {
    let delta = Delta::parse(spec, repr)
        .with_context(|| format!("Invalid delta '{}'", spec))?;
    Ok(delta.with_precision(config.percent_precision))
}

/// Run one analysis and return its result as JSON
fn run_command(
    command: &Command,
    data: &Dataset,
    selection: &Selection,
    config: &AnalysisConfig,
) -> Result<Value> {
    let repr = config.repr_stat();
    let walker = Walker::new(data).with_selection(selection);

    let value = match command {
        Command::Summary => serde_json::to_value(DatasetSummary::from_dataset(data))?,

        Command::Data { metrics } => {
            let mut query = MetricQuery::numeric();
            let walker = if metrics.is_empty() {
                walker
            } else {
                query = query.with_names(metrics);
                walker.metrics(metrics.iter().cloned())
            };
            let tables = walker.walk(ViewDataVisitor::new(repr))?;
            json!({
                "columns": data.metric_names(&query),
                "tests": tables,
            })
        }

        Command::Basic {
            metric,
            delta,
            scope,
        } => {
            let scope_kind = DatasetScope::parse(scope);
            // The pool already holds filtered per-test values
            let delta_repr = match scope_kind {
                DatasetScope::Aggregate => repr.unfiltered(),
                _ => repr,
            };
            let delta = parse_delta(delta, delta_repr, config)?;
            let scoped = scope_kind.apply(data, repr)?;
            let report = Walker::new(&scoped)
                .with_selection(selection)
                .metrics([metric.as_str()])
                .walk(BasicStatVisitor::new(delta))?;
            json!({
                "metric": metric,
                "scope": scope,
                "variations": scoped.variations(),
                "report": report,
            })
        }

        Command::Correlation {
            imetric,
            metrics,
            idelta,
            ddelta,
        } => {
            let idelta = parse_delta(idelta, repr, config)?;
            let ddelta = parse_delta(ddelta, repr, config)?;
            // One pass per test, over the independent delta's main variation
            let variation = idelta
                .main
                .clone()
                .or_else(|| data.variations().into_iter().next())
                .context("Dataset has no variations")?;
            let report = walker
                .variations([variation])
                .metrics(metrics.iter().cloned())
                .walk(CorrelationVisitor::new(idelta, ddelta, imetric.as_str()))?;
            json!({
                "imetric": imetric,
                "metrics": metrics,
                "report": report,
            })
        }

        Command::Significance {
            metrics,
            base,
            main,
        } => {
            let visitor = SignificanceVisitor::new(base.as_str(), config.outlier_filter())
                .with_z(config.confidence_z);
            let report = walker
                .variations([main.as_str()])
                .metrics(metrics.iter().cloned())
                .walk(visitor)?;
            json!({
                "base": base,
                "main": main,
                "report": report,
            })
        }

        Command::Runs { metrics } => {
            let runs = walker
                .metrics(metrics.iter().cloned())
                .walk(RunsVisitor::new(data))?;
            json!({
                "tests": data.tests(),
                "runs": runs,
            })
        }

        Command::Flat => {
            let records = walker.walk(FlatRecordVisitor::new().with_filter(config.outlier_filter()))?;
            serde_json::to_value(records)?
        }

        Command::Aggregate => serde_json::to_value(walker.walk(AggregatePoolVisitor::unfiltered())?)?,
    };
    Ok(value)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let data = Dataset::from_file(&args.dataset)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;
    let selection = Selection::from_exprs(&args.exprs)?;
    tracing::debug!(tests = data.len(), command = ?args.command, "dataset loaded");

    let result = run_command(&args.command, &data, &selection, &config)?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);

    Ok(())
}

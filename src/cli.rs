//! CLI argument parsing for pagestat

use crate::reduce::ReprKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagestat")]
#[command(version)]
#[command(about = "Statistics over repeated page-load benchmark results", long_about = None)]
pub struct Cli {
    /// Analysis defaults (TOML); flags below override it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug")]
    pub debug: bool,

    /// Pretty-print the JSON result
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Narrow the traversal (e.g., -e tests=a.com,b.com or -e metrics=/^load/)
    #[arg(short = 'e', long = "expr", value_name = "EXPR", global = true)]
    pub exprs: Vec<String>,

    /// Representative statistic (overrides the config file)
    #[arg(long = "reprstat", value_enum, global = true)]
    pub reprstat: Option<ReprKind>,

    /// Drop outliers outside 1.5 IQR before reducing (overrides the config file)
    #[arg(long = "filter-outliers", global = true)]
    pub filter_outliers: bool,

    /// Benchmark result dataset (JSON)
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Tests, variations, metrics, run count and delta functions
    Summary,

    /// Representative value of every metric, per test
    Data {
        /// Metrics to show (default: all)
        #[arg(short = 'm', long = "metric", value_name = "METRIC")]
        metrics: Vec<String>,
    },

    /// One metric's delta per test, plus quartiles per variation
    Basic {
        #[arg(short = 'm', long = "metric", value_name = "METRIC")]
        metric: String,

        /// Delta function, e.g. percent|rewrite|control or |control|
        #[arg(long = "delta", value_name = "KIND|MAIN|BASE", default_value = "||")]
        delta: String,

        /// __all, __aggregate, or a single test name
        #[arg(long = "scope", value_name = "SCOPE", default_value = "__all")]
        scope: String,
    },

    /// Scatter data and Pearson r of dependent metrics against one independent metric
    Correlation {
        /// Independent metric
        #[arg(long = "imetric", value_name = "METRIC")]
        imetric: String,

        /// Dependent metrics
        #[arg(short = 'm', long = "metric", value_name = "METRIC", required = true)]
        metrics: Vec<String>,

        /// Delta applied to the independent metric
        #[arg(long = "idelta", value_name = "KIND|MAIN|BASE", default_value = "||")]
        idelta: String,

        /// Delta applied to each dependent metric
        #[arg(long = "ddelta", value_name = "KIND|MAIN|BASE", default_value = "||")]
        ddelta: String,
    },

    /// 95% confidence intervals of a main variation against a base variation
    Significance {
        #[arg(short = 'm', long = "metric", value_name = "METRIC", required = true)]
        metrics: Vec<String>,

        #[arg(long = "base", value_name = "VARIATION")]
        base: String,

        #[arg(long = "main", value_name = "VARIATION")]
        main: String,
    },

    /// Value of each run, per variation
    Runs {
        #[arg(short = 'm', long = "metric", value_name = "METRIC", required = true)]
        metrics: Vec<String>,
    },

    /// One flat record per (test, variation)
    Flat,

    /// Pool every test's raw runs into a single "Aggregate" test
    Aggregate,
}

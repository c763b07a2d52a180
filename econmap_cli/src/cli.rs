use std::{fs::File, path::Path};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use econmap::{
    config::Config,
    formatters::{
        CSVFormatter, GeoJSONFormatter, GeoJSONSeqFormatter, OutputFormatter, OutputGenerator,
    },
    merge::clean_for_display,
    metric::{Metric, MetricSummary},
    Econmap,
};
use enum_dispatch::enum_dispatch;
use log::{debug, info};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_merged, display_metrics, display_summary};
use crate::error::EconmapCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const MERGING_STRING: &str = "Reading and merging datasets";

/// Defines the output formats we are able to produce data in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    GeoJSON,
    GeoJSONSeq,
    Csv,
}

impl OutputFormat {
    fn formatter(&self, metric: Option<Metric>) -> OutputFormatter {
        match self {
            OutputFormat::GeoJSON => OutputFormatter::GeoJSON(GeoJSONFormatter { metric }),
            OutputFormat::GeoJSONSeq => OutputFormatter::GeoJSONSeq(GeoJSONSeqFormatter),
            OutputFormat::Csv => OutputFormatter::Csv(CSVFormatter),
        }
    }
}

fn write_output<T, U>(
    output_generator: T,
    mut data: DataFrame,
    output_file: Option<U>,
) -> EconmapCliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, &mut data)?;
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        output_generator.save(&mut stdout_lock, &mut data)?;
    };
    Ok(())
}

/// Runs the pipeline behind an optional progress spinner.
fn merged_with_progress(config: Config, quiet: bool) -> EconmapCliResult<DataFrame> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            MERGING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let merged = Econmap::new_with_config(config).merged();
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING)
    }
    Ok(merged?)
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    fn run(&self, config: Config) -> EconmapCliResult<()>;
}

/// Source paths overriding those of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(long, help = "Path to the ECI CSV file")]
    eci: Option<String>,
    #[arg(long, help = "Path to the trade competitiveness CSV file")]
    trade: Option<String>,
    #[arg(long, help = "Path to the exposure matrix CSV file")]
    exposure: Option<String>,
    #[arg(
        long,
        help = "Path to the country boundaries (GeoJSON or FlatGeobuf) with an ADM0_A3 property"
    )]
    geo: Option<String>,
}

impl SourceArgs {
    fn apply(&self, mut config: Config) -> Config {
        let paths = &mut config.sources;
        for (arg, path) in [
            (&self.eci, &mut paths.eci),
            (&self.trade, &mut paths.trade),
            (&self.exposure, &mut paths.exposure),
            (&self.geo, &mut paths.geo),
        ] {
            if let Some(arg) = arg {
                *path = arg.clone();
            }
        }
        config
    }
}

/// The `merge` command runs the pipeline and outputs the merged table in a given format.
#[derive(Args, Debug)]
pub struct MergeCommand {
    #[arg(
        short = 'f',
        long,
        value_name = "geojson|geojsonseq|csv",
        default_value = "geojson",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
    #[arg(
        short = 'm',
        long,
        value_name = "METRIC",
        help = "Metric to shade the map by, recorded in GeoJSON output"
    )]
    metric: Option<Metric>,
    #[arg(
        long,
        value_name = "METRIC",
        help = "Add a `<METRIC>_clean` column with infinities, missing and negative values set to zero"
    )]
    clean: Option<Metric>,
    #[command(flatten)]
    source_args: SourceArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for MergeCommand {
    fn run(&self, config: Config) -> EconmapCliResult<()> {
        info!("Running `merge` subcommand");
        let config = self.source_args.apply(config);
        // Progress goes to the terminal, so only show it when results go to a file
        let quiet = self.quiet || self.output_file.is_none();
        let mut merged = merged_with_progress(config, quiet)?;
        if let Some(metric) = self.clean {
            merged = clean_for_display(&merged, metric.column())?;
        }
        debug!("{merged:#?}");

        let formatter = self.output_format.formatter(self.metric);
        write_output(formatter, merged, self.output_file.as_deref())?;
        Ok(())
    }
}

/// The `summary` command shows how many countries have a value for each metric.
#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[arg(long, help = "Print the summary as JSON")]
    json: bool,
    #[arg(
        short = 'n',
        long,
        value_name = "ROWS",
        help = "Also show the first ROWS rows of the merged table"
    )]
    rows: Option<usize>,
    #[command(flatten)]
    source_args: SourceArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for SummaryCommand {
    fn run(&self, config: Config) -> EconmapCliResult<()> {
        info!("Running `summary` subcommand");
        let config = self.source_args.apply(config);
        let merged = merged_with_progress(config, self.quiet || self.json)?;
        let summaries = MetricSummary::all(&merged)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }
        println!("{} countries in the geo reference", merged.height());
        display_summary(&summaries);
        if self.rows.is_some() {
            display_merged(merged, self.rows)?;
        }
        Ok(())
    }
}

/// The `metrics` command lists the metrics a map can be shaded by.
#[derive(Args, Debug)]
pub struct MetricsCommand {}

impl RunCommand for MetricsCommand {
    fn run(&self, _config: Config) -> EconmapCliResult<()> {
        display_metrics();
        Ok(())
    }
}

/// Merge economic complexity, trade and exposure datasets onto country boundaries
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, name = "econmap")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress to stdout. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Subcommands of the CLI, each dispatched through `RunCommand`.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Merge all datasets and write the result
    Merge(MergeCommand),
    /// Summarise the coverage of each metric in the merged table
    Summary(SummaryCommand),
    /// List the metrics a map can be shaded by
    Metrics(MetricsCommand),
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::str::FromStr;

    use super::*;

    fn write_sources(dir: &Path) -> SourceArgs {
        let write = |name: &str, contents: &str| {
            let path = dir.join(name);
            let mut file = File::create(&path).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
            Some(path.to_string_lossy().to_string())
        };
        SourceArgs {
            eci: write(
                "eci.csv",
                "country,variable,x2019\nAUS,eci_trade,1.1\nNZL,eci_trade,\n",
            ),
            trade: write(
                "trade.csv",
                "Economy ISO3,Indicator,Partner,Attribute 1,2018q1,2018q2,2018q3,2018q4\n\
                 AUS,Adjusted export market share - Quantity (delta log),World,All,-1,-2,-3,-4\n",
            ),
            exposure: write("exposure.csv", ",AUS,NZL\nAUS,0.5,0.2\nNZL,0.1,0.7\n"),
            geo: write(
                "world.geojson",
                r#"{"type": "FeatureCollection", "features": [
                    {"type": "Feature", "properties": {"ADM0_A3": "AUS"}, "geometry": {"type": "Point", "coordinates": [133.0, -25.0]}},
                    {"type": "Feature", "properties": {"ADM0_A3": "NZL"}, "geometry": {"type": "Point", "coordinates": [174.0, -41.0]}}
                ]}"#,
            ),
        }
    }

    #[test]
    fn test_merge_command() {
        let dir = tempfile::tempdir().unwrap();
        let output_file = dir.path().join("merged.csv");
        let merge_command = MergeCommand {
            output_format: OutputFormat::Csv,
            output_file: Some(output_file.to_string_lossy().to_string()),
            metric: None,
            clean: Some(Metric::QuantityMarketShare),
            source_args: write_sources(dir.path()),
            quiet: true,
        };
        let result = merge_command.run(Config::default());
        assert!(result.is_ok(), "{result:?}");

        let output = std::fs::read_to_string(output_file).unwrap();
        let rows: Vec<Vec<&str>> = output.lines().map(|line| line.split(',').collect()).collect();
        assert_eq!(
            rows[0],
            vec![
                "country_code",
                "eci_trade",
                "quantity_market_share",
                "self_exposure",
                "geometry",
                "quantity_market_share_clean"
            ]
        );
        assert_eq!(rows.len(), 3, "One row per country in the geo reference");
        // Geometry is checked in the formatter tests
        assert_eq!(rows[1][..4], ["AUS", "1.1", "-2.5", "0.5"]);
        assert_eq!(rows[1][5], "0.0");
        assert_eq!(rows[2][..4], ["NZL", "", "", "0.7"]);
        assert_eq!(rows[2][5], "0.0");
    }

    #[test]
    fn source_args_should_override_config() {
        let args = SourceArgs {
            geo: Some("world.fgb".into()),
            ..SourceArgs::default()
        };
        let config = args.apply(Config::default());
        assert_eq!(config.sources.geo, "world.fgb");
        assert_eq!(config.sources.eci, Config::default().sources.eci);
    }

    #[test]
    fn output_type_should_deserialize_properly() {
        let output_format = OutputFormat::from_str("GeoJSON");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "geojson format should be parsed correctly"
        );
        let output_format = OutputFormat::from_str("GeoJson");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSON,
            "parsing should be case insensitive"
        );
        let output_format = OutputFormat::from_str("geojsonseq");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::GeoJSONSeq,
            "correct variants should parse correctly"
        );
        let output_format = OutputFormat::from_str("shapefile");
        assert!(output_format.is_err(), "non listed formats should fail");
    }

    #[test]
    fn cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }
}

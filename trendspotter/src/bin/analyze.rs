//! Command-line entry point for running the detector panel on a data file.
//!
//! Registers the file with DataFusion, prints a dataset summary, runs the
//! default detector panel, and prints the report in the requested format.
//! Exits with status 1 when anomalies are found, so the binary can gate CI
//! jobs.

use datafusion::prelude::SessionContext;

use trendspotter::config::DetectionConfig;
use trendspotter::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
use trendspotter::logging::{init_logging, LoggingConfig};
use trendspotter::runner::DetectionRunner;
use trendspotter::sources::register_path;
use trendspotter::summary::DatasetSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

struct CliArgs {
    path: String,
    table: String,
    seed: Option<u64>,
    format: OutputFormat,
    use_colors: bool,
}

fn print_usage() {
    println!("Usage: trendspotter <path> [options]");
    println!();
    println!("Runs the anomaly detector panel on a CSV, NDJSON, or Parquet file.");
    println!();
    println!("Options:");
    println!("  --table NAME   Table name to register (default: data)");
    println!("  --seed N       Seed for the stochastic detectors (default: 0)");
    println!("  --json         Emit the report as JSON");
    println!("  --markdown     Emit the report as Markdown");
    println!("  --no-color     Disable colored output");
    println!("  -h, --help     Show this message");
    println!();
    println!("Exits with status 1 when anomalous rows are found.");
}

fn parse_args(args: &[String]) -> Result<Option<CliArgs>, Box<dyn std::error::Error>> {
    let mut path: Option<String> = None;
    let mut table = "data".to_string();
    let mut seed: Option<u64> = None;
    let mut format = OutputFormat::Human;
    let mut use_colors = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--table" => {
                i += 1;
                table = args
                    .get(i)
                    .cloned()
                    .ok_or("--table requires a value")?;
            }
            "--seed" => {
                i += 1;
                seed = Some(args.get(i).ok_or("--seed requires a value")?.parse()?);
            }
            "--json" => format = OutputFormat::Json,
            "--markdown" => format = OutputFormat::Markdown,
            "--no-color" => use_colors = false,
            "-h" | "--help" => return Ok(None),
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {other}").into());
            }
            other => {
                if path.is_some() {
                    return Err("only one input path is supported".into());
                }
                path = Some(other.to_string());
            }
        }
        i += 1;
    }

    let Some(path) = path else {
        return Ok(None);
    };
    Ok(Some(CliArgs {
        path,
        table,
        seed,
        format,
        use_colors,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    init_logging(LoggingConfig::default())?;

    let ctx = SessionContext::new();
    register_path(&ctx, &args.table, &args.path).await?;

    let mut config = DetectionConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let runner = DetectionRunner::builder()
        .table(&args.table)
        .config(config)
        .build();
    let report = runner.run(&ctx).await?;

    match args.format {
        OutputFormat::Human => {
            let batches = ctx.table(&args.table).await?.collect().await?;
            let summary = DatasetSummary::from_batches(&args.table, &batches)?;
            println!("{summary}");

            let formatter_config = FormatterConfig::default().with_colors(args.use_colors);
            let formatter = HumanFormatter::with_config(formatter_config);
            print!("{}", formatter.format(&report)?);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new();
            println!("{}", formatter.format(&report)?);
        }
        OutputFormat::Markdown => {
            let formatter = MarkdownFormatter::new();
            print!("{}", formatter.format(&report)?);
        }
    }

    if report.anomaly_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

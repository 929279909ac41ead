use anyhow::Context;
use clap::{Parser, Subcommand};
use datapages::aggregation::{AggregatedTable, ChartView, DOWNLOAD_FILE_NAME};
use datapages::config::{Config, ObservabilityConfig};
use datapages::ingest::{bootstrap_dataset, submit_spec_file};
use datapages::search::{ResultIndex, SearchConfig, SearchService, SpecRecord};
use datapages::{AppError, Explorer, SearchOutcome};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "datapages")]
#[command(version, about = "Search chart specifications and explore the data behind them", long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the spec directory
    Search {
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search, select a spec and print its aggregated data
    Explore {
        #[arg(value_name = "TEXT")]
        text: String,

        /// Title of the spec to show (defaults to the first result)
        #[arg(short, long)]
        select: Option<String>,

        /// Write the aggregated table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the Vega-Lite document instead of a text table
        #[arg(long)]
        vega: bool,

        /// Print a data URI for downloading the table
        #[arg(long)]
        link: bool,
    },

    /// Interactive search and select loop on stdin
    Session,

    /// Submit spec records from a JSON file
    #[command(name = "submit-spec")]
    SubmitSpec {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Replace the data store with a CSV file
    Bootstrap {
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {:#}", err);
        let code = err.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_validated(cli.config.as_deref())?;
    init_tracing(&config.observability);

    tracing::debug!(
        index_address = %config.directory.index_address.display(),
        spec_index = config.directory.spec_index_name.as_str(),
        data_index = config.directory.data_index_name.as_str(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Search { text, json } => {
            // Searching never touches the dataset
            let explorer = Explorer::with_dataset(&config, Arc::default())?;
            let outcome = explorer.search(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }

        Commands::Explore {
            text,
            select,
            output,
            vega,
            link,
        } => {
            let explorer = Explorer::new(&config)?;
            let outcome = explorer.search(&text).await?;
            let Some(references) = outcome.references() else {
                print_outcome(&outcome);
                return Ok(());
            };

            let record = pick(references, select.as_deref())?;
            let view = explorer.visualize(record)?;

            if vega {
                println!("{}", serde_json::to_string_pretty(&view.to_vega_lite())?);
            } else {
                print_view(&view);
            }

            if let Some(path) = output {
                let csv = view.table.to_csv().map_err(AppError::from)?;
                tokio::fs::write(&path, csv)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }

            if link {
                println!("{} {}", DOWNLOAD_FILE_NAME, view.table.download_link().map_err(AppError::from)?);
            }
        }

        Commands::Session => run_session(&config).await?,

        Commands::SubmitSpec { path } => {
            let service = SearchService::new(SearchConfig::from(&config));
            let submitted = submit_spec_file(&service, &path, &config.directory.spec_index_name).await?;
            println!("Submitted {} spec(s) to '{}'", submitted, config.directory.spec_index_name);
        }

        Commands::Bootstrap { csv } => {
            let rows = bootstrap_dataset(&csv, &config.directory.index_address, &config.directory.data_index_name).await?;
            println!("Loaded {} rows into '{}'", rows, config.directory.data_index_name);
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datapages={}", observability.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_session(config: &Config) -> anyhow::Result<()> {
    let explorer = Explorer::new(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("search> ")?;
        let Some(text) = lines.next_line().await? else {
            break;
        };
        if text.trim().is_empty() {
            continue;
        }

        let outcome = match explorer.search(&text).await {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("error: {}", err);
                continue;
            }
        };
        print_outcome(&outcome);
        let Some(references) = outcome.references() else {
            continue;
        };

        prompt("select> ")?;
        let Some(choice) = lines.next_line().await? else {
            break;
        };
        let Some(record) = choose(references, choice.trim()) else {
            eprintln!("No spec titled '{}'", choice.trim());
            continue;
        };

        match explorer.visualize(record) {
            Ok(view) => print_view(&view),
            Err(err) => eprintln!("error: {}", err),
        }
    }

    Ok(())
}

fn prompt(label: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()
}

/// Select by title, or by 1-based position when the input is a number
fn choose<'a>(references: &'a ResultIndex, choice: &str) -> Option<&'a SpecRecord> {
    if let Some(record) = references.get(choice) {
        return Some(record);
    }
    let position: usize = choice.parse().ok()?;
    references.records().nth(position.checked_sub(1)?)
}

fn pick<'a>(references: &'a ResultIndex, select: Option<&str>) -> anyhow::Result<&'a SpecRecord> {
    match select {
        Some(title) => references
            .get(title)
            .ok_or_else(|| AppError::NotFound(format!("no spec titled '{}' in the results", title)).into()),
        None => references
            .records()
            .next()
            .ok_or_else(|| AppError::NotFound("no results to select".to_string()).into()),
    }
}

fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::NoMatches { query } => {
            println!("No specs match '{}'", query);
        }
        SearchOutcome::Matches {
            total,
            truncated,
            references,
            ..
        } => {
            if *truncated {
                println!(
                    "{} specs matched, showing the first {}; refine the search to see others",
                    total,
                    references.len()
                );
            }
            for (position, record) in references.records().enumerate() {
                println!("{:>2}. {}  {}", position + 1, record.title, record.description);
            }
        }
    }
}

fn print_view(view: &ChartView) {
    println!("{}", view.title);
    if !view.description.is_empty() {
        println!("{}", view.description);
    }
    println!();
    print_table(&view.table);
}

fn print_table(table: &AggregatedTable) {
    let rendered: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rendered
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(table.columns().iter().map(String::as_str).collect()));
    for row in &rendered {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

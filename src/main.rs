use anyhow::{Context, Result};
use chartcode::resolve::Environment;
use chartcode::{data, parser, runtime, EncoderConfig};
use clap::Parser;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chartcode")]
#[command(about = "Build Google Chart URLs from chart scripts", long_about = None)]
struct Args {
    /// Chart script (e.g., 'chart { chart-data [1, 2, 3] }'); read from stdin when omitted
    script: Option<String>,

    /// JSON object whose keys become script variables
    #[arg(long)]
    context: Option<PathBuf>,

    /// CSV file whose columns become list variables, keyed by header
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON encoder settings; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every render as JSON instead of one URL per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let source = match args.script {
        Some(script) => script,
        None => {
            let mut script = String::new();
            io::stdin()
                .read_to_string(&mut script)
                .context("Failed to read script from stdin")?;
            script
        }
    };

    let config: EncoderConfig = match &args.config {
        Some(path) => serde_json::from_reader(open(path)?)
            .with_context(|| format!("Invalid config file {}", path.display()))?,
        None => EncoderConfig::default(),
    };

    let mut env = Environment::new();
    if let Some(path) = &args.context {
        let value: Value = serde_json::from_reader(open(path)?)
            .with_context(|| format!("Invalid context file {}", path.display()))?;
        env.extend(data::values_from_json(value)?);
    }
    if let Some(path) = &args.data {
        let columns = data::columns_from_csv(open(path)?)
            .with_context(|| format!("Failed to load data from {}", path.display()))?;
        env.extend(columns);
    }

    let script = parser::parse(&source)?;
    let rendered = runtime::run_script(&script, &mut env, &config)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut handle, &rendered).context("Failed to write JSON")?;
        writeln!(handle)?;
    } else {
        for chart in &rendered {
            writeln!(handle, "{}", chart.image.url).context("Failed to write to stdout")?;
        }
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

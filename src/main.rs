use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate, Shell};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use kennel_genetics::analysis::{cross_pairs, PairingAnalyzer};
use kennel_genetics::{
    Config, FileDiscovery, GenotypeNormalizer, InMemorySource, PairingResult, ProcessingOrder,
    ReportFormat, ReportGenerator,
};

/// Genotype normalization and pairing compatibility for breeding kennels
#[derive(Parser, Debug)]
#[command(
    name = "kennel-genetics",
    version,
    about = "Normalize lab genetic tests and estimate sire/dam pairing compatibility",
    long_about = r#"
Reads dog genetic test records exported from the kennel database and:
- Normalizes color panels and health-marker results into canonical genotypes
- Scores sire/dam pairings on shared color loci
- Predicts potential puppy coat colors, including dilutes
- Flags shared carrier conditions and breed-specific risks

Record files may be CSV, TSV or JSON, optionally gzip-compressed.
Estimates are illustrative only.
"#
)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// TOML file overriding lookup tables and normalizer settings
    #[arg(short, long, global = true, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Override the test processing order
    #[arg(long, global = true, value_enum)]
    order: Option<ProcessingOrder>,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, global = true, default_value = "0")]
    threads: usize,

    /// Interactive mode with prompts for a single pairing
    #[arg(short, long, help = "Interactive mode with default values")]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print canonical genotypes as JSON
    Normalize {
        #[command(flatten)]
        input: InputArgs,

        /// Only normalize this dog
        #[arg(long, value_name = "ID")]
        dog: Option<String>,
    },
    /// Estimate a single sire/dam pairing
    Pair {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_name = "ID")]
        sire: String,

        #[arg(long, value_name = "ID")]
        dam: String,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Estimate many pairings and write reports
    Batch {
        #[command(flatten)]
        input: InputArgs,

        /// CSV file with sire_id,dam_id columns
        #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath, conflicts_with_all = ["sires", "dams"])]
        pairs: Option<PathBuf>,

        /// Candidate sires (comma-separated)
        #[arg(long, value_delimiter = ',', requires = "dams")]
        sires: Vec<String>,

        /// Candidate dams (comma-separated)
        #[arg(long, value_delimiter = ',', requires = "sires")]
        dams: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        format: OutputFormat,

        /// Output directory for reports
        #[arg(short, long, default_value = "./reports")]
        output: PathBuf,
    },
    /// Show the active lookup tables
    Tables,
    /// List supported record file formats
    Formats,
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(clap::Args, Debug, Clone)]
struct InputArgs {
    /// Record files or directories
    #[arg(required = true, num_args = 1.., value_hint = ValueHint::AnyPath)]
    records: Vec<PathBuf>,

    /// Recursively search directories
    #[arg(short, long)]
    recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Html,
    Csv,
    Json,
    Tsv,
    All,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> ReportFormat {
        match format {
            OutputFormat::Html => ReportFormat::Html,
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Tsv => ReportFormat::Tsv,
            OutputFormat::All => ReportFormat::All,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PairRow {
    sire_id: String,
    dam_id: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load_or_default(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config.as_deref().unwrap_or(Path::new("")).display()
        )
    })?;
    if let Some(order) = cli.order {
        config.normalizer.order = order;
    }

    init_thread_pool(cli.threads)?;

    if cli.interactive {
        return run_interactive_mode(config);
    }

    match cli.command {
        Some(Commands::Normalize { input, dog }) => run_normalize(&input, dog.as_deref(), config),
        Some(Commands::Pair {
            input,
            sire,
            dam,
            json,
        }) => run_pair(&input, &sire, &dam, json, config),
        Some(Commands::Batch {
            input,
            pairs,
            sires,
            dams,
            format,
            output,
        }) => {
            // Without a pair list every loaded sire/dam combination is evaluated
            let pairs = match pairs {
                Some(path) => Some(read_pairs(&path)?),
                None if !sires.is_empty() => Some(cross_pairs(&sires, &dams)),
                None => None,
            };
            run_batch(&input, pairs, format, &output, config)
        }
        Some(Commands::Tables) => print_tables(&config),
        Some(Commands::Formats) => {
            list_formats();
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
        None => Ok(()),
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn list_formats() {
    println!("{}", style("Supported Record Formats:").bold().cyan());
    println!();

    let formats = vec![
        (
            "CSV",
            "Comma-separated (.csv, .csv.gz)",
            "One row per test: dog_id, breed, test_type, test_date, result, lab_name",
        ),
        (
            "TSV",
            "Tab-separated (.tsv, .txt, .tsv.gz)",
            "Same columns as CSV",
        ),
        (
            "JSON",
            "JSON (.json, .json.gz)",
            "Array of {dogId, breed, tests: [{testType, testDate, result, labName}]}",
        ),
    ];

    for (name, ext, desc) in formats {
        println!("  {} - {}", style(name).green().bold(), style(ext).yellow());
        println!("         {}", style(desc).dim());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("kennel_genetics={}", level))
        .with_writer(io::stderr)
        .init();
}

fn init_thread_pool(threads: usize) -> Result<()> {
    let num_threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| anyhow!("Failed to initialize thread pool: {}", e))?;

    Ok(())
}

fn load_source(input: &InputArgs) -> Result<InMemorySource> {
    let files = FileDiscovery::new(input.recursive).discover(&input.records)?;
    if files.is_empty() {
        bail!("No record files found");
    }
    info!("Found {} record files", files.len());

    let source = InMemorySource::from_files(&files).context("Failed to load dog records")?;
    info!("Loaded records for {} dogs", source.len());
    Ok(source)
}

fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open pairs file {}", path.display()))?;

    reader
        .deserialize::<PairRow>()
        .map(|row| -> Result<(String, String)> {
            let row = row.with_context(|| format!("Invalid row in {}", path.display()))?;
            Ok((row.sire_id, row.dam_id))
        })
        .collect()
}

fn run_normalize(input: &InputArgs, dog: Option<&str>, config: Config) -> Result<()> {
    let source = load_source(input)?;
    let normalizer = GenotypeNormalizer::with_config(config.normalizer);

    let genotypes: Vec<_> = source
        .records()
        .filter(|record| dog.map_or(true, |id| record.dog_id == id))
        .map(|record| normalizer.normalize(record))
        .collect();

    if let Some(id) = dog {
        if genotypes.is_empty() {
            bail!("could not load genetic data for dog {}", id);
        }
    }

    println!("{}", serde_json::to_string_pretty(&genotypes)?);
    Ok(())
}

fn run_pair(input: &InputArgs, sire: &str, dam: &str, json: bool, config: Config) -> Result<()> {
    let source = load_source(input)?;
    let analyzer = PairingAnalyzer::with_config(source, config);
    let result = analyzer.evaluate_pair(sire, dam)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn run_batch(
    input: &InputArgs,
    pairs: Option<Vec<(String, String)>>,
    format: OutputFormat,
    output: &Path,
    config: Config,
) -> Result<()> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading dog records...");
    let source = load_source(input)?;
    let pairs = pairs.unwrap_or_else(|| source.all_pairs());
    pb.set_position(30);

    pb.set_message(format!("Evaluating {} pairings...", pairs.len()));
    let analyzer = PairingAnalyzer::with_config(source, config);
    let mut results = Vec::with_capacity(pairs.len());
    for ((sire, dam), outcome) in pairs.iter().zip(analyzer.evaluate_pairs(&pairs)) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => warn!("Skipping pairing {} x {}: {}", sire, dam, e),
        }
    }
    pb.set_position(80);

    pb.set_message("Generating reports...");
    let generator = ReportGenerator::new(output)?;
    let written = generator.generate(&results, format.into())?;
    pb.set_position(100);

    pb.finish_with_message("Analysis complete!");

    println!(
        "\n{} {} of {} pairings evaluated",
        style("✓").green().bold(),
        results.len(),
        pairs.len()
    );
    for path in written {
        println!("  {}", style(path.display()).cyan());
    }

    Ok(())
}

fn print_tables(config: &Config) -> Result<()> {
    println!("{}", style("Active configuration:").bold().cyan());
    println!();
    print!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);
    Ok(())
}

fn print_summary(result: &PairingResult) {
    let score = format!("{}%", result.compatibility_score);
    let score = if result.compatibility_score > 80 {
        style(score).green().bold()
    } else if result.compatibility_score > 50 {
        style(score).yellow().bold()
    } else {
        style(score).red().bold()
    };

    println!(
        "{} {} x {}",
        style("Pairing").bold().cyan(),
        style(&result.sire_id).bold(),
        style(&result.dam_id).bold()
    );
    println!("  Compatibility: {}", score);
    println!("  Shares known traits: {}", result.is_compatible);

    print_list("Matched traits", &result.matched_traits);
    print_list("Conflicting traits", &result.conflicting_traits);
    let colors: Vec<String> = result.potential_colors.iter().cloned().collect();
    print_list("Potential colors", &colors);
    print_list("Health risks", &result.health_risks);
}

fn print_list(title: &str, items: &[String]) {
    println!("  {}:", title);
    if items.is_empty() {
        println!("    {}", style("none").dim());
    }
    for item in items {
        println!("    - {}", item);
    }
}

fn run_interactive_mode(config: Config) -> Result<()> {
    println!(
        "{}",
        style("╔══════════════════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        Kennel Genetics Pairing - Interactive Mode            ║")
            .cyan()
            .bold()
    );
    println!(
        "{}",
        style("╚══════════════════════════════════════════════════════════════╝").cyan()
    );
    println!();

    let theme = ColorfulTheme::default();

    let records_input: String = Input::with_theme(&theme)
        .with_prompt("Record files/directories (space-separated)")
        .default(".".to_string())
        .interact_text()?;

    let recursive = Confirm::with_theme(&theme)
        .with_prompt("Enable recursive directory search?")
        .default(true)
        .interact()?;

    let input = InputArgs {
        records: records_input.split_whitespace().map(PathBuf::from).collect(),
        recursive,
    };
    let source = load_source(&input)?;
    let dogs = source.dog_ids().to_vec();
    if dogs.len() < 2 {
        bail!("At least two dogs are needed for a pairing");
    }

    let sire_idx = Select::with_theme(&theme)
        .with_prompt("Select sire")
        .default(0)
        .items(&dogs)
        .interact()?;

    let dam_idx = Select::with_theme(&theme)
        .with_prompt("Select dam")
        .default(if sire_idx == 0 { 1 } else { 0 })
        .items(&dogs)
        .interact()?;

    let orders = vec!["As recorded (last test wins)", "Most recent test wins"];
    let order_idx = Select::with_theme(&theme)
        .with_prompt("Test processing order")
        .default(match config.normalizer.order {
            ProcessingOrder::Input => 0,
            ProcessingOrder::OldestFirst => 1,
        })
        .items(&orders)
        .interact()?;

    let mut config = config;
    config.normalizer.order = match order_idx {
        1 => ProcessingOrder::OldestFirst,
        _ => ProcessingOrder::Input,
    };

    let analyzer = PairingAnalyzer::with_config(source, config);
    let result = analyzer.evaluate_pair(&dogs[sire_idx], &dogs[dam_idx])?;

    println!();
    print_summary(&result);
    Ok(())
}

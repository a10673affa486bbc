//! kijiji-map - Scrape Kijiji apartment listings and plot them on a map

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use kijiji_map::commands::{PagesCommand, ScrapeCommand};
use kijiji_map::config::{is_valid_ceiling, Config, OutputFormat, Secrets};
use kijiji_map::filters::ExclusionSet;
use kijiji_map::pagination::PageCount;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kijiji-map",
    version,
    about = "Scrape Kijiji apartment listings and plot them on a map",
    long_about = "Walks Kijiji search results, geocodes each listing's address, drops excluded or over-budget listings, and writes a static HTML map."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Credentials file (geocoding_api_key, maps_js_api_key)
    #[arg(long, global = true, env = "KMAP_SECRETS")]
    secrets: Option<PathBuf>,

    /// JSON array of listing links to skip
    #[arg(long, global = true, env = "KMAP_EXCLUSIONS")]
    exclusions: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listings and render the map (default)
    #[command(alias = "s")]
    Scrape(ScrapeArgs),

    /// Print the results-page URLs a scrape would visit
    Pages {
        /// Search URL template with a {page} placeholder
        #[arg(long)]
        url: Option<String>,

        /// Number of pages, or "auto"
        #[arg(short, long)]
        pages: Option<PageCount>,
    },
}

#[derive(Args, Default)]
struct ScrapeArgs {
    /// Search URL template with a {page} placeholder
    #[arg(long)]
    url: Option<String>,

    /// Number of pages, or "auto"
    #[arg(short, long)]
    pages: Option<PageCount>,

    /// Drop listings above this monthly price
    #[arg(long, value_parser = parse_ceiling)]
    max_price: Option<f64>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Delay before each listing fetch in milliseconds
    #[arg(long, env = "KMAP_DELAY")]
    delay: Option<u64>,

    /// Give up on a throttled results page after this many fetches
    #[arg(long)]
    throttle_attempts: Option<u32>,

    /// Prompt for search URL, price ceiling and output file
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(secrets) = cli.secrets {
        config.secrets = secrets;
    }
    if let Some(exclusions) = cli.exclusions {
        config.exclusions = exclusions;
    }

    match cli.command.unwrap_or_else(|| Commands::Scrape(ScrapeArgs::default())) {
        Commands::Scrape(args) => {
            apply_scrape_args(&mut config, &args);

            if args.interactive {
                prompt_run_parameters(&mut config)?;
            }

            config.validate()?;

            // Both files are required; fail before touching the network
            let secrets = Secrets::from_file(&config.secrets)?;
            let exclusions = ExclusionSet::load(&config.exclusions)?;

            let cmd = ScrapeCommand::new(config.clone());
            let report = cmd.execute(&secrets, exclusions).await?;

            let markers = report.accepted.iter().filter(|l| l.has_marker()).count();
            println!(
                "Wrote {} listings ({} on the map) to {}",
                report.accepted.len(),
                markers,
                config.output.display()
            );
            println!(
                "Rejected {} ({} out of price range); {} throttled pages skipped",
                report.rejected.len(),
                report.out_of_range().count(),
                report.throttled_pages.len()
            );
        }

        Commands::Pages { url, pages } => {
            if let Some(url) = url {
                config.search_url = url;
            }
            if let Some(pages) = pages {
                config.pages = pages;
            }

            let output = PagesCommand::new(config).execute().await?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn parse_ceiling(s: &str) -> Result<f64, String> {
    let ceiling: f64 = s.parse().map_err(|_| format!("Invalid price: {}", s))?;
    if !is_valid_ceiling(ceiling) {
        return Err(format!("Price must be a non-negative number, got {}", s));
    }
    Ok(ceiling)
}

fn apply_scrape_args(config: &mut Config, args: &ScrapeArgs) {
    if let Some(url) = &args.url {
        config.search_url = url.clone();
    }
    if let Some(pages) = args.pages {
        config.pages = pages;
    }
    if let Some(max_price) = args.max_price {
        config.price_ceiling = max_price;
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(delay) = args.delay {
        config.delay_ms = delay;
    }
    if let Some(attempts) = args.throttle_attempts {
        config.throttle_max_attempts = Some(attempts);
    }
}

fn prompt_run_parameters(config: &mut Config) -> Result<()> {
    let theme = ColorfulTheme::default();

    config.search_url = Input::with_theme(&theme)
        .with_prompt("Search URL ({page} marks the page segment)")
        .default(config.search_url.clone())
        .interact_text()?;

    config.price_ceiling = Input::with_theme(&theme)
        .with_prompt("Maximum price")
        .default(config.price_ceiling)
        .validate_with(|price: &f64| -> Result<(), &str> {
            if is_valid_ceiling(*price) {
                Ok(())
            } else {
                Err("Price must be a non-negative number")
            }
        })
        .interact_text()?;

    let output: String = Input::with_theme(&theme)
        .with_prompt("Output file")
        .default(config.output.display().to_string())
        .interact_text()?;
    config.output = PathBuf::from(output);

    Ok(())
}

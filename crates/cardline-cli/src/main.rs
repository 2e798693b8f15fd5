//! cardline - batch card artwork pipeline
//!
//! Resolves card names and set codes to artwork through Scryfall, downloads
//! the images, and re-hosts them on Imgur, recording every row's outcome in
//! CSV tables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use cmd::RunOptions;
use config::Config;

#[derive(Parser)]
#[command(name = "cardline")]
#[command(about = "Batch-download card images from Scryfall and re-host them on Imgur")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// CSV with `Card Name` and `Set Code` columns
    #[arg(short, long, global = true, default_value = "input/example.csv")]
    input_file: PathBuf,

    /// Directory for result and error tables [default: output/]
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Imgur client ID (falls back to config / IMGUR_CLIENT_ID)
    #[arg(short = 'u', long, global = true)]
    client_id: Option<String>,

    /// Only retry rows recorded in the previous error tables
    #[arg(short, long, global = true)]
    fixup: bool,

    /// Directory for downloaded images [default: card_images/]
    #[arg(long, global = true)]
    image_dir: Option<PathBuf>,

    /// Rows between rate-limit pauses (0 disables pacing)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Rate-limit pause in milliseconds
    #[arg(long, global = true)]
    pause_ms: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./cardline.toml or ~/.config/cardline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    /// Resolve and download card images
    Download,
    /// Upload downloaded images to Imgur
    Publish,
    /// Download, then publish (default)
    All,
    /// Show current configuration
    Config,
}

impl Cli {
    fn run_options(&self, config: &Config) -> RunOptions {
        RunOptions {
            input_file: self.input_file.clone(),
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| config.output.default_dir.clone()),
            image_dir: self
                .image_dir
                .clone()
                .unwrap_or_else(|| config.output.image_dir.clone()),
            client_id: self
                .client_id
                .clone()
                .or_else(|| config.imgur.client_id.clone()),
            fixup: self.fixup,
            pacing: cardline_core::PacingPolicy {
                batch_size: self.batch_size.unwrap_or(config.pacing.batch_size),
                pause: Duration::from_millis(self.pause_ms.unwrap_or(config.pacing.pause_ms)),
            },
            scryfall_url: config.scryfall.base_url.clone(),
            imgur_url: config.imgur.api_url.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = cardline_core::ProgressContext::new();
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    cardline_core::init_logging(cli.debug, multi);

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    cardline_core::set_http_config(config.http.into());

    let opts = cli.run_options(&config);
    match cli.command.unwrap_or(Command::All) {
        Command::Download => cmd::download::run(&opts, &progress).map(drop),
        Command::Publish => cmd::publish::run(&opts, &progress).map(drop),
        Command::All => cmd::run_all(&opts, &progress),
        Command::Config => {
            print_config(&opts, &config);
            Ok(())
        }
    }
}

fn print_config(opts: &RunOptions, config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Input file", &opts.input_file.display().to_string()]);
    table.add_row(vec!["Output directory", &opts.output_dir.display().to_string()]);
    table.add_row(vec!["Image directory", &opts.image_dir.display().to_string()]);
    table.add_row(vec!["Scryfall URL", &opts.scryfall_url]);
    table.add_row(vec!["Imgur URL", &opts.imgur_url]);
    table.add_row(vec![
        "Imgur client ID",
        if opts.client_id.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "Pacing",
        &format!(
            "{} rows / {}ms",
            opts.pacing.batch_size,
            opts.pacing.pause.as_millis()
        ),
    ]);
    table.add_row(vec![
        "Timeouts",
        &format!(
            "connect {}s, request {}s",
            config.http.connect_timeout, config.http.request_timeout
        ),
    ]);

    eprintln!("\n{table}");
}

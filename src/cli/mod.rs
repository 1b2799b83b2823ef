pub mod commands;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pindown", version)]
#[command(
    about = "Pull down recent bookmarks from Pinboard and write them to Markdown files",
    long_about = None
)]
pub struct Cli {
    /// Directory to write Markdown files to
    pub output: PathBuf,

    /// Debug mode: render everything but don't write any files
    #[arg(short, long)]
    pub debug: bool,

    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Text file with stopwords, one per line [default: stopwords.txt]
    #[arg(short, long)]
    pub stopwords: Option<PathBuf>,

    /// Jinja template for output files [default: template.md]
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Olson-style timezone (e.g. Australia/Adelaide)
    #[arg(short = 'z', long)]
    pub timezone: Option<String>,

    /// Settings file [default: ~/.config/pindown/config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sync state file [default: ~/.config/pindown/state.toml]
    #[arg(long)]
    pub state: Option<PathBuf>,
}

impl Cli {
    /// Log filter directive for the requested verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

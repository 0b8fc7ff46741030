//! Command-line interface definition.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "waychord", version, about = "Chord-driven scrolling window manager core")]
pub struct Cli {
    /// Validate the configuration file and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dfrename")]
#[command(author, version, about, long_about = None)]
#[command(about = "Organize an SD card into the numbered layout the DFPlayer Mini expects")]
pub struct Args {
    /// Root directory of the SD card
    pub root: PathBuf,

    /// Show what would change without modifying the filesystem
    #[arg(short, long)]
    pub dry: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Delete folders that contain no audio files instead of numbering them
    #[arg(long)]
    pub prune_empty: bool,

    /// Print the plan as JSON (with --dry)
    #[arg(long, requires = "dry")]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

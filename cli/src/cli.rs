use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "mkninja")]
#[command(about = "Generate build.ninja in the current directory from a tree of mkninja.build scripts")]
#[command(version)]
pub struct Args {
    /// Directory holding the root mkninja.build
    pub source_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Manifest helper to invoke from generated commands
    #[arg(long, value_name = "path")]
    pub manifest: Option<PathBuf>,

    /// Glob helper to invoke from generated commands
    #[arg(long, value_name = "path")]
    pub findglob: Option<PathBuf>,

    /// Stamp helper to invoke from generated commands
    #[arg(long, value_name = "path")]
    pub stamp: Option<PathBuf>,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_counts() {
        let args = Args::parse_from(["mkninja", "-vv", "src"]);
        assert_eq!(args.log_level(), "debug");
        assert_eq!(args.source_dir, PathBuf::from("src"));

        let args = Args::parse_from(["mkninja", "src", "--stamp", "/opt/stamp"]);
        assert_eq!(args.log_level(), "warn");
        assert_eq!(args.stamp, Some(PathBuf::from("/opt/stamp")));
    }
}

use clap::Parser;
use std::path::PathBuf;

// Build version with decoder info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (png, jpeg, tga, bmp, gif)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Image sequence player
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Folder of images to play (PNG, JPEG, TGA, BMP, GIF), sorted by name
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Load player settings from JSON file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tick interval in milliseconds (overrides config)
    #[arg(short = 'i', long = "interval", value_name = "MS")]
    pub interval_ms: Option<i64>,

    /// Enable looping
    #[arg(short = 'o', long = "loop", value_name = "0|1")]
    pub loop_playback: Option<u8>,

    /// Start frame number (0-based)
    #[arg(long = "frame", value_name = "N")]
    pub start_frame: Option<usize>,

    /// Exit after N finished laps
    #[arg(long = "laps", value_name = "N", default_value_t = 1)]
    pub laps: usize,

    /// Enable debug logging to file (default: seqplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl Args {
    /// Loop flag from `--loop`, if given
    pub fn looping(&self) -> Option<bool> {
        self.loop_playback.map(|v| v != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["seqplay", "renders/walk"]).unwrap();
        assert_eq!(args.folder, PathBuf::from("renders/walk"));
        assert_eq!(args.laps, 1);
        assert_eq!(args.looping(), None);
        assert!(args.log_file.is_none());
        assert_eq!(args.verbosity, 0);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "seqplay", "shots", "--interval", "40", "-o", "1", "--frame", "3", "--laps", "4", "-l",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.interval_ms, Some(40));
        assert_eq!(args.looping(), Some(true));
        assert_eq!(args.start_frame, Some(3));
        assert_eq!(args.laps, 4);
        assert_eq!(args.log_file, Some(None));
        assert_eq!(args.verbosity, 2);
    }

    #[test]
    fn test_folder_required() {
        assert!(Args::try_parse_from(["seqplay"]).is_err());
    }
}

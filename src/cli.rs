//! Command-line argument parsing
//!
//! Supports:
//! - Loading a file into an editor session
//! - Filtering its lines by keyword (substring or fuzzy)
//! - Dumping the session state as JSON

use clap::Parser;
use std::path::PathBuf;

use crate::config::EditorConfig;
use crate::search::MatchMode;

/// Filter the lines of a file through the editor pipeline
#[derive(Parser, Debug)]
#[command(
    name = "editflow",
    version,
    about = "Filter the lines of a file through the editor pipeline"
)]
pub struct CliArgs {
    /// File to load
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Only show lines matching KEYWORD
    #[arg(short = 'f', long, value_name = "KEYWORD")]
    pub filter: Option<String>,

    /// Fuzzy-match instead of substring-match
    #[arg(long)]
    pub fuzzy: bool,

    /// Match case exactly
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Print the session state as JSON after loading
    #[arg(long)]
    pub dump: bool,
}

/// What to do, with CLI flags layered over the loaded config
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub file: PathBuf,
    /// Empty when no filter was given
    pub keyword: String,
    pub match_mode: MatchMode,
    pub ignore_case: bool,
    pub dump: bool,
}

impl RunConfig {
    pub fn filtering(&self) -> bool {
        !self.keyword.is_empty()
    }
}

impl CliArgs {
    /// Merge parsed CLI args with config file preferences
    pub fn into_config(self, config: &EditorConfig) -> RunConfig {
        let match_mode = if self.fuzzy {
            MatchMode::Fuzzy
        } else {
            config.filter.match_mode
        };

        RunConfig {
            file: self.file,
            keyword: self.filter.unwrap_or_default(),
            match_mode,
            ignore_case: config.filter.ignore_case && !self.case_sensitive,
            dump: self.dump,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(filter: Option<&str>) -> CliArgs {
        CliArgs {
            file: PathBuf::from("notes.txt"),
            filter: filter.map(str::to_string),
            fuzzy: false,
            case_sensitive: false,
            dump: false,
        }
    }

    #[test]
    fn test_no_filter_means_not_filtering() {
        let run = args(None).into_config(&EditorConfig::default());
        assert!(!run.filtering());
        assert_eq!(run.match_mode, MatchMode::Substring);
        assert!(run.ignore_case);
    }

    #[test]
    fn test_fuzzy_flag_overrides_config() {
        let mut cli = args(Some("todo"));
        cli.fuzzy = true;
        let run = cli.into_config(&EditorConfig::default());
        assert!(run.filtering());
        assert_eq!(run.match_mode, MatchMode::Fuzzy);
    }

    #[test]
    fn test_case_sensitive_flag() {
        let mut cli = args(Some("todo"));
        cli.case_sensitive = true;
        let run = cli.into_config(&EditorConfig::default());
        assert!(!run.ignore_case);
    }

    #[test]
    fn test_parse_from_command_line() {
        let cli =
            CliArgs::try_parse_from(["editflow", "a.txt", "--filter", "x", "--dump"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("a.txt"));
        assert_eq!(cli.filter.as_deref(), Some("x"));
        assert!(cli.dump);
    }
}

use clap::builder::PossibleValuesParser;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::charset::{CHARSETS, DEFAULT_CHARSET};
use crate::io::DEFAULT_PACKAGE_NAME;

/// What to do when the output file already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExistingOutput {
    /// Leave the file alone and report success (`-n`)
    Skip,
    /// Replace the file (`-O`)
    Overwrite,
    /// Fail; neither flag was given
    Refuse,
}

/// How the response body reaches the output.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainMode {
    /// Pipe when the output supports it, pump otherwise
    Auto,
    /// Always forward into the output's native sink
    Pipe,
    /// Always read and write chunk by chunk
    Pump,
}

#[derive(Parser, Debug)]
#[command(name = "archpick")]
#[command(version)]
#[command(
    about = "Pick entries from a remote archive and download them as one zip",
    long_about = None
)]
#[command(after_help = "Examples:\n  \
  archpick -l https://example.com/data.7z        show the entry tree\n  \
  archpick https://example.com/data.tar docs/    download everything below docs/\n  \
  archpick -p https://example.com/a.zip '*.csv' | bsdtar -tf -   pack all csv files to stdout\n  \
  archpick --index 0 -f gz https://example.com/app.log.gz       decompress to app.log")]
pub struct Cli {
    /// Archive URL
    #[arg(value_name = "URL", required_unless_present = "check_server")]
    pub url: Option<String>,

    /// Entries to download: keys, names or glob patterns (default: all)
    #[arg(value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// Archive proxy server
    #[arg(
        short = 's',
        long = "server",
        value_name = "URL",
        env = "ARCHIVE_PROXY_SERVER",
        default_value = "http://127.0.0.1:8080"
    )]
    pub server: String,

    /// Encoding of entry names inside the archive
    #[arg(
        short = 'c',
        long = "charset",
        value_name = "NAME",
        default_value = DEFAULT_CHARSET,
        value_parser = PossibleValuesParser::new(CHARSETS)
    )]
    pub charset: String,

    /// Archive format, skipping detection (zip, tar, 7z, rar)
    #[arg(short = 'f', long = "format", value_name = "TYPE")]
    pub format: Option<String>,

    /// List entries as a tree
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (archive type, counts, full keys)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "ENTRY", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Output file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the download to stdout, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Never overwrite an existing output file
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite an existing output file WITHOUT prompting
    #[arg(short = 'O', long = "overwrite")]
    pub overwrite: bool,

    /// Download a single entry as-is instead of packing a zip
    #[arg(long = "raw")]
    pub raw: bool,

    /// Download the entry at position N (from 0) as-is, without listing;
    /// also fetches single-file .gz, .xz and .bz2 archives
    #[arg(
        long = "index",
        value_name = "N",
        conflicts_with_all = ["raw", "list", "verbose", "entries", "exclude"]
    )]
    pub index: Option<usize>,

    /// Drain strategy for the download
    #[arg(long = "drain", value_enum, default_value_t = DrainMode::Auto)]
    pub drain: DrainMode,

    /// Check that the proxy server is reachable and exit
    #[arg(long = "check-server")]
    pub check_server: bool,

    /// Connect timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Output file for a download of `entry` (or of a packed zip).
    pub fn output_path(&self, entry: Option<&str>) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }
        entry
            .and_then(|e| e.rsplit('/').find(|s| !s.is_empty()))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_NAME))
    }

    /// Output file for a download by `--index`.
    ///
    /// A compressed single file is named after the archive without its
    /// compression suffix, anything else `entry-N`.
    pub fn index_output_path(&self, archive_url: &str, index: usize) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }
        let name = archive_url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').find(|s| !s.is_empty()));
        name.and_then(|name| {
            [".gz", ".xz", ".bz2"]
                .iter()
                .find_map(|suffix| name.strip_suffix(suffix))
                .filter(|stem| !stem.is_empty())
        })
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("entry-{index}")))
    }

    /// How to treat an output file that is already there.
    pub fn existing_output(&self) -> ExistingOutput {
        if self.never_overwrite {
            ExistingOutput::Skip
        } else if self.overwrite {
            ExistingOutput::Overwrite
        } else {
            ExistingOutput::Refuse
        }
    }

    /// `env_logger` filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.debug {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["archpick", "https://example.com/a.zip"]).expect("parse");
        assert_eq!(cli.charset, "utf-8");
        assert_eq!(cli.drain, DrainMode::Auto);
        assert_eq!(cli.output_path(None), PathBuf::from("package.zip"));
        assert!(cli.entries.is_empty());
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let args = ["archpick", "-c", "latin-9", "https://example.com/a.zip"];
        let result = Cli::try_parse_from(args);
        assert!(result.is_err());
    }

    #[test]
    fn url_is_optional_only_for_server_check() {
        assert!(Cli::try_parse_from(["archpick"]).is_err());
        assert!(Cli::try_parse_from(["archpick", "--check-server"]).is_ok());
    }

    #[test]
    fn raw_download_is_named_after_entry() {
        let args = ["archpick", "--raw", "https://example.com/a.zip", "docs/readme.md"];
        let cli = Cli::try_parse_from(args).expect("parse");
        assert_eq!(cli.output_path(Some("docs/readme.md")), PathBuf::from("readme.md"));
    }

    #[test]
    fn existing_output_needs_a_flag() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).expect("parse");
        let url = "https://example.com/a.zip";
        assert_eq!(parse(&["archpick", url]).existing_output(), ExistingOutput::Refuse);
        assert_eq!(parse(&["archpick", "-n", url]).existing_output(), ExistingOutput::Skip);
        assert_eq!(
            parse(&["archpick", "-O", url]).existing_output(),
            ExistingOutput::Overwrite
        );
    }

    #[test]
    fn index_download_is_named_after_compressed_file() {
        let url = "https://example.com/logs/app.log.gz?sig=1";
        let cli = Cli::try_parse_from(["archpick", "--index", "0", url]).expect("parse");
        assert_eq!(cli.index, Some(0));
        assert_eq!(cli.index_output_path(url, 0), PathBuf::from("app.log"));
        assert_eq!(
            cli.index_output_path("https://example.com/a.zip", 3),
            PathBuf::from("entry-3")
        );

        let cli = Cli::try_parse_from(["archpick", "--index", "3", "-o", "out.bin", url])
            .expect("parse");
        assert_eq!(cli.index_output_path(url, 3), PathBuf::from("out.bin"));
    }

    #[test]
    fn index_excludes_entry_selection() {
        let url = "https://example.com/a.zip";
        assert!(Cli::try_parse_from(["archpick", "--index", "1", url, "a.txt"]).is_err());
        assert!(Cli::try_parse_from(["archpick", "--index", "1", "--raw", url]).is_err());
        assert!(Cli::try_parse_from(["archpick", "--index", "-1", url]).is_err());
    }
}

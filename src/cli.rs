//! Command-line interface for casement hosts.
//!
//! Hosts hand their process arguments to [`parse_args`] and pass the result
//! into window configurations and `reload`.

use casement_config::ParsedArgs;
use clap::Parser;
use std::ffi::OsString;

/// casement - window lifecycle flags
#[derive(Parser, Debug)]
#[command(name = "casement")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or folders to open
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Compare two files with each other
    #[arg(short, long)]
    pub diff: bool,

    /// Perform a three-way merge
    #[arg(short, long)]
    pub merge: bool,

    /// Wait for the files to be closed before returning
    #[arg(short, long)]
    pub wait: bool,

    /// Open a file at the path on the specified line and column
    #[arg(short, long)]
    pub goto: bool,

    /// Path of an extension under development
    #[arg(long, value_name = "PATH")]
    pub extension_development_path: Vec<String>,

    /// Path of the extension test runner
    #[arg(long, value_name = "PATH")]
    pub extension_tests_path: Option<String>,

    /// Debug session identifier
    #[arg(long, value_name = "ID")]
    pub debug_id: Option<String>,

    /// JSON environment for the extension host
    #[arg(long, value_name = "JSON")]
    pub extension_environment: Option<String>,

    /// Allow debugging of the extension host
    #[arg(long, value_name = "PORT")]
    pub inspect_extensions: Option<String>,

    /// Allow debugging of the extension host, paused after start
    #[arg(long, value_name = "PORT")]
    pub inspect_brk_extensions: Option<String>,

    /// Alternate extensions directory
    #[arg(long, value_name = "DIR")]
    pub extensions_dir: Option<String>,

    /// Run under the smoke-test driver
    #[arg(long)]
    pub enable_smoke_test_driver: bool,

    /// Call-stack sample interval while unresponsive (milliseconds)
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub unresponsive_sample_interval: Option<i64>,

    /// Call-stack sampling period while unresponsive (milliseconds)
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub unresponsive_sample_period: Option<i64>,

    /// Print verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Disable all installed extensions
    #[arg(long)]
    pub disable_extensions: bool,

    /// Remote authority to connect to
    #[arg(long, value_name = "AUTHORITY")]
    pub remote: Option<String>,
}

impl From<Cli> for ParsedArgs {
    fn from(cli: Cli) -> Self {
        ParsedArgs {
            paths: cli.paths,
            diff: cli.diff,
            merge: cli.merge,
            wait: cli.wait,
            goto: cli.goto,
            extension_development_path: (!cli.extension_development_path.is_empty())
                .then_some(cli.extension_development_path),
            extension_tests_path: cli.extension_tests_path,
            debug_id: cli.debug_id,
            extension_environment: cli.extension_environment,
            inspect_extensions: cli.inspect_extensions,
            inspect_brk_extensions: cli.inspect_brk_extensions,
            extensions_dir: cli.extensions_dir,
            enable_smoke_test_driver: cli.enable_smoke_test_driver,
            unresponsive_sample_interval: cli.unresponsive_sample_interval,
            unresponsive_sample_period: cli.unresponsive_sample_period,
            verbose: cli.verbose,
            disable_extensions: cli.disable_extensions,
            remote: cli.remote,
        }
    }
}

/// Parse an argument vector (program name first) into [`ParsedArgs`].
pub fn parse_args<I, T>(args: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map(ParsedArgs::from)
}

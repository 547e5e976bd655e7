//! Command-line interface definitions.
//!
//! There is a single command: build the legacy and modern bundles. Arguments
//! that are not defined here are dropped before clap sees them, so wrappers can
//! forward their own argv without tripping the parser.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, CommandFactory, Parser};
use twinpack_bundler::BuildFlags;

/// Build a package as CommonJS and ES modules.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "twinpack", version, about, long_about = None)]
pub struct Cli {
    /// Minify both bundles
    #[arg(long)]
    pub minify: bool,

    /// Keep rebuilding both bundles when sources change
    #[arg(long)]
    pub watch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Path to a twinpack.config.json file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse `args`, ignoring anything the CLI does not define.
    ///
    /// Returns the parsed CLI and the arguments that were dropped. Help,
    /// version and conflicting flags still exit through clap.
    pub fn parse_lenient<I, T>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (known, ignored) = split_known_args(args);
        (Self::parse_from(known), ignored)
    }

    pub fn flags(&self) -> BuildFlags {
        BuildFlags {
            minify: self.minify,
            watch: self.watch,
        }
    }
}

/// Split argv into what the CLI understands and what it does not.
///
/// The first element is the program name and is always kept. A recognised
/// option that takes a value keeps the following token as its value unless
/// written as `--opt=value`. Bare words and unknown options are dropped.
pub fn split_known_args<I, T>(args: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let command = Cli::command();
    let mut args = args.into_iter().map(Into::into);
    let mut known = Vec::new();
    let mut ignored = Vec::new();

    if let Some(program) = args.next() {
        known.push(program);
    }

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        match lookup(command.get_arguments(), &text) {
            Some(takes_value) => {
                let inline = text.contains('=');
                known.push(arg);
                if takes_value && !inline {
                    if let Some(value) = args.next() {
                        known.push(value);
                    }
                }
            }
            None => ignored.push(text),
        }
    }

    (known, ignored)
}

/// `Some(takes_value)` when `arg` names a defined option.
fn lookup<'a>(mut defined: impl Iterator<Item = &'a Arg>, arg: &str) -> Option<bool> {
    if matches!(arg, "-h" | "--help" | "-V" | "--version") {
        return Some(false);
    }

    let name = arg.split_once('=').map_or(arg, |(name, _)| name);
    let is_match = |def: &&Arg| {
        if let Some(long) = name.strip_prefix("--") {
            return def.get_long() == Some(long);
        }
        let mut short = name.strip_prefix('-').unwrap_or_default().chars();
        match (short.next(), short.next()) {
            (Some(c), None) => def.get_short() == Some(c),
            _ => false,
        }
    };

    defined
        .find(is_match)
        .map(|def| def.get_action().takes_values())
}

pub mod run;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use interlace_common::config::{self, Config, InputSource, Verbosity};
use interlace_common::error::ValidationError;
use interlace_common::target::TargetSpec;
use interlace_common::{input, warn};

#[derive(Parser, Debug)]
#[command(name = "interlace", version)]
#[command(
    about = "Turn single threaded command line tools into fast, parallel batch jobs with CIDR and glob support."
)]
pub struct CommandLine {
    /// A target in comma, CIDR, range or glob notation, or a single target
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// A file with one target per line
    #[arg(long, visible_alias = "tL", value_name = "FILE")]
    pub target_list: Option<PathBuf>,

    /// Exclusions in comma, CIDR, range or glob notation
    #[arg(short = 'e', long)]
    pub exclusions: Option<String>,

    /// A file with one exclusion per line
    #[arg(long, visible_alias = "eL", value_name = "FILE")]
    pub exclusions_list: Option<PathBuf>,

    /// A single command template to run for every target
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// A file with one command template per line
    #[arg(long, visible_alias = "cL", value_name = "FILE")]
    pub command_list: Option<PathBuf>,

    /// Maximum number of commands running at once
    #[arg(long, default_value_t = config::DEFAULT_THREADS)]
    pub threads: usize,

    /// Command timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT.as_secs(), value_name = "SECONDS")]
    pub timeout: u64,

    /// Run the whole batch this many times
    #[arg(long, default_value_t = config::DEFAULT_REPEAT)]
    pub repeat: usize,

    /// Do not expand CIDR blocks into individual hosts
    #[arg(long)]
    pub no_cidr: bool,

    /// Value for _output_
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Value for _port_
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Value for _proto_
    #[arg(long)]
    pub proto: Option<String>,

    /// Value for _realport_
    #[arg(long, visible_alias = "rp")]
    pub realport: Option<String>,

    /// A file with one proxy per line, handed out round-robin as _proxy_
    #[arg(long, visible_alias = "pL", value_name = "FILE")]
    pub proxy_list: Option<PathBuf>,

    /// A directory of files whose lines are drawn at random as _random_
    #[arg(long, value_name = "DIR")]
    pub random: Option<PathBuf>,

    /// Strip all colours from the output
    #[arg(long)]
    pub no_color: bool,

    /// Hide the progress bar
    #[arg(long, visible_alias = "sober")]
    pub no_bar: bool,

    /// Only print command output and errors
    #[arg(long)]
    pub silent: bool,

    /// Print every command, its exit status and stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether piped stdin feeds this run, as targets or as glob candidates.
    ///
    /// A target list is read and parsed here so stdin is only consumed when
    /// one of its entries is a glob. Unusable input answers `false` and is
    /// reported by validation later.
    fn wants_stdin(&self) -> bool {
        let lines = match (&self.target, &self.target_list) {
            (None, None) => return true,
            (Some(target), _) => vec![target.clone()],
            (None, Some(path)) => match input::read_lines(path) {
                Ok(lines) => lines,
                Err(_) => return false,
            },
        };
        TargetSpec::from_lines(&lines).is_ok_and(|spec| spec.has_glob())
    }

    /// Validates the flags, reading piped stdin when there is some.
    pub fn into_config_from_stdin(self) -> Result<Config, ValidationError> {
        let stdin = std::io::stdin();
        let piped = if !stdin.is_terminal() && self.wants_stdin() {
            match input::read_lines_from(stdin.lock()) {
                Ok(lines) => Some(lines),
                Err(e) => {
                    warn!("Ignoring unreadable stdin: {e}");
                    None
                }
            }
        } else {
            None
        };
        self.into_config(piped)
    }

    /// Validates the flags into a [`Config`].
    ///
    /// `piped` are the lines read from stdin, if any. Without a target flag
    /// they are the targets, otherwise the candidates for glob patterns.
    pub fn into_config(self, piped: Option<Vec<String>>) -> Result<Config, ValidationError> {
        if self.target.is_some() && self.target_list.is_some() {
            return Err(ValidationError::Conflict("--target", "--target-list"));
        }
        if self.exclusions.is_some() && self.exclusions_list.is_some() {
            return Err(ValidationError::Conflict("--exclusions", "--exclusions-list"));
        }
        if self.command.is_some() && self.command_list.is_some() {
            return Err(ValidationError::Conflict("--command", "--command-list"));
        }
        if self.verbose && self.silent {
            return Err(ValidationError::Conflict("--verbose", "--silent"));
        }
        if self.threads == 0 {
            return Err(ValidationError::ZeroThreads);
        }

        let piped = piped.filter(|lines| !lines.is_empty());
        let (targets, candidates) = match (self.target, self.target_list, piped) {
            (Some(target), None, piped) => (InputSource::Inline(target), piped.unwrap_or_default()),
            (None, Some(path), piped) => (InputSource::File(path), piped.unwrap_or_default()),
            (None, None, Some(lines)) => (InputSource::Lines(lines), Vec::new()),
            _ => return Err(ValidationError::Missing("--target", "--target-list")),
        };

        let exclusions = match (self.exclusions, self.exclusions_list) {
            (Some(exclusions), _) => Some(InputSource::Inline(exclusions)),
            (None, Some(path)) => Some(InputSource::File(path)),
            (None, None) => None,
        };

        let commands = match (self.command, self.command_list) {
            (Some(command), _) => InputSource::Inline(command),
            (None, Some(path)) => InputSource::File(path),
            (None, None) => return Err(ValidationError::Missing("--command", "--command-list")),
        };

        let verbosity = if self.verbose {
            Verbosity::Verbose
        } else if self.silent {
            Verbosity::Silent
        } else {
            Verbosity::Normal
        };

        Ok(Config {
            targets,
            exclusions,
            commands,
            candidates,
            threads: self.threads,
            timeout: Duration::from_secs(self.timeout),
            repeat: self.repeat,
            cidr_expansion: !self.no_cidr,
            output: self.output,
            port: self.port,
            proto: self.proto,
            realport: self.realport,
            proxy_list: self.proxy_list,
            random_dir: self.random,
            verbosity,
            no_color: self.no_color,
            no_bar: self.no_bar,
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_THREADS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_REPEAT: usize = 1;

/// Where a list input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A value given directly on the command line.
    Inline(String),
    /// A line-delimited file.
    File(PathBuf),
    /// Lines that were already read, e.g. from piped stdin.
    Lines(Vec<String>),
}

/// How much the terminal front-end prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Only command output and errors.
    Silent,
    #[default]
    Normal,
    /// Also the command lines, exit statuses and stderr.
    Verbose,
}

/// The validated run configuration.
///
/// Built once from the command line, then handed to the target expander,
/// the task generator and the worker pool.
#[derive(Debug, Clone)]
pub struct Config {
    pub targets: InputSource,
    pub exclusions: Option<InputSource>,
    pub commands: InputSource,
    /// Candidate values that glob targets are matched against.
    pub candidates: Vec<String>,

    pub threads: usize,
    pub timeout: Duration,
    pub repeat: usize,
    /// Expand CIDR blocks into hosts. When off, blocks are literal targets.
    pub cidr_expansion: bool,

    pub output: Option<String>,
    pub port: Option<String>,
    pub proto: Option<String>,
    pub realport: Option<String>,
    pub proxy_list: Option<PathBuf>,
    pub random_dir: Option<PathBuf>,

    pub verbosity: Verbosity,
    pub no_color: bool,
    pub no_bar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: InputSource::Lines(Vec::new()),
            exclusions: None,
            commands: InputSource::Lines(Vec::new()),
            candidates: Vec::new(),
            threads: DEFAULT_THREADS,
            timeout: DEFAULT_TIMEOUT,
            repeat: DEFAULT_REPEAT,
            cidr_expansion: true,
            output: None,
            port: None,
            proto: None,
            realport: None,
            proxy_list: None,
            random_dir: None,
            verbosity: Verbosity::default(),
            no_color: false,
            no_bar: false,
        }
    }
}

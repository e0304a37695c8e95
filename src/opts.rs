//! Runtime configuration options.

use std::env;
use std::fmt;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use getopts::Options;
use radee_common::sim;
use tracing::Level;

use crate::input::ConfigReader;
use crate::input::hard_code::HardCodedConfig;
use crate::input::json::JSONConfigReader;

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
pub enum Error {
    /// An option is missing its required argument.
    ArgumentMissing(&'static str),
    /// Parsing command line failed.
    CLI(getopts::Fail),
    /// User requested to see help, not run the program.
    Help(String),
    /// User passed an invalid option.
    Invalid(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CLI(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            ArgumentMissing(arg) => write!(f, "missing argument for '{}' option", arg),
            CLI(ref e) => write!(f, "{}", e),
            Help(ref help_msg) => write!(f, "Program help:\n{}", help_msg),
            Invalid(ref opt) => write!(f, "Invalid option: {}", opt),
        }
    }
}

impl From<getopts::Fail> for Error {
    fn from(e: getopts::Fail) -> Error {
        Error::CLI(e)
    }
}

#[derive(Debug)]
pub struct Configuration {
    config_reader: Box<dyn ConfigReader>,
    csv_path: Option<PathBuf>,
    echo: bool,
    demo: bool,
    edge_interval: Duration,
    sample_limit: Option<u64>,
    log_level: Level,
}

impl Configuration {
    pub fn get_config_reader(&self) -> &dyn ConfigReader {
        self.config_reader.as_ref()
    }

    /// File samples are appended to, if any.
    pub fn csv_path(&self) -> Option<&Path> {
        self.csv_path.as_ref().map(|p| p.as_path())
    }

    /// Print samples to the console.
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Use the simulated bus instead of the Raspberry Pi.
    pub fn demo(&self) -> bool {
        self.demo
    }

    /// Edge interval of the simulated bus.
    pub fn edge_interval(&self) -> Duration {
        self.edge_interval
    }

    pub fn sample_limit(&self) -> Option<u64> {
        self.sample_limit
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }
}

fn create_options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config-format", "select a configuration format (json, default)", "FORMAT");
    opts.optopt("o", "csv", "append samples to a CSV file", "FILE");
    opts.optflag("q", "quiet", "do not print samples");
    opts.optflag("d", "demo", "generate samples without hardware");
    opts.optopt("i", "interval", "time between simulated edges", "MS");
    opts.optopt("n", "count", "stop after this many samples", "N");
    opts.optopt("l", "log-level", "error, warn, info, debug or trace", "LEVEL");
    opts.optflag("h", "help", "show help");

    opts
}

pub fn parse() -> Result<Configuration> {
    let cli_args: Vec<_> = env::args().collect();
    parse_args(&cli_args)
}

/// Parse a full argument list, program name included.
pub fn parse_args(cli_args: &[String]) -> Result<Configuration> {
    let opts = create_options();
    let matches = opts.parse(cli_args.iter().skip(1))?;

    if matches.opt_present("h") {
        let program = cli_args.get(0).map(|s| s.as_str()).unwrap_or("radee");
        let brief = format!("Usage: {} [ options ] [ config ]", program);
        return Err(Error::Help(opts.usage(&brief)));
    }

    // Free arguments.
    let config_path = matches.free.get(0);

    let format = match matches.opt_str("config-format") {
        Some(format) => format,
        // Default to JSON when a file is given, otherwise the built-in wiring.
        None => if config_path.is_some() { "json".to_string() } else { "default".to_string() },
    };
    let config_reader: Box<dyn ConfigReader> = match format.as_str() {
        "json" => {
            let path = config_path.ok_or(Error::ArgumentMissing("config"))?;
            Box::new(JSONConfigReader::new(Path::new(path)))
        },
        "default" => Box::new(HardCodedConfig::new()),
        _ => {
            let msg = format!("{} is not a configuration format", format);
            return Err(Error::Invalid(msg));
        },
    };

    let edge_interval = match matches.opt_str("interval") {
        Some(ms) => {
            let ms = parse_number(&ms, "interval")?;
            if ms == 0 {
                return Err(Error::Invalid("interval must be at least 1 ms".to_string()));
            }
            Duration::from_millis(ms)
        },
        None => sim::DEFAULT_EDGE_INTERVAL,
    };

    let sample_limit = match matches.opt_str("count") {
        Some(n) => {
            let n = parse_number(&n, "count")?;
            if n == 0 {
                return Err(Error::Invalid("count must be at least 1".to_string()));
            }
            Some(n)
        },
        None => None,
    };

    let log_level = match matches.opt_str("log-level") {
        Some(level) => level.parse::<Level>()
            .map_err(|_| Error::Invalid(format!("{} is not a log level", level)))?,
        None => Level::INFO,
    };

    Ok(Configuration {
        config_reader,
        csv_path: matches.opt_str("csv").map(PathBuf::from),
        echo: !matches.opt_present("quiet"),
        demo: matches.opt_present("demo"),
        edge_interval,
        sample_limit,
        log_level,
    })
}

fn parse_number(text: &str, opt: &str) -> Result<u64> {
    text.parse::<u64>()
        .map_err(|_| Error::Invalid(format!("{} for '{}' is not a number", text, opt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("radee")
            .chain(list.iter().cloned())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults() {
        let config = parse_args(&args(&[])).unwrap();
        assert!(config.echo());
        assert!(!config.demo());
        assert_eq!(config.csv_path(), None);
        assert_eq!(config.sample_limit(), None);
        assert_eq!(config.log_level(), Level::INFO);
        assert_eq!(config.edge_interval(), sim::DEFAULT_EDGE_INTERVAL);
        assert!(config.get_config_reader().read().is_ok());
    }

    #[test]
    fn all_options() {
        let config = parse_args(&args(&[
            "-q", "-d", "-i", "250", "-n", "10", "-o", "sample.csv", "-l", "debug",
        ])).unwrap();
        assert!(!config.echo());
        assert!(config.demo());
        assert_eq!(config.edge_interval(), Duration::from_millis(250));
        assert_eq!(config.sample_limit(), Some(10));
        assert_eq!(config.csv_path(), Some(Path::new("sample.csv")));
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn json_needs_path() {
        match parse_args(&args(&["-c", "json"])) {
            Err(Error::ArgumentMissing("config")) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(parse_args(&args(&["board.json"])).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        for bad in &[
            &["-c", "yaml"][..],
            &["-n", "ten"][..],
            &["-n", "0"][..],
            &["-i", "0"][..],
            &["-l", "loud"][..],
        ] {
            match parse_args(&args(bad)) {
                Err(Error::Invalid(_)) => (),
                other => panic!("{:?} gave {:?}", bad, other),
            }
        }
    }

    #[test]
    fn help_requested() {
        match parse_args(&args(&["-h"])) {
            Err(Error::Help(usage)) => assert!(usage.contains("--config-format")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

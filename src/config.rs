//! CLI and environment configuration for the two binaries.
//!
//! Flags use a short getopt-style surface. The database path may also
//! come from the `TEMPER_DB` environment variable (a `.env` file is
//! honored), so a service unit can omit `-f`.

use std::env;
use std::path::PathBuf;

/// Output style bits for `temper-stats`.
pub const STYLE_RECORDS: u8 = 1;
pub const STYLE_STATS: u8 = 2;

/// Default polling interval in seconds when `-l` is given without a value.
pub const DEFAULT_SLEEP_SECS: u64 = 300;

/// Default record count for `temper-stats -n`.
pub const DEFAULT_N_RECORDS: u32 = 10;

/// Configuration for the acquisition binary.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Raise the log filter to debug.
    pub verbose: bool,
    /// Which attached TEMPer sensor to open (0-indexed).
    pub device_index: usize,
    /// Signed calibration offset in raw sensor units.
    pub calibration: i32,
    /// `Some(secs)`: poll every `secs` seconds until terminated.
    /// `None`: take a single reading and exit.
    pub loop_interval: Option<u64>,
    /// Print Fahrenheit alongside Celsius on console output.
    pub fahrenheit: bool,
    /// Persist to this SQLite file; print to stdout when absent.
    pub database: Option<PathBuf>,
    /// Print the database schema and exit.
    pub print_schema: bool,
}

impl LoggerConfig {
    /// Parse the logger's argument list (`args` excludes the program
    /// name). The database path falls back to `TEMPER_DB` from the
    /// environment or a `.env` file.
    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        dotenv::dotenv().ok();

        let mut config = LoggerConfig {
            verbose: false,
            device_index: 0,
            calibration: 0,
            loop_interval: None,
            fahrenheit: false,
            database: None,
            print_schema: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" => config.verbose = true,
                "-F" => config.fahrenheit = true,
                "-S" => config.print_schema = true,
                "-l" => {
                    config.loop_interval = Some(parse_value(&arg, args.next())?);
                }
                "-a" => {
                    config.calibration = parse_value(&arg, args.next())?;
                }
                "-d" => {
                    config.device_index = parse_value(&arg, args.next())?;
                }
                "-f" => {
                    let path: String = take_value(&arg, args.next())?;
                    config.database = Some(PathBuf::from(path));
                }
                other => return Err(format!("unknown option {}, use -h for help", other)),
            }
        }

        if config.database.is_none() {
            if let Ok(path) = env::var("TEMPER_DB") {
                config.database = Some(PathBuf::from(path));
            }
        }

        if let Some(0) = config.loop_interval {
            return Err("-l SLEEP_SECS must be greater than zero".to_string());
        }

        Ok(config)
    }

    pub fn usage(progname: &str) -> String {
        format!(
            "USAGE: {progname} [-h] [-v] [-S] [-F] [-d DEVICE_NUM] [-l SLEEP_SECS] [-a CALIBRATION] [-f SQLITE_FILE]\n\
             \x20 OPTIONS:\n\
             \x20   -h ............... show this help\n\
             \x20   -v ............... verbose/debug mode\n\
             \x20   -d DEVICE_NUM .... open the DEVICE_NUM'th attached sensor, default 0\n\
             \x20   -l SLEEP_SECS .... loop every SLEEP_SECS seconds; without -l a\n\
             \x20                      single reading is taken (default interval {DEFAULT_SLEEP_SECS})\n\
             \x20   -a CALIBRATION ... increase or decrease the raw reading by\n\
             \x20                      CALIBRATION sensor units for device calibration\n\
             \x20   -F ............... also print degrees Fahrenheit\n\
             \x20   -f SQLITE_FILE ... log to this sqlite3 database instead of stdout\n\
             \x20                      (TEMPER_DB in the environment or .env also works)\n\
             \x20   -S ............... print sqlite3 DB schema and exit\n\
             \x20                      init DB with: {progname} -S | sqlite3 SQLITE_FILE\n"
        )
    }
}

/// Configuration for the analytics binary.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// SQLite file to query; must already exist.
    pub database: PathBuf,
    /// Last-N record count; 0 enables the lookback modes.
    pub record_count: u32,
    pub lookback_hours: u64,
    pub lookback_days: u64,
    /// Bitmask of [`STYLE_RECORDS`] and [`STYLE_STATS`].
    pub style: u8,
}

impl StatsConfig {
    /// Parse the analytics tool's argument list (`args` excludes the
    /// program name).
    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        dotenv::dotenv().ok();

        let mut database = None;
        let mut config = StatsConfig {
            database: PathBuf::new(),
            record_count: DEFAULT_N_RECORDS,
            lookback_hours: 0,
            lookback_days: 0,
            style: STYLE_RECORDS | STYLE_STATS,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-f" => {
                    let path: String = take_value(&arg, args.next())?;
                    database = Some(PathBuf::from(path));
                }
                "-n" => config.record_count = parse_value(&arg, args.next())?,
                "-H" => config.lookback_hours = parse_value(&arg, args.next())?,
                "-D" => config.lookback_days = parse_value(&arg, args.next())?,
                "-s" => config.style = parse_value(&arg, args.next())?,
                other => return Err(format!("unknown option {}, use -h for help", other)),
            }
        }

        if database.is_none() {
            if let Ok(path) = env::var("TEMPER_DB") {
                database = Some(PathBuf::from(path));
            }
        }
        config.database = database.ok_or("sqlite_file not provided, use -f or TEMPER_DB")?;

        Ok(config)
    }

    /// Seconds of lookback selected by the hour/day flags; days take
    /// precedence over hours.
    pub fn lookback_secs(&self) -> u64 {
        if self.lookback_days > 0 {
            self.lookback_days * 60 * 60 * 24
        } else {
            self.lookback_hours * 60 * 60
        }
    }

    pub fn usage(progname: &str) -> String {
        format!(
            "USAGE: {progname} [options] <-f SQLITE_FILE>\n\
             \x20 ARGUMENTS:\n\
             \x20   -f SQLITE_FILE ... query SQLITE_FILE for temp logs\n\
             \x20                      (TEMPER_DB in the environment or .env also works)\n\
             \x20 OPTIONS:\n\
             \x20   -n N_RECORDS ..... query N_RECORDS records from DB, default={DEFAULT_N_RECORDS}\n\
             \x20   -H HOURS ......... query last HOURS worth of records\n\
             \x20   -D DAYS .......... query last DAYS worth of records\n\
             \x20                      days take precedence over hours\n\
             \x20                      set -n 0 to use days or hours\n\
             \x20   -s STYLE ......... print style, bit mask:\n\
             \x20                      1 = individual records\n\
             \x20                      2 = summary stats\n\
             \x20                      3 = both records and stats (default)\n\
             \x20   -h ............... show this help\n"
        )
    }
}

fn take_value(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("option {} requires a value", flag))
}

fn parse_value<T>(flag: &str, value: Option<String>) -> Result<T, String>
where
    T: std::str::FromStr,
{
    take_value(flag, value)?
        .parse()
        .map_err(|_| format!("option {} requires a numeric value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn logger_defaults_are_single_shot_console() {
        let config = LoggerConfig::from_args(strings(&[])).expect("parse");
        assert!(!config.verbose);
        assert_eq!(config.device_index, 0);
        assert_eq!(config.calibration, 0);
        assert_eq!(config.loop_interval, None);
        assert!(!config.print_schema);
    }

    #[test]
    fn logger_flags_parse() {
        let config = LoggerConfig::from_args(strings(&[
            "-v", "-d", "1", "-l", "60", "-a", "-128", "-F", "-f", "/tmp/temps.db",
        ]))
        .expect("parse");
        assert!(config.verbose);
        assert_eq!(config.device_index, 1);
        assert_eq!(config.loop_interval, Some(60));
        assert_eq!(config.calibration, -128);
        assert!(config.fahrenheit);
        assert_eq!(config.database, Some(PathBuf::from("/tmp/temps.db")));
    }

    #[test]
    fn logger_rejects_unknown_and_valueless_flags() {
        assert!(LoggerConfig::from_args(strings(&["-x"])).is_err());
        assert!(LoggerConfig::from_args(strings(&["-l"])).is_err());
        assert!(LoggerConfig::from_args(strings(&["-a", "cold"])).is_err());
    }

    #[test]
    fn stats_requires_a_database_path() {
        // Only when the environment does not provide one either.
        if env::var("TEMPER_DB").is_err() {
            assert!(StatsConfig::from_args(strings(&["-n", "5"])).is_err());
        }
    }

    #[test]
    fn stats_flags_parse_with_defaults() {
        let config =
            StatsConfig::from_args(strings(&["-f", "/tmp/temps.db", "-n", "0", "-H", "6"]))
                .expect("parse");
        assert_eq!(config.record_count, 0);
        assert_eq!(config.lookback_secs(), 6 * 3600);
        assert_eq!(config.style, STYLE_RECORDS | STYLE_STATS);
    }

    #[test]
    fn days_take_precedence_over_hours() {
        let config = StatsConfig::from_args(strings(&[
            "-f", "/tmp/temps.db", "-H", "6", "-D", "2",
        ]))
        .expect("parse");
        assert_eq!(config.lookback_secs(), 2 * 86400);
    }
}

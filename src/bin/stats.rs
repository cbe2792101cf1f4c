//! Query historical readings and print records and/or summary statistics.

use std::env;
use std::process;

use log::error;

use temper_etl::config::{StatsConfig, STYLE_RECORDS, STYLE_STATS};
use temper_etl::database::fetch_readings;
use temper_etl::stats::calc_temp_stats;
use temper_etl::utils::{celsius_to_fahrenheit, format_timestamp};
use temper_etl::{QueryWindow, Reading, TempStats};

fn main() {
    let args: Vec<String> = env::args().collect();
    let progname = args.first().map(String::as_str).unwrap_or("temper-stats");
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print!("{}", StatsConfig::usage(progname));
        return;
    }

    let config = match StatsConfig::from_args(args[1..].to_vec()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprint!("{}", StatsConfig::usage(progname));
            process::exit(1);
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    if !config.database.exists() {
        eprintln!("ERROR: no such database file {}", config.database.display());
        process::exit(1);
    }

    let window = QueryWindow::from_flags(config.record_count, config.lookback_secs());
    let readings = match fetch_readings(&config.database, &window) {
        Ok(readings) => readings,
        Err(e) => {
            error!("Query failed: {}", e);
            process::exit(1);
        }
    };

    if config.style & STYLE_STATS != 0 {
        match calc_temp_stats(&readings) {
            Ok(stats) => print_stats(&stats),
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        }
    }

    if config.style & STYLE_RECORDS != 0 {
        print_records(&readings);
    }
}

fn print_stats(stats: &TempStats) {
    println!("STATS:");
    println!("  n ..... {}", stats.n);
    println!(
        "  min ... {:5.1} C, {:5.1} F @ {}",
        stats.min,
        celsius_to_fahrenheit(stats.min),
        format_timestamp(stats.min_time)
    );
    println!(
        "  max ... {:5.1} C, {:5.1} F @ {}",
        stats.max,
        celsius_to_fahrenheit(stats.max),
        format_timestamp(stats.max_time)
    );
    println!(
        "  med ... {:5.1} C, {:5.1} F",
        stats.median,
        celsius_to_fahrenheit(stats.median)
    );
    println!(
        "  avg ... {:5.1} C, {:5.1} F",
        stats.mean,
        celsius_to_fahrenheit(stats.mean)
    );
    println!(
        "  std ... {:5.1} C, {:5.1} F",
        stats.std_dev,
        celsius_to_fahrenheit(stats.std_dev)
    );
}

fn print_records(readings: &[Reading]) {
    for reading in readings {
        println!(
            "{} [{}]: {:.1} deg F ({:.1} deg C)",
            format_timestamp(reading.timestamp),
            reading.timestamp,
            celsius_to_fahrenheit(reading.tempc),
            reading.tempc
        );
    }
}

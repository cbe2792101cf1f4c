//! Acquisition loop: poll the TEMPer sensor and print or persist samples.

use std::env;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use time::OffsetDateTime;

use temper_etl::config::{LoggerConfig, DEFAULT_SLEEP_SECS};
use temper_etl::database::{store_reading, DB_SCHEMA};
use temper_etl::utils::{celsius_to_fahrenheit, format_timestamp};
use temper_etl::{Reading, TemperDevice};

fn main() {
    let args: Vec<String> = env::args().collect();
    let progname = args.first().map(String::as_str).unwrap_or("temper-logger");
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print!("{}", LoggerConfig::usage(progname));
        return;
    }

    let config = match LoggerConfig::from_args(args[1..].to_vec()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprint!("{}", LoggerConfig::usage(progname));
            process::exit(1);
        }
    };

    if config.print_schema {
        print!("{}", DB_SCHEMA);
        return;
    }

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(if config.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(&config) {
        error!("Fatal error: {}", e);
        process::exit(1);
    }
}

fn run(config: &LoggerConfig) -> temper_etl::Result<()> {
    info!(
        "Opening TEMPer sensor {} (calibration {})",
        config.device_index, config.calibration
    );
    let mut device = TemperDevice::open(config.device_index, config.calibration)?;

    // Termination is cooperative: the flag is checked at the top of the
    // loop, so an in-flight poll or retry-sleep finishes first.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .expect("Failed to listen for Ctrl+C");
    }

    let mut looping = config.loop_interval.is_some();
    let interval = Duration::from_secs(config.loop_interval.unwrap_or(DEFAULT_SLEEP_SECS));

    loop {
        if stop.load(Ordering::SeqCst) {
            info!("Program terminated by user. Exiting gracefully.");
            break;
        }

        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        match &config.database {
            Some(path) => match device.read_celsius() {
                Ok(tempc) => {
                    let reading = Reading { timestamp, tempc };
                    if let Err(e) = store_reading(path, &reading) {
                        error!("Failed to store reading: {}", e);
                        // Repeated persistence failure stops the loop, not
                        // just the write.
                        looping = false;
                    } else {
                        info!(
                            "Stored {:.2}C at {}",
                            tempc,
                            format_timestamp(timestamp)
                        );
                    }
                }
                Err(e) => warn!("Skipping persistence for failed poll: {}", e),
            },
            None => {
                let tempc = device.temperature_or_sentinel();
                if config.fahrenheit {
                    println!(
                        "{} Temperature {:.2}F {:.2}C",
                        format_timestamp(timestamp),
                        celsius_to_fahrenheit(tempc),
                        tempc
                    );
                } else {
                    println!("{} Temperature {:.2}C", format_timestamp(timestamp), tempc);
                }
            }
        }

        if !looping {
            break;
        }
        thread::sleep(interval);
    }

    device.close();
    Ok(())
}

//! CO2 Monitor Host
//!
//! Streams telemetry from a UD-CO2S sensor on a serial port, keeps the last
//! 100 corrected readings and serves them over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! cargo run --bin co2_host -- --list-ports
//!
//! # Stream from a device and serve on the default address
//! cargo run --bin co2_host -- --port /dev/ttyACM0
//!
//! # Same, configured through the environment
//! DEVICE_PATH=/dev/ttyACM0 LISTEN_ADDR=0.0.0.0:8000 cargo run --bin co2_host
//!
//! # Or through a .env file in the working directory
//! echo DEVICE_PATH=/dev/ttyACM0 > .env && cargo run --bin co2_host
//! ```
//!
//! ## Endpoints
//!
//! - `GET /current` - newest reading, 404 until one arrives
//! - `GET /history` - up to 100 readings, newest first

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;

use co2::adapters::http;
use co2::adapters::serial_driver::looks_like_sensor;
use co2::config::{load_dotenv, DEFAULT_LISTEN_ADDR};
use co2::{Command, Config, DotenvStatus, DriverPort, HistoryPort, Ingestor, MemoryHistory, QueryService, SerialDriver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before the logger, so RUST_LOG may come from .env too
    let dotenv = load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenv {
        DotenvStatus::Loaded(path) => info!("Loaded environment from {}", path.display()),
        DotenvStatus::Missing => debug!("No .env file found"),
        DotenvStatus::Invalid(e) => warn!("Ignoring .env file: {}", e),
    }

    let config = match Command::from_env() {
        Ok(Command::Run(config)) => config,
        Ok(Command::ListPorts) => {
            list_ports();
            return Ok(());
        }
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help to see available options");
            return Err(e.into());
        }
    };

    run(config).await
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("=== CO2 Monitor ===");

    let history = Arc::new(MemoryHistory::new());
    let ingestor = Arc::new(Ingestor::new(history.clone()));
    let queries = QueryService::new(history.clone());

    let mut driver = SerialDriver::new(config.baud_rate);
    driver.register_callback(ingestor.handler());

    if config.device_path.is_empty() {
        warn!("No device configured (DEVICE_PATH or --port); serving empty history");
    }
    driver.open(&config.device_path);

    // The only fatal condition: nothing to serve queries on
    let listener = match TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.listen_addr, e);
            driver.close();
            return Err(e.into());
        }
    };

    let served = http::serve(listener, queries, shutdown_signal()).await;

    driver.close();

    let stats = ingestor.stats();
    info!(
        "Frames received: {}, readings stored: {}, dropped: {}, retained: {}",
        stats.frames_received,
        stats.readings_stored,
        stats.frames_dropped,
        history.len()
    );

    served?;
    info!("Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn print_help() {
    println!("CO2 Monitor Host");
    println!();
    println!("Options:");
    println!("  -p, --port <PATH>     Serial device (env DEVICE_PATH)");
    println!(
        "  -l, --listen <ADDR>   Query service address (env LISTEN_ADDR, default {})",
        DEFAULT_LISTEN_ADDR
    );
    println!("  -b, --baud <N>        Serial line speed (env BAUD_RATE, default 9600)");
    println!("      --list-ports      List available serial ports and exit");
    println!("  -h, --help            Show this help");
    println!();
    println!("Variables may also be set in a .env file; the environment takes precedence.");
    println!();
    println!("Endpoints:");
    println!("  GET /current          Newest reading (404 until one arrives)");
    println!("  GET /history          Up to 100 readings, newest first");
}

fn list_ports() {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("Error listing ports: {}", e);
            return;
        }
    };

    println!("Serial ports:");
    if ports.is_empty() {
        println!("  (none)");
        return;
    }

    let mut sensor = None;
    for port in &ports {
        match &port.port_type {
            serialport::SerialPortType::UsbPort(usb) => {
                let product = usb.product.as_deref().unwrap_or("unknown product");
                print!("  {}  {:04x}:{:04x} {}", port.port_name, usb.vid, usb.pid, product);
                if looks_like_sensor(usb.manufacturer.as_deref(), usb.product.as_deref()) {
                    print!("  <- likely CO2 sensor");
                    sensor.get_or_insert(port.port_name.as_str());
                }
                println!();
            }
            // Only USB ports can carry the sensor
            _ => println!("  {}  (not USB)", port.port_name),
        }
    }

    if let Some(name) = sensor {
        println!();
        println!("Start with: co2_host --port {}", name);
    }
}

//! Host-side checks for the UART telemetry sender.
//!
//! Run after flashing the sender: listens on the serial port, validates and
//! acknowledges each frame, journals the traffic, then checks the session.

mod device;
mod journal;
mod monitor;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use device::{resolve_port, DeviceClient};
use journal::FileJournal;
use tests::{print_results, run_all_checks};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Checks a board running the UART telemetry sender")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Journal file, appended to
    #[arg(short, long, default_value = "uart_log.txt")]
    journal: PathBuf,

    /// Capture length in seconds
    #[arg(short, long, default_value = "10")]
    seconds: u64,

    /// Minimum number of valid frames expected
    #[arg(long, default_value = "5")]
    min_frames: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let port = resolve_port(&args.port)?;

    println!("{}", "Trident UART Telemetry Checks".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!("Journal: {}", args.journal.display());
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, args.baud)?;
    device.clear_buffer()?;
    println!("{}", "Connected!".green());

    let mut journal = FileJournal::open(&args.journal)?;

    println!("\nListening for {} s...\n", args.seconds);
    let observations = monitor::capture(&mut device, &mut journal, Duration::from_secs(args.seconds))?;

    println!("\nRunning checks...\n");
    let results = run_all_checks(&observations, args.min_frames);
    print_results(&results);

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;

use mmwave_sounder_rs::drivers::sim::SimLinkProvider;
use mmwave_sounder_rs::operator::{spawn_keyboard_listener, OperatorCommand, OperatorControl};
use mmwave_sounder_rs::{AcquisitionScheduler, Config};

#[derive(Parser, Debug)]
#[command(name = "mmwave_sounder")]
#[command(about = "5G field measurement logger - power, RTK position, aiming", long_about = None)]
struct Args {
    /// Configuration file (JSON); CLI flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick rate in Hz
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Radio center frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    /// Radio receive gain in dB
    #[arg(long)]
    gain: Option<f64>,

    /// Output directory root for session files
    #[arg(long)]
    output_dir: Option<String>,

    /// Begin recording immediately instead of waiting for Enter
    #[arg(long)]
    autostart: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(tick_hz) = args.tick_hz {
        config.tick_hz = tick_hz;
    }
    if let Some(frequency) = args.frequency {
        config.radio.center_freq_hz = frequency;
    }
    if let Some(gain) = args.gain {
        config.radio.rx_gain_db = gain;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    println!("mmWave field sounder");
    println!("  Frequency:  {:.1} MHz", config.radio.center_freq_hz / 1e6);
    println!("  Rx gain:    {:.1} dB", config.radio.rx_gain_db);
    println!("  Tick rate:  {:.1} Hz", config.tick_hz);
    println!("  Output dir: {}", config.output_dir);
    println!("Keys: Enter=start/resume  Space=pause  s=stop  q=quit");

    std::fs::create_dir_all(&config.output_dir)?;

    let (command_tx, operator) = OperatorControl::channel();

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupt_flag = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupt_flag.store(true, Ordering::Relaxed);
    })?;

    let _keyboard = spawn_keyboard_listener(command_tx.clone())?;

    let mut scheduler = AcquisitionScheduler::new(config);
    scheduler.connect_all(&mut SimLinkProvider)?;

    if args.autostart {
        command_tx.send(OperatorCommand::StartRecording)?;
    }

    scheduler.run(&operator, &interrupted)?;

    println!("\n=== Final stats ===");
    match scheduler.last_summary() {
        Some(summary) => {
            println!("Readings:     {}", summary.reading_count);
            println!("Elapsed:      {:.1} s", summary.elapsed_seconds);
            println!("Reading rate: {:.2} Hz ({:.1} ms/reading)",
                summary.reading_rate_hz, summary.avg_ms_per_reading);
        }
        None => println!("No session recorded."),
    }
    info!("shutdown complete");
    Ok(())
}

// demos/inspect_session.rs
//! Print the channels and segments of a recording session.
//!
//! ```text
//! RUST_LOG=debug cargo run --example inspect_session -- path/to/session [--exclude CSC2.ncs] [--permissive] [--parallel]
//! ```

use nlx_rs::*;
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: inspect_session <dir|file> [--exclude NAME]... [--include NAME]... [--permissive] [--parallel] [--strict]");
        return ExitCode::FAILURE;
    };

    let mut options = SessionOptions::new();
    while let Some(arg) = args.next() {
        options = match arg.as_str() {
            "--exclude" => options.exclude_filenames(args.next()),
            "--include" => options.include_filenames(args.next()),
            "--permissive" => options.date_mode(DateMode::Permissive),
            "--parallel" => options.parallel(true),
            "--strict" => options.strict(true),
            other => {
                eprintln!("unknown argument {other}");
                return ExitCode::FAILURE;
            }
        };
    }

    match inspect(&path, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error ({:?}): {e}", e.kind());
            ExitCode::FAILURE
        }
    }
}

fn inspect(path: &str, options: SessionOptions) -> Result<()> {
    let session = SessionAssembler::new(options).open(path)?;

    for (file, header) in session.headers() {
        println!(
            "{}: {} {} ({})",
            file.display(),
            header.application_name().unwrap_or("?"),
            header.application_version().unwrap_or(""),
            header.variant()
        );
    }

    println!("\nsignal streams:");
    for stream in session.signal_streams() {
        println!("  stream {} at {} Hz, {} channel(s)", stream.id, stream.sampling_rate, stream.channels.len());
    }
    for channel in session.signal_channels() {
        println!("  {} #{} -> stream {}", channel.key.name, channel.key.id, channel.stream);
    }

    println!("spike channels: {}", session.spike_channels().len());
    for channel in session.spike_channels() {
        println!("  {}", channel.name);
    }
    println!("event channels: {}", session.event_channels().len());
    for channel in session.event_channels() {
        println!("  {}", channel.name);
    }

    println!("\n{} segment(s):", session.segment_count());
    for (i, segment) in session.segment_table().segments().iter().enumerate() {
        println!("  [{i}] {:.6}s .. {:.6}s", segment.start_seconds(), segment.end_seconds());
        for (key, count) in &segment.sample_counts {
            println!("      {} #{}: {count} samples", key.name, key.id);
        }
    }

    for failure in session.failures() {
        println!("failed: {} ({:?})", failure.error, failure.error.kind());
    }
    Ok(())
}

//! Decode an MP3 and time the hop-by-hop magnitude spectrum computation

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use hopscan::audio::{decode_file, extract_channel};
use hopscan::spectrum::{AnalyzerConfig, HopAnalyzer, DEFAULT_HOP_SIZE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// path to the MP3 file to analyze
    file: PathBuf,

    /// samples per analysis hop (any positive length)
    #[arg(long, default_value_t = DEFAULT_HOP_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    hop_size: u64,

    /// interleaved channel to analyze
    #[arg(long, default_value_t = 0)]
    channel: usize,

    /// spread hops across all cores
    #[arg(long)]
    parallel: bool,
}

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            e.print().ok();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let hop_size = usize::try_from(args.hop_size).context("hop size does not fit in memory")?;
    let config = AnalyzerConfig {
        hop_size,
        channel: args.channel,
        parallel: args.parallel,
    };

    let buffer = decode_file(&args.file)
        .with_context(|| format!("Failed to extract samples from {}", args.file.display()))?;

    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Channels: {}", buffer.channels());
    println!("Successfully extracted {} samples", buffer.len());
    println!("Duration: {:.2} seconds", buffer.duration_secs());

    let mono = extract_channel(&buffer, config.channel)?;
    drop(buffer);

    let mut analyzer = HopAnalyzer::new(config)?;
    println!(
        "Hop size: {} samples ({} strategy, {} bins per hop)",
        hop_size,
        analyzer.plan().strategy().name(),
        analyzer.num_bins()
    );

    let start = Instant::now();
    let spectrogram = analyzer.analyze(&mono)?;
    let elapsed = start.elapsed();

    println!("Hops analyzed: {}", spectrogram.hop_count());
    println!("Processing loop took {:.6} seconds", elapsed.as_secs_f64());

    for hop in 0..spectrogram.hop_count() {
        if let Some(bin) = spectrogram.peak_bin(hop) {
            log::debug!(
                "hop {} @ {:.2} s: peak {:.1} Hz",
                hop,
                spectrogram.hop_start_secs(hop),
                spectrogram.bin_frequency_hz(bin)
            );
        }
    }

    Ok(())
}

//! Example: Track the key of WAV files
//!
//! Usage:
//!   cargo run --release --example detect_wav -- [--method progression|profile]
//!       [--tuning HZ] [--jobs N] [--json] <file1.wav> <file2.wav> ...
//!
//! Notes:
//! - Parallelism is across files. Each file is streamed through one detector.
//! - Stereo input is mixed down to mono.

use keytrack::{
    strengths_in_fifths_order, BlockFramer, DetectorConfig, KeyChange, KeyChangeTracker,
    KeyDetector, KeyMethod,
};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::time::Instant;

/// Decode a WAV file into mono f64 samples
fn load_wav(path: &str) -> Result<(Vec<f64>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| f64::from(s) / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

#[derive(Serialize)]
struct FileReport {
    file: String,
    sample_rate: u32,
    method: KeyMethod,
    /// Key label at the end of the file, `None` if no key was found
    final_key: Option<String>,
    changes: Vec<KeyChange>,
    /// Last strengths around the circle of fifths
    strengths: Vec<(String, f64)>,
    processing_ms: f64,
}

fn analyze_file(
    path: &str,
    method: KeyMethod,
    tuning: f64,
) -> Result<FileReport, Box<dyn std::error::Error + Send + Sync>> {
    let t0 = Instant::now();
    let (samples, sample_rate) = load_wav(path).map_err(|e| e.to_string())?;

    let config =
        DetectorConfig::new(method, f64::from(sample_rate)).with_tuning_frequency(tuning);
    let mut detector = KeyDetector::new(config)?;
    let mut changes = KeyChangeTracker::new(detector.hop_seconds());
    let mut framer = BlockFramer::new(detector.block_size(), detector.hop_size());

    let mut report = Vec::new();
    let mut last_key = 0;
    // stream in hop-sized chunks, as a host would
    for chunk in samples.chunks(detector.hop_size()) {
        framer.push(chunk);
        while let Some(block) = framer.next_block() {
            last_key = detector.process(block)?;
            if let Some(change) = changes.observe(last_key) {
                report.push(change);
            }
        }
    }

    let strengths = strengths_in_fifths_order(&detector.key_strengths())
        .iter()
        .map(|(key, value)| (key.name(), *value))
        .collect();

    Ok(FileReport {
        file: path.to_string(),
        sample_rate,
        method,
        final_key: keytrack::Key::from_index(last_key).map(|k| k.label()),
        changes: report,
        strengths,
        processing_ms: t0.elapsed().as_secs_f64() * 1000.0,
    })
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut method = KeyMethod::Progression;
    let mut tuning = 440.0;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--method" => {
                method = args.first().ok_or("--method requires a value")?.parse()?;
                args.remove(0);
            }
            "--tuning" => {
                tuning = args
                    .first()
                    .ok_or("--tuning requires a value")?
                    .parse::<f64>()?;
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: detect_wav [--method progression|profile] [--tuning HZ] [--jobs N] [--json] <file.wav> ...\n\
                     \n\
                     --method M   progression (default) or profile\n\
                     --tuning HZ  Concert A frequency (default: 440)\n\
                     --jobs N     Parallel workers (default: CPU-1)\n\
                     --json       Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one WAV file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}, method={}", paths.len(), jobs, method);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let outs: Vec<(String, Result<FileReport, String>)> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let result = analyze_file(path, method, tuning).map_err(|e| e.to_string());
                (path.clone(), result)
            })
            .collect()
    });

    for (idx, (path, result)) in outs.iter().enumerate() {
        match result {
            Ok(report) if json => println!("{}", serde_json::to_string(report)?),
            Ok(report) => {
                println!(
                    "[{}/{}] {}: key={} changes={} time={:.2}ms",
                    idx + 1,
                    outs.len(),
                    path,
                    report.final_key.as_deref().unwrap_or("none"),
                    report.changes.len(),
                    report.processing_ms
                );
                for change in &report.changes {
                    println!(
                        "    {:>8.2}s  {}",
                        change.timestamp,
                        change.to_key.map(|k| k.label()).unwrap_or_else(|| "no key".to_string())
                    );
                }
            }
            Err(e) if json => println!(
                "{{\"file\":{},\"error\":{}}}",
                serde_json::to_string(path)?,
                serde_json::to_string(e)?
            ),
            Err(e) => println!("[{}/{}] {}: ERROR {}", idx + 1, outs.len(), path, e),
        }
    }

    Ok(())
}

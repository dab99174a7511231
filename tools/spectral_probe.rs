//! Offline probe: denoises a WAV through the spectral core and reports
//! per-band energies on the configured perceptual scale.
//!
//! Usage: `spectral_probe <input.wav> [output.wav] [config.json]`
//!
//! Writes the denoised mono signal to `output.wav` and a JSON summary next to
//! it (`output.json`).

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;
use std::path::{Path, PathBuf};
use vxspectral::dsp::utils::{gain_to_db, make_hann_window, MAG_FLOOR};
use vxspectral::dsp::{FilterBank, Partial, RingBuffer, WienerSoftMasking};
use vxspectral::CoreConfig;

/// Per-frame growth of the tracked noise floor, so it can follow rising noise.
const NOISE_RISE: f32 = 1.01;
/// Over-subtraction used to derive the raw soft mask.
const OVER_SUBTRACTION: f32 = 2.0;
const OLA_FLOOR: f32 = 1e-6;

#[derive(Serialize)]
struct ProbeSummary {
    input: String,
    output: String,
    sample_rate: u32,
    samples: usize,
    frames: usize,
    fft_size: usize,
    hop_size: usize,
    latency_samples: usize,
    scale: &'static str,
    num_filters: usize,
    mean_mask: f32,
    input_rms_db: f32,
    output_rms_db: f32,
    dominant_freq_hz: f32,
    band_energy_db: Vec<f32>,
    noise_band_db: Vec<f32>,
}

fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context("reading float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("reading integer samples")?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

fn write_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create output WAV '{}'", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize().context("finalizing output WAV")?;
    Ok(())
}

fn rms_db(x: &[f32]) -> f32 {
    if x.is_empty() {
        return gain_to_db(0.0);
    }
    let ms = x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32;
    gain_to_db(ms.sqrt())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .context("usage: spectral_probe <input.wav> [output.wav] [config.json]")?;
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension("denoised.wav"));
    let cfg = match args.next() {
        Some(path) => CoreConfig::from_json_file(&path)?,
        None => CoreConfig::default(),
    };

    let (signal, sample_rate) = read_mono(&input)?;
    let sr = sample_rate as f32;

    let fft_size = cfg.wiener.buffer_size;
    let num_bins = fft_size / 2 + 1;
    let mut wiener = WienerSoftMasking::from_config(&cfg.wiener)?;
    let hop = wiener.hop_size();
    let center_frames = wiener.latency() / hop;

    let mut filter_bank = FilterBank::new(cfg.filter_bank.scale);
    let num_filters = cfg.filter_bank.num_filters;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);
    let window = make_hann_window(fft_size);

    let mut ring = RingBuffer::<f32>::with_capacity(fft_size + hop)?;
    let mut frame = vec![0.0f32; fft_size];
    let mut spectrum = vec![Complex::new(0.0f32, 0.0); fft_size];

    let mut bins = vec![Complex::new(0.0f32, 0.0); num_bins];
    let mut mask = vec![0.0f32; num_bins];
    let mut denoised = vec![Complex::new(0.0f32, 0.0); num_bins];
    let mut residual = vec![Complex::new(0.0f32, 0.0); num_bins];
    let mut noise_pow: Option<Vec<f32>> = None;

    let mut magns = vec![0.0f32; num_bins];
    let mut magns_db = vec![0.0f32; num_bins];
    let mut bands = vec![0.0f32; num_filters];
    let mut band_energy = vec![0.0f64; num_filters];

    let mut partial = Partial::new(cfg.smoothing);
    let mut partial_started = false;

    // Pad so the last samples land in a full frame.
    let total_frames = signal.len().div_ceil(hop) + center_frames;
    let mut padded = signal.clone();
    padded.resize((total_frames + fft_size / hop) * hop, 0.0);

    let mut out = vec![0.0f32; padded.len() + fft_size];
    let mut norm = vec![0.0f32; padded.len() + fft_size];
    let mut mask_sum = 0.0f64;
    let mut mask_frames = 0usize;
    let mut frames = 0usize;

    ring.push(&padded[..fft_size - hop]);
    for (t, chunk) in padded[fft_size - hop..].chunks_exact(hop).enumerate() {
        ring.push(chunk);
        ring.peek(&mut frame);
        ring.pop(hop);

        for (s, (&x, &w)) in spectrum.iter_mut().zip(frame.iter().zip(&window)) {
            *s = Complex::new(x * w, 0.0);
        }
        fft.process(&mut spectrum);
        bins.copy_from_slice(&spectrum[..num_bins]);

        let noise = noise_pow.get_or_insert_with(|| bins.iter().map(|c| c.norm_sqr()).collect());
        for ((m, n), c) in mask.iter_mut().zip(noise.iter_mut()).zip(&bins) {
            let p = c.norm_sqr();
            *n = if p < *n { p } else { *n * NOISE_RISE };
            *m = if p > 0.0 {
                (1.0 - OVER_SUBTRACTION * *n / p).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        mask_sum += mask.iter().map(|&m| m as f64).sum::<f64>() / num_bins as f64;
        mask_frames += 1;

        wiener.process_centered(&mut bins, &mask, &mut denoised, Some(&mut residual))?;
        if t < center_frames {
            continue;
        }
        frames += 1;

        for ((m, db), c) in magns.iter_mut().zip(magns_db.iter_mut()).zip(&denoised) {
            *m = c.norm();
            *db = gain_to_db(m.max(MAG_FLOOR));
        }
        filter_bank.hz_to_target(&mut bands, &magns, sr, num_filters)?;
        for (acc, &b) in band_energy.iter_mut().zip(&bands) {
            *acc += (b * b) as f64;
        }

        let peak = magns
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        partial.peak_index = peak;
        partial.refine_qifft(&magns_db, sr, fft_size)?;
        if !partial_started {
            partial.init_smoothing();
            partial_started = true;
        }
        partial.smooth_freq();

        // Rebuild the full Hermitian spectrum for the real inverse.
        for k in 0..num_bins {
            spectrum[k] = denoised[k];
            if k > 0 && k < fft_size - k {
                spectrum[fft_size - k] = denoised[k].conj();
            }
        }
        ifft.process(&mut spectrum);

        let start = (t - center_frames) * hop;
        let inv_n = 1.0 / fft_size as f32;
        for (i, (&s, &w)) in spectrum.iter().zip(&window).enumerate() {
            out[start + i] += s.re * inv_n * w;
            norm[start + i] += w * w;
        }
    }

    for (o, &n) in out.iter_mut().zip(&norm) {
        *o /= n.max(OLA_FLOOR);
    }
    out.truncate(signal.len());
    write_mono(&output, &out, sample_rate)?;

    let band_energy_db: Vec<f32> = band_energy
        .iter()
        .map(|&e| gain_to_db(((e / frames.max(1) as f64) as f32).sqrt()))
        .collect();

    let mut noise_band_db = vec![0.0f32; num_filters];
    if let Some(noise) = &noise_pow {
        let noise_mag: Vec<f32> = noise.iter().map(|p| p.sqrt()).collect();
        filter_bank.hz_to_target(&mut noise_band_db, &noise_mag, sr, num_filters)?;
        for v in noise_band_db.iter_mut() {
            *v = gain_to_db(*v);
        }
    }

    let summary = ProbeSummary {
        input: input.display().to_string(),
        output: output.display().to_string(),
        sample_rate,
        samples: signal.len(),
        frames,
        fft_size,
        hop_size: hop,
        latency_samples: wiener.latency(),
        scale: cfg.filter_bank.scale.name(),
        num_filters,
        mean_mask: (mask_sum / mask_frames.max(1) as f64) as f32,
        input_rms_db: rms_db(&signal),
        output_rms_db: rms_db(&out),
        dominant_freq_hz: partial.smoothed_freq(),
        band_energy_db,
        noise_band_db,
    };
    let summary_path = output.with_extension("json");
    let json = serde_json::to_string_pretty(&summary).context("serializing probe summary")?;
    std::fs::write(&summary_path, json)
        .with_context(|| format!("writing summary '{}'", summary_path.display()))?;

    println!("Spectral probe summary for '{}':", input.display());
    println!("  frames processed : {}", summary.frames);
    println!("  latency          : {} samples", summary.latency_samples);
    println!("  input rms        : {:.2} dB", summary.input_rms_db);
    println!("  output rms       : {:.2} dB", summary.output_rms_db);
    println!("  dominant freq    : {:.1} Hz", summary.dominant_freq_hz);
    println!("  summary          : {}", summary_path.display());
    Ok(())
}

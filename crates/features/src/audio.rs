//! WAV decoding with a one-shot `sox` conversion fallback.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{FeatureError, Result};

/// Decoded audio, down-mixed to mono.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Summary printed by `corpusprep probe`.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: usize,
    pub duration_secs: f64,
    /// Feature frames the file yields at the configured frame rate.
    pub frames: usize,
}

fn decode(path: &Path) -> std::result::Result<Waveform, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(Waveform {
        samples: mono,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn convert_with_sox(sox: &str, input: &Path, output: &Path) -> Result<()> {
    let status = Command::new(sox)
        .arg(input)
        .args(["-t", "wav"])
        .arg(output)
        .status()
        .map_err(|e| FeatureError::audio(input, format!("failed to run '{sox}': {e}")))?;
    if !status.success() {
        return Err(FeatureError::audio(
            input,
            format!("'{sox}' conversion exited with {status}"),
        ));
    }
    Ok(())
}

/// Reads a WAV file. If the file cannot be decoded as-is (NIST SPHERE
/// headers, odd encodings) it is converted once with `sox` and decoded
/// again; a second failure is fatal.
pub fn read_wav(path: impl AsRef<Path>, sox: &str) -> Result<Waveform> {
    let path = path.as_ref();
    match decode(path) {
        Ok(waveform) => {
            debug!(path = %path.display(), samples = waveform.samples.len(), "Decoded WAV");
            Ok(waveform)
        }
        Err(first) => {
            warn!(path = %path.display(), error = %first, "WAV decode failed, converting with sox");
            let converted = tempfile::Builder::new()
                .suffix(".wav")
                .tempfile()
                .map_err(|e| FeatureError::io("creating sox output file", e))?;
            convert_with_sox(sox, path, converted.path())?;
            decode(converted.path()).map_err(|e| {
                FeatureError::audio(path, format!("still undecodable after sox conversion: {e}"))
            })
        }
    }
}

pub fn probe(path: impl AsRef<Path>, sox: &str, frame_rate: u32) -> Result<Probe> {
    let waveform = read_wav(path, sox)?;
    let duration_secs = waveform.duration_secs();
    Ok(Probe {
        sample_rate: waveform.sample_rate,
        channels: waveform.channels,
        samples: waveform.samples.len(),
        duration_secs,
        frames: (duration_secs * frame_rate as f64) as usize,
    })
}

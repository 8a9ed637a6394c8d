//! Microphone capture and speaker playback
//!
//! Capture runs at 16kHz mono and gates on RMS energy: a phrase starts
//! when energy crosses the speech threshold and ends after trailing
//! silence. Playback decodes MP3 from the TTS service and writes to the
//! default output device.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// RMS energy above which a chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Polling granularity for the capture loop
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Trailing silence that ends a phrase
const TRAILING_SILENCE: Duration = Duration::from_millis(600);

/// Minimum phrase length worth transcribing (0.3s at 16kHz)
const MIN_PHRASE_SAMPLES: usize = 4800;

/// Hard cap on phrase length (7s at 16kHz)
const MAX_PHRASE_SAMPLES: usize = SAMPLE_RATE as usize * 7;

/// Records energy-gated phrases from the default input device
pub struct Microphone {
    config: StreamConfig,
}

impl Microphone {
    /// Probe the default input device for a 16kHz mono config
    ///
    /// # Errors
    ///
    /// Returns error if no input device or suitable config exists
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable capture config found".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone initialized"
        );

        Ok(Self { config })
    }

    /// Record one phrase, waiting up to `timeout` for speech to begin
    ///
    /// Returns `Ok(None)` if no speech crossed the energy threshold
    /// before the timeout or the phrase was too short to transcribe.
    ///
    /// # Errors
    ///
    /// Returns error if the capture stream cannot be opened.
    pub async fn record_phrase(&self, timeout: Duration) -> Result<Option<Vec<f32>>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let incoming: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&incoming);

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "capture stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let mut phrase: Vec<f32> = Vec::new();
        let mut waited = Duration::ZERO;
        let mut silence = Duration::ZERO;
        let mut speaking = false;

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let chunk = incoming
                .lock()
                .map(|mut buf| std::mem::take(&mut *buf))
                .unwrap_or_default();
            let is_speech = rms_energy(&chunk) > ENERGY_THRESHOLD;

            if speaking {
                phrase.extend_from_slice(&chunk);
                silence = if is_speech { Duration::ZERO } else { silence + POLL_INTERVAL };

                if silence >= TRAILING_SILENCE || phrase.len() >= MAX_PHRASE_SAMPLES {
                    break;
                }
            } else if is_speech {
                speaking = true;
                phrase.extend_from_slice(&chunk);
            } else {
                waited += POLL_INTERVAL;
                if waited >= timeout {
                    drop(stream);
                    return Ok(None);
                }
            }
        }

        drop(stream);

        if phrase.len() < MIN_PHRASE_SAMPLES {
            tracing::trace!(samples = phrase.len(), "phrase too short, discarding");
            return Ok(None);
        }

        tracing::debug!(samples = phrase.len(), "phrase captured");
        Ok(Some(phrase))
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Encode f32 samples as 16-bit WAV for upload to the STT service
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;
        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let quantized = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }
        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Decode MP3 bytes and play them on the default output device
///
/// # Errors
///
/// Returns error if decoding fails or no output device is available
pub async fn play_mp3(mp3_data: &[u8]) -> Result<()> {
    let samples = decode_mp3(mp3_data)?;
    play_samples(samples).await
}

/// Play mono f32 samples without blocking the async runtime
///
/// # Errors
///
/// Returns error if no output device is available
pub async fn play_samples(samples: Vec<f32>) -> Result<()> {
    tokio::task::spawn_blocking(move || play_samples_blocking(samples))
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
}

/// Play mono f32 samples, blocking until playback completes
fn play_samples_blocking(samples: Vec<f32>) -> Result<()> {
    if samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;
    let config = supported
        .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
        .config();
    let channels = config.channels as usize;

    let queue: Arc<Vec<f32>> = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let cb_queue = Arc::clone(&queue);
    let cb_position = Arc::clone(&position);
    let cb_done = Arc::clone(&done);

    let stream = device
        .build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = cb_position.load(Ordering::Relaxed);
                for frame in out.chunks_mut(channels) {
                    let sample = cb_queue.get(pos).copied().unwrap_or_else(|| {
                        cb_done.store(true, Ordering::Relaxed);
                        0.0
                    });
                    frame.fill(sample);
                    pos = pos.saturating_add(1);
                }
                cb_position.store(pos.min(cb_queue.len()), Ordering::Relaxed);
            },
            |err| tracing::error!(error = %err, "playback stream error"),
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;
    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let duration_ms = (queue.len() as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let deadline = std::time::Instant::now() + Duration::from_millis(duration_ms + 500);
    while !done.load(Ordering::Relaxed) && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    // Let the device drain the final buffer
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = queue.len(), "playback complete");
    Ok(())
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|pair| {
                        let left = f32::from(pair[0]) / 32768.0;
                        let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_energy_distinguishes_silence_from_speech() {
        assert!(rms_energy(&vec![0.0; 1600]) < 0.001);
        assert!(rms_energy(&vec![0.5; 1600]) > 0.4);
        assert!(rms_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn wav_encoding_produces_valid_header() {
        let samples: Vec<f32> = (0..1600)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / SAMPLE_RATE as f32;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();

        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }

    #[test]
    fn wav_samples_round_trip() {
        let original = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&original, SAMPLE_RATE).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.samples::<i16>().map(std::result::Result::unwrap).collect();
        assert_eq!(decoded.len(), original.len());
    }
}

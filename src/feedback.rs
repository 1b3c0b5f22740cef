//! Audio feedback for scan outcomes
//!
//! Warehouse staff rarely look at the screen while scanning, so every
//! outcome has a distinct sound. Tones are generated at startup; a custom
//! theme is a directory of WAV files.

use crate::config::FeedbackConfig;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::path::PathBuf;

/// Sound event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    /// Scan accepted and handed to the API
    Accepted,
    /// Same code read twice inside the cooldown
    Duplicate,
    /// Scan refused locally (no shipment, too short)
    Rejected,
    /// The API reported a failure
    Error,
}

/// Audio feedback player
pub struct AudioFeedback {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
    theme: SoundTheme,
}

/// Audio data for each sound event
struct SoundTheme {
    accepted: Vec<u8>,
    duplicate: Vec<u8>,
    rejected: Vec<u8>,
    error: Vec<u8>,
}

impl SoundTheme {
    fn sound(&self, event: SoundEvent) -> &[u8] {
        match event {
            SoundEvent::Accepted => &self.accepted,
            SoundEvent::Duplicate => &self.duplicate,
            SoundEvent::Rejected => &self.rejected,
            SoundEvent::Error => &self.error,
        }
    }
}

impl AudioFeedback {
    /// Open the default output device and prepare the configured theme
    pub fn new(config: &FeedbackConfig) -> Result<Self, String> {
        if !config.enabled {
            return Err("Audio feedback is disabled".to_string());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;

        let theme = load_theme(&config.theme)?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            volume: config.volume,
            theme,
        })
    }

    /// Play the sound for the given event
    pub fn play(&self, event: SoundEvent) {
        let sound_data = self.theme.sound(event);
        if sound_data.is_empty() {
            return;
        }

        if let Err(e) = self.play_wav(sound_data) {
            tracing::warn!("Failed to play feedback sound: {}", e);
        }
    }

    fn play_wav(&self, data: &[u8]) -> Result<(), String> {
        let cursor = Cursor::new(data.to_vec());
        let source = Decoder::new(cursor).map_err(|e| format!("Failed to decode audio: {}", e))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;

        sink.append(source.amplify(self.volume));
        sink.detach();

        Ok(())
    }
}

/// Load a sound theme by name or path
fn load_theme(theme_name: &str) -> Result<SoundTheme, String> {
    match theme_name {
        "default" => Ok(default_theme()),
        "subtle" => Ok(subtle_theme()),
        "mechanical" => Ok(mechanical_theme()),
        path => load_custom_theme(path),
    }
}

/// Load a theme from a directory; missing files play nothing
fn load_custom_theme(path: &str) -> Result<SoundTheme, String> {
    let dir = PathBuf::from(path);
    if !dir.is_dir() {
        return Err(format!("Theme directory not found: {}", path));
    }

    let load_file = |name: &str| -> Vec<u8> {
        let file_path = dir.join(name);
        match std::fs::read(&file_path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("No {:?} in theme: {}", file_path, e);
                Vec::new()
            }
        }
    };

    Ok(SoundTheme {
        accepted: load_file("accepted.wav"),
        duplicate: load_file("duplicate.wav"),
        rejected: load_file("rejected.wav"),
        error: load_file("error.wav"),
    })
}

const SAMPLE_RATE: u32 = 44100;

/// One segment of a generated sound: frequency (0 = silence) and length
#[derive(Debug, Clone, Copy)]
struct Segment {
    frequency: f32,
    duration_ms: u32,
}

const fn seg(frequency: f32, duration_ms: u32) -> Segment {
    Segment {
        frequency,
        duration_ms,
    }
}

/// Render consecutive segments into a WAV, fading each tone in and out
fn render_wav(segments: &[Segment], fade_ms: u32) -> Vec<u8> {
    let mut samples: Vec<i16> = Vec::new();

    for segment in segments {
        let num_samples = (SAMPLE_RATE * segment.duration_ms / 1000) as usize;
        let fade_samples = ((SAMPLE_RATE * fade_ms / 1000) as usize).min(num_samples / 2);

        for i in 0..num_samples {
            if segment.frequency <= 0.0 {
                samples.push(0);
                continue;
            }

            let t = i as f32 / SAMPLE_RATE as f32;
            let mut amplitude = (2.0 * std::f32::consts::PI * segment.frequency * t).sin();

            if fade_samples > 0 {
                if i < fade_samples {
                    amplitude *= i as f32 / fade_samples as f32;
                } else if i >= num_samples - fade_samples {
                    amplitude *= (num_samples - i) as f32 / fade_samples as f32;
                }
            }

            samples.push((amplitude * 16000.0) as i16);
        }
    }

    encode_wav(&samples, SAMPLE_RATE)
}

/// Short noise burst with exponential decay
fn render_click(duration_ms: u32) -> Vec<u8> {
    let num_samples = (SAMPLE_RATE * duration_ms / 1000) as usize;

    let samples: Vec<i16> = (0..num_samples)
        .map(|i| {
            let envelope = (-5.0 * i as f32 / num_samples as f32).exp();
            let noise = if i % 2 == 0 { 1.0 } else { -1.0 };
            (noise * envelope * 12000.0) as i16
        })
        .collect();

    encode_wav(&samples, SAMPLE_RATE)
}

/// Encode mono 16-bit samples as WAV
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let mut wav = Vec::with_capacity(44 + samples.len() * 2);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    let file_size = (36 + samples.len() * 2) as u32;
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

/// Single clear beep for success, a lower one for errors
fn default_theme() -> SoundTheme {
    SoundTheme {
        accepted: render_wav(&[seg(800.0, 100)], 10),
        duplicate: render_wav(&[seg(700.0, 80), seg(500.0, 80)], 10),
        rejected: render_wav(&[seg(300.0, 120), seg(0.0, 40), seg(300.0, 120)], 15),
        error: render_wav(&[seg(400.0, 250)], 20),
    }
}

/// Quiet, short tones
fn subtle_theme() -> SoundTheme {
    SoundTheme {
        accepted: render_wav(&[seg(1200.0, 40)], 8),
        duplicate: render_wav(&[seg(900.0, 30), seg(700.0, 30)], 6),
        rejected: render_wav(&[seg(400.0, 60)], 10),
        error: render_wav(&[seg(400.0, 50), seg(300.0, 50)], 10),
    }
}

/// Keyboard-like clicks with a buzzer for failures
fn mechanical_theme() -> SoundTheme {
    SoundTheme {
        accepted: render_click(30),
        duplicate: render_click(15),
        rejected: render_wav(&[seg(200.0, 120)], 15),
        error: render_wav(&[seg(150.0, 200)], 20),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_len(wav: &[u8]) -> u32 {
        u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]])
    }

    #[test]
    fn test_render_wav_header() {
        let wav = render_wav(&[seg(800.0, 100)], 10);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        // 100 ms of mono 16-bit audio
        assert_eq!(data_len(&wav), 4410 * 2);
        assert_eq!(wav.len(), 44 + 4410 * 2);
    }

    #[test]
    fn test_segments_concatenate() {
        let wav = render_wav(&[seg(700.0, 80), seg(0.0, 20), seg(500.0, 80)], 10);
        assert_eq!(data_len(&wav), (3528 + 882 + 3528) * 2);
    }

    #[test]
    fn test_builtin_themes_have_every_sound() {
        for theme in [default_theme(), subtle_theme(), mechanical_theme()] {
            for event in [
                SoundEvent::Accepted,
                SoundEvent::Duplicate,
                SoundEvent::Rejected,
                SoundEvent::Error,
            ] {
                assert!(!theme.sound(event).is_empty(), "{:?}", event);
            }
        }
    }

    #[test]
    fn test_custom_theme_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("accepted.wav"), render_click(10)).unwrap();

        let theme = load_theme(dir.path().to_str().unwrap()).unwrap();
        assert!(!theme.sound(SoundEvent::Accepted).is_empty());
        assert!(theme.sound(SoundEvent::Error).is_empty());

        assert!(load_theme("/nonexistent/theme/dir").is_err());
    }
}

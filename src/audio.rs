use std::sync::Arc;

use kira::sound::static_sound::StaticSoundData;
use kira::{AudioManager, AudioManagerSettings, Frame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLE_RATE: u32 = 44_100;
const THUNDER_SECONDS: f32 = 2.8;

/// Synthesized thunder, played through kira. No audio device is opened
/// until the first click unlocks playback; before that, strikes are
/// silently skipped.
pub struct ThunderAudio {
    manager: Option<AudioManager>,
    thunder: StaticSoundData,
    unlock_attempted: bool,
}

impl ThunderAudio {
    pub fn new() -> Self {
        Self {
            manager: None,
            thunder: synthesize_thunder(),
            unlock_attempted: false,
        }
    }

    /// Opens the audio device. Called on the first click; a failure is
    /// logged once and the scene stays silent.
    pub fn unlock(&mut self) {
        if self.unlock_attempted {
            return;
        }
        self.unlock_attempted = true;

        match AudioManager::new(AudioManagerSettings::default()) {
            Ok(manager) => {
                log::info!("Audio unlocked");
                self.manager = Some(manager);
            }
            Err(error) => {
                log::warn!("Audio unavailable, thunder disabled: {:?}", error);
            }
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.manager.is_some()
    }

    pub fn play_thunder(&mut self) {
        match &mut self.manager {
            Some(manager) => {
                if let Err(error) = manager.play(self.thunder.clone()) {
                    log::warn!("Thunder playback failed: {:?}", error);
                }
            }
            None => log::debug!("Thunder skipped: audio locked"),
        }
    }
}

/// Filtered noise burst: a sharp crack that decays into a low rumble. The
/// low-pass cutoff sweeps down over the clap so the tail is all bass.
fn synthesize_thunder() -> StaticSoundData {
    let sample_count = (SAMPLE_RATE as f32 * THUNDER_SECONDS) as usize;
    let mut rng = StdRng::seed_from_u64(0x7004DE5);

    let mut filtered = 0.0f32;
    let mut frames = Vec::with_capacity(sample_count);

    for i in 0..sample_count {
        let t = i as f32 / SAMPLE_RATE as f32;

        let noise: f32 = rng.gen_range(-1.0..1.0);

        // One-pole low-pass; alpha falls from crack to rumble.
        let alpha = 0.6 * (-t * 1.8).exp() + 0.02;
        filtered += alpha * (noise - filtered);

        let envelope = (-t * 2.2).exp() * (1.0 + 0.3 * (t * 5.0).sin());
        // Secondary rumble rolling in after the initial crack.
        let rumble = (-((t - 0.7).max(0.0)) * 3.0).exp() * 0.5;

        let sample = (filtered * (envelope + rumble) * 0.9).clamp(-1.0, 1.0);
        frames.push(Frame::from_mono(sample));
    }

    StaticSoundData {
        sample_rate: SAMPLE_RATE,
        frames: Arc::from(frames),
        settings: Default::default(),
        slice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thunder_is_loud_then_quiet() {
        let sound = synthesize_thunder();
        assert_eq!(sound.sample_rate, SAMPLE_RATE);
        assert_eq!(
            sound.frames.len(),
            (SAMPLE_RATE as f32 * THUNDER_SECONDS) as usize
        );

        let peak = |range: std::ops::Range<usize>| {
            sound.frames[range]
                .iter()
                .map(|f| f.left.abs().max(f.right.abs()))
                .fold(0.0f32, f32::max)
        };

        let head = peak(0..SAMPLE_RATE as usize / 4);
        let tail_start = sound.frames.len() - SAMPLE_RATE as usize / 4;
        let tail = peak(tail_start..sound.frames.len());

        assert!(head > 0.05, "the clap should be audible");
        assert!(tail < head * 0.25, "the tail should decay well below the clap");
        for frame in sound.frames.iter() {
            assert!(frame.left.abs() <= 1.0);
        }
    }

    #[test]
    fn playback_before_unlock_is_a_quiet_no_op() {
        let mut audio = ThunderAudio::new();
        assert!(!audio.is_unlocked());
        // Must not panic without a device.
        audio.play_thunder();
    }
}

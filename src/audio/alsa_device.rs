//! ALSA playback device setup.

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

/// Hardware parameters, either requested or as negotiated by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlsaParams {
    pub sample_rate: u32,
    pub channels: u32,
    /// Period size in frames (0 when requesting = device default)
    pub period_size: usize,
}

impl AlsaParams {
    pub fn matches(&self, sample_rate: u32, channels: u32) -> bool {
        self.sample_rate == sample_rate && self.channels == channels
    }
}

/// Open `device` for S16LE interleaved playback.
///
/// Rate and channel count are negotiated to the nearest the device
/// supports; callers must adapt their buffer to the returned params.
pub fn open_playback(device: &str, wanted: AlsaParams) -> Result<(PCM, AlsaParams)> {
    let pcm = PCM::new(device, Direction::Playback, false)
        .with_context(|| format!("Failed to open PCM device '{}' for playback", device))?;

    negotiate(&pcm, &wanted).with_context(|| format!("Device '{}' rejected hw params {:?}", device, wanted))?;

    let actual = {
        let hwp = pcm.hw_params_current()?;
        AlsaParams {
            sample_rate: hwp.get_rate()?,
            channels: hwp.get_channels()?,
            period_size: hwp.get_period_size()? as usize,
        }
    };

    if !actual.matches(wanted.sample_rate, wanted.channels) {
        log::info!(
            "ALSA '{}' negotiated {} Hz x{} (wanted {} Hz x{})",
            device,
            actual.sample_rate,
            actual.channels,
            wanted.sample_rate,
            wanted.channels,
        );
    }
    log::debug!("ALSA '{}' period_size={}", device, actual.period_size);

    Ok((pcm, actual))
}

fn negotiate(pcm: &PCM, wanted: &AlsaParams) -> Result<()> {
    let hwp = HwParams::any(pcm)?;
    hwp.set_access(Access::RWInterleaved)?;
    hwp.set_format(Format::S16LE)?;
    hwp.set_channels_near(wanted.channels)?;
    hwp.set_rate_near(wanted.sample_rate, ValueOr::Nearest)?;
    if wanted.period_size > 0 {
        hwp.set_period_size_near(wanted.period_size as Frames, ValueOr::Nearest)?;
    }
    pcm.hw_params(&hwp)?;
    Ok(())
}

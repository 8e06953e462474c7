use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{error, info};

use crate::clock::{Clock, ClockState};
use crate::error::{Error, Result};
use crate::synth::Synth;

/// Output stream whose rendered frame count is the playback clock.
pub struct AudioClock {
    stream:      Option<Stream>,
    frames:      Arc<AtomicU64>,
    sample_rate: f64,
    state:       ClockState,
}

impl AudioClock {
    /// Opens the default output device and starts rendering `synth` into it.
    pub fn open(synth: Arc<Mutex<Synth>>) -> Result<Self> {
        let host   = cpal::default_host();
        let device = host.default_output_device()
            .ok_or_else(|| Error::AudioUnavailable("no output device found".into()))?;

        let supported     = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let sample_rate   = supported.sample_rate().0 as f64;
        let channels      = supported.channels() as usize;
        let config: StreamConfig = supported.into();

        synth.lock().unwrap_or_else(PoisonError::into_inner).prepare(sample_rate as f32);
        let frames = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, synth, Arc::clone(&frames))?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, synth, Arc::clone(&frames))?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, synth, Arc::clone(&frames))?,
            other => {
                return Err(Error::AudioUnavailable(format!("unsupported sample format {other:?}")));
            }
        };
        stream.play()?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate, channels, "audio output opened"
        );
        Ok(Self { stream: Some(stream), frames, sample_rate, state: ClockState::Running })
    }
}

fn build_stream<T>(
    device:   &Device,
    config:   &StreamConfig,
    channels: usize,
    synth:    Arc<Mutex<Synth>>,
    frames:   Arc<AtomicU64>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut synth = synth.lock().unwrap_or_else(PoisonError::into_inner);
            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(synth.generate_sample());
                for sample in frame.iter_mut() { *sample = value; }
            }
            frames.store(synth.frame(), Ordering::Release);
        },
        |err| error!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

impl Clock for AudioClock {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate
    }

    fn state(&self) -> ClockState { self.state }

    fn suspend(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream.pause()?;
            self.state = ClockState::Suspended;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let stream = self.stream.as_ref()
            .ok_or_else(|| Error::Audio("output stream already closed".into()))?;
        stream.play()?;
        self.state = ClockState::Running;
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            info!("audio output closed");
        }
        self.state = ClockState::Closed;
    }
}

impl Drop for AudioClock {
    fn drop(&mut self) { self.close(); }
}

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use num_complex::Complex32;
use rtlsdr::RTLSDRDevice;

use super::Receiver;

/// RTL-SDR dongle behind the [`Receiver`] boundary.
///
/// Reads block the calling worker thread, so this needs the multi-threaded
/// tokio runtime.
pub struct RtlReceiver {
    device: Option<RTLSDRDevice>,
    name: String,
}

// The device handle is only ever touched by the current lease holder.
unsafe impl Send for RtlReceiver {}

impl RtlReceiver {
    pub fn open(index: i32) -> Result<Self> {
        let device = rtlsdr::open(index).map_err(|e| anyhow!("Failed to open RTL-SDR {}: {:?}", index, e))?;
        Ok(Self {
            device: Some(device),
            name: format!("rtlsdr:{}", index),
        })
    }

    fn device(&mut self) -> Result<&mut RTLSDRDevice> {
        self.device.as_mut().ok_or_else(|| anyhow!("RTL-SDR is closed"))
    }
}

/// Unsigned 8-bit offset IQ to normalised complex samples.
fn convert_u8_iq(raw: &[u8]) -> Vec<Complex32> {
    raw.chunks_exact(2)
        .map(|iq| Complex32::new((iq[0] as f32 - 127.5) / 127.5, (iq[1] as f32 - 127.5) / 127.5))
        .collect()
}

#[async_trait]
impl Receiver for RtlReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        self.device()?
            .set_sample_rate(sample_rate as u32)
            .map_err(|e| anyhow!("set_sample_rate: {:?}", e))
    }

    async fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<()> {
        self.device()?
            .set_center_freq(frequency_hz as u32)
            .map_err(|e| anyhow!("set_center_freq: {:?}", e))
    }

    async fn set_gain_auto(&mut self) -> Result<()> {
        self.device()?
            .set_tuner_gain_mode(false)
            .map_err(|e| anyhow!("set_tuner_gain_mode: {:?}", e))
    }

    async fn read(&mut self, sample_count: usize) -> Result<Vec<Complex32>> {
        let device = self.device()?;
        device.reset_buffer().map_err(|e| anyhow!("reset_buffer: {:?}", e))?;

        let raw = tokio::task::block_in_place(|| device.read_sync(sample_count * 2))
            .map_err(|e| anyhow!("read_sync: {:?}", e))?;
        Ok(convert_u8_iq(&raw))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut device) = self.device.take() {
            device.close().map_err(|e| anyhow!("close: {:?}", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_u8_iq() {
        let samples = convert_u8_iq(&[255, 0, 127, 128, 9]);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Complex32::new(1.0, -1.0));
        assert!(samples[1].re.abs() < 0.01 && samples[1].im.abs() < 0.01);
    }
}

//! Synthetic camera used for demos and headless runs
//!
//! Produces random payloads of a configurable size range on a tokio interval,
//! mimicking a recorder that emits one container fragment per timeslice and a
//! final flush fragment when stopped.

use super::{ChunkSender, DeviceConstraints, DeviceProvider, DeviceStream, RecorderState};
use crate::chunk::Chunk;
use crate::error::{DeviceError, MediaError};
use async_trait::async_trait;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Provider handing out [`SyntheticDevice`]s
#[derive(Debug, Clone)]
pub struct SyntheticDeviceProvider {
    label: String,
    permission_granted: bool,
    device_present: bool,
    chunk_size: RangeInclusive<usize>,
}

impl SyntheticDeviceProvider {
    /// Create a provider that grants access and produces 1-4 KiB chunks
    pub fn new() -> Self {
        Self {
            label: "Synthetic Camera".to_string(),
            permission_granted: true,
            device_present: true,
            chunk_size: 1024..=4096,
        }
    }

    /// Refuse access, as a user dismissing the permission prompt would
    pub fn deny_permission(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    /// Pretend no camera is connected
    pub fn without_devices(mut self) -> Self {
        self.device_present = false;
        self
    }

    /// Set the payload size range; a range starting at 0 yields empty chunks
    ///
    /// An empty range such as `10..=1` makes [`acquire`](DeviceProvider::acquire)
    /// fail with [`DeviceError::Unavailable`].
    pub fn chunk_size(mut self, range: RangeInclusive<usize>) -> Self {
        self.chunk_size = range;
        self
    }
}

impl Default for SyntheticDeviceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceProvider for SyntheticDeviceProvider {
    async fn acquire(
        &self,
        constraints: &DeviceConstraints,
        chunks: ChunkSender,
    ) -> Result<Box<dyn DeviceStream>, DeviceError> {
        // No microphone behind this camera
        if !self.device_present || constraints.audio {
            return Err(DeviceError::NotFound {
                constraints: constraints.to_string(),
            });
        }
        if !self.permission_granted {
            return Err(DeviceError::PermissionDenied {
                operation: "camera access".to_string(),
            });
        }

        if self.chunk_size.is_empty() {
            return Err(DeviceError::Unavailable {
                reason: format!(
                    "{} has an empty chunk size range {:?}",
                    self.label, self.chunk_size
                ),
            });
        }

        info!("📷 Opened {} ({})", self.label, constraints);
        Ok(Box::new(SyntheticDevice {
            label: self.label.clone(),
            chunk_size: self.chunk_size.clone(),
            chunks: Some(chunks),
            task: None,
        }))
    }
}

/// Fake recorder emitting random payloads
#[derive(Debug)]
pub struct SyntheticDevice {
    label: String,
    chunk_size: RangeInclusive<usize>,
    chunks: Option<ChunkSender>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticDevice {
    fn payload(range: &RangeInclusive<usize>) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let len = rng.gen_range(range.clone());
        let mut buf = vec![0u8; len];
        rng.fill(&mut buf[..]);
        buf
    }
}

impl DeviceStream for SyntheticDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> RecorderState {
        if self.task.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }

    fn start(&mut self, timeslice: Duration) -> Result<(), MediaError> {
        if self.task.is_some() {
            return Ok(());
        }
        let tx = self.chunks.clone().ok_or_else(|| MediaError::DeviceStream {
            reason: format!("{} has been released", self.label),
        })?;
        let handle =
            tokio::runtime::Handle::try_current().map_err(|e| MediaError::DeviceStream {
                reason: format!("No async runtime to drive {}: {}", self.label, e),
            })?;

        let range = self.chunk_size.clone();
        let task = handle.spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);
            loop {
                ticker.tick().await;
                let payload = Self::payload(&range);
                if tx.send(Chunk::new(payload)).is_err() {
                    break;
                }
            }
        });

        debug!("🎬 {} recording, timeslice {:?}", self.label, timeslice);
        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MediaError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.abort();

        // Hand over whatever was buffered since the last timeslice
        if let Some(tx) = &self.chunks {
            let _ = tx.send(Chunk::new(Self::payload(&self.chunk_size)));
        }
        debug!("⏹️ {} stopped", self.label);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.chunks.take().is_some() {
            info!("📷 Released {}", self.label);
        }
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_denied_permission() {
        let provider = SyntheticDeviceProvider::new().deny_permission();
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = provider.acquire(&DeviceConstraints::fixed(), tx).await;
        assert!(matches!(result, Err(DeviceError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_missing_device() {
        let provider = SyntheticDeviceProvider::new().without_devices();
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = provider.acquire(&DeviceConstraints::fixed(), tx).await;
        assert!(matches!(result, Err(DeviceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_chunk_size_range_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let provider = SyntheticDeviceProvider::new().chunk_size(10..=1);
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = provider.acquire(&DeviceConstraints::fixed(), tx).await;
        assert!(matches!(result, Err(DeviceError::Unavailable { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_one_chunk_per_timeslice() {
        let provider = SyntheticDeviceProvider::new().chunk_size(10..=10);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = provider
            .acquire(&DeviceConstraints::fixed(), tx)
            .await
            .unwrap();

        device.start(Duration::from_millis(1000)).unwrap();
        // Second start is harmless
        device.start(Duration::from_millis(1000)).unwrap();
        assert_eq!(device.state(), RecorderState::Recording);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut received = 0;
        while let Ok(chunk) = rx.try_recv() {
            assert_eq!(chunk.size_bytes(), 10);
            received += 1;
        }
        assert_eq!(received, 3);

        device.stop().unwrap();
        assert_eq!(device.state(), RecorderState::Inactive);
        // Flush chunk
        assert!(rx.try_recv().is_ok());

        device.release();
        assert!(device.start(Duration::from_millis(1000)).is_err());
    }
}

//! Device stream abstraction
//!
//! A device stream is the hardware-facing recorder: once started it hands a
//! [`Chunk`] to its chunk channel every timeslice until stopped. The capture
//! controller owns the stream exclusively for the lifetime of a session.

pub mod synthetic;

use crate::chunk::Chunk;
use crate::error::{DeviceError, MediaError};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

pub use synthetic::{SyntheticDevice, SyntheticDeviceProvider};

/// Channel the device uses to hand over chunks
pub type ChunkSender = mpsc::UnboundedSender<Chunk>;

/// Receiving side of the chunk channel
pub type ChunkReceiver = mpsc::UnboundedReceiver<Chunk>;

/// Video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl VideoResolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const VGA: Self = Self::new(640, 480);
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What to ask the device for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConstraints {
    /// Requested video resolution
    pub resolution: VideoResolution,
    /// Whether audio is captured as well
    pub audio: bool,
}

impl DeviceConstraints {
    /// The constraints the bridge always records with: VGA video, no audio
    pub const fn fixed() -> Self {
        Self {
            resolution: VideoResolution::VGA,
            audio: false,
        }
    }

    /// Validate constraints
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Invalid resolution".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DeviceConstraints {
    fn default() -> Self {
        Self::fixed()
    }
}

impl fmt::Display for DeviceConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, audio {}",
            self.resolution,
            if self.audio { "on" } else { "off" }
        )
    }
}

/// Recorder state as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
}

/// An acquired device stream
pub trait DeviceStream: Send {
    /// Human readable device label
    fn label(&self) -> &str;

    /// Current recorder state
    fn state(&self) -> RecorderState;

    /// Begin emitting one chunk per `timeslice`
    ///
    /// Calling this while already recording must be harmless.
    fn start(&mut self, timeslice: Duration) -> Result<(), MediaError>;

    /// Flush any pending data and halt chunk production
    fn stop(&mut self) -> Result<(), MediaError>;

    /// Give the hardware back; the stream is unusable afterwards
    fn release(&mut self);
}

/// Source of device streams
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Request a stream matching `constraints`; chunks go to `chunks`
    async fn acquire(
        &self,
        constraints: &DeviceConstraints,
        chunks: ChunkSender,
    ) -> Result<Box<dyn DeviceStream>, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constraints() {
        let constraints = DeviceConstraints::fixed();
        assert_eq!(constraints.resolution, VideoResolution::new(640, 480));
        assert!(!constraints.audio);
        assert_eq!(constraints, DeviceConstraints::default());
        assert_eq!(constraints.to_string(), "640x480, audio off");
    }

    #[test]
    fn test_constraints_validation() {
        assert!(DeviceConstraints::fixed().validate().is_ok());

        let broken = DeviceConstraints {
            resolution: VideoResolution::new(0, 480),
            audio: false,
        };
        assert!(broken.validate().is_err());
    }
}

//! Runtime capability probing
//!
//! The probe is a pure function of the runtime and the media element. It does
//! not construct any engine; the negotiator decides what to build from the
//! returned [`CapabilitySet`].

use super::engine::{AdaptiveRuntime, MediaElement};

/// MIME type a media element must accept to play HLS natively
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Answer of a media element to "can you play this type?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanPlay {
    /// Definitely not
    No,
    /// Might work
    Maybe,
    /// Very likely works
    Probably,
}

impl CanPlay {
    /// Parse the answer strings used by web media elements (`""`, `"maybe"`, `"probably"`)
    pub fn from_answer(answer: &str) -> Self {
        match answer {
            "probably" => CanPlay::Probably,
            "maybe" => CanPlay::Maybe,
            _ => CanPlay::No,
        }
    }

    /// Any answer but `No` counts as playable
    pub fn is_playable(&self) -> bool {
        !matches!(self, CanPlay::No)
    }
}

/// Playback mechanisms the negotiator can choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Client-side adaptive streaming engine
    Adaptive,
    /// The media element plays the manifest itself
    Native,
}

/// Which playback mechanisms are usable in the current environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    /// Adaptive engine is supported
    pub adaptive: bool,
    /// Media element declares native support for the manifest type
    pub native: bool,
}

impl CapabilitySet {
    /// Whether `capability` is usable
    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Adaptive => self.adaptive,
            Capability::Native => self.native,
        }
    }

    /// The mechanism to use: adaptive always wins, native is only a fallback
    pub fn preferred(&self) -> Option<Capability> {
        if self.adaptive {
            Some(Capability::Adaptive)
        } else if self.native {
            Some(Capability::Native)
        } else {
            None
        }
    }

    /// Neither mechanism is usable
    pub fn is_empty(&self) -> bool {
        !self.adaptive && !self.native
    }
}

/// Capability probe
#[derive(Debug)]
pub struct CapabilityProbe;

impl CapabilityProbe {
    /// Probe the runtime for adaptive support and the element for native
    /// support of `native_mime_type`
    pub fn probe(
        runtime: &dyn AdaptiveRuntime,
        element: &dyn MediaElement,
        native_mime_type: &str,
    ) -> CapabilitySet {
        CapabilitySet {
            adaptive: runtime.is_supported(),
            native: element.can_play_type(native_mime_type).is_playable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_play_answers() {
        assert_eq!(CanPlay::from_answer(""), CanPlay::No);
        assert_eq!(CanPlay::from_answer("maybe"), CanPlay::Maybe);
        assert_eq!(CanPlay::from_answer("probably"), CanPlay::Probably);
        assert!(!CanPlay::No.is_playable());
        assert!(CanPlay::Maybe.is_playable());
    }

    #[test]
    fn test_preferred_order() {
        let both = CapabilitySet {
            adaptive: true,
            native: true,
        };
        assert_eq!(both.preferred(), Some(Capability::Adaptive));

        let native_only = CapabilitySet {
            adaptive: false,
            native: true,
        };
        assert_eq!(native_only.preferred(), Some(Capability::Native));
        assert!(native_only.contains(Capability::Native));
        assert!(!native_only.contains(Capability::Adaptive));

        let none = CapabilitySet::default();
        assert_eq!(none.preferred(), None);
        assert!(none.is_empty());
    }
}

mod media_controller;
mod sample_source;

pub use media_controller::{LocalMediaState, MediaController};
pub use sample_source::{NoMediaSource, SampleTrackSource};

use crate::error::CaptureError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::media::Sample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// What to capture when joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// One outbound track. The capture pipeline writes samples into it; peers
/// send whatever it carries.
///
/// Muting flips `enabled` and leaves the track attached everywhere, so no
/// connection has to renegotiate.
pub struct LocalTrack {
    kind: TrackKind,
    rtc: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, rtc: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            rtc,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        self.rtc.id()
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        self.rtc.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Writes one captured sample. Disabled or stopped tracks swallow it.
    pub async fn write_sample(&self, sample: &Sample) -> Result<bool, webrtc::Error> {
        if self.is_stopped() || !self.is_enabled() {
            return Ok(false);
        }
        self.rtc.write_sample(sample).await?;
        Ok(true)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Result of a successful capture request.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    pub stream_id: String,
    pub tracks: Vec<Arc<LocalTrack>>,
}

impl MediaHandle {
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }
}

/// Platform capture capability.
#[async_trait]
pub trait LocalMediaSource: Send + Sync {
    async fn acquire_local_tracks(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaHandle, CaptureError>;
}

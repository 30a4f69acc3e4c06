use crate::error::CaptureError;
use crate::media::{LocalMediaSource, LocalTrack, MediaConstraints, MediaHandle, TrackKind};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct LocalMediaState {
    pub stream: Option<MediaHandle>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl LocalMediaState {
    pub fn is_released(&self) -> bool {
        self.stream.is_none() && !self.audio_enabled && !self.video_enabled
    }
}

/// Owns the local capture for one session. The only writer of
/// [`LocalMediaState`]; peers only read the tracks.
pub struct MediaController {
    source: Arc<dyn LocalMediaSource>,
    state: LocalMediaState,
}

impl MediaController {
    pub fn new(source: Arc<dyn LocalMediaSource>) -> Self {
        Self {
            source,
            state: LocalMediaState::default(),
        }
    }

    /// Requests capture. On failure the state stays empty and the caller
    /// carries on without local media.
    pub async fn acquire(
        &mut self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaState, CaptureError> {
        self.release();

        if !constraints.audio && !constraints.video {
            info!("No local media requested, joining presence-only");
            return Ok(self.state.clone());
        }

        let handle = match self.source.acquire_local_tracks(constraints).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Local media unavailable, continuing without it: {}", e);
                return Err(e);
            }
        };

        let audio_enabled = handle.tracks_of(TrackKind::Audio).next().is_some();
        let video_enabled = handle.tracks_of(TrackKind::Video).next().is_some();
        self.state = LocalMediaState {
            audio_enabled,
            video_enabled,
            stream: Some(handle),
        };
        info!(
            "Local media acquired (audio: {}, video: {})",
            self.state.audio_enabled, self.state.video_enabled
        );
        Ok(self.state.clone())
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        if self.set_kind_enabled(TrackKind::Audio, enabled) {
            self.state.audio_enabled = enabled;
        }
    }

    pub fn set_video_enabled(&mut self, enabled: bool) {
        if self.set_kind_enabled(TrackKind::Video, enabled) {
            self.state.video_enabled = enabled;
        }
    }

    fn set_kind_enabled(&self, kind: TrackKind, enabled: bool) -> bool {
        let Some(handle) = &self.state.stream else {
            return false;
        };
        let mut found = false;
        for track in handle.tracks_of(kind) {
            track.set_enabled(enabled);
            found = true;
        }
        found
    }

    /// Stops every track and forgets them.
    pub fn release(&mut self) {
        if let Some(handle) = self.state.stream.take() {
            for track in &handle.tracks {
                track.stop();
            }
            info!("Local media released ({} tracks)", handle.tracks.len());
        }
        self.state = LocalMediaState::default();
    }

    pub fn tracks(&self) -> Vec<Arc<LocalTrack>> {
        self.state
            .stream
            .as_ref()
            .map(|h| h.tracks.clone())
            .unwrap_or_default()
    }

    pub fn state(&self) -> &LocalMediaState {
        &self.state
    }
}

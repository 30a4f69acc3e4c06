use crate::error::CaptureError;
use crate::media::{LocalMediaSource, LocalTrack, MediaConstraints, MediaHandle, TrackKind};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Creates Opus/VP8 sample tracks for an external capture pipeline to feed.
#[derive(Debug, Default, Clone)]
pub struct SampleTrackSource;

impl SampleTrackSource {
    pub fn track(kind: TrackKind, stream_id: &str) -> LocalTrack {
        let (mime_type, clock_rate, channels, label) = match kind {
            TrackKind::Audio => (MIME_TYPE_OPUS, 48_000, 2, "audio"),
            TrackKind::Video => (MIME_TYPE_VP8, 90_000, 0, "video"),
        };
        let rtc = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                clock_rate,
                channels,
                ..Default::default()
            },
            format!("{label}-{}", Uuid::new_v4().simple()),
            stream_id.to_owned(),
        );
        LocalTrack::new(kind, Arc::new(rtc))
    }
}

#[async_trait]
impl LocalMediaSource for SampleTrackSource {
    async fn acquire_local_tracks(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaHandle, CaptureError> {
        if !constraints.audio && !constraints.video {
            return Err(CaptureError::NothingRequested);
        }

        let stream_id = Uuid::new_v4().simple().to_string();
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(Self::track(TrackKind::Audio, &stream_id)));
        }
        if constraints.video {
            tracks.push(Arc::new(Self::track(TrackKind::Video, &stream_id)));
        }
        Ok(MediaHandle { stream_id, tracks })
    }
}

/// Source for hosts without capture devices. Participants join presence-only.
#[derive(Debug, Default, Clone)]
pub struct NoMediaSource;

#[async_trait]
impl LocalMediaSource for NoMediaSource {
    async fn acquire_local_tracks(
        &self,
        _constraints: MediaConstraints,
    ) -> Result<MediaHandle, CaptureError> {
        Err(CaptureError::NoDevice)
    }
}

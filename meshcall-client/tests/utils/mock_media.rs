use async_trait::async_trait;
use meshcall_client::media::{LocalMediaSource, MediaHandle, SampleTrackSource};
use meshcall_client::{CaptureError, MediaConstraints};
use std::sync::Mutex;

/// Media source that can be told to refuse capture, and remembers what it
/// handed out.
#[derive(Default)]
pub struct MockMediaSource {
    failure: Option<CaptureError>,
    acquired: Mutex<Vec<MediaHandle>>,
}

impl MockMediaSource {
    pub fn working() -> Self {
        Self::default()
    }

    pub fn failing(error: CaptureError) -> Self {
        Self {
            failure: Some(error),
            acquired: Mutex::new(Vec::new()),
        }
    }

    pub fn acquired(&self) -> Vec<MediaHandle> {
        self.acquired.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalMediaSource for MockMediaSource {
    async fn acquire_local_tracks(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaHandle, CaptureError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let handle = SampleTrackSource.acquire_local_tracks(constraints).await?;
        self.acquired.lock().unwrap().push(handle.clone());
        Ok(handle)
    }
}

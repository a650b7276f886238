use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use tokio::task::JoinHandle;

use crate::media::DeviceError;
use crate::models::message::MediaBlob;

pub const CAMERA_ERROR: &str = "No se pudo acceder a la cámara";
pub const CAPTURE_MIME: &str = "image/png";
pub const CAPTURE_FILE_NAME: &str = "captured-image.png";

#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self) -> Result<Box<dyn VideoTrack>, DeviceError>;
}

/// Raw RGBA frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait VideoTrack: Send {
    /// Current frame, if the stream has produced one.
    fn frame(&mut self) -> Option<VideoFrame>;

    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraState {
    Idle,
    Streaming,
    Captured,
    Closed,
    Error(String),
}

struct Shared {
    state: CameraState,
    track: Option<Box<dyn VideoTrack>>,
}

/// `Idle -> Streaming -> Captured`. Stream acquisition runs in the background;
/// a stream that arrives after [`CameraCapture::close`] is stopped on arrival.
pub struct CameraCapture {
    shared: Arc<Mutex<Shared>>,
    acquisition: Option<JoinHandle<()>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

impl CameraCapture {
    /// Must be called inside a tokio runtime.
    pub fn open(camera: Arc<dyn Camera>) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            state: CameraState::Idle,
            track: None,
        }));

        let task_shared = Arc::clone(&shared);
        let acquisition = tokio::spawn(async move {
            let result = camera.open().await;
            let mut guard = lock(&task_shared);
            match result {
                Ok(mut track) if guard.state == CameraState::Closed => {
                    log::info!("Camera stream arrived after close, stopping it");
                    track.stop();
                }
                Ok(track) => {
                    guard.track = Some(track);
                    guard.state = CameraState::Streaming;
                    log::info!("Camera streaming");
                }
                Err(e) => {
                    log::warn!("Camera unavailable: {}", e);
                    if guard.state != CameraState::Closed {
                        guard.state = CameraState::Error(CAMERA_ERROR.to_string());
                    }
                }
            }
        });

        Self {
            shared,
            acquisition: Some(acquisition),
        }
    }

    pub fn state(&self) -> CameraState {
        lock(&self.shared).state.clone()
    }

    /// Waits for the pending acquisition, if any, and reports the resulting state.
    pub async fn ready(&mut self) -> CameraState {
        if let Some(task) = self.acquisition.take() {
            if let Err(e) = task.await {
                log::error!("Camera acquisition task failed: {}", e);
            }
        }
        self.state()
    }

    /// Rasterizes the current frame to PNG and releases the stream.
    pub fn capture(&mut self) -> Result<MediaBlob, DeviceError> {
        let mut guard = lock(&self.shared);
        if guard.state != CameraState::Streaming {
            return Err(DeviceError::NotReady);
        }
        let track = guard.track.as_mut().ok_or(DeviceError::NotReady)?;
        let frame = track.frame().ok_or(DeviceError::NotReady)?;
        let png = encode_png(frame)?;

        if let Some(mut track) = guard.track.take() {
            track.stop();
        }
        guard.state = CameraState::Captured;
        log::info!("Captured still image: {} bytes", png.len());
        Ok(MediaBlob::new(png, CAPTURE_MIME, CAPTURE_FILE_NAME))
    }

    /// Releases the stream whatever the current state is.
    pub fn close(&mut self) {
        let mut guard = lock(&self.shared);
        if let Some(mut track) = guard.track.take() {
            track.stop();
        }
        guard.state = CameraState::Closed;
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.close();
    }
}

pub fn encode_png(frame: VideoFrame) -> Result<Vec<u8>, DeviceError> {
    let VideoFrame { width, height, rgba } = frame;
    let image = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| DeviceError::Encoding(format!("frame buffer does not match {width}x{height}")))?;

    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| DeviceError::Encoding(e.to_string()))?;
    Ok(buf.into_inner())
}

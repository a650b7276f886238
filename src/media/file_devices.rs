//! File-backed devices for the terminal front-end: a "microphone" that
//! replays an audio file and a "camera" whose only frame is an image file.

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::media::camera::{Camera, VideoFrame, VideoTrack};
use crate::media::voice::{AudioTrack, Microphone};
use crate::media::DeviceError;

const CHUNK_SIZE: usize = 16 * 1024;

pub struct FileMicrophone {
    path: PathBuf,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct FileAudioTrack {
    chunks: VecDeque<Vec<u8>>,
    live: bool,
}

impl AudioTrack for FileAudioTrack {
    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        if !self.live {
            return Vec::new();
        }
        self.chunks.drain(..).collect()
    }

    fn stop(&mut self) {
        self.live = false;
    }
}

#[async_trait]
impl Microphone for FileMicrophone {
    async fn open(&self) -> Result<Box<dyn AudioTrack>, DeviceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| map_io(&self.path, e))?;
        let chunks = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        Ok(Box::new(FileAudioTrack { chunks, live: true }))
    }
}

pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct StillTrack {
    frame: Option<VideoFrame>,
}

impl VideoTrack for StillTrack {
    fn frame(&mut self) -> Option<VideoFrame> {
        self.frame.clone()
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn open(&self) -> Result<Box<dyn VideoTrack>, DeviceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| map_io(&self.path, e))?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?
            .map_err(|e| DeviceError::Unavailable(format!("unsupported image: {e}")))?;

        let rgba = decoded.to_rgba8();
        let frame = VideoFrame {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        };
        Ok(Box::new(StillTrack { frame: Some(frame) }))
    }
}

fn map_io(path: &std::path::Path, e: std::io::Error) -> DeviceError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(path.display().to_string()),
        _ => DeviceError::Unavailable(format!("{}: {e}", path.display())),
    }
}

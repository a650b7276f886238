use std::sync::Arc;

use async_trait::async_trait;

use crate::media::DeviceError;
use crate::models::message::MediaBlob;

pub const MIC_ERROR: &str = "No se pudo acceder al micrófono";
pub const CLIP_MIME: &str = "audio/webm";
pub const CLIP_FILE_NAME: &str = "nota-voz.webm";

#[async_trait]
pub trait Microphone: Send + Sync {
    /// Requests access and starts capturing. Denial is an error, not a panic.
    async fn open(&self) -> Result<Box<dyn AudioTrack>, DeviceError>;
}

pub trait AudioTrack: Send {
    /// Chunks buffered since the last call.
    fn take_chunks(&mut self) -> Vec<Vec<u8>>;

    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
    Error,
}

/// `Idle -> Recording -> Stopped(clip)`; at most one recording at a time.
pub struct VoiceRecorder {
    mic: Arc<dyn Microphone>,
    track: Option<Box<dyn AudioTrack>>,
    chunks: Vec<Vec<u8>>,
    clip: Option<MediaBlob>,
    error: Option<String>,
}

impl VoiceRecorder {
    pub fn new(mic: Arc<dyn Microphone>) -> Self {
        Self {
            mic,
            track: None,
            chunks: Vec::new(),
            clip: None,
            error: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        if self.track.is_some() {
            RecorderState::Recording
        } else if self.clip.is_some() {
            RecorderState::Stopped
        } else if self.error.is_some() {
            RecorderState::Error
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.track.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clip(&self) -> Option<&MediaBlob> {
        self.clip.as_ref()
    }

    pub async fn start(&mut self) -> Result<(), DeviceError> {
        if self.track.is_some() {
            return Err(DeviceError::Busy);
        }
        self.error = None;
        self.clip = None;
        self.chunks.clear();

        match self.mic.open().await {
            Ok(track) => {
                log::info!("Microphone recording started");
                self.track = Some(track);
                Ok(())
            }
            Err(e) => {
                log::warn!("Microphone unavailable: {}", e);
                self.error = Some(MIC_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Moves buffered audio out of the track, dropping empty chunks.
    pub fn poll(&mut self) {
        if let Some(track) = self.track.as_mut() {
            self.chunks
                .extend(track.take_chunks().into_iter().filter(|c| !c.is_empty()));
        }
    }

    /// Flushes buffered audio into one clip. No audio means back to idle.
    pub fn stop(&mut self) -> Option<&MediaBlob> {
        self.poll();
        let mut track = self.track.take()?;
        track.stop();

        let bytes = std::mem::take(&mut self.chunks).concat();
        if bytes.is_empty() {
            log::info!("Recording stopped without audio");
            return None;
        }
        log::info!("Recording stopped: {} bytes", bytes.len());
        self.clip = Some(MediaBlob::new(bytes, CLIP_MIME, CLIP_FILE_NAME));
        self.clip.as_ref()
    }

    /// Start when idle, stop when recording.
    pub async fn toggle(&mut self) -> Result<RecorderState, DeviceError> {
        if self.is_recording() {
            self.stop();
        } else {
            self.start().await?;
        }
        Ok(self.state())
    }

    pub fn take_clip(&mut self) -> Option<MediaBlob> {
        self.clip.take()
    }

    pub fn discard(&mut self) {
        if let Some(mut track) = self.track.take() {
            track.stop();
        }
        self.chunks.clear();
        self.clip = None;
        self.error = None;
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        if let Some(mut track) = self.track.take() {
            track.stop();
        }
    }
}

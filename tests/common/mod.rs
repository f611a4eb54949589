//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bg_remover::error::{AppError, AppResult};
use bg_remover::removebg::BackgroundRemover;
use bg_remover::share::{SharePayload, ShareTarget};
use bg_remover::workflow::SourceImage;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::Notify;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub enum Reply {
    Image(Vec<u8>),
    Fail(String),
    Network,
}

/// Remover with a scripted reply; can be held until released.
pub struct MockRemover {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
}

impl MockRemover {
    pub fn new(reply: Reply) -> Self {
        MockRemover {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            gate: None,
            started: Arc::new(Notify::new()),
        }
    }

    /// Every call waits for `gate.notify_one()` before replying.
    pub fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
        MockRemover { gate: Some(gate), ..MockRemover::new(reply) }
    }

    pub fn succeeding() -> Self {
        MockRemover::new(Reply::Image(png_bytes(2, 2)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Arc<Notify> {
        self.started.clone()
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, _image: &SourceImage) -> AppResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &*self.reply.lock().unwrap() {
            Reply::Image(bytes) => Ok(bytes.clone()),
            Reply::Fail(message) => Err(AppError::transfer(message.clone())),
            Reply::Network => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

/// Share target that records payloads, or fails on demand.
#[derive(Default)]
pub struct RecordingShare {
    pub fail: bool,
    pub shared: Mutex<Vec<SharePayload>>,
}

#[async_trait]
impl ShareTarget for RecordingShare {
    async fn share(&self, payload: &SharePayload) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Share("user dismissed the share sheet".into()));
        }
        self.shared.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

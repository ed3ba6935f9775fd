//! MJPEG frame streaming.
//!
//! Each chunk is one JPEG framed for a `multipart/x-mixed-replace`
//! response. The streamer runs on its own cadence and re-sends the
//! latest frame until the producer replaces it.

use super::Slot;
use crate::capture::{ColorSpace, Frame};
use futures::Stream;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Multipart boundary between frames.
pub const BOUNDARY: &str = "frame";
/// Content type of the streaming response.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Frame encoding errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame buffer does not match its dimensions: {0}")]
    InvalidFrame(String),
    #[error("jpeg encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Compresses a frame to JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if !frame.is_valid() {
        return Err(EncodeError::InvalidFrame(format!("{frame:?}")));
    }
    let color = match frame.color() {
        ColorSpace::Gray => ColorType::L8,
        ColorSpace::Rgb => ColorType::Rgb8,
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode(
        frame.pixels(),
        frame.width(),
        frame.height(),
        color,
    )?;
    Ok(jpeg)
}

/// Wraps an encoded image as one multipart part.
pub fn multipart_chunk(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut chunk = Vec::with_capacity(header.len() + jpeg.len() + 2);
    chunk.extend_from_slice(header.as_bytes());
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    chunk
}

/// Streams the latest published frame every `interval` until `running`
/// turns false or its sender is dropped.
pub fn mjpeg_stream(
    frames: Arc<Slot<Arc<Frame>>>,
    mut running: watch::Receiver<bool>,
    interval: Duration,
    quality: u8,
) -> impl Stream<Item = Result<Vec<u8>, Infallible>> + Send + 'static {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = running.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            if !*running.borrow() {
                break;
            }

            let Some(frame) = frames.peek() else {
                continue;
            };
            match encode_jpeg(&frame, quality) {
                Ok(jpeg) => yield Ok(multipart_chunk(&jpeg)),
                Err(e) => tracing::debug!(error = %e, "Skipping frame that failed to encode"),
            }
        }
        tracing::debug!("Frame stream ended");
    }
}

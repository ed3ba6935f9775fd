//! Network and file video sources via OpenCV `videoio`.
//!
//! Accepts anything `VideoCapture::from_file` understands: RTSP and HTTP
//! MJPEG urls from IP-camera apps, or a path to a recorded clip.

use super::reader::{FrameReader, RawImage, ReaderThread, ReaderTimeouts};
use super::{Camera, CameraError, CaptureConfig, ColorSpace, Frame};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};

struct OpenCvReader {
    capture: VideoCapture,
}

impl FrameReader for OpenCvReader {
    fn read(&mut self) -> Result<Option<RawImage>, String> {
        let mut bgr = Mat::default();
        let grabbed = VideoCaptureTrait::read(&mut self.capture, &mut bgr).map_err(|e| e.to_string())?;
        if !grabbed || bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(|e| e.to_string())?;

        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        let pixels = rgb.data_bytes().map_err(|e| e.to_string())?.to_vec();
        Ok(Some(RawImage {
            pixels,
            width,
            height,
        }))
    }

    fn shutdown(&mut self) -> Result<(), String> {
        self.capture.release().map_err(|e| e.to_string())
    }
}

/// A video stream addressed by url.
pub struct StreamCamera {
    url: String,
    reader: Option<ReaderThread>,
    sequence: u64,
}

impl StreamCamera {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reader: None,
            sequence: 0,
        }
    }
}

impl Camera for StreamCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let url = self.url.clone();
        let reader = ReaderThread::spawn("video-stream", ReaderTimeouts::default(), move || {
            let mut capture = VideoCapture::from_file(&url, videoio::CAP_ANY)
                .map_err(|e| CameraError::OpenFailed(format!("{url}: {e}")))?;
            let opened = capture
                .is_opened()
                .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
            if !opened {
                return Err(CameraError::OpenFailed(format!("cannot open stream {url}")));
            }
            // Keep latency low: only the newest frame matters.
            let _ = capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0);
            Ok(OpenCvReader { capture })
        })?;

        self.reader = Some(reader);
        self.sequence = 0;
        tracing::info!(url = %self.url, "Video stream opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<Frame>, CameraError> {
        let reader = self.reader.as_mut().ok_or(CameraError::NotInitialized)?;
        let Some(image) = reader.read()? else {
            return Ok(None);
        };
        self.sequence += 1;
        Ok(Some(Frame::new(
            image.pixels,
            image.width,
            image.height,
            ColorSpace::Rgb,
            self.sequence,
        )))
    }

    fn is_open(&self) -> bool {
        self.reader.as_ref().is_some_and(ReaderThread::is_alive)
    }

    fn close(&mut self) -> Result<(), CameraError> {
        let Some(reader) = self.reader.take() else {
            return Ok(());
        };
        reader.close()?;
        tracing::info!(url = %self.url, "Video stream closed");
        Ok(())
    }
}

//! Local capture devices via `nokhwa`.

use super::reader::{FrameReader, RawImage, ReaderThread, ReaderTimeouts};
use super::{Camera, CameraError, CaptureConfig, ColorSpace, Frame};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};

struct NokhwaReader {
    camera: nokhwa::Camera,
}

impl FrameReader for NokhwaReader {
    fn read(&mut self) -> Result<Option<RawImage>, String> {
        let image = self
            .camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>())
            .map_err(|e| e.to_string())?;
        let (width, height) = (image.width(), image.height());
        Ok(Some(RawImage {
            pixels: image.into_raw(),
            width,
            height,
        }))
    }

    fn shutdown(&mut self) -> Result<(), String> {
        self.camera.stop_stream().map_err(|e| e.to_string())
    }
}

/// A local camera addressed by index.
pub struct DeviceCamera {
    index: u32,
    reader: Option<ReaderThread>,
    sequence: u64,
}

impl DeviceCamera {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            reader: None,
            sequence: 0,
        }
    }
}

impl Camera for DeviceCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let index = self.index;
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new_from(config.width, config.height, FrameFormat::MJPEG, config.fps),
        ));

        let reader = ReaderThread::spawn(format!("camera-{index}"), ReaderTimeouts::default(), move || {
            let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), format)
                .map_err(|e| CameraError::DeviceNotFound(format!("device {index}: {e}")))?;
            camera
                .open_stream()
                .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
            Ok(NokhwaReader { camera })
        })?;

        self.reader = Some(reader);
        self.sequence = 0;
        tracing::info!(index, "Camera device opened");
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
        tracing::info!(index = self.index, "Camera device closed");
        Ok(())
    }
}

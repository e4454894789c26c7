use derive_more::Display;
use image::codecs::jpeg::JpegEncoder;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;
const FRAME_BYTES: usize = (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize;
const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Display, Eq, PartialEq)]
pub enum CaptureError {
    #[display(fmt = "camera access was denied")]
    AccessDenied,
    #[display(fmt = "no preview is running")]
    NotPreviewing,
    #[display(fmt = "no frame available")]
    FrameUnavailable,
    #[display(fmt = "could not encode the captured frame")]
    Encode,
}

impl std::error::Error for CaptureError {}

/// A camera the session can hold open. `read_frame` returns the current
/// preview frame as packed RGB8 bytes.
pub trait CameraDevice {
    fn open(&mut self) -> Result<(), CaptureError>;
    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SessionState {
    Closed,
    Previewing,
    Captured,
}

/// Holds the camera for exactly one photo. Capturing stops the stream; the
/// stream is also released on dispose, on a failed capture, and on drop, so
/// it cannot outlive the session. The session owns the device, which is what
/// keeps it to one holder at a time.
pub struct CaptureSession<C: CameraDevice> {
    camera: C,
    state: SessionState,
    photo: Option<CapturedPhoto>,
}

impl<C: CameraDevice> CaptureSession<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            state: SessionState::Closed,
            photo: None,
        }
    }

    /// Open the camera and begin previewing. Denied access leaves the
    /// session closed. Calling while already previewing is a no-op.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == SessionState::Previewing {
            return Ok(());
        }
        self.camera.open()?;
        self.state = SessionState::Previewing;
        Ok(())
    }

    /// Take the one photo this session is for: copy the current frame into a
    /// fixed-size raster, encode it as JPEG, and stop the camera. Valid only
    /// while previewing.
    pub fn capture(&mut self) -> Result<&CapturedPhoto, CaptureError> {
        if self.state != SessionState::Previewing {
            return Err(CaptureError::NotPreviewing);
        }

        let result = self.camera.read_frame().and_then(encode_frame);
        // the stream ends here on success and failure alike
        self.camera.close();

        match result {
            Ok(photo) => {
                self.state = SessionState::Captured;
                Ok(&*self.photo.insert(photo))
            }
            Err(err) => {
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    /// Discard the captured photo and reopen the camera for another try.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.photo = None;
        if self.camera.is_open() {
            self.camera.close();
        }
        self.state = SessionState::Closed;
        self.start()
    }

    /// Release the camera and drop any captured photo. Idempotent.
    pub fn dispose(&mut self) {
        if self.camera.is_open() {
            self.camera.close();
        }
        self.photo = None;
        self.state = SessionState::Closed;
    }

    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    /// Forget the photo after it has been submitted successfully. A failed
    /// submission must NOT call this; the photo stays for the retry.
    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    pub fn is_previewing(&self) -> bool {
        self.state == SessionState::Previewing
    }
}

impl<C: CameraDevice> Drop for CaptureSession<C> {
    fn drop(&mut self) {
        if self.camera.is_open() {
            self.camera.close();
        }
    }
}

fn encode_frame(frame: Vec<u8>) -> Result<CapturedPhoto, CaptureError> {
    // Fixed-size raster: short frames are padded with black, long ones cut.
    let mut raster = vec![0u8; FRAME_BYTES];
    let n = frame.len().min(FRAME_BYTES);
    raster[..n].copy_from_slice(&frame[..n]);

    let buffer = image::RgbImage::from_raw(FRAME_WIDTH, FRAME_HEIGHT, raster)
        .ok_or(CaptureError::FrameUnavailable)?;

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&buffer)
        .map_err(|_| CaptureError::Encode)?;

    Ok(CapturedPhoto {
        jpeg,
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CameraLog {
        opens: usize,
        closes: usize,
        open: bool,
    }

    #[derive(Clone)]
    struct FakeCamera {
        log: Arc<Mutex<CameraLog>>,
        deny: bool,
    }

    impl FakeCamera {
        fn new() -> (Self, Arc<Mutex<CameraLog>>) {
            let log = Arc::new(Mutex::new(CameraLog::default()));
            (
                Self {
                    log: log.clone(),
                    deny: false,
                },
                log,
            )
        }

        fn denied() -> Self {
            Self {
                log: Arc::new(Mutex::new(CameraLog::default())),
                deny: true,
            }
        }
    }

    impl CameraDevice for FakeCamera {
        fn open(&mut self) -> Result<(), CaptureError> {
            if self.deny {
                return Err(CaptureError::AccessDenied);
            }
            let mut log = self.log.lock().unwrap();
            log.opens += 1;
            log.open = true;
            Ok(())
        }

        fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
            Ok(vec![128; 320 * 240 * 3])
        }

        fn close(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.closes += 1;
            log.open = false;
        }

        fn is_open(&self) -> bool {
            self.log.lock().unwrap().open
        }
    }

    #[test]
    fn denied_access_leaves_the_session_closed() {
        let mut session = CaptureSession::new(FakeCamera::denied());
        assert_eq!(session.start(), Err(CaptureError::AccessDenied));
        assert!(!session.is_previewing());
        assert!(session.photo().is_none());
    }

    #[test]
    fn capture_stops_the_camera_and_yields_a_jpeg() {
        let (camera, log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        session.start().unwrap();
        let photo = session.capture().unwrap();

        assert_eq!(&photo.jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!((photo.width, photo.height), (FRAME_WIDTH, FRAME_HEIGHT));
        assert!(!log.lock().unwrap().open);
    }

    #[test]
    fn one_photo_per_session() {
        let (camera, _log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        session.start().unwrap();
        session.capture().unwrap();
        assert_eq!(session.capture().unwrap_err(), CaptureError::NotPreviewing);
    }

    #[test]
    fn capture_without_preview_is_rejected() {
        let (camera, _log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        assert_eq!(session.capture().unwrap_err(), CaptureError::NotPreviewing);
    }

    #[test]
    fn retake_discards_the_photo_and_reopens_exactly_once() {
        let (camera, log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        session.start().unwrap();
        session.capture().unwrap();
        assert!(session.photo().is_some());

        session.retake().unwrap();
        assert!(session.photo().is_none());
        assert!(session.is_previewing());

        let log = log.lock().unwrap();
        assert_eq!(log.opens, 2, "start + retake, nothing else");
        assert_eq!(log.closes, 1, "only the capture closed the stream");
    }

    #[test]
    fn dropping_the_session_releases_the_camera() {
        let (camera, log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        session.start().unwrap();
        assert!(log.lock().unwrap().open);

        drop(session);
        let log = log.lock().unwrap();
        assert!(!log.open);
        assert_eq!(log.closes, 1);
    }

    #[test]
    fn dispose_is_idempotent() {
        let (camera, log) = FakeCamera::new();
        let mut session = CaptureSession::new(camera);
        session.start().unwrap();
        session.dispose();
        session.dispose();
        drop(session);
        assert_eq!(log.lock().unwrap().closes, 1);
    }
}

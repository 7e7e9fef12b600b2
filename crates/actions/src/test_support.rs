//! Shared test doubles for the action catalog tests.

use async_trait::async_trait;
use roverctl_config::DeviceConfig;
use roverctl_device::{DeviceClient, DeviceTransport, TransportResponse};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use roverctl_device::TransportError;

/// Records every requested URL and replays canned responses in order.
pub struct RecordingTransport {
    requests: Mutex<Vec<String>>,
    responses: Mutex<Vec<std::result::Result<TransportResponse, TransportError>>>,
}

impl RecordingTransport {
    pub fn new(
        responses: Vec<std::result::Result<TransportResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceTransport for RecordingTransport {
    async fn get(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TransportResponse {
                status: 200,
                body: b"{}".to_vec(),
            })
        } else {
            responses.remove(0)
        }
    }
}

pub fn ok_json(body: &[u8]) -> std::result::Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: 200,
        body: body.to_vec(),
    })
}

/// A small valid JPEG for canned camera responses.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 2, image::Rgb([64, 128, 192]));
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(std::io::Cursor::new(&mut buf), 100)
        .encode_image(&img)
        .unwrap();
    buf
}

/// A client with zeroed settle delays, archiving to a temp dir.
pub fn test_client(
    transport: Arc<RecordingTransport>,
) -> (Arc<DeviceClient>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = DeviceConfig {
        photos_dir: dir.path().to_path_buf(),
        settle_ms: 0,
        inter_move_settle_ms: 0,
        ..DeviceConfig::default()
    };
    (
        Arc::new(DeviceClient::with_transport(
            "192.168.1.100",
            &config,
            transport,
        )),
        dir,
    )
}

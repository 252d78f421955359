//! HTTP probe media backend.
//!
//! Without a video surface the CLI can only check that a stream is being
//! served in the expected format: the HLS manifest must start with
//! `#EXTM3U`, an FLV body with the `FLV` signature, and an MP4 URL must
//! answer with a success status. A passing probe counts as "ready".

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use url::Url;

use rasd_core::stream::{AttachRequest, MediaBackend, Player};
use rasd_core::{CameraId, StreamError, Transport};

const HLS_SIGNATURE: &str = "#EXTM3U";
const FLV_SIGNATURE: &[u8] = b"FLV";

pub struct HttpProbeBackend {
    client: reqwest::Client,
}

impl HttpProbeBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rasd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl MediaBackend for HttpProbeBackend {
    fn attach(&self, request: AttachRequest) -> BoxFuture<'static, Result<Box<dyn Player>, StreamError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let player = probe(&client, &request).await?;
            Ok(Box::new(player) as Box<dyn Player>)
        })
    }

    fn reset_surface(&self, camera_id: &CameraId) {
        tracing::trace!(%camera_id, "no surface to reset");
    }
}

/// Result of a successful probe. Holds no connection; "playing" just
/// tracks whether it has been torn down.
#[derive(Debug)]
pub struct ProbePlayer {
    url: Url,
    playing: AtomicBool,
}

impl Player for ProbePlayer {
    fn teardown(&mut self) -> Result<(), StreamError> {
        self.playing.store(false, Ordering::Relaxed);
        tracing::debug!(url = %self.url, "probe player released");
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

async fn probe(client: &reqwest::Client, request: &AttachRequest) -> Result<ProbePlayer, StreamError> {
    let fail = |reason: String| StreamError::attach(&request.camera_id, reason);

    let url = Url::parse(&request.url).map_err(|e| fail(format!("invalid URL: {e}")))?;
    tracing::debug!(camera_id = %request.camera_id, %url, transport = %request.transport, "probing stream");

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fail(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("server answered HTTP {status}")));
    }

    match request.transport {
        Transport::Hls => {
            let body = response
                .text()
                .await
                .map_err(|e| fail(format!("reading manifest failed: {e}")))?;
            if !body.trim_start().starts_with(HLS_SIGNATURE) {
                return Err(fail("response is not an HLS manifest".into()));
            }
        }
        Transport::Flv => {
            // Live FLV never ends; only the header matters.
            let mut head = Vec::with_capacity(FLV_SIGNATURE.len());
            while head.len() < FLV_SIGNATURE.len() {
                match response
                    .chunk()
                    .await
                    .map_err(|e| fail(format!("reading stream failed: {e}")))?
                {
                    Some(chunk) => head.extend_from_slice(&chunk),
                    None => break,
                }
            }
            if !head.starts_with(FLV_SIGNATURE) {
                return Err(fail("response is not an FLV stream".into()));
            }
        }
        Transport::Mp4 => {}
    }

    Ok(ProbePlayer {
        url,
        playing: AtomicBool::new(true),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String, transport: Transport) -> AttachRequest {
        AttachRequest {
            camera_id: CameraId::from("cam1"),
            url,
            transport,
        }
    }

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn backend() -> HttpProbeBackend {
        HttpProbeBackend::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn hls_manifest_is_ready() {
        let server = serve(
            "/live/cam1.m3u8",
            ResponseTemplate::new(200).set_body_string("#EXTM3U\n#EXT-X-VERSION:3\n"),
        )
        .await;
        let url = format!("{}/live/cam1.m3u8", server.uri());

        let mut player = backend().attach(request(url, Transport::Hls)).await.unwrap();
        assert!(player.is_playing());
        player.teardown().unwrap();
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn html_page_is_not_a_manifest() {
        let server = serve(
            "/live/cam1.m3u8",
            ResponseTemplate::new(200).set_body_string("<html>login</html>"),
        )
        .await;
        let url = format!("{}/live/cam1.m3u8", server.uri());

        let err = backend().attach(request(url, Transport::Hls)).await.err().unwrap();
        assert!(matches!(err, StreamError::Attach { ref reason, .. } if reason.contains("HLS")));
    }

    #[tokio::test]
    async fn flv_signature_is_checked() {
        let server = serve(
            "/live/cam1.flv",
            ResponseTemplate::new(200).set_body_bytes(b"FLV\x01\x05\x00\x00\x00\x09".to_vec()),
        )
        .await;
        let good = format!("{}/live/cam1.flv", server.uri());
        assert!(backend().attach(request(good, Transport::Flv)).await.is_ok());

        let bad = serve("/x.flv", ResponseTemplate::new(200).set_body_bytes(b"GIF89a".to_vec())).await;
        let bad = format!("{}/x.flv", bad.uri());
        assert!(backend().attach(request(bad, Transport::Flv)).await.is_err());
    }

    #[tokio::test]
    async fn http_errors_fail_the_attach() {
        let server = serve("/clip.mp4", ResponseTemplate::new(404)).await;
        let url = format!("{}/clip.mp4", server.uri());
        let err = backend().attach(request(url, Transport::Mp4)).await.err().unwrap();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn mp4_only_needs_success() {
        let server = serve("/clip.mp4", ResponseTemplate::new(200)).await;
        let url = format!("{}/clip.mp4", server.uri());
        assert!(backend().attach(request(url, Transport::Mp4)).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_url_fails_without_request() {
        let err = backend()
            .attach(request("not a url".into(), Transport::Hls))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid URL"));
    }
}

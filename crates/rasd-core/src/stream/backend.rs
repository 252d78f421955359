//! Video rendering collaborator.
//!
//! A [`MediaBackend`] knows how to bind a stream URL to the playback
//! surface of one camera slot. HLS and FLV go through an external decoder,
//! MP4 loads natively; which is which is the backend's business. The
//! manager only sees the outcome: a [`Player`] once the stream is ready,
//! or a [`StreamError`].

use futures_util::future::BoxFuture;

use crate::error::StreamError;
use crate::model::CameraId;
use crate::stream::Transport;

/// Everything a backend needs to attach one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    pub camera_id: CameraId,
    pub url: String,
    pub transport: Transport,
}

/// A live player bound to a camera's playback surface.
pub trait Player: Send + Sync {
    /// Release decoder resources. Called exactly once per player.
    fn teardown(&mut self) -> Result<(), StreamError>;

    fn is_playing(&self) -> bool;
}

pub trait MediaBackend: Send + Sync {
    /// Attach a stream and resolve once it is ready to play.
    ///
    /// The returned future is dropped if readiness does not arrive in
    /// time; backends must not rely on it being polled to completion.
    fn attach(&self, request: AttachRequest) -> BoxFuture<'static, Result<Box<dyn Player>, StreamError>>;

    /// Return the camera's playback surface to its empty state.
    fn reset_surface(&self, camera_id: &CameraId);
}

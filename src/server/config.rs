use super::RequestsLoggingLevel;
use crate::media::MediaLimits;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    pub limits: MediaLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            limits: MediaLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Largest request body accepted: both media files plus some room for the form fields.
    ///
    /// Accepted media is held in memory until it is written to the blob store,
    /// so one request can cost up to this many bytes of RAM. `POST /api/upload`
    /// stops reading a file as soon as it passes its own limit; `PUT
    /// /api/blobs` buffers the whole body before checking.
    pub fn max_body_size(&self) -> usize {
        let total = self
            .limits
            .max_video_size
            .saturating_add(self.limits.max_thumbnail_size)
            .saturating_add(1024 * 1024);
        usize::try_from(total).unwrap_or(usize::MAX)
    }
}

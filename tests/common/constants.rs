//! Shared constants for end-to-end tests

/// Maximum time to wait for a spawned server to answer `GET /api/entries`.
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout of every test request.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay between readiness polls.
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Payloads used as stand-in media.
pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42not a real video";
pub const THUMBNAIL_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIFnot a real image";

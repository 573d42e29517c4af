use byte_unit::{Byte, Unit};

/// 1 GiB.
pub const MAX_VIDEO_SIZE: u64 = 1_073_741_824;
pub const MAX_THUMBNAIL_SIZE: u64 = 1_073_741_824;

/// Upper bounds for media attached to an entry, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    pub max_video_size: u64,
    pub max_thumbnail_size: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_video_size: MAX_VIDEO_SIZE,
            max_thumbnail_size: MAX_THUMBNAIL_SIZE,
        }
    }
}

/// Size in MiB with two decimals, the way the form displays it ("12.34").
pub fn format_file_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_adjusted_unit(Unit::MiB);
    format!("{:.2}", adjusted.get_value())
}

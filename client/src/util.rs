//! Shared utility functions

/// Format file size in human-readable units
///
/// # Examples
///
/// ```
/// use natter_client::util::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 bytes");
/// assert_eq!(format_file_size(2048), "2KB");
/// assert_eq!(format_file_size(5 * 1024 * 1024), "5.0MB");
/// ```
pub fn format_file_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Trim a trailing slash from a base URL.
pub(crate) fn base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

// Formatting helpers shared by the panels, the info pane and the preview

use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::fs_ops::EntryKind;

// ============================================================================
// Constants
// ============================================================================

/// Event loop polling interval in milliseconds
pub const EVENT_POLL_MS: u64 = 50;

// ============================================================================
// Byte Formatting
// ============================================================================

/// Format bytes with long suffixes (e.g., "1.5GB", "250KB")
/// Used in the info pane and previews
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_impl(bytes, true)
}

/// Format bytes with short suffixes (e.g., "1.5G", "250K")
/// Used in list columns where space is limited
pub fn format_size(bytes: u64) -> String {
    format_bytes_impl(bytes, false)
}

fn format_bytes_impl(bytes: u64, long_suffix: bool) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    let (value, suffix) = if bytes >= TB {
        (bytes as f64 / TB as f64, if long_suffix { "TB" } else { "T" })
    } else if bytes >= GB {
        (bytes as f64 / GB as f64, if long_suffix { "GB" } else { "G" })
    } else if bytes >= MB {
        (bytes as f64 / MB as f64, if long_suffix { "MB" } else { "M" })
    } else if bytes >= KB {
        (bytes as f64 / KB as f64, if long_suffix { "KB" } else { "K" })
    } else {
        return if long_suffix {
            format!("{}B", bytes)
        } else {
            format!("{}", bytes)
        };
    };

    format!("{:.1}{}", value, suffix)
}

// ============================================================================
// Entry metadata
// ============================================================================

/// `ls -l` style permission string, e.g. "drwxr-xr-x"
pub fn format_mode(mode: u32, kind: EntryKind) -> String {
    let type_char = match kind {
        EntryKind::Directory => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::Special => 's',
        EntryKind::File => '-',
    };

    let mut out = String::with_capacity(10);
    out.push(type_char);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Local modification time, or "-" when unknown
pub fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => {
            let local: DateTime<Local> = time.into();
            local.format("%Y-%m-%d %H:%M").to_string()
        }
        None => "-".to_owned(),
    }
}

/// Cut `text` to `width` chars, ending in an ellipsis when shortened
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1536), "1.5KB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.0GB");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(16008609792), "14.9G");
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(format_mode(0o755, EntryKind::Directory), "drwxr-xr-x");
        assert_eq!(format_mode(0o640, EntryKind::File), "-rw-r-----");
        assert_eq!(format_mode(0o777, EntryKind::Symlink), "lrwxrwxrwx");
    }

    #[test]
    fn test_format_time_unknown() {
        assert_eq!(format_time(None), "-");
        assert_eq!(format_time(Some(SystemTime::now())).len(), 16);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-long-name", 6), "a-lon…");
        assert_eq!(truncate("x", 0), "");
    }
}

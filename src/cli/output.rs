//! CLI output formatting

use crate::core::ErrorKind;
use crate::persistence::CacheEntryInfo;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// One line per cache entry
pub fn format_entry(entry: &CacheEntryInfo) -> String {
    let modified = entry
        .modified
        .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "{} {} - {} - {}",
        CHECK,
        style(&entry.group).bold(),
        style(format_bytes(entry.size_bytes)).cyan(),
        style(modified).dim()
    )
}

/// Error category label
pub fn format_error_kind(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Configuration => style("CONFIGURATION").yellow().to_string(),
        ErrorKind::Build => style("BUILD").red().to_string(),
        ErrorKind::Storage => style("STORAGE").magenta().to_string(),
        ErrorKind::Merge => style("MERGE").red().to_string(),
    }
}

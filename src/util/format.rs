use crate::consts::BLOCK_SIZE;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Human readable byte count for log lines, binary units with two decimals.
pub fn pretty_size_from_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

pub fn pretty_blocks(count: u64) -> String {
    format!("{} blocks ({})", count, pretty_size_from_bytes(count * BLOCK_SIZE as u64))
}

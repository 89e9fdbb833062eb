use chrono::{DateTime, Utc};
use serde::Serialize;

/// Human-readable size with binary prefixes: `512 B`, `1.5 KiB`, `3.0 MiB`.
pub fn format_bytes(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{size} B");
    }
    let mut denominator = UNIT;
    let mut power = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        denominator *= UNIT;
        power += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][power];
    format!("{:.1} {prefix}iB", size as f64 / denominator as f64)
}

pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

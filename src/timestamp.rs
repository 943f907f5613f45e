/// Formats a duration in seconds as `HH:MM:SS.mmm`.
///
/// Hours widen past two digits instead of wrapping.
pub fn time_str(sec: f64) -> String {
    // Truncate, never round up into the next second.
    let total_ms = (sec.max(0.0) * 1000.0) as u64;

    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[test]
fn time_str_fields() {
    assert_eq!(time_str(0.0), "00:00:00.000");
    assert_eq!(time_str(0.9926), "00:00:00.992");
    assert_eq!(time_str(3723.5), "01:02:03.500");
    assert_eq!(time_str(360_000.0), "100:00:00.000");
    assert_eq!(time_str(-1.0), "00:00:00.000");
}

//! # Utility Functions Module
//!
//! Small helpers shared by the probe and the facade.

/// Converts any iterable of string-like items into owned `String`s.
///
/// Used to build external tool argument lists where literals and formatted
/// values are mixed:
///
/// ```rust
/// use media_picker::utils::to_string_vec;
///
/// let seek = 1.5;
/// let args = to_string_vec(["-ss", &seek.to_string(), "-frames:v", "1"]);
/// assert_eq!(args, vec!["-ss", "1.5", "-frames:v", "1"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Formats a duration in seconds as `m:ss`, or `h:mm:ss` from one hour up.
///
/// Fractions are rounded to the nearest second; negative and non-finite
/// inputs format as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let frames = 1;
        let result = to_string_vec(["-frames:v", &frames.to_string(), "-an"]);
        assert_eq!(result, vec!["-frames:v".to_string(), "1".to_string(), "-an".to_string()]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.0), "0:05");
        assert_eq!(format_duration(59.6), "1:00");
        assert_eq!(format_duration(125.0), "2:05");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_duration_invalid_input() {
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }
}

use std::path::{Path, PathBuf};

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
                _ => '_',
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Truncate to at most `limit` characters without splitting a code point
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Resolve a path against the current directory if it is relative
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Check if the current environment has the external tools the process-backed
/// pipeline shells out to
pub async fn check_dependencies(yt_dlp_path: &str, fabric_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!("{} - required for playlist listing", yt_dlp_path));
    }

    if !check_command_available(fabric_path).await {
        missing.push(format!("{} - required for transcript extraction", fabric_path));
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("k3KqQvywToE"), "k3KqQvywToE");
        assert_eq!(sanitize_filename("a/b?c"), "a_b_c");
        assert_eq!(sanitize_filename("../etc"), ".._etc");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("नमस्ते दुनिया", 2), "नम");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_absolute_path() {
        let abs = absolute_path(Path::new("out/01.txt")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("out/01.txt"));
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        assert!(!check_command_available("definitely-not-installed-anywhere").await);
        let missing = check_dependencies("definitely-not-yt-dlp", "definitely-not-fabric").await;
        assert_eq!(missing.len(), 2);
    }
}

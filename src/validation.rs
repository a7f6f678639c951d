//! Input validation for task text, identifiers and stored JSON

/// Task title validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TitleError {
    #[error("Title cannot be empty")]
    Empty,

    #[error("Title is too long (maximum {max} characters)")]
    TooLong { max: usize },
}

#[derive(Debug, PartialEq, Eq)]
pub enum SecurityError {
    /// The task ID is not a valid UUID format
    InvalidTaskId { reason: String },

    /// File size exceeds maximum allowed
    FileSizeExceeded { limit: usize },

    /// JSON format is invalid or malformed
    InvalidFormat,
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::InvalidTaskId { reason } => write!(f, "Invalid task ID: {}", reason),
            SecurityError::FileSizeExceeded { limit } => write!(f, "File size exceeds limit ({} bytes)", limit),
            SecurityError::InvalidFormat => write!(f, "Invalid format"),
        }
    }
}

impl std::error::Error for SecurityError {}

/// Trim a title, drop control characters, and enforce `1..=max_chars` characters.
pub fn sanitize_title(raw: &str, max_chars: usize) -> Result<String, TitleError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return Err(TitleError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(TitleError::TooLong { max: max_chars });
    }

    Ok(trimmed.to_string())
}

/// Remove control characters (keeping newlines and tabs) and cut at `max_chars`.
pub fn sanitize_description(raw: &str, max_chars: usize) -> String {
    raw.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .take(max_chars)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate task ID (must be valid UUID format)
pub fn validate_task_id(id: &str) -> Result<String, SecurityError> {
    let trimmed = id.trim();

    if uuid::Uuid::parse_str(trimmed).is_err() {
        return Err(SecurityError::InvalidTaskId {
            reason: "Task ID must be a valid UUID".to_string(),
        });
    }

    Ok(trimmed.to_string())
}

/// Validate file size before reading
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), SecurityError> {
    if size > max_size {
        return Err(SecurityError::FileSizeExceeded {
            limit: max_size as usize,
        });
    }
    Ok(())
}

/// Securely parse JSON with size limits and error handling
pub fn secure_json_parse<T>(content: &str, max_bytes: usize) -> Result<T, SecurityError>
where
    T: serde::de::DeserializeOwned,
{
    if content.len() > max_bytes {
        return Err(SecurityError::FileSizeExceeded { limit: max_bytes });
    }

    // Interrupted writes have been seen to leave leading NULs; valid JSON never starts with one.
    let normalized = content.trim_start_matches('\0');

    serde_json::from_str(normalized).map_err(|_| SecurityError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_sanitization() {
        assert_eq!(sanitize_title("  Fix the pump  ", 80).unwrap(), "Fix the pump");
        assert_eq!(sanitize_title("Buy\x00 filters", 80).unwrap(), "Buy filters");
        assert_eq!(sanitize_title("Зарядить фонарь", 80).unwrap(), "Зарядить фонарь");

        assert_eq!(sanitize_title("   ", 80), Err(TitleError::Empty));
        assert_eq!(sanitize_title("\n\t", 80), Err(TitleError::Empty));
        assert_eq!(sanitize_title(&"a".repeat(81), 80), Err(TitleError::TooLong { max: 80 }));
    }

    #[test]
    fn test_description_sanitization() {
        let with_whitespace = "Line 1\nLine 2\tTabbed";
        assert_eq!(sanitize_description(with_whitespace, 100), with_whitespace);
        assert_eq!(sanitize_description("Hello\x01\x02World", 100), "HelloWorld");
        assert_eq!(sanitize_description("ééééé", 3), "ééé");
    }

    #[test]
    fn test_task_id_validation() {
        let valid_uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(validate_task_id(valid_uuid).is_ok());
        assert!(validate_task_id("../secret").is_err());
        assert!(validate_task_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_secure_json_parse() {
        let parsed: Vec<u32> = secure_json_parse("\0\0[1,2,3]", 64).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
        assert_eq!(
            secure_json_parse::<Vec<u32>>("[1,2,3]", 3),
            Err(SecurityError::FileSizeExceeded { limit: 3 })
        );
        assert_eq!(
            secure_json_parse::<Vec<u32>>("{oops", 64),
            Err(SecurityError::InvalidFormat)
        );
    }

    #[test]
    fn test_file_size_limit() {
        assert!(validate_file_size(10, 10).is_ok());
        assert!(validate_file_size(11, 10).is_err());
    }
}

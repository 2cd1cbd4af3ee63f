use super::ApiError;
use crate::services::Rotation;

pub fn validate_filename(filename: Option<&str>, missing: &str) -> Result<String, ApiError> {
    let filename = filename.map(str::trim).unwrap_or_default();
    if filename.is_empty() {
        return Err(ApiError::validation(missing));
    }
    Ok(filename.to_string())
}

pub fn validate_rotation(degrees: f64) -> Result<Rotation, ApiError> {
    Rotation::from_degrees(degrees)
        .ok_or_else(|| ApiError::validation("Degrees must be a finite number"))
}

/// Accepts a post-login destination only when it is a same-origin relative
/// path. Anything carrying a scheme or host is refused.
#[must_use]
pub fn safe_redirect_target(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();

    if !next.starts_with('/')
        || next.starts_with("//")
        || next.contains('\\')
        || next.chars().any(char::is_control)
    {
        return None;
    }

    if url::Url::parse(next).is_ok() {
        return None;
    }

    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert_eq!(
            validate_filename(Some(" a.jpg "), "No filename provided").unwrap(),
            "a.jpg"
        );
        assert!(validate_filename(Some(""), "No filename provided").is_err());
        assert!(validate_filename(None, "No filename provided").is_err());
    }

    #[test]
    fn test_validate_rotation() {
        assert_eq!(validate_rotation(90.0).unwrap(), Rotation::Clockwise90);
        assert_eq!(validate_rotation(30.0).unwrap(), Rotation::Arbitrary(30.0));
        assert!(validate_rotation(f64::NAN).is_err());
    }

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/admin")), Some("/admin"));
        assert_eq!(
            safe_redirect_target(Some("/admin?tab=images")),
            Some("/admin?tab=images")
        );
        assert_eq!(safe_redirect_target(None), None);
        assert_eq!(safe_redirect_target(Some("")), None);
        assert_eq!(safe_redirect_target(Some("admin")), None);
        assert_eq!(safe_redirect_target(Some("https://evil.example/")), None);
        assert_eq!(safe_redirect_target(Some("//evil.example/x")), None);
        assert_eq!(safe_redirect_target(Some("/\\evil.example")), None);
        assert_eq!(safe_redirect_target(Some("javascript:alert(1)")), None);
    }
}

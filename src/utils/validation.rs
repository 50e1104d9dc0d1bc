use crate::utils::error::{ArcadeError, Result};
use std::collections::HashSet;
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ArcadeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ArcadeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 模型檔必須存在，否則連相機都不用打開
pub fn validate_model_file(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    if !Path::new(path).is_file() {
        return Err(ArcadeError::ModelNotFound {
            path: path.to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ArcadeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ArcadeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ArcadeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 兩個手勢不能綁同一個動作，否則 jump/duck 會互相覆蓋
pub fn validate_distinct_labels(field_name: &str, labels: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        validate_non_empty_string(field_name, label)?;
        if !seen.insert(label.to_lowercase()) {
            return Err(ArcadeError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: label.to_string(),
                reason: "Each gesture label can only be bound once".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("display.device", "/dev/fb0").is_ok());
        assert!(validate_path("display.device", "").is_err());
        assert!(validate_path("display.device", "/dev/\0fb0").is_err());
    }

    #[test]
    fn test_validate_model_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(validate_model_file("model.path", file.path().to_str().unwrap()).is_ok());

        let err = validate_model_file("model.path", "/definitely/not/here.eim").unwrap_err();
        assert!(matches!(err, ArcadeError::ModelNotFound { .. }));
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("dino.fps", 60, 1).is_ok());
        assert!(validate_positive_number("dino.fps", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("dino.confidence_threshold", 0.6, 0.0, 1.0).is_ok());
        assert!(validate_range("dino.confidence_threshold", 1.5, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_distinct_labels() {
        assert!(validate_distinct_labels("dino", &["peace", "good"]).is_ok());
        assert!(validate_distinct_labels("dino", &["peace", "Peace"]).is_err());
        assert!(validate_distinct_labels("dino", &["peace", " "]).is_err());
    }
}

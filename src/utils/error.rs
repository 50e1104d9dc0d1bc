use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArcadeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Score log error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Font error: {0}")]
    FontError(#[from] ab_glyph::InvalidFont),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    #[error("Model runner error: {message}")]
    ModelError { message: String },

    #[error("Runner protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Camera error: {message}")]
    CameraError { message: String },

    #[error("Display error: {message}")]
    DisplayError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Model,
    Hardware,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ArcadeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ArcadeError::ConfigError { .. }
            | ArcadeError::ConfigValidationError { .. }
            | ArcadeError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ArcadeError::ModelNotFound { .. }
            | ArcadeError::ModelError { .. }
            | ArcadeError::ProtocolError { .. } => ErrorCategory::Model,
            ArcadeError::CameraError { .. } | ArcadeError::DisplayError { .. } => {
                ErrorCategory::Hardware
            }
            ArcadeError::SerializationError(_)
            | ArcadeError::ImageError(_)
            | ArcadeError::CsvError(_)
            | ArcadeError::FontError(_) => ErrorCategory::Data,
            ArcadeError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 分數紀錄失敗不影響遊戲本身
            ArcadeError::CsvError(_) | ArcadeError::FontError(_) => ErrorSeverity::Low,
            ArcadeError::ProtocolError { .. } | ArcadeError::CameraError { .. } => {
                ErrorSeverity::Medium
            }
            ArcadeError::ConfigError { .. }
            | ArcadeError::ConfigValidationError { .. }
            | ArcadeError::InvalidConfigValueError { .. }
            | ArcadeError::ModelNotFound { .. }
            | ArcadeError::ModelError { .. }
            | ArcadeError::SerializationError(_)
            | ArcadeError::ImageError(_) => ErrorSeverity::High,
            ArcadeError::IoError(_) | ArcadeError::DisplayError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ArcadeError::ModelNotFound { path } => format!(
                "Export the model as a Linux .eim from the studio and copy it to {} (chmod +x)",
                path
            ),
            ArcadeError::ModelError { .. } => {
                "Check that the .eim was built for this board's architecture".to_string()
            }
            ArcadeError::ProtocolError { .. } => {
                "The model process stopped responding; restart the game".to_string()
            }
            ArcadeError::CameraError { .. } => {
                "Check the camera cable, the /dev/video index and that ffmpeg is installed"
                    .to_string()
            }
            ArcadeError::DisplayError { .. } => {
                "Check the framebuffer device or run with --headless".to_string()
            }
            ArcadeError::FontError(_) => "Point --font at a valid TTF/OTF file".to_string(),
            ArcadeError::CsvError(_) => "Delete or fix the score log file".to_string(),
            ArcadeError::ConfigError { .. }
            | ArcadeError::ConfigValidationError { .. }
            | ArcadeError::InvalidConfigValueError { .. } => {
                "Review the command line flags and the TOML configuration".to_string()
            }
            ArcadeError::SerializationError(_) | ArcadeError::ImageError(_) => {
                "Check the input file format".to_string()
            }
            ArcadeError::IoError(_) => "Check file permissions and free disk space".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Model => format!("Gesture model problem: {}", self),
            ErrorCategory::Hardware => format!("Hardware problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArcadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_is_high_severity_model_error() {
        let e = ArcadeError::ModelNotFound {
            path: "/home/pi/gestures.eim".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Model);
        assert_eq!(e.severity(), ErrorSeverity::High);
        assert_eq!(e.exit_code(), 1);
        assert!(e.recovery_suggestion().contains("/home/pi/gestures.eim"));
    }

    #[test]
    fn test_display_error_is_critical() {
        let e = ArcadeError::DisplayError {
            message: "fb0 gone".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Hardware);
        assert_eq!(e.exit_code(), 3);
        assert!(e.user_friendly_message().starts_with("Hardware problem"));
    }
}

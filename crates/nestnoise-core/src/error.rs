use thiserror::Error;

/// Top-level error type for nestnoise.
#[derive(Debug, Error)]
pub enum NoiseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration errors, raised at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("stddev must be finite, got {0}")]
    NonFiniteStdDev(f32),

    #[error("Module name must not be empty")]
    EmptyName,
}

/// Errors raised while reading or transforming a nested tensor.
///
/// `Clone + PartialEq` so tests and callers can match on exact values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Leaf at '{path}' is not a numeric array (found {found})")]
    NonNumericLeaf { path: String, found: &'static str },

    #[error("Ragged array at '{path}': nested lengths disagree")]
    RaggedArray { path: String },

    #[error("Shape mismatch: shape implies {expected} elements, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Leaf count mismatch: structure has {expected} leaves, got {got}")]
    LeafCountMismatch { expected: usize, got: usize },

    #[error("Structure mismatch at '{path}': {reason}")]
    StructureMismatch { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_error_from_config_error() {
        let err: NoiseError = ConfigError::NonFiniteStdDev(f32::NAN).into();
        assert!(matches!(err, NoiseError::Config(_)));
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn noise_error_from_input_error() {
        let err: NoiseError = InputError::RaggedArray { path: "a/0".into() }.into();
        assert!(matches!(err, NoiseError::Input(_)));
        assert!(err.to_string().contains("a/0"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn input_error_display_messages() {
        assert_eq!(
            InputError::NonNumericLeaf {
                path: "b".into(),
                found: "string"
            }
            .to_string(),
            "Leaf at 'b' is not a numeric array (found string)"
        );
        assert_eq!(
            InputError::ShapeMismatch {
                expected: 6,
                got: 4
            }
            .to_string(),
            "Shape mismatch: shape implies 6 elements, got 4"
        );
        assert_eq!(
            InputError::LeafCountMismatch {
                expected: 2,
                got: 3
            }
            .to_string(),
            "Leaf count mismatch: structure has 2 leaves, got 3"
        );
        assert_eq!(
            InputError::StructureMismatch {
                path: "a".into(),
                reason: "expected map, got sequence".into()
            }
            .to_string(),
            "Structure mismatch at 'a': expected map, got sequence"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::NonFiniteStdDev(f32::INFINITY).to_string(),
            "stddev must be finite, got inf"
        );
        assert_eq!(
            ConfigError::EmptyName.to_string(),
            "Module name must not be empty"
        );
    }
}

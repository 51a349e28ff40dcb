//! Kernel configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tgc_kernel_math::Tolerance;
use tgc_kernel_tessellate::TessTolerance;
use thiserror::Error;

/// Errors that can occur while loading a [`KernelConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid TOML or has mistyped fields.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A tolerance that must be positive is not.
    #[error("Invalid tolerance: {field} must be positive and finite, got {value}")]
    InvalidTolerance {
        /// Offending field.
        field: &'static str,
        /// Value found.
        value: f64,
    },
}

/// Everything the kernel can be tuned with.
///
/// ```toml
/// [tolerance]
/// linear = 1e-6
/// root_imag = 1e-4
///
/// [tessellation]
/// rel = 0.005
/// ```
///
/// Missing tables and fields take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Prep and shot tolerances.
    pub tolerance: Tolerance,
    /// Mesh tolerances.
    pub tessellation: TessTolerance,
}

impl KernelConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tol = &self.tolerance;
        for (field, value) in [
            ("tolerance.linear", tol.linear),
            ("tolerance.perp", tol.perp),
            ("tolerance.eccentricity", tol.eccentricity),
            ("tolerance.root_imag", tol.root_imag),
            ("tolerance.coef", tol.coef),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidTolerance { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = KernelConfig::from_toml_str("").unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.tolerance, Tolerance::DEFAULT);
    }

    #[test]
    fn test_partial_tables() {
        let config = KernelConfig::from_toml_str(
            r#"
            [tolerance]
            root_imag = 1e-6

            [tessellation]
            norm = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(config.tolerance.root_imag, 1e-6);
        assert_eq!(config.tolerance.linear, Tolerance::DEFAULT.linear);
        assert_eq!(config.tessellation.norm, 0.1);
        assert_eq!(config.tessellation.rel, TessTolerance::default().rel);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = KernelConfig::from_toml_str("[tolerance]\nlinear = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTolerance {
                field: "tolerance.linear",
                ..
            }
        ));

        let err = KernelConfig::from_toml_str("[tolerance]\nlinear = \"tiny\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = KernelConfig::from_path("/nonexistent/tgc-kernel.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

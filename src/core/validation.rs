//! Input validation.
//!
//! Validates secret keys, environment names, user metadata, and root tokens.

use crate::error::{Result, ValidationError};

/// Validate a secret key name.
///
/// Secret keys must be valid environment variable names:
/// - Only A-Z, a-z, 0-9, and underscore
/// - Cannot start with a digit
/// - Cannot be empty
///
/// # Errors
///
/// Returns `ValidationError` if the key is invalid.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }

    if let Some(first_char) = key.chars().next() {
        if first_char.is_ascii_digit() {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: "cannot start with a digit".to_string(),
            }
            .into());
        }
    }

    for (i, ch) in key.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "invalid character '{}' at position {}. Only letters, digits, and underscore are allowed",
                    ch,
                    i + 1
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Whether `key` is a valid secret key, without building an error.
pub fn is_valid_key(key: &str) -> bool {
    validate_key(key).is_ok()
}

/// Validate an environment name.
///
/// Environment names become file names and remote path segments, so they are
/// restricted to letters, digits, `-` and `_`.
pub fn validate_env_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ValidationError::InvalidField {
            field: "environment",
            reason: format!("'{}' must be letters, digits, '-' or '_'", name),
        }
        .into());
    }
    Ok(())
}

/// Validate a required free-text field.
pub fn validate_not_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Validate an e-mail address of the shape `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || ValidationError::InvalidField {
        field: "email",
        reason: format!("'{}' is not an e-mail address", email),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid().into());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid().into()),
    }
}

/// Validate the format of a privileged root token.
pub fn validate_root_token(token: &str) -> Result<()> {
    if token.is_empty() || !token.contains("hvs") {
        return Err(ValidationError::InvalidRootToken.into());
    }
    Ok(())
}

/// Validate file permissions (Unix only).
///
/// # Errors
///
/// Returns `ValidationError` if permissions don't match.
#[cfg(unix)]
pub fn validate_file_permissions(path: &std::path::Path, expected_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let actual_mode = metadata.permissions().mode() & 0o777;

    if actual_mode != expected_mode {
        return Err(ValidationError::InvalidPermissions {
            path: path.display().to_string(),
            expected: format!("{:o}", expected_mode),
            actual: format!("{:o}", actual_mode),
        }
        .into());
    }

    Ok(())
}

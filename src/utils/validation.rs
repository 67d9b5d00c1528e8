use crate::utils::error::{DockError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DockError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DockError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(DockError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension) => {}
            Some(extension) => {
                return Err(DockError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(DockError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DockError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 旗標名稱會以 `-{name}` 形式傳給外部程式，不能含空白或前導 `-`
pub fn validate_flag_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;

    if name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(DockError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Flag names are written without a leading '-' and cannot contain whitespace"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("split.input", "ligands.sd").is_ok());
        assert!(validate_path("split.input", "").is_err());
        assert!(validate_path("split.input", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("dock.worker_count", 2, 1).is_ok());
        assert!(validate_positive_number("dock.worker_count", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["ligands.sd".to_string(), "library.sdf".to_string()];
        assert!(validate_file_extensions("split.input", &files, &["sd", "sdf"]).is_ok());

        let invalid_files = vec!["ligands.mol2".to_string()];
        assert!(validate_file_extensions("split.input", &invalid_files, &["sd", "sdf"]).is_err());
    }

    #[test]
    fn test_validate_flag_name() {
        assert!(validate_flag_name("dock.flags", "n").is_ok());
        assert!(validate_flag_name("dock.flags", "allH").is_ok());
        assert!(validate_flag_name("dock.flags", "-n").is_err());
        assert!(validate_flag_name("dock.flags", "n 50").is_err());
        assert!(validate_flag_name("dock.flags", " ").is_err());
    }
}

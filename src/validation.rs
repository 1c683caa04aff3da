//! Character name validation

/// Longest accepted character name, counted in characters after trimming.
pub const MAX_NAME_CHARS: usize = 32;

/// Character name validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Character name cannot be empty")]
    Empty,

    #[error("Character name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Character name contains control characters: {chars}")]
    ControlCharacters { chars: String },
}

/// Validate a character name and return the trimmed form that should be stored.
///
/// Surrounding whitespace is dropped rather than rejected; a name that is
/// nothing but whitespace counts as empty.
pub fn validate_character_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }

    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(NameError::TooLong {
            max: MAX_NAME_CHARS,
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        let chars = trimmed
            .chars()
            .filter(|c| c.is_control())
            .map(|c| format!("\\u{{{:04x}}}", c as u32))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(NameError::ControlCharacters { chars });
    }

    Ok(trimmed.to_string())
}

/// Why an uploaded file's name was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// The extension does not map to the expected kind of media.
    WrongMediaType { expected: MediaKind },
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::WrongMediaType {
                expected: MediaKind::Video,
            } => "File must be a video",
            Self::WrongMediaType {
                expected: MediaKind::Image,
            } => "File must be an image",
        }
    }
}

/// Top-level MIME family accepted for an upload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Validates an uploaded media filename and returns its guessed MIME type.
///
/// Files whose extension is unknown are accepted as
/// `application/octet-stream`; files whose extension maps to another media
/// family (e.g. a `.png` offered as the video) are rejected.
pub fn validate_media_filename(filename: &str, kind: MediaKind) -> Result<String, FilenameError> {
    let name = validate_flat_filename(filename)?;
    match mime_guess::from_path(name).first() {
        Some(mime) if mime.type_() == kind.mime_type() => Ok(mime.essence_str().to_string()),
        Some(_) => Err(FilenameError::WrongMediaType { expected: kind }),
        None => Ok("application/octet-stream".to_string()),
    }
}

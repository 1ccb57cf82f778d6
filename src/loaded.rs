//! Tagged outcome for best-effort loaders.
//!
//! Config files and metadata sidecars are optional and may be malformed. None
//! of that is fatal, but callers (and tests) still need to know which branch
//! fired, so loaders return a [`Loaded`] instead of silently substituting
//! defaults.

/// Result of loading an optional input that always yields a usable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// The input existed and parsed.
    Found(T),
    /// The input was absent (or not a regular file); defaults apply.
    Default(T),
    /// The input existed but could not be parsed; defaults apply.
    Invalid { value: T, reason: String },
}

impl<T> Loaded<T> {
    pub fn value(&self) -> &T {
        match self {
            Loaded::Found(v) | Loaded::Default(v) => v,
            Loaded::Invalid { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Loaded::Found(v) | Loaded::Default(v) => v,
            Loaded::Invalid { value, .. } => value,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Loaded::Found(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Loaded::Invalid { .. })
    }

    /// The parse failure message, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Loaded::Invalid { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

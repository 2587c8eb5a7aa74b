use core::fmt;

/// Error returned when a serialized document cannot be delivered to its sink.
///
/// Reading never produces one: malformed input degrades to default values.
#[derive(Debug)]
#[non_exhaustive]
pub enum SerialError {
    /// The output stream rejected a write or flush.
    Io(std::io::Error),
    /// `serde_json` failed to render the finished document.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
    /// `serde_yaml` failed to render the finished document.
    #[cfg(feature = "yaml")]
    Yaml(serde_yaml::Error),
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to write serialized output: {err}"),
            #[cfg(feature = "json")]
            Self::Json(err) => write!(f, "failed to render JSON document: {err}"),
            #[cfg(feature = "yaml")]
            Self::Yaml(err) => write!(f, "failed to render YAML document: {err}"),
        }
    }
}

impl core::error::Error for SerialError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            #[cfg(feature = "json")]
            Self::Json(err) => Some(err),
            #[cfg(feature = "yaml")]
            Self::Yaml(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SerialError {
    #[inline]
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for SerialError {
    #[inline]
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for SerialError {
    #[inline]
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

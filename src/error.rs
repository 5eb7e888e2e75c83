/// Error types that can occur during pooling operations
///
/// # Variants
///
/// - `ConfigurationError` - Indicates an invalid kernel/stride/pad combination, or a kernel larger than the padded input
/// - `ShapeMismatchError` - Indicates tensor extents inconsistent with the configuration or with a prior paired call
/// - `UnpairedBackwardError` - Indicates that backward was invoked without the index map of a matching forward
#[derive(Debug, Clone, PartialEq)]
pub enum PoolingError {
    ConfigurationError(String),
    ShapeMismatchError(String),
    UnpairedBackwardError(String),
}

impl std::fmt::Display for PoolingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolingError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            PoolingError::ShapeMismatchError(msg) => write!(f, "Shape mismatch error: {}", msg),
            PoolingError::UnpairedBackwardError(msg) => {
                write!(f, "Unpaired backward error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PoolingError {}

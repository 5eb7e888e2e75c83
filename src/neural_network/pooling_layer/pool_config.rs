use super::input_validation_function::{
    validate_kernel_size_2d, validate_padding_2d, validate_strides_2d,
};
use super::pool_method::{AverageDivisor, PoolMethod};
use crate::error::PoolingError;
use serde::{Deserialize, Serialize};

/// Configuration of a 2D pooling operator.
///
/// The record is immutable once built. Kernel, strides and padding are given as
/// `(height, width)` pairs. When `global_pooling` is set, the kernel is replaced by the input's
/// spatial extent at resolution time, with zero padding and unit stride, so that every window
/// covers the whole map.
///
/// # Fields
///
/// - `kernel_size` - Size of the pooling window as (height, width)
/// - `strides` - Step size of the window as (vertical stride, horizontal stride)
/// - `padding` - Implicit padding added to both sides of each axis as (height, width)
/// - `method` - Reduction applied to each window
/// - `global_pooling` - Whether the window covers the whole input
/// - `average_divisor` - Divisor policy used by average pooling
///
/// # Example
/// ```rust
/// use rustypool::neural_network::{PoolConfig, PoolMethod};
///
/// let config = PoolConfig::new(PoolMethod::Max, (3, 3), Some((2, 2)), Some((1, 1))).unwrap();
/// assert_eq!(config.kernel_size(), (3, 3));
/// assert_eq!(config.strides(), (2, 2));
///
/// // Padding has to stay smaller than the kernel
/// assert!(PoolConfig::new(PoolMethod::Max, (2, 2), None, Some((2, 0))).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    kernel_size: (usize, usize),
    strides: (usize, usize),
    padding: (usize, usize),
    method: PoolMethod,
    global_pooling: bool,
    #[serde(default)]
    average_divisor: AverageDivisor,
}

impl PoolConfig {
    /// Creates a new pooling configuration.
    ///
    /// If `strides` is None, it defaults to `kernel_size`. If `padding` is None, it defaults to `(0, 0)`.
    ///
    /// # Parameters
    ///
    /// - `method` - Reduction applied to each window
    /// - `kernel_size` - Size of the pooling window as (height, width)
    /// - `strides` - Optional strides as (vertical stride, horizontal stride)
    /// - `padding` - Optional padding as (height, width)
    ///
    /// # Returns
    ///
    /// - `Result<PoolConfig, PoolingError>` - The validated configuration
    ///
    /// # Errors
    ///
    /// - `PoolingError::ConfigurationError` - If a kernel or stride dimension is zero, if padding is
    ///   not smaller than the kernel, or if stochastic pooling is combined with padding
    pub fn new(
        method: PoolMethod,
        kernel_size: (usize, usize),
        strides: Option<(usize, usize)>,
        padding: Option<(usize, usize)>,
    ) -> Result<Self, PoolingError> {
        let config = PoolConfig {
            kernel_size,
            strides: strides.unwrap_or(kernel_size),
            padding: padding.unwrap_or((0, 0)),
            method,
            global_pooling: false,
            average_divisor: AverageDivisor::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a global pooling configuration.
    ///
    /// The kernel size stored here is a placeholder; the effective kernel is the input's
    /// spatial extent, resolved by [`PoolGeometry`](super::shape_resolver::PoolGeometry).
    pub fn global(method: PoolMethod) -> Self {
        PoolConfig {
            kernel_size: (1, 1),
            strides: (1, 1),
            padding: (0, 0),
            method,
            global_pooling: true,
            average_divisor: AverageDivisor::default(),
        }
    }

    /// Returns a copy of this configuration using the given averaging divisor.
    pub fn with_average_divisor(mut self, average_divisor: AverageDivisor) -> Self {
        self.average_divisor = average_divisor;
        self
    }

    /// Checks the invariants every configuration must satisfy.
    ///
    /// Called at every operator boundary, so records that were deserialized rather than
    /// constructed are checked as well.
    ///
    /// # Errors
    ///
    /// - `PoolingError::ConfigurationError` - If any invariant is violated
    pub fn validate(&self) -> Result<(), PoolingError> {
        if self.global_pooling {
            if self.padding != (0, 0) || self.strides != (1, 1) {
                return Err(PoolingError::ConfigurationError(format!(
                    "Global pooling requires padding (0, 0) and strides (1, 1), got padding {:?} and strides {:?}",
                    self.padding, self.strides
                )));
            }
            return Ok(());
        }

        validate_kernel_size_2d(self.kernel_size)?;
        validate_strides_2d(self.strides)?;
        validate_padding_2d(self.padding, self.kernel_size)?;

        if self.method == PoolMethod::Stochastic && self.padding != (0, 0) {
            return Err(PoolingError::ConfigurationError(
                "Padding is only supported for max and average pooling".to_string(),
            ));
        }

        Ok(())
    }

    get_field!(kernel_size, kernel_size, (usize, usize));
    get_field!(strides, strides, (usize, usize));
    get_field!(padding, padding, (usize, usize));
    get_field!(method, method, PoolMethod);
    get_field!(global_pooling, global_pooling, bool);
    get_field!(average_divisor, average_divisor, AverageDivisor);
}

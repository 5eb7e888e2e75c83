/// Error type shared by every pooling operation
pub mod error;

pub use error::PoolingError;

/// A macro that generates a getter method for any field.
///
/// This macro creates a public getter method that returns the value of the specified field.
/// The generated method includes appropriate documentation describing the field being accessed.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., kernel_height)
/// - `$field_name` - The name of the field to access (e.g., kernel_height)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// Components for spatial pooling over batched, channeled 2D feature maps.
///
/// This module provides the window geometry derivation, the three reduction policies
/// (max, average, stochastic), and the gradient distribution rule for each of them.
///
/// # Core Components
///
/// - **PoolConfig**: Kernel, stride and padding sizes, pooling method and the global pooling flag
/// - **PoolGeometry**: Output extents and clipped input windows for a given input size
/// - **pool_forward / pool_backward**: The stateless operator entry points
/// - **WindowIndexMap**: The value that couples a forward call to its backward call
/// - **Pooling2D**: A stateful layer wrapping the operator for use inside a training loop
///
/// # Examples
/// ```rust
/// use rustypool::neural_network::*;
/// use ndarray::Array4;
///
/// // [batch_size, channels, height, width]
/// let x = Array4::from_shape_fn((1, 1, 4, 4), |(_, _, i, j)| (i * 4 + j) as f32).into_dyn();
///
/// let config = PoolConfig::new(PoolMethod::Max, (2, 2), None, None).unwrap();
/// let mut rng = rand::rng();
/// let (output, index_map) = pool_forward(&x, &config, PoolMode::Training, &mut rng).unwrap();
/// assert_eq!(output.shape(), &[1, 1, 2, 2]);
///
/// let grad_output = Tensor::ones(output.raw_dim());
/// let grad_input = pool_backward(&grad_output, &index_map, x.shape(), &config).unwrap();
/// assert_eq!(grad_input.sum(), 4.0);
/// ```
pub mod neural_network;

/// A convenience module that re-exports the most commonly used types and traits from this crate.
///
/// # Examples
/// ```rust
/// use rustypool::prelude::*;
///
/// let config = PoolConfig::global(PoolMethod::Average);
/// let layer = Pooling2D::new(config).unwrap();
/// assert_eq!(layer.pooling_type(), "AVE");
/// ```
pub mod prelude;

/// Traits shared by the layers of this crate
pub mod traits;

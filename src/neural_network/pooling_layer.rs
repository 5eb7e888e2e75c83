/// A macro that runs a per-(batch, channel) closure either in parallel or sequentially.
///
/// Work is split by `(batch, channel)` pair. When `batch_size * channels` reaches the given
/// threshold the pairs are processed with rayon, otherwise in a plain loop to avoid the
/// parallel overhead on small inputs. Results keep the row-major `(batch, channel)` order
/// either way.
///
/// The calling module must have `rayon::iter::{IntoParallelIterator, ParallelIterator}` in scope.
///
/// # Parameters
///
/// - `$batch_size` - Number of samples in the batch
/// - `$channels` - Number of channels per sample
/// - `$threshold` - Minimum number of pairs for parallel execution
/// - `$compute` - Closure `Fn(usize, usize) -> T` evaluated for each `(batch, channel)` pair
macro_rules! execute_parallel_or_sequential {
    ($batch_size:expr, $channels:expr, $threshold:expr, $compute:expr) => {{
        let batch_size = $batch_size;
        let channels = $channels;
        let compute = &$compute;
        if batch_size * channels >= $threshold {
            (0..batch_size * channels)
                .into_par_iter()
                .map(|idx| compute(idx / channels, idx % channels))
                .collect()
        } else {
            (0..batch_size * channels)
                .map(|idx| compute(idx / channels, idx % channels))
                .collect()
        }
    }};
}

/// A macro that writes per-(batch, channel) spatial planes back into a 4D array.
///
/// # Parameters
///
/// - `$target` - The `Array4` to write into
/// - `$results` - Iterable of `((batch, channel), plane)` where `plane` is a row-major `Vec`
/// - `$height` - Height of each plane
/// - `$width` - Width of each plane
macro_rules! merge_planes_2d {
    ($target:expr, $results:expr, $height:expr, $width:expr) => {
        for ((b, c), plane) in $results {
            for i in 0..$height {
                for j in 0..$width {
                    $target[[b, c, i, j]] = plane[i * $width + j];
                }
            }
        }
    };
}

/// Average pooling reduction and gradient kernels
pub mod average_pooling;
/// Input validation functions for pooling configurations and tensors
mod input_validation_function;
/// Max pooling reduction and gradient kernels
pub mod max_pooling;
/// Pooling method, mode and averaging policy selectors
pub mod pool_method;
/// Pooling configuration record
pub mod pool_config;
/// Stateless forward and backward entry points
pub mod pooling_engine;
/// Stateful 2D pooling layer
pub mod pooling_2d;
/// Output shape and window geometry derivation
pub mod shape_resolver;
/// Stochastic pooling reduction and gradient kernels
pub mod stochastic_pooling;
/// Index map coupling a forward call to its backward call
pub mod window_index_map;

pub use pool_config::PoolConfig;
pub use pool_method::{AverageDivisor, DEFAULT_AVERAGE_DIVISOR, PoolMethod, PoolMode};
pub use pooling_2d::Pooling2D;
pub use pooling_engine::{pool_backward, pool_forward};
pub use shape_resolver::{PoolGeometry, PoolWindow, compute_output_shape};
pub use window_index_map::WindowIndexMap;

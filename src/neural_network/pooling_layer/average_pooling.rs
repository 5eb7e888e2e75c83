use super::shape_resolver::PoolGeometry;
use ndarray::{Array4, ArrayView4, s};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Threshold for determining when to use parallel vs sequential execution.
/// When batch_size * channels >= this threshold, parallel execution is used.
/// Otherwise, sequential execution is used to avoid parallel overhead.
const AVERAGE_POOLING_PARALLEL_THRESHOLD: usize = 32;

/// Performs average pooling over every window of every `(batch, channel)` plane.
///
/// Only real input elements are summed; the sum is divided by the window's divisor, which is
/// the full kernel area under [`AverageDivisor::KernelArea`](super::pool_method::AverageDivisor)
/// and the clipped window area under `ValidArea`.
///
/// # Parameters
///
/// - `input` - Input view with shape \[batch_size, channels, height, width\]
/// - `geometry` - Geometry resolved for the input's spatial extent
///
/// # Returns
///
/// * `Array4<f32>` - Pooled values with shape \[batch_size, channels, pooled_height, pooled_width\]
pub fn average_pool_forward(input: ArrayView4<f32>, geometry: &PoolGeometry) -> Array4<f32> {
    let (batch_size, channels, _, _) = input.dim();
    let pooled_height = geometry.pooled_height();
    let pooled_width = geometry.pooled_width();

    let mut output = Array4::zeros((batch_size, channels, pooled_height, pooled_width));

    // Helper closure to compute pooling for a single (batch, channel) pair
    let compute_pooling = |b: usize, c: usize| {
        let plane = input.slice(s![b, c, .., ..]);
        let mut plane_values = Vec::with_capacity(pooled_height * pooled_width);

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                let window = geometry.window(ph, pw);
                let sum: f32 = plane
                    .slice(s![window.h_start..window.h_end, window.w_start..window.w_end])
                    .sum();
                plane_values.push(sum / window.divisor as f32);
            }
        }

        ((b, c), plane_values)
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        AVERAGE_POOLING_PARALLEL_THRESHOLD,
        compute_pooling
    );

    merge_planes_2d!(output, results, pooled_height, pooled_width);

    output
}

/// Distributes each output gradient evenly over the real input elements of its window.
///
/// Every covered element receives `gradient / divisor`, with the same divisor the forward pass
/// used. Contributions of overlapping windows accumulate.
///
/// # Parameters
///
/// - `grad_output` - Output gradient with shape \[batch_size, channels, pooled_height, pooled_width\]
/// - `geometry` - Geometry of the paired forward pass
///
/// # Returns
///
/// * `Array4<f32>` - Input gradient with shape \[batch_size, channels, height, width\]
pub fn average_pool_backward(grad_output: ArrayView4<f32>, geometry: &PoolGeometry) -> Array4<f32> {
    let (batch_size, channels, pooled_height, pooled_width) = grad_output.dim();
    let height = geometry.input_height();
    let width = geometry.input_width();

    let mut grad_input = Array4::zeros((batch_size, channels, height, width));

    // Helper closure to compute gradient for a single (batch, channel) pair
    let compute_gradient = |b: usize, c: usize| {
        let mut spatial_grad = vec![0.0f32; height * width];

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                let window = geometry.window(ph, pw);
                let grad_val = grad_output[[b, c, ph, pw]] / window.divisor as f32;

                for (h, w) in window.positions() {
                    spatial_grad[h * width + w] += grad_val;
                }
            }
        }

        ((b, c), spatial_grad)
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        AVERAGE_POOLING_PARALLEL_THRESHOLD,
        compute_gradient
    );

    merge_planes_2d!(grad_input, results, height, width);

    grad_input
}

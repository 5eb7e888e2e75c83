use super::shape_resolver::{PoolGeometry, PoolWindow};
use ndarray::{Array4, ArrayView2, ArrayView4, s};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Threshold for deciding between parallel and sequential execution.
/// When batch_size * channels >= this threshold, use parallel execution.
const MAX_POOLING_PARALLEL_THRESHOLD: usize = 32;

/// Performs max pooling over every window of every `(batch, channel)` plane.
///
/// The first element attaining the maximum in row-major window order wins ties. Its flattened
/// coordinate `row * input_width + col` is recorded for the backward pass. A NaN in a window
/// propagates to the output, and the first NaN is the recorded position.
///
/// # Parameters
///
/// - `input` - Input view with shape \[batch_size, channels, height, width\]
/// - `geometry` - Geometry resolved for the input's spatial extent
///
/// # Returns
///
/// * `(Array4<f32>, Array4<usize>)` - Pooled values and the coordinates they were taken from,
///   both shaped \[batch_size, channels, pooled_height, pooled_width\]
pub fn max_pool_forward(
    input: ArrayView4<f32>,
    geometry: &PoolGeometry,
) -> (Array4<f32>, Array4<usize>) {
    let (batch_size, channels, _, _) = input.dim();
    let pooled_height = geometry.pooled_height();
    let pooled_width = geometry.pooled_width();

    let mut output = Array4::zeros((batch_size, channels, pooled_height, pooled_width));
    let mut indices = Array4::zeros((batch_size, channels, pooled_height, pooled_width));

    // Helper closure to compute max pooling for a single (batch, channel) pair
    let compute_pooling = |b: usize, c: usize| {
        let plane = input.slice(s![b, c, .., ..]);
        let mut plane_values = Vec::with_capacity(pooled_height * pooled_width);
        let mut plane_indices = Vec::with_capacity(pooled_height * pooled_width);

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                let window = geometry.window(ph, pw);
                let (max_val, (max_h, max_w)) = window_max(&plane, &window);
                plane_values.push(max_val);
                plane_indices.push(geometry.flat_index(max_h, max_w));
            }
        }

        ((b, c), (plane_values, plane_indices))
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        MAX_POOLING_PARALLEL_THRESHOLD,
        compute_pooling
    );

    let (value_planes, index_planes): (Vec<_>, Vec<_>) = results
        .into_iter()
        .map(|(bc, (values, positions))| ((bc, values), (bc, positions)))
        .unzip();

    merge_planes_2d!(output, value_planes, pooled_height, pooled_width);
    merge_planes_2d!(indices, index_planes, pooled_height, pooled_width);

    (output, indices)
}

/// Routes each output gradient to the input coordinate recorded for its cell.
///
/// Contributions of overlapping windows accumulate. Each `(batch, channel)` plane is owned by
/// a single task, so accumulation never races.
///
/// # Parameters
///
/// - `grad_output` - Output gradient with shape \[batch_size, channels, pooled_height, pooled_width\]
/// - `indices` - Coordinates recorded by the paired forward pass, same shape as `grad_output`
/// - `geometry` - Geometry of the paired forward pass
///
/// # Returns
///
/// * `Array4<f32>` - Input gradient with shape \[batch_size, channels, height, width\]
pub fn max_pool_backward(
    grad_output: ArrayView4<f32>,
    indices: &Array4<usize>,
    geometry: &PoolGeometry,
) -> Array4<f32> {
    scatter_to_indices(grad_output, indices, geometry)
}

/// Adds every output gradient to the single input element whose coordinate was recorded.
pub(crate) fn scatter_to_indices(
    grad_output: ArrayView4<f32>,
    indices: &Array4<usize>,
    geometry: &PoolGeometry,
) -> Array4<f32> {
    let (batch_size, channels, pooled_height, pooled_width) = grad_output.dim();
    let height = geometry.input_height();
    let width = geometry.input_width();

    let mut input_gradients = Array4::zeros((batch_size, channels, height, width));

    // Helper closure to compute gradient for a single (batch, channel) pair
    let compute_gradient = |b: usize, c: usize| {
        let mut spatial_grad = vec![0.0f32; height * width];

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                spatial_grad[indices[[b, c, ph, pw]]] += grad_output[[b, c, ph, pw]];
            }
        }

        ((b, c), spatial_grad)
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        MAX_POOLING_PARALLEL_THRESHOLD,
        compute_gradient
    );

    merge_planes_2d!(input_gradients, results, height, width);

    input_gradients
}

/// Maximum of a non-empty window and the position of its first occurrence.
///
/// A NaN anywhere in the window propagates: the first NaN in row-major order is returned.
fn window_max(plane: &ArrayView2<f32>, window: &PoolWindow) -> (f32, (usize, usize)) {
    let mut max_pos = (window.h_start, window.w_start);
    let mut max_val = plane[[max_pos.0, max_pos.1]];

    for (h, w) in window.positions() {
        let val = plane[[h, w]];
        if val.is_nan() {
            return (val, (h, w));
        }
        if val > max_val {
            max_val = val;
            max_pos = (h, w);
        }
    }

    (max_val, max_pos)
}

use super::max_pooling::scatter_to_indices;
use super::shape_resolver::{PoolGeometry, PoolWindow};
use ndarray::{Array4, ArrayView2, ArrayView4, s};
use rand::Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Threshold for deciding between parallel and sequential execution.
/// When batch_size * channels >= this threshold, use parallel execution.
const STOCHASTIC_POOLING_PARALLEL_THRESHOLD: usize = 32;

/// Draws one uniform sample in `[0, 1)` per output cell.
///
/// Samples are drawn in row-major `(batch, channel, row, column)` order before any parallel
/// work starts, so a seeded generator yields the same selections regardless of how the
/// windows are scheduled afterwards.
///
/// # Parameters
///
/// - `rng` - Random source
/// - `shape` - Output shape `(batch_size, channels, pooled_height, pooled_width)`
pub fn draw_thresholds<R: Rng + ?Sized>(
    rng: &mut R,
    shape: (usize, usize, usize, usize),
) -> Array4<f32> {
    Array4::from_shape_simple_fn(shape, || rng.random::<f32>())
}

/// Performs training-mode stochastic pooling.
///
/// Within each window the non-negative part of every activation is its sampling weight. The
/// selected element is the first one, in row-major window order, whose running weight sum
/// exceeds `threshold * total_weight`. Windows without positive weight fall back to picking
/// element `floor(threshold * window_len)` uniformly. The output is the selected element's value.
///
/// # Parameters
///
/// - `input` - Input view with shape \[batch_size, channels, height, width\]
/// - `geometry` - Geometry resolved for the input's spatial extent
/// - `thresholds` - Uniform samples from [`draw_thresholds`], one per output cell
///
/// # Returns
///
/// * `(Array4<f32>, Array4<usize>)` - Pooled values and the sampled coordinates
pub fn stochastic_pool_forward_training(
    input: ArrayView4<f32>,
    geometry: &PoolGeometry,
    thresholds: &Array4<f32>,
) -> (Array4<f32>, Array4<usize>) {
    let (batch_size, channels, _, _) = input.dim();
    let pooled_height = geometry.pooled_height();
    let pooled_width = geometry.pooled_width();

    let mut output = Array4::zeros((batch_size, channels, pooled_height, pooled_width));
    let mut indices = Array4::zeros((batch_size, channels, pooled_height, pooled_width));

    // Helper closure to sample every window of a single (batch, channel) pair
    let compute_pooling = |b: usize, c: usize| {
        let plane = input.slice(s![b, c, .., ..]);
        let mut plane_values = Vec::with_capacity(pooled_height * pooled_width);
        let mut plane_indices = Vec::with_capacity(pooled_height * pooled_width);
        let mut fallbacks = 0usize;

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                let window = geometry.window(ph, pw);
                let ((h, w), uniform) = sample_window(&plane, &window, thresholds[[b, c, ph, pw]]);
                if uniform {
                    fallbacks += 1;
                }
                plane_values.push(plane[[h, w]]);
                plane_indices.push(geometry.flat_index(h, w));
            }
        }

        ((b, c), (plane_values, plane_indices, fallbacks))
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        STOCHASTIC_POOLING_PARALLEL_THRESHOLD,
        compute_pooling
    );

    let total_fallbacks: usize = results.iter().map(|(_, (_, _, fallbacks))| fallbacks).sum();
    if total_fallbacks > 0 {
        log::debug!(
            "Stochastic pooling sampled {} of {} windows uniformly (no positive activation)",
            total_fallbacks,
            batch_size * channels * pooled_height * pooled_width
        );
    }

    let (value_planes, index_planes): (Vec<_>, Vec<_>) = results
        .into_iter()
        .map(|(bc, (values, positions, _))| ((bc, values), (bc, positions)))
        .unzip();

    merge_planes_2d!(output, value_planes, pooled_height, pooled_width);
    merge_planes_2d!(indices, index_planes, pooled_height, pooled_width);

    (output, indices)
}

/// Performs inference-mode stochastic pooling.
///
/// Each output is the expectation of the window under the sampling distribution used in
/// training: `sum(w_i * x_i) / sum(w_i)` with `w_i = max(x_i, 0)`. Windows without positive
/// weight output their plain mean. No randomness is involved.
///
/// # Parameters
///
/// - `input` - Input view with shape \[batch_size, channels, height, width\]
/// - `geometry` - Geometry resolved for the input's spatial extent
///
/// # Returns
///
/// * `Array4<f32>` - Pooled values with shape \[batch_size, channels, pooled_height, pooled_width\]
pub fn stochastic_pool_forward_inference(
    input: ArrayView4<f32>,
    geometry: &PoolGeometry,
) -> Array4<f32> {
    let (batch_size, channels, _, _) = input.dim();
    let pooled_height = geometry.pooled_height();
    let pooled_width = geometry.pooled_width();

    let mut output = Array4::zeros((batch_size, channels, pooled_height, pooled_width));

    let compute_pooling = |b: usize, c: usize| {
        let plane = input.slice(s![b, c, .., ..]);
        let mut plane_values = Vec::with_capacity(pooled_height * pooled_width);

        for ph in 0..pooled_height {
            for pw in 0..pooled_width {
                let window = geometry.window(ph, pw);
                plane_values.push(window_expectation(&plane, &window));
            }
        }

        ((b, c), plane_values)
    };

    let results: Vec<_> = execute_parallel_or_sequential!(
        batch_size,
        channels,
        STOCHASTIC_POOLING_PARALLEL_THRESHOLD,
        compute_pooling
    );

    merge_planes_2d!(output, results, pooled_height, pooled_width);

    output
}

/// Routes each output gradient to the coordinate sampled by the paired training forward pass.
///
/// # Parameters
///
/// - `grad_output` - Output gradient with shape \[batch_size, channels, pooled_height, pooled_width\]
/// - `indices` - Sampled coordinates recorded by the paired forward pass
/// - `geometry` - Geometry of the paired forward pass
///
/// # Returns
///
/// * `Array4<f32>` - Input gradient with shape \[batch_size, channels, height, width\]
pub fn stochastic_pool_backward(
    grad_output: ArrayView4<f32>,
    indices: &Array4<usize>,
    geometry: &PoolGeometry,
) -> Array4<f32> {
    scatter_to_indices(grad_output, indices, geometry)
}

/// Samples one position of a non-empty window.
///
/// Returns the position and whether the uniform fallback was used.
fn sample_window(
    plane: &ArrayView2<f32>,
    window: &PoolWindow,
    threshold: f32,
) -> ((usize, usize), bool) {
    let total: f32 = window
        .positions()
        .map(|(h, w)| plane[[h, w]].max(0.0))
        .sum();

    if total > 0.0 && total.is_finite() {
        let target = threshold * total;
        let mut cumulative = 0.0f32;
        let mut last_positive = None;

        for (h, w) in window.positions() {
            let weight = plane[[h, w]].max(0.0);
            if weight > 0.0 {
                cumulative += weight;
                last_positive = Some((h, w));
                if cumulative > target {
                    return ((h, w), false);
                }
            }
        }

        // rounding can leave the running sum just short of the target
        if let Some(pos) = last_positive {
            return (pos, false);
        }
    }

    let window_w = window.w_end - window.w_start;
    let k = ((threshold * window.len() as f32) as usize).min(window.len() - 1);
    ((window.h_start + k / window_w, window.w_start + k % window_w), true)
}

/// Probability-weighted expectation of a non-empty window.
fn window_expectation(plane: &ArrayView2<f32>, window: &PoolWindow) -> f32 {
    let (weighted_sum, total_weight, plain_sum) = window.positions().fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(weighted_sum, total_weight, plain_sum), (h, w)| {
            let val = plane[[h, w]];
            let weight = val.max(0.0);
            (weighted_sum + weight * val, total_weight + weight, plain_sum + val)
        },
    );

    if total_weight > 0.0 && total_weight.is_finite() {
        weighted_sum / total_weight
    } else {
        plain_sum / window.len() as f32
    }
}

use super::average_pooling::{average_pool_backward, average_pool_forward};
use super::input_validation_function::validate_input_shape_dims;
use super::max_pooling::{max_pool_backward, max_pool_forward};
use super::pool_config::PoolConfig;
use super::pool_method::{PoolMethod, PoolMode};
use super::shape_resolver::PoolGeometry;
use super::stochastic_pooling::{
    draw_thresholds, stochastic_pool_backward, stochastic_pool_forward_inference,
    stochastic_pool_forward_training,
};
use super::window_index_map::WindowIndexMap;
use crate::error::PoolingError;
use crate::neural_network::Tensor;
use ndarray::{ArrayView4, Ix4};
use rand::Rng;

/// Runs the pooling operator forward.
///
/// The method is dispatched once per call. The returned [`WindowIndexMap`] must be handed to
/// [`pool_backward`] to differentiate this exact call.
///
/// # Parameters
///
/// - `input` - Input feature map with shape \[batch_size, channels, height, width\]
/// - `config` - Pooling configuration
/// - `mode` - Training or inference; only stochastic pooling depends on it
/// - `rng` - Random source for stochastic sampling; other methods never draw from it
///
/// # Returns
///
/// - `Ok((Tensor, WindowIndexMap))` - Output with shape \[batch_size, channels, pooled_height, pooled_width\]
///   and the record of the window decisions
/// - `Err(PoolingError)` - If the input or configuration is invalid; no output is produced
///
/// # Example
/// ```rust
/// use rustypool::neural_network::*;
/// use ndarray::Array4;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let x = Array4::from_elem((2, 3, 6, 6), 1.0f32).into_dyn();
/// let config = PoolConfig::new(PoolMethod::Stochastic, (2, 2), None, None).unwrap();
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let (output, index_map) = pool_forward(&x, &config, PoolMode::Training, &mut rng).unwrap();
/// assert_eq!(output.shape(), &[2, 3, 3, 3]);
/// assert!(index_map.indices().is_some());
/// ```
pub fn pool_forward<R: Rng + ?Sized>(
    input: &Tensor,
    config: &PoolConfig,
    mode: PoolMode,
    rng: &mut R,
) -> Result<(Tensor, WindowIndexMap), PoolingError> {
    validate_input_shape_dims(input.shape(), "Input tensor")?;
    let input = as_4d(input)?;
    let (batch_size, channels, height, width) = input.dim();
    let geometry = PoolGeometry::resolve(height, width, config)?;

    log::trace!(
        "{} pooling forward ({:?}) on [{}, {}, {}, {}]",
        config.method().pooling_type(),
        mode,
        batch_size,
        channels,
        height,
        width
    );

    let (output, indices) = match config.method() {
        PoolMethod::Max => {
            let (output, indices) = max_pool_forward(input, &geometry);
            (output, Some(indices))
        }
        PoolMethod::Average => (average_pool_forward(input, &geometry), None),
        PoolMethod::Stochastic => match mode {
            PoolMode::Training => {
                let thresholds = draw_thresholds(
                    rng,
                    (
                        batch_size,
                        channels,
                        geometry.pooled_height(),
                        geometry.pooled_width(),
                    ),
                );
                let (output, indices) =
                    stochastic_pool_forward_training(input, &geometry, &thresholds);
                (output, Some(indices))
            }
            PoolMode::Inference => (stochastic_pool_forward_inference(input, &geometry), None),
        },
    };

    let index_map = WindowIndexMap::new(
        *config,
        geometry,
        mode,
        [batch_size, channels, height, width],
        indices,
    );

    Ok((output.into_dyn(), index_map))
}

/// Runs the pooling operator backward.
///
/// The input gradient starts at zero and accumulates the contribution of every output cell,
/// since windows may overlap.
///
/// # Parameters
///
/// - `grad_output` - Gradient of the forward output, shape \[batch_size, channels, pooled_height, pooled_width\]
/// - `index_map` - The map returned by the paired [`pool_forward`] call
/// - `input_shape` - Shape of the forward input
/// - `config` - Configuration of the forward call
///
/// # Returns
///
/// - `Ok(Tensor)` - Input gradient with shape `input_shape`
/// - `Err(PoolingError)` - If the call is not paired with a matching forward pass
///
/// # Errors
///
/// - `PoolingError::ShapeMismatchError` - If `input_shape`, `config` or the gradient's shape do not
///   match the paired forward call
/// - `PoolingError::UnpairedBackwardError` - If the map holds no recorded indices where they are
///   required, including any stochastic map produced in inference mode
pub fn pool_backward(
    grad_output: &Tensor,
    index_map: &WindowIndexMap,
    input_shape: &[usize],
    config: &PoolConfig,
) -> Result<Tensor, PoolingError> {
    validate_input_shape_dims(input_shape, "Input shape")?;
    index_map.verify_pairing(input_shape, config)?;

    let expected_shape = index_map.output_shape();
    if grad_output.shape() != expected_shape.as_slice() {
        return Err(PoolingError::ShapeMismatchError(format!(
            "Output gradient shape {:?} does not match forward output shape {:?}",
            grad_output.shape(),
            expected_shape
        )));
    }

    let grad_output = as_4d(grad_output)?;
    let geometry = index_map.geometry();

    log::trace!(
        "{} pooling backward on {:?}",
        config.method().pooling_type(),
        input_shape
    );

    let method = config.method();
    let grad_input = match (method, index_map.indices()) {
        (PoolMethod::Average, _) => average_pool_backward(grad_output, geometry),
        _ if !method.records_indices(index_map.mode()) => {
            return Err(PoolingError::UnpairedBackwardError(format!(
                "{} pooling has no backward pass in {:?} mode",
                method.pooling_type(),
                index_map.mode()
            )));
        }
        (PoolMethod::Max, Some(indices)) => max_pool_backward(grad_output, indices, geometry),
        (PoolMethod::Stochastic, Some(indices)) => {
            stochastic_pool_backward(grad_output, indices, geometry)
        }
        (_, None) => {
            return Err(PoolingError::UnpairedBackwardError(format!(
                "{} pooling backward requires the indices recorded by forward",
                method.pooling_type()
            )));
        }
    };

    Ok(grad_input.into_dyn())
}

fn as_4d(tensor: &Tensor) -> Result<ArrayView4<'_, f32>, PoolingError> {
    tensor
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|e| PoolingError::ShapeMismatchError(format!("Tensor is not 4D: {}", e)))
}

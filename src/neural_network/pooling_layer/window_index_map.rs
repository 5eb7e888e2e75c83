use super::pool_config::PoolConfig;
use super::pool_method::PoolMode;
use super::shape_resolver::PoolGeometry;
use crate::error::PoolingError;
use crate::neural_network::Tensor;
use ndarray::Array4;

/// Record of the window decisions made by one forward pass.
///
/// Returned by [`pool_forward`](super::pooling_engine::pool_forward) and consumed by
/// [`pool_backward`](super::pooling_engine::pool_backward). For max pooling it holds, per
/// output cell, the flattened `row * input_width + col` coordinate of the selected input
/// element; for stochastic pooling in training mode it holds the sampled coordinate. Average
/// pooling and stochastic inference record no indices, but the map still carries the
/// configuration, geometry and input shape so backward can check it is paired with the right
/// forward call.
///
/// A map describes exactly one input; run forward again before reusing it on another input.
///
/// # Fields
///
/// - `config` - Configuration the forward pass ran with
/// - `geometry` - Geometry resolved for the forward input
/// - `mode` - Training or inference
/// - `input_shape` - Shape of the forward input `[batch_size, channels, height, width]`
/// - `indices` - Selected coordinates with shape `[batch_size, channels, pooled_height, pooled_width]`
#[derive(Debug, Clone, PartialEq)]
pub struct WindowIndexMap {
    config: PoolConfig,
    geometry: PoolGeometry,
    mode: PoolMode,
    input_shape: [usize; 4],
    indices: Option<Array4<usize>>,
}

impl WindowIndexMap {
    pub(crate) fn new(
        config: PoolConfig,
        geometry: PoolGeometry,
        mode: PoolMode,
        input_shape: [usize; 4],
        indices: Option<Array4<usize>>,
    ) -> Self {
        WindowIndexMap {
            config,
            geometry,
            mode,
            input_shape,
            indices,
        }
    }

    /// Returns the recorded coordinates, if the forward pass recorded any.
    pub fn indices(&self) -> Option<&Array4<usize>> {
        self.indices.as_ref()
    }

    /// Returns the recorded coordinates as a float tensor.
    ///
    /// This is the optional second "mask" output of a max pooling layer, in the same
    /// `[batch_size, channels, pooled_height, pooled_width]` layout as the pooled output.
    ///
    /// # Returns
    ///
    /// - `Some(Tensor)` - The coordinates as `f32`
    /// - `None` - If the forward pass recorded no indices
    pub fn mask_tensor(&self) -> Option<Tensor> {
        self.indices
            .as_ref()
            .map(|indices| indices.mapv(|idx| idx as f32).into_dyn())
    }

    /// Shape of the forward output (and of the gradient backward expects).
    pub fn output_shape(&self) -> [usize; 4] {
        [
            self.input_shape[0],
            self.input_shape[1],
            self.geometry.pooled_height(),
            self.geometry.pooled_width(),
        ]
    }

    /// Checks that this map belongs to a forward call with the given input shape and configuration.
    ///
    /// # Errors
    ///
    /// - `PoolingError::ShapeMismatchError` - If the configuration or input shape differ from the
    ///   ones recorded by the forward pass
    pub fn verify_pairing(
        &self,
        input_shape: &[usize],
        config: &PoolConfig,
    ) -> Result<(), PoolingError> {
        if *config != self.config {
            return Err(PoolingError::ShapeMismatchError(format!(
                "Configuration {:?} differs from the one used by the paired forward call {:?}",
                config, self.config
            )));
        }
        if input_shape != self.input_shape.as_slice() {
            return Err(PoolingError::ShapeMismatchError(format!(
                "Input shape {:?} differs from the one used by the paired forward call {:?}",
                input_shape, self.input_shape
            )));
        }
        Ok(())
    }

    /// Shape of the forward input.
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Configuration the forward pass ran with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Geometry resolved for the forward input.
    pub fn geometry(&self) -> &PoolGeometry {
        &self.geometry
    }

    get_field!(mode, mode, PoolMode);
}

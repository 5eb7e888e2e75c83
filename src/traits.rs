use crate::error::PoolingError;
use crate::neural_network::Tensor;

/// Defines the interface for neural network layers.
///
/// This trait provides the lifecycle a training loop drives: forward propagation,
/// backward propagation, and switching between training and inference behavior.
pub trait Layer: Send {
    /// Performs forward propagation through the layer.
    ///
    /// # Parameters
    ///
    /// - `input` - The input tensor to the layer
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The output tensor after forward computation
    /// - `Err(PoolingError)` - If the input does not fit the layer configuration
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, PoolingError>;

    /// Performs backward propagation through the layer.
    ///
    /// # Parameters
    ///
    /// - `grad_output` - The gradient tensor from the next layer
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The gradient tensor to be passed to the previous layer
    /// - `Err(PoolingError)` - If the layer encountered an error during processing
    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, PoolingError>;

    /// Returns the type name of the layer (e.g. "Pooling2D").
    ///
    /// # Returns
    ///
    /// * `&str` - A string slice representing the layer type
    fn layer_type(&self) -> &str {
        "Unknown"
    }

    /// Returns a description of the output shape of the layer.
    ///
    /// # Returns
    ///
    /// - `String` - A string describing the output dimensions
    fn output_shape(&self) -> String {
        "Unknown".to_string()
    }

    /// Sets the training mode if the layer is mode-dependent.
    ///
    /// Layers that don't depend on training mode can use the default no-op implementation.
    ///
    /// # Parameters
    ///
    /// - `_is_training` - `true` for training mode, `false` for inference mode
    fn set_training_if_mode_dependent(&mut self, _is_training: bool) {}
}

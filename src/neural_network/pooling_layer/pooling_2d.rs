use super::input_validation_function::validate_input_shape_dims;
use super::pool_config::PoolConfig;
use super::pool_method::{PoolMethod, PoolMode};
use super::pooling_engine::{pool_backward, pool_forward};
use super::shape_resolver::PoolGeometry;
use super::window_index_map::WindowIndexMap;
use crate::error::PoolingError;
use crate::neural_network::Tensor;
use crate::traits::Layer;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 2D pooling layer.
///
/// Wraps [`pool_forward`] and [`pool_backward`] for use inside a training loop: the layer
/// resolves its geometry against the incoming input (again whenever the spatial extent
/// changes), keeps the [`WindowIndexMap`] of the last forward pass for the following backward
/// pass, and owns the random source used by stochastic pooling.
///
/// Input tensor shape: `[batch_size, channels, height, width]`. Output tensor shape:
/// `[batch_size, channels, pooled_height, pooled_width]` where
/// `pooled_height = (height + 2 * pad_h - kernel_h) / stride_h + 1` and likewise for the width.
///
/// # Fields
///
/// - `config` - Pooling configuration
/// - `input_shape` - Shape of the last input, empty before the first forward pass or reshape
/// - `geometry` - Geometry resolved for `input_shape`
/// - `index_map` - Window decisions of the last forward pass
/// - `training` - Whether the layer is in training mode or inference mode
/// - `rng` - Random source for stochastic pooling
///
/// # Example
/// ```rust
/// use rustypool::prelude::*;
/// use ndarray::Array4;
///
/// let mut input_data = Array4::zeros((2, 3, 6, 6));
/// for b in 0..2 {
///     for c in 0..3 {
///         for i in 0..6 {
///             for j in 0..6 {
///                 input_data[[b, c, i, j]] = (i * j) as f32 + b as f32 * 0.1 + c as f32 * 0.01;
///             }
///         }
///     }
/// }
/// let x = input_data.into_dyn();
///
/// let config = PoolConfig::new(PoolMethod::Max, (2, 2), None, None).unwrap();
/// let mut layer = Pooling2D::new(config).unwrap();
///
/// let output = layer.forward(&x).unwrap();
/// assert_eq!(output.shape(), &[2, 3, 3, 3]);
/// assert_eq!(layer.output_shape(), "(2, 3, 3, 3)");
///
/// let grad_input = layer.backward(&Tensor::ones(output.raw_dim())).unwrap();
/// assert_eq!(grad_input.shape(), x.shape());
/// ```
pub struct Pooling2D {
    config: PoolConfig,
    input_shape: Vec<usize>,
    geometry: Option<PoolGeometry>,
    index_map: Option<WindowIndexMap>,
    training: bool,
    rng: StdRng,
}

impl Pooling2D {
    /// Creates a new 2D pooling layer in training mode, with a randomly seeded random source.
    ///
    /// # Parameters
    ///
    /// - `config` - Pooling configuration
    ///
    /// # Returns
    ///
    /// - `Result<Pooling2D, PoolingError>` - New layer instance on success
    ///
    /// # Errors
    ///
    /// - `PoolingError::ConfigurationError` - If the configuration is invalid
    pub fn new(config: PoolConfig) -> Result<Self, PoolingError> {
        config.validate()?;

        Ok(Pooling2D {
            config,
            input_shape: Vec::new(),
            geometry: None,
            index_map: None,
            training: true,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Replaces the random source with one seeded from `seed`, for reproducible stochastic pooling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets the training mode for the layer.
    ///
    /// # Parameters
    ///
    /// * `is_training` - `true` for training mode, `false` for inference mode
    pub fn set_training(&mut self, is_training: bool) {
        self.training = is_training;
    }

    /// Resolves the layer's geometry for an input shape without running the operator.
    ///
    /// External orchestration uses this to size output buffers before data is available.
    /// A previously recorded index map is discarded when the shape changes, and a rejected
    /// shape leaves the layer without a geometry.
    ///
    /// # Parameters
    ///
    /// * `input_shape` - Input shape `[batch_size, channels, height, width]`
    ///
    /// # Errors
    ///
    /// - `PoolingError::ShapeMismatchError` - If the shape is not 4D or has a zero spatial extent
    /// - `PoolingError::ConfigurationError` - If the kernel does not fit the padded input
    pub fn reshape(&mut self, input_shape: &[usize]) -> Result<(), PoolingError> {
        if self.geometry.is_some() && self.input_shape == input_shape {
            return Ok(());
        }

        // A rejected shape leaves the layer unresolved
        self.input_shape.clear();
        self.geometry = None;
        self.index_map = None;

        validate_input_shape_dims(input_shape, "Input shape")?;
        let geometry = PoolGeometry::resolve(input_shape[2], input_shape[3], &self.config)?;
        log::debug!(
            "Pooling2D reshaped to input {:?}, output [{}, {}, {}, {}]",
            input_shape,
            input_shape[0],
            input_shape[1],
            geometry.pooled_height(),
            geometry.pooled_width()
        );

        self.input_shape = input_shape.to_vec();
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Returns the pooling method name: `"MAX"`, `"AVE"` or `"STOCHASTIC"`.
    pub fn pooling_type(&self) -> &'static str {
        self.config.method().pooling_type()
    }

    /// Effective kernel height; the configured one until the geometry has been resolved.
    pub fn kernel_height(&self) -> usize {
        self.geometry
            .map_or(self.config.kernel_size().0, |g| g.kernel_height())
    }

    /// Effective kernel width; the configured one until the geometry has been resolved.
    pub fn kernel_width(&self) -> usize {
        self.geometry
            .map_or(self.config.kernel_size().1, |g| g.kernel_width())
    }

    /// Effective vertical stride.
    pub fn stride_height(&self) -> usize {
        self.geometry
            .map_or(self.config.strides().0, |g| g.stride_height())
    }

    /// Effective horizontal stride.
    pub fn stride_width(&self) -> usize {
        self.geometry
            .map_or(self.config.strides().1, |g| g.stride_width())
    }

    /// Effective padding along the height.
    pub fn pad_height(&self) -> usize {
        self.geometry
            .map_or(self.config.padding().0, |g| g.pad_height())
    }

    /// Effective padding along the width.
    pub fn pad_width(&self) -> usize {
        self.geometry
            .map_or(self.config.padding().1, |g| g.pad_width())
    }

    /// Number of channels of the last input, if any has been seen.
    pub fn channels(&self) -> Option<usize> {
        self.input_shape.get(1).copied()
    }

    /// Shape of the last input; empty before the first forward pass or reshape.
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Shape of the output for the last input.
    pub fn output_shape_dims(&self) -> Option<[usize; 4]> {
        self.geometry.map(|g| {
            [
                self.input_shape[0],
                self.input_shape[1],
                g.pooled_height(),
                g.pooled_width(),
            ]
        })
    }

    /// Returns the positions selected by the last max pooling forward pass as a tensor.
    ///
    /// # Returns
    ///
    /// - `Some(Tensor)` - The mask, shaped like the output
    /// - `None` - If the method is not max pooling or no forward pass has run
    pub fn mask(&self) -> Option<Tensor> {
        if self.config.method() != PoolMethod::Max {
            return None;
        }
        self.index_map.as_ref().and_then(|map| map.mask_tensor())
    }

    /// Returns the window decisions of the last forward pass.
    pub fn index_map(&self) -> Option<&WindowIndexMap> {
        self.index_map.as_ref()
    }

    /// Returns the pooling configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    get_field!(is_training, training, bool);
}

impl Layer for Pooling2D {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, PoolingError> {
        self.index_map = None;
        self.reshape(input.shape())?;

        let mode = PoolMode::from_training(self.training);
        let (output, index_map) = pool_forward(input, &self.config, mode, &mut self.rng)?;

        self.index_map = Some(index_map);

        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, PoolingError> {
        match &self.index_map {
            Some(index_map) => {
                pool_backward(grad_output, index_map, &self.input_shape, &self.config)
            }
            None => Err(PoolingError::UnpairedBackwardError(
                "Forward pass has not been run".to_string(),
            )),
        }
    }

    fn layer_type(&self) -> &str {
        "Pooling2D"
    }

    fn output_shape(&self) -> String {
        match self.output_shape_dims() {
            Some(shape) => format!("({}, {}, {}, {})", shape[0], shape[1], shape[2], shape[3]),
            None => String::from("Unknown"),
        }
    }

    fn set_training_if_mode_dependent(&mut self, is_training: bool) {
        self.set_training(is_training);
    }
}

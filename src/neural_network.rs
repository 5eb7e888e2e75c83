/// Module that contains the pooling operator and the pooling layer
pub mod pooling_layer;

pub use pooling_layer::*;

use ndarray::ArrayD;

/// Type alias for n-dimensional arrays used as tensors (feature maps) throughout the crate
pub type Tensor = ArrayD<f32>;

pub use crate::traits::Layer;

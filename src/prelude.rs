pub use crate::error::PoolingError;
pub use crate::neural_network::*;
pub use crate::traits::Layer;

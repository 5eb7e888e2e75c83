use serde::{Deserialize, Serialize};

/// Reduction applied to each pooling window.
///
/// # Variants
///
/// - `Max` - Selects the largest value of the window and remembers where it was
/// - `Average` - Sums the window and divides by the divisor chosen by [`AverageDivisor`]
/// - `Stochastic` - Samples one element with probability proportional to its activation while
///   training, and takes the probability-weighted expectation during inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolMethod {
    Max,
    Average,
    Stochastic,
}

impl PoolMethod {
    /// Returns the conventional method name used when exporting the operator to other runtimes.
    ///
    /// # Returns
    ///
    /// * `&'static str` - `"MAX"`, `"AVE"` or `"STOCHASTIC"`
    pub fn pooling_type(&self) -> &'static str {
        match self {
            PoolMethod::Max => "MAX",
            PoolMethod::Average => "AVE",
            PoolMethod::Stochastic => "STOCHASTIC",
        }
    }

    /// Whether a forward pass with this method in the given mode records window indices.
    pub fn records_indices(&self, mode: PoolMode) -> bool {
        match self {
            PoolMethod::Max => true,
            PoolMethod::Average => false,
            PoolMethod::Stochastic => mode == PoolMode::Training,
        }
    }
}

/// Whether the operator runs as part of training or inference.
///
/// Only stochastic pooling behaves differently between the two modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolMode {
    Training,
    Inference,
}

impl PoolMode {
    /// Maps a training flag to a mode.
    pub fn from_training(is_training: bool) -> Self {
        if is_training {
            PoolMode::Training
        } else {
            PoolMode::Inference
        }
    }
}

/// Divisor used by average pooling in both forward and backward passes.
///
/// # Variants
///
/// - `KernelArea` - Always divide by `kernel_h * kernel_w`; padded positions count as zeros
/// - `ValidArea` - Divide by the number of real input elements inside the clipped window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AverageDivisor {
    KernelArea,
    ValidArea,
}

/// Averaging policy used when none is configured.
pub const DEFAULT_AVERAGE_DIVISOR: AverageDivisor = AverageDivisor::KernelArea;

impl Default for AverageDivisor {
    fn default() -> Self {
        DEFAULT_AVERAGE_DIVISOR
    }
}

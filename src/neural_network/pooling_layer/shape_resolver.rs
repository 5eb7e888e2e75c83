use super::input_validation_function::{
    validate_input_shape_dims, validate_kernel_fits, validate_spatial_dims_positive,
};
use super::pool_config::PoolConfig;
use super::pool_method::AverageDivisor;
use crate::error::PoolingError;

/// Clipped input-space window of one output cell.
///
/// Rows `h_start..h_end` and columns `w_start..w_end` lie inside the real input; padding
/// positions are never part of the bounds. Every window produced by [`PoolGeometry`] is
/// non-empty.
///
/// # Fields
///
/// - `h_start` - First input row of the window
/// - `h_end` - One past the last input row of the window
/// - `w_start` - First input column of the window
/// - `w_end` - One past the last input column of the window
/// - `divisor` - Number the window sum is divided by under the active average divisor policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolWindow {
    pub h_start: usize,
    pub h_end: usize,
    pub w_start: usize,
    pub w_end: usize,
    pub divisor: usize,
}

impl PoolWindow {
    /// Number of real input elements covered by the window.
    pub fn len(&self) -> usize {
        (self.h_end - self.h_start) * (self.w_end - self.w_start)
    }

    /// Whether the window covers no input element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the window's `(row, column)` coordinates in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.h_start..self.h_end)
            .flat_map(move |h| (self.w_start..self.w_end).map(move |w| (h, w)))
    }
}

/// Resolved pooling geometry for one input spatial extent.
///
/// Holds the effective kernel, stride and padding (global pooling overrides already applied),
/// the input extent and the pooled extent. Recompute it whenever the input height or width,
/// or the configuration, changes.
///
/// # Fields
///
/// - `kernel_height` / `kernel_width` - Effective window size
/// - `stride_height` / `stride_width` - Effective window step
/// - `pad_height` / `pad_width` - Effective implicit padding
/// - `input_height` / `input_width` - Spatial extent of the input
/// - `pooled_height` / `pooled_width` - Spatial extent of the output
/// - `average_divisor` - Divisor policy reported through [`PoolWindow::divisor`]
///
/// # Example
/// ```rust
/// use rustypool::neural_network::{PoolConfig, PoolGeometry, PoolMethod};
///
/// // 3x3 input padded to 5x5, 2x2 kernel with unit stride
/// let config = PoolConfig::new(PoolMethod::Average, (2, 2), Some((1, 1)), Some((1, 1))).unwrap();
/// let geometry = PoolGeometry::resolve(3, 3, &config).unwrap();
/// assert_eq!((geometry.pooled_height(), geometry.pooled_width()), (4, 4));
///
/// // The top-left window only touches input element (0, 0)
/// let window = geometry.window(0, 0);
/// assert_eq!((window.h_start, window.h_end, window.w_start, window.w_end), (0, 1, 0, 1));
/// assert_eq!(window.divisor, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolGeometry {
    kernel_height: usize,
    kernel_width: usize,
    stride_height: usize,
    stride_width: usize,
    pad_height: usize,
    pad_width: usize,
    input_height: usize,
    input_width: usize,
    pooled_height: usize,
    pooled_width: usize,
    average_divisor: AverageDivisor,
}

impl PoolGeometry {
    /// Resolves output extents and window placement for an input of the given spatial size.
    ///
    /// # Parameters
    ///
    /// - `input_height` - Number of input rows
    /// - `input_width` - Number of input columns
    /// - `config` - Pooling configuration
    ///
    /// # Returns
    ///
    /// - `Result<PoolGeometry, PoolingError>` - The resolved geometry
    ///
    /// # Errors
    ///
    /// - `PoolingError::ShapeMismatchError` - If the input height or width is zero
    /// - `PoolingError::ConfigurationError` - If the configuration is invalid or the kernel is
    ///   larger than the padded input
    pub fn resolve(
        input_height: usize,
        input_width: usize,
        config: &PoolConfig,
    ) -> Result<Self, PoolingError> {
        config.validate()?;
        validate_spatial_dims_positive(input_height, input_width)?;

        let (kernel_size, strides, padding) = if config.global_pooling() {
            ((input_height, input_width), (1, 1), (0, 0))
        } else {
            (config.kernel_size(), config.strides(), config.padding())
        };

        validate_kernel_fits(kernel_size.0, input_height, padding.0, "height")?;
        validate_kernel_fits(kernel_size.1, input_width, padding.1, "width")?;

        let pooled_height = pooled_extent(input_height, kernel_size.0, strides.0, padding.0);
        let pooled_width = pooled_extent(input_width, kernel_size.1, strides.1, padding.1);

        log::debug!(
            "Resolved pooling geometry: input {}x{}, kernel {:?}, strides {:?}, padding {:?} -> output {}x{}",
            input_height,
            input_width,
            kernel_size,
            strides,
            padding,
            pooled_height,
            pooled_width
        );

        Ok(PoolGeometry {
            kernel_height: kernel_size.0,
            kernel_width: kernel_size.1,
            stride_height: strides.0,
            stride_width: strides.1,
            pad_height: padding.0,
            pad_width: padding.1,
            input_height,
            input_width,
            pooled_height,
            pooled_width,
            average_divisor: config.average_divisor(),
        })
    }

    /// Returns the clipped input window of output cell `(ph, pw)`.
    ///
    /// # Parameters
    ///
    /// - `ph` - Output row, `0..pooled_height`
    /// - `pw` - Output column, `0..pooled_width`
    pub fn window(&self, ph: usize, pw: usize) -> PoolWindow {
        let (h_start, h_end) = axis_bounds(
            ph,
            self.stride_height,
            self.pad_height,
            self.kernel_height,
            self.input_height,
        );
        let (w_start, w_end) = axis_bounds(
            pw,
            self.stride_width,
            self.pad_width,
            self.kernel_width,
            self.input_width,
        );

        let divisor = match self.average_divisor {
            AverageDivisor::KernelArea => self.kernel_area(),
            AverageDivisor::ValidArea => (h_end - h_start) * (w_end - w_start),
        };

        PoolWindow {
            h_start,
            h_end,
            w_start,
            w_end,
            divisor,
        }
    }

    /// Number of positions in the unclipped kernel.
    pub fn kernel_area(&self) -> usize {
        self.kernel_height * self.kernel_width
    }

    /// Flattened input coordinate `row * input_width + col`.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.input_width + col
    }

    get_field!(kernel_height, kernel_height, usize);
    get_field!(kernel_width, kernel_width, usize);
    get_field!(stride_height, stride_height, usize);
    get_field!(stride_width, stride_width, usize);
    get_field!(pad_height, pad_height, usize);
    get_field!(pad_width, pad_width, usize);
    get_field!(input_height, input_height, usize);
    get_field!(input_width, input_width, usize);
    get_field!(pooled_height, pooled_height, usize);
    get_field!(pooled_width, pooled_width, usize);
    get_field!(average_divisor, average_divisor, AverageDivisor);
}

/// Computes the pooled spatial extent for a 4D input shape.
///
/// # Parameters
///
/// - `input_shape` - Shape of the input tensor, in format \[batch_size, channels, height, width\]
/// - `config` - Pooling configuration
///
/// # Returns
///
/// - `Result<(usize, usize), PoolingError>` - `(pooled_height, pooled_width)`
///
/// # Errors
///
/// - `PoolingError::ShapeMismatchError` - If the shape is not 4D or has a zero spatial extent
/// - `PoolingError::ConfigurationError` - If the configuration does not fit the input
pub fn compute_output_shape(
    input_shape: &[usize],
    config: &PoolConfig,
) -> Result<(usize, usize), PoolingError> {
    validate_input_shape_dims(input_shape, "Input shape")?;
    let geometry = PoolGeometry::resolve(input_shape[2], input_shape[3], config)?;
    Ok((geometry.pooled_height, geometry.pooled_width))
}

/// Number of windows along one axis.
///
/// The last window may not start inside the trailing padding; if it would, it is dropped.
fn pooled_extent(dim: usize, kernel: usize, stride: usize, pad: usize) -> usize {
    let mut pooled = (dim + 2 * pad - kernel) / stride + 1;
    if pad > 0 && (pooled - 1) * stride >= dim + pad {
        pooled -= 1;
    }
    pooled
}

/// Clipped `[start, end)` bounds of window `index` along one axis.
fn axis_bounds(
    index: usize,
    stride: usize,
    pad: usize,
    kernel: usize,
    dim: usize,
) -> (usize, usize) {
    let start = (index * stride) as isize - pad as isize;
    let end = (start + kernel as isize).min((dim + pad) as isize);
    (start.max(0) as usize, end.min(dim as isize) as usize)
}

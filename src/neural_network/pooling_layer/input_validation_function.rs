use crate::error::PoolingError;

/// Validates that the input shape is 4-dimensional: `[batch_size, channels, height, width]`.
///
/// # Errors
///
/// Returns `PoolingError::ShapeMismatchError` if the shape length is not 4.
pub fn validate_input_shape_dims(input_shape: &[usize], context: &str) -> Result<(), PoolingError> {
    if input_shape.len() != 4 {
        return Err(PoolingError::ShapeMismatchError(format!(
            "{} must be 4-dimensional: [batch_size, channels, height, width], got {:?}",
            context, input_shape
        )));
    }
    Ok(())
}

/// Validates that the spatial extents of the input are greater than zero.
///
/// # Errors
///
/// Returns `PoolingError::ShapeMismatchError` if height or width is 0.
pub fn validate_spatial_dims_positive(height: usize, width: usize) -> Result<(), PoolingError> {
    if height == 0 || width == 0 {
        return Err(PoolingError::ShapeMismatchError(format!(
            "Input height and width must be greater than zero. Got: ({}, {})",
            height, width
        )));
    }
    Ok(())
}

/// Validates kernel size for 2D pooling.
///
/// # Errors
///
/// Returns `PoolingError::ConfigurationError` if any dimension is 0.
pub fn validate_kernel_size_2d(kernel_size: (usize, usize)) -> Result<(), PoolingError> {
    if kernel_size.0 == 0 || kernel_size.1 == 0 {
        return Err(PoolingError::ConfigurationError(
            "Kernel size must be greater than zero in all dimensions".to_string(),
        ));
    }
    Ok(())
}

/// Validates strides for 2D pooling.
///
/// # Errors
///
/// Returns `PoolingError::ConfigurationError` if any stride is 0.
pub fn validate_strides_2d(strides: (usize, usize)) -> Result<(), PoolingError> {
    if strides.0 == 0 || strides.1 == 0 {
        return Err(PoolingError::ConfigurationError(
            "Strides must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Validates that padding is strictly smaller than the kernel on each axis.
///
/// # Errors
///
/// Returns `PoolingError::ConfigurationError` if `pad >= kernel` on either axis.
pub fn validate_padding_2d(
    padding: (usize, usize),
    kernel_size: (usize, usize),
) -> Result<(), PoolingError> {
    if padding.0 >= kernel_size.0 || padding.1 >= kernel_size.1 {
        return Err(PoolingError::ConfigurationError(format!(
            "Padding {:?} must be smaller than kernel size {:?}",
            padding, kernel_size
        )));
    }
    Ok(())
}

/// Validates that a kernel fits in the padded input along one axis.
///
/// # Errors
///
/// Returns `PoolingError::ConfigurationError` if `kernel > dim + 2 * pad`.
pub fn validate_kernel_fits(
    kernel: usize,
    dim: usize,
    pad: usize,
    axis: &str,
) -> Result<(), PoolingError> {
    if kernel > dim + 2 * pad {
        return Err(PoolingError::ConfigurationError(format!(
            "kernel larger than padded input: kernel {} ({}) exceeds {} + 2 * {}",
            kernel, axis, dim, pad
        )));
    }
    Ok(())
}

use super::*;
use crate::traits::Layer;

#[test]
fn pooling_2d_forward_backward_test() {
    let x = generate_data(2, 3, 6, 6);
    let config = PoolConfig::new(PoolMethod::Max, (2, 2), Some((2, 2)), None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();

    assert_eq!(pool_layer.output_shape(), "Unknown");

    let output = pool_layer.forward(&x).unwrap();
    assert_eq!(output.shape(), &[2, 3, 3, 3]);
    assert_eq!(pool_layer.output_shape(), "(2, 3, 3, 3)");
    assert_eq!(pool_layer.layer_type(), "Pooling2D");

    // For input region [[0,0], [0,1], [1,0], [1,1]], the max value is at [1,1]
    assert_eq!(output[[0, 0, 0, 0]], x[[0, 0, 1, 1]]);

    let grad_output = Tensor::ones(output.raw_dim());
    let grad_input = pool_layer.backward(&grad_output).unwrap();
    assert_eq!(grad_input.shape(), x.shape());

    // Output size is 2x3x3x3=54 elements, so there should be 54 non-zero gradients
    let nonzero_count = grad_input.iter().filter(|&&g| g > 0.0).count();
    assert_eq!(nonzero_count, 54);
}

#[test]
fn pooling_2d_backward_without_forward_test() {
    let config = PoolConfig::new(PoolMethod::Average, (2, 2), None, None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();

    let grad_output = Tensor::ones(IxDyn(&[1, 1, 2, 2]));
    let result = pool_layer.backward(&grad_output);

    assert!(matches!(result, Err(PoolingError::UnpairedBackwardError(_))));
}

#[test]
fn pooling_2d_introspection_test() {
    let config = PoolConfig::new(PoolMethod::Average, (3, 2), Some((2, 1)), Some((1, 0))).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();

    assert_eq!(pool_layer.pooling_type(), "AVE");
    assert_eq!((pool_layer.kernel_height(), pool_layer.kernel_width()), (3, 2));
    assert_eq!((pool_layer.stride_height(), pool_layer.stride_width()), (2, 1));
    assert_eq!((pool_layer.pad_height(), pool_layer.pad_width()), (1, 0));
    assert_eq!(pool_layer.channels(), None);
    assert!(pool_layer.input_shape().is_empty());
    assert_eq!(pool_layer.output_shape_dims(), None);

    pool_layer.reshape(&[4, 5, 7, 6]).unwrap();
    assert_eq!(pool_layer.channels(), Some(5));
    assert_eq!(pool_layer.input_shape(), &[4, 5, 7, 6]);
    // (7 + 2 - 3) / 2 + 1 = 4, (6 - 2) / 1 + 1 = 5
    assert_eq!(pool_layer.output_shape_dims(), Some([4, 5, 4, 5]));
}

#[test]
fn pooling_2d_global_reshape_test() {
    let mut pool_layer = Pooling2D::new(PoolConfig::global(PoolMethod::Max)).unwrap();

    let first = pool_layer.forward(&generate_data(1, 2, 5, 3)).unwrap();
    assert_eq!(first.shape(), &[1, 2, 1, 1]);
    assert_eq!((pool_layer.kernel_height(), pool_layer.kernel_width()), (5, 3));
    assert_eq!(first[[0, 1, 0, 0]], 100.0 + 42.0);

    // A new spatial extent resolves a new kernel
    let second = pool_layer.forward(&generate_data(2, 2, 8, 9)).unwrap();
    assert_eq!(second.shape(), &[2, 2, 1, 1]);
    assert_eq!((pool_layer.kernel_height(), pool_layer.kernel_width()), (8, 9));
    assert_eq!(pool_layer.output_shape(), "(2, 2, 1, 1)");

    let grad_input = pool_layer.backward(&Tensor::ones(second.raw_dim())).unwrap();
    assert_eq!(grad_input.shape(), &[2, 2, 8, 9]);
    assert_eq!(grad_input[[1, 1, 7, 8]], 1.0);
    assert_eq!(grad_input.sum(), 4.0);
}

#[test]
fn pooling_2d_mask_test() {
    let config = PoolConfig::new(PoolMethod::Max, (2, 2), None, None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();
    assert!(pool_layer.mask().is_none());

    pool_layer.forward(&quadrant_input()).unwrap();
    let mask = pool_layer.mask().unwrap();
    assert_eq!(mask.shape(), &[1, 1, 2, 2]);
    assert_eq!(mask[[0, 0, 0, 1]], 6.0);
    assert_eq!(mask[[0, 0, 1, 0]], 8.0);

    let average_config = PoolConfig::new(PoolMethod::Average, (2, 2), None, None).unwrap();
    let mut average_layer = Pooling2D::new(average_config).unwrap();
    average_layer.forward(&quadrant_input()).unwrap();
    assert!(average_layer.mask().is_none());
}

#[test]
fn pooling_2d_training_mode_test() {
    let x = generate_data(2, 2, 4, 4).mapv(|v| (v % 5.0) + 1.0);
    let config = PoolConfig::new(PoolMethod::Stochastic, (2, 2), None, None).unwrap();

    let mut first = Pooling2D::new(config).unwrap().with_seed(7);
    let mut second = Pooling2D::new(config).unwrap().with_seed(7);
    assert!(first.is_training());
    assert_eq!(first.forward(&x).unwrap(), second.forward(&x).unwrap());

    first.set_training_if_mode_dependent(false);
    assert!(!first.is_training());
    let inference = first.forward(&x).unwrap();
    assert_eq!(inference, first.forward(&x).unwrap());

    // Inference mode records no samples to route gradients through
    let result = first.backward(&Tensor::ones(inference.raw_dim()));
    assert!(matches!(result, Err(PoolingError::UnpairedBackwardError(_))));
}

#[test]
fn pooling_2d_gradient_shape_mismatch_test() {
    let config = PoolConfig::new(PoolMethod::Max, (2, 2), None, None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();
    pool_layer.forward(&generate_data(1, 1, 4, 4)).unwrap();

    let result = pool_layer.backward(&Tensor::ones(IxDyn(&[1, 1, 3, 3])));
    assert!(matches!(result, Err(PoolingError::ShapeMismatchError(_))));
}

#[test]
fn pooling_2d_failed_forward_discards_previous_map_test() {
    let config = PoolConfig::new(PoolMethod::Max, (3, 3), None, None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();

    pool_layer.forward(&generate_data(1, 1, 6, 6)).unwrap();
    assert!(pool_layer.index_map().is_some());

    let failed = pool_layer.forward(&generate_data(1, 1, 2, 2));
    assert!(matches!(failed, Err(PoolingError::ConfigurationError(_))));
    assert!(pool_layer.index_map().is_none());
    assert!(pool_layer.input_shape().is_empty());
    assert_eq!(pool_layer.output_shape_dims(), None);

    let result = pool_layer.backward(&Tensor::ones(IxDyn(&[1, 1, 2, 2])));
    assert!(matches!(result, Err(PoolingError::UnpairedBackwardError(_))));
}

#[test]
fn pooling_2d_reshape_discards_previous_map_test() {
    let config = PoolConfig::new(PoolMethod::Average, (2, 2), None, None).unwrap();
    let mut pool_layer = Pooling2D::new(config).unwrap();

    let output = pool_layer.forward(&generate_data(1, 2, 4, 4)).unwrap();

    // Same shape keeps the pairing
    pool_layer.reshape(&[1, 2, 4, 4]).unwrap();
    assert!(pool_layer.backward(&Tensor::ones(output.raw_dim())).is_ok());

    pool_layer.reshape(&[1, 2, 6, 6]).unwrap();
    let result = pool_layer.backward(&Tensor::ones(IxDyn(&[1, 2, 3, 3])));
    assert!(matches!(result, Err(PoolingError::UnpairedBackwardError(_))));

    // A rejected shape also leaves nothing to pair with
    assert!(pool_layer.reshape(&[1, 2, 6]).is_err());
    assert_eq!(pool_layer.channels(), None);
}

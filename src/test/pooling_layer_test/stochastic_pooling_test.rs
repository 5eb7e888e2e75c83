use super::*;

fn stochastic_config() -> PoolConfig {
    PoolConfig::new(PoolMethod::Stochastic, (2, 2), None, None).unwrap()
}

#[test]
fn stochastic_pooling_inference_expectation_test() {
    let x = Tensor::from_shape_vec(
        IxDyn(&[1, 1, 2, 6]),
        vec![
            1.0, 2.0, 0.0, 0.0, -1.0, -3.0, //
            3.0, 0.0, 0.0, 0.0, -2.0, -6.0,
        ],
    )
    .unwrap();

    let (output, index_map) =
        pool_forward(&x, &stochastic_config(), PoolMode::Inference, &mut seeded_rng()).unwrap();
    assert_eq!(output.shape(), &[1, 1, 1, 3]);
    assert!(index_map.indices().is_none());

    // (1 + 4 + 9) / (1 + 2 + 3)
    assert_relative_eq!(output[[0, 0, 0, 0]], 14.0 / 6.0);
    // No positive weight: plain mean
    assert_relative_eq!(output[[0, 0, 0, 1]], 0.0);
    assert_relative_eq!(output[[0, 0, 0, 2]], -3.0);
}

#[test]
fn stochastic_pooling_inference_is_deterministic_test() {
    let x = generate_data(3, 4, 6, 6).mapv(|v| (v % 13.0) - 4.0);
    let config = stochastic_config();

    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(2);
    let (first, _) = pool_forward(&x, &config, PoolMode::Inference, &mut rng_a).unwrap();
    let (second, _) = pool_forward(&x, &config, PoolMode::Inference, &mut rng_b).unwrap();

    assert_eq!(first, second);
}

#[test]
fn stochastic_pooling_training_is_reproducible_test() {
    let x = generate_data(4, 8, 6, 6).mapv(|v| (v % 11.0) + 0.5);
    let config = stochastic_config();

    let (first, first_map) =
        pool_forward(&x, &config, PoolMode::Training, &mut seeded_rng()).unwrap();
    let (second, second_map) =
        pool_forward(&x, &config, PoolMode::Training, &mut seeded_rng()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_map, second_map);
}

#[test]
fn stochastic_pooling_training_samples_inside_window_test() {
    let x = generate_data(2, 3, 6, 6).mapv(|v| (v % 7.0) - 2.0);
    let config = stochastic_config();

    let (output, index_map) =
        pool_forward(&x, &config, PoolMode::Training, &mut seeded_rng()).unwrap();
    let indices = index_map.indices().unwrap();

    for b in 0..2 {
        for c in 0..3 {
            for ph in 0..3 {
                for pw in 0..3 {
                    let idx = indices[[b, c, ph, pw]];
                    let (h, w) = (idx / 6, idx % 6);
                    assert!(h / 2 == ph && w / 2 == pw);
                    assert_eq!(output[[b, c, ph, pw]], x[[b, c, h, w]]);

                    // A positive activation in the window means a positive one was sampled
                    let window_has_positive = (0..2)
                        .any(|i| (0..2).any(|j| x[[b, c, ph * 2 + i, pw * 2 + j]] > 0.0));
                    if window_has_positive {
                        assert!(output[[b, c, ph, pw]] > 0.0);
                    }
                }
            }
        }
    }
}

#[test]
fn stochastic_pooling_single_positive_is_always_selected_test() {
    let mut x = Tensor::zeros(IxDyn(&[1, 1, 2, 2]));
    x[[0, 0, 1, 0]] = 5.0;
    let config = stochastic_config();

    let mut rng = seeded_rng();
    for _ in 0..50 {
        let (output, index_map) = pool_forward(&x, &config, PoolMode::Training, &mut rng).unwrap();
        assert_eq!(output[[0, 0, 0, 0]], 5.0);
        assert_eq!(index_map.indices().unwrap()[[0, 0, 0, 0]], 2);
    }
}

#[test]
fn stochastic_pooling_sampling_frequency_test() {
    // Windows [1, 3]: the 3 should be drawn about three times out of four
    let width = 4000;
    let x = Tensor::from_shape_fn(IxDyn(&[1, 1, 1, width]), |idx| {
        if idx[3] % 2 == 0 { 1.0 } else { 3.0 }
    });
    let config = PoolConfig::new(PoolMethod::Stochastic, (1, 2), None, None).unwrap();

    let (output, _) = pool_forward(&x, &config, PoolMode::Training, &mut seeded_rng()).unwrap();
    let picked_three = output.iter().filter(|&&v| v == 3.0).count();
    let ratio = picked_three as f32 / (width / 2) as f32;

    assert!(ratio > 0.7 && ratio < 0.8, "ratio was {}", ratio);
}

#[test]
fn stochastic_pooling_backward_routes_to_sample_test() {
    let x = generate_data(2, 2, 4, 4).mapv(|v| (v % 9.0) + 1.0);
    let config = stochastic_config();

    let (output, index_map) =
        pool_forward(&x, &config, PoolMode::Training, &mut seeded_rng()).unwrap();
    let grad_output = output.mapv(|v| v * 0.5);
    let grad_input = pool_backward(&grad_output, &index_map, x.shape(), &config).unwrap();

    let indices = index_map.indices().unwrap();
    for b in 0..2 {
        for c in 0..2 {
            for ph in 0..2 {
                for pw in 0..2 {
                    let idx = indices[[b, c, ph, pw]];
                    assert_eq!(grad_input[[b, c, idx / 4, idx % 4]], grad_output[[b, c, ph, pw]]);
                }
            }
        }
    }
    assert_relative_eq!(grad_input.sum(), grad_output.sum(), epsilon = 1e-4);
}

#[test]
fn stochastic_pooling_inference_has_no_backward_test() {
    let x = generate_data(1, 1, 4, 4);
    let config = stochastic_config();

    let (output, index_map) =
        pool_forward(&x, &config, PoolMode::Inference, &mut seeded_rng()).unwrap();
    let grad_output = Tensor::ones(output.raw_dim());
    let result = pool_backward(&grad_output, &index_map, x.shape(), &config);

    assert!(matches!(result, Err(PoolingError::UnpairedBackwardError(_))));
}

#[test]
fn stochastic_pooling_rejects_padding_test() {
    let result = PoolConfig::new(PoolMethod::Stochastic, (2, 2), None, Some((1, 1)));
    assert!(matches!(result, Err(PoolingError::ConfigurationError(_))));
}

#[test]
fn stochastic_pooling_draw_thresholds_test() {
    let thresholds = stochastic_pooling::draw_thresholds(&mut seeded_rng(), (2, 3, 4, 5));
    assert_eq!(thresholds.dim(), (2, 3, 4, 5));
    assert!(thresholds.iter().all(|&u| (0.0..1.0).contains(&u)));

    let again = stochastic_pooling::draw_thresholds(&mut seeded_rng(), (2, 3, 4, 5));
    assert_eq!(thresholds, again);
}

//! End-to-end checks of the finite-difference training step and the
//! checkpoint resume flow, using only the public API.

use std::sync::mpsc;

use approx::assert_abs_diff_eq;
use fdnet::network::GRADIENT_STEP;
use fdnet::{DataPoint, Network, RunConfig, StepStats, TrainConfig, train_loop};
use tempfile::tempdir;

fn two_point_dataset() -> Vec<DataPoint> {
    vec![
        DataPoint::new(vec![1.0, 0.0], 0, 1).unwrap(),
        DataPoint::with_expected_outputs(vec![0.0, 1.0], 0, 1, vec![0.0]),
    ]
}

fn fixed_network() -> Network {
    let mut net = Network::new(&[2, 3, 1]).unwrap();
    net.layers[0]
        .set_weights(vec![vec![0.2, -0.4, 0.7], vec![-0.3, 0.5, 0.1]])
        .unwrap();
    net.layers[0].set_biases(vec![0.05, -0.1, 0.2]).unwrap();
    net.layers[1].set_weights(vec![vec![0.6], vec![-0.8], vec![0.3]]).unwrap();
    net.layers[1].set_biases(vec![-0.25]).unwrap();
    net
}

/// Forward-difference gradients computed independently through the public
/// setters: `(layer, weight gradients, bias gradients)`.
fn expected_gradients(net: &Network, data: &[DataPoint]) -> Vec<(Vec<Vec<f64>>, Vec<f64>)> {
    let h = GRADIENT_STEP;
    let base = net.cost_multiple(data).unwrap();
    let mut all = Vec::new();
    for l in 0..net.layers.len() {
        let layer = &net.layers[l];
        let mut w_grads = vec![vec![0.0; layer.num_nodes_out()]; layer.num_nodes_in()];
        for i in 0..layer.num_nodes_in() {
            for j in 0..layer.num_nodes_out() {
                let mut probe = net.clone();
                let mut w = probe.layers[l].weights().data.clone();
                w[i][j] += h;
                probe.layers[l].set_weights(w).unwrap();
                w_grads[i][j] = (probe.cost_multiple(data).unwrap() - base) / h;
            }
        }
        let mut b_grads = vec![0.0; layer.num_nodes_out()];
        for j in 0..layer.num_nodes_out() {
            let mut probe = net.clone();
            let mut b = probe.layers[l].biases().to_vec();
            b[j] += h;
            probe.layers[l].set_biases(b).unwrap();
            b_grads[j] = (probe.cost_multiple(data).unwrap() - base) / h;
        }
        all.push((w_grads, b_grads));
    }
    all
}

#[test]
fn one_step_moves_every_parameter_by_rate_times_gradient() {
    let data = two_point_dataset();
    let learn_rate = 0.1;
    let before = fixed_network();
    let grads = expected_gradients(&before, &data);
    let cost_before = before.cost_multiple(&data).unwrap();
    assert!(cost_before.is_finite());

    let mut net = before.clone();
    net.learn(&data, learn_rate).unwrap();

    let cost_after = net.cost_multiple(&data).unwrap();
    assert!(cost_after.is_finite());

    for (l, (w_grads, b_grads)) in grads.iter().enumerate() {
        let (old, new) = (&before.layers[l], &net.layers[l]);
        for i in 0..old.num_nodes_in() {
            for j in 0..old.num_nodes_out() {
                assert_abs_diff_eq!(new.cost_gradients_w().data[i][j], w_grads[i][j], epsilon = 1e-9);
                assert_abs_diff_eq!(
                    new.weights().data[i][j],
                    old.weights().data[i][j] - learn_rate * w_grads[i][j],
                    epsilon = 1e-12
                );
            }
        }
        for j in 0..old.num_nodes_out() {
            assert_abs_diff_eq!(new.cost_gradients_b()[j], b_grads[j], epsilon = 1e-9);
            assert_abs_diff_eq!(new.biases()[j], old.biases()[j] - learn_rate * b_grads[j], epsilon = 1e-12);
        }
    }
}

#[test]
fn identical_starts_give_identical_steps() {
    let data = two_point_dataset();
    let mut a = fixed_network();
    let mut b = fixed_network();
    for _ in 0..5 {
        a.learn(&data, 0.3).unwrap();
        b.learn(&data, 0.3).unwrap();
    }
    for (la, lb) in a.layers.iter().zip(b.layers.iter()) {
        assert_eq!(la.weights(), lb.weights());
        assert_eq!(la.biases(), lb.biases());
    }
}

#[test]
fn zero_rate_step_estimates_but_does_not_move() {
    let data = two_point_dataset();
    let before = fixed_network();
    let mut net = before.clone();
    net.learn(&data, 0.0).unwrap();
    for (new, old) in net.layers.iter().zip(before.layers.iter()) {
        assert_eq!(new.weights(), old.weights());
        assert_eq!(new.biases(), old.biases());
    }
    assert!(net.layers[1].cost_gradients_b()[0] != 0.0);
}

#[test]
fn training_resumes_from_the_best_checkpoint() {
    let dir = tempdir().unwrap();
    let config = RunConfig {
        checkpoint_path: dir.path().join("train.json"),
        layer_sizes: vec![2, 3, 2],
        positive_samples: 5,
        negative_samples: 10,
        learn_rate: 0.05,
        ..RunConfig::default()
    };

    let first = config.prepare().unwrap();
    assert!(!first.restored);
    let mut net = first.network;
    let data = first.data;

    let (tx, rx) = mpsc::channel();
    let mut train_config = TrainConfig::new(config.learn_rate, Some(4));
    train_config.progress_tx = Some(tx);
    let last = train_loop(&mut net, &data, &first.store, &train_config).unwrap().unwrap();
    drop(train_config);
    let steps: Vec<StepStats> = rx.iter().collect();
    assert_eq!(last.step, 4);
    assert_eq!(steps.len(), 4);

    // (cost written, lowest cost held by the snapshot) of the last save
    let mut last_save = None;
    let mut lowest_before = 1.0;
    for s in &steps {
        if s.saved {
            last_save = Some((s.cost, lowest_before));
        }
        lowest_before = s.lowest_cost;
    }

    let second = config.prepare().unwrap();
    assert_eq!(second.data, data);
    assert_eq!(second.restored, last_save.is_some());
    assert_eq!(second.network.layer_sizes(), vec![2, 3, 2]);

    if let Some((best, stored_lowest)) = last_save {
        assert_eq!(net.lowest_cost(), best);
        assert_abs_diff_eq!(second.network.lowest_cost(), stored_lowest, epsilon = 1e-15);
        assert!(second.network.lowest_cost() > best);
        let restored_cost = second.network.cost_multiple(&second.data).unwrap();
        assert_abs_diff_eq!(restored_cost, best, epsilon = 1e-12);
    }
}

#[test]
fn empty_dataset_is_an_error_everywhere() {
    let mut net = fixed_network();
    assert!(matches!(net.cost_multiple(&[]), Err(fdnet::Error::EmptyDataset)));
    assert!(matches!(net.learn(&[], 0.1), Err(fdnet::Error::EmptyDataset)));
}

//! Unit tests for parameter layout: arena windows, machine offsets, and
//! aliasing semantics.
//!
//! These tests verify:
//! - The arena size formula over arbitrary layer sequences
//! - Machine offset tuples and total sizes
//! - Boundary-bias sharing between adjacent machines
//! - Deep clones breaking aliasing where plain copies share it
//! - Checked accesses rejecting out-of-window indices

use deepbelief::{DbnError, DeepBeliefNet, Layer, Rbm, UnitKind, WeightArena};
use ndarray::array;

fn binary_layers(sizes: &[usize]) -> Vec<Layer> {
    sizes
        .iter()
        .map(|&s| Layer::new(s, UnitKind::Binary))
        .collect()
}

#[test]
fn test_arena_size_formula() {
    // s0 + sum(s_i * s_{i+1} + s_{i+1}) over consecutive pairs
    for sizes in [
        vec![4, 3],
        vec![4, 3, 2],
        vec![10, 7, 5, 2],
        vec![1, 1, 1, 1, 1],
    ] {
        let expected: usize = sizes[0]
            + sizes
                .windows(2)
                .map(|pair| pair[0] * pair[1] + pair[1])
                .sum::<usize>();
        let layers = binary_layers(&sizes);
        assert_eq!(
            DeepBeliefNet::compute_data_size(&layers),
            expected,
            "sizes {:?}",
            sizes
        );

        let dbn = DeepBeliefNet::new(layers).expect("network");
        assert_eq!(dbn.data().len(), expected);
    }
}

#[test]
fn test_rbm_offsets_property() {
    let m = 5;
    let n = 3;
    let rbm = Rbm::new(
        Layer::new(m, UnitKind::Binary),
        Layer::new(n, UnitKind::Gaussian),
    );
    assert_eq!(rbm.offsets(), (0, m, m + m * n, m + m * n + n));
    assert_eq!(rbm.total_size(), m + m * n + n);
}

#[test]
fn test_stack_overlaps_boundary_biases() {
    let dbn = DeepBeliefNet::new(binary_layers(&[4, 3, 2])).expect("network");

    // Machine windows overlap: the second machine starts at the first
    // machine's hidden-bias offset.
    let first = &dbn.rbms()[0];
    let second = &dbn.rbms()[1];
    assert_eq!(second.data().offset(), first.relative_offset_c());

    // Writing the boundary bias through one view is visible through the other.
    let mut first = first.clone();
    first.set_c(&array![1.5, 2.5, 3.5]).expect("shape");
    assert_eq!(dbn.rbms()[1].get_b(), array![1.5, 2.5, 3.5]);
}

#[test]
fn test_rbm_deep_clone_vs_shallow_copy() {
    let mut rbm = Rbm::new(
        Layer::new(2, UnitKind::Binary),
        Layer::new(2, UnitKind::Binary),
    );
    rbm.set_w(&array![[0.1, 0.2], [0.3, 0.4]]).expect("shape");

    let data = array![[1.0, 0.0], [0.0, 1.0]];
    let cloned = rbm.deep_clone();
    assert_eq!(cloned.predict(&data), rbm.predict(&data));

    // Mutating the deep clone leaves the original's outputs untouched.
    let baseline = rbm.predict(&data);
    let mut cloned = cloned;
    cloned.set_w(&array![[9.0, 9.0], [9.0, 9.0]]).expect("shape");
    assert_eq!(rbm.predict(&data), baseline);

    // Mutating a plain copy changes the original's outputs.
    let mut shared = rbm.clone();
    shared.set_w(&array![[9.0, 9.0], [9.0, 9.0]]).expect("shape");
    assert_ne!(rbm.predict(&data), baseline);
}

#[test]
fn test_dbn_deep_clone_vs_shallow_copy() {
    let dbn = DeepBeliefNet::new(binary_layers(&[3, 2])).expect("network");
    let data = array![[1.0], [0.0], [1.0]];

    let deep = dbn.deep_clone().expect("clone");
    assert_eq!(deep.predict(&data), dbn.predict(&data));
    assert!(!deep.data().ptr_eq(dbn.data()));

    deep.data().fill(0.7);
    assert_eq!(dbn.data().to_vec(), vec![0.0; dbn.data().len()]);

    let shared = dbn.clone();
    assert!(shared.data().ptr_eq(dbn.data()));
    shared.data().fill(0.7);
    assert_eq!(dbn.data().to_vec(), vec![0.7; dbn.data().len()]);
}

#[test]
fn test_checked_arena_access() {
    let arena = WeightArena::allocate(3);
    assert!(arena.at(2).is_ok());
    assert!(matches!(arena.at(3), Err(DbnError::OutOfRange(_))));

    let view = arena.slice(1, 2).expect("window fits");
    assert!(matches!(view.at(2), Err(DbnError::OutOfRange(_))));
    assert!(matches!(view.slice(1, 2), Err(DbnError::OutOfRange(_))));
}

#[test]
fn test_rbm_view_too_short() {
    let arena = WeightArena::allocate(5);
    let result = Rbm::with_arena(
        Layer::new(3, UnitKind::Binary),
        Layer::new(2, UnitKind::Binary),
        &arena,
        false,
    );
    assert!(matches!(result, Err(DbnError::OutOfRange(_))));
}

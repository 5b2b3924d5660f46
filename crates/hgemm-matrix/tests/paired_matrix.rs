//! Fixture behaviour on the host-simulated device.
//!
//! These tests drive `PairedMatrix` the way a benchmark driver does: build
//! operands, let a "kernel" write the device copy, pull it back, compare.

use hgemm_common::{HarnessConfig, HgemmError, MatrixError};
use hgemm_matrix::{DiffStats, HostDevice, MatrixSpec, PairedMatrix, ValueRange, f16};
use std::sync::Arc;

fn device() -> Arc<HostDevice> {
    Arc::new(HostDevice::new())
}

fn matrix(dev: &Arc<HostDevice>, rows: usize, cols: usize, name: &str) -> PairedMatrix {
    PairedMatrix::new(dev, MatrixSpec::new(rows, cols).unwrap().with_name(name)).unwrap()
}

fn constant(value: f32) -> ValueRange {
    ValueRange::constant(value).unwrap()
}

#[test]
fn zero_range_matches_zeros() {
    let dev = device();
    let mut a = matrix(&dev, 4, 4, "A");
    let mut b = matrix(&dev, 4, 4, "B");

    a.random(constant(0.0)).unwrap();
    b.zeros().unwrap();

    assert!(a.host().iter().all(|v| v.to_f32() == 0.0));
    assert!(b.host().iter().all(|v| v.to_f32() == 0.0));

    let stats = a.check_value(&b).unwrap();
    assert_eq!(stats, DiffStats { max_diff: 0.0, avg_diff: 0.0 });
    assert_eq!(a.diff_stats(), Some(stats));
}

#[test]
fn constant_ranges_differ_by_one() {
    let dev = device();
    let mut c = matrix(&dev, 2, 2, "C");
    let mut d = matrix(&dev, 2, 2, "D");

    c.random(constant(1.0)).unwrap();
    d.random(constant(2.0)).unwrap();
    assert!(c.host().iter().all(|&v| v == f16::ONE));
    assert!(d.host().iter().all(|&v| v == f16::from_f32(2.0)));

    let stats = c.check_value(&d).unwrap();
    assert_eq!(stats.max_diff, 1.0);
    assert_eq!(stats.avg_diff, 1.0);
}

#[test]
fn construction_round_trip_is_identity() {
    let mut m = matrix(&device(), 5, 3, "M");
    let before = m.host().to_vec();
    m.move_to_host().unwrap();
    assert_eq!(m.host(), &before[..]);
}

#[test]
fn default_fill_is_in_default_range() {
    let m = matrix(&device(), 32, 32, "M");
    // f16 rounding can land on the exclusive upper bound
    assert!(m.host().iter().all(|v| (-2.0..=2.0).contains(&v.to_f32())));
}

#[test]
fn zeros_clears_both_copies() {
    let mut m = matrix(&device(), 3, 3, "M");
    m.zeros().unwrap();
    assert!(m.host().iter().all(|v| v.to_bits() == 0));
    assert!(m.device_buffer().as_slice().iter().all(|v| v.to_bits() == 0));
}

#[test]
fn tear_up_seeds_device_only() {
    let dev = device();
    let mut base = matrix(&dev, 2, 3, "base");
    let mut target = matrix(&dev, 2, 3, "target");
    base.random(constant(1.5)).unwrap();
    target.zeros().unwrap();

    target.tear_up(&base).unwrap();
    assert!(target.host().iter().all(|v| v.to_f32() == 0.0));
    assert_eq!(target.device_buffer().as_slice(), base.host());

    target.move_to_host().unwrap();
    assert_eq!(target.check_value(&base).unwrap().max_diff, 0.0);
}

#[test]
fn tear_up_broadcasts_one_input_to_many() {
    let dev = device();
    let a = matrix(&dev, 8, 8, "A");
    let mut candidates: Vec<_> = (0..3).map(|i| matrix(&dev, 8, 8, &format!("A{i}"))).collect();
    for c in &mut candidates {
        c.tear_up(&a).unwrap();
        c.move_to_host().unwrap();
        assert_eq!(c.host(), a.host());
    }
}

#[test]
fn tear_up_rejects_shape_mismatch() {
    let dev = device();
    let base = matrix(&dev, 4, 4, "base");
    let mut target = matrix(&dev, 4, 2, "target");
    let before = target.device_buffer().as_slice().to_vec();

    let err = target.tear_up(&base).unwrap_err();
    match err {
        HgemmError::Matrix(MatrixError::ShapeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, (4, 2));
            assert_eq!(actual, (4, 4));
        }
        other => panic!("expected ShapeMismatch, got: {other}"),
    }
    assert_eq!(target.device_buffer().as_slice(), &before[..]);
}

#[test]
fn check_value_rejects_transposed_shape() {
    let dev = device();
    let mut a = matrix(&dev, 2, 8, "A");
    let b = matrix(&dev, 8, 2, "B");
    assert!(matches!(
        a.check_value(&b),
        Err(HgemmError::Matrix(MatrixError::ShapeMismatch { .. }))
    ));
    assert!(a.diff_stats().is_none());
}

#[test]
fn check_value_reads_host_copies_only() {
    let dev = device();
    let mut result = matrix(&dev, 2, 2, "C");
    let mut reference = matrix(&dev, 2, 2, "C_ref");
    result.zeros().unwrap();
    reference.zeros().unwrap();

    // kernel writes the device copy; the host copy is stale until pulled
    result.device_buffer_mut().as_mut_slice().fill(f16::from_f32(0.25));
    assert_eq!(result.check_value(&reference).unwrap().max_diff, 0.0);

    result.move_to_host().unwrap();
    let stats = result.check_value(&reference).unwrap();
    assert_eq!(stats.max_diff, 0.25);
    assert_eq!(stats.avg_diff, 0.25);
}

#[test]
fn constant_offset_is_reported() {
    let dev = device();
    let spec = MatrixSpec::new(16, 16).unwrap().with_range(ValueRange::new(-1.0, 1.0).unwrap());
    let mut base = PairedMatrix::new(&dev, spec.clone().with_name("base")).unwrap();
    let mut shifted = PairedMatrix::new(&dev, spec.with_name("shifted")).unwrap();

    let delta = 0.5f32;
    let src = base.host().to_vec();
    for (dst, v) in shifted.host_mut().iter_mut().zip(&src) {
        *dst = f16::from_f32(v.to_f32() + delta);
    }
    shifted.push_to_device().unwrap();

    let stats = shifted.check_value(&base).unwrap();
    // adding 0.5 to values in [-1, 1) rounds by at most half an ulp at 1.5
    let tol = 1e-3;
    assert!((stats.max_diff - delta as f64).abs() < tol, "{stats}");
    assert!((stats.avg_diff - delta as f64).abs() < tol, "{stats}");

    let mut copy = matrix(&dev, 16, 16, "copy");
    copy.tear_up(&base).unwrap();
    copy.move_to_host().unwrap();
    base.check_value(&copy).unwrap();
    assert_eq!(base.diff_stats().unwrap().max_diff, 0.0);
}

#[test]
fn seeded_matrices_are_reproducible() {
    let spec = MatrixSpec::new(6, 6).unwrap().with_seed(2023).with_name("A");
    let first = PairedMatrix::new(&device(), spec.clone()).unwrap();
    let second = PairedMatrix::new(&device(), spec).unwrap();
    assert_eq!(first.host(), second.host());
}

#[test]
fn from_config_applies_range_and_seed() {
    let cfg = HarnessConfig { min: 0.0, max: 0.25, seed: Some(11), ..HarnessConfig::default() };
    let dev = device();
    let a = PairedMatrix::from_config(&dev, 4, 4, "A", &cfg).unwrap();
    let b = PairedMatrix::from_config(&dev, 4, 4, "B", &cfg).unwrap();

    assert_eq!(a.name(), "A");
    assert_eq!(a.range(), ValueRange::new(0.0, 0.25).unwrap());
    assert!(a.host().iter().all(|v| (0.0..=0.25).contains(&v.to_f32())));
    assert!(b.host().iter().all(|v| (0.0..=0.25).contains(&v.to_f32())));
    // Shared seed, separate streams: A and B must not be the same operand.
    assert_ne!(a.host(), b.host());

    let a_again = PairedMatrix::from_config(&device(), 4, 4, "A", &cfg).unwrap();
    let b_again = PairedMatrix::from_config(&device(), 4, 4, "B", &cfg).unwrap();
    assert_eq!(a.host(), a_again.host());
    assert_eq!(b.host(), b_again.host());
}

#[test]
fn within_tolerance_from_config() {
    let cfg = HarnessConfig::default();
    let dev = device();
    let mut c = matrix(&dev, 2, 2, "C");
    let mut c_ref = matrix(&dev, 2, 2, "C_ref");
    c.random(constant(1.0)).unwrap();
    c_ref.random(constant(1.03125)).unwrap();
    assert!(c.check_value(&c_ref).unwrap().within(cfg.tolerance));
    c_ref.random(constant(1.5)).unwrap();
    assert!(!c.check_value(&c_ref).unwrap().within(cfg.tolerance));
}

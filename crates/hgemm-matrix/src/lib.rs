//! Half-precision matrix fixtures for hgemm benchmarking
//!
//! Each [`PairedMatrix`] keeps one f16 matrix in host memory and in device
//! memory. Benchmark drivers hand the device copy to the kernel under test,
//! pull the result back, and compare it against a reference with
//! [`PairedMatrix::check_value`].

pub mod compare;
pub mod device;
pub mod fill;
pub mod matrix;

pub use compare::DiffStats;
#[cfg(feature = "cuda")]
pub use device::CudaDevice;
pub use device::{Device, HostBuffer, HostDevice, check_backend};
pub use fill::{DEFAULT_MAX, DEFAULT_MIN, ValueRange, fill_uniform};
pub use matrix::{MatrixSpec, PairedMatrix};

pub use half::f16;

//! Accelerator memory backends.
//!
//! [`Device`] is the seam between [`PairedMatrix`](crate::PairedMatrix) and
//! the memory space that kernels under test read and write. Every operation
//! is blocking: when a call returns the copy or fill has completed.
//!
//! - [`HostDevice`]: device memory simulated in a separate host allocation.
//!   Always available.
//! - [`CudaDevice`]: NVIDIA GPU memory through `cudarc` (feature `cuda`).

mod host;
#[cfg(feature = "cuda")]
mod cuda;

pub use host::{HostBuffer, HostDevice};
#[cfg(feature = "cuda")]
pub use cuda::CudaDevice;

use half::f16;
use hgemm_common::{BackendKind, DeviceError, Result};

/// Memory operations a matrix fixture needs from an accelerator.
pub trait Device {
    /// Owned device allocation of `f16` elements.
    type Buffer;

    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Allocate `len` zero-initialised elements.
    fn alloc_zeros(&self, len: usize) -> Result<Self::Buffer>;

    /// Copy all of `src` into `dst`. Lengths must match.
    fn copy_htod(&self, src: &[f16], dst: &mut Self::Buffer) -> Result<()>;

    /// Copy all of `src` into `dst`. Lengths must match.
    fn copy_dtoh(&self, src: &Self::Buffer, dst: &mut [f16]) -> Result<()>;

    /// Set every element of `dst` to the all-zero bit pattern (`+0.0`).
    fn memset_zeros(&self, dst: &mut Self::Buffer) -> Result<()>;

    /// Number of elements in `buf`.
    fn buffer_len(&self, buf: &Self::Buffer) -> usize;

    /// Address of `buf` in the device address space, for logging.
    fn buffer_addr(&self, buf: &Self::Buffer) -> usize;
}

pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(DeviceError::LengthMismatch { expected, actual }.into());
    }
    Ok(())
}

/// Check that this build can provide the backend a config asks for.
///
/// Drivers call this before opening a device so that `backend = "cuda"` in a
/// build without the `cuda` feature fails with a clear error.
pub fn check_backend(kind: BackendKind) -> Result<()> {
    match kind {
        BackendKind::Host => Ok(()),
        BackendKind::Cuda if cfg!(feature = "cuda") => Ok(()),
        BackendKind::Cuda => Err(DeviceError::Unavailable {
            reason: "cuda backend requested but hgemm-matrix was built without the `cuda` feature"
                .into(),
        }
        .into()),
    }
}

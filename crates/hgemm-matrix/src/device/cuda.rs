//! CUDA device memory using cudarc 0.17
//!
//! All transfers run on the context's default stream and are followed by a
//! stream synchronize, so host code observes completed copies only.

use super::{Device, check_len};
use cudarc::driver::{CudaContext, CudaSlice, CudaStream, DevicePtr};
use half::f16;
use hgemm_common::{DeviceError, Result, TransferDirection};
use std::sync::Arc;

/// One CUDA device context and the stream every matrix operation uses.
pub struct CudaDevice {
    ordinal: usize,
    ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
}

impl CudaDevice {
    /// Create a context on the device with the given ordinal.
    pub fn new(ordinal: usize) -> Result<Self> {
        log::info!("Initializing CUDA device {}", ordinal);

        let ctx = CudaContext::new(ordinal).map_err(|e| DeviceError::Unavailable {
            reason: format!("failed to create CUDA context for device {ordinal}: {e:?}"),
        })?;
        let stream = ctx.default_stream();

        Ok(Self { ordinal, ctx, stream })
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn context(&self) -> &Arc<CudaContext> {
        &self.ctx
    }

    /// Stream that kernels under test should launch on so their writes are
    /// ordered with this device's copies.
    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    fn sync_after(&self, direction: TransferDirection) -> Result<()> {
        self.stream.synchronize().map_err(|e| DeviceError::Transfer {
            direction,
            reason: format!("stream synchronize failed: {e:?}"),
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for CudaDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaDevice").field("ordinal", &self.ordinal).finish_non_exhaustive()
    }
}

impl Device for CudaDevice {
    type Buffer = CudaSlice<f16>;

    fn name(&self) -> &'static str {
        "cuda"
    }

    fn alloc_zeros(&self, len: usize) -> Result<CudaSlice<f16>> {
        let buf = self
            .stream
            .alloc_zeros::<f16>(len)
            .map_err(|e| DeviceError::Alloc { elems: len, reason: format!("{e:?}") })?;
        self.stream.synchronize().map_err(|e| DeviceError::Alloc {
            elems: len,
            reason: format!("stream synchronize failed: {e:?}"),
        })?;
        Ok(buf)
    }

    fn copy_htod(&self, src: &[f16], dst: &mut CudaSlice<f16>) -> Result<()> {
        check_len(dst.len(), src.len())?;
        self.stream.memcpy_htod(src, dst).map_err(|e| DeviceError::Transfer {
            direction: TransferDirection::HostToDevice,
            reason: format!("{e:?}"),
        })?;
        self.sync_after(TransferDirection::HostToDevice)?;
        log::debug!("cuda:{}: copied {} elements host-to-device", self.ordinal, src.len());
        Ok(())
    }

    fn copy_dtoh(&self, src: &CudaSlice<f16>, dst: &mut [f16]) -> Result<()> {
        check_len(src.len(), dst.len())?;
        self.stream.memcpy_dtoh(src, dst).map_err(|e| DeviceError::Transfer {
            direction: TransferDirection::DeviceToHost,
            reason: format!("{e:?}"),
        })?;
        self.sync_after(TransferDirection::DeviceToHost)?;
        log::debug!("cuda:{}: copied {} elements device-to-host", self.ordinal, dst.len());
        Ok(())
    }

    fn memset_zeros(&self, dst: &mut CudaSlice<f16>) -> Result<()> {
        self.stream
            .memset_zeros(dst)
            .map_err(|e| DeviceError::Memset { reason: format!("{e:?}") })?;
        self.stream
            .synchronize()
            .map_err(|e| DeviceError::Memset { reason: format!("stream synchronize failed: {e:?}") })?;
        Ok(())
    }

    fn buffer_len(&self, buf: &CudaSlice<f16>) -> usize {
        buf.len()
    }

    fn buffer_addr(&self, buf: &CudaSlice<f16>) -> usize {
        let (ptr, _sync) = buf.device_ptr(&self.stream);
        ptr as usize
    }
}

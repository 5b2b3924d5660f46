use super::{Device, check_len};
use half::f16;
use hgemm_common::{DeviceError, Result};

/// Device memory simulated in host RAM.
///
/// Buffers are separate allocations from the matrix host copy, so the
/// explicit synchronisation contract of [`PairedMatrix`](crate::PairedMatrix)
/// holds exactly as it does on a real accelerator. CPU reference kernels
/// write into [`HostBuffer::as_mut_slice`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDevice;

/// A simulated device allocation.
#[derive(Debug)]
pub struct HostBuffer {
    data: Box<[f16]>,
}

impl HostBuffer {
    pub fn as_slice(&self) -> &[f16] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f16] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl HostDevice {
    pub fn new() -> Self {
        Self
    }
}

impl Device for HostDevice {
    type Buffer = HostBuffer;

    fn name(&self) -> &'static str {
        "host"
    }

    fn alloc_zeros(&self, len: usize) -> Result<HostBuffer> {
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| DeviceError::Alloc { elems: len, reason: e.to_string() })?;
        data.resize(len, f16::ZERO);
        Ok(HostBuffer { data: data.into_boxed_slice() })
    }

    fn copy_htod(&self, src: &[f16], dst: &mut HostBuffer) -> Result<()> {
        check_len(dst.len(), src.len())?;
        dst.data.copy_from_slice(src);
        log::debug!("host: copied {} elements host-to-device", src.len());
        Ok(())
    }

    fn copy_dtoh(&self, src: &HostBuffer, dst: &mut [f16]) -> Result<()> {
        check_len(src.len(), dst.len())?;
        dst.copy_from_slice(&src.data);
        log::debug!("host: copied {} elements device-to-host", dst.len());
        Ok(())
    }

    fn memset_zeros(&self, dst: &mut HostBuffer) -> Result<()> {
        dst.data.fill(f16::ZERO);
        Ok(())
    }

    fn buffer_len(&self, buf: &HostBuffer) -> usize {
        buf.len()
    }

    fn buffer_addr(&self, buf: &HostBuffer) -> usize {
        buf.data.as_ptr() as usize
    }
}

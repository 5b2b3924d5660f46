//! Host/device matrix pair used as a benchmark fixture.
//!
//! A [`PairedMatrix`] owns one half-precision matrix twice: a host copy the
//! harness can inspect and a device copy that kernels under test read and
//! write. The copies are never synchronised implicitly. Callers move data
//! with [`PairedMatrix::push_to_device`] and [`PairedMatrix::move_to_host`],
//! or with the fill operations that document their end state.
//!
//! ```
//! use hgemm_matrix::{HostDevice, MatrixSpec, PairedMatrix, ValueRange};
//! use std::sync::Arc;
//!
//! # fn main() -> hgemm_common::Result<()> {
//! let device = Arc::new(HostDevice::new());
//! let mut c = PairedMatrix::new(&device, MatrixSpec::new(2, 2)?.with_name("C"))?;
//! let mut c_ref = PairedMatrix::new(&device, MatrixSpec::new(2, 2)?.with_name("C_ref"))?;
//!
//! c.random(ValueRange::constant(1.0)?)?;
//! c_ref.random(ValueRange::constant(2.0)?)?;
//!
//! let stats = c.check_value(&c_ref)?;
//! assert_eq!(stats.max_diff, 1.0);
//! assert_eq!(stats.avg_diff, 1.0);
//! # Ok(())
//! # }
//! ```

use crate::compare::DiffStats;
use crate::device::{Device, HostDevice};
use crate::fill::{ValueRange, fill_uniform};
use half::f16;
use hgemm_common::{HarnessConfig, MatrixError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::Arc;

/// Shape and fill parameters for a new [`PairedMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSpec {
    rows: usize,
    cols: usize,
    name: String,
    range: ValueRange,
    seed: Option<u64>,
}

impl MatrixSpec {
    /// Validate a `rows x cols` shape. Both dimensions must be non-zero and
    /// their product must fit in `usize`.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        match rows.checked_mul(cols) {
            Some(n) if n > 0 => {}
            _ => return Err(MatrixError::InvalidShape { rows, cols }.into()),
        }
        Ok(Self {
            rows,
            cols,
            name: "Matrix".to_string(),
            range: ValueRange::default(),
            seed: None,
        })
    }

    /// Take the fill range and seed from a harness configuration. Matrices
    /// built from one config share the seed but draw from per-name streams.
    pub fn from_config(rows: usize, cols: usize, config: &HarnessConfig) -> Result<Self> {
        let mut spec = Self::new(rows, cols)?.with_range(ValueRange::new(config.min, config.max)?);
        spec.seed = config.seed;
        Ok(spec)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = range;
        self
    }

    /// Seed the matrix's generator for reproducible content.
    ///
    /// The matrix name selects the ChaCha stream, so a given `(seed, name)`
    /// pair always yields the same content and differently named matrices
    /// seeded alike draw independent values.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn elem_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// A half-precision matrix held in both host and device memory.
pub struct PairedMatrix<D: Device = HostDevice> {
    device: Arc<D>,
    rows: usize,
    cols: usize,
    elem_count: usize,
    name: String,
    range: ValueRange,
    host: Box<[f16]>,
    gpu: D::Buffer,
    rng: ChaCha8Rng,
    diff: Option<DiffStats>,
}

impl<D: Device> PairedMatrix<D> {
    /// Allocate both copies, fill the host copy from the requested range and
    /// push it to the device. On return host and device content are equal.
    pub fn new(device: &Arc<D>, spec: MatrixSpec) -> Result<Self> {
        let MatrixSpec { rows, cols, name, range, seed } = spec;
        let elem_count = rows * cols;

        let mut host = vec![f16::ZERO; elem_count].into_boxed_slice();
        let mut gpu = device.alloc_zeros(elem_count)?;

        let mut rng = match seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(stream_id(&name));
                rng
            }
            None => ChaCha8Rng::from_entropy(),
        };
        fill_uniform(&mut rng, range, &mut host);
        device.copy_htod(&host, &mut gpu)?;

        log::info!(
            "{}: {} * {}, cpu: {:p}, {}: {:#x}",
            name,
            rows,
            cols,
            host.as_ptr(),
            device.name(),
            device.buffer_addr(&gpu)
        );

        Ok(Self {
            device: Arc::clone(device),
            rows,
            cols,
            elem_count,
            name,
            range,
            host,
            gpu,
            rng,
            diff: None,
        })
    }

    /// Build a matrix whose fill range and seed come from `config`.
    pub fn from_config(
        device: &Arc<D>,
        rows: usize,
        cols: usize,
        name: impl Into<String>,
        config: &HarnessConfig,
    ) -> Result<Self> {
        Self::new(device, MatrixSpec::from_config(rows, cols, config)?.with_name(name))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn elem_count(&self) -> usize {
        self.elem_count
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Range used for the initial fill. Later fills do not reuse it.
    pub fn range(&self) -> ValueRange {
        self.range
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Host copy, row-major.
    pub fn host(&self) -> &[f16] {
        &self.host
    }

    /// Mutable host copy. Edits stay on the host until
    /// [`push_to_device`](Self::push_to_device).
    pub fn host_mut(&mut self) -> &mut [f16] {
        &mut self.host
    }

    /// Device copy, for handing to kernel launch code.
    pub fn device_buffer(&self) -> &D::Buffer {
        &self.gpu
    }

    /// Device copy for kernels that write results. Kernels must not
    /// reallocate or resize it.
    pub fn device_buffer_mut(&mut self) -> &mut D::Buffer {
        &mut self.gpu
    }

    pub fn device_addr(&self) -> usize {
        self.device.buffer_addr(&self.gpu)
    }

    /// Statistics of the most recent [`check_value`](Self::check_value).
    pub fn diff_stats(&self) -> Option<DiffStats> {
        self.diff
    }

    /// Zero the device copy, then pull it to the host.
    pub fn zeros(&mut self) -> Result<()> {
        self.device.memset_zeros(&mut self.gpu)?;
        self.move_to_host()
    }

    /// Refill the host copy from `range` and push it to the device. The
    /// stored construction range is left unchanged.
    pub fn random(&mut self, range: ValueRange) -> Result<()> {
        fill_uniform(&mut self.rng, range, &mut self.host);
        self.push_to_device()
    }

    /// [`random`](Self::random) over the default `[-2.0, 2.0)` range,
    /// whatever range the matrix was constructed with.
    pub fn random_default(&mut self) -> Result<()> {
        self.random(ValueRange::default())
    }

    /// Load `base`'s host content into this matrix's device copy.
    ///
    /// The host copy of `self` is not touched and may differ from the device
    /// copy until [`move_to_host`](Self::move_to_host).
    pub fn tear_up<E: Device>(&mut self, base: &PairedMatrix<E>) -> Result<()> {
        self.check_same_shape(base)?;
        self.device.copy_htod(&base.host, &mut self.gpu)
    }

    /// Copy the device content over the host copy.
    pub fn move_to_host(&mut self) -> Result<()> {
        self.device.copy_dtoh(&self.gpu, &mut self.host)
    }

    /// Copy the host content over the device copy.
    pub fn push_to_device(&mut self) -> Result<()> {
        self.device.copy_htod(&self.host, &mut self.gpu)
    }

    /// Compare the host copies of `self` and `base` element by element and
    /// record the result as this matrix's current statistics.
    ///
    /// Device copies are not consulted; pull kernel output with
    /// [`move_to_host`](Self::move_to_host) first.
    pub fn check_value<E: Device>(&mut self, base: &PairedMatrix<E>) -> Result<DiffStats> {
        self.check_same_shape(base)?;
        let stats = DiffStats::between(&self.host, &base.host)?;
        log::info!("{} vs {}: {}", self.name, base.name, stats);
        self.diff = Some(stats);
        Ok(stats)
    }

    fn check_same_shape<E: Device>(&self, base: &PairedMatrix<E>) -> Result<()> {
        if self.rows != base.rows || self.cols != base.cols {
            return Err(MatrixError::ShapeMismatch {
                name: self.name.clone(),
                base: base.name.clone(),
                expected: (self.rows, self.cols),
                actual: (base.rows, base.cols),
            }
            .into());
        }
        Ok(())
    }
}

/// 64-bit FNV-1a of the matrix name. Stable across builds and platforms.
fn stream_id(name: &str) -> u64 {
    name.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3))
}

impl<D: Device> fmt::Debug for PairedMatrix<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairedMatrix")
            .field("name", &self.name)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("device", &self.device.name())
            .field("range", &self.range)
            .field("diff", &self.diff)
            .finish_non_exhaustive()
    }
}

impl<D: Device> Drop for PairedMatrix<D> {
    fn drop(&mut self) {
        log::trace!("releasing {} ({} elements on {})", self.name, self.elem_count, self.device.name());
    }
}

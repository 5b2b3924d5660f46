//! Fixture walkthrough with two CPU "kernels"
//!
//! Builds A, B, C and C_ref on the configured backend, runs an f32
//! accumulating reference and an f16 accumulating candidate, stages both
//! results through device memory and reports the divergence.
//!
//! `RUST_LOG=info cargo run -p hgemm-matrix --example compare_host_kernels`
//! `HGEMM_BACKEND=cuda cargo run -p hgemm-matrix --features cuda --example compare_host_kernels`

use hgemm_common::{BackendKind, HarnessConfig};
use hgemm_matrix::{Device, DiffStats, HostDevice, MatrixSpec, PairedMatrix, check_backend, f16};
use std::sync::Arc;

fn gemm_f32_acc(a: &[f16], b: &[f16], c: &mut [f16], m: usize, n: usize, k: usize) {
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0f32;
            for t in 0..k {
                acc += a[i * k + t].to_f32() * b[t * n + j].to_f32();
            }
            c[i * n + j] = f16::from_f32(acc);
        }
    }
}

fn gemm_f16_acc(a: &[f16], b: &[f16], c: &mut [f16], m: usize, n: usize, k: usize) {
    for i in 0..m {
        for j in 0..n {
            let mut acc = f16::ZERO;
            for t in 0..k {
                acc = f16::from_f32(acc.to_f32() + (a[i * k + t] * b[t * n + j]).to_f32());
            }
            c[i * n + j] = acc;
        }
    }
}

fn run<D: Device>(device: &Arc<D>, config: &HarnessConfig) -> anyhow::Result<DiffStats> {
    let (m, n, k) = (64, 64, 256);

    let a = PairedMatrix::from_config(device, m, k, "A", config)?;
    let b = PairedMatrix::from_config(device, k, n, "B", config)?;
    let mut c = PairedMatrix::new(device, MatrixSpec::new(m, n)?.with_name("C"))?;
    let mut c_ref = PairedMatrix::new(device, MatrixSpec::new(m, n)?.with_name("C_ref"))?;
    c.zeros()?;
    c_ref.zeros()?;

    gemm_f32_acc(a.host(), b.host(), c_ref.host_mut(), m, n, k);
    gemm_f16_acc(a.host(), b.host(), c.host_mut(), m, n, k);

    // Stage the results on the device and read them back as a kernel's would be.
    for out in [&mut c, &mut c_ref] {
        out.push_to_device()?;
        out.move_to_host()?;
    }

    let stats = c.check_value(&c_ref)?;
    println!("{m}x{n}x{k} f16-accumulate vs f32-accumulate on {}: {stats}", device.name());
    Ok(stats)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = HarnessConfig::from_env()?;
    check_backend(config.backend)?;

    let stats = match config.backend {
        BackendKind::Host => run(&Arc::new(HostDevice::new()), &config)?,
        #[cfg(feature = "cuda")]
        BackendKind::Cuda => {
            run(&Arc::new(hgemm_matrix::CudaDevice::new(config.device_index)?), &config)?
        }
        #[cfg(not(feature = "cuda"))]
        BackendKind::Cuda => anyhow::bail!("backend `cuda` needs --features cuda"),
    };

    println!(
        "tolerance {}: {}",
        config.tolerance,
        if stats.within(config.tolerance) { "PASS" } else { "FAIL" }
    );

    Ok(())
}

// ============================================================
// Layer 5 - Execution Device
// ============================================================
// Decides once, at startup, where the run executes. The
// result is passed explicitly to the model factory, the
// batcher and the trainer; nothing reads a global device.
//
//   --gpu not given            → Cpu
//   --gpu, built without wgpu  → Cpu
//   --gpu, wgpu check fails    → Cpu
//   --gpu, wgpu check succeeds → Accelerator
//
// Falling back is not an error; it is logged at debug/info.

use std::fmt;

/// Where tensors, parameters and optimizer state live for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionDevice {
    Cpu,
    #[cfg(feature = "wgpu")]
    Accelerator,
}

impl ExecutionDevice {
    pub fn resolve(use_accelerator: bool) -> Self {
        if !use_accelerator {
            return ExecutionDevice::Cpu;
        }
        if accelerator_available() {
            return Self::accelerator();
        }
        tracing::info!("Accelerator requested but unavailable, running on CPU");
        ExecutionDevice::Cpu
    }

    #[cfg(feature = "wgpu")]
    fn accelerator() -> Self {
        ExecutionDevice::Accelerator
    }

    #[cfg(not(feature = "wgpu"))]
    fn accelerator() -> Self {
        ExecutionDevice::Cpu
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, ExecutionDevice::Cpu)
    }
}

impl fmt::Display for ExecutionDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionDevice::Cpu => write!(f, "cpu"),
            #[cfg(feature = "wgpu")]
            ExecutionDevice::Accelerator => write!(f, "wgpu"),
        }
    }
}

#[cfg(not(feature = "wgpu"))]
fn accelerator_available() -> bool {
    tracing::debug!("Built without the `wgpu` feature");
    false
}

/// Creates and reads back a one-element tensor on the default Wgpu device.
/// Adapter discovery panics when no adapter exists, so the check runs under
/// `catch_unwind` with the panic message silenced.
#[cfg(feature = "wgpu")]
fn accelerator_available() -> bool {
    use burn::backend::{wgpu::WgpuDevice, Wgpu};
    use burn::tensor::Tensor;

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let outcome = std::panic::catch_unwind(|| {
        let device = WgpuDevice::default();
        Tensor::<Wgpu, 1>::zeros([1], &device).into_data();
    });
    std::panic::set_hook(previous_hook);

    if outcome.is_err() {
        tracing::debug!("Wgpu device check failed");
    }
    outcome.is_ok()
}

//! The MonDot stack virtual machine.
//!
//! A [`Vm`] owns one contiguous evaluation stack shared across nested
//! frames; each frame records its stack floor on entry and every pop
//! is clamped to that floor. Host calls are routed through the
//! [`HostDispatch`] trait so the machine stays independent of any
//! particular native library.
//!
//! The machine is deliberately lenient: out-of-range constant or
//! local indices substitute nil, underflowing pops clamp, and unknown
//! dispatch targets produce nil - each such event is reported through
//! the `log` facade rather than aborting execution. Execution is
//! therefore infallible and always yields a [`mondot_core::Value`].

mod dispatch;
mod frame;
mod machine;
mod module;

pub use dispatch::{HostDispatch, NullHost};
pub use frame::Frame;
pub use machine::Vm;
pub use module::{ActiveCallGuard, Module};

//! Kinetic Animation Engine
//!
//! Timed property transitions on UI objects owned by another thread.
//!
//! # Features
//!
//! - **Single Timer Thread**: one worker paces every animation at a fixed quantum
//! - **UI-Thread Application**: values are written through a [`UiContext`](kinetic_core::UiContext), never from the worker
//! - **Merge on Collision**: a new request on a running property steers it instead of racing it
//! - **Exact Endpoints**: the final write is always the requested end value
//! - **Pulsation**: ping-pong playback a fixed number of times
//! - **Chained Callbacks**: every completion callback runs, in attachment order
//! - **Pluggable Interpolation**: built-in rules per [`ValueKind`](kinetic_core::ValueKind), overridable per request

pub mod animator;
pub mod config;
pub mod error;
pub mod instance;
pub mod interpolation;
pub mod setter;
pub mod worker;

pub use animator::{
    get_animator, is_animator_initialized, set_global_animator, try_get_animator,
    AnimationBuilder, Animator, DEFAULT_DURATION,
};
pub use config::{AnimatorConfig, DEFAULT_QUANTUM_MS, DEFAULT_THREAD_NAME};
pub use error::{AnimationError, ConfigError, Result};
pub use instance::{AnimationInfo, AnimationKey, CompletionCallback, InstanceId};
pub use interpolation::{Interpolate, InterpolationRegistry, Interpolator};
pub use setter::{ResolvedProperty, SetterResolver};
pub use worker::{AnimationWorker, Step, WorkerState};

//! Animation coordinator
//!
//! [`Animator`] is the public surface: "animate property P of target T from
//! A to B over D, N pulsations, then call C". Requests are validated on the
//! calling thread and then deferred onto the worker, so every registry touch
//! happens inside a step executed by the UI context.
//!
//! ```text
//!  caller thread          worker thread              UI thread
//!  ─────────────          ─────────────              ─────────
//!  start() ─validate─▶    enqueue(begin)
//!                         quantum ─run_async────────▶ begin: merge or create
//!                                                     step: apply, re-enqueue
//!                         quantum ─run_async────────▶ step: apply, re-enqueue
//!                                   ...               step: apply end value,
//!                                                           deregister,
//!                                                           run callbacks
//! ```
//!
//! Steps hold a `Weak` reference to the animator, so dropping the last
//! [`Animator`] handle stops the worker and lets queued steps fall through.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use kinetic_core::{
    duration_to_ticks, AnimValue, Animate, PropertyMetadata, Setter, StepError, Target, UiContext,
};
use parking_lot::Mutex;

use crate::config::AnimatorConfig;
use crate::error::{AnimationError, Result};
use crate::instance::{
    AnimationInfo, AnimationInstance, AnimationKey, CallbackChain, CompletionCallback,
    InstanceId, InstanceRegistry, InstanceSpec, StepAction,
};
use crate::interpolation::{InterpolationRegistry, Interpolator};
use crate::setter::SetterResolver;
use crate::worker::AnimationWorker;

/// Duration used by [`AnimationBuilder`] when none is given
pub const DEFAULT_DURATION: Duration = Duration::from_millis(250);

// ============================================================================
// Global Animator
// ============================================================================

static GLOBAL_ANIMATOR: OnceLock<Animator> = OnceLock::new();

/// Set the global animator
///
/// Call once at startup, after the UI context exists.
///
/// # Panics
///
/// Panics if called more than once.
pub fn set_global_animator(animator: Animator) {
    if GLOBAL_ANIMATOR.set(animator).is_err() {
        panic!("set_global_animator() called more than once");
    }
}

/// Get the global animator
///
/// # Panics
///
/// Panics if [`set_global_animator`] has not been called.
pub fn get_animator() -> Animator {
    GLOBAL_ANIMATOR
        .get()
        .expect("Animator not initialized. Call set_global_animator() at app startup.")
        .clone()
}

/// Try to get the global animator (returns None if not initialized)
pub fn try_get_animator() -> Option<Animator> {
    GLOBAL_ANIMATOR.get().cloned()
}

/// Check if the global animator has been initialized
pub fn is_animator_initialized() -> bool {
    GLOBAL_ANIMATOR.get().is_some()
}

// ============================================================================
// Animator
// ============================================================================

/// Handle to the animation engine
///
/// Cheap to clone; all clones drive the same worker and registry.
#[derive(Clone)]
pub struct Animator {
    inner: Arc<AnimatorInner>,
}

struct AnimatorInner {
    config: AnimatorConfig,
    context: Arc<dyn UiContext>,
    worker: AnimationWorker,
    interpolators: InterpolationRegistry,
    setters: SetterResolver,
    registry: Mutex<InstanceRegistry>,
}

/// A validated request waiting for its begin step
struct PendingAnimation {
    target: Arc<Target>,
    property: Arc<str>,
    setter: Setter,
    interpolator: Interpolator,
    start_value: AnimValue,
    end_value: AnimValue,
    total_ticks: i64,
    end_time: i64,
    pulsations: i32,
    callback: Option<CompletionCallback>,
}

impl Animator {
    /// Create an animator with the built-in interpolators
    pub fn new(
        config: AnimatorConfig,
        context: Arc<dyn UiContext>,
        metadata: Arc<dyn PropertyMetadata>,
    ) -> Result<Self> {
        Self::with_registry(
            config,
            context,
            metadata,
            InterpolationRegistry::with_builtins(),
        )
    }

    /// Create an animator with a custom interpolation registry
    pub fn with_registry(
        config: AnimatorConfig,
        context: Arc<dyn UiContext>,
        metadata: Arc<dyn PropertyMetadata>,
        interpolators: InterpolationRegistry,
    ) -> Result<Self> {
        let worker = AnimationWorker::spawn(&config, Arc::clone(&context))?;
        Ok(Self {
            inner: Arc::new(AnimatorInner {
                config,
                context,
                worker,
                interpolators,
                setters: SetterResolver::new(metadata),
                registry: Mutex::new(InstanceRegistry::new()),
            }),
        })
    }

    /// Animate `property` of `target` from `from` to `to`
    ///
    /// Invalid requests fail here, before any timing state exists. A request
    /// on a property that is already animating steers the running animation
    /// instead of starting a second one.
    #[allow(clippy::too_many_arguments)]
    pub fn start<T, V>(
        &self,
        target: &Arc<T>,
        property: &str,
        from: V,
        to: V,
        duration: Duration,
        pulsations: i32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<()>
    where
        T: Any + Send + Sync,
        V: Animate,
    {
        self.submit(
            target,
            property,
            from.into_value(),
            to.into_value(),
            duration,
            pulsations,
            None,
            on_complete,
        )
    }

    /// Like [`start`](Self::start), with an explicit interpolator
    #[allow(clippy::too_many_arguments)]
    pub fn start_with<T, V>(
        &self,
        target: &Arc<T>,
        property: &str,
        from: V,
        to: V,
        duration: Duration,
        pulsations: i32,
        interpolator: Interpolator,
        on_complete: Option<CompletionCallback>,
    ) -> Result<()>
    where
        T: Any + Send + Sync,
        V: Animate,
    {
        self.submit(
            target,
            property,
            from.into_value(),
            to.into_value(),
            duration,
            pulsations,
            Some(interpolator),
            on_complete,
        )
    }

    /// Describe an animation with a builder
    ///
    /// ```ignore
    /// animator
    ///     .animate(&button, "left", 0, 120)
    ///     .duration(Duration::from_millis(200))
    ///     .on_complete(|| tracing::info!("slid in"))
    ///     .start()?;
    /// ```
    pub fn animate<'a, T, V>(
        &'a self,
        target: &'a Arc<T>,
        property: &'a str,
        from: V,
        to: V,
    ) -> AnimationBuilder<'a, T, V>
    where
        T: Any + Send + Sync,
        V: Animate,
    {
        AnimationBuilder {
            animator: self,
            target,
            property,
            from,
            to,
            duration: DEFAULT_DURATION,
            pulsations: 0,
            interpolator: None,
            on_complete: None,
        }
    }

    /// Stop animating `property` of `target`
    ///
    /// Deferred onto the worker like [`start`](Self::start). The property
    /// keeps whatever value it last received and attached callbacks are
    /// dropped without running.
    pub fn cancel<T>(&self, target: &Arc<T>, property: &str) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let key = self.key_for(target, property)?;
        let weak = Arc::downgrade(&self.inner);
        let queued = self.inner.worker.enqueue(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                let removed = inner.registry.lock().remove_key(&key);
                if let Some(instance) = removed {
                    tracing::debug!(property = %instance.property(), "animation cancelled");
                }
            }
            Ok(())
        }));
        if queued {
            Ok(())
        } else {
            Err(AnimationError::AnimatorStopped)
        }
    }

    /// Whether `property` of `target` has a live animation
    pub fn is_animating<T>(&self, target: &Arc<T>, property: &str) -> bool
    where
        T: Any + Send + Sync,
    {
        self.key_for(target, property)
            .map(|key| self.inner.registry.lock().contains_key(&key))
            .unwrap_or(false)
    }

    /// Snapshot of the live animation on `property` of `target`
    pub fn animation_info<T>(&self, target: &Arc<T>, property: &str) -> Option<AnimationInfo>
    where
        T: Any + Send + Sync,
    {
        let key = self.key_for(target, property).ok()?;
        self.inner
            .registry
            .lock()
            .get_by_key(&key)
            .map(AnimationInstance::info)
    }

    /// Number of live animations
    pub fn active_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.inner.config
    }

    pub fn interpolators(&self) -> &InterpolationRegistry {
        &self.inner.interpolators
    }

    pub fn is_running(&self) -> bool {
        self.inner.worker.is_running()
    }

    /// Stop the worker and drop every live animation
    ///
    /// Steps already handed to the UI context become no-ops, so no value is
    /// written and no callback runs after this returns. Later requests fail
    /// with [`AnimationError::AnimatorStopped`].
    pub fn shutdown(&self) {
        self.inner.worker.shutdown();
        let drained = std::mem::take(&mut *self.inner.registry.lock());
        if !drained.is_empty() {
            tracing::debug!(dropped = drained.len(), "animator shut down");
        }
    }

    fn key_for<T>(&self, target: &Arc<T>, property: &str) -> Result<AnimationKey>
    where
        T: Any + Send + Sync,
    {
        let resolved = self.inner.setters.resolve::<T>(property)?;
        let erased: Arc<Target> = target.clone();
        Ok(AnimationKey::new(&erased, &resolved.setter))
    }

    #[allow(clippy::too_many_arguments)]
    fn submit<T>(
        &self,
        target: &Arc<T>,
        property: &str,
        from: AnimValue,
        to: AnimValue,
        duration: Duration,
        pulsations: i32,
        interpolator: Option<Interpolator>,
        on_complete: Option<CompletionCallback>,
    ) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let inner = &self.inner;
        if property.is_empty() {
            return Err(AnimationError::EmptyPropertyName);
        }
        if pulsations < 0 {
            return Err(AnimationError::NegativePulsations(pulsations));
        }

        let resolved = inner
            .setters
            .resolve_type(TypeId::of::<T>(), type_name::<T>(), property)?;
        for value in [from, to] {
            if value.kind() != resolved.kind {
                return Err(AnimationError::TypeMismatch {
                    property: property.to_string(),
                    expected: resolved.kind,
                    actual: value.kind(),
                });
            }
        }

        let interpolator = match interpolator {
            Some(interpolator) => interpolator,
            None => inner
                .interpolators
                .get(resolved.kind)
                .cloned()
                .ok_or(AnimationError::UnsupportedValueKind(resolved.kind))?,
        };

        if !inner.worker.is_running() {
            return Err(AnimationError::AnimatorStopped);
        }

        let total_ticks = duration_to_ticks(duration);
        let end_time = inner.context.now_ticks().saturating_add(total_ticks);
        let pending = PendingAnimation {
            target: target.clone(),
            property: Arc::from(property),
            setter: resolved.setter,
            interpolator,
            start_value: from,
            end_value: to,
            total_ticks,
            end_time,
            pulsations,
            callback: on_complete,
        };

        tracing::trace!(
            property,
            kind = %resolved.kind,
            total_ticks,
            pulsations,
            "animation requested"
        );

        let weak = Arc::downgrade(inner);
        let queued = inner.worker.enqueue(Box::new(move || match weak.upgrade() {
            Some(inner) => inner.begin(pending),
            None => Ok(()),
        }));
        if queued {
            Ok(())
        } else {
            Err(AnimationError::AnimatorStopped)
        }
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("config", &self.inner.config)
            .field("active", &self.active_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl AnimatorInner {
    /// First step of a request, executed on the UI context
    fn begin(self: &Arc<Self>, pending: PendingAnimation) -> std::result::Result<(), StepError> {
        // Dispatched before shutdown, executed after it
        if !self.worker.is_running() {
            return Ok(());
        }
        let now = self.context.now_ticks();

        if pending.end_time <= now {
            tracing::trace!(property = %pending.property, "duration already elapsed, applying end value");
            apply(
                &pending.setter,
                &*pending.target,
                pending.end_value,
                &pending.property,
            )?;
            self.run_callbacks(pending.callback.into_iter().collect());
            return Ok(());
        }

        let key = AnimationKey::new(&pending.target, &pending.setter);
        let id = {
            let mut registry = self.registry.lock();
            if let Some(instance) = registry.id_for(&key).and_then(|id| registry.get_mut(id)) {
                instance.merge(
                    pending.end_value,
                    pending.total_ticks,
                    pending.pulsations,
                    pending.callback,
                    now,
                );
                tracing::debug!(
                    property = %pending.property,
                    total_ticks = instance.info().total_ticks,
                    "merged into running animation"
                );
                return Ok(());
            }

            let (id, _) = registry.insert(AnimationInstance::new(InstanceSpec {
                target: pending.target,
                property: Arc::clone(&pending.property),
                setter: pending.setter,
                interpolator: pending.interpolator,
                start_value: pending.start_value,
                end_value: pending.end_value,
                total_ticks: pending.total_ticks,
                end_time: pending.end_time,
                pulsations: pending.pulsations,
                callback: pending.callback,
            }));
            id
        };

        tracing::debug!(property = %pending.property, "animation started");
        self.step(id)
    }

    /// One tick of a live instance, executed on the UI context
    fn step(self: &Arc<Self>, id: InstanceId) -> std::result::Result<(), StepError> {
        if !self.worker.is_running() {
            return Ok(());
        }
        let now = self.context.now_ticks();

        let (action, target, setter, property, finished) = {
            let mut registry = self.registry.lock();
            let Some(instance) = registry.get_mut(id) else {
                // Cancelled or superseded since this step was queued
                return Ok(());
            };
            let action = instance.advance(now);
            let target = Arc::clone(instance.target());
            let setter = instance.setter().clone();
            let property = Arc::clone(instance.property());
            let finished = match action {
                StepAction::Finished(_) => registry.remove(id),
                _ => None,
            };
            (action, target, setter, property, finished)
        };

        tracing::trace!(property = %property, value = ?action.value(), "animation step");

        if let Err(err) = apply(&setter, &*target, action.value(), &property) {
            if finished.is_none() {
                let removed = self.registry.lock().remove(id);
                drop(removed);
            }
            tracing::warn!(property = %property, "animation aborted: {}", err);
            return Err(err);
        }

        match action {
            StepAction::Continue(_) => self.schedule(id),
            StepAction::Reversed(_) => {
                tracing::trace!(property = %property, "animation reversed");
                self.schedule(id);
            }
            StepAction::Finished(_) => {
                if let Some(mut instance) = finished {
                    tracing::debug!(property = %property, "animation finished");
                    let callbacks = instance.take_callbacks();
                    drop(instance);
                    self.run_callbacks(callbacks);
                }
            }
        }
        Ok(())
    }

    /// Queue the next step of `id`
    fn schedule(self: &Arc<Self>, id: InstanceId) {
        let weak = Arc::downgrade(self);
        let queued = self.worker.enqueue(Box::new(move || match weak.upgrade() {
            Some(inner) => inner.step(id),
            None => Ok(()),
        }));
        if !queued {
            let removed = self.registry.lock().remove(id);
            if let Some(instance) = removed {
                tracing::warn!(property = %instance.property(), "worker stopped, animation dropped");
            }
        }
    }

    fn run_callbacks(&self, callbacks: CallbackChain) {
        for callback in callbacks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(callback)) {
                let err = StepError::from_panic(payload);
                tracing::warn!("completion callback failed: {}", err);
                self.context.report_error(err);
            }
        }
    }
}

/// Write `value` through `setter`, turning failures and panics into errors
fn apply(
    setter: &Setter,
    target: &Target,
    value: AnimValue,
    property: &str,
) -> std::result::Result<(), StepError> {
    match catch_unwind(AssertUnwindSafe(|| setter.apply(target, value))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(StepError::Property {
            property: property.to_string(),
            source,
        }),
        Err(payload) => Err(StepError::from_panic(payload)),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder returned by [`Animator::animate`]
pub struct AnimationBuilder<'a, T, V> {
    animator: &'a Animator,
    target: &'a Arc<T>,
    property: &'a str,
    from: V,
    to: V,
    duration: Duration,
    pulsations: i32,
    interpolator: Option<Interpolator>,
    on_complete: Option<CompletionCallback>,
}

impl<'a, T, V> AnimationBuilder<'a, T, V>
where
    T: Any + Send + Sync,
    V: Animate,
{
    /// Set the animation length
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the animation length in milliseconds
    pub fn duration_ms(self, ms: u64) -> Self {
        self.duration(Duration::from_millis(ms))
    }

    /// Set how many times the animation plays back and forth after the
    /// first run
    pub fn pulsations(mut self, count: i32) -> Self {
        self.pulsations = count;
        self
    }

    /// Use `interpolator` instead of the registered one
    pub fn interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = Some(interpolator);
        self
    }

    /// Run `callback` once the animation has completed
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Submit the request
    pub fn start(self) -> Result<()> {
        self.animator.submit(
            self.target,
            self.property,
            self.from.into_value(),
            self.to.into_value(),
            self.duration,
            self.pulsations,
            self.interpolator,
            self.on_complete,
        )
    }
}

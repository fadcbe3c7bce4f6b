//! Animation instances and the key registry
//!
//! An [`AnimationInstance`] is the timing state of one property on one
//! target. The [`InstanceRegistry`] guarantees at most one live instance per
//! [`AnimationKey`]; a second request for a live key is merged into the
//! existing instance instead of racing it.

use std::fmt;
use std::sync::Arc;

use kinetic_core::{AnimValue, Setter, Target};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::interpolation::Interpolator;

new_key_type! {
    /// Handle to a registered animation instance
    pub struct InstanceId;
}

/// Callback invoked once an animation has fully completed
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callbacks chained onto one instance, in attachment order
pub type CallbackChain = SmallVec<[CompletionCallback; 2]>;

/// Identity of a logical animation: one target, one property setter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationKey {
    target: usize,
    setter: usize,
}

impl AnimationKey {
    pub fn new(target: &Arc<Target>, setter: &Setter) -> Self {
        Self {
            target: Arc::as_ptr(target) as *const () as usize,
            setter: setter.id(),
        }
    }
}

/// What a step should do after advancing an instance
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepAction {
    /// Apply the interpolated value and step again
    Continue(AnimValue),
    /// Apply the end value, then play back towards the old start
    Reversed(AnimValue),
    /// Apply the end value and finish
    Finished(AnimValue),
}

impl StepAction {
    pub fn value(&self) -> AnimValue {
        match *self {
            StepAction::Continue(v) | StepAction::Reversed(v) | StepAction::Finished(v) => v,
        }
    }
}

/// Timing state of one running animation
pub struct AnimationInstance {
    key: AnimationKey,
    target: Arc<Target>,
    property: Arc<str>,
    setter: Setter,
    interpolator: Interpolator,
    start_value: AnimValue,
    end_value: AnimValue,
    total_ticks: i64,
    end_time: i64,
    pulsations: i32,
    callbacks: CallbackChain,
}

/// Parameters of a new instance
pub struct InstanceSpec {
    pub target: Arc<Target>,
    pub property: Arc<str>,
    pub setter: Setter,
    pub interpolator: Interpolator,
    pub start_value: AnimValue,
    pub end_value: AnimValue,
    pub total_ticks: i64,
    pub end_time: i64,
    pub pulsations: i32,
    pub callback: Option<CompletionCallback>,
}

impl AnimationInstance {
    pub fn new(spec: InstanceSpec) -> Self {
        let mut callbacks = CallbackChain::new();
        callbacks.extend(spec.callback);
        Self {
            key: AnimationKey::new(&spec.target, &spec.setter),
            target: spec.target,
            property: spec.property,
            setter: spec.setter,
            interpolator: spec.interpolator,
            start_value: spec.start_value,
            end_value: spec.end_value,
            total_ticks: spec.total_ticks,
            end_time: spec.end_time,
            pulsations: spec.pulsations,
            callbacks,
        }
    }

    pub fn key(&self) -> AnimationKey {
        self.key
    }

    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    pub fn property(&self) -> &Arc<str> {
        &self.property
    }

    pub fn setter(&self) -> &Setter {
        &self.setter
    }

    /// Steer this instance towards a new request on the same key
    ///
    /// The end value and pulsation count are replaced, the duration is
    /// accumulated and the callback is chained after the existing ones. The
    /// start value is kept so in-flight motion stays continuous.
    pub fn merge(
        &mut self,
        end_value: AnimValue,
        total_ticks: i64,
        pulsations: i32,
        callback: Option<CompletionCallback>,
        now: i64,
    ) {
        self.end_value = end_value;
        self.total_ticks = self.total_ticks.saturating_add(total_ticks);
        self.end_time = if self.end_time <= now {
            now.saturating_add(total_ticks)
        } else {
            self.end_time.saturating_add(total_ticks)
        };
        self.pulsations = pulsations;
        self.callbacks.extend(callback);
    }

    /// Advance the timing state to `now`
    pub fn advance(&mut self, now: i64) -> StepAction {
        let ticks_left = self.end_time.saturating_sub(now);
        if ticks_left > 0 {
            let elapsed = self.total_ticks.saturating_sub(ticks_left);
            let value = self.interpolator.interpolate(
                &self.start_value,
                &self.end_value,
                elapsed,
                self.total_ticks,
            );
            return StepAction::Continue(value);
        }

        let end = self.end_value;
        if self.pulsations > 0 {
            self.pulsations -= 1;
            std::mem::swap(&mut self.start_value, &mut self.end_value);
            self.end_time = now.saturating_add(self.total_ticks);
            StepAction::Reversed(end)
        } else {
            StepAction::Finished(end)
        }
    }

    /// Take the callback chain, leaving it empty
    pub fn take_callbacks(&mut self) -> CallbackChain {
        std::mem::take(&mut self.callbacks)
    }

    /// Read-only view for diagnostics and tests
    pub fn info(&self) -> AnimationInfo {
        AnimationInfo {
            property: Arc::clone(&self.property),
            start_value: self.start_value,
            end_value: self.end_value,
            total_ticks: self.total_ticks,
            end_time: self.end_time,
            pulsations: self.pulsations,
            callbacks: self.callbacks.len(),
        }
    }
}

impl fmt::Debug for AnimationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationInstance")
            .field("property", &self.property)
            .field("start_value", &self.start_value)
            .field("end_value", &self.end_value)
            .field("total_ticks", &self.total_ticks)
            .field("end_time", &self.end_time)
            .field("pulsations", &self.pulsations)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Snapshot of a live instance
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationInfo {
    pub property: Arc<str>,
    pub start_value: AnimValue,
    pub end_value: AnimValue,
    pub total_ticks: i64,
    pub end_time: i64,
    pub pulsations: i32,
    /// Number of completion callbacks attached so far
    pub callbacks: usize,
}

/// Live instances, at most one per key
#[derive(Default)]
pub struct InstanceRegistry {
    instances: SlotMap<InstanceId, AnimationInstance>,
    keys: FxHashMap<AnimationKey, InstanceId>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_for(&self, key: &AnimationKey) -> Option<InstanceId> {
        self.keys.get(key).copied()
    }

    /// Store `instance` under its key
    ///
    /// An instance already registered under the same key is replaced and
    /// returned.
    pub fn insert(&mut self, instance: AnimationInstance) -> (InstanceId, Option<AnimationInstance>) {
        let key = instance.key();
        let replaced = self.remove_key(&key);
        let id = self.instances.insert(instance);
        self.keys.insert(key, id);
        (id, replaced)
    }

    pub fn get(&self, id: InstanceId) -> Option<&AnimationInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut AnimationInstance> {
        self.instances.get_mut(id)
    }

    pub fn get_by_key(&self, key: &AnimationKey) -> Option<&AnimationInstance> {
        self.id_for(key).and_then(|id| self.instances.get(id))
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<AnimationInstance> {
        let instance = self.instances.remove(id)?;
        self.keys.remove(&instance.key());
        Some(instance)
    }

    pub fn remove_key(&mut self, key: &AnimationKey) -> Option<AnimationInstance> {
        let id = self.keys.remove(key)?;
        self.instances.remove(id)
    }

    pub fn contains_key(&self, key: &AnimationKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

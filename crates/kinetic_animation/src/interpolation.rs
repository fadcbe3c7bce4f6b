//! Interpolation registry
//!
//! Maps a [`ValueKind`] to an [`Interpolator`], a pure function computing the
//! value between two endpoints after `elapsed` of `total` ticks.
//!
//! Built-in rules:
//!
//! - **bool**: the start value until half the time has passed, then the end value
//! - **integers**: exact linear interpolation in `i128`, rounded half away from zero
//! - **floats**: linear interpolation in `f64`, narrowed by a round-to-nearest cast
//! - **fixed**: exact linear interpolation of the raw value, midpoints away from zero
//! - **aggregates**: each component independently, with its scalar rule
//!
//! Elapsed time is clamped to `[0, total]`, and a non-positive total yields
//! the end value.

use std::fmt;
use std::sync::Arc;

use kinetic_core::{
    AnimValue, Animate, Color, Fixed, Padding, Point, PointF, Rect, RectF, Size, SizeF, ValueKind,
};
use rustc_hash::FxHashMap;

type InterpolateFn = dyn Fn(&AnimValue, &AnimValue, i64, i64) -> AnimValue + Send + Sync;

/// Pure function `(start, end, elapsed, total) -> value`
#[derive(Clone)]
pub struct Interpolator {
    inner: Arc<InterpolateFn>,
}

impl Interpolator {
    /// Wrap an untyped interpolation function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&AnimValue, &AnimValue, i64, i64) -> AnimValue + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap a typed interpolation function
    ///
    /// Endpoints of another kind are passed through as the end value.
    pub fn typed<V, F>(f: F) -> Self
    where
        V: Animate,
        F: Fn(V, V, i64, i64) -> V + Send + Sync + 'static,
    {
        Self::from_fn(move |start, end, elapsed, total| {
            match (V::from_value(*start), V::from_value(*end)) {
                (Some(a), Some(b)) => f(a, b, elapsed, total).into_value(),
                _ => *end,
            }
        })
    }

    /// Built-in interpolator of an [`Interpolate`] type
    pub fn of<V: Interpolate>() -> Self {
        Self::typed(|a: V, b: V, elapsed, total| a.interpolate(&b, elapsed, total))
    }

    pub fn interpolate(
        &self,
        start: &AnimValue,
        end: &AnimValue,
        elapsed: i64,
        total: i64,
    ) -> AnimValue {
        (self.inner)(start, end, elapsed, total)
    }
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator").finish_non_exhaustive()
    }
}

/// Trait for values with a built-in interpolation rule
pub trait Interpolate: Animate {
    /// Value between `self` and `end` after `elapsed` of `total` ticks
    fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self;
}

// ============================================================================
// Scalar Rules
// ============================================================================

/// Clamp progress, `None` when the animation has no length
fn progress(elapsed: i64, total: i64) -> Option<(i64, i64)> {
    (total > 0).then(|| (elapsed.clamp(0, total), total))
}

/// Exact integer lerp, rounding the result half away from zero
///
/// The result always lies between `start` and `end`.
fn lerp_i128(start: i128, end: i128, elapsed: i64, total: i64) -> i128 {
    let Some((e, t)) = progress(elapsed, total) else {
        return end;
    };
    let t = t as i128;
    let delta = (end - start) * e as i128;
    let base = start + delta / t;
    let rem = delta % t;
    let twice = 2 * rem.abs();
    if rem > 0 && (twice > t || (twice == t && base >= 0)) {
        base + 1
    } else if rem < 0 && (twice > t || (twice == t && base <= 0)) {
        base - 1
    } else {
        base
    }
}

fn lerp_f64(start: f64, end: f64, elapsed: i64, total: i64) -> f64 {
    match progress(elapsed, total) {
        Some((e, t)) if e < t => start + (end - start) * (e as f64 / t as f64),
        _ => end,
    }
}

impl Interpolate for bool {
    fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self {
        match progress(elapsed, total) {
            Some((e, t)) if (e as i128) * 2 < t as i128 => *self,
            _ => *end,
        }
    }
}

macro_rules! impl_interpolate_int {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self {
                    // Bounded by the endpoints, so the narrowing cast is exact.
                    lerp_i128(*self as i128, *end as i128, elapsed, total) as $ty
                }
            }
        )*
    };
}

impl_interpolate_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl Interpolate for f32 {
    fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self {
        lerp_f64(*self as f64, *end as f64, elapsed, total) as f32
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self {
        lerp_f64(*self, *end, elapsed, total)
    }
}

impl Interpolate for Fixed {
    fn interpolate(&self, end: &Self, elapsed: i64, total: i64) -> Self {
        Fixed::from_raw(lerp_i128(self.raw() as i128, end.raw() as i128, elapsed, total) as i64)
    }
}

// ============================================================================
// Aggregate Rules
// ============================================================================

impl Interpolate for Point {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        Point::new(self.x.interpolate(&end.x, e, t), self.y.interpolate(&end.y, e, t))
    }
}

impl Interpolate for PointF {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        PointF::new(self.x.interpolate(&end.x, e, t), self.y.interpolate(&end.y, e, t))
    }
}

impl Interpolate for Size {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        Size::new(
            self.width.interpolate(&end.width, e, t),
            self.height.interpolate(&end.height, e, t),
        )
    }
}

impl Interpolate for SizeF {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        SizeF::new(
            self.width.interpolate(&end.width, e, t),
            self.height.interpolate(&end.height, e, t),
        )
    }
}

impl Interpolate for Rect {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        Rect::from_origin_size(
            self.origin.interpolate(&end.origin, e, t),
            self.size.interpolate(&end.size, e, t),
        )
    }
}

impl Interpolate for RectF {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        RectF {
            origin: self.origin.interpolate(&end.origin, e, t),
            size: self.size.interpolate(&end.size, e, t),
        }
    }
}

impl Interpolate for Color {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        Color::argb(
            self.a.interpolate(&end.a, e, t),
            self.r.interpolate(&end.r, e, t),
            self.g.interpolate(&end.g, e, t),
            self.b.interpolate(&end.b, e, t),
        )
    }
}

impl Interpolate for Padding {
    fn interpolate(&self, end: &Self, e: i64, t: i64) -> Self {
        Padding::new(
            self.left.interpolate(&end.left, e, t),
            self.top.interpolate(&end.top, e, t),
            self.right.interpolate(&end.right, e, t),
            self.bottom.interpolate(&end.bottom, e, t),
        )
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Lookup table from value kind to interpolator
///
/// Populate it before handing it to an [`Animator`](crate::Animator); once
/// shared it is only read.
#[derive(Clone, Debug, Default)]
pub struct InterpolationRegistry {
    functions: FxHashMap<ValueKind, Interpolator>,
}

impl InterpolationRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an interpolator for every built-in kind
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_type::<bool>();
        registry.register_type::<i8>();
        registry.register_type::<i16>();
        registry.register_type::<i32>();
        registry.register_type::<i64>();
        registry.register_type::<u8>();
        registry.register_type::<u16>();
        registry.register_type::<u32>();
        registry.register_type::<u64>();
        registry.register_type::<f32>();
        registry.register_type::<f64>();
        registry.register_type::<Fixed>();
        registry.register_type::<Point>();
        registry.register_type::<PointF>();
        registry.register_type::<Size>();
        registry.register_type::<SizeF>();
        registry.register_type::<Rect>();
        registry.register_type::<RectF>();
        registry.register_type::<Color>();
        registry.register_type::<Padding>();
        registry
    }

    /// Register (or replace) the interpolator for `kind`
    pub fn register(&mut self, kind: ValueKind, interpolator: Interpolator) {
        self.functions.insert(kind, interpolator);
    }

    /// Register the built-in rule of an [`Interpolate`] type
    pub fn register_type<V: Interpolate>(&mut self) {
        self.register(V::KIND, Interpolator::of::<V>());
    }

    pub fn get(&self, kind: ValueKind) -> Option<&Interpolator> {
        self.functions.get(&kind)
    }

    pub fn contains(&self, kind: ValueKind) -> bool {
        self.functions.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lerp<V: Interpolate>(a: V, b: V, e: i64, t: i64) -> V {
        a.interpolate(&b, e, t)
    }

    #[test]
    fn test_bool_switches_at_half() {
        assert!(!lerp(false, true, 49, 100));
        assert!(lerp(false, true, 50, 100));
        assert!(lerp(true, false, 0, 100));
        assert!(!lerp(true, false, 100, 100));
    }

    #[test]
    fn test_integer_rounding_half_away_from_zero() {
        // 0 -> 5 at 1/2 = 2.5
        assert_eq!(lerp(0_i32, 5, 1, 2), 3);
        // 0 -> -5 at 1/2 = -2.5
        assert_eq!(lerp(0_i32, -5, 1, 2), -3);
        // 0 -> 10 at 1/3 = 3.33
        assert_eq!(lerp(0_i32, 10, 1, 3), 3);
        // 0 -> 10 at 2/3 = 6.67
        assert_eq!(lerp(0_i32, 10, 2, 3), 7);
        // 1 -> 0 at 1/2 = 0.5
        assert_eq!(lerp(1_i32, 0, 1, 2), 1);
        // -1 -> 0 at 1/2 = -0.5
        assert_eq!(lerp(-1_i32, 0, 1, 2), -1);
    }

    #[test]
    fn test_integer_extremes_do_not_overflow() {
        assert_eq!(lerp(i64::MIN, i64::MAX, 1, 2), -1);
        assert_eq!(lerp(0_u64, u64::MAX, 1, 1), u64::MAX);
        assert_eq!(lerp(u64::MAX, 0, i64::MAX - 1, i64::MAX), 2);
        assert_eq!(lerp(i8::MIN, i8::MAX, 3, 4), 63);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(lerp(10_i16, 20, -5, 10), 10);
        assert_eq!(lerp(10_i16, 20, 50, 10), 20);
        assert_eq!(lerp(10_u8, 20, 3, 0), 20);
        assert_eq!(lerp(1.0_f64, 2.0, 3, -1), 2.0);
    }

    #[test]
    fn test_float_interpolation() {
        assert!((lerp(0.0_f32, 1.0, 1, 2) - 0.5).abs() < 1e-6);
        assert!((lerp(10.0_f64, 20.0, 1, 4) - 12.5).abs() < 1e-12);
        assert_eq!(lerp(0.1_f32, 0.7, 10, 10), 0.7);
    }

    #[test]
    fn test_fixed_midpoint_rounding() {
        let a = Fixed::from_raw(0);
        let b = Fixed::from_raw(1);
        assert_eq!(lerp(a, b, 1, 2), Fixed::from_raw(1));
        assert_eq!(lerp(b, a, 1, 2), Fixed::from_raw(1));
        assert_eq!(
            lerp(Fixed::from_int(1), Fixed::from_int(2), 1, 4),
            Fixed::from_raw(12_500)
        );
    }

    #[test]
    fn test_aggregates_are_component_wise() {
        let r = lerp(Rect::new(0, 0, 10, 10), Rect::new(10, 20, 30, 50), 1, 2);
        assert_eq!(r, Rect::new(5, 10, 20, 30));

        let c = lerp(Color::argb(0, 0, 0, 0), Color::argb(255, 255, 0, 100), 1, 2);
        assert_eq!(c, Color::argb(128, 128, 0, 50));

        let p = lerp(Padding::all(0), Padding::new(2, 4, 6, 8), 1, 2);
        assert_eq!(p, Padding::new(1, 2, 3, 4));

        let s = lerp(SizeF::new(0.0, 0.0), SizeF::new(4.0, 8.0), 1, 4);
        assert_eq!(s, SizeF::new(1.0, 2.0));
    }

    #[test]
    fn test_registry_covers_all_kinds() {
        let registry = InterpolationRegistry::with_builtins();
        for kind in ValueKind::ALL {
            assert!(registry.contains(kind), "missing interpolator for {}", kind);
        }
        assert_eq!(registry.len(), ValueKind::ALL.len());
    }

    #[test]
    fn test_registry_lookup_and_override() {
        let mut registry = InterpolationRegistry::new();
        assert!(registry.get(ValueKind::I32).is_none());

        registry.register(
            ValueKind::I32,
            Interpolator::typed(|_: i32, b: i32, _, _| b * 2),
        );
        let f = registry.get(ValueKind::I32).unwrap();
        assert_eq!(
            f.interpolate(&AnimValue::I32(0), &AnimValue::I32(4), 1, 2),
            AnimValue::I32(8)
        );
    }

    #[test]
    fn test_typed_interpolator_passes_through_mismatched_kinds() {
        let f = Interpolator::of::<i32>();
        assert_eq!(
            f.interpolate(&AnimValue::F32(0.0), &AnimValue::F32(1.0), 1, 2),
            AnimValue::F32(1.0)
        );
    }
}

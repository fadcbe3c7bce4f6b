//! Animatable value model
//!
//! Values travel through setters and interpolators as [`AnimValue`], a tagged
//! union whose tag is [`ValueKind`]. Typed APIs are generic over [`Animate`]
//! so callers work with plain Rust values and never build an `AnimValue`.

use std::fmt;

use crate::geometry::{Color, Padding, Point, PointF, Rect, RectF, Size, SizeF};

/// Stable tag naming the type of an animated value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Fixed,
    Point,
    PointF,
    Size,
    SizeF,
    Rect,
    RectF,
    Color,
    Padding,
}

impl ValueKind {
    /// Every kind, in declaration order
    pub const ALL: [ValueKind; 20] = [
        ValueKind::Bool,
        ValueKind::I8,
        ValueKind::I16,
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::U8,
        ValueKind::U16,
        ValueKind::U32,
        ValueKind::U64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::Fixed,
        ValueKind::Point,
        ValueKind::PointF,
        ValueKind::Size,
        ValueKind::SizeF,
        ValueKind::Rect,
        ValueKind::RectF,
        ValueKind::Color,
        ValueKind::Padding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Fixed => "fixed",
            ValueKind::Point => "point",
            ValueKind::PointF => "pointf",
            ValueKind::Size => "size",
            ValueKind::SizeF => "sizef",
            ValueKind::Rect => "rect",
            ValueKind::RectF => "rectf",
            ValueKind::Color => "color",
            ValueKind::Padding => "padding",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed Point
// ─────────────────────────────────────────────────────────────────────────────

/// Decimal fixed-point number with four fractional digits
///
/// Stored as a raw `i64` scaled by [`Fixed::SCALE`], so `Fixed::from_raw(12_500)`
/// is `1.25`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i64);

impl Fixed {
    pub const SCALE: i64 = 10_000;
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(Self::SCALE);

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole number, saturating at the representable range
    pub const fn from_int(value: i64) -> Self {
        Self(value.saturating_mul(Self::SCALE))
    }

    /// Nearest representable value, midpoints rounded away from zero
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE as f64).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        write!(f, "{}{}.{:04}", sign, abs / scale, abs % scale)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tagged Value
// ─────────────────────────────────────────────────────────────────────────────

/// A value of any animatable kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Fixed(Fixed),
    Point(Point),
    PointF(PointF),
    Size(Size),
    SizeF(SizeF),
    Rect(Rect),
    RectF(RectF),
    Color(Color),
    Padding(Padding),
}

impl AnimValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AnimValue::Bool(_) => ValueKind::Bool,
            AnimValue::I8(_) => ValueKind::I8,
            AnimValue::I16(_) => ValueKind::I16,
            AnimValue::I32(_) => ValueKind::I32,
            AnimValue::I64(_) => ValueKind::I64,
            AnimValue::U8(_) => ValueKind::U8,
            AnimValue::U16(_) => ValueKind::U16,
            AnimValue::U32(_) => ValueKind::U32,
            AnimValue::U64(_) => ValueKind::U64,
            AnimValue::F32(_) => ValueKind::F32,
            AnimValue::F64(_) => ValueKind::F64,
            AnimValue::Fixed(_) => ValueKind::Fixed,
            AnimValue::Point(_) => ValueKind::Point,
            AnimValue::PointF(_) => ValueKind::PointF,
            AnimValue::Size(_) => ValueKind::Size,
            AnimValue::SizeF(_) => ValueKind::SizeF,
            AnimValue::Rect(_) => ValueKind::Rect,
            AnimValue::RectF(_) => ValueKind::RectF,
            AnimValue::Color(_) => ValueKind::Color,
            AnimValue::Padding(_) => ValueKind::Padding,
        }
    }

    /// Extract a typed value, `None` if the kind differs
    pub fn get<V: Animate>(self) -> Option<V> {
        V::from_value(self)
    }
}

/// Trait for Rust types that can be animated
///
/// Implemented for every type with a [`ValueKind`]. The conversion is lossless
/// in both directions.
pub trait Animate: Copy + Send + Sync + 'static {
    /// Kind tag used to look up the interpolator
    const KIND: ValueKind;

    fn into_value(self) -> AnimValue;

    fn from_value(value: AnimValue) -> Option<Self>;
}

macro_rules! impl_animate {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Animate for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn into_value(self) -> AnimValue {
                    AnimValue::$variant(self)
                }

                fn from_value(value: AnimValue) -> Option<Self> {
                    match value {
                        AnimValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for AnimValue {
                fn from(v: $ty) -> Self {
                    AnimValue::$variant(v)
                }
            }
        )*
    };
}

impl_animate! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Fixed => Fixed,
    Point => Point,
    PointF => PointF,
    Size => Size,
    SizeF => SizeF,
    Rect => Rect,
    RectF => RectF,
    Color => Color,
    Padding => Padding,
}

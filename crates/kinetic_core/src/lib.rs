//! Kinetic Core
//!
//! Foundational types shared by the Kinetic animation engine:
//!
//! - **Value Model**: [`ValueKind`] tags, the [`AnimValue`] union and the
//!   [`Animate`] trait implemented by every animatable Rust type
//! - **Geometry**: point, size, rectangle, color and padding aggregates
//! - **Property Metadata**: the [`PropertyMetadata`] capability and the
//!   bundled [`PropertyTable`] that produce [`Setter`]s
//! - **UI Context**: the [`UiContext`] capability that owns UI objects, with
//!   the bundled [`Dispatcher`] and [`Clock`] implementations
//!
//! Nothing in this crate spawns threads.

pub mod context;
pub mod error;
pub mod geometry;
pub mod property;
pub mod value;

pub use context::{
    duration_to_ticks, Clock, Dispatcher, ErrorHandler, ManualClock, SystemClock, Task, UiContext,
    WakeCallback, TICKS_PER_SECOND,
};
pub use error::{PropertyError, StepError};
pub use geometry::{Color, Padding, Point, PointF, Rect, RectF, Size, SizeF};
pub use property::{PropertyDescriptor, PropertyMetadata, PropertyTable, Setter, Target};
pub use value::{AnimValue, Animate, Fixed, ValueKind};

//! # MathPad Client
//!
//! The drawing side of MathPad:
//! 1. Strokes land on a [`Surface`]
//! 2. [`Pad::solve`] finds the drawing's bounding box and snapshots it as PNG
//! 3. The snapshot and known variables go to the gateway
//! 4. Assignments fold into the variable map, a label lands over the drawing,
//!    and the strokes are wiped

mod overlay;
mod pad;
mod state;
mod surface;
mod transport;

pub use overlay::OverlayLabel;
pub use pad::Pad;
pub use state::{CanvasEvent, CanvasState, SurfaceEffect};
pub use surface::{BoundingBox, Point, Surface, TRANSPARENT};
pub use transport::{HttpTransport, SolveTransport, DEFAULT_GATEWAY};

//! # Pad
//!
//! One drawing session: a surface, its state and a way to reach the gateway.
//!
//! ```text
//! draw ──> solve() ──> bbox scan ──> snapshot ──> transport
//!                                                    │
//!          labels / variables / clear <── apply ◄────┘
//! ```

use crate::state::{CanvasEvent, CanvasState, SurfaceEffect};
use crate::surface::{Point, Surface};
use crate::transport::SolveTransport;
use mathpad_error::{Error, Result};
use mathpad_gateway::SolveResultRecord;

pub struct Pad<T> {
    surface: Surface,
    state: CanvasState,
    transport: T,
}

impl<T: SolveTransport> Pad<T> {
    pub fn new(surface: Surface, transport: T) -> Self {
        Self {
            surface,
            state: CanvasState::new(),
            transport,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Draw on this
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Swap in a new drawing, keeping labels and variables
    pub fn replace_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Send the current drawing to the gateway.
    ///
    /// A blank surface is rejected without a request. On failure, labels,
    /// variables and strokes are left as they were. Dropping the returned
    /// future mid-request (a caller-side timeout, say) counts as a failure,
    /// so the pad is ready for the next call.
    pub async fn solve(&mut self) -> Result<Vec<SolveResultRecord>> {
        if self.state.is_in_flight() {
            return Err(Error::solve_in_flight().with_operation("pad::solve"));
        }

        let Some(bbox) = self.surface.bounding_box() else {
            return Err(Error::invalid_input("nothing has been drawn").with_operation("pad::solve"));
        };
        let anchor = bbox.center();

        let image = self.surface.to_data_uri()?;
        let request = self.state.build_request(image);

        let Pad { surface, state, transport } = self;
        let mut pending = InFlight::start(state);

        match transport.solve(&request).await {
            Ok(records) => {
                tracing::info!(records = records.len(), x = anchor.x, y = anchor.y, "solved");
                let effect = pending.finish(CanvasEvent::SolveSucceeded {
                    records: records.clone(),
                    anchor,
                });
                if effect == SurfaceEffect::Clear {
                    surface.clear();
                }
                Ok(records)
            }
            Err(err) => {
                tracing::warn!(error = %err, "solve failed");
                let _ = pending.finish(CanvasEvent::SolveFailed);
                Err(err.with_operation("pad::solve"))
            }
        }
    }

    pub fn drag_label(&mut self, index: usize, position: Point) {
        let effect = self.state.apply(CanvasEvent::LabelDragged { index, position });
        self.sync_surface(effect);
    }

    pub fn reset(&mut self) {
        let effect = self.state.apply(CanvasEvent::Reset);
        self.sync_surface(effect);
    }

    fn sync_surface(&mut self, effect: SurfaceEffect) {
        if effect == SurfaceEffect::Clear {
            self.surface.clear();
        }
    }
}

/// Marks the state in flight for as long as a request is outstanding.
/// If it is dropped before [`InFlight::finish`], the solve counts as failed.
struct InFlight<'a> {
    state: &'a mut CanvasState,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut CanvasState) -> Self {
        let _ = state.apply(CanvasEvent::SolveStarted);
        Self { state, done: false }
    }

    fn finish(&mut self, outcome: CanvasEvent) -> SurfaceEffect {
        self.done = true;
        self.state.apply(outcome)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!("solve abandoned mid-request");
            let _ = self.state.apply(CanvasEvent::SolveFailed);
        }
    }
}

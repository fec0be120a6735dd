//! Rendering module
//!
//! Draws the session onto any [`Canvas`]: a command recorder for tests, or
//! a tessellating canvas that produces vertex data for a GPU backend.

pub mod canvas;
pub mod frame;
pub mod shapes;
pub mod vertex;

pub use canvas::{Canvas, CommandList, DrawCommand};
pub use frame::{Camera, RenderItem, collect_items, draw_frame};
pub use shapes::{TextRun, VertexCanvas};
pub use vertex::{Color, Vertex, colors};

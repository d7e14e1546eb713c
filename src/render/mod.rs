//! Rendering: draw command buffers, software compositing and the render thread

pub mod canvas;
pub mod command;
pub mod pipeline;

pub use canvas::Canvas;
pub use command::{DrawCommand, RenderBuffer};
pub use pipeline::{Display, FrameSlot, HeadlessDisplay, RenderHandle, RenderStats};

//! Draw commands and per-frame command buffers

use crate::assets::ImageHandle;
use crate::sim::Rect;

/// One blit: image at the top-left of `rect`, ordered by `zorder`
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub zorder: i32,
    pub image: ImageHandle,
    pub rect: Rect,
}

/// All commands for one frame, in paint order
#[derive(Debug, Clone, Default)]
pub struct RenderBuffer {
    /// Simulation tick that produced the buffer
    pub tick: u64,
    commands: Vec<DrawCommand>,
}

impl RenderBuffer {
    /// Stable sort by z-order: equal z keeps emission order
    pub fn new(tick: u64, mut commands: Vec<DrawCommand>) -> Self {
        commands.sort_by_key(|c| c.zorder);
        Self { tick, commands }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

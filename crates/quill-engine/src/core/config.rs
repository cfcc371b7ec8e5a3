use crate::paint::Color;
use crate::render::BatchConfig;

/// Settings for [`super::Context::new`].
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub batch: BatchConfig,
    /// Edge length of every font's square glyph atlas, in texels.
    pub atlas_size: u32,
    /// Color `new_frame` clears to.
    pub clear_color: Color,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            atlas_size: 1024,
            clear_color: Color::BLACK,
        }
    }
}

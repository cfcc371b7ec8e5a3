use crate::render::FrameTarget;

/// A single acquired swapchain image.
///
/// Holding the surface texture blocks acquisition of the next frame; hand it
/// back through [`super::Gpu::present`] promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    /// Depth view matching the surface size.
    pub depth: wgpu::TextureView,
}

impl GpuFrame {
    /// Views for the batch backend to render into.
    pub fn target(&self) -> FrameTarget {
        FrameTarget {
            color: self.view.clone(),
            depth: self.depth.clone(),
            width: self.surface_texture.texture.width(),
            height: self.surface_texture.texture.height(),
        }
    }
}

//! Render-target framebuffers and texture handles.

use std::sync::Arc;

use glam::UVec2;

/// Identifier of a framebuffer allocated by a [`crate::FramebufferCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u64);

/// A color render target of a fixed size.
#[derive(Debug, PartialEq, Eq)]
pub struct Framebuffer {
    id: FramebufferId,
    size: UVec2,
    format: wgpu::TextureFormat,
}

/// Shared-ownership handle to a framebuffer.
pub type FramebufferPointer = Arc<Framebuffer>;

impl Framebuffer {
    pub fn new(id: FramebufferId, size: UVec2, format: wgpu::TextureFormat) -> Self {
        Self {
            id,
            size: size.max(UVec2::ONE),
            format,
        }
    }

    pub fn id(&self) -> FramebufferId {
        self.id
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Descriptor a GPU back end allocates the color attachment with.
    pub fn texture_descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some("Frame Framebuffer"),
            size: wgpu::Extent3d {
                width: self.size.x,
                height: self.size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        }
    }
}

/// Handle to a texture produced by a pass (e.g. the 2D overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub id: u64,
    pub size: UVec2,
}

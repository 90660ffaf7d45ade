use thiserror::Error;

/// Rejected hierarchy edits.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("entity {0:?} cannot be its own parent")]
    SelfParent(hecs::Entity),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        parent: hecs::Entity,
        child: hecs::Entity,
    },
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(hecs::Entity),
    #[error("entity {0:?} has no Transform and cannot take part in the hierarchy")]
    NoTransform(hecs::Entity),
}

#[derive(Error, Debug)]
pub enum SaveDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed save data: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture size {width}x{height} has no pixels")]
    Empty { width: u32, height: u32 },
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// Failures while bringing up the GPU.
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

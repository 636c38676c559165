//! Seam between the engine and whatever actually draws the bars.

use thiserror::Error;

/// Handle to one backend-owned visual instance.
///
/// Opaque to the engine; backends mint and interpret the payload. Handles
/// are invalidated wholesale by a reconfigure, so nothing outside the engine
/// may cache them across trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Per-instance transform in the band's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    /// Local position; X horizontal, Y vertical, Z zero on the band plane.
    pub position: [f32; 3],
    /// Rotation about the view axis, degrees.
    pub tilt_deg: f32,
    /// Local scale; the depth component is near-zero but never zero.
    pub scale: [f32; 3],
}

/// Linear RGBA pushed as a non-destructive per-instance override, never as a
/// mutation of a shared material resource.
pub type ColorRgba = [f32; 4];

/// Placement of the whole band relative to the viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandAnchor {
    /// World position of the band's origin, `distance_m` along the forward
    /// axis.
    pub position: [f32; 3],
    /// Viewpoint forward axis the band plane faces against.
    pub forward: [f32; 3],
}

/// Errors surfaced by a rendering backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The configured visual template is unavailable. Fatal to the engine,
    /// which disables itself rather than crash the host.
    #[error("visual template unavailable: {0}")]
    MissingTemplate(&'static str),
    /// The handle does not name a live instance.
    #[error("unknown instance handle {0}")]
    UnknownInstance(u64),
}

/// Rendering capability the engine drives.
///
/// Implementations own instance lifetime and material plumbing; the engine
/// only speaks handles, transforms, and color overrides.
pub trait RenderBackend {
    /// Stable identifier describing the backend implementation.
    fn name(&self) -> &'static str;

    /// Instantiates one bar from the configured visual template.
    fn create_instance(&mut self) -> Result<InstanceHandle, BackendError>;

    /// Destroys a previously created instance.
    fn destroy_instance(&mut self, handle: InstanceHandle) -> Result<(), BackendError>;

    /// Places the whole band relative to the viewpoint.
    fn set_band_anchor(&mut self, anchor: BandAnchor);

    /// Updates one instance's local transform.
    fn set_transform(
        &mut self,
        handle: InstanceHandle,
        transform: InstanceTransform,
    ) -> Result<(), BackendError>;

    /// Applies a per-instance color override. Backends try every configured
    /// color-property alias, since the bound rendering technique is unknown
    /// to the engine.
    fn set_color(&mut self, handle: InstanceHandle, color: ColorRgba) -> Result<(), BackendError>;
}

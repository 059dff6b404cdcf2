//! Surface providers
//!
//! This module defines the boundary between the occlusion engine and
//! whatever enumerates real on-screen surfaces. Win32 access is confined to
//! the `windows` submodule; everything else works on plain descriptors.

pub mod snapshot;
#[cfg(windows)]
pub mod windows;

use std::sync::Arc;

use thiserror::Error;

use crate::domain::surface::SurfaceDescriptor;

pub use snapshot::SnapshotProvider;

/// Errors raised while enumerating surfaces
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The surface source cannot be read right now
    #[error("Surface source unavailable: {reason}")]
    Unavailable { reason: String },

    /// A system call failed during enumeration
    #[error("System error {code} while {context}")]
    System { code: i32, context: String },

    /// No provider exists for this platform
    #[error("Surface enumeration is not supported on this platform")]
    Unsupported,
}

/// Source of on-screen surfaces
///
/// Implementations return a fresh snapshot on every call, ordered front to
/// back, with `z_index` equal to each descriptor's position.
pub trait SurfaceProvider {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError>;
}

impl<P: SurfaceProvider + ?Sized> SurfaceProvider for &P {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError> {
        (**self).all_surfaces()
    }
}

impl<P: SurfaceProvider + ?Sized> SurfaceProvider for Box<P> {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError> {
        (**self).all_surfaces()
    }
}

impl<P: SurfaceProvider + ?Sized> SurfaceProvider for Arc<P> {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError> {
        (**self).all_surfaces()
    }
}

/// Provider backed by the native window system
#[cfg(windows)]
pub fn default_provider() -> Result<Box<dyn SurfaceProvider + Send + Sync>, ProviderError> {
    Ok(Box::new(self::windows::Win32Provider::new()))
}

/// Provider backed by the native window system
#[cfg(not(windows))]
pub fn default_provider() -> Result<Box<dyn SurfaceProvider + Send + Sync>, ProviderError> {
    Err(ProviderError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::Rect;

    #[test]
    fn blanket_impls_forward() {
        let provider = SnapshotProvider::new(vec![SurfaceDescriptor::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
        )]);

        let by_ref: &SnapshotProvider = &provider;
        assert_eq!(by_ref.all_surfaces().unwrap().len(), 1);

        let boxed: Box<dyn SurfaceProvider> = Box::new(provider.clone());
        assert_eq!(boxed.all_surfaces().unwrap().len(), 1);

        let shared = Arc::new(provider);
        assert_eq!(shared.all_surfaces().unwrap().len(), 1);
    }

    #[test]
    fn provider_error_messages() {
        let err = ProviderError::System {
            code: 5,
            context: "enumerating windows".to_string(),
        };
        assert_eq!(err.to_string(), "System error 5 while enumerating windows");
        assert!(ProviderError::Unsupported.to_string().contains("not supported"));
    }

    #[cfg(not(windows))]
    #[test]
    fn default_provider_unsupported_off_windows() {
        assert!(matches!(default_provider(), Err(ProviderError::Unsupported)));
    }
}

//! Owner of sampler objects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use texcache_core::sampler::SamplerParameters;

use crate::device::GraphicsDevice;

use super::{SamplerObject, TextureObject};

/// Creates sampler objects and drops the ones no handle uses anymore.
///
/// Samplers are not shared: every allocation creates new device state.
pub struct SamplerObjectRegistry {
    device: Arc<GraphicsDevice>,
    samplers: Mutex<Vec<Arc<SamplerObject>>>,
    garbage_collection_needed: AtomicBool,
}

impl SamplerObjectRegistry {
    /// Create an empty registry.
    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        Self {
            device,
            samplers: Mutex::new(Vec::new()),
            garbage_collection_needed: AtomicBool::new(false),
        }
    }

    /// Create sampler state for `texture`. Call from the commit thread only.
    ///
    /// Returns `None` and logs if the device rejects the sampler.
    pub fn allocate_sampler(
        &self,
        texture: &TextureObject,
        parameters: &SamplerParameters,
        create_bindless_handle: bool,
    ) -> Option<Arc<SamplerObject>> {
        match SamplerObject::new(&self.device, texture, parameters, create_bindless_handle) {
            Ok(sampler) => {
                let sampler = Arc::new(sampler);
                self.samplers.lock().push(Arc::clone(&sampler));
                log::trace!("Allocated {:?} sampler for {}", texture.texture_type(), texture.identifier());
                Some(sampler)
            }
            Err(e) => {
                log::error!("Failed to create sampler for {}: {e}", texture.identifier());
                None
            }
        }
    }

    /// Request a sweep by the next [`garbage_collect`](Self::garbage_collect).
    pub fn mark_garbage_collection_needed(&self) {
        self.garbage_collection_needed.store(true, Ordering::Release);
    }

    /// Drop samplers only the registry references, if a sweep was requested.
    pub fn garbage_collect(&self) {
        if !self.garbage_collection_needed.swap(false, Ordering::AcqRel) {
            return;
        }
        let mut samplers = self.samplers.lock();
        let before = samplers.len();
        samplers.retain(|sampler| Arc::strong_count(sampler) > 1);
        log::debug!("Garbage collected {} samplers", before - samplers.len());
    }

    /// Number of sampler objects alive in the registry.
    pub fn len(&self) -> usize {
        self.samplers.lock().len()
    }

    /// Returns true if the registry holds no samplers.
    pub fn is_empty(&self) -> bool {
        self.samplers.lock().is_empty()
    }
}

impl std::fmt::Debug for SamplerObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerObjectRegistry")
            .field("samplers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::parallel::ParConfig;
    use crate::textures::TextureObjectRegistry;
    use crate::types::{AddressMode, BorderColor};
    use rstest::rstest;
    use texcache_core::identifier::{SubtextureIdentifier, TextureIdentifier};
    use texcache_core::io::{MemoryImage, MemoryLoader};
    use texcache_core::math::BBox3d;
    use texcache_core::sampler::WrapMode;
    use texcache_core::texture::{CpuTexture, TextureFormat, TextureType};

    struct Fixture {
        backend: Arc<DummyBackend>,
        objects: TextureObjectRegistry,
        samplers: SamplerObjectRegistry,
    }

    fn fixture() -> Fixture {
        let loader = Arc::new(MemoryLoader::new());
        let texels = CpuTexture::filled_2d(4, 4, TextureFormat::Rgba8Unorm, &[1; 4]);
        loader.insert_image("hinted.png", MemoryImage::new(texels.clone()).with_wrap(WrapMode::Mirror, WrapMode::Clamp));
        loader.insert_image("plain.png", MemoryImage::new(texels));
        loader.insert_field(
            "smoke.vdb",
            "density",
            0,
            CpuTexture::new_3d(2, 2, 2, TextureFormat::R32Float, vec![0; 32]),
            BBox3d::default(),
        );

        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        Fixture {
            backend,
            objects: TextureObjectRegistry::new(device.clone(), loader, ParConfig::default()),
            samplers: SamplerObjectRegistry::new(device),
        }
    }

    fn committed(fixture: &Fixture, id: TextureIdentifier, texture_type: TextureType) -> Arc<TextureObject> {
        let object = fixture.objects.allocate_texture_object(&id, texture_type).unwrap();
        fixture.objects.commit();
        object
    }

    #[rstest]
    #[case::explicit_wins(WrapMode::Repeat, "hinted.png", AddressMode::Repeat)]
    #[case::hint_used(WrapMode::NoOpinion, "hinted.png", AddressMode::MirrorRepeat)]
    #[case::legacy_hint_used(WrapMode::LegacyNoOpinionFallbackRepeat, "hinted.png", AddressMode::MirrorRepeat)]
    #[case::no_hint_black(WrapMode::NoOpinion, "plain.png", AddressMode::ClampToBorder)]
    #[case::no_hint_legacy_repeat(WrapMode::LegacyNoOpinionFallbackRepeat, "plain.png", AddressMode::Repeat)]
    #[case::missing_file(WrapMode::NoOpinion, "missing.png", AddressMode::ClampToBorder)]
    fn test_uv_wrap_resolution(#[case] wrap: WrapMode, #[case] path: &str, #[case] expected: AddressMode) {
        let fixture = fixture();
        let object = committed(&fixture, TextureIdentifier::new(path), TextureType::Uv);
        let parameters = SamplerParameters::default().with_wrap(wrap);

        let sampler = fixture.samplers.allocate_sampler(&object, &parameters, false).unwrap();
        assert_eq!(sampler.descriptor().address_mode_u, expected);
        if expected == AddressMode::ClampToBorder {
            assert_eq!(sampler.descriptor().border_color, Some(BorderColor::TransparentBlack));
        }
    }

    #[test]
    fn test_hint_applies_per_axis() {
        let fixture = fixture();
        let object = committed(&fixture, TextureIdentifier::new("hinted.png"), TextureType::Uv);
        let parameters = SamplerParameters::default().with_wrap(WrapMode::NoOpinion);
        let sampler = fixture.samplers.allocate_sampler(&object, &parameters, false).unwrap();
        let descriptor = sampler.descriptor();
        assert_eq!(descriptor.address_mode_u, AddressMode::MirrorRepeat);
        assert_eq!(descriptor.address_mode_v, AddressMode::ClampToEdge);
        assert_eq!(descriptor.address_mode_w, AddressMode::ClampToBorder);
    }

    #[test]
    fn test_field_forces_clamp() {
        let fixture = fixture();
        let id = TextureIdentifier::with_subtexture("smoke.vdb", SubtextureIdentifier::open_vdb("density", 0));
        let object = committed(&fixture, id, TextureType::Field);
        let parameters = SamplerParameters::default().with_wrap(WrapMode::Repeat);

        let sampler = fixture.samplers.allocate_sampler(&object, &parameters, false).unwrap();
        assert_eq!(sampler.descriptor().address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(sampler.descriptor().address_mode_w, AddressMode::ClampToEdge);
        assert!(sampler.layout_sampler().is_none());
    }

    #[test]
    fn test_bindless_token_tracks_texture() {
        let fixture = fixture();
        let object = committed(&fixture, TextureIdentifier::new("plain.png"), TextureType::Uv);
        let parameters = SamplerParameters::linear();

        let sampler = fixture.samplers.allocate_sampler(&object, &parameters, true).unwrap();
        assert_ne!(sampler.bindless_handle(), 0);
        assert!(sampler.is_current(&object, &parameters, true));
        assert!(!sampler.is_current(&object, &parameters, false));

        // A reload swaps the device texture, so the token is stale.
        object.set_target_memory(16);
        fixture.objects.commit();
        assert!(!sampler.is_current(&object, &parameters, true));
    }

    #[test]
    fn test_invalid_texture_has_no_token() {
        let fixture = fixture();
        let object = committed(&fixture, TextureIdentifier::new("missing.png"), TextureType::Uv);
        let sampler = fixture.samplers.allocate_sampler(&object, &SamplerParameters::default(), true).unwrap();
        assert_eq!(sampler.bindless_handle(), 0);
        assert!(sampler.is_current(&object, &SamplerParameters::default(), true));
    }

    #[test]
    fn test_garbage_collect_only_when_flagged() {
        let fixture = fixture();
        let object = committed(&fixture, TextureIdentifier::new("plain.png"), TextureType::Uv);
        let kept = fixture.samplers.allocate_sampler(&object, &SamplerParameters::default(), true);
        let dropped = fixture.samplers.allocate_sampler(&object, &SamplerParameters::default(), true);
        drop(dropped);

        fixture.samplers.garbage_collect();
        assert_eq!(fixture.samplers.len(), 2);

        fixture.samplers.mark_garbage_collection_needed();
        fixture.samplers.garbage_collect();
        assert_eq!(fixture.samplers.len(), 1);
        assert!(kept.is_some());
        assert_eq!(fixture.backend.stats().live_samplers(), 1);
        assert_eq!(fixture.backend.stats().resident_bindless_handles(), 1);
    }
}

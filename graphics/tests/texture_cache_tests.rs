//! Integration tests for the texture cache.
//!
//! These tests drive [`TextureCache`] end to end against the dummy backend
//! and an in-memory loader: memory budgets, reloads, garbage collection,
//! sampler state and consumer notification.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p texcache-graphics --test texture_cache_tests
//! ```

mod common;

use std::sync::Arc;

use rstest::rstest;
use texcache_core::identifier::{SubtextureIdentifier, TextureIdentifier};
use texcache_core::io::FaceAtlas;
use texcache_core::math::BBox3d;
use texcache_core::sampler::SamplerParameters;
use texcache_core::texture::{CpuTexture, TextureFormat, TextureType};
use texcache_graphics::textures::binder::{buffer_specs, compute_buffer_sources};
use texcache_graphics::{NamedTextureHandle, TextureCacheStats, TextureDimension};

use common::{CountingConsumer, TestCache, MIB};

// ============================================================================
// Memory Budgets
// ============================================================================

#[test]
fn test_largest_memory_request_wins() {
    let t = TestCache::new();
    t.insert_rgba("wall.png", 1024, 1024);
    let small = t.uv_handle("wall.png", 4 * MIB);
    let large = t.uv_handle("wall.png", 8 * MIB);
    t.cache.commit();

    let object = Arc::clone(small.texture_object());
    assert!(Arc::ptr_eq(&object, large.texture_object()));
    assert_eq!(object.target_memory(), 8 * MIB);
    let full = object.texture().unwrap();
    assert_eq!(full.width(), 1024);
    assert_eq!(full.mip_level_count(), 11);

    drop(large);
    t.cache.commit();

    assert_eq!(object.target_memory(), 4 * MIB);
    let reduced = object.texture().unwrap();
    assert_ne!(reduced.id(), full.id());
    assert_eq!(reduced.width(), 512);
    assert!(object.committed_memory() <= 4 * MIB);
    assert_eq!(t.cache.stats().texture_memory, object.committed_memory());
}

#[test]
fn test_type_budget_applies_without_requests() {
    let t = TestCache::new();
    t.insert_rgba("wall.png", 256, 256);
    let handle = t.uv_handle("wall.png", 0);
    t.cache.commit();
    assert_eq!(handle.texture_object().texture().unwrap().width(), 256);

    t.cache.set_memory_request_for_texture_type(TextureType::Uv, 64 * 1024);
    t.cache.commit();
    let texture = handle.texture_object().texture().unwrap();
    assert_eq!(texture.width(), 64);
    assert!(handle.texture_object().committed_memory() <= 64 * 1024);
}

// ============================================================================
// Failure Handling
// ============================================================================

#[test]
fn test_missing_file_is_invalid() {
    let t = TestCache::new();
    let handle = t.uv_handle("missing.png", 0);
    t.cache.commit();

    assert!(!handle.is_valid());
    assert!(handle.texture_object().texture().is_none());
    assert!(handle.sampler_object().is_some());
    assert_eq!(t.cache.stats().texture_memory, 0);
    assert_eq!(t.backend.stats().live_textures(), 0);

    // The file showing up later is picked up by a reload.
    t.insert_rgba("missing.png", 4, 4);
    t.cache.reload_resource("missing.png");
    t.cache.commit();
    assert!(handle.is_valid());
}

#[test]
fn test_type_conflict_rejected() {
    let t = TestCache::new();
    let id = TextureIdentifier::new("skin.<UDIM>.png");
    let _udim = t.handle(id.clone(), TextureType::Udim, 0);
    let conflicting = t
        .cache
        .allocate_texture_handle(&id, TextureType::Uv, SamplerParameters::default(), 0, false, None);
    assert!(conflicting.is_none());
}

// ============================================================================
// Deduplication, Reload and Garbage Collection
// ============================================================================

#[test]
fn test_two_grids_in_one_file() {
    let t = TestCache::new();
    for name in ["density", "temperature"] {
        t.loader.insert_field(
            "clouds.vdb",
            name,
            0,
            CpuTexture::new_3d(4, 4, 4, TextureFormat::R32Float, vec![0; 256]),
            BBox3d::default(),
        );
    }
    let grid = |name: &str| TextureIdentifier::with_subtexture("clouds.vdb", SubtextureIdentifier::open_vdb(name, 0));
    let density = t.handle(grid("density"), TextureType::Field, 0);
    let temperature = t.handle(grid("temperature"), TextureType::Field, 0);
    t.cache.commit();

    assert!(!Arc::ptr_eq(density.texture_object(), temperature.texture_object()));
    assert!(density.is_valid() && temperature.is_valid());
    assert_eq!(t.loader.open_count("clouds.vdb"), 2);
    let before = density.texture_object().texture().unwrap().id();

    t.cache.reload_resource("clouds.vdb");
    t.cache.commit();
    assert_eq!(t.loader.open_count("clouds.vdb"), 4);
    assert_ne!(density.texture_object().texture().unwrap().id(), before);
    assert_eq!(density.texture_object().texture().unwrap().dimension(), TextureDimension::D3);
}

#[test]
fn test_reload_only_touches_dirty_path() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    t.insert_rgba("b.png", 8, 8);
    let _a = t.uv_handle("a.png", 0);
    let _b = t.uv_handle("b.png", 0);
    t.cache.commit();

    t.cache.reload_resource("a.png");
    t.cache.commit();
    assert_eq!(t.loader.open_count("a.png"), 2);
    assert_eq!(t.loader.open_count("b.png"), 1);
}

#[test]
fn test_idle_commit_is_free() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    let _a = t.uv_handle("a.png", 0);
    t.cache.commit();
    let device_calls = t.backend.stats();
    let stats = t.cache.stats();

    assert!(t.cache.commit().is_empty());
    assert_eq!(t.backend.stats(), device_calls);
    assert_eq!(t.cache.stats(), stats);
    assert_eq!(t.loader.open_count("a.png"), 1);
}

#[test]
fn test_garbage_collection() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    t.insert_rgba("b.png", 8, 8);
    let kept = t.uv_handle("a.png", 0);
    let dropped = t.uv_handle("b.png", 0);
    t.cache.commit();
    assert_eq!(t.cache.stats().texture_objects, 2);

    drop(dropped);
    t.cache.commit();
    assert_eq!(
        t.cache.stats(),
        TextureCacheStats {
            texture_objects: 1,
            texture_handles: 1,
            samplers: 1,
            texture_memory: kept.texture_object().committed_memory(),
        }
    );

    drop(kept);
    t.cache.commit();
    assert_eq!(t.cache.stats(), TextureCacheStats::default());
    assert_eq!(t.backend.stats().live_textures(), 0);
    assert_eq!(t.backend.stats().live_samplers(), 0);
}

#[test]
fn test_dropping_only_budgeted_handle_frees_texture() {
    let t = TestCache::new();
    t.insert_rgba("big.png", 2048, 2048);
    let handle = t.uv_handle("big.png", 8 * MIB);
    t.cache.commit();
    assert!(handle.texture_object().committed_memory() <= 8 * MIB);

    drop(handle);
    t.cache.commit();
    assert_eq!(t.loader.open_count("big.png"), 1);
    assert_eq!(t.cache.stats().texture_objects, 0);
    assert_eq!(t.cache.stats().texture_memory, 0);
    assert_eq!(t.backend.stats().live_textures(), 0);
}

#[test]
fn test_handles_share_objects_not_samplers() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    let first = t.uv_handle("a.png", 0);
    let second = t.uv_handle("a.png", 0);
    t.cache.commit();

    assert!(Arc::ptr_eq(first.texture_object(), second.texture_object()));
    assert!(!Arc::ptr_eq(&first.sampler_object().unwrap(), &second.sampler_object().unwrap()));
    assert_eq!(t.cache.stats().texture_objects, 1);
    assert_eq!(t.cache.stats().samplers, 2);
}

// ============================================================================
// Device Features
// ============================================================================

#[rstest]
#[case::gpu_mipmaps(true)]
#[case::cpu_mipmaps(false)]
fn test_mipmaps(#[case] gpu_features: bool) {
    let t = if gpu_features {
        TestCache::new()
    } else {
        TestCache::without_features()
    };
    t.insert_rgba("a.png", 64, 64);
    let handle = t.uv_handle("a.png", 0);
    t.cache.commit();

    assert_eq!(handle.texture_object().texture().unwrap().mip_level_count(), 7);
    let stats = t.backend.stats();
    if gpu_features {
        assert_eq!((stats.mipmaps_generated, stats.texture_writes), (1, 1));
    } else {
        assert_eq!((stats.mipmaps_generated, stats.texture_writes), (0, 7));
    }
}

#[test]
fn test_bindless_tokens_follow_reloads() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    let handle = t
        .cache
        .allocate_texture_handle(
            &TextureIdentifier::new("a.png"),
            TextureType::Uv,
            SamplerParameters::linear(),
            0,
            true,
            None,
        )
        .unwrap();
    t.cache.commit();
    let first = handle.sampler_object().unwrap().bindless_handle();
    assert_ne!(first, 0);

    t.cache.reload_resource("a.png");
    t.cache.commit();
    let second = handle.sampler_object().unwrap().bindless_handle();
    assert_ne!(second, 0);
    assert_ne!(second, first);
    assert_eq!(t.backend.stats().resident_bindless_handles(), 1);
}

#[test]
fn test_bindless_unsupported() {
    let t = TestCache::without_features();
    t.insert_rgba("a.png", 8, 8);
    let handle = t
        .cache
        .allocate_texture_handle(
            &TextureIdentifier::new("a.png"),
            TextureType::Uv,
            SamplerParameters::default(),
            0,
            true,
            None,
        )
        .unwrap();
    t.cache.commit();
    assert!(handle.is_valid());
    assert_eq!(handle.sampler_object().unwrap().bindless_handle(), 0);

    // No churn: the sampler stays current.
    let samplers_created = t.backend.stats().samplers_created;
    t.cache.reload_resource("a.png");
    t.cache.commit();
    assert_eq!(t.backend.stats().samplers_created, samplers_created);
}

// ============================================================================
// Layout Textures
// ============================================================================

#[test]
fn test_ptex_and_udim() {
    let t = TestCache::new();
    t.loader.insert_face_atlas(
        "head.ptx",
        FaceAtlas {
            faces: vec![
                CpuTexture::filled_2d(16, 16, TextureFormat::Rgba8Unorm, &[1; 4]),
                CpuTexture::filled_2d(8, 8, TextureFormat::Rgba8Unorm, &[2; 4]),
                CpuTexture::filled_2d(8, 4, TextureFormat::Rgba8Unorm, &[3; 4]),
            ],
        },
    );
    t.insert_rgba("skin.1001.png", 16, 16);
    t.insert_rgba("skin.1012.png", 8, 8);

    let ptex = t.handle(TextureIdentifier::new("head.ptx"), TextureType::Ptex, 0);
    let udim = t.handle(TextureIdentifier::new("skin.<UDIM>.png"), TextureType::Udim, 0);
    t.cache.commit();

    for handle in [&ptex, &udim] {
        assert!(handle.is_valid());
        assert!(handle.texture_object().layout_texture().is_some());
        let sampler = handle.sampler_object().unwrap();
        assert!(sampler.layout_sampler().is_some());
    }
    let layers = udim.texture_object().texture().unwrap();
    assert_eq!(layers.dimension(), TextureDimension::D2Array);
    assert_eq!(layers.depth(), 2);
    assert_eq!(layers.width(), 16);
}

// ============================================================================
// Consumers and Binder
// ============================================================================

#[test]
fn test_consumer_notification() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);
    t.insert_rgba("b.png", 8, 8);
    let consumer = Arc::new(CountingConsumer::default());
    let allocate = |path: &str| {
        t.cache
            .allocate_texture_handle(
                &TextureIdentifier::new(path),
                TextureType::Uv,
                SamplerParameters::default(),
                0,
                false,
                Some(consumer.weak()),
            )
            .unwrap()
    };
    let _a = allocate("a.png");
    let b = allocate("b.png");

    assert_eq!(t.cache.commit().len(), 1);
    assert_eq!(consumer.refreshes(), 1);

    t.cache.reload_resource("a.png");
    t.cache.commit();
    assert_eq!(consumer.refreshes(), 2);

    t.cache.commit();
    assert_eq!(consumer.refreshes(), 2);

    drop(b);
    t.cache.commit();
    assert_eq!(consumer.refreshes(), 3);
}

#[test]
fn test_binder_fields_for_material() {
    let t = TestCache::new();
    t.insert_rgba("albedo.png", 8, 8);
    let albedo = t.uv_handle("albedo.png", 0);
    let skin = t.handle(TextureIdentifier::new("skin.<UDIM>.png"), TextureType::Udim, 0);
    t.cache.commit();

    let handles = vec![
        NamedTextureHandle::new("albedo", TextureType::Uv, albedo),
        NamedTextureHandle::new("skin", TextureType::Udim, skin),
    ];
    let specs = buffer_specs(&handles, false);
    let sources = compute_buffer_sources(&handles, false);
    assert_eq!(specs.len(), 1);
    assert_eq!(sources[0].name, "albedo_valid");
    assert_eq!(sources[0].data, 1u32.to_ne_bytes());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_allocation_shares_one_object() {
    let t = TestCache::new();
    t.insert_rgba("a.png", 8, 8);

    let handles: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..16).map(|_| scope.spawn(|| t.uv_handle("a.png", 0))).collect();
        workers.into_iter().map(|worker| worker.join().unwrap()).collect()
    });
    assert_eq!(t.cache.stats().texture_objects, 1);
    assert!(handles
        .iter()
        .all(|handle| Arc::ptr_eq(handle.texture_object(), handles[0].texture_object())));

    t.cache.commit();
    assert_eq!(t.loader.open_count("a.png"), 1);
    assert_eq!(t.cache.stats().texture_handles, 16);
    assert!(handles.iter().all(|handle| handle.is_valid()));
}

#[test]
fn test_concurrent_dirty_marks_reload_once() {
    let t = TestCache::new();
    let paths: Vec<String> = (0..8).map(|i| format!("tex{i}.png")).collect();
    for path in &paths {
        t.insert_rgba(path, 8, 8);
    }
    let handles: Vec<_> = paths.iter().map(|path| t.uv_handle(path, 0)).collect();
    t.cache.commit();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for (path, handle) in paths.iter().zip(&handles) {
                    t.cache.reload_resource(path);
                    t.cache
                        .registry()
                        .object_registry()
                        .mark_texture_object_dirty(Arc::downgrade(handle.texture_object()));
                }
            });
        }
    });
    t.cache.commit();

    for path in &paths {
        assert_eq!(t.loader.open_count(path), 2, "{path}");
    }
    assert!(t.cache.commit().is_empty());
    assert!(paths.iter().all(|path| t.loader.open_count(path) == 2));
}

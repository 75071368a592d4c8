//! Per-face atlas textures.
//!
//! Faces are packed into pages with a shelf packer. The texel texture is a
//! 2D array with one layer per page. The layout texture has one `R32Uint`
//! row per face holding `(page, x, y, width, height)`.

use std::cmp::Reverse;
use std::sync::Arc;

use texcache_core::io::{ImageOptions, TextureLoader};
use texcache_core::texture::{CpuTexture, TextureFormat};

use super::{upload_texture, Committed};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// Preferred page extent. Pages grow when a single face is larger.
const PAGE_SIZE: u32 = 512;

/// Values per layout row.
pub(crate) const LAYOUT_ROW: usize = 5;

pub(super) struct PtexStaging {
    pages: Option<CpuTexture>,
    layout: Option<CpuTexture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Placement {
    page: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

struct Packing {
    page_width: u32,
    page_height: u32,
    page_count: u32,
    placements: Vec<Placement>,
}

impl Packing {
    fn memory_size(&self, format: TextureFormat) -> usize {
        self.page_width as usize * self.page_height as usize * self.page_count as usize * format.block_size() as usize
    }
}

pub(super) fn load(loader: &dyn TextureLoader, path: &str, options: &ImageOptions, target_memory: usize) -> PtexStaging {
    let empty = PtexStaging {
        pages: None,
        layout: None,
    };
    let atlas = match loader.open_face_atlas(path, options) {
        Ok(atlas) => atlas,
        Err(e) => {
            log::warn!("Failed to open face atlas {path}: {e}");
            return empty;
        }
    };

    match build(&atlas.faces, target_memory) {
        Some((pages, layout)) => PtexStaging {
            pages: Some(pages),
            layout: Some(layout),
        },
        None => {
            log::warn!("Face atlas {path} has no usable faces");
            empty
        }
    }
}

pub(super) fn commit(
    staging: PtexStaging,
    device: &Arc<GraphicsDevice>,
    label: &str,
    committed: &mut Committed,
) -> Result<(), GraphicsError> {
    let (Some(pages), Some(layout)) = (staging.pages, staging.layout) else {
        return Ok(());
    };
    committed.texture = Some(upload_texture(device, &pages, label)?);
    committed.layout = Some(upload_texture(device, &layout, &format!("{label} layout"))?);
    Ok(())
}

/// Pack `faces`, halving all of them until the pages fit `target_memory`.
fn build(faces: &[CpuTexture], target_memory: usize) -> Option<(CpuTexture, CpuTexture)> {
    let format = faces.first()?.format;
    if faces
        .iter()
        .any(|face| face.format != format || face.depth != 1 || !face.is_valid())
    {
        log::warn!("Face atlas faces differ in format or are malformed");
        return None;
    }

    let mut faces = faces.to_vec();
    loop {
        let packing = pack(&faces);
        let at_minimum = faces.iter().all(|face| face.width == 1 && face.height == 1);
        if target_memory == 0 || packing.memory_size(format) <= target_memory || at_minimum {
            return Some(assemble(&faces, &packing, format));
        }
        match faces.iter().map(CpuTexture::downsampled).collect::<Option<Vec<_>>>() {
            Some(smaller) => faces = smaller,
            None => return Some(assemble(&faces, &packing, format)),
        }
    }
}

/// Shelf-pack faces, tallest first, into equally sized pages.
fn pack(faces: &[CpuTexture]) -> Packing {
    let widest = faces.iter().map(|face| face.width).max().unwrap_or(1);
    let tallest = faces.iter().map(|face| face.height).max().unwrap_or(1);
    let total_width: u32 = faces.iter().map(|face| face.width).sum();
    let total_height: u32 = faces.iter().map(|face| face.height).sum();
    let page_width = widest.max(PAGE_SIZE.min(total_width));
    let page_height = tallest.max(PAGE_SIZE.min(total_height));

    let mut order: Vec<usize> = (0..faces.len()).collect();
    order.sort_by_key(|&index| Reverse(faces[index].height));

    let mut placements = vec![Placement::default(); faces.len()];
    let (mut page, mut x, mut y, mut shelf_height) = (0, 0, 0, 0);
    for index in order {
        let (width, height) = (faces[index].width, faces[index].height);
        if x + width > page_width {
            x = 0;
            y += shelf_height;
            shelf_height = 0;
        }
        if y + height > page_height {
            page += 1;
            x = 0;
            y = 0;
            shelf_height = 0;
        }
        placements[index] = Placement {
            page,
            x,
            y,
            width,
            height,
        };
        x += width;
        shelf_height = shelf_height.max(height);
    }

    Packing {
        page_width,
        page_height,
        page_count: page + 1,
        placements,
    }
}

fn assemble(faces: &[CpuTexture], packing: &Packing, format: TextureFormat) -> (CpuTexture, CpuTexture) {
    let texel = format.block_size() as usize;
    let page_row = packing.page_width as usize * texel;
    let page_size = page_row * packing.page_height as usize;
    let mut data = vec![0u8; page_size * packing.page_count as usize];

    for (face, placement) in faces.iter().zip(&packing.placements) {
        let face_row = face.row_size();
        for row in 0..placement.height as usize {
            let dst = placement.page as usize * page_size
                + (placement.y as usize + row) * page_row
                + placement.x as usize * texel;
            data[dst..dst + face_row].copy_from_slice(&face.data[row * face_row..(row + 1) * face_row]);
        }
    }

    let rows: Vec<[u32; LAYOUT_ROW]> = packing
        .placements
        .iter()
        .map(|p| [p.page, p.x, p.y, p.width, p.height])
        .collect();

    let pages = CpuTexture::new_2d_array(
        packing.page_width,
        packing.page_height,
        packing.page_count,
        format,
        data,
    );
    let layout = CpuTexture::new_2d(
        LAYOUT_ROW as u32,
        rows.len() as u32,
        TextureFormat::R32Uint,
        bytemuck::cast_slice(&rows).to_vec(),
    );
    (pages, layout)
}

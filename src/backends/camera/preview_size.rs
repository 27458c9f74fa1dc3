// SPDX-License-Identifier: GPL-3.0-only
//! Preview stream size selection

use super::types::FrameSize;
use tracing::{debug, info};

/// Bounds a preview size has to fit in: the surface, tightened by an optional cap
pub fn allowed_bounds(surface: FrameSize, max: Option<FrameSize>) -> FrameSize {
    match max {
        Some(cap) => FrameSize::new(cap.width.min(surface.width), cap.height.min(surface.height)),
        None => surface,
    }
}

/// Pick the preview size for a surface
///
/// Walks the supported sizes in order and keeps a candidate when it fits the
/// allowed bounds and is neither narrower nor shorter than the one kept so
/// far. Width and height are compared independently; area plays no part.
/// When nothing fits, the first supported size is used as is.
///
/// Returns `None` only for an empty list.
pub fn select_preview_size(
    supported: &[FrameSize],
    surface: FrameSize,
    max: Option<FrameSize>,
) -> Option<FrameSize> {
    let bounds = allowed_bounds(surface, max);
    let mut chosen = FrameSize::default();

    for size in supported {
        debug!(size = %size, bounds = %bounds, "Trying preview size");
        let fits = size.width <= bounds.width && size.height <= bounds.height;
        if fits && size.width >= chosen.width && size.height >= chosen.height {
            chosen = *size;
        }
    }

    if chosen.is_empty() {
        let first = supported.first().copied()?;
        info!(size = %first, "No preview size fits, falling back to the first one");
        return Some(first);
    }

    Some(chosen)
}

//! Coordinate and size-unit normalization.
//!
//! The legacy editor stores positions and sizes as `[x, y, unitType]` tuples
//! whose meaning depends on the parent's content size, while the target
//! runtime wants plain parent-anchor-relative coordinates. Resolution must
//! happen against the parent's *finalized* size, and before the child is
//! repositioned relative to the parent's anchor.

use ccb_data::SizedValue;
use glam::Vec2;

/// Interpretation rule for a size tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Absolute,
    /// Percent of the parent size, both axes.
    Percent,
    /// Inset from the parent's extent: `parent - value`.
    RelativeContainer,
    /// Percent of the parent width; height stays absolute.
    HorizontalPercent,
    /// Percent of the parent height; width stays absolute.
    VerticalPercent,
    /// Pre-scaled by the authoring resolution; passes through.
    MultiplyResolution,
}

impl SizeUnit {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SizeUnit::Percent,
            2 => SizeUnit::RelativeContainer,
            3 => SizeUnit::HorizontalPercent,
            4 => SizeUnit::VerticalPercent,
            5 => SizeUnit::MultiplyResolution,
            _ => SizeUnit::Absolute,
        }
    }
}

/// Interpretation rule for a position tuple. The legacy origin is the
/// parent's bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUnit {
    RelativeBottomLeft,
    RelativeTopLeft,
    RelativeTopRight,
    RelativeBottomRight,
    Percent,
    MultiplyResolution,
}

impl PositionUnit {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PositionUnit::RelativeTopLeft,
            2 => PositionUnit::RelativeTopRight,
            3 => PositionUnit::RelativeBottomRight,
            4 => PositionUnit::Percent,
            5 => PositionUnit::MultiplyResolution,
            _ => PositionUnit::RelativeBottomLeft,
        }
    }
}

/// Resolves a raw size tuple into absolute units against the parent size.
pub fn resolve_size(raw: SizedValue, parent: Vec2) -> Vec2 {
    let (w, h) = (raw.x, raw.y);
    match SizeUnit::from_code(raw.unit) {
        SizeUnit::Percent => Vec2::new(parent.x * w / 100.0, parent.y * h / 100.0),
        SizeUnit::RelativeContainer => Vec2::new(parent.x - w, parent.y - h),
        SizeUnit::HorizontalPercent => Vec2::new(parent.x * w / 100.0, h),
        SizeUnit::VerticalPercent => Vec2::new(w, parent.y * h / 100.0),
        SizeUnit::Absolute | SizeUnit::MultiplyResolution => Vec2::new(w, h),
    }
}

/// Resolves a raw position tuple into bottom-left-origin parent-local
/// coordinates.
pub fn resolve_position(raw: SizedValue, parent: Vec2) -> Vec2 {
    let (x, y) = (raw.x, raw.y);
    match PositionUnit::from_code(raw.unit) {
        PositionUnit::RelativeTopLeft => Vec2::new(x, parent.y - y),
        PositionUnit::RelativeTopRight => Vec2::new(parent.x - x, parent.y - y),
        PositionUnit::RelativeBottomRight => Vec2::new(parent.x - x, y),
        PositionUnit::Percent => Vec2::new(parent.x * x / 100.0, parent.y * y / 100.0),
        PositionUnit::RelativeBottomLeft | PositionUnit::MultiplyResolution => Vec2::new(x, y),
    }
}

/// Converts a parent-local absolute position into the anchor-relative
/// coordinate the target runtime expects. Valid only once the parent's
/// anchor and content size are final.
pub fn to_parent_relative(pos: Vec2, parent_anchor: Vec2, parent_size: Vec2) -> Vec2 {
    pos - parent_size * parent_anchor
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT: Vec2 = Vec2::new(200.0, 100.0);

    #[test]
    fn size_percent_scales_both_axes() {
        let out = resolve_size(SizedValue::new(50.0, 50.0, 1), PARENT);
        assert_eq!(out, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn size_relative_container_insets_from_parent() {
        let out = resolve_size(SizedValue::new(20.0, 10.0, 2), PARENT);
        assert_eq!(out, Vec2::new(180.0, 90.0));
    }

    #[test]
    fn size_single_axis_percent() {
        assert_eq!(
            resolve_size(SizedValue::new(50.0, 40.0, 3), PARENT),
            Vec2::new(100.0, 40.0)
        );
        assert_eq!(
            resolve_size(SizedValue::new(50.0, 40.0, 4), PARENT),
            Vec2::new(50.0, 40.0)
        );
    }

    #[test]
    fn size_absolute_and_multiply_resolution_pass_through() {
        for unit in [0, 5, 99] {
            assert_eq!(
                resolve_size(SizedValue::new(7.0, 8.0, unit), PARENT),
                Vec2::new(7.0, 8.0)
            );
        }
    }

    #[test]
    fn position_edge_relative_variants_mirror() {
        assert_eq!(
            resolve_position(SizedValue::new(10.0, 20.0, 1), PARENT),
            Vec2::new(10.0, 80.0)
        );
        assert_eq!(
            resolve_position(SizedValue::new(10.0, 20.0, 2), PARENT),
            Vec2::new(190.0, 80.0)
        );
        assert_eq!(
            resolve_position(SizedValue::new(10.0, 20.0, 3), PARENT),
            Vec2::new(190.0, 20.0)
        );
    }

    #[test]
    fn position_percent() {
        assert_eq!(
            resolve_position(SizedValue::new(50.0, 25.0, 4), PARENT),
            Vec2::new(100.0, 25.0)
        );
    }

    #[test]
    fn centered_child_lands_on_anchor_origin() {
        let rel = to_parent_relative(Vec2::new(100.0, 50.0), Vec2::new(0.5, 0.5), PARENT);
        assert_eq!(rel, Vec2::ZERO);
    }
}

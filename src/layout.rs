//! Layout planning: from configuration plus attribute-set shape to a
//! concrete buffer and binding plan.
//!
//! A plan is pure data. It names which buffers an instance needs (and at
//! what sharing scope), how each vertex attribute reads from its buffer,
//! and what draw call finishes a frame. The uploader and the buffer pool
//! execute plans; nothing below this module knows about configuration
//! codes.

use log::warn;

use crate::config::{CoordWidth, DrawStyle, LayoutConfig, PackingMode, SharingMode};
use crate::geometry::AttributeSetDesc;

pub const BYTES_PER_FLOAT: u32 = 4;

/// What a buffer stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    Position,
    Normal,
    Color,
    /// Position and normal data packed into one buffer.
    Combined,
    Index,
}

/// Whether a buffer belongs to one instance or to the whole object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingScope {
    PerInstance,
    SharedPerClass,
}

/// Vertex attributes the shader program consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
}

impl AttributeKind {
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::Color => "color",
        }
    }
}

/// One attribute binding: which buffer it reads and how.
///
/// `stride_bytes == 0` means tightly packed at the declared width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadStep {
    pub attribute: AttributeKind,
    pub role: BufferRole,
    pub scope: SharingScope,
    pub components: u32,
    pub stride_bytes: u32,
    pub offset_bytes: u32,
}

/// The draw call that renders one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Arrays { vertex_count: u32 },
    Indexed { index_count: u32 },
}

/// Byte layout of a combined position+normal buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointLayout {
    pub position_offset: u32,
    pub normal_offset: u32,
    pub stride_bytes: u32,
    pub total_bytes: u32,
}

/// Complete buffer and binding plan for one object class.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub sharing: SharingMode,
    /// Buffers every instance must hold, shared slots included.
    pub allocations: Vec<(BufferRole, SharingScope)>,
    pub steps: Vec<UploadStep>,
    pub draw: DrawCall,
    /// Present iff `sharing.is_joint()`.
    pub joint: Option<JointLayout>,
}

impl UploadPlan {
    pub fn step(&self, attribute: AttributeKind) -> Option<&UploadStep> {
        self.steps.iter().find(|s| s.attribute == attribute)
    }

    pub fn allocates(&self, role: BufferRole, scope: SharingScope) -> bool {
        self.allocations.contains(&(role, scope))
    }
}

/// Compute the byte layout of a combined position+normal buffer.
///
/// Blocked packing concatenates the full position block and the full
/// normal block, each tightly packed (stride stays zero). Interleaved
/// packing alternates one position and one normal per vertex, so both
/// attributes share the per-vertex stride and the normal starts right
/// after the position of vertex zero.
pub fn joint_layout(packing: PackingMode, desc: &AttributeSetDesc) -> JointLayout {
    let position_bytes = desc.vertex_count * desc.position_components * BYTES_PER_FLOAT;
    let normal_components = desc.normal_components.unwrap_or(0);
    let normal_bytes = desc.vertex_count * normal_components * BYTES_PER_FLOAT;
    match packing {
        PackingMode::Blocked => JointLayout {
            position_offset: 0,
            normal_offset: position_bytes,
            stride_bytes: 0,
            total_bytes: position_bytes + normal_bytes,
        },
        PackingMode::Interleaved => {
            let stride = (desc.position_components + normal_components) * BYTES_PER_FLOAT;
            JointLayout {
                position_offset: 0,
                normal_offset: desc.position_components * BYTES_PER_FLOAT,
                stride_bytes: stride,
                total_bytes: desc.vertex_count * stride,
            }
        }
    }
}

/// Resolve the draw style that will actually execute. Triangle strips
/// were never wired up; the request degrades to plain array draws.
pub fn effective_draw_style(draw: DrawStyle) -> DrawStyle {
    match draw {
        DrawStyle::Strips => {
            warn!("triangle-strip draws are not implemented; drawing arrays instead");
            DrawStyle::Arrays
        }
        other => other,
    }
}

/// Build the upload plan for one object class.
pub fn plan_layout(config: &LayoutConfig, desc: &AttributeSetDesc) -> UploadPlan {
    let sharing = config.sharing;
    let draw_style = effective_draw_style(config.draw);
    let indexed = match draw_style {
        DrawStyle::Elements => match desc.index_count {
            Some(_) => true,
            None => {
                warn!("indexed draw requested but the geometry has no index array; drawing arrays");
                false
            }
        },
        _ => false,
    };

    let joint = sharing.is_joint().then(|| joint_layout(config.packing, desc));

    let pn_scope = if sharing.is_shared() {
        SharingScope::SharedPerClass
    } else {
        SharingScope::PerInstance
    };

    // The 4-wide declaration applies to every attribute with its own
    // tightly packed buffer; the combined-buffer reader always reads at
    // the natural width. Colors keep their own buffer in every family,
    // so the override reaches them even in the joint modes.
    let wide = config.coord_width == CoordWidth::Four;
    let separate_width = |natural: u32| if wide && !sharing.is_joint() { 4 } else { natural };
    let color_width = |natural: u32| if wide { 4 } else { natural };

    let mut steps = Vec::new();
    steps.push(match joint {
        Some(j) => UploadStep {
            attribute: AttributeKind::Position,
            role: BufferRole::Combined,
            scope: pn_scope,
            components: desc.position_components,
            stride_bytes: j.stride_bytes,
            offset_bytes: j.position_offset,
        },
        None => UploadStep {
            attribute: AttributeKind::Position,
            role: BufferRole::Position,
            scope: pn_scope,
            components: separate_width(desc.position_components),
            stride_bytes: 0,
            offset_bytes: 0,
        },
    });
    if let Some(normal_components) = desc.normal_components {
        steps.push(match joint {
            Some(j) => UploadStep {
                attribute: AttributeKind::Normal,
                role: BufferRole::Combined,
                scope: pn_scope,
                components: normal_components,
                stride_bytes: j.stride_bytes,
                offset_bytes: j.normal_offset,
            },
            None => UploadStep {
                attribute: AttributeKind::Normal,
                role: BufferRole::Normal,
                scope: pn_scope,
                components: separate_width(normal_components),
                stride_bytes: 0,
                offset_bytes: 0,
            },
        });
    }
    if let Some(color_components) = desc.color_components {
        // Colors are per-instance in every family; they are what varies
        // between instances.
        steps.push(UploadStep {
            attribute: AttributeKind::Color,
            role: BufferRole::Color,
            scope: SharingScope::PerInstance,
            components: color_width(color_components),
            stride_bytes: 0,
            offset_bytes: 0,
        });
    }

    let mut allocations = Vec::new();
    match sharing {
        SharingMode::UnsharedSeparate => {
            allocations.push((BufferRole::Position, SharingScope::PerInstance));
            if desc.normal_components.is_some() {
                allocations.push((BufferRole::Normal, SharingScope::PerInstance));
            }
            if indexed {
                allocations.push((BufferRole::Index, SharingScope::PerInstance));
            }
        }
        SharingMode::SharedSeparate => {
            // The shared-separate class set is fixed: position, normal and
            // index buffers all exist even when the draw style never reads
            // the index buffer.
            allocations.push((BufferRole::Position, SharingScope::SharedPerClass));
            allocations.push((BufferRole::Normal, SharingScope::SharedPerClass));
            allocations.push((BufferRole::Index, SharingScope::SharedPerClass));
        }
        SharingMode::UnsharedJoint => {
            allocations.push((BufferRole::Combined, SharingScope::PerInstance));
            if indexed {
                allocations.push((BufferRole::Index, SharingScope::PerInstance));
            }
        }
        SharingMode::SharedJoint => {
            allocations.push((BufferRole::Combined, SharingScope::SharedPerClass));
            if indexed {
                allocations.push((BufferRole::Index, SharingScope::SharedPerClass));
            }
        }
    }
    if desc.color_components.is_some() {
        allocations.push((BufferRole::Color, SharingScope::PerInstance));
    }

    let draw = if indexed {
        DrawCall::Indexed {
            // indexed is only true when index_count is present
            index_count: desc.index_count.unwrap_or(0),
        }
    } else {
        DrawCall::Arrays {
            vertex_count: desc.vertex_count,
        }
    };

    UploadPlan {
        sharing,
        allocations,
        steps,
        draw,
        joint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_desc() -> AttributeSetDesc {
        AttributeSetDesc {
            vertex_count: 36,
            position_components: 3,
            normal_components: Some(3),
            color_components: Some(4),
            index_count: None,
        }
    }

    fn corner_desc() -> AttributeSetDesc {
        AttributeSetDesc {
            vertex_count: 8,
            position_components: 3,
            normal_components: Some(3),
            color_components: Some(3),
            index_count: Some(36),
        }
    }

    #[test]
    fn test_unshared_separate_allocations() {
        let plan = plan_layout(&LayoutConfig::parse("bua.da"), &cube_desc());
        assert_eq!(
            plan.allocations,
            vec![
                (BufferRole::Position, SharingScope::PerInstance),
                (BufferRole::Normal, SharingScope::PerInstance),
                (BufferRole::Color, SharingScope::PerInstance),
            ]
        );
        assert_eq!(plan.draw, DrawCall::Arrays { vertex_count: 36 });
        assert!(plan.joint.is_none());
    }

    #[test]
    fn test_shared_separate_always_allocates_index_buffer() {
        // The shared class set is fixed even for non-indexed draws.
        let plan = plan_layout(&LayoutConfig::parse("bsa.da"), &cube_desc());
        assert!(plan.allocates(BufferRole::Index, SharingScope::SharedPerClass));
        assert!(plan.allocates(BufferRole::Position, SharingScope::SharedPerClass));
        assert!(plan.allocates(BufferRole::Normal, SharingScope::SharedPerClass));
        assert!(plan.allocates(BufferRole::Color, SharingScope::PerInstance));
        assert_eq!(plan.draw, DrawCall::Arrays { vertex_count: 36 });
    }

    #[test]
    fn test_blocked_joint_layout() {
        let plan = plan_layout(&LayoutConfig::parse("buj.da.ab"), &cube_desc());
        let j = plan.joint.unwrap();
        assert_eq!(j.position_offset, 0);
        assert_eq!(j.normal_offset, 36 * 3 * 4);
        assert_eq!(j.stride_bytes, 0);
        assert_eq!(j.total_bytes, 2 * 36 * 3 * 4);

        let normal = plan.step(AttributeKind::Normal).unwrap();
        assert_eq!(normal.role, BufferRole::Combined);
        assert_eq!(normal.offset_bytes, 36 * 3 * 4);
        assert_eq!(normal.stride_bytes, 0);
    }

    #[test]
    fn test_interleaved_joint_layout() {
        let plan = plan_layout(&LayoutConfig::parse("bsj.da.ai"), &cube_desc());
        let j = plan.joint.unwrap();
        assert_eq!(j.stride_bytes, 24);
        assert_eq!(j.position_offset, 0);
        assert_eq!(j.normal_offset, 12);
        assert_eq!(j.total_bytes, 36 * 24);

        let position = plan.step(AttributeKind::Position).unwrap();
        assert_eq!(position.scope, SharingScope::SharedPerClass);
        assert_eq!(position.stride_bytes, 24);
    }

    #[test]
    fn test_wide_declaration_applies_to_separate_buffers_only() {
        let separate = plan_layout(&LayoutConfig::parse("bua.da.c4"), &cube_desc());
        assert_eq!(separate.step(AttributeKind::Position).unwrap().components, 4);
        assert_eq!(separate.step(AttributeKind::Normal).unwrap().components, 4);
        assert_eq!(separate.step(AttributeKind::Color).unwrap().components, 4);

        // Position and normal read the combined buffer at natural width;
        // the color buffer stays separate and still widens.
        let joint = plan_layout(&LayoutConfig::parse("buj.da.c4"), &cube_desc());
        assert_eq!(joint.step(AttributeKind::Position).unwrap().components, 3);
        assert_eq!(joint.step(AttributeKind::Normal).unwrap().components, 3);
        assert_eq!(joint.step(AttributeKind::Color).unwrap().components, 4);
    }

    #[test]
    fn test_wide_declaration_widens_three_wide_corner_colors() {
        // The indexed corner colors are naturally 3-wide; the wide mode
        // declares them 4-wide anyway.
        let plan = plan_layout(&LayoutConfig::parse("bua.de.c4"), &corner_desc());
        assert_eq!(plan.step(AttributeKind::Color).unwrap().components, 4);

        let natural = plan_layout(&LayoutConfig::parse("bua.de"), &corner_desc());
        assert_eq!(natural.step(AttributeKind::Color).unwrap().components, 3);
    }

    #[test]
    fn test_indexed_plan() {
        let plan = plan_layout(&LayoutConfig::parse("bua.de"), &corner_desc());
        assert_eq!(plan.draw, DrawCall::Indexed { index_count: 36 });
        assert!(plan.allocates(BufferRole::Index, SharingScope::PerInstance));
    }

    #[test]
    fn test_indexed_joint_plan() {
        let plan = plan_layout(&LayoutConfig::parse("bsj.de.ai"), &corner_desc());
        assert_eq!(plan.draw, DrawCall::Indexed { index_count: 36 });
        assert!(plan.allocates(BufferRole::Index, SharingScope::SharedPerClass));
        assert!(plan.allocates(BufferRole::Combined, SharingScope::SharedPerClass));
        assert_eq!(plan.joint.unwrap().stride_bytes, 24);
    }

    #[test]
    fn test_strips_degrade_to_arrays() {
        let plan = plan_layout(&LayoutConfig::parse("bua.ds"), &cube_desc());
        assert_eq!(plan.draw, DrawCall::Arrays { vertex_count: 36 });
    }

    #[test]
    fn test_indexed_draw_without_indices_degrades() {
        let plan = plan_layout(&LayoutConfig::parse("bua.de"), &cube_desc());
        assert_eq!(plan.draw, DrawCall::Arrays { vertex_count: 36 });
        assert!(!plan.allocates(BufferRole::Index, SharingScope::PerInstance));
    }
}

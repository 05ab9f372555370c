//! Shared helpers for the layout integration tests.

use layout_bench::config::LayoutConfig;
use layout_bench::device::{AttributeSlot, SoftwareDevice};
use layout_bench::geometry::{AttributeSet, Cube, GeometryProvider};
use layout_bench::layout::{plan_layout, UploadPlan};
use layout_bench::pool::BufferPool;
use layout_bench::upload::{upload_instance, InstanceBuffers};

/// Parse a code and build the cube attribute set and plan for it.
pub fn setup(code: &str) -> (LayoutConfig, AttributeSet, UploadPlan) {
    let config = LayoutConfig::parse(code);
    let set = Cube::new(true, true).attribute_set(config.draw);
    let plan = plan_layout(&config, &set.describe());
    (config, set, plan)
}

/// Upload one instance of the given configuration on a fresh pool.
pub fn upload_one(
    device: &mut SoftwareDevice,
    pool: &mut BufferPool,
    code: &str,
) -> InstanceBuffers {
    let (config, set, plan) = setup(code);
    upload_instance(device, pool, &plan, &set, config.packing).unwrap()
}

/// Read an attribute back for every vertex.
pub fn read_all(
    device: &SoftwareDevice,
    buffers: &InstanceBuffers,
    slot: AttributeSlot,
    vertex_count: u32,
) -> Vec<Vec<f32>> {
    (0..vertex_count)
        .map(|v| {
            device
                .read_attribute(buffers.vao, slot, v)
                .expect("attribute not bound")
        })
        .collect()
}

//! Scene population and the frame loop driver.
//!
//! The manager builds the whole scene from one configuration: it plans
//! the layout once, creates every instance with deterministic pseudo-
//! random placement, and drives per-frame drawing, scene auto-rotation
//! and timing reports.

use std::time::{Duration, Instant};

use glam::{Vec3, Vec4};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::LayoutConfig;
use crate::device::{self, DeviceResult, RenderDevice};
use crate::geometry::{Cube, GeometryProvider};
use crate::instance::ShapeInstance;
use crate::layout::{plan_layout, UploadPlan};
use crate::pool::{BufferPool, PoolResult};
use crate::scene::Scene;

/// Seed for instance placement. Fixed so that every run of a given
/// configuration draws the same scene.
const PLACEMENT_SEED: u64 = 1;

/// Interactive rotation step, degrees per keypress.
pub const ROTATE_STEP: f32 = 3.0;

/// Continuous scene rotation about Z, degrees per frame.
const AUTO_ROTATE_STEP: f32 = 1.0;

/// How often a timing report is logged.
const REPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Batch runs stop after this many reports.
const BATCH_REPORT_LIMIT: u32 = 10;

/// Frame counting and periodic throughput reports.
#[derive(Debug)]
pub struct FrameStats {
    frames: u64,
    interval_frames: u64,
    interval_start: Instant,
    reports: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frames: 0,
            interval_frames: 0,
            interval_start: now,
            reports: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reports(&self) -> u32 {
        self.reports
    }

    /// Count one frame as of `now`, logging a report when the interval
    /// has elapsed.
    pub fn tick(&mut self, now: Instant) {
        self.frames += 1;
        self.interval_frames += 1;
        let elapsed = now.duration_since(self.interval_start);
        if elapsed >= REPORT_INTERVAL {
            let fps = self.interval_frames as f64 / elapsed.as_secs_f64();
            info!(
                "{} frames in {:.2}s: {:.1} fps, {:.3} ms/frame",
                self.interval_frames,
                elapsed.as_secs_f64(),
                fps,
                1000.0 / fps
            );
            self.interval_frames = 0;
            self.interval_start = now;
            self.reports += 1;
        }
    }

    pub fn frame(&mut self) {
        self.tick(Instant::now());
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the scene, the buffer pool and every instance.
pub struct SceneManager {
    config: LayoutConfig,
    plan: UploadPlan,
    scene: Scene,
    pool: BufferPool,
    instances: Vec<ShapeInstance>,
    stats: FrameStats,
    auto_rotate: bool,
}

impl SceneManager {
    /// Plan the layout and populate the scene with `count` cubes at
    /// deterministic pseudo-random sizes, positions and headings.
    pub fn new(
        device: &mut dyn RenderDevice,
        config: LayoutConfig,
        count: usize,
    ) -> PoolResult<Self> {
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(PLACEMENT_SEED);
        let mut pool = BufferPool::new();

        // Every cube variant has the same attribute shape, so one plan
        // serves the whole class.
        let probe = Cube::new(true, true).attribute_set(config.draw);
        let plan = plan_layout(&config, &probe.describe());
        info!(
            "layout: {:?}, {} buffers per class set, {} instances",
            config.sharing,
            plan.allocations.len(),
            count
        );

        let mut instances = Vec::with_capacity(count);
        for _ in 0..count {
            let face_colors = rng.gen::<bool>();
            let face_normals = rng.gen::<bool>();
            let set = Cube::new(face_colors, face_normals).attribute_set(config.draw);

            let mut instance = ShapeInstance::new(device, &mut pool, &plan, &set, config.packing)?;
            instance.set_uniform_scale(0.05 + rng.gen::<f32>() * 0.08);
            instance.set_location(Vec3::new(
                -1.0 + rng.gen::<f32>() * 1.9,
                -1.0 + rng.gen::<f32>() * 1.9,
                -1.0 + rng.gen::<f32>() * 1.9,
            ));
            instance.set_rotation(rng.gen::<f32>() * std::f32::consts::TAU, Vec3::Y);
            instance.set_base_color(Vec4::new(
                rng.gen::<f32>(),
                rng.gen::<f32>(),
                rng.gen::<f32>(),
                1.0,
            ));
            instances.push(instance);
        }
        device::log_diagnostics(device, "scene population");
        info!(
            "scene of {} instances built in {:.1} ms",
            count,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            config,
            plan,
            scene: Scene::new(config.composition),
            pool,
            instances,
            stats: FrameStats::new(),
            auto_rotate: false,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn plan(&self) -> &UploadPlan {
        &self.plan
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn instances(&self) -> &[ShapeInstance] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [ShapeInstance] {
        &mut self.instances
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Apply one interactive rotation step about `axis`.
    pub fn rotate_step(&mut self, axis: Vec3) {
        self.scene.rotate_by(axis * ROTATE_STEP.to_radians());
    }

    /// Toggle the continuous per-frame Z rotation. Off by default, so a
    /// static scene stays static between interactive commands.
    pub fn set_auto_rotate(&mut self, on: bool) {
        self.auto_rotate = on;
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Draw one frame: synchronize the scene chain, redraw every
    /// instance, then (if enabled) advance the continuous Z rotation for
    /// the next frame.
    pub fn render_frame(&mut self, device: &mut dyn RenderDevice) -> DeviceResult<()> {
        self.scene.sync(device);
        for instance in &mut self.instances {
            instance.redraw(device)?;
        }
        if self.auto_rotate {
            self.scene
                .rotate_by(Vec3::new(0.0, 0.0, AUTO_ROTATE_STEP.to_radians()));
        }
        self.stats.frame();
        device::log_diagnostics(device, "frame");
        Ok(())
    }

    /// Whether a driving loop should stop. Batch runs stop after a fixed
    /// number of timing reports; interactive runs never stop on their own.
    pub fn finished(&self) -> bool {
        self.config.batch && self.stats.reports() >= BATCH_REPORT_LIMIT
    }

    /// Destroy every instance and all pooled buffers.
    pub fn shutdown(&mut self, device: &mut dyn RenderDevice) -> PoolResult<()> {
        for instance in self.instances.drain(..) {
            instance.destroy(device, &mut self.pool)?;
        }
        self.pool.shutdown(device)?;
        device::log_diagnostics(device, "shutdown");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftwareDevice;

    #[test]
    fn test_shared_layout_allocates_class_buffers_once() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bsa.da");
        let manager = SceneManager::new(&mut device, config, 50).unwrap();

        // Position, normal and index shared; one color buffer each.
        assert_eq!(manager.pool().shared_allocations(), 3);
        assert_eq!(manager.pool().instance_allocations(), 50);
    }

    #[test]
    fn test_unshared_layout_scales_with_instances() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bua.da");
        let manager = SceneManager::new(&mut device, config, 20).unwrap();

        assert_eq!(manager.pool().shared_allocations(), 0);
        // Position, normal and color per instance.
        assert_eq!(manager.pool().instance_allocations(), 60);
    }

    #[test]
    fn test_render_frame_draws_every_instance() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bsj.da.ai");
        let mut manager = SceneManager::new(&mut device, config, 12).unwrap();
        manager.set_auto_rotate(true);

        manager.render_frame(&mut device).unwrap();
        assert_eq!(device.draw_calls(), 12);
        assert_eq!(manager.stats().frames(), 1);

        // The continuous rotation advanced the scene for the next frame.
        assert!(manager.scene_mut().rotation().z > 0.0);
    }

    #[test]
    fn test_scene_is_static_without_auto_rotate() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bua.da");
        let mut manager = SceneManager::new(&mut device, config, 3).unwrap();
        assert!(!manager.auto_rotate());

        for _ in 0..4 {
            manager.render_frame(&mut device).unwrap();
        }
        assert_eq!(manager.scene_mut().rotation(), Vec3::ZERO);
        // An unchanged scene means the composed chain went up exactly once.
        assert_eq!(device.uniform_upload_count("projectionViewScene"), 1);
    }

    #[test]
    fn test_placement_is_deterministic() {
        let mut device_a = SoftwareDevice::new();
        let mut device_b = SoftwareDevice::new();
        let config = LayoutConfig::parse("bua.da");
        let mut a = SceneManager::new(&mut device_a, config, 10).unwrap();
        let mut b = SceneManager::new(&mut device_b, config, 10).unwrap();

        for (x, y) in a.instances_mut().iter_mut().zip(b.instances_mut().iter_mut()) {
            assert_eq!(x.location(), y.location());
            assert_eq!(x.model_matrix(), y.model_matrix());
        }
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bsj.de");
        let mut manager = SceneManager::new(&mut device, config, 8).unwrap();
        assert!(device.live_buffers() > 0);

        manager.shutdown(&mut device).unwrap();
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_batch_stops_after_report_limit() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bua.da.rb");
        let mut manager = SceneManager::new(&mut device, config, 1).unwrap();
        assert!(!manager.finished());

        // Simulate the report clock instead of waiting for wall time.
        let mut now = Instant::now();
        for _ in 0..BATCH_REPORT_LIMIT {
            now += REPORT_INTERVAL;
            manager.stats.tick(now);
        }
        assert!(manager.finished());
    }

    #[test]
    fn test_rotate_step_is_three_degrees() {
        let mut device = SoftwareDevice::new();
        let config = LayoutConfig::parse("bua.da");
        let mut manager = SceneManager::new(&mut device, config, 1).unwrap();

        manager.rotate_step(Vec3::X);
        let expected = ROTATE_STEP.to_radians();
        assert!((manager.scene_mut().rotation().x - expected).abs() < 1e-6);
    }
}

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use nalgebra::{Point3, Vector3};

use lensing::{
    camera::{Camera, PinholeCamera},
    config::ConfigBuilder,
    disk::{AccretionDisk, Profile},
    math,
    output,
    preview::{AsciiPreview, NullObserver, Observer, Trail, Trails},
    scene::{BlackHole, Scene},
    simulation::Simulation,
    tonemap,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiskProfile {
    Banded,
    Linear,
    Parabolic,
}

impl From<DiskProfile> for Profile {
    fn from(profile: DiskProfile) -> Self {
        match profile {
            DiskProfile::Banded => Profile::Banded,
            DiskProfile::Linear => Profile::Linear,
            DiskProfile::Parabolic => Profile::Parabolic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tonemap {
    /// Logarithmic compression of the written range.
    Log,
    /// Linear scaling by the brightest value.
    Max,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render a black hole and its accretion disk", long_about = None)]
struct Options {
    /// Image width in pixels.
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 300)]
    height: u32,

    /// Where to write the image. `.ppm` is written directly, other extensions by format.
    #[arg(short, long, value_name = "FILE", default_value = "blackhole.ppm")]
    output: PathBuf,

    /// Affine-parameter step taken by every photon each frame.
    #[arg(long, default_value_t = 0.2)]
    step_size: f32,

    /// Number of worker threads, defaults to the number of cpus.
    #[arg(short, long, value_name = "NUM")]
    jobs: Option<usize>,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 30.)]
    fov: f32,

    /// Distance from the camera to the hole.
    #[arg(long, default_value_t = 250.)]
    distance: f32,

    /// Angle of the camera above the disk plane, in degrees.
    #[arg(long, default_value_t = 7.)]
    elevation: f32,

    /// Move photons along straight lines instead of bending them.
    #[arg(long)]
    flat: bool,

    /// Give up on photons that are still in flight after this many frames.
    #[arg(long, default_value_t = 20_000)]
    max_steps: usize,

    /// Radiance added by photons that escape.
    #[arg(long, default_value_t = 1000.)]
    background: f32,

    /// Peak radiance of the disk per step.
    #[arg(long, default_value_t = 100.)]
    disk_brightness: f32,

    /// Full thickness of the disk slab.
    #[arg(long, default_value_t = 2.)]
    disk_thickness: f32,

    #[arg(long, value_enum, default_value_t = DiskProfile::Banded)]
    disk_profile: DiskProfile,

    #[arg(long, value_enum, default_value_t = Tonemap::Log)]
    tonemap: Tonemap,

    /// Print a top-down view of photon trails to stderr while simulating.
    #[arg(long)]
    preview: bool,

    /// Frames between preview updates.
    #[arg(long, default_value_t = 100)]
    preview_every: usize,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let opts = Options::parse();

    let mut builder = ConfigBuilder::default()
        .set_width(opts.width)
        .set_height(opts.height)
        .set_step_size(opts.step_size)
        .set_render_enabled(opts.preview)
        .set_relativistic(!opts.flat)
        .set_max_steps(opts.max_steps)
        .set_background(opts.background);
    if let Some(jobs) = opts.jobs {
        builder = builder.set_jobs(jobs);
    }
    let config = builder.build();

    let hole = BlackHole::new(15.);
    let disk = AccretionDisk::new(27., 45., opts.disk_brightness, opts.disk_thickness)
        .context("invalid accretion disk")?
        .with_profile(opts.disk_profile.into());
    let scene = Scene::new(hole.clone(), disk);

    let elevation = math::deg_to_rad(opts.elevation);
    let camera = PinholeCamera::look_at(
        Point3::new(
            0.,
            opts.distance * elevation.sin(),
            -opts.distance * elevation.cos(),
        ),
        Point3::origin(),
        &Vector3::y(),
        math::deg_to_rad(opts.fov),
        opts.width,
        opts.height,
    );
    info!("camera at {}", camera.eye());

    let mut sim = Simulation::new(config, scene, &camera).context("failed to set up simulation")?;

    let mut observer: Box<dyn Observer> = if opts.preview {
        let stride = (opts.width.max(opts.height) / 16).max(1);
        Box::new(AsciiPreview::new(
            io::stderr(),
            Trails::new(Trail::DEFAULT_CAPACITY, stride),
            hole,
            opts.preview_every,
            opts.distance,
        ))
    } else {
        Box::new(NullObserver)
    };

    sim.run(observer.as_mut()).context("simulation failed")?;

    let canvas = sim.into_canvas();
    let image = match opts.tonemap {
        Tonemap::Log => tonemap::log_tonemap(&canvas),
        Tonemap::Max => tonemap::max_normalize(&canvas),
    };

    output::save(&opts.output, &image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_options() {
        Options::command().debug_assert();

        let opts = Options::parse_from(["lensing", "--disk-thickness", "4", "--flat"]);
        assert_eq!(4., opts.disk_thickness);
        assert!(opts.flat);

        // The thickness is the whole slab, matching `AccretionDisk::contains`.
        let command = Options::command();
        let help = command
            .get_arguments()
            .find(|arg| arg.get_id() == "disk_thickness")
            .and_then(|arg| arg.get_help())
            .map(|help| help.to_string())
            .unwrap_or_default();
        assert!(help.contains("Full thickness"), "{}", help);

        let disk = AccretionDisk::new(27., 45., 1., opts.disk_thickness).expect("valid disk");
        assert!(disk.contains(&Point3::new(36., 1.9, 0.), 36.));
        assert!(!disk.contains(&Point3::new(36., 2.1, 0.), 36.));
    }
}

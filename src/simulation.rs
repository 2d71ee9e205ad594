use crossbeam::{channel, thread};
use log::{debug, info, warn};

use crate::{
    camera::{Camera, Sample},
    canvas::Canvas,
    config::Config,
    disk::AccretionDisk,
    error::{Error, Result},
    geodesic::Model,
    photon::{Photon, Pixel, Status},
    preview::{Control, Frame, Observer, Snapshot},
    scene::Scene,
};

/// Radiance a photon adds to its own pixel.
#[derive(Debug, Clone, Copy)]
struct Deposit {
    index: usize,
    amount: f32,
}

/// Read-only state shared by every worker during a frame.
struct Bounds<'a> {
    disk: &'a AccretionDisk,
    model: Model,
    rs: f32,
    limit: f32,
    dlambda: f32,
    background: f32,
    width: u32,
    height: u32,
}

/// How many photons are in each state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub active: usize,
    pub absorbed: usize,
    pub escaped: usize,
    pub discarded: usize,
    pub stalled: usize,
}

impl Counts {
    pub fn of(photons: &[Photon]) -> Self {
        photons.iter().fold(Counts::default(), |mut counts, photon| {
            match photon.status() {
                Status::Active => counts.active += 1,
                Status::Absorbed => counts.absorbed += 1,
                Status::Escaped => counts.escaped += 1,
                Status::Discarded => counts.discarded += 1,
                Status::Stalled => counts.stalled += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.active + self.absorbed + self.escaped + self.discarded + self.stalled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: usize,
    pub counts: Counts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub frames: usize,
    pub counts: Counts,
}

/// Owns the photons and the accumulation buffer, and steps them frame by frame.
pub struct Simulation {
    config: Config,
    scene: Scene,
    photons: Vec<Photon>,
    canvas: Canvas,
    limit: f32,
    frame: usize,

    /// Photons that could not be launched.
    rejected: usize,
}

impl Simulation {
    /// Seed one photon per pixel through the center of that pixel. Photons escape once they
    /// move outward beyond the camera's distance from the hole.
    pub fn new(config: Config, scene: Scene, camera: &impl Camera) -> Result<Self> {
        let (width, height) = (config.width(), config.height());
        let rs = scene.black_hole.radius;
        let model = config.model();

        let mut photons = Vec::new();
        photons
            .try_reserve_exact(width as usize * height as usize)
            .map_err(|_| Error::Allocation { width, height })?;

        let mut rejected = 0;
        for y in 0..height {
            for x in 0..width {
                let ray = camera.generate_ray(Sample::center(x, y));
                match Photon::launch(Pixel::new(x, y), &ray, rs, model) {
                    Ok(photon) => photons.push(photon),
                    Err(err) => {
                        warn!("not launching a photon for pixel ({}, {}): {}", x, y, err);
                        rejected += 1;
                    }
                }
            }
        }

        let limit = camera.eye().coords.norm();
        let mut sim = Self::with_photons(config, scene, photons, limit)?;
        sim.rejected = rejected;
        Ok(sim)
    }

    /// Simulate an explicit set of photons, each of which must own a distinct pixel.
    pub fn with_photons(
        config: Config,
        scene: Scene,
        photons: Vec<Photon>,
        limit: f32,
    ) -> Result<Self> {
        let canvas = Canvas::new(config.width(), config.height())?;
        info!(
            "simulating {} photons for a {}x{} image ({:?} model, step {})",
            photons.len(),
            canvas.width(),
            canvas.height(),
            config.model(),
            config.step_size()
        );

        Ok(Self {
            config,
            scene,
            photons,
            canvas,
            limit,
            frame: 0,
            rejected: 0,
        })
    }

    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::of(&self.photons);
        counts.discarded += self.rejected;
        counts
    }

    /// Advance every active photon by one step.
    ///
    /// Photons are split into disjoint chunks across the configured jobs. Each photon only
    /// touches its own state and reports what it adds to its own pixel; the deposits are applied
    /// once every worker has finished.
    pub fn step_frame(&mut self) -> Result<FrameStats> {
        let bounds = Bounds {
            disk: &self.scene.disk,
            model: self.config.model(),
            rs: self.scene.black_hole.radius,
            limit: self.limit,
            dlambda: self.config.step_size(),
            background: self.config.background(),
            width: self.canvas.width(),
            height: self.canvas.height(),
        };

        let jobs = self.config.jobs();
        let chunk_size = ((self.photons.len() + jobs - 1) / jobs).max(1);
        let (results, deposits) = channel::unbounded::<Vec<Deposit>>();

        thread::scope(|s| {
            for chunk in self.photons.chunks_mut(chunk_size) {
                let results = results.clone();
                let bounds = &bounds;
                s.spawn(move |_| {
                    let batch: Vec<Deposit> = chunk
                        .iter_mut()
                        .filter_map(|photon| advance(photon, bounds))
                        .collect();
                    if !batch.is_empty() && results.send(batch).is_err() {
                        warn!("dropping deposits, the frame is no longer collecting them");
                    }
                });
            }
        })
        .map_err(|_| Error::WorkerPanicked)?;

        drop(results);
        for deposit in deposits.try_iter().flatten() {
            self.canvas.add_gray(deposit.index, deposit.amount);
        }

        self.frame += 1;
        let counts = self.counts();
        debug!(
            "frame {}: {} active, {} absorbed, {} escaped",
            self.frame, counts.active, counts.absorbed, counts.escaped
        );

        Ok(FrameStats {
            frame: self.frame,
            counts,
        })
    }

    /// Step until no photon is active, the frame limit is reached, or `observer` asks to stop.
    ///
    /// The observer only sees frames when rendering is enabled in the config.
    pub fn run(&mut self, observer: &mut dyn Observer) -> Result<Summary> {
        while self.frame < self.config.max_steps() {
            let stats = self.step_frame()?;

            if self.config.render_enabled() && observer.observe(&self.snapshot()) == Control::Quit
            {
                info!("preview asked to stop after frame {}", self.frame);
                break;
            }

            if stats.counts.active == 0 {
                break;
            }
        }

        if self.frame >= self.config.max_steps() {
            let mut stalled = 0;
            for photon in self.photons.iter_mut().filter(|p| p.is_active()) {
                photon.set_status(Status::Stalled);
                stalled += 1;
            }
            if stalled > 0 {
                warn!(
                    "{} photons were still active after {} frames",
                    stalled, self.frame
                );
            }
        }

        let summary = Summary {
            frames: self.frame,
            counts: self.counts(),
        };
        info!(
            "finished after {} frames: {} absorbed, {} escaped, {} discarded, {} stalled, {} active",
            summary.frames,
            summary.counts.absorbed,
            summary.counts.escaped,
            summary.counts.discarded,
            summary.counts.stalled,
            summary.counts.active
        );
        Ok(summary)
    }

    /// The positions of all active photons.
    pub fn snapshot(&self) -> Frame {
        Frame {
            number: self.frame,
            photons: self
                .photons
                .iter()
                .filter(|p| p.is_active())
                .map(|p| Snapshot {
                    pixel: p.pixel(),
                    position: p.position,
                })
                .collect(),
        }
    }
}

/// Take one photon through a frame: termination, integration, then disk shading.
fn advance(photon: &mut Photon, bounds: &Bounds) -> Option<Deposit> {
    if !photon.is_active() {
        return None;
    }

    let terminal = photon.termination(bounds.rs, bounds.limit);
    if terminal == Some(Status::Absorbed) {
        photon.set_status(Status::Absorbed);
        return None;
    }

    let index = match photon.pixel().index(bounds.width, bounds.height) {
        Ok(index) => index,
        Err(err) => {
            warn!("discarding photon: {}", err);
            photon.set_status(Status::Discarded);
            return None;
        }
    };

    if terminal == Some(Status::Escaped) {
        photon.set_status(Status::Escaped);
        photon.brightness += bounds.background;
        return Some(Deposit {
            index,
            amount: bounds.background,
        });
    }

    photon.step(bounds.model, bounds.rs, bounds.dlambda);

    let amount = bounds.disk.shade(&photon.position, photon.r())?;
    photon.brightness += amount;
    Some(Deposit { index, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::PinholeCamera, config::ConfigBuilder, preview::NullObserver, tonemap};
    use nalgebra::{Point3, Vector3};

    fn config(width: u32, height: u32) -> ConfigBuilder {
        ConfigBuilder::default()
            .set_width(width)
            .set_height(height)
            .set_step_size(0.2)
            .set_jobs(2)
    }

    fn scene() -> Scene {
        Scene::standard(100., 2.).expect("scene")
    }

    /// A photon 250 from the hole in the disk plane, aimed to pass it at distance `b`.
    fn aimed(pixel: Pixel, b: f32, model: Model) -> Photon {
        let sin = b / 250.;
        let cos = (1. - sin * sin).sqrt();
        Photon::new(
            pixel,
            Point3::new(0., 0., -250.),
            Vector3::new(sin, 0., cos),
            15.,
            model,
        )
        .expect("valid launch")
    }

    fn single(photon: Photon, model: Model) -> Simulation {
        let config = config(1, 1)
            .set_relativistic(model == Model::Relativistic)
            .build();
        Simulation::with_photons(config, scene(), vec![photon], 250.).expect("simulation")
    }

    #[test]
    fn test_radial_photon_absorbed() {
        let mut sim = single(aimed(Pixel::new(0, 0), 0., Model::Relativistic), Model::Relativistic);

        let mut last = sim.photons()[0].r();
        let mut frames = 0;
        while sim.photons()[0].is_active() {
            sim.step_frame().expect("frame");
            frames += 1;
            assert!(frames < 1500, "photon was never absorbed");

            let r = sim.photons()[0].r();
            if sim.photons()[0].is_active() {
                assert!(r < last, "radius grew from {} to {}", last, r);
            }
            last = r;
        }

        assert_eq!(Status::Absorbed, sim.photons()[0].status());
        assert!(sim.photons()[0].r() <= 15.);
    }

    #[test]
    fn test_wide_photon_escapes() {
        let mut sim = single(aimed(Pixel::new(0, 0), 200., Model::Relativistic), Model::Relativistic);
        let disk = scene().disk;

        while sim.photons()[0].is_active() {
            sim.step_frame().expect("frame");
            assert!(sim.frame() < 10_000, "photon never escaped");

            let photon = &sim.photons()[0];
            assert!(!disk.contains(&photon.position, photon.r()));
        }

        let photon = &sim.photons()[0];
        assert_eq!(Status::Escaped, photon.status());
        assert!(photon.r() > 250.);

        // The background is deposited exactly once.
        assert_eq!(1000., photon.brightness);
        assert_eq!(Some(1000.), sim.canvas().get(0, 0).map(|c| c.r));

        sim.step_frame().expect("frame");
        assert_eq!(Some(1000.), sim.canvas().get(0, 0).map(|c| c.r));
    }

    #[test]
    fn test_inside_horizon_absorbed_immediately() {
        let photon = Photon::new(
            Pixel::new(0, 0),
            Point3::new(0., 0., -10.),
            Vector3::new(0.3, 0., 1.),
            15.,
            Model::Relativistic,
        )
        .expect("valid launch");
        let mut sim = single(photon, Model::Relativistic);

        let stats = sim.step_frame().expect("frame");
        assert_eq!(1, stats.counts.absorbed);
        assert_eq!(0, stats.counts.active);
        assert_eq!(None, sim.canvas().get(0, 0));
    }

    #[test]
    fn test_bending_captures_near_miss() {
        // Straight lines miss a hole of radius 15 at impact parameter 20, bent paths fall in.
        let mut flat = single(aimed(Pixel::new(0, 0), 20., Model::Kinematic), Model::Kinematic);
        let summary = flat.run(&mut NullObserver).expect("run");
        assert_eq!(1, summary.counts.escaped);

        let mut curved = single(aimed(Pixel::new(0, 0), 10., Model::Relativistic), Model::Relativistic);
        let summary = curved.run(&mut NullObserver).expect("run");
        assert_eq!(1, summary.counts.absorbed);
    }

    #[test]
    fn test_out_of_bounds_pixel_discarded() {
        let config = config(2, 1).build();
        let photons = vec![
            aimed(Pixel::new(0, 0), 200., Model::Relativistic),
            aimed(Pixel::new(5, 0), 200., Model::Relativistic),
        ];
        let mut sim = Simulation::with_photons(config, scene(), photons, 250.).expect("simulation");

        let stats = sim.step_frame().expect("frame");
        assert_eq!(1, stats.counts.discarded);
        assert_eq!(1, stats.counts.active);
        assert_eq!(Status::Discarded, sim.photons()[1].status());

        // The fault does not stop the other photon from finishing.
        let summary = sim.run(&mut NullObserver).expect("run");
        assert_eq!(1, summary.counts.escaped);
        assert_eq!(1, summary.counts.discarded);
        assert_eq!(None, sim.canvas().get(1, 0));
    }

    #[test]
    fn test_stalled_photons() {
        let config = config(1, 1).set_max_steps(5).build();
        let photons = vec![aimed(Pixel::new(0, 0), 0., Model::Relativistic)];
        let mut sim = Simulation::with_photons(config, scene(), photons, 250.).expect("simulation");

        let summary = sim.run(&mut NullObserver).expect("run");
        assert_eq!(5, summary.frames);
        assert_eq!(1, summary.counts.stalled);
        assert_eq!(0, summary.counts.active);
    }

    struct QuitAfter(usize, usize);

    impl Observer for QuitAfter {
        fn observe(&mut self, frame: &Frame) -> Control {
            self.1 += 1;
            assert_eq!(self.1, frame.number);
            assert_eq!(1, frame.photons.len());
            if frame.number >= self.0 {
                Control::Quit
            } else {
                Control::Continue
            }
        }
    }

    #[test]
    fn test_observer_quit() {
        let config = config(1, 1).set_render_enabled(true).build();
        let photons = vec![aimed(Pixel::new(0, 0), 0., Model::Relativistic)];
        let mut sim = Simulation::with_photons(config, scene(), photons, 250.).expect("simulation");

        let mut observer = QuitAfter(3, 0);
        let summary = sim.run(&mut observer).expect("run");
        assert_eq!(3, summary.frames);
        assert_eq!(3, observer.1);
        assert_eq!(1, summary.counts.active);
    }

    #[test]
    fn test_observer_skipped_without_render() {
        let config = config(1, 1).set_max_steps(3).build();
        let photons = vec![aimed(Pixel::new(0, 0), 0., Model::Relativistic)];
        let mut sim = Simulation::with_photons(config, scene(), photons, 250.).expect("simulation");

        // Would panic on the first frame: it expects frame numbers to start at 100.
        let mut observer = QuitAfter(0, 99);
        sim.run(&mut observer).expect("run");
        assert_eq!(99, observer.1);
    }

    #[test]
    fn test_render() {
        let (width, height) = (16, 12);
        let camera = PinholeCamera::look_at(
            Point3::new(0., 30., -250.),
            Point3::origin(),
            &Vector3::y(),
            std::f32::consts::FRAC_PI_3,
            width,
            height,
        );
        let config = config(width, height).set_jobs(3).build();
        let mut sim = Simulation::new(config, scene(), &camera).expect("simulation");

        assert_eq!((width * height) as usize, sim.photons().len());
        approx::assert_relative_eq!(sim.limit(), (30f32 * 30. + 250. * 250.).sqrt());

        let summary = sim.run(&mut NullObserver).expect("run");
        assert_eq!((width * height) as usize, summary.counts.total());
        assert_eq!(0, summary.counts.active);
        assert_eq!(0, summary.counts.stalled);
        assert!(summary.counts.absorbed > 0);
        assert!(summary.counts.escaped > 0);

        // Every escaped photon brightened its own pixel.
        for photon in sim.photons() {
            if photon.status() == Status::Escaped {
                let Pixel { x, y } = photon.pixel();
                assert!(sim.canvas().get(x, y).is_some());
            }
        }

        let range = tonemap::Range::of(sim.canvas()).expect("escaped photons wrote pixels");
        assert!(range.min >= 0.);
        assert!(range.max >= 1000.);

        let image = tonemap::log_tonemap(sim.canvas());
        assert_eq!((width, height), image.dimensions());
    }
}

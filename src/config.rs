use crate::geodesic::Model;

/// Settings for a simulation run, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    width: u32,
    height: u32,
    step_size: f32,
    render_enabled: bool,
    relativistic: bool,
    max_steps: usize,
    jobs: usize,
    background: f32,
}

impl Config {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The affine-parameter step `dlambda` taken every frame.
    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Whether the preview observer is consulted after each frame.
    pub fn render_enabled(&self) -> bool {
        self.render_enabled
    }

    pub fn relativistic(&self) -> bool {
        self.relativistic
    }

    pub fn model(&self) -> Model {
        Model::new(self.relativistic)
    }

    /// The number of frames after which still-active photons are given up on.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Radiance deposited by photons that escape.
    pub fn background(&self) -> f32 {
        self.background
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            config: Config {
                width: 400,
                height: 300,
                step_size: 0.2,
                render_enabled: false,
                relativistic: true,
                max_steps: 20_000,
                jobs: num_cpus::get(),
                background: 1000.,
            },
        }
    }
}

impl ConfigBuilder {
    pub fn set_width(mut self, width: u32) -> Self {
        self.config.width = width;
        self
    }

    pub fn set_height(mut self, height: u32) -> Self {
        self.config.height = height;
        self
    }

    pub fn set_step_size(mut self, step_size: f32) -> Self {
        self.config.step_size = step_size;
        self
    }

    pub fn set_render_enabled(mut self, render_enabled: bool) -> Self {
        self.config.render_enabled = render_enabled;
        self
    }

    pub fn set_relativistic(mut self, relativistic: bool) -> Self {
        self.config.relativistic = relativistic;
        self
    }

    pub fn set_max_steps(mut self, steps: usize) -> Self {
        self.config.max_steps = steps;
        self
    }

    pub fn set_jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = usize::max(jobs, 1);
        self
    }

    pub fn set_background(mut self, background: f32) -> Self {
        self.config.background = background;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[test]
fn test_builder() {
    let config = ConfigBuilder::default()
        .set_width(64)
        .set_height(32)
        .set_step_size(0.1)
        .set_relativistic(false)
        .set_jobs(0)
        .build();

    assert_eq!(64, config.width());
    assert_eq!(32, config.height());
    assert_eq!(0.1, config.step_size());
    assert_eq!(Model::Kinematic, config.model());
    assert_eq!(1, config.jobs());
    assert_eq!(1000., config.background());
    assert!(!config.render_enabled());
}

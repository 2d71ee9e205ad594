use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("photon starts at the origin")]
    DegenerateOrigin,

    #[error("photon has no velocity")]
    ZeroVelocity,

    #[error("pixel ({x}, {y}) lies outside the {width}x{height} image")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("failed to allocate a {width}x{height} image")]
    Allocation { width: u32, height: u32 },

    #[error("accretion disk needs 0 <= inner < outer, got inner {inner} and outer {outer}")]
    InvalidDisk { inner: f32, outer: f32 },

    #[error("a simulation worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod camera;
pub mod canvas;
pub mod config;
pub mod disk;
pub mod error;
pub mod geodesic;
pub mod math;
pub mod output;
pub mod photon;
pub mod preview;
pub mod ray;
pub mod scene;
pub mod simulation;
pub mod tonemap;

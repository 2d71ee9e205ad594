//! The boundary to a live preview of the simulation.
//!
//! The simulation hands an [`Observer`] a read-only [`Frame`] after every step and asks whether to
//! keep going. Trail history only matters for drawing, so it lives here rather than on photons.

use std::collections::{vec_deque, HashMap, VecDeque};
use std::io::Write;

use nalgebra::{Point2, Point3};

use crate::photon::Pixel;
use crate::scene::BlackHole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// The position of one active photon.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pixel: Pixel,
    pub position: Point3<f32>,
}

/// The active photons after a simulation step.
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: usize,
    pub photons: Vec<Snapshot>,
}

pub trait Observer {
    /// Inspect a frame, and decide whether the simulation should continue.
    fn observe(&mut self, frame: &Frame) -> Control;
}

/// Never looks, never quits.
#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&mut self, _frame: &Frame) -> Control {
        Control::Continue
    }
}

/// A bounded history of positions, newest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Point3<f32>>,
    capacity: usize,
}

impl Trail {
    pub const DEFAULT_CAPACITY: usize = 255;

    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `point`, evicting the oldest point once full.
    pub fn push(&mut self, point: Point3<f32>) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_back();
        }
        self.points.push_front(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Point3<f32>> {
        self.points.iter()
    }
}

/// Trails for a sample of the photons, keyed by pixel.
#[derive(Debug, Clone)]
pub struct Trails {
    trails: HashMap<Pixel, Trail>,
    capacity: usize,
    stride: u32,
}

impl Trails {
    /// Track photons whose pixel coordinates are both multiples of `stride`.
    pub fn new(capacity: usize, stride: u32) -> Self {
        Self {
            trails: HashMap::new(),
            capacity,
            stride: stride.max(1),
        }
    }

    fn tracks(&self, pixel: &Pixel) -> bool {
        pixel.x % self.stride == 0 && pixel.y % self.stride == 0
    }

    pub fn record(&mut self, frame: &Frame) {
        for snapshot in &frame.photons {
            if !self.tracks(&snapshot.pixel) {
                continue;
            }
            let capacity = self.capacity;
            self.trails
                .entry(snapshot.pixel)
                .or_insert_with(|| Trail::new(capacity))
                .push(snapshot.position);
        }
    }

    pub fn get(&self, pixel: &Pixel) -> Option<&Trail> {
        self.trails.get(pixel)
    }

    /// Draw the trails seen from above, projected onto the disk plane, in a `cols` x `rows`
    /// character grid covering `[-extent, extent]` on both axes. The horizon is drawn around the
    /// hole's preview center.
    pub fn to_ascii(&self, hole: &BlackHole, cols: usize, rows: usize, extent: f32) -> String {
        if cols == 0 || rows == 0 {
            return String::new();
        }

        let palette = b"@%#*+=-:. ";
        let mut grid = vec![vec![b' '; cols]; rows];

        let cell = |point: Point2<f32>| -> Option<(usize, usize)> {
            let u = (point.x + extent) / (2. * extent);
            let v = (point.y + extent) / (2. * extent);
            if (0. ..1.).contains(&u) && (0. ..1.).contains(&v) {
                Some(((u * cols as f32) as usize, ((1. - v) * rows as f32) as usize))
            } else {
                None
            }
        };

        for trail in self.trails.values() {
            let len = trail.len().max(1);
            for (age, point) in trail.iter().enumerate().rev() {
                if let Some((col, row)) = cell(Point2::new(point.x, point.z)) {
                    let shade = age * (palette.len() - 1) / len;
                    grid[row.min(rows - 1)][col.min(cols - 1)] = palette[shade];
                }
            }
        }

        // The horizon, drawn last so it stays visible.
        for (row, line) in grid.iter_mut().enumerate() {
            for (col, c) in line.iter_mut().enumerate() {
                let x = ((col as f32 + 0.5) / cols as f32 * 2. - 1.) * extent;
                let z = (1. - (row as f32 + 0.5) / rows as f32 * 2.) * extent;
                if (x - hole.center.x).hypot(z - hole.center.y) <= hole.radius {
                    *c = b'O';
                }
            }
        }

        let mut buf = String::with_capacity((cols + 1) * rows);
        for line in grid {
            buf.extend(line.into_iter().map(char::from));
            buf.push('\n');
        }
        buf
    }
}

impl Observer for Trails {
    fn observe(&mut self, frame: &Frame) -> Control {
        self.record(frame);
        Control::Continue
    }
}

/// Prints a top-down view of sampled trails every few frames.
pub struct AsciiPreview<W: Write> {
    trails: Trails,
    hole: BlackHole,
    every: usize,
    extent: f32,
    out: W,
}

impl<W: Write> AsciiPreview<W> {
    pub fn new(out: W, trails: Trails, hole: BlackHole, every: usize, extent: f32) -> Self {
        Self {
            trails,
            hole,
            every: every.max(1),
            extent,
            out,
        }
    }
}

impl<W: Write> Observer for AsciiPreview<W> {
    fn observe(&mut self, frame: &Frame) -> Control {
        self.trails.record(frame);
        if frame.number % self.every != 0 {
            return Control::Continue;
        }

        let view = self.trails.to_ascii(&self.hole, 80, 40, self.extent);
        let written = writeln!(
            self.out,
            "frame {} ({} active)\n{}",
            frame.number,
            frame.photons.len(),
            view
        );

        // A closed output means nobody is watching anymore.
        match written {
            Ok(()) => Control::Continue,
            Err(_) => Control::Quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(number: usize, points: &[(u32, u32, Point3<f32>)]) -> Frame {
        Frame {
            number,
            photons: points
                .iter()
                .map(|(x, y, position)| Snapshot {
                    pixel: Pixel::new(*x, *y),
                    position: *position,
                })
                .collect(),
        }
    }

    #[test]
    fn test_trail_eviction() {
        let mut trail = Trail::new(3);
        for i in 0..5 {
            trail.push(Point3::new(i as f32, 0., 0.));
        }

        assert_eq!(3, trail.len());
        let xs: Vec<f32> = trail.iter().map(|p| p.x).collect();
        assert_eq!(vec![4., 3., 2.], xs);

        let mut empty = Trail::new(0);
        empty.push(Point3::origin());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_trails_stride() {
        let mut trails = Trails::new(10, 2);
        let p = Point3::new(1., 0., 1.);
        trails.record(&frame(1, &[(0, 0, p), (1, 0, p), (2, 4, p)]));
        trails.record(&frame(2, &[(0, 0, p)]));

        assert_eq!(2, trails.get(&Pixel::new(0, 0)).map_or(0, Trail::len));
        assert!(trails.get(&Pixel::new(1, 0)).is_none());
        assert_eq!(1, trails.get(&Pixel::new(2, 4)).map_or(0, Trail::len));
    }

    #[test]
    fn test_to_ascii() {
        let hole = BlackHole::new(15.);
        let mut trails = Trails::new(10, 1);
        trails.record(&frame(1, &[(0, 0, Point3::new(90., 0., 90.))]));

        let view = trails.to_ascii(&hole, 20, 10, 100.);
        let lines: Vec<&str> = view.lines().collect();
        assert_eq!(10, lines.len());
        assert!(lines.iter().all(|l| l.len() == 20));

        // The hole sits in the middle, the photon in the top-right corner.
        assert!(view.contains('O'));
        assert_eq!(Some('@'), lines[0].chars().nth(19));
    }

    #[test]
    fn test_to_ascii_empty_grid() {
        let hole = BlackHole::new(15.);
        let mut trails = Trails::new(10, 1);
        trails.record(&frame(1, &[(0, 0, Point3::new(10., 0., 10.))]));

        assert_eq!("", trails.to_ascii(&hole, 0, 10, 100.));
        assert_eq!("", trails.to_ascii(&hole, 20, 0, 100.));
    }

    #[test]
    fn test_null_observer() {
        assert_eq!(Control::Continue, NullObserver.observe(&frame(0, &[])));
    }

    #[test]
    fn test_ascii_preview() {
        let mut out = Vec::new();
        {
            let mut preview =
                AsciiPreview::new(&mut out, Trails::new(4, 1), BlackHole::new(15.), 2, 100.);
            let p = Point3::new(50., 0., 0.);
            assert_eq!(Control::Continue, preview.observe(&frame(1, &[(0, 0, p)])));
            assert_eq!(Control::Continue, preview.observe(&frame(2, &[(0, 0, p)])));
        }

        let text = String::from_utf8(out).expect("utf8");
        assert!(!text.contains("frame 1 "));
        assert!(text.starts_with("frame 2 (1 active)"));
    }
}

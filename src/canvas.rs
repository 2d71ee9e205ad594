use crate::error::{Error, Result};

/// Linear radiance in three channels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0., 0., 0.)
    }

    /// The same value in every channel.
    pub fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn channels(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl std::ops::AddAssign<&Color> for Color {
    fn add_assign(&mut self, rhs: &Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl std::ops::AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        self.add_assign(&rhs)
    }
}

/// An HDR accumulation buffer, row-major with `(0,0)` in the top-left corner.
///
/// Pixels that were never written stay distinguishable from pixels that accumulated to zero.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<Color>,
    written: Vec<bool>,
}

impl Canvas {
    /// Construct a new [`Canvas`], failing when the buffer cannot be allocated.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let alloc = Error::Allocation { width, height };
        let size = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| alloc.clone())?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|_| alloc.clone())?;
        buffer.resize_with(size, Default::default);

        let mut written = Vec::new();
        written.try_reserve_exact(size).map_err(|_| alloc)?;
        written.resize(size, false);

        Ok(Self {
            width,
            height,
            buffer,
            written,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (self.width as usize) * (y as usize) + (x as usize)
    }

    /// Fetch the accumulated color at `(x, y)`, if anything was ever added there.
    pub fn get(&self, x: u32, y: u32) -> Option<&Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixel(self.index(x, y))
    }

    /// Fetch the accumulated color at a row-major index.
    pub fn pixel(&self, index: usize) -> Option<&Color> {
        if *self.written.get(index)? {
            self.buffer.get(index)
        } else {
            None
        }
    }

    /// Add `amount` to every channel of the pixel at `index`.
    ///
    /// Returns `false` when the index lies outside the canvas.
    pub fn add_gray(&mut self, index: usize, amount: f32) -> bool {
        match self.buffer.get_mut(index) {
            Some(color) => {
                *color += Color::gray(amount);
                self.written[index] = true;
                true
            }
            None => false,
        }
    }

    /// Iterate over all pixels in row-major order, `None` for pixels never written.
    pub fn pixels(&self) -> impl Iterator<Item = Option<&Color>> + '_ {
        self.buffer
            .iter()
            .zip(self.written.iter())
            .map(|(color, written)| if *written { Some(color) } else { None })
    }
}

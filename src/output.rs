use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use log::info;

/// Write `image` as a binary PPM: an ASCII `P6` header followed by row-major RGB bytes.
pub fn write_ppm<W: Write>(mut out: W, image: &RgbImage) -> std::io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", image.width(), image.height())?;
    out.write_all(image.as_raw())?;
    out.flush()
}

/// Save `image` to `path`. `.ppm` files use [`write_ppm`], anything else is encoded by the
/// `image` crate according to the extension.
///
/// The image is written next to `path` first and moved into place once complete, so a failed
/// write never leaves a truncated file behind.
pub fn save(path: &Path, image: &RgbImage) -> Result<()> {
    let tmp = temporary_path(path);

    let written = write_file(path, &tmp, image);
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written?;

    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move the image into place at `{}`", path.display()))?;

    info!(
        "saved {}x{} image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

fn is_ppm(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("ppm"))
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_file(path: &Path, tmp: &Path, image: &RgbImage) -> Result<()> {
    if is_ppm(path) {
        let file = File::create(tmp)
            .with_context(|| format!("failed to open `{}` for writing", path.display()))?;
        write_ppm(BufWriter::new(file), image)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
    } else {
        let format = image::ImageFormat::from_path(path)
            .with_context(|| format!("unsupported image format for `{}`", path.display()))?;
        image
            .save_with_format(tmp, format)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
    }
    Ok(())
}

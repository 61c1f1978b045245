//! Escritura de las páginas rasterizadas a disco.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::pdf::RenderedImage;

/// `<dir>/<stem>_<número>.<ext>`, con el número de página empezando en 1.
pub fn output_path(dir: &Path, stem: &str, page_number: usize, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", stem, page_number, format.extension()))
}

/// Codifica una página en el formato pedido.
pub fn save_image(image: &RenderedImage, path: &Path, format: OutputFormat) -> Result<()> {
    let buffer = RgbaImage::from_raw(image.width, image.height, image.data.clone()).ok_or_else(
        || {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "buffer de {} bytes no cuadra con {}x{} RGBA",
                    image.data.len(),
                    image.width,
                    image.height
                ),
            ))
        },
    )?;

    let image = DynamicImage::ImageRgba8(buffer);
    // JPEG no tiene canal alfa. El fondo ya es blanco opaco, se puede tirar.
    let image = if format.has_alpha() {
        image
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    image.save_with_format(path, format.image_format())?;
    Ok(())
}

/// Escribe todas las páginas en orden y devuelve las rutas creadas.
pub fn write_pages(
    images: &[RenderedImage],
    dir: &Path,
    stem: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let page_number = i + 1;
        let path = output_path(dir, stem, page_number, format);
        save_image(image, &path, format)?;
        log::info!(
            "Guardado {}... {} / {}",
            path.display(),
            page_number,
            images.len()
        );
        written.push(path);
    }
    Ok(written)
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpg | OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Avif => ImageFormat::Avif,
        }
    }

    fn has_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpg | OutputFormat::Jpeg)
    }
}

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::engine::Rotation;
use crate::pdf::{RenderOptions, DEFAULT_SCALE};

/// Formatos de salida admitidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Jpg,
    Jpeg,
    Png,
    Tiff,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Extensión tal cual la escribió el usuario.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

/// pdf to image by pdfium
#[derive(Debug, Parser)]
#[command(name = "pdf2image", version, about, long_about = None)]
pub struct Args {
    /// PDF de entrada
    pub input: PathBuf,

    /// Formato de salida
    #[arg(value_enum)]
    pub extension: OutputFormat,

    /// Píxeles por punto PDF (1.0 = 72 DPI)
    #[arg(short, long, default_value_t = DEFAULT_SCALE, value_parser = parse_scale)]
    pub scale: f64,

    /// Rotación en grados: 0, 90, 180 o 270
    #[arg(short, long, default_value_t = 0, value_parser = parse_rotation)]
    pub rotate: u32,

    /// Carpeta de salida
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Carpeta con la librería PDFium (si no, ./ y luego la del sistema)
    #[arg(long, env = "PDFIUM_LIB_DIR")]
    pub pdfium_lib: Option<PathBuf>,
}

impl Args {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.scale,
            rotation: Rotation::from_degrees(self.rotate).unwrap_or_default(),
        }
    }

    /// Nombre base de los ficheros de salida: el nombre del PDF sin extensión.
    pub fn output_stem(&self) -> String {
        file_stem(&self.input)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string())
}

fn parse_scale(value: &str) -> Result<f64, String> {
    let scale: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` no es un número"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err("la escala tiene que ser mayor que 0".to_string())
    }
}

fn parse_rotation(value: &str) -> Result<u32, String> {
    value
        .parse()
        .ok()
        .filter(|degrees| Rotation::from_degrees(*degrees).is_some())
        .ok_or_else(|| format!("`{value}` no es 0, 90, 180 ni 270"))
}

use thiserror::Error;

use crate::engine::LastError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errores del conversor.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No se pudo cargar la librería PDFium: {0}")]
    Bind(String),

    #[error("No se pudo cargar el documento: {0}")]
    Load(LastError),

    #[error("Tamaño de la página {index} no disponible: {reason}")]
    PageSize { index: usize, reason: LastError },

    /// Puntos * escala no cabe en un `i32`.
    #[error("La página {index} no cabe a esa escala ({width:.0}x{height:.0} px)")]
    Dimensions { index: usize, width: f64, height: f64 },

    #[error("La página {index} queda en {width}x{height} px a esa escala")]
    EmptyPage { index: usize, width: i32, height: i32 },

    /// Fallo reservando memoria del motor. No se reintenta.
    #[error("El motor no pudo reservar {len} bytes")]
    Allocation { len: usize },

    #[error("El motor no pudo crear el bitmap de {width}x{height}")]
    Bitmap { width: i32, height: i32 },

    #[error("La página {index} no existe o no se pudo abrir: {reason}")]
    Page { index: usize, reason: LastError },

    #[error("Fallo al codificar la imagen: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

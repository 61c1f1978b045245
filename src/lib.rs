//! Conversor de páginas PDF a imágenes sobre PDFium.
//!
//! El núcleo es el manejo de memoria a través de la frontera FFI:
//! - [`pdf::arena`]: huecos de salida temporales para llamadas multi-valor.
//! - [`engine`]: contrato tipado con el motor.
//! - [`pdf::Processor`]: render de una página (tamaño, bitmap, copia, liberación).
//! - [`pdf::Document`] / [`pdf::Page`]: ciclo de vida del documento y cierre único.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod pdf;

pub use error::{Error, Result};

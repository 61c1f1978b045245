//! Orquestación de la conversión: leer → cargar → renderizar todo → escribir.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{Args, OutputFormat};
use crate::engine::pdfium::PdfiumEngine;
use crate::engine::Engine;
use crate::error::Result;
use crate::export;
use crate::pdf::{RenderOptions, Session};

/// Punto de entrada del binario.
pub fn run(args: &Args) -> anyhow::Result<()> {
    log::info!("Obteniendo tamaño del fichero...");
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("No se pudo leer {}", args.input.display()))?;
    log::info!("Tamaño del fichero: {} bytes", bytes.len());

    let engine = PdfiumEngine::bind(args.pdfium_lib.as_deref())
        .context("Asegúrate de que PDFium está instalado o usa --pdfium-lib")?;

    let written = convert(
        engine,
        &bytes,
        &args.output_stem(),
        &args.output,
        args.extension,
        args.render_options(),
    )
    .with_context(|| format!("Fallo al convertir {}", args.input.display()))?;

    log::info!("Terminado: {} imágenes", written.len());
    Ok(())
}

/// Convierte un PDF completo con el motor dado.
///
/// Todas las páginas se renderizan antes de escribir nada: si una falla,
/// no queda salida parcial. Un documento sin páginas no produce ficheros.
pub fn convert<E: Engine>(
    engine: E,
    bytes: &[u8],
    stem: &str,
    dir: &Path,
    format: OutputFormat,
    options: RenderOptions,
) -> Result<Vec<PathBuf>> {
    let mut document = Session::new(engine).load_document(bytes, options)?;

    log::info!("Contando páginas...");
    let pages = document.page_count();
    log::info!("Páginas: {}", pages);

    if pages == 0 {
        log::warn!("No se pueden renderizar las páginas: el PDF está vacío");
        return Ok(Vec::new());
    }

    log::info!("Renderizando {} páginas PDF...", pages);
    document.set_pages(pages);
    document.create_all_pages();
    let rendered = document.render_pages()?;

    export::write_pages(&rendered, dir, stem, format)
}

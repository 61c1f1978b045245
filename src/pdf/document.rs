//! Documento cargado y sus páginas.
//!
//! Estados: cargado → páginas reservadas → renderizando → cerrado.
//! El cierre (cerrar handle, liberar el buffer del PDF, destruir la librería)
//! ocurre una sola vez, al consumir o soltar el `Document`.

use std::rc::Rc;

use super::processor::Processor;
use super::render::RenderedImage;
use crate::engine::{Engine, Ptr};
use crate::error::Result;

/// Página ligera: índice + acceso compartido al procesador del documento.
pub struct Page<E: Engine> {
    index: usize,
    // Reservado para carga perezosa; de momento no se consulta.
    loaded: bool,
    processor: Rc<Processor<E>>,
}

impl<E: Engine> Page<E> {
    fn new(index: usize, processor: Rc<Processor<E>>) -> Self {
        Self {
            index,
            loaded: false,
            processor,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Renderiza con las opciones del documento.
    pub fn render(&self) -> Result<RenderedImage> {
        let options = self.processor.options();
        self.processor
            .render(self.index, options.scale, options.rotation)
    }
}

pub struct Document<E: Engine> {
    processor: Rc<Processor<E>>,
    input: Ptr,
    input_len: usize,
    pages: Vec<Option<Page<E>>>,
}

impl<E: Engine> Document<E> {
    pub(crate) fn new(processor: Processor<E>, input: Ptr, input_len: usize) -> Self {
        Self {
            processor: Rc::new(processor),
            input,
            input_len,
            pages: Vec::new(),
        }
    }

    pub fn processor(&self) -> &Processor<E> {
        &self.processor
    }

    /// Páginas según el motor. Un documento roto o vacío da 0.
    pub fn page_count(&self) -> usize {
        self.processor.page_count().max(0) as usize
    }

    pub fn last_error_description(&self) -> &'static str {
        self.processor.last_error_description()
    }

    /// Prepara `count` huecos vacíos. No llama al motor.
    pub fn set_pages(&mut self, count: usize) {
        self.pages.clear();
        self.pages.resize_with(count, || None);
    }

    /// Número de huecos de página.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn create_all_pages(&mut self) {
        for (index, slot) in self.pages.iter_mut().enumerate() {
            *slot = Some(Page::new(index, Rc::clone(&self.processor)));
        }
    }

    /// Crea la página la primera vez que se pide y la reutiliza después.
    pub fn get_page(&mut self, index: usize) -> Option<&Page<E>> {
        let processor = &self.processor;
        let slot = self.pages.get_mut(index)?;
        Some(&*slot.get_or_insert_with(|| Page::new(index, Rc::clone(processor))))
    }

    /// Páginas ya creadas, en orden.
    pub fn pages(&self) -> impl Iterator<Item = &Page<E>> {
        self.pages.iter().flatten()
    }

    /// Renderiza todas las páginas en orden ascendente y cierra el documento.
    ///
    /// El orden es parte del contrato: la numeración de los ficheros de
    /// salida depende de él. Si una página falla, el cierre se hace igual.
    pub fn render_pages(mut self) -> Result<Vec<RenderedImage>> {
        let total = self.pages.len();
        let mut rendered = Vec::with_capacity(total);

        for index in 0..total {
            log::info!("Renderizando páginas... {} / {}", index + 1, total);
            if let Some(page) = self.get_page(index) {
                rendered.push(page.render()?);
            }
        }

        Ok(rendered)
    }
}

impl<E: Engine> Drop for Document<E> {
    fn drop(&mut self) {
        let engine = self.processor.engine();
        engine.close_document(self.processor.document());
        // El motor referencia el buffer hasta que el documento está cerrado.
        engine.free(self.input);
        log::debug!("Documento cerrado, {} bytes de entrada liberados", self.input_len);
        // La librería se destruye al soltar la última referencia al procesador.
    }
}

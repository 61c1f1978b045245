//! Pipeline de render de un documento cargado.
//!
//! Secuencia por página: tamaño → buffer → bitmap sobre el buffer → render →
//! destruir bitmap → cerrar página → copiar bytes → liberar buffer.

use super::arena::{with_outputs, ForeignAlloc};
use super::render::{RenderOptions, RenderedImage};
use super::session::Session;
use crate::engine::{
    BitmapFormat, BitmapHandle, DocumentHandle, Engine, LastError, PageHandle, RenderFlags,
    Rotation,
};
use crate::error::{Error, Result};

/// Fondo opaco blanco (0xAARRGGBB).
const BACKGROUND: u32 = 0xFFFF_FFFF;

/// Centinela de `get_page_size` cuando el motor no da el tamaño.
pub const NO_SIZE: (i32, i32) = (-1, -1);

pub struct Processor<E: Engine> {
    session: Session<E>,
    document: DocumentHandle,
    options: RenderOptions,
}

impl<E: Engine> Processor<E> {
    pub(crate) fn new(session: Session<E>, document: DocumentHandle, options: RenderOptions) -> Self {
        Self {
            session,
            document,
            options,
        }
    }

    pub fn engine(&self) -> &E {
        self.session.engine()
    }

    pub fn document(&self) -> DocumentHandle {
        self.document
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn page_count(&self) -> i32 {
        self.engine().page_count(self.document)
    }

    /// Tamaño en píxeles: puntos * `scale`, truncado.
    /// Devuelve [`NO_SIZE`] si el motor no conoce la página, y
    /// [`Error::Dimensions`] si el resultado no cabe en un `i32`.
    pub fn get_page_size(&self, index: usize, scale: f64) -> Result<(i32, i32)> {
        let Ok(page) = i32::try_from(index) else {
            return Ok(NO_SIZE);
        };
        let engine = self.engine();

        let mut found = false;
        let [width, height] = with_outputs(engine, [0.0f64; 2], |[w, h]| {
            found = engine.page_size_by_index(self.document, page, w, h);
            found
        })?;

        if !found {
            return Ok(NO_SIZE);
        }
        let (width, height) = (width * scale, height * scale);
        let fits = |px: f64| px.is_finite() && (0.0..=i32::MAX as f64).contains(&px);
        if !fits(width) || !fits(height) {
            return Err(Error::Dimensions {
                index,
                width,
                height,
            });
        }
        Ok((width as i32, height as i32))
    }

    /// Renderiza sobre un buffer BGRA del motor y lo devuelve sin copiar.
    ///
    /// El llamador consume el buffer; el guard lo libera al soltarlo.
    pub fn render_raw(
        &self,
        index: usize,
        width: i32,
        height: i32,
        rotation: Rotation,
    ) -> Result<ForeignAlloc<'_, E>> {
        let engine = self.engine();
        let format = BitmapFormat::Bgra;
        let invalid = Error::Bitmap { width, height };
        if width <= 0 || height <= 0 {
            return Err(invalid);
        }
        let Some(stride) = width.checked_mul(format.bytes_per_pixel() as i32) else {
            return Err(invalid);
        };
        let Some(len) = (stride as usize).checked_mul(height as usize) else {
            return Err(invalid);
        };

        let buffer = ForeignAlloc::new(engine, len)?;

        let bitmap = engine.bitmap_create_ex(width, height, format, buffer.ptr(), stride);
        if bitmap.is_null() {
            return Err(Error::Bitmap { width, height });
        }
        let bitmap = BitmapView {
            engine,
            handle: bitmap,
        };

        let page = i32::try_from(index)
            .map(|i| engine.load_page(self.document, i))
            .unwrap_or(PageHandle::NULL);
        if page.is_null() {
            return Err(Error::Page {
                index,
                reason: engine.last_error(),
            });
        }
        let page = OpenPage {
            engine,
            handle: page,
        };

        if !engine.bitmap_fill_rect(bitmap.handle, 0, 0, width, height, BACKGROUND) {
            log::debug!("Página {}: no se pudo pintar el fondo", index);
        }
        engine.render_page_bitmap(
            bitmap.handle,
            page.handle,
            0,
            0,
            width,
            height,
            rotation,
            RenderFlags::REVERSE_BYTE_ORDER | RenderFlags::ANNOT,
        );

        // La vista primero; el buffer sigue vivo para el llamador.
        drop(bitmap);
        drop(page);

        Ok(buffer)
    }

    /// Copia los píxeles a memoria normal y libera el buffer del motor.
    pub fn extract_page(
        &self,
        index: usize,
        width: i32,
        height: i32,
        rotation: Rotation,
    ) -> Result<Vec<u8>> {
        let buffer = self.render_raw(index, width, height, rotation)?;
        Ok(buffer.into_vec())
    }

    /// Tamaño + render + extracción de una página.
    pub fn render(&self, index: usize, scale: f64, rotation: Rotation) -> Result<RenderedImage> {
        let (width, height) = match self.get_page_size(index, scale)? {
            NO_SIZE => {
                return Err(Error::PageSize {
                    index,
                    reason: self.last_error(),
                })
            }
            (width, height) if width == 0 || height == 0 => {
                return Err(Error::EmptyPage {
                    index,
                    width,
                    height,
                })
            }
            size => size,
        };

        let (width, height) = if rotation.is_quarter_turn() {
            (height, width)
        } else {
            (width, height)
        };

        // REVERSE_BYTE_ORDER ya deja los bytes en RGBA: no hace falta reordenar.
        let data = self.extract_page(index, width, height, rotation)?;
        log::debug!("Página {} renderizada: {}x{}", index, width, height);

        Ok(RenderedImage {
            data,
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn last_error(&self) -> LastError {
        self.session.last_error()
    }

    /// Descripción del último error del motor. Llamar justo después de la
    /// operación a diagnosticar, antes de cualquier otra llamada al motor.
    pub fn last_error_description(&self) -> &'static str {
        self.last_error().description()
    }
}

struct BitmapView<'e, E: Engine> {
    engine: &'e E,
    handle: BitmapHandle,
}

impl<E: Engine> Drop for BitmapView<'_, E> {
    fn drop(&mut self) {
        self.engine.bitmap_destroy(self.handle);
    }
}

struct OpenPage<'e, E: Engine> {
    engine: &'e E,
    handle: PageHandle,
}

impl<E: Engine> Drop for OpenPage<'_, E> {
    fn drop(&mut self) {
        self.engine.close_page(self.handle);
    }
}

//! Motor real: PDFium enlazado dinámicamente.
//!
//! De pdfium-render solo usamos los bindings crudos `FPDF_*`. No pasamos por
//! `Pdfium::new()` porque el init/destroy de la librería lo controla la sesión.
//! La "memoria del motor" es el heap del proceso: PDFium escribe directamente
//! en los buffers que le pasamos por puntero.

use pdfium_render::prelude::*;
use std::alloc::{self, Layout};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::{c_int, c_void};
use std::path::Path;

use super::{
    BitmapFormat, BitmapHandle, DocumentHandle, Engine, LastError, PageHandle, Ptr, RenderFlags,
    Rotation,
};
use crate::error::{Error, Result};

// Suficiente para cualquier primitivo que leamos (f64 incluido).
const HEAP_ALIGN: usize = 8;

// FPDFBitmap_FillRect devuelve `()` o `FPDF_BOOL` según la versión de PDFium.
trait FillOutcome {
    fn filled(self) -> bool;
}

impl FillOutcome for () {
    fn filled(self) -> bool {
        true
    }
}

impl FillOutcome for c_int {
    fn filled(self) -> bool {
        self != 0
    }
}

pub struct PdfiumEngine {
    bindings: Box<dyn PdfiumLibraryBindings>,
    // Reservas vivas: dirección base -> layout. Sirve para liberar con el
    // layout correcto y para validar cada lectura/escritura.
    heap: RefCell<BTreeMap<usize, Layout>>,
}

impl PdfiumEngine {
    /// Enlaza con la librería PDFium.
    ///
    /// Con `lib_dir` solo se intenta ese directorio. Sin él, probamos primero
    /// la carpeta actual (donde la deja build.rs) y luego la del sistema.
    pub fn bind(lib_dir: Option<&Path>) -> Result<Self> {
        let bindings = match lib_dir {
            Some(dir) => {
                let dir = dir.to_string_lossy().into_owned();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir.as_str()))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| Error::Bind(e.to_string()))?;

        log::debug!("PDFium enlazado");

        Ok(Self {
            bindings,
            heap: RefCell::new(BTreeMap::new()),
        })
    }

    // Comprueba que [ptr, ptr + len) cae dentro de una reserva viva.
    // Un acceso fuera de rango es un bug nuestro, igual que indexar mal un slice.
    fn check_region(&self, ptr: Ptr, len: usize) {
        let heap = self.heap.borrow();
        let inside = heap
            .range(..=ptr.0)
            .next_back()
            .is_some_and(|(&base, layout)| ptr.0 + len <= base + layout.size());
        assert!(
            inside,
            "acceso fuera de la memoria del motor: {} (+{} bytes)",
            ptr, len
        );
    }
}

impl Drop for PdfiumEngine {
    fn drop(&mut self) {
        let heap = self.heap.get_mut();
        if !heap.is_empty() {
            log::warn!("{} reservas del motor sin liberar; se liberan ahora", heap.len());
        }
        for (base, layout) in std::mem::take(heap) {
            // SAFETY: `base` salió de `alloc_zeroed` con este mismo layout.
            unsafe { alloc::dealloc(base as *mut u8, layout) };
        }
    }
}

impl Engine for PdfiumEngine {
    fn init(&self) {
        self.bindings.FPDF_InitLibrary();
    }

    fn destroy(&self) {
        self.bindings.FPDF_DestroyLibrary();
    }

    fn malloc(&self, len: usize) -> Ptr {
        if len == 0 {
            return Ptr::NULL;
        }
        let Ok(layout) = Layout::from_size_align(len, HEAP_ALIGN) else {
            return Ptr::NULL;
        };
        // SAFETY: layout con tamaño distinto de cero.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        if raw.is_null() {
            return Ptr::NULL;
        }
        self.heap.borrow_mut().insert(raw as usize, layout);
        Ptr(raw as usize)
    }

    fn free(&self, ptr: Ptr) {
        if ptr.is_null() {
            return;
        }
        match self.heap.borrow_mut().remove(&ptr.0) {
            // SAFETY: la dirección y el layout vienen de `malloc`.
            Some(layout) => unsafe { alloc::dealloc(ptr.0 as *mut u8, layout) },
            None => log::error!("free de una dirección desconocida: {}", ptr),
        }
    }

    fn read(&self, ptr: Ptr, out: &mut [u8]) {
        self.check_region(ptr, out.len());
        // SAFETY: región validada contra una reserva viva.
        unsafe { std::ptr::copy_nonoverlapping(ptr.0 as *const u8, out.as_mut_ptr(), out.len()) };
    }

    fn write(&self, ptr: Ptr, bytes: &[u8]) {
        self.check_region(ptr, bytes.len());
        // SAFETY: región validada contra una reserva viva.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.0 as *mut u8, bytes.len()) };
    }

    fn load_mem_document(&self, buffer: Ptr, len: usize) -> DocumentHandle {
        self.check_region(buffer, len);
        // SAFETY: región validada; el documento la referencia hasta que se cierra,
        // y Document solo libera el buffer después de `close_document`.
        let bytes = unsafe { std::slice::from_raw_parts(buffer.0 as *const u8, len) };
        DocumentHandle(self.bindings.FPDF_LoadMemDocument(bytes, None) as usize)
    }

    fn close_document(&self, document: DocumentHandle) {
        self.bindings.FPDF_CloseDocument(document.0 as *mut _);
    }

    fn page_count(&self, document: DocumentHandle) -> i32 {
        self.bindings.FPDF_GetPageCount(document.0 as *mut _)
    }

    fn page_size_by_index(
        &self,
        document: DocumentHandle,
        index: i32,
        width: Ptr,
        height: Ptr,
    ) -> bool {
        self.check_region(width, std::mem::size_of::<f64>());
        self.check_region(height, std::mem::size_of::<f64>());
        self.bindings.FPDF_GetPageSizeByIndex(
            document.0 as *mut _,
            index,
            width.0 as *mut f64,
            height.0 as *mut f64,
        ) != 0
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        PageHandle(self.bindings.FPDF_LoadPage(document.0 as *mut _, index) as usize)
    }

    fn close_page(&self, page: PageHandle) {
        self.bindings.FPDF_ClosePage(page.0 as *mut _);
    }

    fn bitmap_create_ex(
        &self,
        width: i32,
        height: i32,
        format: BitmapFormat,
        first_scan: Ptr,
        stride: i32,
    ) -> BitmapHandle {
        if !first_scan.is_null() {
            self.check_region(first_scan, stride.max(0) as usize * height.max(0) as usize);
        }
        BitmapHandle(self.bindings.FPDFBitmap_CreateEx(
            width,
            height,
            format as i32,
            first_scan.0 as *mut c_void,
            stride,
        ) as usize)
    }

    fn bitmap_fill_rect(
        &self,
        bitmap: BitmapHandle,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) -> bool {
        self.bindings
            .FPDFBitmap_FillRect(bitmap.0 as *mut _, left, top, width, height, color.into())
            .filled()
    }

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        start_x: i32,
        start_y: i32,
        size_x: i32,
        size_y: i32,
        rotation: Rotation,
        flags: RenderFlags,
    ) {
        self.bindings.FPDF_RenderPageBitmap(
            bitmap.0 as *mut _,
            page.0 as *mut _,
            start_x,
            start_y,
            size_x,
            size_y,
            rotation as i32,
            flags.bits() as i32,
        );
    }

    fn bitmap_destroy(&self, bitmap: BitmapHandle) {
        self.bindings.FPDFBitmap_Destroy(bitmap.0 as *mut _);
    }

    fn last_error(&self) -> LastError {
        LastError::from_code(self.bindings.FPDF_GetLastError() as u32)
    }
}

//! Motor de pruebas: memoria lineal simulada y documento guionizado.
//!
//! Las direcciones nunca se reutilizan, así que leer memoria ya liberada
//! revienta en vez de devolver basura. Todas las llamadas quedan registradas.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::{
    BitmapFormat, BitmapHandle, DocumentHandle, Engine, LastError, PageHandle, Ptr, RenderFlags,
    Rotation,
};

const ALIGN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Init,
    Destroy,
    Malloc(Ptr, usize),
    Free(Ptr),
    LoadDocument(DocumentHandle),
    CloseDocument(DocumentHandle),
    LoadPage(i32),
    ClosePage(i32),
    CreateBitmap(BitmapHandle, Ptr),
    FillRect(BitmapHandle, u32),
    Render {
        page: i32,
        rotation: Rotation,
        flags: RenderFlags,
    },
    DestroyBitmap(BitmapHandle),
}

struct Bitmap {
    width: i32,
    height: i32,
    format: BitmapFormat,
    first_scan: Ptr,
    stride: i32,
}

#[derive(Default)]
struct State {
    memory: Vec<u8>,
    live: BTreeMap<usize, usize>,
    allocations: usize,
    releases: usize,
    fail_alloc_from: Option<usize>,
    fail_fill: bool,

    pages: Vec<(f64, f64)>,
    encrypted: bool,
    document: Option<DocumentHandle>,
    open_pages: HashMap<usize, i32>,
    bitmaps: HashMap<usize, Bitmap>,
    next_handle: usize,

    last_error: u32,
    calls: Vec<Call>,
}

impl State {
    fn handle(&mut self) -> usize {
        self.next_handle += 1;
        self.next_handle
    }

    fn region(&self, ptr: Ptr, len: usize) -> std::ops::Range<usize> {
        let inside = self
            .live
            .range(..=ptr.0)
            .next_back()
            .is_some_and(|(&base, &size)| ptr.0 + len <= base + size);
        assert!(inside, "acceso fuera de memoria viva: {} (+{})", ptr, len);
        ptr.0..ptr.0 + len
    }
}

/// Los clones comparten estado: el test se queda uno para inspeccionar
/// después de entregar el otro a la sesión.
#[derive(Clone)]
pub(crate) struct FakeEngine {
    state: Rc<RefCell<State>>,
}

impl FakeEngine {
    /// Documento con una página por cada tamaño (en puntos).
    pub(crate) fn with_pages(pages: &[(f64, f64)]) -> Self {
        let state = State {
            // La dirección 0 queda reservada como NULL.
            memory: vec![0; ALIGN],
            pages: pages.to_vec(),
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub(crate) fn encrypted(self) -> Self {
        self.state.borrow_mut().encrypted = true;
        self
    }

    /// Cualquier reserva de `len` bytes o más falla.
    pub(crate) fn failing_alloc_from(self, len: usize) -> Self {
        self.state.borrow_mut().fail_alloc_from = Some(len);
        self
    }

    /// El relleno de fondo no pinta y devuelve `false`.
    pub(crate) fn failing_fill(self) -> Self {
        self.state.borrow_mut().fail_fill = true;
        self
    }

    pub(crate) fn allocations(&self) -> usize {
        self.state.borrow().allocations
    }

    pub(crate) fn releases(&self) -> usize {
        self.state.borrow().releases
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub(crate) fn open_pages(&self) -> usize {
        self.state.borrow().open_pages.len()
    }

    pub(crate) fn live_bitmaps(&self) -> usize {
        self.state.borrow().bitmaps.len()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }
}

impl Engine for FakeEngine {
    fn init(&self) {
        self.state.borrow_mut().calls.push(Call::Init);
    }

    fn destroy(&self) {
        self.state.borrow_mut().calls.push(Call::Destroy);
    }

    fn malloc(&self, len: usize) -> Ptr {
        let mut state = self.state.borrow_mut();
        if len == 0 || state.fail_alloc_from.is_some_and(|limit| len >= limit) {
            return Ptr::NULL;
        }
        let base = state.memory.len();
        let padded = len.div_ceil(ALIGN) * ALIGN;
        let new_len = base + padded;
        state.memory.resize(new_len, 0);
        state.live.insert(base, len);
        state.allocations += 1;
        state.calls.push(Call::Malloc(Ptr(base), len));
        Ptr(base)
    }

    fn free(&self, ptr: Ptr) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.live.remove(&ptr.0).is_some(),
            "free doble o de dirección desconocida: {}",
            ptr
        );
        state.releases += 1;
        state.calls.push(Call::Free(ptr));
    }

    fn read(&self, ptr: Ptr, out: &mut [u8]) {
        let state = self.state.borrow();
        let range = state.region(ptr, out.len());
        out.copy_from_slice(&state.memory[range]);
    }

    fn write(&self, ptr: Ptr, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let range = state.region(ptr, bytes.len());
        state.memory[range].copy_from_slice(bytes);
    }

    fn load_mem_document(&self, buffer: Ptr, len: usize) -> DocumentHandle {
        let mut state = self.state.borrow_mut();
        let range = state.region(buffer, len);
        if !state.memory[range].starts_with(b"%PDF") {
            state.last_error = LastError::Format.code();
            return DocumentHandle::NULL;
        }
        if state.encrypted {
            state.last_error = LastError::Password.code();
            return DocumentHandle::NULL;
        }
        let handle = DocumentHandle(state.handle());
        state.document = Some(handle);
        state.last_error = LastError::Success.code();
        state.calls.push(Call::LoadDocument(handle));
        handle
    }

    fn close_document(&self, document: DocumentHandle) {
        let mut state = self.state.borrow_mut();
        assert_eq!(state.document.take(), Some(document), "documento no abierto");
        state.calls.push(Call::CloseDocument(document));
    }

    fn page_count(&self, document: DocumentHandle) -> i32 {
        let state = self.state.borrow();
        if state.document != Some(document) {
            return 0;
        }
        state.pages.len() as i32
    }

    fn page_size_by_index(
        &self,
        document: DocumentHandle,
        index: i32,
        width: Ptr,
        height: Ptr,
    ) -> bool {
        let size = {
            let mut state = self.state.borrow_mut();
            let size = usize::try_from(index)
                .ok()
                .and_then(|i| state.pages.get(i).copied())
                .filter(|_| state.document == Some(document));
            if size.is_none() {
                state.last_error = LastError::Page.code();
            }
            size
        };
        match size {
            Some((w, h)) => {
                self.write(width, &w.to_ne_bytes());
                self.write(height, &h.to_ne_bytes());
                true
            }
            None => false,
        }
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        let mut state = self.state.borrow_mut();
        let exists = state.document == Some(document)
            && usize::try_from(index).is_ok_and(|i| i < state.pages.len());
        if !exists {
            state.last_error = LastError::Page.code();
            return PageHandle::NULL;
        }
        let handle = state.handle();
        state.open_pages.insert(handle, index);
        state.calls.push(Call::LoadPage(index));
        PageHandle(handle)
    }

    fn close_page(&self, page: PageHandle) {
        let mut state = self.state.borrow_mut();
        let index = state.open_pages.remove(&page.0).expect("página no abierta");
        state.calls.push(Call::ClosePage(index));
    }

    fn bitmap_create_ex(
        &self,
        width: i32,
        height: i32,
        format: BitmapFormat,
        first_scan: Ptr,
        stride: i32,
    ) -> BitmapHandle {
        let mut state = self.state.borrow_mut();
        let _ = state.region(first_scan, (stride * height) as usize);
        let handle = BitmapHandle(state.handle());
        state.bitmaps.insert(
            handle.0,
            Bitmap {
                width,
                height,
                format,
                first_scan,
                stride,
            },
        );
        state.calls.push(Call::CreateBitmap(handle, first_scan));
        handle
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
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::FillRect(bitmap, color));
        if state.fail_fill {
            return false;
        }
        let (first_scan, stride, bpp, bw, bh) = {
            let b = state.bitmaps.get(&bitmap.0).expect("bitmap destruido");
            (b.first_scan, b.stride, b.format.bytes_per_pixel(), b.width, b.height)
        };
        // 0xAARRGGBB en memoria little-endian queda B, G, R, A.
        let pixel = color.to_le_bytes();
        for y in top.max(0)..(top + height).min(bh) {
            for x in left.max(0)..(left + width).min(bw) {
                let at = first_scan.0 + (y * stride) as usize + x as usize * bpp;
                state.memory[at..at + bpp].copy_from_slice(&pixel[..bpp]);
            }
        }
        true
    }

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        _start_x: i32,
        _start_y: i32,
        _size_x: i32,
        _size_y: i32,
        rotation: Rotation,
        flags: RenderFlags,
    ) {
        let mut state = self.state.borrow_mut();
        let index = *state.open_pages.get(&page.0).expect("página no abierta");
        let (first_scan, width) = {
            let b = state.bitmaps.get(&bitmap.0).expect("bitmap destruido");
            (b.first_scan, b.width)
        };
        // "Contenido": la primera fila entera con un color por página.
        let rgba = [index as u8 + 1, 0x80, 0x40, 0xFF];
        let pixel = if flags.contains(RenderFlags::REVERSE_BYTE_ORDER) {
            rgba
        } else {
            [rgba[2], rgba[1], rgba[0], rgba[3]]
        };
        for x in 0..width as usize {
            let at = first_scan.0 + x * 4;
            state.memory[at..at + 4].copy_from_slice(&pixel);
        }
        state.calls.push(Call::Render {
            page: index,
            rotation,
            flags,
        });
    }

    fn bitmap_destroy(&self, bitmap: BitmapHandle) {
        let mut state = self.state.borrow_mut();
        assert!(state.bitmaps.remove(&bitmap.0).is_some(), "bitmap destruido dos veces");
        state.calls.push(Call::DestroyBitmap(bitmap));
    }

    fn last_error(&self) -> LastError {
        LastError::from_code(self.state.borrow().last_error)
    }
}

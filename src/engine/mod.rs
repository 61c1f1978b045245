//! Contrato con el motor de renderizado.
//!
//! El motor vive al otro lado de una frontera FFI: trabaja sobre su propia
//! memoria plana (direccionada con enteros) y señala los fallos con valores
//! centinela (0, null, false) en vez de errores estructurados.
//! Este módulo no tiene lógica: solo expone una superficie tipada y estable.

pub mod pdfium;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

/// Dirección dentro de la memoria del motor. `Ptr::NULL` es el centinela de fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(pub usize);

impl Ptr {
    pub const NULL: Ptr = Ptr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Desplaza la dirección `bytes` posiciones.
    pub fn offset(self, bytes: usize) -> Ptr {
        Ptr(self.0 + bytes)
    }
}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub const NULL: $name = $name(0);

            pub fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

opaque_handle!(
    /// Documento cargado dentro del motor.
    DocumentHandle
);
opaque_handle!(
    /// Página abierta. Hay que cerrarla con [`Engine::close_page`].
    PageHandle
);
opaque_handle!(
    /// Vista de bitmap sobre un buffer ajeno. Destruirla NO libera el buffer.
    BitmapHandle
);

/// Flags de `FPDF_RenderPageBitmap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderFlags(u32);

impl RenderFlags {
    pub const NONE: Self = Self(0);
    /// Renderizar anotaciones.
    pub const ANNOT: Self = Self(1);
    pub const LCD_TEXT: Self = Self(2);
    pub const NO_NATIVETEXT: Self = Self(4);
    pub const GRAYSCALE: Self = Self(8);
    /// Escribe los canales en orden inverso: un bitmap BGRA acaba con bytes RGBA.
    pub const REVERSE_BYTE_ORDER: Self = Self(16);
    pub const DEBUG_INFO: Self = Self(128);
    pub const NO_CATCH: Self = Self(256);
    pub const LIMITED_IMAGE_CACHE: Self = Self(512);
    pub const FORCE_HALFTONE: Self = Self(1024);
    pub const PRINTING: Self = Self(2048);
    pub const NO_SMOOTH_TEXT: Self = Self(4096);
    pub const NO_SMOOTH_IMAGE: Self = Self(8192);
    pub const NO_SMOOTH_PATH: Self = Self(16384);
    pub const THUMBNAIL: Self = Self(32768);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Formatos de `FPDFBitmap_CreateEx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BitmapFormat {
    Gray = 1,
    Bgr = 2,
    Bgrx = 3,
    Bgra = 4,
}

impl BitmapFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            BitmapFormat::Gray => 1,
            BitmapFormat::Bgr => 3,
            BitmapFormat::Bgrx | BitmapFormat::Bgra => 4,
        }
    }
}

/// Rotación de página en cuartos de vuelta (valor nativo de PDFium).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Rotation {
    #[default]
    Normal = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Normal),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        self as u32 * 90
    }

    /// 90 y 270 intercambian ancho y alto del bitmap.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

/// Valores del registro de error global (`FPDF_GetLastError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastError {
    Success,
    Unknown,
    File,
    Format,
    Password,
    Security,
    Page,
}

impl LastError {
    /// Cualquier código fuera de rango se trata como desconocido.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => LastError::Success,
            2 => LastError::File,
            3 => LastError::Format,
            4 => LastError::Password,
            5 => LastError::Security,
            6 => LastError::Page,
            _ => LastError::Unknown,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            LastError::Success => 0,
            LastError::Unknown => 1,
            LastError::File => 2,
            LastError::Format => 3,
            LastError::Password => 4,
            LastError::Security => 5,
            LastError::Page => 6,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LastError::Success => "success",
            LastError::Unknown => "unknown error",
            LastError::File => "file not found or could not be opened",
            LastError::Format => "file not in PDF format or corrupted",
            LastError::Password => "password required or incorrect password",
            LastError::Security => "unsupported security scheme",
            LastError::Page => "page not found or content error",
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Operaciones del motor. Se enlazan una vez al arrancar y no cambian.
///
/// Todas toman `&self`: el motor no es reentrante y se usa desde un solo hilo,
/// así que las implementaciones pueden usar mutabilidad interior.
pub trait Engine {
    fn init(&self);
    fn destroy(&self);

    /// Reserva `len` bytes de memoria del motor. Devuelve `Ptr::NULL` si falla.
    fn malloc(&self, len: usize) -> Ptr;
    fn free(&self, ptr: Ptr);
    /// Copia `out.len()` bytes desde `ptr`.
    fn read(&self, ptr: Ptr, out: &mut [u8]);
    /// Copia `bytes` a partir de `ptr`.
    fn write(&self, ptr: Ptr, bytes: &[u8]);

    /// El buffer debe seguir vivo mientras el documento esté abierto.
    fn load_mem_document(&self, buffer: Ptr, len: usize) -> DocumentHandle;
    fn close_document(&self, document: DocumentHandle);
    fn page_count(&self, document: DocumentHandle) -> i32;
    /// Escribe ancho y alto (f64, en puntos) a través de los punteros de salida.
    fn page_size_by_index(
        &self,
        document: DocumentHandle,
        index: i32,
        width: Ptr,
        height: Ptr,
    ) -> bool;
    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle;
    fn close_page(&self, page: PageHandle);

    fn bitmap_create_ex(
        &self,
        width: i32,
        height: i32,
        format: BitmapFormat,
        first_scan: Ptr,
        stride: i32,
    ) -> BitmapHandle;
    /// `color` en formato 0xAARRGGBB. `false` si el motor no pintó nada.
    fn bitmap_fill_rect(
        &self,
        bitmap: BitmapHandle,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) -> bool;
    #[allow(clippy::too_many_arguments)]
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
    );
    fn bitmap_destroy(&self, bitmap: BitmapHandle);

    fn last_error(&self) -> LastError;
}

use crate::engine::Rotation;

/// Escala por defecto: 3 píxeles por punto (216 DPI).
pub const DEFAULT_SCALE: f64 = 3.0;

/// Página ya rasterizada, en memoria normal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Bytes RGBA, fila a fila, sin padding: `width * height * 4`.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    /// Bytes RGBA del píxel (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(at..at + 4)
    }
}

/// Cómo se rasteriza cada página de un documento.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Píxeles por punto PDF. 1.0 = 72 DPI.
    pub scale: f64,
    pub rotation: Rotation,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            rotation: Rotation::Normal,
        }
    }
}

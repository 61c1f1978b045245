pub mod arena;
pub mod document;
pub mod processor;
pub mod render;
pub mod session;

pub use arena::{with_outputs, ForeignAlloc};
pub use document::{Document, Page};
pub use processor::{Processor, NO_SIZE};
pub use render::{RenderOptions, RenderedImage, DEFAULT_SCALE};
pub use session::Session;

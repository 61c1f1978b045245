//! Instancia única del motor.
//!
//! Crear la sesión inicializa la librería y soltarla la destruye. Cargar un
//! documento consume la sesión: un motor, un documento. Después del cierre no
//! queda ningún valor con el que seguir llamando al motor.

use super::arena::ForeignAlloc;
use super::document::Document;
use super::processor::Processor;
use super::render::RenderOptions;
use crate::engine::{Engine, LastError};
use crate::error::{Error, Result};

pub struct Session<E: Engine> {
    engine: E,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        log::info!("Inicializando librería...");
        engine.init();
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Lee el registro de error global. Solo tiene sentido justo después
    /// de la llamada que se quiere diagnosticar.
    pub fn last_error(&self) -> LastError {
        self.engine.last_error()
    }

    /// Copia el PDF a memoria del motor y lo abre.
    ///
    /// Si el motor devuelve un handle nulo, el buffer se libera, la librería se
    /// destruye y el error leído del registro viaja en `Error::Load`.
    pub fn load_document(self, bytes: &[u8], options: RenderOptions) -> Result<Document<E>> {
        if bytes.is_empty() {
            return Err(Error::Load(LastError::Format));
        }

        log::info!("Cargando datos en el buffer ({} bytes)...", bytes.len());
        let input = ForeignAlloc::from_bytes(&self.engine, bytes)?;

        log::info!("Cargando documento...");
        let handle = self.engine.load_mem_document(input.ptr(), input.len());
        // Leer ya: cualquier otra llamada al motor puede pisar el registro.
        let state = self.engine.last_error();
        log::info!("Estado de carga del documento: {}", state);

        if handle.is_null() {
            return Err(Error::Load(state));
        }

        // A partir de aquí el buffer es del Document, que lo libera al cerrar.
        let input_len = input.len();
        let input = input.into_raw();
        let processor = Processor::new(self, handle, options);
        Ok(Document::new(processor, input, input_len))
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        self.engine.destroy();
        log::debug!("Librería destruida");
    }
}

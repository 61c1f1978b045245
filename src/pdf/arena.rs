//! Memoria temporal en el lado del motor.
//!
//! Cada reserva va envuelta en un guard que la libera al salir de ámbito:
//! éxito, centinela de fallo, `?` o panic. Los valores se copian fuera
//! antes de liberar, nunca se leen después.

use bytemuck::Pod;

use crate::engine::{Engine, Ptr};
use crate::error::{Error, Result};

/// Reserva viva en la memoria del motor. Se libera exactamente una vez, en `Drop`.
pub struct ForeignAlloc<'e, E: Engine + ?Sized> {
    engine: &'e E,
    ptr: Ptr,
    len: usize,
}

impl<'e, E: Engine + ?Sized> ForeignAlloc<'e, E> {
    /// Memoria a cero. Un NULL del motor es fatal para la conversión.
    pub fn new(engine: &'e E, len: usize) -> Result<Self> {
        let ptr = engine.malloc(len);
        if ptr.is_null() {
            return Err(Error::Allocation { len });
        }
        log::trace!("malloc {} bytes en {}", len, ptr);
        Ok(Self { engine, ptr, len })
    }

    /// Reserva y copia `bytes` dentro.
    pub fn from_bytes(engine: &'e E, bytes: &[u8]) -> Result<Self> {
        let alloc = Self::new(engine, bytes.len())?;
        engine.write(alloc.ptr, bytes);
        Ok(alloc)
    }

    pub fn ptr(&self) -> Ptr {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0; self.len];
        self.engine.read(self.ptr, &mut out);
        out
    }

    /// Copia el contenido y libera la reserva.
    pub fn into_vec(self) -> Vec<u8> {
        self.to_vec()
    }

    /// Suelta el guard sin liberar: el llamador pasa a ser responsable del `free`.
    pub fn into_raw(self) -> Ptr {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }
}

impl<E: Engine + ?Sized> Drop for ForeignAlloc<'_, E> {
    fn drop(&mut self) {
        log::trace!("free {}", self.ptr);
        self.engine.free(self.ptr);
    }
}

/// Llama al motor con `N` huecos de salida de tipo `T`.
///
/// Si la llamada devuelve `false` se devuelve `default` sin leer nada.
/// Si no, los `N` valores se copian inmediatamente y la memoria se libera.
pub fn with_outputs<E, T, const N: usize>(
    engine: &E,
    default: [T; N],
    call: impl FnOnce([Ptr; N]) -> bool,
) -> Result<[T; N]>
where
    E: Engine + ?Sized,
    T: Pod,
{
    const { assert!(N > 0, "with_outputs necesita al menos un hueco") };

    let size = std::mem::size_of::<T>();
    let scratch = ForeignAlloc::new(engine, N * size)?;
    let slots: [Ptr; N] = std::array::from_fn(|i| scratch.ptr().offset(i * size));

    if !call(slots) {
        return Ok(default);
    }

    let bytes = scratch.into_vec();
    Ok(std::array::from_fn(|i| {
        bytemuck::pod_read_unaligned(&bytes[i * size..(i + 1) * size])
    }))
}

//! Superficie de captura de una firma.
//!
//! El dibujo de trazos y su codificación son del widget; aquí sólo se fija el
//! ciclo de vida: al terminar una sesión de trazos se codifica el canvas y se
//! entrega `(slot, imagen)` al dueño, que sobrescribe lo anterior.
use sign_domain::DataUri;
use std::fmt;

/// Canvas del widget. `encode` devuelve el contenido actual (p. ej. PNG).
pub trait DrawingSurface: Send + Sync {
    fn encode(&self) -> DataUri;
}

/// Superficie respaldada por una imagen ya codificada (archivo, fixture).
#[derive(Debug, Clone)]
pub struct StaticImageSurface {
    image: DataUri,
}

impl StaticImageSurface {
    pub fn new(image: DataUri) -> Self {
        Self { image }
    }

    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self { image: DataUri::from_bytes("image/png", bytes) }
    }
}

impl DrawingSurface for StaticImageSurface {
    fn encode(&self) -> DataUri {
        self.image.clone()
    }
}

/// Actualización emitida por una captura hacia su colección.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotUpdate {
    pub index: usize,
    pub image: DataUri,
}

pub struct SignatureCapture {
    index: usize,
    surface: Box<dyn DrawingSurface>,
    last: Option<DataUri>,
}

impl SignatureCapture {
    pub fn new(index: usize, surface: Box<dyn DrawingSurface>) -> Self {
        Self { index,
               surface,
               last: None }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Última codificación producida (None hasta la primera sesión).
    pub fn last_image(&self) -> Option<&DataUri> {
        self.last.as_ref()
    }

    /// El usuario levantó el puntero: codifica el canvas y emite la actualización.
    pub fn end_stroke_session(&mut self) -> SlotUpdate {
        let image = self.surface.encode();
        self.last = Some(image.clone());
        SlotUpdate { index: self.index, image }
    }
}

impl fmt::Debug for SignatureCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureCapture")
         .field("index", &self.index)
         .field("last", &self.last)
         .finish()
    }
}

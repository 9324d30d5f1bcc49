//! Captura y colección de firmas manuscritas.

pub mod capture;
pub mod collection;

pub use capture::{DrawingSurface, SignatureCapture, SlotUpdate, StaticImageSurface};
pub use collection::{SignatureCollection, SignatureSlot, SlotListener};

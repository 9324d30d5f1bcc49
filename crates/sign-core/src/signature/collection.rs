//! Colección de firmas de un formulario.
//!
//! Mantiene `signatures_needed` slots densos (`0..n`) y las capturas montadas
//! sobre ellos. No exige completitud: un slot vacío simplemente no aparece en
//! el envío y el backend decide si eso es válido.
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};
use sign_domain::DataUri;

use super::capture::{DrawingSurface, SignatureCapture, SlotUpdate};
use crate::constants::{SIGNATURE_FIELD_PREFIX, SIGNATURE_FIELD_SUFFIX};
use crate::errors::WorkflowError;

/// Posición de firma. `image` es la codificación de la última sesión de trazos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSlot {
    pub index: usize,
    pub image: Option<DataUri>,
}

/// Callback notificado en cada actualización de slot.
pub type SlotListener = Box<dyn Fn(&SlotUpdate) + Send + Sync>;

pub struct SignatureCollection {
    slots: Vec<SignatureSlot>,
    captures: Vec<SignatureCapture>,
    listeners: Vec<SlotListener>,
}

impl SignatureCollection {
    pub fn new(signatures_needed: usize) -> Self {
        let slots = (0..signatures_needed).map(|index| SignatureSlot { index, image: None })
                                          .collect();
        Self { slots,
               captures: Vec::with_capacity(signatures_needed),
               listeners: Vec::new() }
    }

    pub fn signatures_needed(&self) -> usize {
        self.slots.len()
    }

    fn check_index(&self, index: usize) -> Result<(), WorkflowError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidSlotIndex { index,
                                                  needed: self.slots.len() })
        }
    }

    /// Monta una captura sobre el siguiente slot libre y devuelve su índice.
    pub fn attach(&mut self, surface: Box<dyn DrawingSurface>) -> Result<usize, WorkflowError> {
        let index = self.captures.len();
        self.check_index(index)?;
        self.captures.push(SignatureCapture::new(index, surface));
        Ok(index)
    }

    pub fn capture(&self, index: usize) -> Option<&SignatureCapture> {
        self.captures.get(index)
    }

    /// Registra un listener; se invoca después de aplicar cada actualización.
    pub fn subscribe(&mut self, listener: SlotListener) {
        self.listeners.push(listener);
    }

    /// Sobrescribe la imagen del slot `index` (last-write-wins).
    pub fn update_slot(&mut self, index: usize, image: DataUri) -> Result<(), WorkflowError> {
        self.check_index(index)?;
        debug!("slot {index} updated sha256={}", image.digest());
        let update = SlotUpdate { index, image };
        self.slots[index].image = Some(update.image.clone());
        for listener in &self.listeners {
            listener(&update);
        }
        Ok(())
    }

    /// Fin de una sesión de trazos sobre la captura del slot `index`.
    pub fn stroke_session_ended(&mut self, index: usize) -> Result<SlotUpdate, WorkflowError> {
        self.check_index(index)?;
        let capture = self.captures
                          .get_mut(index)
                          .ok_or_else(|| WorkflowError::Internal(format!("no capture mounted on slot {index}")))?;
        let update = capture.end_stroke_session();
        self.update_slot(update.index, update.image.clone())?;
        Ok(update)
    }

    pub fn slots(&self) -> &[SignatureSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SignatureSlot> {
        self.slots.get(index)
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.image.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == self.slots.len()
    }

    /// Nombre estable del campo de formulario para un slot.
    pub fn field_name(index: usize) -> String {
        format!("{SIGNATURE_FIELD_PREFIX}.{index}.{SIGNATURE_FIELD_SUFFIX}")
    }

    /// Campos a fusionar en el formulario, uno por slot con imagen, en orden de slot.
    pub fn to_submission_fields(&self) -> IndexMap<String, String> {
        self.slots
            .iter()
            .filter_map(|s| s.image.as_ref().map(|img| (Self::field_name(s.index), img.as_str().to_string())))
            .collect()
    }

    /// Modo JSON: escribe `signatures[i].data_uri` en el payload del reporte.
    /// Conserva las demás claves de cada firma; crea entradas vacías si faltan.
    pub fn attach_to_payload(&self, payload: &mut Value) -> Result<(), WorkflowError> {
        let root = payload.as_object_mut()
                          .ok_or_else(|| WorkflowError::InvalidSource("payload must be a JSON object".into()))?;
        let entry = root.entry("signatures").or_insert_with(|| Value::Array(Vec::new()));
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
        let list = entry.as_array_mut()
                        .ok_or_else(|| WorkflowError::InvalidSource("`signatures` must be an array".into()))?;
        for slot in &self.slots {
            let Some(image) = &slot.image else { continue };
            while list.len() <= slot.index {
                list.push(Value::Object(Map::new()));
            }
            let signature = list[slot.index]
                .as_object_mut()
                .ok_or_else(|| WorkflowError::InvalidSource(format!("signatures[{}] must be an object", slot.index)))?;
            signature.insert("data_uri".to_string(), Value::String(image.as_str().to_string()));
        }
        Ok(())
    }
}

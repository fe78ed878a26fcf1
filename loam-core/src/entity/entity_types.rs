//! Registry of entity decoders, used when loading chunks.

use loam_utils::Identifier;
use rustc_hash::FxHashMap;

use super::Entity;

/// Rebuilds an entity from the value its [`Entity::save`] produced.
pub type EntityDecoder = fn(&serde_json::Value) -> Option<Box<dyn Entity>>;

/// Maps entity kinds to their decoders.
#[derive(Default)]
pub struct EntityTypes {
    decoders: FxHashMap<Identifier, EntityDecoder>,
}

impl EntityTypes {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the decoder for an entity kind, replacing any previous one.
    pub fn register(&mut self, kind: Identifier, decoder: EntityDecoder) {
        if self.decoders.insert(kind.clone(), decoder).is_some() {
            log::warn!("Entity decoder for {kind} registered twice");
        }
    }

    /// Decodes a persisted entity. Unknown kinds and rejected data yield `None`.
    #[must_use]
    pub fn decode(&self, kind: &Identifier, data: &serde_json::Value) -> Option<Box<dyn Entity>> {
        let Some(decoder) = self.decoders.get(kind) else {
            log::warn!("No decoder registered for entity {kind}, dropping it");
            return None;
        };
        let entity = decoder(data);
        if entity.is_none() {
            log::warn!("Failed to decode entity {kind}, dropping it");
        }
        entity
    }

    /// Whether a kind has a decoder.
    #[must_use]
    pub fn contains(&self, kind: &Identifier) -> bool {
        self.decoders.contains_key(kind)
    }
}

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use switchboard_core::{EventListeners, Model, ModelType, SwitchboardError};

use crate::events::RegistryEvent;
use crate::provider::ProviderAdapter;

struct ProviderEntry {
    adapter: Arc<dyn ProviderAdapter>,
    models: Vec<Model>,
}

/// Tracks registered providers and the models they expose.
///
/// Reads (model lookup, listing) happen on every request; registration and
/// unregistration are rare operator actions. A `RwLock` over a `HashMap`
/// favors the read path, the same tradeoff the teacher's health-check
/// registry makes for its own rarely-mutated provider table. A secondary
/// index groups model ids by [`ModelType`] so `FilterByModelType` doesn't
/// need a full scan.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, ProviderEntry>>,
    by_model_type: RwLock<HashMap<ModelType, Vec<(String, String)>>>,
    event_listeners: EventListeners<RegistryEvent>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            by_model_type: RwLock::new(HashMap::new()),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn on_event<F>(&mut self, f: F)
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(switchboard_core::FnListener::new(f));
    }

    /// Registers a provider, snapshotting the models it currently reports.
    /// Re-registering the same name replaces the previous entry and
    /// rebuilds the secondary index entirely (spec §3: models are
    /// immutable once registered, but the provider as a whole can be
    /// re-registered to pick up a changed model list).
    pub fn register(&self, adapter: Arc<dyn ProviderAdapter>) {
        let name = adapter.name().to_string();
        let models: Vec<Model> = adapter
            .models()
            .into_iter()
            .map(|mut m| {
                m.provider = name.clone();
                m
            })
            .collect();

        {
            let mut providers = self.providers.write().unwrap();
            providers.insert(
                name.clone(),
                ProviderEntry {
                    adapter,
                    models: models.clone(),
                },
            );
        }
        self.rebuild_index();

        self.event_listeners
            .emit(&RegistryEvent::ProviderRegistered {
                provider: name,
                timestamp: Instant::now(),
            });
    }

    pub fn unregister(&self, provider: &str) {
        self.providers.write().unwrap().remove(provider);
        self.rebuild_index();
        self.event_listeners
            .emit(&RegistryEvent::ProviderUnregistered {
                provider: provider.to_string(),
                timestamp: Instant::now(),
            });
    }

    fn rebuild_index(&self) {
        let providers = self.providers.read().unwrap();
        let mut index: HashMap<ModelType, Vec<(String, String)>> = HashMap::new();
        for (name, entry) in providers.iter() {
            for model in &entry.models {
                index
                    .entry(model.model_type)
                    .or_default()
                    .push((name.clone(), model.id.clone()));
            }
        }
        *self.by_model_type.write().unwrap() = index;
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers
            .read()
            .unwrap()
            .get(provider)
            .map(|e| Arc::clone(&e.adapter))
    }

    pub fn list(&self) -> Vec<String> {
        self.providers.read().unwrap().keys().cloned().collect()
    }

    pub fn models(&self, provider: &str) -> Vec<Model> {
        self.providers
            .read()
            .unwrap()
            .get(provider)
            .map(|e| e.models.clone())
            .unwrap_or_default()
    }

    /// Every (provider, model) pair serving `model_type`.
    pub fn filter_by_model_type(&self, model_type: ModelType) -> Vec<(String, String)> {
        self.by_model_type
            .read()
            .unwrap()
            .get(&model_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolves an explicit model id to its provider and full `Model`, or
    /// `None` if no registered provider serves it.
    pub fn find_model(&self, model_id: &str) -> Option<(String, Model)> {
        let providers = self.providers.read().unwrap();
        for (name, entry) in providers.iter() {
            if let Some(model) = entry.models.iter().find(|m| m.id == model_id) {
                return Some((name.clone(), model.clone()));
            }
        }
        None
    }

    /// Resolves an explicit provider name + model id, validating the model
    /// actually belongs to that provider.
    pub fn resolve(&self, provider: &str, model_id: &str) -> Result<Model, SwitchboardError> {
        let providers = self.providers.read().unwrap();
        let entry = providers
            .get(provider)
            .ok_or_else(|| SwitchboardError::ModelNotFound {
                provider: Some(provider.to_string()),
                model: Some(model_id.to_string()),
            })?;
        entry
            .models
            .iter()
            .find(|m| m.id == model_id)
            .cloned()
            .ok_or_else(|| SwitchboardError::ModelNotFound {
                provider: Some(provider.to_string()),
                model: Some(model_id.to_string()),
            })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

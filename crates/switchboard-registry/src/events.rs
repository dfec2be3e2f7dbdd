use std::time::Instant;
use switchboard_core::SwitchboardEvent;

#[derive(Debug, Clone)]
pub enum RegistryEvent {
    ProviderRegistered { provider: String, timestamp: Instant },
    ProviderUnregistered { provider: String, timestamp: Instant },
    ModelSelected {
        provider: String,
        model: String,
        strategy: &'static str,
        timestamp: Instant,
    },
}

impl SwitchboardEvent for RegistryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistryEvent::ProviderRegistered { .. } => "registry_provider_registered",
            RegistryEvent::ProviderUnregistered { .. } => "registry_provider_unregistered",
            RegistryEvent::ModelSelected { .. } => "registry_model_selected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RegistryEvent::ProviderRegistered { timestamp, .. }
            | RegistryEvent::ProviderUnregistered { timestamp, .. }
            | RegistryEvent::ModelSelected { timestamp, .. } => *timestamp,
        }
    }
}

//! Model Registry - known descriptors, lazily loaded adapters, active model.
//!
//! Locking:
//! - `known`, `loaded`, `active` are each behind a short-lived `RwLock`;
//!   nothing slow runs while they are held.
//! - `switch_lock` serializes `switch_active` calls end to end.
//! - Loads go through `SingleFlight`, one run per identifier at a time.
//!
//! `active` only ever holds an adapter that finished loading, so routing a
//! prediction never waits on a load.
//!
//! After `shutdown` the registry is closed: a load still running at that
//! point is discarded instead of being published into `loaded`.

pub mod single_flight;


use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{LoadError, RegistryError, SwitchError};
use crate::logic::model::{ArtifactLoader, ModelAdapter, ModelDescriptor};
use single_flight::SingleFlight;

pub use single_flight::Role;

type LoadOutcome = Result<Arc<ModelAdapter>, LoadError>;

#[derive(Default)]
struct Known {
    /// Registration order
    order: Vec<String>,
    by_id: HashMap<String, Arc<ModelDescriptor>>,
}

pub struct ModelRegistry {
    loader: Arc<dyn ArtifactLoader>,
    known: RwLock<Known>,
    loaded: RwLock<HashMap<String, Arc<ModelAdapter>>>,
    active: RwLock<Option<Arc<ModelAdapter>>>,
    switch_lock: Mutex<()>,
    loads: SingleFlight<LoadOutcome>,
    /// Set by `shutdown`; only flipped while `loaded` is write-locked
    closed: AtomicBool,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            loader,
            known: RwLock::new(Known::default()),
            loaded: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
            switch_lock: Mutex::new(()),
            loads: SingleFlight::new(),
            closed: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Add a descriptor. Meant for startup, before requests are served.
    pub fn register(&self, descriptor: ModelDescriptor) -> Result<(), RegistryError> {
        if descriptor.identifier.trim().is_empty() {
            return Err(RegistryError::InvalidDescriptor {
                identifier: descriptor.identifier,
                reason: "identifier is empty".to_string(),
            });
        }
        if descriptor.labels.is_empty() {
            return Err(RegistryError::InvalidDescriptor {
                identifier: descriptor.identifier,
                reason: "label set is empty".to_string(),
            });
        }

        let mut known = self.known.write();
        if known.by_id.contains_key(&descriptor.identifier) {
            return Err(RegistryError::DuplicateIdentifier(descriptor.identifier));
        }

        log::info!(
            "Registered model '{}' ({}, {} labels) at {}",
            descriptor.identifier,
            descriptor.family,
            descriptor.labels.len(),
            descriptor.location_display()
        );
        known.order.push(descriptor.identifier.clone());
        known
            .by_id
            .insert(descriptor.identifier.clone(), Arc::new(descriptor));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn descriptor(&self, identifier: &str) -> Option<Arc<ModelDescriptor>> {
        self.known.read().by_id.get(identifier).cloned()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<Arc<ModelDescriptor>> {
        let known = self.known.read();
        known
            .order
            .iter()
            .filter_map(|id| known.by_id.get(id).cloned())
            .collect()
    }

    pub fn is_known(&self, identifier: &str) -> bool {
        self.known.read().by_id.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.known.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loaded identifiers in registration order.
    pub fn loaded_identifiers(&self) -> Vec<String> {
        let loaded = self.loaded.read();
        self.known
            .read()
            .order
            .iter()
            .filter(|id| loaded.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn loaded_adapters(&self) -> Vec<Arc<ModelAdapter>> {
        let loaded = self.loaded.read();
        self.known
            .read()
            .order
            .iter()
            .filter_map(|id| loaded.get(id).cloned())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.loaded.read().contains_key(identifier)
    }

    /// The committed active adapter. Never waits on a load.
    pub fn get_active(&self) -> Option<Arc<ModelAdapter>> {
        self.active.read().clone()
    }

    pub fn active_identifier(&self) -> Option<String> {
        self.active
            .read()
            .as_ref()
            .map(|adapter| adapter.identifier().to_string())
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Load `identifier` if needed. Concurrent calls for the same identifier
    /// share one load and observe the same outcome.
    pub fn ensure_loaded(&self, identifier: &str) -> Result<Arc<ModelAdapter>, SwitchError> {
        let descriptor = self
            .descriptor(identifier)
            .ok_or_else(|| SwitchError::UnknownModel(identifier.to_string()))?;

        if let Some(adapter) = self.loaded.read().get(identifier) {
            return Ok(Arc::clone(adapter));
        }

        if self.is_closed() {
            return Err(SwitchError::LoadFailed {
                identifier: identifier.to_string(),
                cause: LoadError::Cancelled(identifier.to_string()),
            });
        }

        let location = descriptor.location_display();
        let (outcome, role) = self.loads.run(
            identifier,
            || self.loaded.read().get(identifier).cloned().map(Ok),
            || self.load_adapter(descriptor),
        );

        if role == Role::Follower {
            log::debug!("Joined in-flight load of '{}'", identifier);
        }

        // `None`: the leading load unwound
        let outcome = outcome
            .unwrap_or_else(|| Err(LoadError::corrupt(location, "load aborted by a panic")));

        outcome.map_err(|cause| SwitchError::LoadFailed {
            identifier: identifier.to_string(),
            cause,
        })
    }

    fn load_adapter(&self, descriptor: Arc<ModelDescriptor>) -> LoadOutcome {
        let identifier = descriptor.identifier.clone();
        log::info!("Loading model '{}'...", identifier);

        let adapter = Arc::new(ModelAdapter::new(descriptor, Arc::clone(&self.loader)));
        match adapter.load() {
            Ok(()) => {
                let mut loaded = self.loaded.write();
                if self.is_closed() {
                    drop(loaded);
                    adapter.unload();
                    log::info!("Discarded model '{}' loaded after shutdown", identifier);
                    return Err(LoadError::Cancelled(identifier));
                }
                loaded.insert(identifier, Arc::clone(&adapter));
                Ok(adapter)
            }
            Err(e) => {
                log::warn!("Failed to load model '{}': {}", identifier, e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Switching
    // ------------------------------------------------------------------------

    /// Make `identifier` the active model. All-or-nothing: on failure the
    /// previous model keeps serving. Returns the previously active identifier.
    pub fn switch_active(&self, identifier: &str) -> Result<Option<String>, SwitchError> {
        if !self.is_known(identifier) {
            return Err(SwitchError::UnknownModel(identifier.to_string()));
        }

        let _guard = self.switch_lock.lock();
        let adapter = self.ensure_loaded(identifier)?;

        let previous = {
            let mut active = self.active.write();
            let previous = active.as_ref().map(|a| a.identifier().to_string());
            *active = Some(adapter);
            previous
        };

        log::info!(
            "Active model: {} -> {}",
            previous.as_deref().unwrap_or("<none>"),
            identifier
        );
        Ok(previous)
    }

    // ------------------------------------------------------------------------
    // Eviction / teardown
    // ------------------------------------------------------------------------

    /// Unload a loaded, non-active model. Returns whether anything was loaded.
    pub fn evict(&self, identifier: &str) -> Result<bool, RegistryError> {
        if !self.is_known(identifier) {
            return Err(RegistryError::UnknownModel(identifier.to_string()));
        }

        // a concurrent switch could otherwise activate the adapter being evicted
        let _guard = self.switch_lock.lock();
        if self.active_identifier().as_deref() == Some(identifier) {
            return Err(RegistryError::ActiveModel(identifier.to_string()));
        }

        let removed = self.loaded.write().remove(identifier);
        match removed {
            Some(adapter) => {
                adapter.unload();
                log::info!("Evicted model '{}'", identifier);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release every adapter. The registry serves and loads nothing afterwards.
    pub fn shutdown(&self) {
        let _guard = self.switch_lock.lock();
        self.active.write().take();
        let drained: Vec<_> = {
            let mut loaded = self.loaded.write();
            self.closed.store(true, Ordering::Release);
            loaded.drain().collect()
        };
        for (_, adapter) in drained {
            adapter.unload();
        }
        log::info!("Model registry shut down");
    }
}

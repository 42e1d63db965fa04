//! Runtime orchestration.
//!
//! ```text
//! AxonConfig ──► select_library ──► EventManager ◄── DisabledModules (gate)
//!                                       │
//!                      CommandRegistry  ListenerRegistry
//!                               ▲          ▲
//!          ModuleDescriptor ──► Module::init     (load_module / unload_module)
//! ```
//!
//! The library interface is selected once, when the runtime is built.
//! Modules are loaded and unloaded at any time after that; `shutdown`
//! unloads them in reverse load order.

use std::future::Future;
use std::sync::Arc;

use axon_core::{BoxedEventSource, BoxedLibrary, KeyedContainer, LibraryType};
use axon_framework::{
    BoxedGate, CommandRegistry, DisabledModules, EventManager, ListenerRegistry, MessageCollector,
    Module, ModuleDescriptor,
};
use axon_library_cached::CachedLibrary;
use axon_library_gateway::GatewayLibrary;
use parking_lot::RwLock;
use tokio::signal;
use tracing::{info, warn};

use crate::config::{AxonConfig, ConfigLoader, ConfigResult};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Builds the library interface for the configured upstream shape.
pub fn select_library(library: LibraryType, source: BoxedEventSource) -> BoxedLibrary {
    let selected: BoxedLibrary = match library {
        LibraryType::Gateway => Arc::new(GatewayLibrary::new(source)),
        LibraryType::Cached => Arc::new(CachedLibrary::new(source)),
    };
    info!(
        library = %library,
        name = selected.name(),
        events = selected.bindings().len(),
        "Selected library interface"
    );
    selected
}

/// Owns the shared registries and the loaded modules.
pub struct AxonRuntime {
    config: AxonConfig,
    library: BoxedLibrary,
    gate: Arc<DisabledModules>,
    events: Arc<EventManager>,
    commands: Arc<CommandRegistry>,
    listeners: Arc<ListenerRegistry>,
    modules: RwLock<KeyedContainer<Arc<Module>>>,
}

impl AxonRuntime {
    /// Creates a runtime from the default configuration sources.
    ///
    /// Falls back to built-in defaults if loading fails.
    pub fn new(source: BoxedEventSource) -> Self {
        let config = ConfigLoader::new().load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config ({e}), using defaults");
            AxonConfig::default()
        });
        Self::from_config(config, source)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Initializes logging unless a subscriber is already installed.
    pub fn from_config(config: AxonConfig, source: BoxedEventSource) -> Self {
        logging::init_from_config(&config.logging);

        let library = select_library(config.library, source);
        let gate = Arc::new(DisabledModules::new());
        let events = Arc::new(EventManager::new(
            library.clone(),
            gate.clone() as BoxedGate,
        ));

        info!(
            library = %config.library,
            disabled_modules = config.disabled_modules.len(),
            "Runtime initialized from configuration"
        );

        Self {
            library,
            gate,
            commands: Arc::new(CommandRegistry::new()),
            listeners: Arc::new(ListenerRegistry::new(events.clone())),
            events,
            modules: RwLock::new(KeyedContainer::new()),
            config,
        }
    }

    pub fn config(&self) -> &AxonConfig {
        &self.config
    }

    pub fn library(&self) -> &BoxedLibrary {
        &self.library
    }

    /// Per-scope module enablement consulted before every listener runs.
    pub fn gate(&self) -> &Arc<DisabledModules> {
        &self.gate
    }

    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// Instantiates and initializes the module `descriptor` defines.
    ///
    /// Returns `Ok(None)` if the module is disabled by configuration or by
    /// its descriptor. If activation fails part way, the module stays loaded
    /// with whatever it managed to register and the first failure is
    /// returned; unload it to retract it.
    pub fn load_module(&self, descriptor: &ModuleDescriptor) -> RuntimeResult<Option<Arc<Module>>> {
        let label = descriptor.label;
        if !descriptor.enabled || self.config.is_module_disabled(label) {
            info!(module = label, "Module disabled, skipping");
            return Ok(None);
        }

        let mut modules = self.modules.write();
        if modules.has(label) {
            return Err(RuntimeError::ModuleExists(label.to_string()));
        }

        let module = Arc::new(descriptor.instantiate(self.commands.clone(), self.listeners.clone()));
        let result = module.init((descriptor.commands)(), (descriptor.listeners)());
        if modules.add(label, module.clone()).is_err() {
            return Err(RuntimeError::ModuleExists(label.to_string()));
        }

        result?;
        Ok(Some(module))
    }

    /// Loads every descriptor in order and returns the first failure.
    ///
    /// A failing module does not stop the ones after it.
    pub fn load_modules(&self, descriptors: &[ModuleDescriptor]) -> RuntimeResult<usize> {
        let mut loaded = 0;
        let mut first_error = None;

        for descriptor in descriptors {
            match self.load_module(descriptor) {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(module = descriptor.label, error = %e, "Module failed to load");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(loaded),
        }
    }

    /// Unloads the module and unregisters all of its entities.
    pub fn unload_module(&self, label: &str) -> RuntimeResult<Arc<Module>> {
        let module = self
            .modules
            .write()
            .remove(label)
            .ok_or_else(|| RuntimeError::UnknownModule(label.to_string()))?;
        module.unload();
        Ok(module)
    }

    /// Unloads the module if loaded, then loads it again from `descriptor`.
    pub fn reload_module(
        &self,
        descriptor: &ModuleDescriptor,
    ) -> RuntimeResult<Option<Arc<Module>>> {
        match self.unload_module(descriptor.label) {
            Ok(_) | Err(RuntimeError::UnknownModule(_)) => self.load_module(descriptor),
            Err(e) => Err(e),
        }
    }

    pub fn module(&self, label: &str) -> Option<Arc<Module>> {
        self.modules.read().get(label).cloned()
    }

    /// Labels of the loaded modules, in load order.
    pub fn module_labels(&self) -> Vec<String> {
        self.modules.read().keys().map(str::to_string).collect()
    }

    /// A new collector using the configured defaults.
    pub fn collector(&self) -> MessageCollector {
        MessageCollector::new(self.events.clone(), self.config.collector.clone())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Unloads every module, most recently loaded first.
    pub fn shutdown(&self) {
        let modules = std::mem::take(&mut *self.modules.write()).into_entries();
        let count = modules.len();
        for (_, module) in modules.into_iter().rev() {
            module.unload();
        }
        info!(modules = count, "Runtime shut down");
    }

    /// Runs until Ctrl+C (or SIGTERM on unix), then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!(
            modules = self.modules.read().len(),
            "Axon runtime is now running. Press Ctrl+C to stop."
        );
        let result = wait_for_shutdown().await;
        self.shutdown();
        result
    }

    /// Runs until `shutdown` completes, then shuts down.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        shutdown.await;
        self.shutdown();
    }
}

impl std::fmt::Debug for AxonRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxonRuntime")
            .field("library", &self.config.library)
            .field("modules", &self.module_labels())
            .field("commands", &self.commands.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builds an [`AxonRuntime`] from a customised [`ConfigLoader`].
///
/// ```rust,ignore
/// let runtime = AxonRuntime::builder()
///     .config_file("axon.toml")
///     .profile("production")
///     .build(source)?;
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    pub fn merge(mut self, config: AxonConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime over `source`.
    pub fn build(self, source: BoxedEventSource) -> ConfigResult<AxonRuntime> {
        let config = self.loader.load()?;
        Ok(AxonRuntime::from_config(config, source))
    }
}

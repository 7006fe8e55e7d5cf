//! Bootstrap coordination
//!
//! Runs payload selection, cache materialization and module loading exactly
//! once, and remembers the outcome. A failure is never retried: every later
//! access observes the same [`BootstrapError`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::cache::CacheMaterializer;
use crate::config::LoaderConfig;
use crate::error::{BootstrapError, LoadError};
use crate::native::{DylibLoader, ModuleLoader, NativeModule};
use crate::payload::ModuleDescriptor;
use crate::resources::Resources;

/// The memoized result of the bootstrap.
pub type LoadOutcome = Result<Arc<dyn NativeModule>, Arc<BootstrapError>>;

/// Progress of the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl BootstrapState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BootstrapState::NotStarted,
            1 => BootstrapState::Running,
            2 => BootstrapState::Succeeded,
            _ => BootstrapState::Failed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            BootstrapState::NotStarted => 0,
            BootstrapState::Running => 1,
            BootstrapState::Succeeded => 2,
            BootstrapState::Failed => 3,
        }
    }
}

/// Owns everything needed to bring the module up, and the memoized outcome.
///
/// Share it with `Arc`; the first caller of [`Bootstrapper::module`] runs the
/// pipeline while concurrent callers block until it finishes.
pub struct Bootstrapper {
    config: LoaderConfig,
    descriptor: ModuleDescriptor,
    cache: CacheMaterializer,
    loader: Box<dyn ModuleLoader>,
    state: AtomicU8,
    outcome: OnceCell<LoadOutcome>,
}

impl Bootstrapper {
    /// Bootstrapper for the running process using the platform loader.
    pub fn new(config: LoaderConfig, resources: Arc<Resources>) -> Self {
        let cache = CacheMaterializer::new(config.cache_root(), resources);
        Self {
            config,
            descriptor: ModuleDescriptor::current(),
            cache,
            loader: Box::new(DylibLoader),
            state: AtomicU8::new(BootstrapState::NotStarted.as_u8()),
            outcome: OnceCell::new(),
        }
    }

    /// Replace the module loader.
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replace the descriptor derived from the running process.
    pub fn with_descriptor(mut self, descriptor: ModuleDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> BootstrapState {
        BootstrapState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The loaded module, bootstrapping on first call.
    pub fn module(&self) -> LoadOutcome {
        self.outcome().clone()
    }

    /// The memoized outcome, bootstrapping on first call.
    pub fn outcome(&self) -> &LoadOutcome {
        self.outcome.get_or_init(|| self.run())
    }

    /// The outcome if the bootstrap has already finished.
    pub fn try_outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.get()
    }

    fn run(&self) -> LoadOutcome {
        self.set_state(BootstrapState::Running);

        // A panic must still settle the cell, or the next caller would rerun the pipeline.
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.pipeline()))
            .unwrap_or_else(|payload| {
                Err(LoadError::initialization(
                    self.descriptor.module_name(),
                    format!("loader panicked: {}", panic_message(payload.as_ref())),
                ))
            });

        match result {
            Ok(module) => {
                info!(module = self.descriptor.module_name(), "embedded module ready");
                self.set_state(BootstrapState::Succeeded);
                Ok(module)
            }
            Err(error) => {
                let error = Arc::new(BootstrapError::new(self.descriptor.architecture(), error));
                warn!(stage = %error.stage(), "{}", error);
                self.set_state(BootstrapState::Failed);
                Err(error)
            }
        }
    }

    fn pipeline(&self) -> Result<Arc<dyn NativeModule>, LoadError> {
        let directory = self.cache.ensure_cache_directory(self.config.version())?;
        let module_file = self.cache.ensure_module_file(&self.descriptor, &directory)?;
        self.cache.ensure_auxiliary_files(&directory)?;

        self.loader.load(&module_file, &directory)
    }

    fn set_state(&self, state: BootstrapState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for Bootstrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrapper")
            .field("config", &self.config)
            .field("descriptor", &self.descriptor)
            .field("state", &self.state())
            .finish()
    }
}

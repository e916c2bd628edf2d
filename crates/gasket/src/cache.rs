//! Instrumented modules, built once per code hash.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::context::Context;
use crate::engine::{Engine, Instance};
use crate::error::{Error, Result};
use crate::intrinsics::Resolver;
use crate::module::ExportKind;
use crate::name::Name;
use crate::passes::{self, InstrumentOptions};
use crate::types::{Digest, FuncSig, Value, ValueType};

/// Export every contract provides: `apply(action_name: i64)`.
pub const ENTRY_POINT: &str = "apply";

/// An instrumented, linked and instantiated module.
pub struct InstantiatedModule {
    instance: Box<dyn Instance>,
    exports: HashMap<String, FuncSig>,
    initial_pages: u32,
    max_pages: u32,
    image: Vec<u8>,
}

impl std::fmt::Debug for InstantiatedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstantiatedModule")
            .field("exports", &self.exports)
            .field("initial_pages", &self.initial_pages)
            .field("max_pages", &self.max_pages)
            .field("image_len", &self.image.len())
            .finish_non_exhaustive()
    }
}

impl InstantiatedModule {
    /// Instrument `code`, resolve its imports and hand it to `engine`.
    pub fn build(engine: &dyn Engine, code: &[u8], options: &InstrumentOptions) -> Result<Self> {
        let instrumented = passes::instrument(code, options)?;
        let imports = Resolver::new().link(&instrumented.module)?;
        let (initial_pages, max_pages) = instrumented.memory_pages();

        let module = &instrumented.module;
        let exports = module
            .exports
            .iter()
            .filter(|e| e.kind == ExportKind::Func)
            .filter_map(|e| Some((e.name.clone(), module.func_sig(e.index)?.clone())))
            .collect();

        let instance = engine.instantiate(&instrumented.wasm, imports)?;
        Ok(Self {
            instance,
            exports,
            initial_pages,
            max_pages,
            image: instrumented.image,
        })
    }

    pub fn initial_pages(&self) -> u32 {
        self.initial_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn export_sig(&self, name: &str) -> Option<&FuncSig> {
        self.exports.get(name)
    }

    /// Reset memory and invoke `export`.
    ///
    /// A module without the export completes without doing anything. An
    /// `ftl_exit` from inside the module counts as a normal return.
    pub fn call(&self, ctx: &mut Context<'_>, export: &str, args: &[Value]) -> Result<Option<Value>> {
        let Some(sig) = self.exports.get(export) else {
            debug!(export, "export not found, nothing to run");
            return Ok(None);
        };
        if sig.params.len() != args.len() {
            return Err(Error::runtime(format!(
                "export {export} takes {} arguments, got {}",
                sig.params.len(),
                args.len()
            )));
        }

        ctx.memory.reset(self.initial_pages, &self.image)?;
        ctx.max_pages = self.max_pages;
        match self.instance.invoke(ctx, export, args) {
            Err(Error::Exit(code)) => {
                debug!(code, "module exited");
                Ok(None)
            }
            other => other,
        }
    }

    /// Run the contract entry point for `action`.
    pub fn apply(&self, ctx: &mut Context<'_>, action: Name) -> Result<()> {
        if let Some(sig) = self.exports.get(ENTRY_POINT) {
            if sig.params.first().is_some_and(|&p| p != ValueType::I64) {
                return Err(Error::runtime(format!("{ENTRY_POINT} must take an i64 action name")));
            }
        }
        self.call(ctx, ENTRY_POINT, &[Value::I64(action.0 as i64)])
            .map(|_| ())
    }
}

type Slot = Arc<OnceLock<Result<Arc<InstantiatedModule>>>>;

/// Map from code hash to instantiated module.
///
/// The map lock is only held to find or insert a slot. The build itself
/// runs inside the slot's `OnceLock`, so concurrent callers for the same
/// hash wait for one build while other hashes proceed. Failures are cached
/// too: the same bytes fail the same way.
pub struct ModuleCache {
    engine: Arc<dyn Engine>,
    options: InstrumentOptions,
    entries: Mutex<HashMap<Digest, Slot>>,
    builds: AtomicUsize,
}

impl ModuleCache {
    pub fn new(engine: Arc<dyn Engine>, options: InstrumentOptions) -> Self {
        Self {
            engine,
            options,
            entries: Mutex::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Cached module for `code_id`, building it from `code` on a miss.
    pub fn get_or_build(&self, code_id: Digest, code: &[u8]) -> Result<Arc<InstantiatedModule>> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(code_id).or_default())
        };
        slot.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::SeqCst);
            debug!(%code_id, len = code.len(), "building module");
            InstantiatedModule::build(self.engine.as_ref(), code, &self.options).map(Arc::new)
        })
        .clone()
    }

    /// Number of builds started so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

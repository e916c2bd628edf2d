//! The instrumentation pipeline.
//!
//! ```text
//! decode -> memory clamp -> gas -> float -> call fixup -> encode
//! ```
//!
//! The gas pass runs before the float pass so float instructions are
//! priced by their own opcode; the calls that replace them are free.
//! The call fixup must come last: it needs the final injected count.

pub mod calls;
pub mod float;
pub mod gas;
pub mod memory;

use tracing::debug;

use crate::error::Result;
use crate::injector::Injector;
use crate::module::{self, Module};

/// Linear memory ceiling, in pages (33 MiB).
pub const DEFAULT_MAX_MEMORY_PAGES: u32 = 528;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentOptions {
    pub max_memory_pages: u32,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
        }
    }
}

/// Output of [`instrument`].
#[derive(Debug, Clone)]
pub struct Instrumented {
    /// The rewritten module.
    pub module: Module,
    /// Its binary encoding.
    pub wasm: Vec<u8>,
    /// Initial memory contents, see [`memory::initial_image`].
    pub image: Vec<u8>,
    /// Number of imports spliced in by the passes.
    pub injected: u32,
}

impl Instrumented {
    /// Initial and maximum memory size in pages.
    pub fn memory_pages(&self) -> (u32, u32) {
        self.module
            .memory_limits()
            .map_or((0, 0), |l| (l.initial, l.maximum.unwrap_or(l.initial)))
    }
}

/// Decode, rewrite and re-encode a module.
pub fn instrument(wasm: &[u8], options: &InstrumentOptions) -> Result<Instrumented> {
    let mut module = module::decode(wasm)?;
    memory::clamp(&mut module, options.max_memory_pages)?;

    let mut injector = Injector::new(&module);
    gas::inject(&mut module, &mut injector)?;
    float::inject(&mut module, &mut injector)?;
    calls::fixup(&mut module, &injector);

    let image = memory::initial_image(&module)?;
    let encoded = module::encode(&module);
    debug!(
        input = wasm.len(),
        output = encoded.len(),
        injected = injector.injected(),
        "instrumented module"
    );
    Ok(Instrumented {
        module,
        wasm: encoded,
        image,
        injected: injector.injected(),
    })
}

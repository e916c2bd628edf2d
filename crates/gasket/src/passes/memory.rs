//! Memory ceiling and the initial memory image.

use gasket_runtime::PAGE_SIZE;
use tracing::debug;

use crate::error::{Error, Result};
use crate::module::{ImportKind, Limits, Module};

fn clamp_limits(limits: &mut Limits, ceiling: u32) -> Result<()> {
    if limits.initial > ceiling {
        return Err(Error::runtime(format!(
            "initial memory of {} pages exceeds the limit of {ceiling} pages",
            limits.initial
        )));
    }
    limits.maximum = Some(limits.maximum.map_or(ceiling, |max| max.min(ceiling)));
    Ok(())
}

/// Lower the declared maximum of the module's memory to `ceiling` pages.
/// A memory with no maximum gets `ceiling` as its maximum.
pub fn clamp(module: &mut Module, ceiling: u32) -> Result<()> {
    if let Some(limits) = module.memory.as_mut() {
        clamp_limits(limits, ceiling)?;
    }
    for import in module.imports.iter_mut() {
        if let ImportKind::Memory(limits) = &mut import.kind {
            clamp_limits(limits, ceiling)?;
        }
    }
    Ok(())
}

/// Contents of memory right after instantiation: every data segment copied
/// to its offset. Trailing zero pages are left out.
pub fn initial_image(module: &Module) -> Result<Vec<u8>> {
    if module.data.is_empty() {
        return Ok(Vec::new());
    }
    let pages = module
        .memory_limits()
        .ok_or_else(|| Error::runtime("data segments without a memory"))?
        .initial;
    let memory_size = pages as u64 * PAGE_SIZE as u64;

    let mut image = Vec::new();
    for segment in &module.data {
        let start = segment.offset as u64;
        let end = start + segment.bytes.len() as u64;
        if start >= memory_size || end > memory_size {
            return Err(Error::runtime("data segment outside of valid memory range"));
        }
        let (start, end) = (start as usize, end as usize);
        if image.len() < end {
            image.resize(end, 0);
        }
        image[start..end].copy_from_slice(&segment.bytes);
    }
    debug!(bytes = image.len(), segments = module.data.len(), "initial memory image");
    Ok(image)
}

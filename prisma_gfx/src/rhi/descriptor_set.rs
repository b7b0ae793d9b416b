/// DescriptorSet - validated resource-to-binding-slot associations
///
/// A descriptor set owns a fixed layout (binding index + resource kind per
/// slot) and, per slot, a back-reference to a buffer range. The references
/// are lookup-only: the frame driver owns the buffers and must keep them
/// alive for as long as the set is bound from (destruction order is enforced
/// by the owner, never by the set).

use std::rc::{Rc, Weak};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::gfx_error;
use crate::rhi::Buffer;

/// Kind of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Uniform buffer range
    UniformBuffer,
}

/// One binding slot of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    /// Binding index (unique within a layout)
    pub binding: u32,
    /// Resource kind expected at this slot
    pub kind: DescriptorKind,
}

/// Ordered sequence of binding slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutInfo {
    /// Binding slots; indices must be unique
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutInfo {
    /// Layout with a single uniform-buffer slot
    pub fn single_uniform_buffer(binding: u32) -> Self {
        Self {
            bindings: vec![DescriptorSetLayoutBinding {
                binding,
                kind: DescriptorKind::UniformBuffer,
            }],
        }
    }

    /// Whether two layouts declare the same binding indices and kinds
    ///
    /// Order-insensitive: a pipeline's expected layout is compatible with a
    /// set's layout exactly when the (index, kind) pairs match as sets.
    pub fn is_compatible_with(&self, other: &DescriptorSetLayoutInfo) -> bool {
        if self.bindings.len() != other.bindings.len() {
            return false;
        }
        let ours: FxHashMap<u32, DescriptorKind> = self
            .bindings
            .iter()
            .map(|b| (b.binding, b.kind))
            .collect();
        other
            .bindings
            .iter()
            .all(|b| ours.get(&b.binding) == Some(&b.kind))
    }
}

/// A bound buffer range (back-reference, not ownership)
#[derive(Debug, Clone)]
pub struct BufferBinding {
    /// The referenced buffer; dangling if the owner destroyed it
    pub buffer: Weak<Buffer>,
    /// Byte offset into the buffer
    pub offset: u64,
    /// Byte size of the bound range
    pub range: u64,
}

/// One write of an `update` batch
#[derive(Clone)]
pub struct DescriptorWrite {
    /// Binding index to replace; must exist in the layout
    pub dst_binding: u32,
    /// Buffer to reference
    pub buffer: Rc<Buffer>,
    /// Byte offset into the buffer
    pub offset: u64,
    /// Byte size of the range; `offset + range` must fit in the buffer
    pub range: u64,
}

/// Named collection of resource-to-binding-slot associations
pub struct DescriptorSet {
    layout: DescriptorSetLayoutInfo,
    bindings: FxHashMap<u32, BufferBinding>,
}

impl DescriptorSet {
    /// Create a descriptor set with a fixed layout
    ///
    /// Fails if the layout declares the same binding index twice.
    pub fn new(layout: DescriptorSetLayoutInfo) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for binding in &layout.bindings {
            if !seen.insert(binding.binding) {
                gfx_error!(
                    "prisma::descriptor_set",
                    "layout declares binding index {} more than once",
                    binding.binding
                );
                return Err(Error::InvalidResource(format!(
                    "duplicate binding index {} in descriptor set layout",
                    binding.binding
                )));
            }
        }
        Ok(Self {
            layout,
            bindings: FxHashMap::default(),
        })
    }

    /// Layout the set was created with
    pub fn layout(&self) -> &DescriptorSetLayoutInfo {
        &self.layout
    }

    /// Currently bound resource reference for a binding index, if any
    pub fn binding(&self, index: u32) -> Option<&BufferBinding> {
        self.bindings.get(&index)
    }

    /// Iterate over the slots that have a bound resource
    pub(crate) fn bound_bindings(&self) -> impl Iterator<Item = (u32, &BufferBinding)> {
        self.bindings.iter().map(|(index, binding)| (*index, binding))
    }

    /// Replace binding references with the given writes
    ///
    /// The whole batch is validated before anything is applied: every write
    /// must target a binding index declared in the layout, match its resource
    /// kind, and supply a byte range that fits within the referenced buffer.
    /// A single invalid write rejects the entire batch so the set never holds
    /// a partially applied state.
    pub fn update(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        for write in writes {
            let declared = self
                .layout
                .bindings
                .iter()
                .find(|b| b.binding == write.dst_binding);
            let Some(declared) = declared else {
                gfx_error!(
                    "prisma::descriptor_set",
                    "update targets binding {} which the layout does not declare",
                    write.dst_binding
                );
                return Err(Error::InvalidResource(format!(
                    "descriptor write targets undeclared binding index {}",
                    write.dst_binding
                )));
            };
            if declared.kind != DescriptorKind::UniformBuffer {
                return Err(Error::InvalidResource(format!(
                    "descriptor write kind mismatch at binding {}",
                    write.dst_binding
                )));
            }
            let fits = write
                .offset
                .checked_add(write.range)
                .is_some_and(|end| end <= write.buffer.size());
            if !fits {
                gfx_error!(
                    "prisma::descriptor_set",
                    "write range [{}, {}+{}) exceeds buffer size {} at binding {}",
                    write.offset,
                    write.offset,
                    write.range,
                    write.buffer.size(),
                    write.dst_binding
                );
                return Err(Error::InvalidResource(format!(
                    "descriptor write range does not fit buffer at binding {}",
                    write.dst_binding
                )));
            }
        }

        // Whole batch validated, apply it
        for write in writes {
            self.bindings.insert(
                write.dst_binding,
                BufferBinding {
                    buffer: Rc::downgrade(&write.buffer),
                    offset: write.offset,
                    range: write.range,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "descriptor_set_tests.rs"]
mod tests;

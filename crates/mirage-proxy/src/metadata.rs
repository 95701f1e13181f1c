//! Metadata mirror
//!
//! Copies the descriptive fields of the target's class onto the proxy type
//! so introspection answers the same. At [`MirrorLevel::Full`] the proxy
//! type also takes the target class's bases, so `__bases__` and subclass
//! checks agree. The target's own class-level data stays on the target's
//! class and is reached through delegation.

use mirage_object::{Class, ClassBuilder};

use crate::options::MirrorLevel;

/// Copy `source`'s descriptive metadata onto `builder`
pub fn mirror(source: &Class, builder: ClassBuilder, level: MirrorLevel) -> ClassBuilder {
    let mut builder = builder.name(source.name().clone());
    if let Some(doc) = source.doc() {
        builder = builder.doc(doc.clone());
    }
    if let Some(module) = source.module() {
        builder = builder.module(module.clone());
    }
    if level == MirrorLevel::Full {
        builder = builder.qualname(source.qualname().clone());
        for base in source.bases() {
            builder = builder.base(base);
        }
    }
    builder
}

/// Whether mirroring `source` at `level` gives the proxy type bases
pub fn mirrors_bases(source: &Class, level: MirrorLevel) -> bool {
    level == MirrorLevel::Full && !source.bases().is_empty()
}

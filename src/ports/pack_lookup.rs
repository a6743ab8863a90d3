// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pack lookup trait definition.

use crate::domain::{Pack, Result};

/// Resolves a pack reference given in either of its forms.
///
/// Implementations answer with the single pack whose ref or id equals
/// `ref_or_id`, or `None`. A lookup must never return different packs for the
/// two forms, which registries enforce when packs are added.
///
/// # Examples
///
/// ```rust
/// use packcfg::domain::{Pack, Result};
/// use packcfg::ports::PackLookup;
///
/// struct OnlyCore;
///
/// impl PackLookup for OnlyCore {
///     fn find_by_ref_or_id(&self, ref_or_id: &str) -> Result<Option<Pack>> {
///         let core = Pack::new("1", "core")?;
///         Ok(core.is_addressed_by(ref_or_id).then_some(core))
///     }
/// }
///
/// assert!(OnlyCore.find_by_ref_or_id("core").unwrap().is_some());
/// assert!(OnlyCore.find_by_ref_or_id("1").unwrap().is_some());
/// assert!(OnlyCore.find_by_ref_or_id("linux").unwrap().is_none());
/// ```
pub trait PackLookup: Send + Sync {
    /// Returns the pack addressed by `ref_or_id`, if any.
    fn find_by_ref_or_id(&self, ref_or_id: &str) -> Result<Option<Pack>>;
}

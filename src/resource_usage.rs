//! Translation unit memory usage.

use crate::native::Native;
use crate::status::ResourceUsageKind;
use clang_sys::CXTUResourceUsage;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Bytes used by a translation unit, per resource kind.
///
/// This is a snapshot copied out of libclang; it does not change after creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    amounts: BTreeMap<ResourceUsageKind, u64>,
    total_bytes: u64,
}

struct UsageGuard<'a> {
    native: &'a dyn Native,
    usage: CXTUResourceUsage,
}

impl Drop for UsageGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: the usage structure is owned by this guard.
        unsafe { self.native.dispose_resource_usage(self.usage) };
    }
}

impl ResourceUsage {
    /// Copy a native usage structure and dispose it.
    ///
    /// # Safety
    ///
    /// `usage` must come from `native` and must not be disposed elsewhere.
    pub(crate) unsafe fn from_native(native: &dyn Native, usage: CXTUResourceUsage) -> Self {
        let guard = UsageGuard { native, usage };
        let entries = if guard.usage.entries.is_null() {
            &[][..]
        } else {
            // SAFETY: libclang reports `numEntries` valid entries.
            unsafe {
                std::slice::from_raw_parts(guard.usage.entries, guard.usage.numEntries as usize)
            }
        };
        entries
            .iter()
            .map(|entry| (ResourceUsageKind::from_raw(entry.kind as i32), entry.amount as u64))
            .collect()
    }

    /// Bytes used for `kind`, if libclang reported it.
    pub fn get(&self, kind: ResourceUsageKind) -> Option<u64> {
        self.amounts.get(&kind).copied()
    }

    pub fn contains(&self, kind: ResourceUsageKind) -> bool {
        self.amounts.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ResourceUsageKind> + '_ {
        self.amounts.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.amounts.values().copied()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.amounts.iter(),
        }
    }

    /// Sum of every reported amount, saturating at `u64::MAX`.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl FromIterator<(ResourceUsageKind, u64)> for ResourceUsage {
    fn from_iter<I: IntoIterator<Item = (ResourceUsageKind, u64)>>(iter: I) -> Self {
        let mut usage = Self::default();
        for (kind, amount) in iter {
            let slot = usage.amounts.entry(kind).or_default();
            *slot = slot.saturating_add(amount);
            usage.total_bytes = usage.total_bytes.saturating_add(amount);
        }
        usage
    }
}

pub struct Iter<'a> {
    inner: btree_map::Iter<'a, ResourceUsageKind, u64>,
}

impl Iterator for Iter<'_> {
    type Item = (ResourceUsageKind, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(kind, amount)| (*kind, *amount))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a ResourceUsage {
    type Item = (ResourceUsageKind, u64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

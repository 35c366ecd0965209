use std::collections::BTreeMap;

use tracing::warn;

/// Environment-variable table consulted first by [`crate::EnvStore::resolve`]
/// and updated after successful assignments and erasures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvTable {
    kind: EnvTableKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvTableKind {
    /// Read and write the current process environment.
    ///
    /// Writes go through [`std::env::set_var`] and [`std::env::remove_var`],
    /// which mutate global process state and are not thread-safe.
    Process,
    /// Read and write an in-memory map.
    Memory(BTreeMap<String, String>),
}

impl Default for EnvTable {
    fn default() -> Self {
        Self::snapshot()
    }
}

impl EnvTable {
    /// Create a table backed by the live process environment.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// table.
    pub unsafe fn process() -> Self {
        Self {
            kind: EnvTableKind::Process,
        }
    }

    /// Create an empty in-memory table.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory table from an existing map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: EnvTableKind::Memory(map),
        }
    }

    /// Create an in-memory copy of the current process environment.
    ///
    /// Non-UTF-8 names and values are converted lossily.
    pub fn snapshot() -> Self {
        let map = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self::from_memory(map)
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, EnvTableKind::Process)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            EnvTableKind::Memory(map) => Some(map),
            EnvTableKind::Process => None,
        }
    }

    pub fn as_memory_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match &mut self.kind {
            EnvTableKind::Memory(map) => Some(map),
            EnvTableKind::Process => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.kind {
            EnvTableKind::Process => is_process_key(key) && std::env::var_os(key).is_some(),
            EnvTableKind::Memory(map) => map.contains_key(key),
        }
    }

    pub fn get_var(&self, key: &str) -> Option<String> {
        match &self.kind {
            EnvTableKind::Process => {
                if !is_process_key(key) {
                    return None;
                }
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            EnvTableKind::Memory(map) => map.get(key).cloned(),
        }
    }

    pub fn set_var(&mut self, key: &str, value: &str) {
        match &mut self.kind {
            EnvTableKind::Process => {
                if !is_process_key(key) || value.contains('\0') {
                    warn!(key, "not mirroring entry into process environment");
                    return;
                }
                // SAFETY: upheld by the caller of `EnvTable::process`.
                unsafe { std::env::set_var(key, value) }
            }
            EnvTableKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    pub fn remove_var(&mut self, key: &str) -> bool {
        match &mut self.kind {
            EnvTableKind::Process => {
                if !is_process_key(key) {
                    warn!(key, "not removing entry from process environment");
                    return false;
                }
                let present = std::env::var_os(key).is_some();
                // SAFETY: upheld by the caller of `EnvTable::process`.
                unsafe { std::env::remove_var(key) };
                present
            }
            EnvTableKind::Memory(map) => map.remove(key).is_some(),
        }
    }
}

/// `std::env::set_var` and `remove_var` panic on these names.
fn is_process_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::env::EnvTable;
use crate::error::Error;
use crate::model::EnvMap;
use crate::parser::{parse_bytes, unquote};
use crate::prompt::Prompt;
use crate::writer::{render, write_atomic};

const DEFAULT_FILE: &str = ".env";

/// Resolve `key` against `.env` in the current directory.
pub fn lookup(key: &str) -> Option<String> {
    EnvStore::new().get(key)
}

/// Resolve `key` against a specific `.env` file.
pub fn lookup_in(path: impl AsRef<Path>, key: &str) -> Option<String> {
    EnvStore::at(path).get(key)
}

/// File-backed key-value store over a `.env` file.
///
/// Nothing from the file is cached: every operation re-reads or rewrites the
/// whole file. Lookups check the environment table, then the file, then the
/// defaults given at construction.
#[derive(Debug, Clone)]
pub struct EnvStore {
    path: PathBuf,
    defaults: BTreeMap<String, String>,
    env: EnvTable,
}

impl Default for EnvStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE),
            defaults: BTreeMap::new(),
            env: EnvTable::snapshot(),
        }
    }
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self::new().path(path)
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults.extend(
            defaults
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn env_table(mut self, env: EnvTable) -> Self {
        self.env = env;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn defaults_map(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    pub fn env(&self) -> &EnvTable {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut EnvTable {
        &mut self.env
    }

    pub fn into_env(self) -> EnvTable {
        self.env
    }

    /// Read the backing file. A missing file is an empty mapping.
    pub fn try_parse(&self) -> Result<EnvMap, Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(EnvMap::new()),
            Err(err) => return Err(err.into()),
        };
        parse_bytes(&bytes)
    }

    /// Read the backing file, treating any read failure as an empty mapping.
    pub fn parse(&self) -> EnvMap {
        self.try_parse().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to read env file");
            EnvMap::new()
        })
    }

    /// Atomically replace the backing file with `map`.
    pub fn try_persist(&self, map: &EnvMap) -> Result<(), Error> {
        write_atomic(&self.path, &render(map))
    }

    /// Atomically replace the backing file with `map`, returning whether it
    /// was written. On failure the previous file is left as it was.
    pub fn persist(&self, map: &EnvMap) -> bool {
        match self.try_persist(map) {
            Ok(()) => true,
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "atomic write failed");
                false
            }
        }
    }

    /// Look up `key` in the environment table, the file, the defaults, and
    /// finally `fallback`, in that order.
    pub fn resolve(&self, key: &str, fallback: Option<&str>) -> Option<String> {
        if let Some(value) = self.env.get_var(key) {
            return Some(value);
        }

        if let Some(value) = self.parse().get(key) {
            return Some(value.to_owned());
        }

        if let Some(value) = self.defaults.get(key) {
            return Some(value.clone());
        }

        fallback.map(str::to_owned)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.resolve(key, None)
    }

    /// Store `value` under `key` unless a value already resolves and
    /// `overwrite` is false, in which case the existing value is returned.
    ///
    /// Returns `None` when `value` is `None`, when the key or value cannot be
    /// represented in the file, or when the file could not be written.
    pub fn assign(&mut self, key: &str, value: Option<&str>, overwrite: bool) -> Option<String> {
        let Some(value) = value else {
            debug!(key, "no value supplied, nothing to assign");
            return None;
        };

        if let Some(current) = self.get(key)
            && !overwrite
        {
            debug!(key, "keeping existing value");
            return Some(current);
        }

        if let Err(err) = validate_entry(key, value) {
            warn!(key, error = %err, "refusing to store entry");
            return None;
        }

        let mut map = self.parse();
        map.insert(key, value);
        if !self.persist(&map) {
            return None;
        }

        self.env.set_var(key, value);
        Some(value.to_owned())
    }

    /// Like [`EnvStore::assign`], but asks `prompt` for a value when none was
    /// supplied and the key is unset or `overwrite` is requested.
    pub fn assign_with<P: Prompt + ?Sized>(
        &mut self,
        key: &str,
        value: Option<&str>,
        prompt_message: Option<&str>,
        overwrite: bool,
        prompt: &mut P,
    ) -> Option<String> {
        if value.is_some() {
            return self.assign(key, value, overwrite);
        }

        let current = self.get(key);
        if current.is_some() && !overwrite {
            return current;
        }

        let message = match prompt_message {
            Some(message) => message.to_owned(),
            None => format!("Enter value for {key}"),
        };
        let answer = prompt.ask(&message, current.as_deref())?;
        self.assign(key, Some(&answer), overwrite)
    }

    /// Remove `key` from the file. Returns `false` if the key was not in the
    /// file or the file could not be rewritten.
    pub fn erase(&mut self, key: &str) -> bool {
        let mut map = self.parse();
        if map.remove(key).is_none() {
            debug!(key, path = %self.path.display(), "key not present in env file");
            return false;
        }

        if !self.persist(&map) {
            return false;
        }

        self.env.remove_var(key);
        true
    }

    /// Keys stored in the file, sorted. Environment-only keys and defaults
    /// are not included.
    pub fn enumerate(&self) -> Vec<String> {
        self.parse().sorted_keys()
    }
}

fn validate_entry(key: &str, value: &str) -> Result<(), Error> {
    let key_is_valid = !key.is_empty()
        && key.trim() == key
        && !key.starts_with('#')
        && !key.contains(['=', '\n', '\r', '\0']);
    if !key_is_valid {
        return Err(Error::InvalidKey(key.to_owned()));
    }

    if value.contains(['\n', '\r', '\0']) || unquote(value.trim()) != value {
        return Err(Error::InvalidValue {
            key: key.to_owned(),
        });
    }

    Ok(())
}

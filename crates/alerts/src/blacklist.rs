//! Persistent set of symbols that never produce alerts.
//!
//! Stored as a sorted JSON array of `BASE/USDT` strings. The file is
//! rewritten on every change; the in-memory set is authoritative if a write
//! fails.

use spread_core::Symbol;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BlacklistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed blacklist {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct BlacklistStore {
    path: PathBuf,
    symbols: BTreeSet<Symbol>,
}

impl BlacklistStore {
    /// Load the blacklist at `path`, starting empty if the file is missing
    /// or cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(store) => {
                info!(path = %path.display(), symbols = store.len(), "Blacklist loaded");
                store
            }
            Err(e) => {
                warn!("{}; starting with an empty blacklist", e);
                Self::empty(path)
            }
        }
    }

    /// Strict variant of [`load`](Self::load). A missing file is not an error.
    pub fn try_load(path: &Path) -> Result<Self, BlacklistError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(source) => {
                return Err(BlacklistError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let entries: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| BlacklistError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut symbols = BTreeSet::new();
        for entry in entries {
            match Symbol::parse(&entry) {
                Some(symbol) => {
                    symbols.insert(symbol);
                }
                None => warn!(entry = %entry, "Skipping invalid blacklist entry"),
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            symbols,
        })
    }

    fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbols: BTreeSet::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    /// Add `symbol`. Returns false if it was already present. The file is
    /// rewritten only when the set changed.
    pub fn add(&mut self, symbol: Symbol) -> bool {
        if !self.symbols.insert(symbol.clone()) {
            return false;
        }
        info!(symbol = %symbol, "Symbol blacklisted");
        self.persist();
        true
    }

    /// Add configured entries at startup. Returns how many were new.
    pub fn seed(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> usize {
        let added = symbols
            .into_iter()
            .filter(|s| self.symbols.insert(s.clone()))
            .count();
        if added > 0 {
            self.persist();
        }
        added
    }

    /// Blacklisted symbols in sorted order.
    pub fn list(&self) -> &BTreeSet<Symbol> {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Write the current set to disk.
    pub fn save(&self) -> Result<(), BlacklistError> {
        let io_err = |source| BlacklistError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(&self.symbols).map_err(|source| {
            BlacklistError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, json).map_err(io_err)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            error!("Failed to save blacklist: {}", e);
        }
    }
}

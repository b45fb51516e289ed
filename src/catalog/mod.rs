//! Types database: the shapes samples are validated against.
//!
//! The source is the collectd `types.db` format, one type per line:
//!
//! ```text
//! # comment
//! if_octets    rx:DERIVE:0:U, tx:DERIVE:0:U
//! load         shortterm:GAUGE:0:5000, midterm:GAUGE:0:5000, longterm:GAUGE:0:5000
//! ```
//!
//! Only the data source name and kind are kept; min and max are discarded.

use crate::core::{DataSource, FlushdError, Result, TypeDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Immutable catalog of type definitions keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDefinition>,
    source: Option<PathBuf>,
}

impl TypeCatalog {
    /// Load the catalog from a types database file.
    ///
    /// Failing to read the file is a configuration error. Malformed lines
    /// never are: bad data sources are skipped with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlushdError::config(format!("Failed to read types database {:?}: {}", path, e))
        })?;

        let mut catalog = Self::parse(&content);
        catalog.source = Some(path.to_path_buf());
        tracing::info!("Loaded {} types from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Parse a types database from text.
    pub fn parse(content: &str) -> Self {
        let mut types = HashMap::new();

        for line in content.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                continue;
            }

            let type_name = fields[0];
            if type_name.starts_with('#') {
                continue;
            }

            let mut data_sources = Vec::with_capacity(fields.len() - 1);
            for &token in &fields[1..] {
                let token = token.trim_end_matches(',');
                match parse_data_source(token) {
                    Some(ds) => data_sources.push(ds),
                    None => tracing::warn!(
                        "Cannot parse data source '{}' of type '{}'",
                        token,
                        type_name
                    ),
                }
            }

            types.insert(type_name.to_string(), TypeDefinition::new(type_name, data_sources));
        }

        TypeCatalog {
            types,
            source: None,
        }
    }

    /// Look up a type by name
    pub fn lookup(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.types.get(type_name)
    }

    /// File the catalog was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if no type is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// `name:kind:min:max`, exactly four fields.
fn parse_data_source(token: &str) -> Option<DataSource> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [name, kind, _min, _max] => Some(DataSource::new(*name, *kind)),
        _ => None,
    }
}

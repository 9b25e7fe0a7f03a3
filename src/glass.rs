//!
//! # Dispersion table
//!
//! Process-wide table of known materials. The raw model parameters are read
//! once, on first access, from the JSON store embedded in the crate, or from
//! the file named by the `LENS_STACK_GLASS_DATA` environment variable.
//! Entries are turned into [`Index`] evaluators on first lookup and kept in a
//! cache so that later lookups of the same name share one model.

use super::{Error, Index, Result, Sellmeier};
use log::{info, trace, warn};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{
    collections::HashMap,
    env, fs,
    sync::{Arc, RwLock},
};

/// Environment variable naming a JSON dispersion store to load instead of the embedded one
pub const GLASS_DATA_ENV: &str = "LENS_STACK_GLASS_DATA";

const EMBEDDED_GLASS_DATA: &str = include_str!("../data/glass.json");

static TABLE: Lazy<Result<GlassTable>> = Lazy::new(load);

fn unity() -> f64 {
    1f64
}

/// Model parameters of one table entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModelParameters {
    Sellmeier {
        #[serde(rename = "A", default = "unity")]
        a: f64,
        #[serde(rename = "B")]
        b: Vec<f64>,
        #[serde(rename = "C")]
        c: Vec<f64>,
    },
    Constant {
        n: f64,
    },
}
impl ModelParameters {
    fn resolve(&self) -> Result<Index> {
        match self {
            ModelParameters::Sellmeier { a, b, c } => {
                Ok(Sellmeier::new(b.clone(), c.clone())?.constant(*a).into())
            }
            ModelParameters::Constant { n } => crate::IndexSpec::Constant(*n).resolve(),
        }
    }
}

pub struct GlassTable {
    source: String,
    raw: HashMap<String, ModelParameters>,
    resolved: RwLock<HashMap<String, Index>>,
}
impl GlassTable {
    /// Parses a JSON store mapping material names to model parameters
    pub fn from_json(source: &str, json: &str) -> Result<Self> {
        let raw: HashMap<String, ModelParameters> = serde_json::from_str(json)
            .map_err(|e| Error::DataStore(format!("{}: {}", source, e)))?;
        info!("loaded {} materials from {} dispersion data", raw.len(), source);
        Ok(Self {
            source: source.to_string(),
            raw,
            resolved: RwLock::new(HashMap::new()),
        })
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.raw.keys().cloned().collect();
        names.sort();
        names
    }
    /// Resolves `name`, trying it verbatim first and upper-cased second
    pub fn lookup(&self, name: &str) -> Result<Index> {
        let (key, params) = match self.raw.get_key_value(name) {
            Some(entry) => entry,
            None => self
                .raw
                .get_key_value(&name.to_uppercase())
                .ok_or_else(|| Error::UnknownMaterial(name.to_string()))?,
        };
        {
            let cache = self.resolved.read().unwrap_or_else(|e| e.into_inner());
            if let Some(index) = cache.get(key) {
                trace!("dispersion model cache hit: {}", key);
                return Ok(index.clone());
            }
        }
        trace!("dispersion model cache miss: {}", key);
        let index = params.resolve()?;
        let mut cache = self.resolved.write().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(key.clone()).or_insert(index).clone())
    }
}

fn load() -> Result<GlassTable> {
    if let Ok(path) = env::var(GLASS_DATA_ENV) {
        match fs::read_to_string(&path)
            .map_err(|e| Error::DataStore(format!("{}: {}", path, e)))
            .and_then(|json| GlassTable::from_json(&path, &json))
        {
            Ok(table) => return Ok(table),
            Err(e) => warn!("{}; using embedded dispersion data", e),
        }
    }
    GlassTable::from_json("embedded", EMBEDDED_GLASS_DATA)
}

/// The process-wide dispersion table
pub fn table() -> Result<&'static GlassTable> {
    TABLE.as_ref().map_err(Clone::clone)
}

/// Resolves a material name against the process-wide table
pub fn lookup(name: &str) -> Result<Index> {
    table()?.lookup(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE: &str = r#"{
        "glass": {"B": [1.0], "C": [0.01]},
        "GEL": {"A": 1.2, "B": [0.5], "C": [0.02]},
        "oil": {"n": 1.515},
        "broken": {"B": [1.0, 2.0], "C": [0.01]}
    }"#;

    #[test]
    fn parses_model_parameters() {
        let table = GlassTable::from_json("test", STORE).unwrap();
        assert_eq!(table.names(), vec!["GEL", "broken", "glass", "oil"]);
        assert_eq!(table.lookup("oil").unwrap().eval(0.5), 1.515);
        let gel = table.lookup("gel").unwrap();
        let l2: f64 = 0.25;
        assert_eq!(gel.eval(0.5), (1.2 + 0.5 * l2 / (l2 - 0.02)).sqrt());
    }

    #[test]
    fn cache_shares_resolved_models() {
        let table = GlassTable::from_json("test", STORE).unwrap();
        match (table.lookup("glass").unwrap(), table.lookup("glass").unwrap()) {
            (Index::Sellmeier(a), Index::Sellmeier(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected Sellmeier models"),
        }
    }

    #[test]
    fn bad_entries_fail_only_their_lookup() {
        let table = GlassTable::from_json("test", STORE).unwrap();
        assert!(matches!(table.lookup("broken"), Err(Error::InvalidIndex(_))));
        assert!(matches!(
            table.lookup("missing"),
            Err(Error::UnknownMaterial(_))
        ));
        assert!(table.lookup("glass").is_ok());
    }

    #[test]
    fn exact_name_wins_over_upper_case() {
        let table = GlassTable::from_json(
            "test",
            r#"{"resin": {"n": 1.4}, "RESIN": {"n": 1.6}}"#,
        )
        .unwrap();
        assert_eq!(table.lookup("resin").unwrap().eval(0.5), 1.4);
        assert_eq!(table.lookup("Resin").unwrap().eval(0.5), 1.6);
        assert!(matches!(
            table.lookup("rosin"),
            Err(Error::UnknownMaterial(name)) if name == "rosin"
        ));
    }

    #[test]
    fn malformed_store() {
        assert!(matches!(
            GlassTable::from_json("test", "[1, 2"),
            Err(Error::DataStore(_))
        ));
    }

    #[test]
    fn concurrent_lookups_agree() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| lookup("BK7").map(|n| n.eval(0.5))))
            .collect();
        let n: Vec<f64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(n.windows(2).all(|w| w[0] == w[1]));
    }
}

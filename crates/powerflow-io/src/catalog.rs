//! The set of networks that can be requested by name.
//!
//! Builtin cases are compiled into the binary; additional MATPOWER files can be
//! picked up from a directory at startup. Names are matched exactly, so a request
//! can never address a file outside the catalog.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use powerflow_core::{Network, PowerflowError, PowerflowResult};
use tracing::{debug, warn};

use crate::importers::{build_network, load_matpower_network, parse_matpower_string};

const CASE9: &str = include_str!("../cases/case9.m");
const CASE14: &str = include_str!("../cases/case14.m");
const CASE30: &str = include_str!("../cases/case30.m");
const IEEE30: &str = include_str!("../cases/ieee30.m");

/// Networks compiled into the binary, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCase {
    /// 9-bus, 3-generator system
    Case9,
    /// IEEE 14-bus system
    Case14,
    /// 30-bus, 6-generator dispatch variant of the IEEE 30-bus system
    Case30,
    /// IEEE 30-bus system
    Ieee30,
}

impl BuiltinCase {
    pub const ALL: [BuiltinCase; 4] = [
        BuiltinCase::Case9,
        BuiltinCase::Case14,
        BuiltinCase::Case30,
        BuiltinCase::Ieee30,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinCase::Case9 => "case9",
            BuiltinCase::Case14 => "case14",
            BuiltinCase::Case30 => "case30",
            BuiltinCase::Ieee30 => "ieee30",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|case| case.name() == name)
    }

    /// MATPOWER source text
    pub fn source(self) -> &'static str {
        match self {
            BuiltinCase::Case9 => CASE9,
            BuiltinCase::Case14 => CASE14,
            BuiltinCase::Case30 => CASE30,
            BuiltinCase::Ieee30 => IEEE30,
        }
    }

    pub fn build(self) -> PowerflowResult<Network> {
        let case = parse_matpower_string(self.source())?;
        build_network(&case, self.name())
    }
}

/// A resolved catalog entry; `build` constructs a fresh, unsolved network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCase {
    Builtin(BuiltinCase),
    File { name: String, path: PathBuf },
}

impl NetworkCase {
    pub fn name(&self) -> &str {
        match self {
            NetworkCase::Builtin(case) => case.name(),
            NetworkCase::File { name, .. } => name,
        }
    }

    pub fn build(&self) -> PowerflowResult<Network> {
        match self {
            NetworkCase::Builtin(case) => case.build(),
            NetworkCase::File { name, path } => {
                let mut network = load_matpower_network(path)?;
                network.name = name.clone();
                Ok(network)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    files: BTreeMap<String, PathBuf>,
}

impl Catalog {
    /// Catalog holding only the builtin cases
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Builtin cases plus every `*.m` file in `dir`, named after the file stem.
    pub fn with_cases_dir(dir: &Path) -> PowerflowResult<Self> {
        let entries = fs::read_dir(dir).map_err(|err| {
            PowerflowError::Config(format!("cannot read cases directory {}: {err}", dir.display()))
        })?;

        let mut files = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "m") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if BuiltinCase::from_name(stem).is_some() {
                warn!(path = %path.display(), "case file shadows a builtin case; ignoring it");
                continue;
            }
            files.insert(stem.to_string(), path);
        }
        debug!(dir = %dir.display(), count = files.len(), "loaded case directory");

        Ok(Self { files })
    }

    /// All case names: builtin cases first, then file cases sorted by name.
    pub fn list_cases(&self) -> Vec<String> {
        BuiltinCase::ALL
            .iter()
            .map(|case| case.name().to_string())
            .chain(self.files.keys().cloned())
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Option<NetworkCase> {
        if let Some(case) = BuiltinCase::from_name(name) {
            return Some(NetworkCase::Builtin(case));
        }
        self.files.get(name).map(|path| NetworkCase::File {
            name: name.to_string(),
            path: path.clone(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        BuiltinCase::ALL.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerflow_core::BusId;

    #[test]
    fn builtin_cases_listed_in_order() {
        assert_eq!(Catalog::builtin().list_cases(), vec!["case9", "case14", "case30", "ieee30"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.list_cases(), catalog.list_cases());
    }

    #[test]
    fn unknown_name_is_none() {
        let catalog = Catalog::builtin();
        assert!(catalog.lookup("case_does_not_exist").is_none());
        assert!(catalog.lookup("../case9").is_none());
        assert!(catalog.lookup("CASE9").is_none());
    }

    #[test]
    fn builtin_cases_build() {
        let expected = [
            (BuiltinCase::Case9, 9, 9),
            (BuiltinCase::Case14, 14, 20),
            (BuiltinCase::Case30, 30, 41),
            (BuiltinCase::Ieee30, 30, 41),
        ];
        for (case, buses, branches) in expected {
            let network = case.build().unwrap();
            assert_eq!(network.name, case.name());
            assert_eq!(network.bus_count(), buses, "{}", case.name());
            assert_eq!(network.branches().len(), branches, "{}", case.name());
            assert_eq!(network.ext_grid_buses(), vec![BusId::new(1)], "{}", case.name());
        }
    }

    #[test]
    fn case9_elements() {
        let network = BuiltinCase::Case9.build().unwrap();
        assert_eq!(network.generators().len(), 2);
        assert_eq!(network.loads().len(), 3);
        assert!((network.total_load_mw() - 315.0).abs() < 1e-9);
        assert_eq!(network.ext_grids()[0].vm_pu.value(), 1.0);
    }

    #[test]
    fn case30_elements() {
        let network = BuiltinCase::Case30.build().unwrap();
        assert_eq!(network.generators().len(), 5);
        assert!((network.total_load_mw() - 189.2).abs() < 1e-9);
        assert!((network.total_generation_mw() - 165.67).abs() < 1e-9);
    }

    #[test]
    fn cases_dir_adds_sorted_file_cases() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zeta.m"), BuiltinCase::Case9.source()).unwrap();
        fs::write(dir.path().join("alpha.m"), BuiltinCase::Case14.source()).unwrap();
        fs::write(dir.path().join("case9.m"), "not matpower").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = Catalog::with_cases_dir(dir.path()).unwrap();
        assert_eq!(
            catalog.list_cases(),
            vec!["case9", "case14", "case30", "ieee30", "alpha", "zeta"]
        );
        assert_eq!(catalog.len(), 6);

        // shadowed file is ignored, the builtin wins
        assert_eq!(
            catalog.lookup("case9"),
            Some(NetworkCase::Builtin(BuiltinCase::Case9))
        );

        let alpha = catalog.lookup("alpha").unwrap();
        let network = alpha.build().unwrap();
        assert_eq!(network.name, "alpha");
        assert_eq!(network.bus_count(), 14);
    }

    #[test]
    fn missing_cases_dir_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::with_cases_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PowerflowError::Config(_)));
    }
}

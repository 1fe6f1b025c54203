//! JSON persistence of solved networks.
//!
//! Writes go to a temporary file in the destination directory which is then renamed
//! over the target, so readers only ever observe a complete previous or complete new
//! file.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use powerflow_core::{Network, PowerflowError, PowerflowResult};
use tempfile::NamedTempFile;
use tracing::debug;

/// Atomically replace `path` with the pretty-printed JSON form of `network`.
pub fn save_network(path: &Path, network: &Network) -> PowerflowResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, network)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| PowerflowError::Io(err.error))?;

    debug!(network = %network.name, path = %path.display(), "saved network");
    Ok(())
}

/// Read a network previously written by [`save_network`].
///
/// A missing file means the case was never solved and maps to
/// [`PowerflowError::NotSolved`].
pub fn load_network(path: &Path, name: &str) -> PowerflowResult<Network> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(PowerflowError::NotSolved {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(err.into()),
    };
    let network: Network = serde_json::from_reader(BufReader::new(file))?;
    Ok(network)
}

/// Like [`load_network`], but also requires converged power-flow results.
pub fn load_solved_network(path: &Path, name: &str) -> PowerflowResult<Network> {
    let network = load_network(path, name)?;
    if !network.is_solved() {
        return Err(PowerflowError::NotSolved {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuiltinCase;
    use powerflow_core::PowerFlowResults;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case14.json");
        let network = BuiltinCase::Case14.build().unwrap();

        save_network(&path, &network).unwrap();
        let back = load_network(&path, "case14").unwrap();

        assert_eq!(back.name, "case14");
        assert_eq!(back.bus_count(), 14);
        assert_eq!(back.branches().len(), 20);
        assert_eq!(back.shunts().len(), 1);
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case9.json");
        let mut network = BuiltinCase::Case9.build().unwrap();

        save_network(&path, &network).unwrap();
        network.results = Some(PowerFlowResults {
            converged: true,
            iterations: 4,
            ..PowerFlowResults::default()
        });
        save_network(&path, &network).unwrap();

        let back = load_network(&path, "case9").unwrap();
        assert_eq!(back.results.map(|r| r.iterations), Some(4));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_file_is_not_solved() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_network(&dir.path().join("case9.json"), "case9").unwrap_err();
        assert!(matches!(err, PowerflowError::NotSolved { ref name, .. } if name == "case9"));
    }

    #[test]
    fn unsolved_network_rejected_by_load_solved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case9.json");
        save_network(&path, &BuiltinCase::Case9.build().unwrap()).unwrap();

        assert!(load_network(&path, "case9").is_ok());
        let err = load_solved_network(&path, "case9").unwrap_err();
        assert!(matches!(err, PowerflowError::NotSolved { .. }));
    }

    #[test]
    fn corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case9.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_network(&path, "case9").unwrap_err();
        assert!(matches!(err, PowerflowError::Parse(_)));
    }
}

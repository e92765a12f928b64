//! Checkpoint save and load
//!
//! A checkpoint is the whole `Population` as pretty-printed JSON, RNG and
//! innovation state included, so a resumed run continues exactly where the
//! saved one stopped.

use std::path::Path;

use crate::population::Population;

/// Failures while reading or writing checkpoints
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write a population checkpoint, creating parent directories as needed
pub fn save_checkpoint(population: &Population, path: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(population)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a population checkpoint written by `save_checkpoint`
pub fn load_checkpoint(path: &Path) -> Result<Population, PersistError> {
    let json = std::fs::read_to_string(path)?;
    let population = serde_json::from_str(&json)?;
    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;

    #[test]
    fn test_checkpoint_round_trip() {
        let population = Population::new(NeatConfig::default().with_population_size(6), 11);
        let path = std::env::temp_dir().join(format!(
            "neatpong-checkpoint-test-{}.json",
            std::process::id()
        ));

        save_checkpoint(&population, &path).unwrap();
        let restored = load_checkpoint(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.generation(), population.generation());
        assert_eq!(restored.members(), population.members());
        assert_eq!(restored.species_count(), population.species_count());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("neatpong-checkpoint-missing.json");
        std::fs::remove_file(&path).ok();

        match load_checkpoint(&path) {
            Err(PersistError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}

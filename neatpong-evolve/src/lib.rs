//! NEAT neuroevolution for paddle agents
//!
//! This crate implements the genetic side of training:
//!
//! - Genomes of node and connection genes with innovation numbers
//! - Feed-forward network compilation and activation
//! - Structural and weight mutation, crossover, compatibility distance
//! - Speciation with fitness sharing, elitism, and stagnation culling
//! - JSON checkpoints of entire populations
//!
//! Fitness itself comes from outside: callers evaluate members however
//! they like and hand back a [`FitnessMap`] for [`Population::reproduce`].

pub mod config;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod persist;
pub mod population;
pub mod species;

pub use config::NeatConfig;
pub use genome::{
    ConnGene, Genome, GenomeId, NodeGene, NodeId, NodeKind, NUM_INPUTS, NUM_OUTPUTS,
};
pub use innovation::InnovationTracker;
pub use network::Network;
pub use persist::{load_checkpoint, save_checkpoint, PersistError};
pub use population::{FitnessMap, GenerationStats, Population};
pub use species::{Species, SpeciesSet};

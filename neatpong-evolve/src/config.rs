//! Evolution parameters
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};

/// Parameters controlling speciation, mutation, and reproduction.
///
/// Rates are probabilities in [0, 1]; structural rates apply once per genome
/// per generation, weight and bias rates apply per gene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Genomes per generation
    pub population_size: usize,
    /// Compatibility distance below which two genomes share a species
    pub compatibility_threshold: f64,
    /// Coefficient on excess genes in the distance measure
    pub excess_coef: f64,
    /// Coefficient on disjoint genes in the distance measure
    pub disjoint_coef: f64,
    /// Coefficient on mean matching-weight difference in the distance measure
    pub weight_coef: f64,
    /// Chance each connection weight is perturbed
    pub weight_mutate_rate: f64,
    /// Stddev of the Gaussian weight perturbation
    pub weight_perturb_stdev: f64,
    /// Chance a perturbed weight is replaced outright instead
    pub weight_replace_rate: f64,
    /// Chance each node bias is perturbed
    pub bias_mutate_rate: f64,
    /// Stddev of the Gaussian bias perturbation
    pub bias_perturb_stdev: f64,
    /// Chance a genome gains a new connection
    pub add_conn_rate: f64,
    /// Chance a genome splits a connection with a new node
    pub add_node_rate: f64,
    /// Chance a genome flips one connection's enabled flag
    pub toggle_rate: f64,
    /// Fraction of each species kept as the parent pool
    pub survival_threshold: f64,
    /// Top genomes of each species copied unchanged into the next generation
    pub elitism: usize,
    /// Offspring floor per surviving species
    pub min_species_size: usize,
    /// Candidates drawn per parent selection
    pub tournament_size: usize,
    /// Generations without improvement before a species is culled
    pub stagnation_generations: u32,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            compatibility_threshold: 3.0,
            excess_coef: 1.0,
            disjoint_coef: 1.0,
            weight_coef: 0.4,
            weight_mutate_rate: 0.8,
            weight_perturb_stdev: 0.5,
            weight_replace_rate: 0.1,
            bias_mutate_rate: 0.7,
            bias_perturb_stdev: 0.5,
            add_conn_rate: 0.1,
            add_node_rate: 0.03,
            toggle_rate: 0.01,
            survival_threshold: 0.2,
            elitism: 2,
            min_species_size: 2,
            tournament_size: 2,
            stagnation_generations: 15,
        }
    }
}

impl NeatConfig {
    /// Config with a custom population size
    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    /// Config with a custom compatibility threshold
    pub fn with_compatibility_threshold(mut self, threshold: f64) -> Self {
        self.compatibility_threshold = threshold;
        self
    }
}

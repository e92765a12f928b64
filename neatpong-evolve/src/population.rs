//! Population lifecycle: speciation, fitness sharing, and reproduction
//!
//! A `Population` owns the genomes of one evolutionary run together with
//! the innovation tracker and RNG state, so a serialized population is a
//! complete checkpoint. Driving a run is three calls per generation:
//!
//! 1. Evaluate every member externally and fill a `FitnessMap`
//! 2. `stats` / `champion` for reporting and model export
//! 3. `reproduce` to produce the next generation in place

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::genome::{Genome, GenomeId, NUM_INPUTS, NUM_OUTPUTS};
use crate::innovation::InnovationTracker;
use crate::species::SpeciesSet;

/// Fitness assigned to each member after evaluation
pub type FitnessMap = FxHashMap<GenomeId, f64>;

/// Per-generation summary for logging and history files
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation the stats describe
    pub generation: u32,
    /// Best member fitness
    pub best: f64,
    /// Mean member fitness
    pub mean: f64,
    /// Species count after speciation
    pub species: usize,
}

/// A complete NEAT population
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    config: NeatConfig,
    members: Vec<(GenomeId, Genome)>,
    species: SpeciesSet,
    tracker: InnovationTracker,
    generation: u32,
    next_genome_id: u64,
    rng: ChaCha8Rng,
}

impl Population {
    /// Seed a fresh population of minimal genomes and speciate it
    pub fn new(config: NeatConfig, seed: u64) -> Self {
        let mut tracker = InnovationTracker::new((NUM_INPUTS + NUM_OUTPUTS) as u32, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut next_genome_id = 0;
        let members =
            Self::minimal_members(&config, &mut tracker, &mut next_genome_id, &mut rng);

        let mut species = SpeciesSet::new();
        species.speciate(&members, &config);

        Self {
            config,
            members,
            species,
            tracker,
            generation: 0,
            next_genome_id,
            rng,
        }
    }

    /// Current generation number, starting at 0
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Current members in id order of creation
    pub fn members(&self) -> &[(GenomeId, Genome)] {
        &self.members
    }

    /// Member count
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Species count
    pub fn species_count(&self) -> usize {
        self.species.count()
    }

    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Fitness map covering every member, all zero. Evaluators start from
    /// this so members that never play still carry an entry.
    pub fn zeroed_fitness(&self) -> FitnessMap {
        self.members.iter().map(|(id, _)| (*id, 0.0)).collect()
    }

    /// Best member under the given fitness map
    pub fn champion<'a>(&'a self, fitness: &FitnessMap) -> Option<(GenomeId, &'a Genome)> {
        self.members
            .iter()
            .max_by(|(a, _), (b, _)| {
                let fa = fitness.get(a).copied().unwrap_or(0.0);
                let fb = fitness.get(b).copied().unwrap_or(0.0);
                fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, genome)| (*id, genome))
    }

    /// Summarize the generation under the given fitness map
    pub fn stats(&self, fitness: &FitnessMap) -> GenerationStats {
        let mut best = f64::MIN;
        let mut sum = 0.0;
        for (id, _) in &self.members {
            let f = fitness.get(id).copied().unwrap_or(0.0);
            best = best.max(f);
            sum += f;
        }
        let mean = if self.members.is_empty() {
            0.0
        } else {
            sum / self.members.len() as f64
        };
        GenerationStats {
            generation: self.generation,
            best: if best == f64::MIN { 0.0 } else { best },
            mean,
            species: self.species.count(),
        }
    }

    /// Replace the members with the next generation.
    ///
    /// Spawn counts come from fitness sharing: each species' mean fitness is
    /// normalized into `[0, 1]` across the population, and offspring are
    /// allotted in proportion. Elites carry over unchanged and keep their
    /// ids; everything else is crossover plus mutation under fresh ids.
    ///
    /// # Arguments
    ///
    /// * `fitness` - Fitness per member id, from the last evaluation
    pub fn reproduce(&mut self, fitness: &FitnessMap) {
        self.species
            .update_stagnation(fitness, self.generation, &self.config);

        if self.species.is_empty() {
            // Total extinction. Restart from minimal genomes rather than
            // carry on with an empty population.
            self.members = Self::minimal_members(
                &self.config,
                &mut self.tracker,
                &mut self.next_genome_id,
                &mut self.rng,
            );
            self.generation += 1;
            self.species.speciate(&self.members, &self.config);
            return;
        }

        let mut min_f = f64::MAX;
        let mut max_f = f64::MIN;
        for (id, _) in &self.members {
            let f = fitness.get(id).copied().unwrap_or(0.0);
            min_f = min_f.min(f);
            max_f = max_f.max(f);
        }
        let range = (max_f - min_f).max(1.0);

        let species_means: Vec<f64> = self
            .species
            .iter()
            .map(|species| {
                let sum: f64 = species
                    .members
                    .iter()
                    .map(|id| fitness.get(id).copied().unwrap_or(0.0))
                    .sum();
                let mean = sum / species.members.len().max(1) as f64;
                (mean - min_f) / range
            })
            .collect();

        let spawns = allocate_spawns(
            &species_means,
            self.config.population_size,
            self.config.min_species_size,
        );

        self.tracker.begin_generation();

        let by_id: FxHashMap<GenomeId, &Genome> = self
            .members
            .iter()
            .map(|(id, genome)| (*id, genome))
            .collect();

        let mut new_members: Vec<(GenomeId, Genome)> =
            Vec::with_capacity(self.config.population_size);

        for (species, spawn) in self.species.iter().zip(spawns) {
            let mut ranked: Vec<(GenomeId, f64)> = species
                .members
                .iter()
                .map(|id| (*id, fitness.get(id).copied().unwrap_or(0.0)))
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            let mut remaining = spawn;
            for (id, _) in ranked.iter().take(self.config.elitism.min(remaining)) {
                if let Some(genome) = by_id.get(id) {
                    new_members.push((*id, (*genome).clone()));
                    remaining -= 1;
                }
            }

            let pool_len = ((ranked.len() as f64 * self.config.survival_threshold).ceil()
                as usize)
                .clamp(1, ranked.len());
            let pool = &ranked[..pool_len];

            for _ in 0..remaining {
                let id = GenomeId(self.next_genome_id);
                self.next_genome_id += 1;

                let a = tournament_pick(pool, self.config.tournament_size, &mut self.rng);
                let b = tournament_pick(pool, self.config.tournament_size, &mut self.rng);
                let (fitter, other) = if b.1 > a.1 { (b, a) } else { (a, b) };

                let mut child = match (by_id.get(&fitter.0), by_id.get(&other.0)) {
                    (Some(fit), Some(oth)) => Genome::crossover(fit, oth, &mut self.rng),
                    _ => species.representative.clone(),
                };
                child.mutate(&self.config, &mut self.tracker, &mut self.rng);
                new_members.push((id, child));
            }
        }

        new_members.truncate(self.config.population_size);

        // Rounding in spawn allotment can leave the generation short; pad
        // with mutated copies of the current champion.
        if new_members.len() < self.config.population_size {
            let champion = self
                .members
                .iter()
                .max_by(|(a, _), (b, _)| {
                    let fa = fitness.get(a).copied().unwrap_or(0.0);
                    let fb = fitness.get(b).copied().unwrap_or(0.0);
                    fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(_, genome)| genome.clone());
            if let Some(champion) = champion {
                while new_members.len() < self.config.population_size {
                    let id = GenomeId(self.next_genome_id);
                    self.next_genome_id += 1;
                    let mut clone = champion.clone();
                    clone.mutate(&self.config, &mut self.tracker, &mut self.rng);
                    new_members.push((id, clone));
                }
            }
        }

        self.members = new_members;
        self.generation += 1;
        self.species.speciate(&self.members, &self.config);
    }

    fn minimal_members(
        config: &NeatConfig,
        tracker: &mut InnovationTracker,
        next_genome_id: &mut u64,
        rng: &mut ChaCha8Rng,
    ) -> Vec<(GenomeId, Genome)> {
        (0..config.population_size)
            .map(|_| {
                let id = GenomeId(*next_genome_id);
                *next_genome_id += 1;
                (id, Genome::minimal(tracker, rng))
            })
            .collect()
    }
}

/// Convert normalized species means into whole spawn counts summing to
/// `total`, with every species getting at least `min_size`.
fn allocate_spawns(means: &[f64], total: usize, min_size: usize) -> Vec<usize> {
    debug_assert!(!means.is_empty());

    let sum: f64 = means.iter().sum();
    let mut spawns: Vec<usize> = if sum <= f64::EPSILON {
        // No species stands out; split evenly
        means.iter().map(|_| total / means.len()).collect()
    } else {
        means
            .iter()
            .map(|m| ((m / sum) * total as f64).round() as usize)
            .collect()
    };

    for spawn in &mut spawns {
        *spawn = (*spawn).max(min_size);
    }

    // Rounding and the floor can overshoot or undershoot; trim the largest
    // allotments down (never below the floor) and grow the largest up until
    // the counts sum to the population size.
    loop {
        let allocated: usize = spawns.iter().sum();
        if allocated > total {
            let candidate = spawns
                .iter()
                .enumerate()
                .filter(|(_, &s)| s > min_size)
                .max_by_key(|(_, &s)| s)
                .map(|(i, _)| i);
            match candidate {
                Some(i) => spawns[i] -= 1,
                None => break,
            }
        } else if allocated < total {
            if let Some(i) = spawns
                .iter()
                .enumerate()
                .max_by_key(|(_, &s)| s)
                .map(|(i, _)| i)
            {
                spawns[i] += 1;
            } else {
                break;
            }
        } else {
            break;
        }
    }

    spawns
}

/// Pick a parent by tournament: draw `size` members uniformly from the
/// pool and keep the fittest draw.
///
/// # Arguments
///
/// * `pool` - Candidates as (id, fitness), must be non-empty
/// * `size` - Tournament size, clamped to the pool
///
/// # Panics
///
/// Panics if the pool is empty.
fn tournament_pick(
    pool: &[(GenomeId, f64)],
    size: usize,
    rng: &mut ChaCha8Rng,
) -> (GenomeId, f64) {
    assert!(!pool.is_empty(), "tournament pool must not be empty");

    let size = size.clamp(1, pool.len());
    let mut best = pool[rng.gen_range(0..pool.len())];
    for _ in 1..size {
        let challenger = pool[rng.gen_range(0..pool.len())];
        if challenger.1 > best.1 {
            best = challenger;
        }
    }
    best
}

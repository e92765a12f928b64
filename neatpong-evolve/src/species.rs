//! Species partitioning and stagnation tracking

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::genome::{Genome, GenomeId};

/// One species: the genomes within compatibility distance of its
/// representative
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    /// Species identity, stable across generations
    pub id: u64,
    /// Genome new candidates are measured against
    pub representative: Genome,
    /// Current members
    pub members: Vec<GenomeId>,
    /// Best fitness any member has ever reached
    pub best_fitness: f64,
    /// Generation of the last best-fitness improvement
    pub last_improved: u32,
}

/// All current species
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpeciesSet {
    species: Vec<Species>,
    next_id: u64,
}

impl SpeciesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign every genome to the first species whose representative lies
    /// within the compatibility threshold, founding new species as needed.
    /// Species left without members dissolve; survivors adopt their first
    /// member as the next representative.
    pub fn speciate(&mut self, members: &[(GenomeId, Genome)], config: &NeatConfig) {
        for species in &mut self.species {
            species.members.clear();
        }

        for (id, genome) in members {
            let found = self.species.iter_mut().find(|s| {
                genome.distance(&s.representative, config) < config.compatibility_threshold
            });
            match found {
                Some(species) => species.members.push(*id),
                None => {
                    let species_id = self.next_id;
                    self.next_id += 1;
                    self.species.push(Species {
                        id: species_id,
                        representative: genome.clone(),
                        members: vec![*id],
                        best_fitness: f64::MIN,
                        last_improved: 0,
                    });
                }
            }
        }

        self.species.retain(|s| !s.members.is_empty());

        let by_id: FxHashMap<GenomeId, &Genome> =
            members.iter().map(|(id, genome)| (*id, genome)).collect();
        for species in &mut self.species {
            if let Some(genome) = species.members.first().and_then(|id| by_id.get(id)) {
                species.representative = (*genome).clone();
            }
        }
    }

    /// Record each species' best fitness and cull those that have not
    /// improved within the stagnation window. The best species always
    /// survives, so the population cannot go extinct through stagnation
    /// alone.
    pub fn update_stagnation(
        &mut self,
        fitness: &FxHashMap<GenomeId, f64>,
        generation: u32,
        config: &NeatConfig,
    ) {
        for species in &mut self.species {
            let best = species
                .members
                .iter()
                .filter_map(|id| fitness.get(id))
                .fold(f64::MIN, |acc, &f| acc.max(f));
            if best > species.best_fitness {
                species.best_fitness = best;
                species.last_improved = generation;
            }
        }

        let best_id = self
            .species
            .iter()
            .max_by(|a, b| {
                a.best_fitness
                    .partial_cmp(&b.best_fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|s| s.id);

        self.species.retain(|s| {
            Some(s.id) == best_id
                || generation.saturating_sub(s.last_improved) < config.stagnation_generations
        });
    }

    /// Current species count
    pub fn count(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Iterate current species
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::NUM_INPUTS;
    use crate::genome::NUM_OUTPUTS;
    use crate::innovation::InnovationTracker;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn genomes(count: usize, seed: u64) -> Vec<(GenomeId, Genome)> {
        let mut tracker = InnovationTracker::new(
            (NUM_INPUTS + NUM_OUTPUTS) as u32,
            (NUM_INPUTS * NUM_OUTPUTS) as u64,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|i| (GenomeId(i as u64), Genome::minimal(&mut tracker, &mut rng)))
            .collect()
    }

    #[test]
    fn test_identical_genomes_share_a_species() {
        let template = genomes(1, 1).remove(0).1;
        let members: Vec<(GenomeId, Genome)> = (0..4)
            .map(|i| (GenomeId(i), template.clone()))
            .collect();

        let mut set = SpeciesSet::new();
        set.speciate(&members, &NeatConfig::default());

        assert_eq!(set.count(), 1);
        assert_eq!(set.iter().next().unwrap().members.len(), 4);
    }

    #[test]
    fn test_divergent_genome_founds_new_species() {
        let mut members = genomes(2, 2);
        for conn in &mut members[1].1.conns {
            conn.weight += 50.0;
        }

        let config = NeatConfig::default().with_compatibility_threshold(1.0);
        let mut set = SpeciesSet::new();
        set.speciate(&members, &config);

        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_representative_follows_membership() {
        let members = genomes(3, 3);
        let mut set = SpeciesSet::new();
        set.speciate(&members, &NeatConfig::default());

        let first_member = &members[set.iter().next().unwrap().members[0].0 as usize].1;
        assert_eq!(&set.iter().next().unwrap().representative, first_member);
    }

    #[test]
    fn test_stagnant_species_culled_best_spared() {
        let mut members = genomes(2, 4);
        for conn in &mut members[1].1.conns {
            conn.weight += 50.0;
        }
        let config = NeatConfig {
            compatibility_threshold: 1.0,
            stagnation_generations: 2,
            ..NeatConfig::default()
        };

        let mut set = SpeciesSet::new();
        set.speciate(&members, &config);
        assert_eq!(set.count(), 2);

        // Species holding genome 0 leads; the other never improves
        let mut fitness = FxHashMap::default();
        fitness.insert(GenomeId(0), 10.0);
        fitness.insert(GenomeId(1), 1.0);

        set.update_stagnation(&fitness, 0, &config);
        assert_eq!(set.count(), 2);

        // Re-speciate each round so membership persists, then age past the window
        set.speciate(&members, &config);
        set.update_stagnation(&fitness, 1, &config);
        set.speciate(&members, &config);
        set.update_stagnation(&fitness, 5, &config);

        assert_eq!(set.count(), 1);
        assert_eq!(set.iter().next().unwrap().members, vec![GenomeId(0)]);
    }
}

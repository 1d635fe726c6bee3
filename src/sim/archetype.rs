//! Ring archetypes
//!
//! An archetype is a ring template: a full circle cut into equal slices,
//! some of them hazards. The built-in catalog is grouped into sets of four,
//! ordered from easy to hard within each set; a level uses one set.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::contact::ContactKind;

/// One slice of an archetype, in degrees of the ring's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceSpec {
    pub start_deg: f32,
    pub end_deg: f32,
    pub kind: ContactKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleArchetype {
    pub name: String,
    pub pieces: Vec<PieceSpec>,
}

impl ObstacleArchetype {
    /// Ring of `slices` equal pieces; indices in `hazards` are hazards
    pub fn ring(name: &str, slices: u32, hazards: &[u32]) -> Self {
        let width = 360.0 / slices.max(1) as f32;
        let pieces = (0..slices.max(1))
            .map(|i| PieceSpec {
                start_deg: i as f32 * width,
                end_deg: (i + 1) as f32 * width,
                kind: if hazards.contains(&i) {
                    ContactKind::Hazard
                } else {
                    ContactKind::Passable
                },
            })
            .collect();
        Self {
            name: name.to_string(),
            pieces,
        }
    }

    /// Ring made of a single kind (used by tests and debug levels)
    pub fn uniform(name: &str, slices: u32, kind: ContactKind) -> Self {
        let mut archetype = Self::ring(name, slices, &[]);
        for piece in &mut archetype.pieces {
            piece.kind = kind;
        }
        archetype
    }

    pub fn hazard_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.kind == ContactKind::Hazard)
            .count()
    }

    /// Fraction of the circle covered by hazards
    pub fn hazard_coverage(&self) -> f32 {
        let covered: f32 = self
            .pieces
            .iter()
            .filter(|p| p.kind == ContactKind::Hazard)
            .map(|p| (p.end_deg - p.start_deg).to_radians())
            .sum();
        covered / TAU
    }
}

/// Built-in catalog: 5 sets × 4 difficulty steps
pub fn builtin_catalog() -> Vec<ObstacleArchetype> {
    vec![
        // Octagon set
        ObstacleArchetype::ring("octo-clear", 8, &[]),
        ObstacleArchetype::ring("octo-single", 8, &[0]),
        ObstacleArchetype::ring("octo-split", 8, &[0, 4]),
        ObstacleArchetype::ring("octo-triad", 8, &[0, 3, 5]),
        // Hexagon set
        ObstacleArchetype::ring("hex-clear", 6, &[]),
        ObstacleArchetype::ring("hex-single", 6, &[0]),
        ObstacleArchetype::ring("hex-split", 6, &[0, 3]),
        ObstacleArchetype::ring("hex-alternate", 6, &[0, 2, 4]),
        // Decagon set
        ObstacleArchetype::ring("deca-clear", 10, &[]),
        ObstacleArchetype::ring("deca-pair", 10, &[0, 1]),
        ObstacleArchetype::ring("deca-split", 10, &[0, 1, 5, 6]),
        ObstacleArchetype::ring("deca-wall", 10, &[0, 1, 2, 5, 6]),
        // Dodecagon set
        ObstacleArchetype::ring("dodeca-single", 12, &[0]),
        ObstacleArchetype::ring("dodeca-split", 12, &[0, 6]),
        ObstacleArchetype::ring("dodeca-triad", 12, &[0, 4, 8]),
        ObstacleArchetype::ring("dodeca-cross", 12, &[0, 3, 6, 9]),
        // Pentagon set
        ObstacleArchetype::ring("penta-clear", 5, &[]),
        ObstacleArchetype::ring("penta-single", 5, &[0]),
        ObstacleArchetype::ring("penta-split", 5, &[0, 2]),
        ObstacleArchetype::ring("penta-heavy", 5, &[0, 1, 3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sets_get_harder() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 20);
        for set in catalog.chunks(4) {
            for pair in set.windows(2) {
                assert!(
                    pair[0].hazard_coverage() <= pair[1].hazard_coverage(),
                    "{} should not be harder than {}",
                    pair[0].name,
                    pair[1].name
                );
            }
            // Every ring leaves a way through
            assert!(set.iter().all(|a| a.hazard_coverage() < 0.75));
        }
    }

    #[test]
    fn test_ring_covers_full_circle() {
        let ring = ObstacleArchetype::ring("t", 8, &[2]);
        assert_eq!(ring.pieces.len(), 8);
        assert_eq!(ring.pieces[0].start_deg, 0.0);
        assert_eq!(ring.pieces[7].end_deg, 360.0);
        assert_eq!(ring.hazard_count(), 1);
        assert_eq!(ring.pieces[2].kind, ContactKind::Hazard);
    }

    #[test]
    fn test_uniform() {
        let ring = ObstacleArchetype::uniform("all-hazard", 4, ContactKind::Hazard);
        assert_eq!(ring.hazard_count(), 4);
        assert!((ring.hazard_coverage() - 1.0).abs() < 1e-5);
    }
}

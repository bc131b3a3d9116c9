//! Geometry parser (spec §4.1): turns the graph's `Partwise`/
//! `Instantwise` structural edges into an ordered `(part, instant)`
//! matrix. Pure function of the immutable structural edges.

use std::collections::HashMap;

use log::warn;

use crate::error::EngraveError;
use crate::graph::{Graph, NodeIndex};

/// The `(part, instant) -> island or null` matrix plus the per-island
/// coordinates and per-part start islands spec §3.2 calls for.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// `matrix[instant][part]`.
    matrix: Vec<Vec<Option<NodeIndex>>>,
    coords: HashMap<NodeIndex, (usize, usize)>,
    part_starts: Vec<NodeIndex>,
}

impl Geometry {
    pub fn part_count(&self) -> usize {
        self.part_starts.len()
    }

    pub fn instant_count(&self) -> usize {
        self.matrix.len()
    }

    pub fn island_at(&self, instant: usize, part: usize) -> Option<NodeIndex> {
        self.matrix.get(instant).and_then(|row| row.get(part)).copied().flatten()
    }

    pub fn coords_of(&self, island: NodeIndex) -> Option<(usize, usize)> {
        self.coords.get(&island).copied()
    }

    pub fn part_start(&self, part: usize) -> NodeIndex {
        self.part_starts[part]
    }

    pub fn part_starts(&self) -> &[NodeIndex] {
        &self.part_starts
    }

    /// An instant is complete iff every known part has an island at
    /// that column (spec §3.2).
    pub fn is_complete(&self, instant: usize) -> bool {
        self.matrix[instant].iter().all(|cell| cell.is_some())
    }

    pub fn instants(&self) -> impl Iterator<Item = usize> {
        0..self.instant_count()
    }

    pub fn parts(&self) -> impl Iterator<Item = usize> {
        0..self.part_count()
    }
}

/// Parses `graph`'s geometry. Rows (parts) are identified positionally
/// by their encounter order while walking `Instantwise` edges
/// downward from each instant's top island; the parts axis extends
/// whenever an instant's instantwise walk is longer than any seen so
/// far. Instants are indexed in the order the top part's `Partwise`
/// chain encounters them.
pub fn parse(graph: &Graph) -> Result<Geometry, EngraveError> {
    let root = graph.root().ok_or_else(|| EngraveError::InvalidGraph("no root island".into()))?;

    let mut matrix: Vec<Vec<Option<NodeIndex>>> = Vec::new();
    let mut coords = HashMap::new();
    let mut part_starts: Vec<NodeIndex> = Vec::new();

    for (instant, top) in graph.partwise_from(root).enumerate() {
        let mut row: Vec<Option<NodeIndex>> = Vec::new();
        row.push(Some(top));
        for island in graph.instantwise_of(top) {
            row.push(Some(island));
        }

        // Extend the parts axis: any row beyond what's been seen is a
        // newly discovered part, starting here.
        while part_starts.len() < row.len() {
            part_starts.push(row[part_starts.len()]);
        }

        matrix.push(row);
    }

    let num_parts = part_starts.len();
    for row in matrix.iter_mut() {
        row.resize(num_parts, None);
    }

    for (instant, row) in matrix.iter().enumerate() {
        for (part, cell) in row.iter().enumerate() {
            match cell {
                Some(island) => {
                    coords.insert(*island, (part, instant));
                }
                None => warn!("geometry: part {part} has no island at instant {instant}, leaving gap"),
            }
        }
    }

    Ok(Geometry { matrix, coords, part_starts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{Clef, Letter, Accidental, Pitch};
    use num_rational::Rational32;

    fn quarter() -> Rational32 {
        Rational32::new(1, 4)
    }

    #[test]
    fn two_part_three_instant_geometry() {
        let mut g = Graph::new();
        let top: Vec<_> = (0..3).map(|_| g.add_island()).collect();
        let bottom: Vec<_> = (0..3).map(|_| g.add_island()).collect();
        for w in top.windows(2) {
            g.link_partwise(w[0], w[1]);
        }
        for w in bottom.windows(2) {
            g.link_partwise(w[0], w[1]);
        }
        for i in 0..3 {
            g.link_instantwise(top[i], bottom[i]);
            let chord = g.add_chord(quarter());
            g.add_note(chord, Pitch::new(Letter::C, Accidental::Natural, 4));
            g.place_token(top[i], chord);
        }
        g.set_root(top[0]);

        let geom = parse(&g).unwrap();
        assert_eq!(geom.instant_count(), 3);
        assert_eq!(geom.part_count(), 2);
        assert_eq!(geom.island_at(0, 0), Some(top[0]));
        assert_eq!(geom.island_at(0, 1), Some(bottom[0]));
        assert!(geom.is_complete(0));
        assert_eq!(geom.coords_of(bottom[2]), Some((1, 2)));
        let _ = Clef::Treble;
    }
}

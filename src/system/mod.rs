use std::collections::BTreeSet;

use crate::{Error, Vector3D};

mod cell;
pub use self::cell::UnitCell;

mod images;
pub use self::images::{CellShift, cell_shifts};

/// A selection of atoms by chemical species, used to restrict which atoms
/// participate in an analysis as reference or target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesSelection {
    /// Select every atom, whatever its species
    All,
    /// Select only atoms whose species is in the given set
    Only(BTreeSet<String>),
}

impl SpeciesSelection {
    /// Select only the given species symbols
    pub fn only<I, S>(symbols: I) -> SpeciesSelection
        where I: IntoIterator<Item=S>, S: Into<String>
    {
        SpeciesSelection::Only(symbols.into_iter().map(Into::into).collect())
    }

    /// Does this selection include atoms of the given `species`?
    pub fn matches(&self, species: &str) -> bool {
        match self {
            SpeciesSelection::All => true,
            SpeciesSelection::Only(symbols) => symbols.contains(species),
        }
    }
}

impl From<Option<BTreeSet<String>>> for SpeciesSelection {
    /// `None` selects all atoms, mirroring the serialized form of species
    /// options where a missing value means "all"
    fn from(symbols: Option<BTreeSet<String>>) -> SpeciesSelection {
        match symbols {
            None => SpeciesSelection::All,
            Some(symbols) => SpeciesSelection::Only(symbols),
        }
    }
}

/// A single snapshot of an atomic structure: a periodic cell together with
/// the species and cartesian position of every atom.
///
/// Frames are read-only inputs to all the analyses in this crate, they are
/// never mutated once handed over.
#[derive(Debug, Clone)]
pub struct Frame {
    cell: UnitCell,
    species: Vec<String>,
    positions: Vec<Vector3D>,
}

impl Frame {
    /// Create a new empty frame with the given unit cell
    pub fn new(cell: UnitCell) -> Frame {
        Frame {
            cell: cell,
            species: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Add an atom with the given species and cartesian position to this
    /// frame
    pub fn add_atom(&mut self, species: impl Into<String>, position: Vector3D) {
        self.species.push(species.into());
        self.positions.push(position);
    }

    /// Get the number of atoms in this frame
    pub fn size(&self) -> usize {
        self.species.len()
    }

    /// Get the unit cell of this frame
    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    /// Get the species of all atoms in this frame
    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Get the cartesian positions of all atoms in this frame
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the indices of all atoms matching the given species selection
    pub fn selected_indices(&self, selection: &SpeciesSelection) -> Vec<usize> {
        self.species.iter()
            .enumerate()
            .filter(|(_, species)| selection.matches(species))
            .map(|(index, _)| index)
            .collect()
    }
}

/// An ordered sequence of frames with uniform time spacing.
///
/// All frames must contain the same atoms in the same order, so that the
/// atom at a given index keeps its identity across frames. This is validated
/// on construction, and required by the displacement tracking in the Van
/// Hove self part.
#[derive(Debug, Clone)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    /// Create a trajectory from the given frames, validating that all frames
    /// agree on atom count and per-index species.
    pub fn new(frames: Vec<Frame>) -> Result<Trajectory, Error> {
        if let Some(first) = frames.first() {
            for (i, frame) in frames.iter().enumerate().skip(1) {
                if frame.size() != first.size() {
                    return Err(Error::InconsistentData(format!(
                        "frame {} contains {} atoms where frame 0 contains {}",
                        i, frame.size(), first.size()
                    )));
                }

                if frame.species() != first.species() {
                    return Err(Error::InconsistentData(format!(
                        "frame {} does not have the same species ordering as frame 0",
                        i
                    )));
                }
            }
        }

        return Ok(Trajectory { frames });
    }

    /// Get the number of frames in this trajectory
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if this trajectory contains no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get all the frames in this trajectory
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the frame at the given index
    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    /// Get the set of species present in this trajectory, in sorted order
    pub fn species_universe(&self) -> BTreeSet<String> {
        let mut universe = BTreeSet::new();
        if let Some(frame) = self.frames.first() {
            for species in frame.species() {
                universe.insert(species.clone());
            }
        }
        return universe;
    }
}

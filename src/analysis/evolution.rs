use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use log::debug;
use ndarray::{Array1, Array2};
use once_cell::sync::OnceCell;
use rayon::prelude::*;

use crate::{Error, Frame, SpeciesSelection, Trajectory};

use super::{Grid, GaussianSmearing};
use super::rdf::{RdfParameters, RadialDistributionFunction};

/// One of the three lattice directions of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LatticeDirection {
    A,
    B,
    C,
}

impl LatticeDirection {
    /// Index of this direction in fractional coordinates
    fn axis(self) -> usize {
        match self {
            LatticeDirection::A => 0,
            LatticeDirection::B => 1,
            LatticeDirection::C => 2,
        }
    }

    /// Length of the corresponding lattice vector
    fn length(self, frame: &Frame) -> f64 {
        match self {
            LatticeDirection::A => frame.cell().a(),
            LatticeDirection::B => frame.cell().b(),
            LatticeDirection::C => frame.cell().c(),
        }
    }
}

/// A per-window statistic tracked by the [`EvolutionAnalyzer`], also used as
/// the cache key for its results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Radial distribution function of a species pair
    Rdf {
        /// the species pair, in sorted order
        pair: (String, String),
    },
    /// Linear density of one species along a lattice direction
    AtomDensity {
        species: String,
        direction: LatticeDirection,
    },
}

impl Statistic {
    /// Radial distribution function of the given species pair. The pair is
    /// canonicalized to sorted order, `rdf("P", "Na")` and `rdf("Na", "P")`
    /// designate the same statistic.
    pub fn rdf(first: impl Into<String>, second: impl Into<String>) -> Statistic {
        let first = first.into();
        let second = second.into();
        let pair = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Statistic::Rdf { pair }
    }

    /// Linear density of `species` along the given lattice direction
    pub fn atom_density(species: impl Into<String>, direction: LatticeDirection) -> Statistic {
        Statistic::AtomDensity {
            species: species.into(),
            direction: direction,
        }
    }
}

/// Parameters for an [`EvolutionAnalyzer`]
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct EvolutionParameters {
    /// Number of grid points of every density row
    pub ngrid: usize,
    /// Largest distance entering radial distributions
    pub rmax: f64,
    /// Width of the Gaussian smearing kernel
    pub sigma: f64,
    /// Number of periodic repetitions of the cell to search in each lattice
    /// direction for radial distributions
    pub cell_range: usize,
    /// Number of frames per window
    pub step: usize,
    /// Physical duration of one frame, used only to label the time axis
    pub time_step: f64,
}

type CachedRows = Arc<OnceCell<Arc<Array2<f64>>>>;

/// Time evolution of per-window statistics over a trajectory.
///
/// The trajectory is split into non-overlapping windows of `step` frames,
/// and the requested statistic is recomputed for every window, giving one
/// density row per window. Results are cached per statistic: repeated
/// requests for the same statistic return the already computed rows, and
/// concurrent requests for the same statistic compute it exactly once.
pub struct EvolutionAnalyzer {
    trajectory: Trajectory,
    parameters: EvolutionParameters,
    species: Vec<String>,
    pairs: Vec<(String, String)>,
    cache: Mutex<IndexMap<Statistic, CachedRows>>,
    misses: AtomicUsize,
}

impl EvolutionAnalyzer {
    /// Create an analyzer over the given trajectory, validating all
    /// parameters up front.
    pub fn new(trajectory: Trajectory, parameters: EvolutionParameters) -> Result<EvolutionAnalyzer, Error> {
        // validate the shared grid and smearing width once
        let grid = Grid::new(parameters.ngrid, parameters.rmax)?;
        GaussianSmearing::new(grid, parameters.sigma)?;

        if parameters.step == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one frame per window, got step=0".into()
            ));
        }

        if !(parameters.time_step > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "expected a positive time step, got {}", parameters.time_step
            )));
        }

        if trajectory.len() < parameters.step {
            return Err(Error::InvalidParameter(format!(
                "can not split {} frames into windows of {} frames",
                trajectory.len(), parameters.step
            )));
        }

        let species: Vec<String> = trajectory.species_universe().into_iter().collect();
        let mut pairs = Vec::new();
        for (i, first) in species.iter().enumerate() {
            for second in &species[i..] {
                pairs.push((first.clone(), second.clone()));
            }
        }

        return Ok(EvolutionAnalyzer {
            trajectory: trajectory,
            parameters: parameters,
            species: species,
            pairs: pairs,
            cache: Mutex::new(IndexMap::new()),
            misses: AtomicUsize::new(0),
        });
    }

    /// Get the parameters used to create this analyzer as a JSON string
    pub fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }

    /// Get every species present in the trajectory, in sorted order
    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Get every unordered species pair present in the trajectory, in
    /// sorted order. These are the valid pairs for [`Statistic::Rdf`].
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Get the number of windows the trajectory splits into
    pub fn n_windows(&self) -> usize {
        self.trajectory.len() / self.parameters.step
    }

    /// Get the physical time label of every window
    pub fn time_axis(&self) -> Vec<f64> {
        let duration = self.parameters.step as f64 * self.parameters.time_step;
        (0..self.n_windows()).map(|w| w as f64 * duration).collect()
    }

    /// Get the number of statistics computed so far, i.e. the number of
    /// `get_df` calls that were not served from the cache
    pub fn cache_misses(&self) -> usize {
        self.misses.load(Ordering::SeqCst)
    }

    /// Check that the species named by a statistic exist in the trajectory
    fn validate(&self, statistic: &Statistic) -> Result<(), Error> {
        let check = |species: &String| -> Result<(), Error> {
            if self.species.binary_search(species).is_err() {
                return Err(Error::InvalidParameter(format!(
                    "species {} is not part of the trajectory", species
                )));
            }
            Ok(())
        };

        match statistic {
            Statistic::Rdf { pair } => {
                check(&pair.0)?;
                check(&pair.1)?;
            }
            Statistic::AtomDensity { species, .. } => {
                check(species)?;
            }
        }

        return Ok(());
    }

    /// Get the time evolution of the given statistic, as one density row
    /// per window.
    ///
    /// The first request for a statistic computes it; later requests return
    /// the cached rows, and concurrent requests for the same statistic wait
    /// for the single in-flight computation instead of repeating it.
    #[time_graph::instrument(name = "EvolutionAnalyzer::get_df")]
    pub fn get_df(&self, statistic: &Statistic) -> Result<Arc<Array2<f64>>, Error> {
        self.validate(statistic)?;

        let cell = {
            let mut cache = self.cache.lock().expect("poisoned cache lock");
            cache.entry(statistic.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let rows = cell.get_or_try_init(|| {
            self.misses.fetch_add(1, Ordering::SeqCst);
            debug!("computing {:?} over {} windows", statistic, self.n_windows());
            self.compute(statistic).map(Arc::new)
        })?;

        return Ok(Arc::clone(rows));
    }

    /// Compute the rows of a statistic, one window at a time
    fn compute(&self, statistic: &Statistic) -> Result<Array2<f64>, Error> {
        let windows: Vec<&[Frame]> = self.trajectory.frames()
            .chunks_exact(self.parameters.step)
            .collect();

        let rows: Vec<Array1<f64>> = match statistic {
            Statistic::Rdf { pair } => {
                let rdf = RadialDistributionFunction::new(RdfParameters {
                    ngrid: self.parameters.ngrid,
                    rmax: self.parameters.rmax,
                    sigma: self.parameters.sigma,
                    cell_range: self.parameters.cell_range,
                    species: Some([pair.1.clone()].into()),
                    reference_species: Some([pair.0.clone()].into()),
                })?;

                windows.par_iter()
                    .map(|window| rdf.compute(window))
                    .collect::<Result<_, Error>>()?
            }
            Statistic::AtomDensity { species, direction } => {
                let selection = SpeciesSelection::only([species.clone()]);
                windows.par_iter()
                    .map(|window| self.atom_density(window, &selection, *direction))
                    .collect::<Result<_, Error>>()?
            }
        };

        let mut output = Array2::zeros((rows.len(), self.parameters.ngrid));
        for (i, row) in rows.iter().enumerate() {
            output.row_mut(i).assign(row);
        }
        return Ok(output);
    }

    /// Linear density of a species along a lattice direction, averaged over
    /// the frames of one window.
    ///
    /// Atom positions are wrapped into the cell and projected on the chosen
    /// axis; the density is smeared on a grid spanning the full axis length
    /// and normalized by the atom count only, so it integrates to one. There
    /// is no shell volume term since this is a linear density.
    fn atom_density(
        &self,
        window: &[Frame],
        selection: &SpeciesSelection,
        direction: LatticeDirection,
    ) -> Result<Array1<f64>, Error> {
        let length = direction.length(&window[0]);
        let grid = Grid::new(self.parameters.ngrid, length)?;
        let smearing = GaussianSmearing::new(grid, self.parameters.sigma)?;
        let axis = direction.axis();

        let mut samples = Vec::new();
        for frame in window {
            let cell = frame.cell();
            for &atom in &frame.selected_indices(selection) {
                let mut fractional = cell.fractional(frame.positions()[atom])[axis];
                fractional -= f64::floor(fractional);
                samples.push(fractional * direction.length(frame));
            }
        }

        let weight = 1.0 / samples.len() as f64;
        return Ok(smearing.smooth(samples, weight));
    }
}

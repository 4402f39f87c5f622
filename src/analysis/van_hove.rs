use std::collections::BTreeSet;

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::{Error, SpeciesSelection, Trajectory};
use crate::system::cell_shifts;

use super::{Grid, GaussianSmearing, shell_surfaces};

/// Parameters for a Van Hove correlation function calculation
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct VanHoveParameters {
    /// Number of consecutive time origins used to average each time lag
    pub avg_nsteps: usize,
    /// Stride between successive time lags, in frames
    pub step_skip: usize,
    /// Number of grid points between 0 and `rmax`, including both endpoints
    pub ngrid: usize,
    /// Largest distance entering the correlation functions
    pub rmax: f64,
    /// Width of the Gaussian smearing kernel
    pub sigma: f64,
    /// Number of periodic repetitions of the cell to search in each lattice
    /// direction for the distinct part
    pub cell_range: usize,
    /// Species entering the correlation; a missing value selects every atom
    #[serde(default)]
    pub species: Option<BTreeSet<String>>,
    /// Reference species for the distinct part; a missing value reuses
    /// `species`
    #[serde(default)]
    pub reference_species: Option<BTreeSet<String>>,
}

/// The two parts of the Van Hove space-time correlation function, sampled
/// on a shared grid, one row per time lag in increasing lag order.
pub struct VanHoveFunctions {
    /// time lag of every row, in frames
    lags: Vec<usize>,
    /// self part: distribution of single-atom displacement magnitudes
    gsrt: Array2<f64>,
    /// distinct part: density correlation between different atoms
    gdrt: Array2<f64>,
}

impl VanHoveFunctions {
    /// Get the self part `G_s(r, t)`, indexed by `[lag, grid point]`
    pub fn gsrt(&self) -> &Array2<f64> {
        &self.gsrt
    }

    /// Get the distinct part `G_d(r, t)`, indexed by `[lag, grid point]`
    pub fn gdrt(&self) -> &Array2<f64> {
        &self.gdrt
    }

    /// Get the time lag of every row, in frames
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    /// Get the number of time lags in this correlation function
    pub fn n_lags(&self) -> usize {
        self.lags.len()
    }
}

/// Van Hove space-time correlation function of a trajectory.
///
/// The self part tracks the displacement of individual atoms between a time
/// origin and a later frame; the distinct part tracks the periodic distances
/// between different atoms across the same time lag. Both are averaged over
/// `avg_nsteps` consecutive time origins, with lags strided by `step_skip`
/// frames.
pub struct VanHoveAnalysis {
    parameters: VanHoveParameters,
    smearing: GaussianSmearing,
    species: SpeciesSelection,
    reference: SpeciesSelection,
}

impl VanHoveAnalysis {
    /// Validate the given parameters and create the corresponding analysis
    pub fn new(parameters: VanHoveParameters) -> Result<VanHoveAnalysis, Error> {
        if parameters.avg_nsteps == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one time origin, got avg_nsteps=0".into()
            ));
        }

        if parameters.step_skip == 0 {
            return Err(Error::InvalidParameter(
                "expected a positive lag stride, got step_skip=0".into()
            ));
        }

        let grid = Grid::new(parameters.ngrid, parameters.rmax)?;
        let smearing = GaussianSmearing::new(grid, parameters.sigma)?;

        let species = SpeciesSelection::from(parameters.species.clone());
        let reference = match &parameters.reference_species {
            Some(symbols) => SpeciesSelection::Only(symbols.clone()),
            None => species.clone(),
        };

        return Ok(VanHoveAnalysis {
            parameters: parameters,
            smearing: smearing,
            species: species,
            reference: reference,
        });
    }

    /// Get the parameters used to create this analysis as a JSON string
    pub fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }

    /// Get the grid the correlation functions are sampled on
    pub fn grid(&self) -> &Grid {
        self.smearing.grid()
    }

    /// Compute both parts of the Van Hove correlation function over the
    /// given trajectory.
    #[time_graph::instrument(name = "VanHoveAnalysis::compute")]
    pub fn compute(&self, trajectory: &Trajectory) -> Result<VanHoveFunctions, Error> {
        let avg_nsteps = self.parameters.avg_nsteps;
        let nsteps = trajectory.len();
        if nsteps <= avg_nsteps {
            return Err(Error::InvalidParameter(format!(
                "trajectory of {} frames is too short to average over {} time origins",
                nsteps, avg_nsteps
            )));
        }

        let indices = trajectory.frame(0).selected_indices(&self.species);
        let ref_indices = trajectory.frame(0).selected_indices(&self.reference);
        if indices.is_empty() || ref_indices.is_empty() {
            return Err(Error::InvalidParameter(
                "the species selection does not match any atom in the trajectory".into()
            ));
        }

        // largest usable lag, and number of lag rows with stride step_skip
        let max_lag = nsteps - avg_nsteps;
        let n_lags = max_lag / self.parameters.step_skip + 1;
        let lags: Vec<usize> = (0..n_lags)
            .map(|it| usize::min(it * self.parameters.step_skip, max_lag))
            .collect();

        let mean_volume = trajectory.frames().iter()
            .map(|frame| frame.cell().volume())
            .sum::<f64>() / nsteps as f64;
        let density = indices.len() as f64 / mean_volume;

        let grid = *self.smearing.grid();
        let ngrid = grid.ngrid();
        let shifts = cell_shifts(self.parameters.cell_range);
        let surfaces = shell_surfaces(&grid);
        let weight = 1.0 / (avg_nsteps * ref_indices.len()) as f64;
        let self_weight = 1.0 / (avg_nsteps * indices.len()) as f64;

        let mut gsrt = Array2::zeros((n_lags, ngrid));
        let mut gdrt = Array2::zeros((n_lags, ngrid));

        // each row owns a distinct time lag, rows are fully independent
        gsrt.axis_iter_mut(Axis(0)).into_par_iter()
            .zip(gdrt.axis_iter_mut(Axis(0)).into_par_iter())
            .enumerate()
            .for_each(|(it, (mut self_row, mut distinct_row))| {
                let lag = lags[it];

                // self part: single-atom displacement magnitudes
                let mut counts = vec![0.0; ngrid];
                for origin in 0..avg_nsteps {
                    let start = trajectory.frame(origin);
                    let end = trajectory.frame(origin + lag);
                    for &atom in &indices {
                        let displacement = start.cell().minimum_image(
                            end.positions()[atom] - start.positions()[atom]
                        );
                        if let Some(bin) = grid.bin(displacement.norm()) {
                            counts[bin] += 1.0;
                        }
                    }
                }
                for count in &mut counts {
                    *count *= self_weight;
                }
                self_row.assign(&self.smearing.convolve(&counts));

                // distinct part: cross-atom periodic distances at this lag
                let mut counts = vec![0.0; ngrid];
                for origin in 0..avg_nsteps {
                    let start = trajectory.frame(origin);
                    let end = trajectory.frame(origin + lag);
                    let cell = start.cell();
                    let matrix = cell.matrix();

                    let from: Vec<_> = ref_indices.iter()
                        .map(|&i| cell.wrap(start.positions()[i]))
                        .collect();
                    let to: Vec<_> = indices.iter()
                        .map(|&j| cell.wrap(end.positions()[j]))
                        .collect();

                    for (vi, &i) in ref_indices.iter().enumerate() {
                        for (vj, &j) in indices.iter().enumerate() {
                            for shift in &shifts {
                                if i == j && shift.is_zero() {
                                    continue;
                                }

                                let distance = (to[vj] - from[vi] + shift.cartesian(&matrix)).norm();
                                if let Some(bin) = grid.bin(distance) {
                                    counts[bin] += 1.0;
                                }
                            }
                        }
                    }
                }
                let weighted: Vec<f64> = counts.iter()
                    .zip(&surfaces)
                    .map(|(count, surface)| count * weight / (surface * density))
                    .collect();
                distinct_row.assign(&self.smearing.convolve(&weighted));
            });

        return Ok(VanHoveFunctions {
            lags: lags,
            gsrt: gsrt,
            gdrt: gdrt,
        });
    }
}

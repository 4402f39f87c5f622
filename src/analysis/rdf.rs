use std::collections::BTreeSet;

use log::warn;
use ndarray::Array1;
use rayon::prelude::*;

use crate::{Error, Frame, SpeciesSelection};
use crate::system::cell_shifts;

use super::{Grid, GaussianSmearing, shell_surfaces};

/// Parameters for a radial distribution function calculation
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct RdfParameters {
    /// Number of grid points between 0 and `rmax`, including both endpoints
    pub ngrid: usize,
    /// Largest interatomic distance entering the distribution
    pub rmax: f64,
    /// Width of the Gaussian smearing kernel
    pub sigma: f64,
    /// Number of periodic repetitions of the cell to search in each lattice
    /// direction, enumerating `(2 cell_range + 1)^3` translation vectors
    pub cell_range: usize,
    /// Target species entering the distribution; a missing value selects
    /// every atom
    #[serde(default)]
    pub species: Option<BTreeSet<String>>,
    /// Reference species the distribution is centered on; a missing value
    /// reuses `species`
    #[serde(default)]
    pub reference_species: Option<BTreeSet<String>>,
}

/// Average radial distribution function `g(r)` of a set of structures.
///
/// For every reference atom, the periodic distances to all target atoms
/// within `rmax` are accumulated over all requested frames and all periodic
/// images within `cell_range`, then smeared on the grid and normalized by
/// the spherical shell surface and the target number density so that
/// `g(r) -> 1` at large `r` for an uncorrelated homogeneous system.
pub struct RadialDistributionFunction {
    parameters: RdfParameters,
    smearing: GaussianSmearing,
    reference: SpeciesSelection,
    target: SpeciesSelection,
}

impl RadialDistributionFunction {
    /// Validate the given parameters and create the corresponding builder
    pub fn new(parameters: RdfParameters) -> Result<RadialDistributionFunction, Error> {
        let grid = Grid::new(parameters.ngrid, parameters.rmax)?;
        let smearing = GaussianSmearing::new(grid, parameters.sigma)?;

        let target = SpeciesSelection::from(parameters.species.clone());
        let reference = match &parameters.reference_species {
            Some(symbols) => SpeciesSelection::Only(symbols.clone()),
            None => target.clone(),
        };

        return Ok(RadialDistributionFunction {
            parameters: parameters,
            smearing: smearing,
            reference: reference,
            target: target,
        });
    }

    /// Get the parameters used to create this builder as a JSON string
    pub fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }

    /// Get the grid the distribution is sampled on
    pub fn grid(&self) -> &Grid {
        self.smearing.grid()
    }

    /// Collect the per-bin pair counts over all frames, together with the
    /// reference/target atom counts and the mean cell volume
    fn accumulate(&self, frames: &[Frame]) -> Result<(Vec<f64>, usize, usize, f64), Error> {
        if frames.is_empty() {
            return Err(Error::InvalidParameter(
                "can not compute a radial distribution function over zero frames".into()
            ));
        }

        let n_ref = frames[0].selected_indices(&self.reference).len();
        let n_target = frames[0].selected_indices(&self.target).len();
        if n_ref == 0 || n_target == 0 {
            return Err(Error::InvalidParameter(
                "the species selection does not match any atom in the frames".into()
            ));
        }

        let grid = *self.smearing.grid();
        let shifts = cell_shifts(self.parameters.cell_range);

        let counts = frames.par_iter()
            .map(|frame| -> Result<Vec<f64>, Error> {
                let ref_indices = frame.selected_indices(&self.reference);
                let target_indices = frame.selected_indices(&self.target);
                if ref_indices.len() != n_ref || target_indices.len() != n_target {
                    return Err(Error::InconsistentData(
                        "frames disagree on the number of selected atoms".into()
                    ));
                }

                let cell = frame.cell();
                let matrix = cell.matrix();
                let wrapped: Vec<_> = frame.positions().iter()
                    .map(|&p| cell.wrap(p))
                    .collect();

                let mut counts = vec![0.0; grid.ngrid()];
                for &u in &ref_indices {
                    for &v in &target_indices {
                        for shift in &shifts {
                            if u == v && shift.is_zero() {
                                continue;
                            }

                            let vector = wrapped[v] - wrapped[u] + shift.cartesian(&matrix);
                            let distance = vector.norm();
                            if u != v && shift.is_zero() && distance < 1e-3 {
                                warn!(
                                    "atoms {} and {} are very close to one another ({} A)",
                                    u, v, distance
                                );
                            }

                            if let Some(bin) = grid.bin(distance) {
                                counts[bin] += 1.0;
                            }
                        }
                    }
                }

                return Ok(counts);
            })
            .try_reduce(
                || vec![0.0; grid.ngrid()],
                |mut acc, counts| {
                    for (a, c) in acc.iter_mut().zip(&counts) {
                        *a += c;
                    }
                    Ok(acc)
                },
            )?;

        let mean_volume = frames.iter()
            .map(|frame| frame.cell().volume())
            .sum::<f64>() / frames.len() as f64;

        return Ok((counts, n_ref, n_target, mean_volume));
    }

    /// Compute the radial distribution function averaged over the given
    /// frames, as one value per grid point.
    #[time_graph::instrument(name = "RadialDistributionFunction::compute")]
    pub fn compute(&self, frames: &[Frame]) -> Result<Array1<f64>, Error> {
        let (counts, n_ref, n_target, mean_volume) = self.accumulate(frames)?;

        let density = n_target as f64 / mean_volume;
        let surfaces = shell_surfaces(self.smearing.grid());
        let base = 1.0 / (n_ref as f64 * frames.len() as f64 * density);

        let weighted: Vec<f64> = counts.iter()
            .zip(&surfaces)
            .map(|(count, surface)| count * base / surface)
            .collect();

        return Ok(self.smearing.convolve(&weighted));
    }

    /// Compute the running coordination number `n(r)`, i.e. the average
    /// number of target atoms within distance `r` of a reference atom, from
    /// the same pair counts as the distribution itself.
    pub fn coordination_number(&self, frames: &[Frame]) -> Result<Array1<f64>, Error> {
        let (counts, n_ref, _, _) = self.accumulate(frames)?;

        let weight = 1.0 / (n_ref as f64 * frames.len() as f64);
        let mut running = 0.0;
        let cumulative: Vec<f64> = counts.iter()
            .map(|count| {
                running += count * weight;
                running
            })
            .collect();

        return Ok(Array1::from_vec(cumulative));
    }
}

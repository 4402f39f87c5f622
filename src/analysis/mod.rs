mod smearing;
pub use self::smearing::{Grid, GaussianSmearing};

mod rdf;
pub use self::rdf::{RdfParameters, RadialDistributionFunction};

mod van_hove;
pub use self::van_hove::{VanHoveParameters, VanHoveAnalysis, VanHoveFunctions};

mod evolution;
pub use self::evolution::{EvolutionParameters, EvolutionAnalyzer, Statistic, LatticeDirection};

/// Surface of the spherical shell at every grid point, used to normalize
/// radial pair densities: `4 π r²` everywhere except at `r = 0`, where the
/// shell degenerates to a point.
///
/// The `r = 0` entry uses `π dr²` as a finite sentinel surface, so the first
/// grid point carries the (unphysical) zero-distance counts without blowing
/// up. This is a boundary convention, the value at the first grid point is
/// not meaningful and does not affect the large-r normalization.
pub(crate) fn shell_surfaces(grid: &Grid) -> Vec<f64> {
    let dr = grid.spacing();
    let mut surfaces: Vec<f64> = (0..grid.ngrid())
        .map(|k| {
            let r = grid.point(k);
            4.0 * std::f64::consts::PI * r * r
        })
        .collect();
    surfaces[0] = std::f64::consts::PI * dr * dr;
    return surfaces;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shells() {
        let grid = Grid::new(101, 10.0).unwrap();
        let surfaces = shell_surfaces(&grid);

        assert_eq!(surfaces.len(), 101);
        assert_relative_eq!(surfaces[0], std::f64::consts::PI * 0.01, epsilon = 1e-14);
        assert_relative_eq!(surfaces[50], 4.0 * std::f64::consts::PI * 25.0, epsilon = 1e-10);
        assert!(surfaces.iter().all(|&s| s > 0.0));
    }
}

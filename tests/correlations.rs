//! End-to-end scenarios on a synthetic rocksalt-like trajectory.

use std::sync::Arc;

use approx::assert_relative_eq;

use vanhove::{Frame, Trajectory, UnitCell, Vector3D};
use vanhove::{RdfParameters, RadialDistributionFunction};
use vanhove::{VanHoveParameters, VanHoveAnalysis};
use vanhove::{EvolutionParameters, EvolutionAnalyzer, Statistic, LatticeDirection};

/// splitmix64, for deterministic position jitter
struct Jitter {
    state: u64,
}

impl Jitter {
    fn new(seed: u64) -> Jitter {
        Jitter { state: seed }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z = z ^ (z >> 31);
        // uniform in [-0.05, 0.05]
        (z as f64 / u64::MAX as f64 - 0.5) * 0.1
    }
}

/// A 4x4x4 rocksalt arrangement of Na and Cl on a cubic 10 A cell, with a
/// small deterministic jitter on every position. The nearest Na-Cl distance
/// is ~2.5 A and the nearest Na-Na distance is ~3.54 A.
fn rocksalt_frame(jitter: &mut Jitter) -> Frame {
    let mut frame = Frame::new(UnitCell::cubic(10.0));
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                let species = if (i + j + k) % 2 == 0 { "Na" } else { "Cl" };
                let position = Vector3D::new(
                    2.5 * i as f64 + jitter.next(),
                    2.5 * j as f64 + jitter.next(),
                    2.5 * k as f64 + jitter.next(),
                );
                frame.add_atom(species, position);
            }
        }
    }
    return frame;
}

fn rocksalt_trajectory(n_frames: usize) -> Trajectory {
    let mut jitter = Jitter::new(0xDEADBEEF);
    let frames = (0..n_frames).map(|_| rocksalt_frame(&mut jitter)).collect();
    Trajectory::new(frames).unwrap()
}

fn argmax(values: ndarray::ArrayView1<'_, f64>) -> usize {
    values.iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(k, _)| k)
        .unwrap()
}

#[test]
fn rocksalt_rdf_peaks() {
    let trajectory = rocksalt_trajectory(5);

    let rdf = RadialDistributionFunction::new(RdfParameters {
        ngrid: 101,
        rmax: 5.0,
        sigma: 0.1,
        cell_range: 1,
        species: Some(["Cl".to_string()].into()),
        reference_species: Some(["Na".to_string()].into()),
    }).unwrap();
    let na_cl = rdf.compute(trajectory.frames()).unwrap();

    assert_eq!(na_cl.len(), 101);
    // first neighbor shell of the opposite species at ~2.5 A
    let peak = argmax(na_cl.view());
    assert!((48..=52).contains(&peak), "Na-Cl peak at grid index {}", peak);

    let rdf = RadialDistributionFunction::new(RdfParameters {
        ngrid: 101,
        rmax: 5.0,
        sigma: 0.1,
        cell_range: 1,
        species: Some(["Na".to_string()].into()),
        reference_species: Some(["Na".to_string()].into()),
    }).unwrap();
    let na_na = rdf.compute(trajectory.frames()).unwrap();

    // first same-species shell at ~2.5 * sqrt(2) = 3.54 A
    let peak = argmax(na_na.view());
    assert!((68..=73).contains(&peak), "Na-Na peak at grid index {}", peak);

    // no same-species neighbors below ~2.5 A
    let low: f64 = na_na.slice(ndarray::s![..50]).sum();
    assert!(low < 1e-3, "unexpected low-r Na-Na density: {}", low);
}

#[test]
fn rocksalt_van_hove() {
    let trajectory = rocksalt_trajectory(8);

    let analysis = VanHoveAnalysis::new(VanHoveParameters {
        avg_nsteps: 2,
        step_skip: 2,
        ngrid: 101,
        rmax: 5.0,
        sigma: 0.1,
        cell_range: 1,
        species: Some(["Na".to_string()].into()),
        reference_species: None,
    }).unwrap();
    let functions = analysis.compute(&trajectory).unwrap();

    // 8 frames and 2 origins leave lags 0..=6, strided by 2
    assert_eq!(functions.n_lags(), 4);
    assert_eq!(functions.lags(), [0, 2, 4, 6]);
    assert_eq!(functions.gsrt().shape(), [4, 101]);
    assert_eq!(functions.gdrt().shape(), [4, 101]);

    // at zero lag every atom sits on top of itself, whatever the jitter
    assert_relative_eq!(
        functions.gsrt()[[0, 0]], 3.9894228040143274,
        epsilon = 1e-10
    );

    // the jitter is bounded, so all later-lag displacements stay well
    // below 1.5 A
    let tail: f64 = functions.gsrt().row(1).iter().skip(30).sum();
    assert!(tail < 1e-8);

    // the distinct part has its first peak around the Na-Na shell at 3.54 A
    let peak = argmax(functions.gdrt().row(0));
    assert!((68..=73).contains(&peak), "distinct peak at grid index {}", peak);
}

#[test]
fn rocksalt_evolution() {
    let trajectory = rocksalt_trajectory(6);

    let analyzer = EvolutionAnalyzer::new(trajectory, EvolutionParameters {
        ngrid: 101,
        rmax: 5.0,
        sigma: 0.1,
        cell_range: 1,
        step: 2,
        time_step: 2.0,
    }).unwrap();

    assert_eq!(analyzer.species(), ["Cl", "Na"]);
    assert_eq!(analyzer.pairs()[0], ("Cl".to_string(), "Cl".to_string()));
    assert_eq!(analyzer.pairs().len(), 3);

    let rdf = analyzer.get_df(&Statistic::rdf("Na", "Cl")).unwrap();
    assert_eq!(rdf.shape(), [3, 101]);
    // every window sees the same first neighbor shell
    for row in 0..3 {
        let peak = argmax(rdf.row(row));
        assert!((48..=52).contains(&peak), "window {} peak at {}", row, peak);
    }

    let density = analyzer.get_df(
        &Statistic::atom_density("Na", LatticeDirection::C)
    ).unwrap();
    assert_eq!(density.shape(), [3, 101]);
    // the linear density along c integrates to one, up to the kernel mass
    // truncated at the cell edges for the atoms of the z = 0 plane
    let spacing = 10.0 / 100.0;
    let integral: f64 = density.row(0).sum() * spacing;
    assert!(integral > 0.85 && integral < 1.01, "integral was {}", integral);

    // cached results are returned as-is
    let again: Arc<_> = analyzer.get_df(&Statistic::rdf("Cl", "Na")).unwrap();
    assert!(Arc::ptr_eq(&rdf, &again));
    assert_eq!(analyzer.cache_misses(), 2);

    assert_eq!(analyzer.time_axis(), [0.0, 4.0, 8.0]);
}

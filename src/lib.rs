#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::missing_errors_doc, clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! Structural and dynamical correlation functions for molecular dynamics
//! trajectories under periodic boundary conditions: radial distribution
//! functions, Van Hove space-time correlation functions, and their time
//! evolution over a sliding trajectory window.

pub mod types;
pub use types::{Vector3D, Matrix3};

mod errors;
pub use self::errors::Error;

pub mod system;
pub use system::{UnitCell, Frame, Trajectory, SpeciesSelection};

pub mod analysis;
pub use analysis::{Grid, GaussianSmearing};
pub use analysis::{RdfParameters, RadialDistributionFunction};
pub use analysis::{VanHoveParameters, VanHoveAnalysis, VanHoveFunctions};
pub use analysis::{EvolutionParameters, EvolutionAnalyzer, Statistic, LatticeDirection};

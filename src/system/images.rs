use crate::{Matrix3, Vector3D};

/// A cell shift represents the displacement along cell axes between the
/// actual position of an atom and one of its periodic images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellShift(pub [i32; 3]);

impl CellShift {
    /// Is this the zero shift, i.e. the atom itself rather than an image?
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0]
    }

    /// Compute the shift vector in cartesian coordinates, using the given
    /// cell matrix (stored in row major order).
    pub fn cartesian(&self, cell: &Matrix3) -> Vector3D {
        let [na, nb, nc] = self.0;
        let x = cell[0][0] * na as f64 + cell[1][0] * nb as f64 + cell[2][0] * nc as f64;
        let y = cell[0][1] * na as f64 + cell[1][1] * nb as f64 + cell[2][1] * nc as f64;
        let z = cell[0][2] * na as f64 + cell[1][2] * nb as f64 + cell[2][2] * nc as f64;
        Vector3D::new(x, y, z)
    }
}

/// Enumerate all cell shifts with components in `[-cell_range, cell_range]`,
/// i.e. `(2 * cell_range + 1)^3` translation vectors including the zero
/// shift.
///
/// The enumeration only depends on `cell_range`, the corresponding cartesian
/// translations are obtained with [`CellShift::cartesian`] for a given
/// lattice.
pub fn cell_shifts(cell_range: usize) -> Vec<CellShift> {
    let range = cell_range as i32;
    let mut shifts = Vec::with_capacity((2 * cell_range + 1).pow(3));
    for na in -range..=range {
        for nb in -range..=range {
            for nc in -range..=range {
                shifts.push(CellShift([na, nb, nc]));
            }
        }
    }
    return shifts;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn enumeration() {
        assert_eq!(cell_shifts(0), [CellShift([0, 0, 0])]);

        let shifts = cell_shifts(1);
        assert_eq!(shifts.len(), 27);
        assert!(shifts.contains(&CellShift([0, 0, 0])));
        assert!(shifts.contains(&CellShift([-1, 1, -1])));

        let shifts = cell_shifts(2);
        assert_eq!(shifts.len(), 125);
    }

    #[test]
    fn cartesian_shift() {
        let cell = Matrix3::new([
            [0.0, 1.5, 1.5],
            [1.5, 0.0, 1.5],
            [1.5, 1.5, 0.0],
        ]);

        let shift = CellShift([1, 0, 0]);
        let cartesian = shift.cartesian(&cell);
        assert_ulps_eq!(cartesian.x, 0.0);
        assert_ulps_eq!(cartesian.y, 1.5);
        assert_ulps_eq!(cartesian.z, 1.5);

        let shift = CellShift([1, -1, 2]);
        let cartesian = shift.cartesian(&cell);
        assert_ulps_eq!(cartesian.x, 1.5);
        assert_ulps_eq!(cartesian.y, 4.5);
        assert_ulps_eq!(cartesian.z, 0.0);
    }

    #[test]
    fn zero_shift() {
        assert!(CellShift([0, 0, 0]).is_zero());
        assert!(!CellShift([0, 1, 0]).is_zero());
    }
}

//! The `UnitCell` type represents the periodic lattice of a simulated
//! structure, and implements the geometric operations needed under periodic
//! boundary conditions.

use crate::{Error, Matrix3, Vector3D};

/// An `UnitCell` defines the periodic boundaries of a structure.
///
/// The cell is stored as a row-major matrix of the three lattice vectors,
/// together with cached transformations between cartesian and fractional
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// Unit cell matrix, one lattice vector per row
    matrix: Matrix3,
    /// Transpose of the unit cell matrix, cached from matrix
    transpose: Matrix3,
    /// Inverse of the transpose of the unit cell matrix, cached from matrix
    inverse: Matrix3,
}

impl UnitCell {
    /// Create an unit cell from the given lattice matrix, with one lattice
    /// vector per row.
    pub fn from_matrix(matrix: Matrix3) -> Result<UnitCell, Error> {
        if f64::abs(matrix.determinant()) < 1e-9 {
            return Err(Error::InvalidParameter(
                "unit cell matrix is not invertible".into()
            ));
        }

        let transpose = matrix.transposed();
        return Ok(UnitCell {
            matrix: matrix,
            transpose: transpose,
            inverse: transpose.inverse(),
        });
    }

    /// Create an orthorhombic unit cell, with side lengths `a, b, c`.
    ///
    /// # Panics
    ///
    /// If any of the lengths is not positive.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> UnitCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "cell lengths must be positive");
        let matrix = Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c],
        ]);
        UnitCell::from_matrix(matrix).expect("orthorhombic cell is always invertible")
    }

    /// Create a cubic unit cell, with side lengths `length, length, length`.
    pub fn cubic(length: f64) -> UnitCell {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Get the matricial representation of the unit cell
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the norm of the first lattice vector
    pub fn a(&self) -> f64 {
        Vector3D::from(self.matrix[0]).norm()
    }

    /// Get the norm of the second lattice vector
    pub fn b(&self) -> f64 {
        Vector3D::from(self.matrix[1]).norm()
    }

    /// Get the norm of the third lattice vector
    pub fn c(&self) -> f64 {
        Vector3D::from(self.matrix[2]).norm()
    }

    /// Get the volume of the cell
    pub fn volume(&self) -> f64 {
        f64::abs(self.matrix.determinant())
    }

    /// Get the fractional representation of the `vector` in this cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        // this needs to use the inverse of the transpose of the matrix, since
        // we only have code to multiply a vector by a matrix on the left
        return self.inverse * vector;
    }

    /// Get the cartesian representation of the `fractional` vector in this
    /// cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional;
    }

    /// Wrap a position inside the unit cell, obeying the periodic boundary
    /// conditions. For a cubic cell of side length `L`, this produces a
    /// vector with all components in `[0, L)`.
    pub fn wrap(&self, vector: Vector3D) -> Vector3D {
        let mut fractional = self.fractional(vector);
        fractional.x -= f64::floor(fractional.x);
        fractional.y -= f64::floor(fractional.y);
        fractional.z -= f64::floor(fractional.z);
        return self.cartesian(fractional);
    }

    /// Find the periodic image of a vector closest to the origin. For a cubic
    /// cell of side length `L`, this produces a vector with all components in
    /// `[-L/2, L/2)`.
    pub fn minimum_image(&self, vector: Vector3D) -> Vector3D {
        let mut fractional = self.fractional(vector);
        fractional.x -= f64::round(fractional.x);
        fractional.y -= f64::round(fractional.y);
        fractional.z -= f64::round(fractional.z);
        return self.cartesian(fractional);
    }

    /// Minimum image distance between the point `u` and the point `v` under
    /// periodic boundary conditions
    pub fn distance(&self, u: Vector3D, v: Vector3D) -> f64 {
        self.minimum_image(v - u).norm()
    }
}

// crates/nova_physics/src/reconstruction/poly.rs

//! 重构多项式
//!
//! 以单元形心为基点、特征长度归一化的矩修正单项式展开：
//!
//! ```text
//! p(x) = c₀ + Σ_{k≥1} c_k · ( ξ^a η^b - m_{ab} ),   ξ = (x-x_c)/l
//! ```
//!
//! 减去归一化矩 `m_{ab}` 后，每个高次基函数在本单元上的平均值为零，
//! 因此 `c₀` 严格等于多项式的单元平均。这是守恒性的关键不变量。
//!
//! 多项式携带 `N_VARS` 个变量的系数，系数布局与
//! [`nova_mesh::moments`] 的索引映射一致。

use std::ops::{Add, AddAssign, Div, Mul, Sub};

use glam::DVec2;

use nova_mesh::moments::{poly_dof, MOMENT_EXPONENTS, N_MOMENTS};
use nova_mesh::TriMesh;

/// 编译期支持的最高多项式次数
pub const MAX_DEGREE: usize = 4;

/// 系数槽位数 = poly_dof(MAX_DEGREE)
pub const N_COEFFS: usize = 15;

/// 多项式的参考系：基点、长度与归一化矩
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyFrame {
    /// 基点（单元形心）
    pub x_center: DVec2,
    /// 归一化长度（单元特征长度）
    pub length: f64,
    /// 单元的归一化矩
    pub moments: [f64; N_MOMENTS],
}

impl PolyFrame {
    /// 取某单元的参考系
    pub fn of_cell(mesh: &TriMesh, cell: usize) -> Self {
        Self {
            x_center: mesh.cell_centers[cell],
            length: mesh.char_length[cell],
            moments: mesh.normalized_moments[cell],
        }
    }
}

/// `N_VARS` 个变量共用模板的重构多项式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poly2d<const N_VARS: usize> {
    /// 多项式次数（有效系数为 `poly_dof(degree)` 个）
    pub degree: usize,
    /// 系数，`coeffs[k][v]` 是第 v 个变量的第 k 个系数
    pub coeffs: [[f64; N_VARS]; N_COEFFS],
    /// 参考系
    pub frame: PolyFrame,
}

impl<const N_VARS: usize> Poly2d<N_VARS> {
    /// 常数多项式（0 次），值即单元平均
    pub fn constant(avg: [f64; N_VARS], frame: PolyFrame) -> Self {
        let mut coeffs = [[0.0; N_VARS]; N_COEFFS];
        coeffs[0] = avg;
        Self {
            degree: 0,
            coeffs,
            frame,
        }
    }

    /// 从系数构造
    pub fn from_coeffs(degree: usize, coeffs: [[f64; N_VARS]; N_COEFFS], frame: PolyFrame) -> Self {
        debug_assert!(degree <= MAX_DEGREE);
        Self {
            degree,
            coeffs,
            frame,
        }
    }

    /// 单元平均（恒等于常数系数）
    #[inline]
    pub fn cell_average(&self) -> [f64; N_VARS] {
        self.coeffs[0]
    }

    /// 点值
    pub fn eval(&self, x: DVec2) -> [f64; N_VARS] {
        let xi = (x - self.frame.x_center) / self.frame.length;
        let mut out = self.coeffs[0];
        for k in 1..poly_dof(self.degree) {
            let (a, b) = MOMENT_EXPONENTS[k];
            let basis = xi.x.powi(a as i32) * xi.y.powi(b as i32) - self.frame.moments[k];
            for v in 0..N_VARS {
                out[v] += self.coeffs[k][v] * basis;
            }
        }
        out
    }

    /// 光滑度指示子：每个变量的高次（次数 ≥ 1）系数平方和
    pub fn smoothness_indicator(&self) -> [f64; N_VARS] {
        let mut out = [0.0; N_VARS];
        for k in 1..poly_dof(self.degree) {
            for v in 0..N_VARS {
                out[v] += self.coeffs[k][v] * self.coeffs[k][v];
            }
        }
        out
    }

    #[inline]
    fn assert_same_frame(&self, other: &Self) {
        debug_assert!(
            (self.frame.x_center - other.frame.x_center).length() < 1e-12
                && (self.frame.length - other.frame.length).abs() < 1e-12,
            "不同参考系的多项式不可直接运算"
        );
    }
}

// ============================================================================
// 线性运算（WENO 混合用）
// ============================================================================

impl<const N_VARS: usize> Add for Poly2d<N_VARS> {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self.assert_same_frame(&rhs);
        for k in 0..N_COEFFS {
            for v in 0..N_VARS {
                self.coeffs[k][v] += rhs.coeffs[k][v];
            }
        }
        self.degree = self.degree.max(rhs.degree);
        self
    }
}

impl<const N_VARS: usize> Sub for Poly2d<N_VARS> {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        self.assert_same_frame(&rhs);
        for k in 0..N_COEFFS {
            for v in 0..N_VARS {
                self.coeffs[k][v] -= rhs.coeffs[k][v];
            }
        }
        self.degree = self.degree.max(rhs.degree);
        self
    }
}

impl<const N_VARS: usize> Mul<f64> for Poly2d<N_VARS> {
    type Output = Self;
    fn mul(mut self, s: f64) -> Self {
        for k in 0..N_COEFFS {
            for v in 0..N_VARS {
                self.coeffs[k][v] *= s;
            }
        }
        self
    }
}

impl<const N_VARS: usize> Div<f64> for Poly2d<N_VARS> {
    type Output = Self;
    fn div(self, s: f64) -> Self {
        self * (1.0 / s)
    }
}

impl<const N_VARS: usize> AddAssign for Poly2d<N_VARS> {
    fn add_assign(&mut self, rhs: Self) {
        self.assert_same_frame(&rhs);
        for k in 0..N_COEFFS {
            for v in 0..N_VARS {
                self.coeffs[k][v] += rhs.coeffs[k][v];
            }
        }
        self.degree = self.degree.max(rhs.degree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_mesh::moments::poly_index;
    use nova_mesh::unit_square;

    fn frame_of(mesh: &TriMesh, cell: usize) -> PolyFrame {
        PolyFrame::of_cell(mesh, cell)
    }

    #[test]
    fn test_constant_eval() {
        let mesh = unit_square(2).unwrap();
        let p = Poly2d::<1>::constant([3.5], frame_of(&mesh, 0));
        assert_eq!(p.eval(DVec2::new(0.2, 0.1))[0], 3.5);
        assert_eq!(p.smoothness_indicator()[0], 0.0);
    }

    #[test]
    fn test_cell_average_is_constant_coefficient() {
        // 高次基函数经过矩修正后单元平均为零
        let mesh = unit_square(3).unwrap();
        let cell = 5;
        let frame = frame_of(&mesh, cell);
        let mut coeffs = [[0.0; 1]; N_COEFFS];
        coeffs[0] = [2.0];
        coeffs[poly_index(1, 0)] = [0.7];
        coeffs[poly_index(0, 1)] = [-0.3];
        coeffs[poly_index(2, 0)] = [1.1];
        coeffs[poly_index(1, 1)] = [0.4];
        coeffs[poly_index(0, 2)] = [-0.9];
        let p = Poly2d::from_coeffs(2, coeffs, frame);

        let avg = mesh.volume_average(cell, |x| p.eval(x)[0]);
        assert!(
            (avg - 2.0).abs() < 1e-13,
            "单元平均 {avg} 应等于常数系数 2.0"
        );
    }

    #[test]
    fn test_smoothness_indicator() {
        let mesh = unit_square(2).unwrap();
        let frame = frame_of(&mesh, 0);
        let mut coeffs = [[0.0; 2]; N_COEFFS];
        coeffs[0] = [10.0, 20.0]; // 常数不计入
        coeffs[poly_index(1, 0)] = [3.0, 0.0];
        coeffs[poly_index(0, 1)] = [4.0, 1.0];
        let p = Poly2d::from_coeffs(1, coeffs, frame);
        let ssi = p.smoothness_indicator();
        assert!((ssi[0] - 25.0).abs() < 1e-13);
        assert!((ssi[1] - 1.0).abs() < 1e-13);
    }

    #[test]
    fn test_linear_ops_preserve_average() {
        let mesh = unit_square(2).unwrap();
        let frame = frame_of(&mesh, 1);
        let p = Poly2d::<1>::constant([1.0], frame);
        let q = Poly2d::<1>::constant([3.0], frame);
        let blend = p * 0.25 + q * 0.75;
        assert!((blend.cell_average()[0] - 2.5).abs() < 1e-15);
        let diff = (q - p) / 2.0;
        assert!((diff.cell_average()[0] - 1.0).abs() < 1e-15);
    }
}

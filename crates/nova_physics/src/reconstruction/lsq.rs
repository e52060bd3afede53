// crates/nova_physics/src/reconstruction/lsq.rs

//! 最小二乘拟合
//!
//! 在矩修正单项式基上为一个模板装配设计矩阵并求解超定方程。
//! 行对应模板里除中心外的每个单元，列对应次数 1..deg 的基函数；
//! 右端是邻居平均值相对中心平均值的差。常数系数不进入方程，
//! 直接赋为中心平均，守恒性由此保证。
//!
//! 设计矩阵元素是基函数在邻居单元上的平均值。邻居单元的平均通过
//! 二项式展开由它自己的归一化矩闭式给出：设 `s = l_j/l₀`、
//! `(x̄, ȳ)` 为归一化形心偏移，则
//!
//! ```text
//! avg_j[ξ^a η^b] = Σ_{p≤a, q≤b} C(a,p) C(b,q) x̄^{a-p} ȳ^{b-q} s^{p+q} m_j[p,q]
//! ```
//!
//! 法方程 `AᵀA` 的 Cholesky 分解在构造期做一次，之后每个状态场
//! 只剩矩阵乘与回代。

use nalgebra::{Cholesky, DMatrix, Dyn};

use nova_foundation::{NovaError, NovaResult};
use nova_mesh::moments::{poly_dof, MOMENT_EXPONENTS};
use nova_mesh::TriMesh;
use smallvec::SmallVec;

use super::poly::{Poly2d, PolyFrame, N_COEFFS};
use super::stencil::Stencil;
use super::stencil_family::StencilFamily;

/// 单个模板的最小二乘求解器
#[derive(Debug, Clone)]
pub struct LsqSolver {
    /// 拟合阶数（次数 + 1）
    pub order: usize,
    frame: PolyFrame,
    /// 设计矩阵 A（行 = 模板大小-1，列 = poly_dof(order-1)-1）
    a: DMatrix<f64>,
    /// AᵀA 的 Cholesky 分解；一阶旁路时为 None
    chol: Option<Cholesky<f64, Dyn>>,
}

impl PartialEq for LsqSolver {
    /// 结构相等：阶数、参考系与设计矩阵一致
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.frame == other.frame && self.a == other.a
    }
}

impl LsqSolver {
    /// 为模板装配设计矩阵并预分解
    pub fn new(mesh: &TriMesh, stencil: &Stencil) -> NovaResult<Self> {
        let i0 = stencil.global[0] as usize;
        let frame = PolyFrame::of_cell(mesh, i0);

        if stencil.order <= 1 {
            return Ok(Self {
                order: 1,
                frame,
                a: DMatrix::zeros(0, 0),
                chol: None,
            });
        }

        let deg = stencil.order - 1;
        let rows = stencil.size() - 1;
        let cols = poly_dof(deg) - 1;
        debug_assert!(rows >= cols, "模板大小不足以支撑请求的次数");

        let l0 = mesh.char_length[i0];
        let c0 = mesh.cell_centers[i0];
        let m0 = &mesh.normalized_moments[i0];

        let mut a = DMatrix::zeros(rows, cols);
        for (row, &g) in stencil.global[1..].iter().enumerate() {
            let j = g as usize;
            let s = mesh.char_length[j] / l0;
            let off = (mesh.cell_centers[j] - c0) / l0;
            let mj = &mesh.normalized_moments[j];

            for col in 0..cols {
                let (pa, pb) = MOMENT_EXPONENTS[col + 1];
                // 邻居单元上基函数的平均值（二项式展开）
                let mut avg = 0.0;
                for p in 0..=pa {
                    for q in 0..=pb {
                        let idx = nova_mesh::moments::poly_index(p, q);
                        avg += binom(pa, p)
                            * binom(pb, q)
                            * off.x.powi((pa - p) as i32)
                            * off.y.powi((pb - q) as i32)
                            * s.powi((p + q) as i32)
                            * mj[idx];
                    }
                }
                a[(row, col)] = avg - m0[col + 1];
            }
        }

        let ata = a.transpose() * &a;
        let chol = ata.cholesky().ok_or_else(|| {
            NovaError::numerical(format!("单元 {i0} 的法方程不可 Cholesky 分解"))
        })?;

        Ok(Self {
            order: stencil.order,
            frame,
            a,
            chol: Some(chol),
        })
    }

    /// 求解拟合
    ///
    /// `rhs[j]` 是模板第 j+1 个单元相对中心的平均值差，
    /// `center_avg` 是中心单元的平均值，直接成为常数系数。
    pub fn solve<const N_VARS: usize>(
        &self,
        rhs: &[[f64; N_VARS]],
        center_avg: [f64; N_VARS],
    ) -> Poly2d<N_VARS> {
        let mut coeffs = [[0.0; N_VARS]; N_COEFFS];
        coeffs[0] = center_avg;

        let Some(chol) = &self.chol else {
            return Poly2d::from_coeffs(0, coeffs, self.frame);
        };

        let rows = self.a.nrows();
        debug_assert_eq!(rhs.len(), rows);

        let mut b = DMatrix::zeros(rows, N_VARS);
        for (j, r) in rhs.iter().enumerate() {
            for v in 0..N_VARS {
                b[(j, v)] = r[v];
            }
        }
        let atb = self.a.transpose() * b;
        let x = chol.solve(&atb);

        for k in 0..x.nrows() {
            for v in 0..N_VARS {
                coeffs[k + 1][v] = x[(k, v)];
            }
        }
        Poly2d::from_coeffs(self.order - 1, coeffs, self.frame)
    }
}

#[inline]
fn binom(n: usize, k: usize) -> f64 {
    // 次数不超过 4，直接查表
    const TABLE: [[f64; 5]; 5] = [
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 1.0, 0.0, 0.0, 0.0],
        [1.0, 2.0, 1.0, 0.0, 0.0],
        [1.0, 3.0, 3.0, 1.0, 0.0],
        [1.0, 4.0, 6.0, 4.0, 1.0],
    ];
    TABLE[n][k]
}

/// 家族里每个模板一个求解器
#[derive(Debug, Clone, PartialEq)]
pub struct LsqSolverFamily {
    solvers: SmallVec<[LsqSolver; 4]>,
}

impl LsqSolverFamily {
    /// 为家族的每个模板装配求解器
    pub fn new(mesh: &TriMesh, family: &StencilFamily) -> NovaResult<Self> {
        let mut solvers = SmallVec::new();
        for s in family.iter() {
            solvers.push(LsqSolver::new(mesh, s)?);
        }
        Ok(Self { solvers })
    }

    /// 按模板索引取求解器
    #[inline]
    pub fn solver(&self, k: usize) -> &LsqSolver {
        &self.solvers[k]
    }

    /// 求解器个数
    #[inline]
    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }
}

// crates/nova_physics/src/reconstruction/weno.rs

//! 自适应阶 WENO 杂交
//!
//! 对家族里的每个模板各做一次最小二乘拟合，再按光滑度做 ENO 式
//! 非线性混合。两种模式：
//!
//! - **WENO-AO**: 直接混合各模板多项式；
//! - **CWENO-AO**: 先把最高阶模板改写为中心补偿多项式
//!   `p_c = (p_hi - Σ_{k≠hi} w_k p_k) / w_hi`，光滑区混合结果
//!   精确还原 `p_hi`，间断区回落到低阶模板。
//!
//! 混合权重 `α_k = w_k / (ε + IS_k^s)` 归一化后使用，光滑度
//! `IS_k` 取各变量高次系数平方和的最大值。由于 `Σ ᾱ_k = 1` 且
//! 每个 `p_k` 的常数系数都是中心平均，混合不破坏守恒。

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use nova_foundation::tolerance::CWENO_MIN_CENTRAL_WEIGHT;
use nova_foundation::{ensure, NovaError, NovaResult};
use nova_mesh::TriMesh;

use super::lsq::LsqSolverFamily;
use super::poly::Poly2d;
use super::stencil_family::{StencilFamily, StencilFamilyParams};

/// 杂交模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridizeMode {
    /// 直接混合
    WenoAo,
    /// 中心补偿混合
    CwenoAo,
}

/// WENO 混合参数
#[derive(Debug, Clone, PartialEq)]
pub struct WenoParams {
    /// 模板家族参数
    pub family: StencilFamilyParams,
    /// 线性权重（未归一化）
    pub linear_weights: Vec<f64>,
    /// 光滑度正则化量
    pub epsilon: f64,
    /// 光滑度指数
    pub exponent: i32,
    /// 杂交模式
    pub mode: HybridizeMode,
}

/// 一个单元的完整 WENO 重构算子
#[derive(Debug, Clone, PartialEq)]
pub struct HybridWeno {
    stencils: StencilFamily,
    solvers: LsqSolverFamily,
    /// 归一化线性权重
    linear_weights: Vec<f64>,
    epsilon: f64,
    exponent: i32,
    mode: HybridizeMode,
    /// 最高阶模板索引
    k_high: usize,
}

impl HybridWeno {
    /// 搜索模板、装配求解器并校验权重
    pub fn new(mesh: &TriMesh, cell: usize, params: &WenoParams) -> NovaResult<Self> {
        let stencils = StencilFamily::new(mesh, cell, &params.family)?;
        let solvers = LsqSolverFamily::new(mesh, &stencils)?;

        NovaError::check_size(
            "linear_weights",
            stencils.len(),
            params.linear_weights.len(),
        )?;
        let sum: f64 = params.linear_weights.iter().sum();
        ensure!(
            sum > 0.0 && params.linear_weights.iter().all(|&w| w >= 0.0),
            NovaError::config("线性权重必须非负且和为正")
        );
        let linear_weights: Vec<f64> = params.linear_weights.iter().map(|w| w / sum).collect();

        let k_high = stencils.highest_order_stencil();
        if params.mode == HybridizeMode::CwenoAo {
            ensure!(
                linear_weights[k_high].abs() >= CWENO_MIN_CENTRAL_WEIGHT,
                NovaError::config(format!(
                    "CWENO-AO 中心线性权重过小: {}",
                    linear_weights[k_high]
                ))
            );
        }

        Ok(Self {
            stencils,
            solvers,
            linear_weights,
            epsilon: params.epsilon,
            exponent: params.exponent,
            mode: params.mode,
            k_high,
        })
    }

    /// 模板家族
    #[inline]
    pub fn stencils(&self) -> &StencilFamily {
        &self.stencils
    }

    /// 各模板的拟合多项式（混合前）
    ///
    /// `u` 按家族合并模板的局部索引排布，`u[0]` 是中心单元平均。
    /// CWENO-AO 模式下最高阶槽位已替换为中心补偿多项式。
    pub fn compute_polys<const N_VARS: usize>(
        &self,
        u: &[[f64; N_VARS]],
    ) -> SmallVec<[Poly2d<N_VARS>; 4]> {
        debug_assert_eq!(u.len(), self.stencils.combined_size());

        let mut polys: SmallVec<[Poly2d<N_VARS>; 4]> = SmallVec::new();
        let mut rhs: Vec<[f64; N_VARS]> = Vec::new();
        for (k, s) in self.stencils.iter().enumerate() {
            rhs.clear();
            let center = u[s.local[0] as usize];
            for &l in &s.local[1..] {
                let mut d = u[l as usize];
                for v in 0..N_VARS {
                    d[v] -= center[v];
                }
                rhs.push(d);
            }
            polys.push(self.solvers.solver(k).solve(&rhs, center));
        }

        if self.mode == HybridizeMode::CwenoAo && polys.len() > 1 {
            let w_hi = self.linear_weights[self.k_high];
            let mut acc = polys[self.k_high];
            for (k, p) in polys.iter().enumerate() {
                if k != self.k_high {
                    acc = acc - *p * self.linear_weights[k];
                }
            }
            polys[self.k_high] = acc / w_hi;
        }

        polys
    }

    /// 重构：拟合 + 非线性混合
    pub fn reconstruct<const N_VARS: usize>(&self, u: &[[f64; N_VARS]]) -> Poly2d<N_VARS> {
        let polys = self.compute_polys(u);

        let mut al: SmallVec<[f64; 4]> = SmallVec::new();
        let mut sum = 0.0;
        for (k, p) in polys.iter().enumerate() {
            let is = p
                .smoothness_indicator()
                .iter()
                .fold(0.0_f64, |m, &v| m.max(v));
            let a = self.linear_weights[k] / (self.epsilon + is.powi(self.exponent));
            al.push(a);
            sum += a;
        }

        let mut out = polys[0] * (al[0] / sum);
        for k in 1..polys.len() {
            out += polys[k] * (al[k] / sum);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconstruction::stencil::StencilBias;
    use glam::DVec2;
    use nova_mesh::unit_square;

    fn central_only(order: usize) -> StencilFamilyParams {
        StencilFamilyParams {
            orders: vec![order],
            biases: vec![StencilBias::Central],
            overfit_factors: vec![2.0],
        }
    }

    fn ao_params(mode: HybridizeMode) -> WenoParams {
        WenoParams {
            family: StencilFamilyParams {
                orders: vec![3, 2, 2, 2],
                biases: vec![
                    StencilBias::Central,
                    StencilBias::OneSided(0),
                    StencilBias::OneSided(1),
                    StencilBias::OneSided(2),
                ],
                overfit_factors: vec![2.0; 4],
            },
            linear_weights: vec![100.0, 1.0, 1.0, 1.0],
            epsilon: 1e-10,
            exponent: 4,
            mode,
        }
    }

    fn field_values(
        mesh: &nova_mesh::TriMesh,
        weno: &HybridWeno,
        f: impl Fn(DVec2) -> f64 + Copy,
    ) -> Vec<[f64; 1]> {
        weno.stencils()
            .l2g()
            .iter()
            .map(|&g| [mesh.volume_average(g as usize, f)])
            .collect()
    }

    #[test]
    fn test_constant_field_exact() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.5, 0.5)).unwrap();
        for mode in [HybridizeMode::WenoAo, HybridizeMode::CwenoAo] {
            let weno = HybridWeno::new(&mesh, cell, &ao_params(mode)).unwrap();
            let u = field_values(&mesh, &weno, |_| 3.25);
            let p = weno.reconstruct(&u);
            assert!((p.eval(DVec2::new(0.51, 0.5))[0] - 3.25).abs() < 1e-13);
        }
    }

    #[test]
    fn test_smooth_field_matches_high_order_stencil() {
        // 光滑场里 CWENO-AO 的混合结果应还原最高阶拟合
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.5, 0.5)).unwrap();
        let f = |p: DVec2| 1.0 + 0.3 * p.x + 0.2 * p.y;

        let weno = HybridWeno::new(&mesh, cell, &ao_params(HybridizeMode::CwenoAo)).unwrap();
        let u = field_values(&mesh, &weno, f);
        let p = weno.reconstruct(&u);
        // 线性场所有模板都精确，混合结果也精确
        let sample = DVec2::new(0.52, 0.47);
        assert!((p.eval(sample)[0] - f(sample)).abs() < 1e-10);
    }

    #[test]
    fn test_single_stencil_weight_is_identity() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.5, 0.5)).unwrap();
        let params = WenoParams {
            family: central_only(3),
            linear_weights: vec![1.0],
            epsilon: 1e-10,
            exponent: 4,
            mode: HybridizeMode::WenoAo,
        };
        let weno = HybridWeno::new(&mesh, cell, &params).unwrap();
        let f = |p: DVec2| 1.0 + 0.1 * p.x * p.y;
        let u = field_values(&mesh, &weno, f);
        let blended = weno.reconstruct(&u);
        let fitted = weno.compute_polys(&u)[0];
        // 单模板时混合是恒等映射
        let sample = DVec2::new(0.49, 0.53);
        assert!((blended.eval(sample)[0] - fitted.eval(sample)[0]).abs() < 1e-14);
    }

    #[test]
    fn test_cweno_rejects_zero_central_weight() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.5, 0.5)).unwrap();
        let mut params = ao_params(HybridizeMode::CwenoAo);
        params.linear_weights = vec![0.0, 1.0, 1.0, 1.0];
        assert!(HybridWeno::new(&mesh, cell, &params).is_err());
        // WENO-AO 模式不受此限制
        let mut params = ao_params(HybridizeMode::WenoAo);
        params.linear_weights = vec![0.0, 1.0, 1.0, 1.0];
        assert!(HybridWeno::new(&mesh, cell, &params).is_ok());
    }

    #[test]
    fn test_blend_preserves_cell_average() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.5, 0.5)).unwrap();
        for mode in [HybridizeMode::WenoAo, HybridizeMode::CwenoAo] {
            let weno = HybridWeno::new(&mesh, cell, &ao_params(mode)).unwrap();
            let f = |p: DVec2| (4.0 * p.x).sin() + 0.5 * p.y * p.y;
            let u = field_values(&mesh, &weno, f);
            let p = weno.reconstruct(&u);
            assert!(
                (p.cell_average()[0] - u[0][0]).abs() < 1e-12,
                "混合破坏了单元平均"
            );
        }
    }

    #[test]
    fn test_jump_suppresses_crossing_stencil() {
        // 间断场里至少有一个完全在光滑一侧的模板，结果应接近常数
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(DVec2::new(0.3, 0.5)).unwrap();
        let weno = HybridWeno::new(&mesh, cell, &ao_params(HybridizeMode::WenoAo)).unwrap();
        let f = |p: DVec2| if p.x < 0.55 { 1.0 } else { 2.0 };
        let u = field_values(&mesh, &weno, f);
        let p = weno.reconstruct(&u);
        let v = p.eval(mesh.cell_centers[cell])[0];
        assert!(v > 0.99 && v < 1.01, "间断附近的值 {v} 偏离左侧常数");
    }
}

// crates/nova_physics/src/reconstruction/local.rs

//! 单元局部重构
//!
//! 把良平衡分解、背景缓存与 WENO 拟合缝合在一起。每次 `compute`：
//!
//! 1. 决定是否重算背景：距上次重算的步数到达 `steps_per_recompute`，
//!    或中心单元 `(ρ, e)` 的无量纲漂移超过 `recompute_threshold`；
//! 2. 重算时求解局部平衡态，缓存合并模板内每个单元的背景平均、
//!    本单元求积点上的背景点值，并更新特征尺度；
//! 3. 对扰动场 `(u - 背景平均) / 尺度` 做 WENO 重构。
//!
//! 点值为 `背景(x) + 尺度 ⊙ 扰动(x)`；背景只作用在 ρ 与 E 分量上。
//! 示踪剂用同一模板家族做标量重构，不做背景分解。
//!
//! 背景缓存只覆盖本单元的体/面求积点，其他位置回退到平衡态直接
//! 外推，两条路径的值一致。

use glam::DVec2;

use nova_mesh::TriMesh;

use crate::model::equilibrium::{Equilibrium, LocalEquilibrium};
use crate::model::euler::{EulerVar, IdealGasEos, RhoE, N_CVARS};
use crate::model::scaling::Scaling;
use crate::state::StateAccess;
use nova_foundation::NovaResult;

use super::few_points_cache::FewPointsCache;
use super::poly::{Poly2d, PolyFrame};
use super::weno::{HybridWeno, WenoParams};

/// 背景重算策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecomputePolicy {
    /// 尺度选择
    pub scaling: Scaling,
    /// 重算的步数间隔（0 表示每次都重算）
    pub steps_per_recompute: usize,
    /// 无量纲漂移阈值
    pub recompute_threshold: f64,
}

/// 一个单元的局部重构
#[derive(Debug, Clone)]
pub struct LocalReconstruction<E: Equilibrium> {
    cell: usize,
    weno: HybridWeno,
    equilibrium: LocalEquilibrium<E>,
    eos: IdealGasEos,
    policy: RecomputePolicy,

    /// 合并模板内每个单元的背景平均，与 l2g 对齐
    bg_avg: Vec<RhoE>,
    /// 本单元体/面求积点上的背景点值
    bg_points: FewPointsCache<RhoE>,
    /// 当前特征尺度
    scale: EulerVar,
    /// 上次重算时的中心 (ρ, e)
    u0_cached: RhoE,
    steps_since_recompute: usize,

    /// 扰动多项式
    poly: Poly2d<N_CVARS>,
    /// 示踪剂多项式
    tracer_polys: Vec<Poly2d<1>>,
}

impl<E: Equilibrium> LocalReconstruction<E> {
    /// 为单元 `cell` 搭建重构算子
    pub fn new(
        mesh: &TriMesh,
        cell: usize,
        weno_params: &WenoParams,
        equilibrium: E,
        eos: IdealGasEos,
        policy: RecomputePolicy,
    ) -> NovaResult<Self> {
        let weno = HybridWeno::new(mesh, cell, weno_params)?;
        let n_combined = weno.stencils().combined_size();

        // 背景点缓存覆盖本单元的体求积点和三条面的线求积点
        let mut points: Vec<DVec2> = mesh.volume_points[cell].to_vec();
        for &fi in &mesh.cell_faces[cell] {
            points.extend_from_slice(&mesh.faces[fi as usize].points);
        }
        let bg_points = FewPointsCache::new(points, RhoE::ZERO)?;

        Ok(Self {
            cell,
            weno,
            equilibrium: LocalEquilibrium::new(equilibrium),
            eos,
            policy,
            bg_avg: vec![RhoE::ZERO; n_combined],
            bg_points,
            scale: EulerVar([1.0; N_CVARS]),
            u0_cached: RhoE::ZERO,
            steps_since_recompute: usize::MAX,
            poly: Poly2d::constant([0.0; N_CVARS], PolyFrame::of_cell(mesh, cell)),
            tracer_polys: Vec::new(),
        })
    }

    /// 所属单元
    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// 底层 WENO 算子
    #[inline]
    pub fn weno(&self) -> &HybridWeno {
        &self.weno
    }

    /// 局部平衡态
    #[inline]
    pub fn equilibrium(&self) -> &LocalEquilibrium<E> {
        &self.equilibrium
    }

    /// 扰动多项式（无量纲）
    #[inline]
    pub fn delta_poly(&self) -> &Poly2d<N_CVARS> {
        &self.poly
    }

    /// 按当前状态更新重构
    pub fn compute<S: StateAccess>(&mut self, mesh: &TriMesh, state: &S) {
        let u0 = state.conserved(self.cell);
        let target = RhoE::new(u0.rho(), u0.energy() - u0.kinetic_energy());

        let due = self.steps_since_recompute >= self.policy.steps_per_recompute;
        let drifted = self.drift(target) > self.policy.recompute_threshold;
        if due || drifted {
            self.recompute_background(mesh, &u0, target);
            self.steps_since_recompute = 0;
        } else {
            self.steps_since_recompute += 1;
        }

        // 扰动场 WENO 拟合
        let mut deltas: Vec<[f64; N_CVARS]> = Vec::with_capacity(self.bg_avg.len());
        {
            let l2g = self.weno.stencils().l2g();
            for (bg, &g) in self.bg_avg.iter().zip(l2g) {
                let u = state.conserved(g as usize);
                let d = (u - bg.to_euler()).component_div(&self.scale);
                deltas.push(d.0);
            }
        }
        self.poly = self.weno.reconstruct(&deltas);

        // 示踪剂：同一模板的标量重构，无背景
        self.tracer_polys.clear();
        for k in 0..state.n_tracers() {
            let vals: Vec<[f64; 1]> = self
                .weno
                .stencils()
                .l2g()
                .iter()
                .map(|&g| [state.tracer(g as usize, k)])
                .collect();
            self.tracer_polys.push(self.weno.reconstruct(&vals));
        }
    }

    /// 中心 (ρ, e) 相对缓存值的无量纲漂移
    fn drift(&self, target: RhoE) -> f64 {
        let d_rho = ((target.rho - self.u0_cached.rho) / self.scale.0[0]).abs();
        let d_e = ((target.e - self.u0_cached.e) / self.scale.0[3]).abs();
        d_rho.max(d_e)
    }

    fn recompute_background(&mut self, mesh: &TriMesh, u0: &EulerVar, target: RhoE) {
        self.equilibrium.solve(target, mesh, self.cell);

        for idx in 0..self.bg_avg.len() {
            let g = self.weno.stencils().l2g()[idx] as usize;
            self.bg_avg[idx] = self.equilibrium.cell_average(mesh, g);
        }

        let eq = &self.equilibrium;
        self.bg_points.update(|x| eq.point_value(x));

        self.scale = self.policy.scaling.scale(&self.eos, u0);
        self.u0_cached = target;
    }

    #[inline]
    fn background_rhoe(&self, x: DVec2) -> RhoE {
        match self.bg_points.get(x) {
            Some(v) => *v,
            None => self.equilibrium.point_value(x),
        }
    }

    /// 重构点值：背景 + 尺度 ⊙ 扰动
    pub fn evaluate(&self, x: DVec2) -> EulerVar {
        let bg = self.background_rhoe(x);
        let d = self.poly.eval(x);
        EulerVar([
            bg.rho + self.scale.0[0] * d[0],
            self.scale.0[1] * d[1],
            self.scale.0[2] * d[2],
            bg.e + self.scale.0[3] * d[3],
        ])
    }

    /// 背景点值（动量恒为零）
    pub fn background(&self, x: DVec2) -> EulerVar {
        self.background_rhoe(x).to_euler()
    }

    /// 有量纲的扰动点值
    pub fn delta(&self, x: DVec2) -> EulerVar {
        let d = self.poly.eval(x);
        EulerVar([
            self.scale.0[0] * d[0],
            self.scale.0[1] * d[1],
            self.scale.0[2] * d[2],
            self.scale.0[3] * d[3],
        ])
    }

    /// 第 k 个示踪剂的重构点值
    pub fn tracer(&self, x: DVec2, k: usize) -> f64 {
        self.tracer_polys[k].eval(x)[0]
    }
}

// crates/nova_physics/src/engine/rhs.rs

//! 半离散右端项
//!
//! [`RateOfChange`] 是把状态映射到变化率的最小接口，完整的右端项
//! 由 [`SumOfRates`] 把若干项加起来。当前有两项：
//!
//! - [`FluxLoop`]: 先更新全场重构，再在每条面的求积点上算 HLLC
//!   数值通量并散布到相邻单元；
//! - [`GravitySourceLoop`]: 背景/扰动分解的重力源。平衡态压力项
//!   写成面积分 `∮ p_eq n dl`（静力平衡 `∇p_eq = -ρ_eq ∇φ` 加散度
//!   定理），在与通量回路相同的面求积点上取值；扰动密度与动量的
//!   `-δρ∇φ`、`-m·∇φ` 仍做体积求积。
//!
//! 两者通过 `Arc<RwLock<GlobalReconstruction>>` 共享同一份重构。
//! 约定：在一次 [`SumOfRates::compute`] 里通量项先执行并刷新重构，
//! 源项只读复用。
//!
//! 面通量的并行化采用先并行算面、再串行散布的两段式，避免相邻
//! 单元的写冲突。

use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use smallvec::SmallVec;

use glam::DVec2;
use nova_foundation::NovaResult;
use nova_mesh::frozen::{Face, NO_NEIGHBOUR};
use nova_mesh::TriMesh;

use crate::model::equilibrium::Equilibrium;
use crate::model::euler::{EulerVar, IdealGasEos, RhoE};
use crate::model::gravity::Gravity;
use crate::reconstruction::GlobalReconstruction;
use crate::state::AllVariables;

/// 半离散变化率项
pub trait RateOfChange: Send + Sync {
    /// 把本项的贡献累加到 `tendency` 上
    fn compute(&self, tendency: &mut AllVariables, state: &AllVariables, t: f64)
        -> NovaResult<()>;
}

/// 若干项之和：清零后依次累加
pub struct SumOfRates {
    terms: Vec<Box<dyn RateOfChange>>,
}

impl SumOfRates {
    /// 按给定顺序组合各项
    pub fn new(terms: Vec<Box<dyn RateOfChange>>) -> Self {
        Self { terms }
    }
}

impl RateOfChange for SumOfRates {
    fn compute(
        &self,
        tendency: &mut AllVariables,
        state: &AllVariables,
        t: f64,
    ) -> NovaResult<()> {
        tendency.fill_zero();
        for term in &self.terms {
            term.compute(tendency, state, t)?;
        }
        Ok(())
    }
}

// ============================================================================
// 通量回路
// ============================================================================

/// 示踪剂通量的内联容量
type TracerFlux = SmallVec<[f64; 4]>;

/// HLLC 通量回路
pub struct FluxLoop<E: Equilibrium> {
    mesh: Arc<TriMesh>,
    eos: IdealGasEos,
    recon: Arc<RwLock<GlobalReconstruction<E>>>,
}

impl<E: Equilibrium> FluxLoop<E> {
    /// 构造
    pub fn new(
        mesh: Arc<TriMesh>,
        eos: IdealGasEos,
        recon: Arc<RwLock<GlobalReconstruction<E>>>,
    ) -> Self {
        Self { mesh, eos, recon }
    }

    /// 共享的全场重构
    pub fn reconstruction(&self) -> &Arc<RwLock<GlobalReconstruction<E>>> {
        &self.recon
    }

    /// 单条面的面平均通量（含示踪剂）
    fn face_flux(
        &self,
        recon: &GlobalReconstruction<E>,
        face: &Face,
        n_tracers: usize,
    ) -> (EulerVar, TracerFlux) {
        let owner = face.owner as usize;
        let mut flux = EulerVar::ZERO;
        let mut tracer_flux: TracerFlux = SmallVec::from_elem(0.0, n_tracers);

        for (&x, &w) in face.points.iter().zip(&self.mesh.face_weights) {
            let ul = recon.cell(owner).evaluate(x);
            // 边界面按外推（零梯度）处理
            let ur = if face.is_boundary() {
                ul
            } else {
                recon.cell(face.neighbour as usize).evaluate(x)
            };
            let f = hllc(&self.eos, &ul, &ur, face.normal);
            flux += f * w;

            // 示踪剂按质量通量迎风
            if n_tracers > 0 {
                let up_cell = if f.rho() >= 0.0 {
                    owner
                } else {
                    face.neighbour as usize
                };
                for (k, tf) in tracer_flux.iter_mut().enumerate() {
                    *tf += w * f.rho() * recon.cell(up_cell).tracer(x, k);
                }
            }
        }
        (flux, tracer_flux)
    }
}

impl<E: Equilibrium> RateOfChange for FluxLoop<E> {
    fn compute(
        &self,
        tendency: &mut AllVariables,
        state: &AllVariables,
        _t: f64,
    ) -> NovaResult<()> {
        self.recon.write().compute(state);
        let recon = self.recon.read();
        let n_tracers = state.n_avars;

        // 先并行算面通量
        let fluxes: Vec<(EulerVar, TracerFlux)> = self
            .mesh
            .faces
            .par_iter()
            .map(|face| self.face_flux(&recon, face, n_tracers))
            .collect();

        // 再串行散布到相邻单元
        for (face, (flux, tracer_flux)) in self.mesh.faces.iter().zip(&fluxes) {
            let owner = face.owner as usize;
            let rate_o = face.length / self.mesh.areas[owner];
            tendency.cvars[owner] += *flux * (-rate_o);
            for (k, &tf) in tracer_flux.iter().enumerate() {
                tendency.avars[owner * n_tracers + k] -= rate_o * tf;
            }

            if face.neighbour != NO_NEIGHBOUR {
                let neigh = face.neighbour as usize;
                let rate_n = face.length / self.mesh.areas[neigh];
                tendency.cvars[neigh] += *flux * rate_n;
                for (k, &tf) in tracer_flux.iter().enumerate() {
                    tendency.avars[neigh * n_tracers + k] += rate_n * tf;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// HLLC
// ============================================================================

#[inline]
fn rotate_to_normal(u: &EulerVar, n: DVec2) -> EulerVar {
    // 切向取法向逆时针旋转 90°
    let t = DVec2::new(-n.y, n.x);
    EulerVar([
        u.rho(),
        u.mx() * n.x + u.my() * n.y,
        u.mx() * t.x + u.my() * t.y,
        u.energy(),
    ])
}

#[inline]
fn rotate_back(f: &EulerVar, n: DVec2) -> EulerVar {
    let t = DVec2::new(-n.y, n.x);
    EulerVar([
        f.rho(),
        f.mx() * n.x + f.my() * t.x,
        f.mx() * n.y + f.my() * t.y,
        f.energy(),
    ])
}

/// 法向坐标系下的物理通量
#[inline]
fn physical_flux(eos: &IdealGasEos, u: &EulerVar) -> EulerVar {
    let un = u.mx() / u.rho();
    let p = (eos.gamma - 1.0) * (u.energy() - u.kinetic_energy());
    EulerVar([
        u.mx(),
        u.mx() * un + p,
        u.my() * un,
        (u.energy() + p) * un,
    ])
}

/// HLLC 近似 Riemann 求解器（旋转到面法向坐标系）
pub fn hllc(eos: &IdealGasEos, ul: &EulerVar, ur: &EulerVar, n: DVec2) -> EulerVar {
    let l = rotate_to_normal(ul, n);
    let r = rotate_to_normal(ur, n);

    let (rho_l, rho_r) = (l.rho(), r.rho());
    let (un_l, un_r) = (l.mx() / rho_l, r.mx() / rho_r);
    let p_l = (eos.gamma - 1.0) * (l.energy() - l.kinetic_energy());
    let p_r = (eos.gamma - 1.0) * (r.energy() - r.kinetic_energy());
    let a_l = (eos.gamma * p_l / rho_l).sqrt();
    let a_r = (eos.gamma * p_r / rho_r).sqrt();

    let s_l = (un_l - a_l).min(un_r - a_r);
    let s_r = (un_l + a_l).max(un_r + a_r);

    let flux = if s_l >= 0.0 {
        physical_flux(eos, &l)
    } else if s_r <= 0.0 {
        physical_flux(eos, &r)
    } else {
        let num = p_r - p_l + rho_l * un_l * (s_l - un_l) - rho_r * un_r * (s_r - un_r);
        let den = rho_l * (s_l - un_l) - rho_r * (s_r - un_r);
        let s_star = num / den;

        let star = |u: &EulerVar, s: f64, un: f64, p: f64| -> EulerVar {
            let rho = u.rho();
            let factor = rho * (s - un) / (s - s_star);
            EulerVar([
                factor,
                factor * s_star,
                factor * (u.my() / rho),
                factor
                    * (u.energy() / rho
                        + (s_star - un) * (s_star + p / (rho * (s - un)))),
            ])
        };

        if s_star >= 0.0 {
            let u_star = star(&l, s_l, un_l, p_l);
            physical_flux(eos, &l) + (u_star - l) * s_l
        } else {
            let u_star = star(&r, s_r, un_r, p_r);
            physical_flux(eos, &r) + (u_star - r) * s_r
        }
    };

    rotate_back(&flux, n)
}

// ============================================================================
// 重力源项
// ============================================================================

/// 背景/扰动分解的重力源项回路
///
/// `-ρ∇φ = ∇p_eq - δρ∇φ`（背景满足静力平衡 `∇p_eq = -ρ_eq∇φ`），
/// `∇p_eq` 的体积分按散度定理化为 `∮ p_eq n dl`，并在与通量回路
/// 完全相同的面求积点上取值。静力状态下重构退回背景，通量里的
/// 压力项与这里的面积分逐点相消，对任意重力场都保持到舍入误差。
/// 朴素模式的背景恒为零，自动退回 `-ρ∇φ` 的体积求积。
///
/// 依赖 [`FluxLoop`] 在同一次 `SumOfRates` 里先刷新共享重构。
pub struct GravitySourceLoop<E: Equilibrium, G: Gravity> {
    mesh: Arc<TriMesh>,
    eos: IdealGasEos,
    gravity: G,
    recon: Arc<RwLock<GlobalReconstruction<E>>>,
}

impl<E: Equilibrium, G: Gravity> GravitySourceLoop<E, G> {
    /// 构造
    pub fn new(
        mesh: Arc<TriMesh>,
        eos: IdealGasEos,
        gravity: G,
        recon: Arc<RwLock<GlobalReconstruction<E>>>,
    ) -> Self {
        Self {
            mesh,
            eos,
            gravity,
            recon,
        }
    }
}

impl<E: Equilibrium, G: Gravity> RateOfChange for GravitySourceLoop<E, G> {
    fn compute(
        &self,
        tendency: &mut AllVariables,
        _state: &AllVariables,
        _t: f64,
    ) -> NovaResult<()> {
        let recon = self.recon.read();
        let mesh = &self.mesh;
        let gravity = &self.gravity;
        let eos = &self.eos;

        tendency
            .cvars
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, rate)| {
                let local = recon.cell(i);
                let mut src = EulerVar::ZERO;

                // 平衡态压力的面积分，求积点与通量回路一致
                for &fi in &mesh.cell_faces[i] {
                    let face = &mesh.faces[fi as usize];
                    let outward = if face.owner as usize == i {
                        face.normal
                    } else {
                        -face.normal
                    };
                    let mut p_eq = 0.0;
                    for (&x, &w) in face.points.iter().zip(&mesh.face_weights) {
                        let bg = local.background(x);
                        p_eq += w * eos.pressure_rhoe(RhoE::new(bg.rho(), bg.energy()));
                    }
                    let scale = face.length / mesh.areas[i];
                    src.0[1] += scale * p_eq * outward.x;
                    src.0[2] += scale * p_eq * outward.y;
                }

                // 扰动项的体积求积。背景动量为零，扰动动量即全量动量
                for (&x, &w) in mesh.volume_points[i].iter().zip(&mesh.volume_weights) {
                    let d = local.delta(x);
                    let gp = gravity.grad_phi(x);
                    src.0[1] -= w * d.rho() * gp.x;
                    src.0[2] -= w * d.rho() * gp.y;
                    src.0[3] -= w * (d.mx() * gp.x + d.my() * gp.y);
                }
                *rate += src;
            });
        Ok(())
    }
}

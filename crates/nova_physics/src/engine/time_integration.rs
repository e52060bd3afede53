// crates/nova_physics/src/engine/time_integration.rs

//! 显式时间推进
//!
//! [`ForwardEuler`] 与两级 SSP Runge-Kutta [`SspRk2`]，外加基于
//! 声速的 CFL 步长估计 [`stable_dt`]。积分器自带暂存缓冲，步进
//! 时不再分配。

use nova_foundation::NovaResult;
use nova_mesh::TriMesh;

use crate::model::euler::IdealGasEos;
use crate::state::AllVariables;

use super::rhs::RateOfChange;

/// 单步时间积分器
pub trait TimeIntegrator {
    /// 把 `state` 从 `t` 推进到 `t + dt`
    fn step(
        &mut self,
        state: &mut AllVariables,
        rate: &dyn RateOfChange,
        t: f64,
        dt: f64,
    ) -> NovaResult<()>;
}

/// 一阶前向 Euler
pub struct ForwardEuler {
    tendency: AllVariables,
}

impl ForwardEuler {
    /// 按状态形状分配缓冲
    pub fn new(state: &AllVariables) -> Self {
        Self {
            tendency: AllVariables::zeros(state.n_cells(), state.n_avars),
        }
    }
}

impl TimeIntegrator for ForwardEuler {
    fn step(
        &mut self,
        state: &mut AllVariables,
        rate: &dyn RateOfChange,
        t: f64,
        dt: f64,
    ) -> NovaResult<()> {
        rate.compute(&mut self.tendency, state, t)?;
        state.scaled_add(dt, &self.tendency);
        Ok(())
    }
}

/// 二阶强稳定性保持 Runge-Kutta (Heun 形式)
///
/// u* = u + dt L(u)；u^{n+1} = ½u + ½(u* + dt L(u*))。
pub struct SspRk2 {
    tendency: AllVariables,
    stage: AllVariables,
}

impl SspRk2 {
    /// 按状态形状分配缓冲
    pub fn new(state: &AllVariables) -> Self {
        Self {
            tendency: AllVariables::zeros(state.n_cells(), state.n_avars),
            stage: AllVariables::zeros(state.n_cells(), state.n_avars),
        }
    }
}

impl TimeIntegrator for SspRk2 {
    fn step(
        &mut self,
        state: &mut AllVariables,
        rate: &dyn RateOfChange,
        t: f64,
        dt: f64,
    ) -> NovaResult<()> {
        rate.compute(&mut self.tendency, state, t)?;
        self.stage.clone_from(state);
        self.stage.scaled_add(dt, &self.tendency);

        rate.compute(&mut self.tendency, &self.stage, t + dt)?;
        self.stage.scaled_add(dt, &self.tendency);

        // u^{n+1} = ½ u^n + ½ stage
        state.convex_combine(0.5, 0.5, &self.stage);
        Ok(())
    }
}

/// CFL 稳定步长
///
/// dt = cfl · min_i l_i / (|u|_i + a_i)，特征长度取外接圆半径。
pub fn stable_dt(mesh: &TriMesh, eos: &IdealGasEos, state: &AllVariables, cfl: f64) -> f64 {
    let mut dt = f64::INFINITY;
    for (i, u) in state.cvars.iter().enumerate() {
        let rho = u.rho();
        let speed = (u.mx() * u.mx() + u.my() * u.my()).sqrt() / rho;
        let a = eos.sound_speed(u);
        dt = dt.min(mesh.char_length[i] / (speed + a));
    }
    cfl * dt
}

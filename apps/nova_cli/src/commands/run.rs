// apps/nova_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 在单位正方形三角网格上推进可压缩 Euler 方程。初始条件为配置
//! 重力场下的等熵静力大气，可叠加一个高斯密度扰动。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use glam::DVec2;
use tracing::info;

use nova_mesh::unit_square;
use nova_physics::config::GravityConfig;
use nova_physics::engine::{build_rate_of_change, stable_dt, SspRk2, TimeIntegrator};
use nova_physics::model::equilibrium::{Equilibrium, IsentropicEquilibrium};
use nova_physics::model::euler::{EnthalpyEntropy, EulerVar, IdealGasEos};
use nova_physics::model::gravity::{ConstantGravity, PointMassGravity};
use nova_physics::AllVariables;

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（JSON），缺省用默认配置
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖配置的网格分辨率
    #[arg(short, long)]
    pub resolution: Option<usize>,

    /// 覆盖配置的终止时间
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,

    /// 高斯密度扰动幅值（相对背景）
    #[arg(long, default_value = "0.0")]
    pub bump: f64,

    /// 大气参考比焓
    #[arg(long, default_value = "3.5")]
    pub enthalpy: f64,

    /// 大气熵常数 K = p/ρ^γ
    #[arg(long, default_value = "0.8")]
    pub entropy: f64,

    /// 日志输出的间隔步数
    #[arg(long, default_value = "10")]
    pub report_every: usize,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== NovaHydro 模拟启动 ===");

    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(n) = args.resolution {
        config.mesh_resolution = n;
    }
    if let Some(t) = args.end_time {
        config.t_end = t;
    }
    config.validate().context("配置校验失败")?;

    let mesh = Arc::new(unit_square(config.mesh_resolution)?);
    info!(
        "网格: {} 单元, {} 面, 总面积 {:.6}",
        mesh.n_cells(),
        mesh.faces.len(),
        mesh.total_area()
    );

    let eos = IdealGasEos::new(config.gamma);
    let theta = EnthalpyEntropy::new(args.enthalpy, args.entropy);
    let mut state = initial_state(&mesh, &config.gravity, eos, theta, args.bump);
    for i in 0..mesh.n_cells() {
        for k in 0..config.n_tracers {
            state.set_tracer(i, k, mesh.cell_centers[i].x);
        }
    }

    let rate = build_rate_of_change(Arc::clone(&mesh), &config)?;
    let mut integrator = SspRk2::new(&state);

    let (mass0, energy0) = totals(&mesh, &state);
    info!("初始质量 {:.8}, 初始能量 {:.8}", mass0, energy0);

    let start = Instant::now();
    let mut t = 0.0;
    let mut n_steps = 0usize;
    while t < config.t_end {
        let dt = stable_dt(&mesh, &eos, &state, config.cfl).min(config.t_end - t);
        integrator.step(&mut state, rate.as_ref(), t, dt)?;
        t += dt;
        n_steps += 1;

        if n_steps % args.report_every.max(1) == 0 {
            let (mass, energy) = totals(&mesh, &state);
            info!(
                "t={:.5} dt={:.2e}: Δ质量={:.2e}, Δ能量={:.2e}",
                t,
                dt,
                (mass - mass0).abs(),
                (energy - energy0).abs()
            );
        }
    }

    let (mass, energy) = totals(&mesh, &state);
    info!("=== 模拟完成 ===");
    info!("总步数: {}", n_steps);
    info!("计算时间: {:.2} s", start.elapsed().as_secs_f64());
    info!(
        "质量守恒误差 {:.3e}, 能量守恒误差 {:.3e}",
        (mass - mass0).abs(),
        (energy - energy0).abs()
    );

    Ok(())
}

/// 等熵静力大气 + 可选高斯密度扰动
fn initial_state(
    mesh: &nova_mesh::TriMesh,
    gravity: &GravityConfig,
    eos: IdealGasEos,
    theta: EnthalpyEntropy,
    bump: f64,
) -> AllVariables {
    let mut state = AllVariables::zeros(mesh.n_cells(), 0);
    let fill = |state: &mut AllVariables, eq: &dyn Fn(DVec2) -> nova_physics::model::euler::RhoE| {
        for i in 0..mesh.n_cells() {
            let rho = mesh.volume_average(i, |p| eq(p).rho * (1.0 + bump_at(p, bump)));
            let e = mesh.volume_average(i, |p| eq(p).e);
            state.cvars[i] = EulerVar([rho, 0.0, 0.0, e]);
        }
    };

    match gravity {
        GravityConfig::Constant { g, direction } => {
            let gr = ConstantGravity {
                g: *g,
                direction: *direction,
            };
            let eq = IsentropicEquilibrium::new(eos, gr);
            fill(&mut state, &|p| eq.extrapolate(theta, DVec2::ZERO, p));
        }
        GravityConfig::PointMass { gm, center, softening } => {
            let gr = PointMassGravity {
                gm: *gm,
                center: *center,
                softening: *softening,
            };
            let eq = IsentropicEquilibrium::new(eos, gr);
            fill(&mut state, &|p| eq.extrapolate(theta, DVec2::ZERO, p));
        }
    }
    state
}

#[inline]
fn bump_at(p: DVec2, amplitude: f64) -> f64 {
    let d = p - DVec2::new(0.5, 0.5);
    amplitude * (-50.0 * d.length_squared()).exp()
}

/// 面积加权的总质量与总能量
fn totals(mesh: &nova_mesh::TriMesh, state: &AllVariables) -> (f64, f64) {
    let mut mass = 0.0;
    let mut energy = 0.0;
    for (i, u) in state.cvars.iter().enumerate() {
        mass += mesh.areas[i] * u.rho();
        energy += mesh.areas[i] * u.energy();
    }
    (mass, energy)
}

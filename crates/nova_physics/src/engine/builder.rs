// crates/nova_physics/src/engine/builder.rs

//! 按配置组装右端项
//!
//! 平衡态与重力场都是泛型参数，配置里的 (良平衡模式 × 重力场形)
//! 组合在这里一次性单态化，之后通过 `Box<dyn RateOfChange>` 使用。

use std::sync::Arc;

use parking_lot::RwLock;

use nova_foundation::NovaResult;
use nova_mesh::TriMesh;

use crate::config::{GravityConfig, SolverConfig};
use crate::model::equilibrium::{Equilibrium, IsentropicEquilibrium, NoEquilibrium};
use crate::model::euler::IdealGasEos;
use crate::model::gravity::{ConstantGravity, Gravity, PointMassGravity};
use crate::reconstruction::config::WellBalancing;
use crate::reconstruction::GlobalReconstruction;

use super::rhs::{FluxLoop, GravitySourceLoop, RateOfChange, SumOfRates};

/// 按配置构造完整的半离散右端项（通量 + 重力源）
pub fn build_rate_of_change(
    mesh: Arc<TriMesh>,
    config: &SolverConfig,
) -> NovaResult<Box<dyn RateOfChange>> {
    let eos = IdealGasEos::new(config.gamma);
    match (config.reconstruction.well_balancing, &config.gravity) {
        (WellBalancing::Isentropic, GravityConfig::Constant { g, direction }) => {
            let gravity = ConstantGravity {
                g: *g,
                direction: *direction,
            };
            let eq = IsentropicEquilibrium::new(eos, gravity);
            assemble(mesh, config, eos, eq, gravity)
        }
        (WellBalancing::Isentropic, GravityConfig::PointMass { gm, center, softening }) => {
            let gravity = PointMassGravity {
                gm: *gm,
                center: *center,
                softening: *softening,
            };
            let eq = IsentropicEquilibrium::new(eos, gravity);
            assemble(mesh, config, eos, eq, gravity)
        }
        (WellBalancing::Naive, GravityConfig::Constant { g, direction }) => {
            let gravity = ConstantGravity {
                g: *g,
                direction: *direction,
            };
            assemble(mesh, config, eos, NoEquilibrium, gravity)
        }
        (WellBalancing::Naive, GravityConfig::PointMass { gm, center, softening }) => {
            let gravity = PointMassGravity {
                gm: *gm,
                center: *center,
                softening: *softening,
            };
            assemble(mesh, config, eos, NoEquilibrium, gravity)
        }
    }
}

fn assemble<E: Equilibrium, G: Gravity>(
    mesh: Arc<TriMesh>,
    config: &SolverConfig,
    eos: IdealGasEos,
    equilibrium: E,
    gravity: G,
) -> NovaResult<Box<dyn RateOfChange>> {
    let recon = GlobalReconstruction::new(
        Arc::clone(&mesh),
        &config.reconstruction,
        equilibrium,
        eos,
        config.scaling,
    )?;
    let recon = Arc::new(RwLock::new(recon));

    // 通量项在前：它负责刷新共享重构，源项只读复用
    let flux = FluxLoop::new(Arc::clone(&mesh), eos, Arc::clone(&recon));
    let source = GravitySourceLoop::new(mesh, eos, gravity, recon);
    Ok(Box::new(SumOfRates::new(vec![
        Box::new(flux),
        Box::new(source),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AllVariables;
    use nova_mesh::unit_square;

    #[test]
    fn test_build_and_compute_uniform_state() {
        let mesh = Arc::new(unit_square(4).unwrap());
        let config = SolverConfig::default();
        let rate = build_rate_of_change(Arc::clone(&mesh), &config).unwrap();

        let mut state = AllVariables::zeros(mesh.n_cells(), 0);
        for u in state.cvars.iter_mut() {
            *u = crate::model::euler::EulerVar([1.0, 0.0, 0.0, 2.5]);
        }
        let mut tendency = AllVariables::zeros(mesh.n_cells(), 0);
        rate.compute(&mut tendency, &state, 0.0).unwrap();
        for du in &tendency.cvars {
            assert!(du.max_abs().is_finite(), "变化率应当有限");
        }
    }

    #[test]
    fn test_build_naive_point_mass() {
        let mesh = Arc::new(unit_square(3).unwrap());
        let mut config = SolverConfig::default();
        config.reconstruction.well_balancing = WellBalancing::Naive;
        config.gravity = GravityConfig::PointMass {
            gm: 1.0,
            center: glam::DVec2::new(0.5, 0.5),
            softening: 1e-3,
        };
        build_rate_of_change(mesh, &config).unwrap();
    }
}

// crates/nova_physics/src/model/mod.rs

//! 物理模型
//!
//! Euler 变量与理想气体 EOS、重力场、等熵平衡态以及特征尺度。
//! EOS 只通过一组封闭的转换接口被使用：压力、声速、(h, K) 正反变换。

pub mod equilibrium;
pub mod euler;
pub mod gravity;
pub mod scaling;

pub use equilibrium::{Equilibrium, IsentropicEquilibrium, LocalEquilibrium, NoEquilibrium};
pub use euler::{EnthalpyEntropy, EulerVar, IdealGasEos, RhoE, N_CVARS};
pub use gravity::{ConstantGravity, Gravity, PointMassGravity};
pub use scaling::Scaling;

// crates/nova_physics/src/engine/mod.rs

//! 求解引擎
//!
//! 把重构接到半离散右端项上，并做显式时间推进。
//!
//! - [`rhs`]: `RateOfChange` 接口、通量回路与重力源项
//! - [`time_integration`]: 前向 Euler 与 SSP-RK2、CFL 步长
//! - [`builder`]: 按配置在 (良平衡 × 重力) 组合上单态化求解器

pub mod builder;
pub mod rhs;
pub mod time_integration;

pub use builder::build_rate_of_change;
pub use rhs::{FluxLoop, GravitySourceLoop, RateOfChange, SumOfRates};
pub use time_integration::{stable_dt, ForwardEuler, SspRk2, TimeIntegrator};

// crates/nova_physics/src/reconstruction/mod.rs

//! 高阶重构核心
//!
//! 逐单元的自适应阶 WENO 重构（WENO-AO / CWENO-AO），带良平衡
//! 背景分解。流水线：
//!
//! 1. [`stencil`] / [`stencil_family`]: 几何模板搜索与阶数推断
//! 2. [`lsq`]: 矩修正单项式基上的最小二乘拟合
//! 3. [`weno`]: 线性权重 + ENO 非线性混合
//! 4. [`local`] / [`global`]: 平衡态背景、缓存与重算策略、全场编排
//!
//! 其余为支撑件：[`poly`] 多项式表示、[`few_points_cache`] 求积点上的
//! 背景点值缓存、[`config`] 配置与校验。

pub mod config;
pub mod few_points_cache;
pub mod global;
pub mod local;
pub mod lsq;
pub mod poly;
pub mod stencil;
pub mod stencil_family;
pub mod weno;

pub use config::ReconstructionConfig;
pub use global::GlobalReconstruction;
pub use local::LocalReconstruction;
pub use poly::{Poly2d, PolyFrame, MAX_DEGREE, N_COEFFS};
pub use stencil::{Stencil, StencilBias};
pub use stencil_family::StencilFamily;
pub use weno::{HybridWeno, HybridizeMode};

// crates/nova_mesh/src/lib.rs

//! NovaHydro 网格层
//!
//! 提供重构与通量计算所需的只读网格数据结构。
//!
//! # 模块概览
//!
//! - [`quadrature`]: 三角形与线段上的求积规则（最高 5 阶精确）
//! - [`moments`]: 归一化几何矩（至 4 次单项式）与多项式索引映射
//! - [`frozen`]: 只读 SoA 三角网格 [`frozen::TriMesh`]
//! - [`generation`]: 结构化单位正方形三角网格生成（测试与 CLI 用）
//!
//! # 设计要点
//!
//! 1. **SoA布局**: 单元/面数据按属性分数组存放
//! 2. **只读**: 构造后不可修改，可在线程间共享
//! 3. **预计算**: 求积点、几何矩、特征长度在构造期一次算好

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frozen;
pub mod generation;
pub mod moments;
pub mod quadrature;

pub use frozen::{Face, TriMesh};
pub use generation::unit_square;
pub use moments::{poly_dof, poly_index, MAX_MOMENT_DEGREE, N_MOMENTS};

// crates/nova_physics/src/lib.rs

//! NovaHydro 物理核心层
//!
//! 可压缩 Euler 方程的有限体积求解核心，重点是保持静力平衡态的
//! 高阶 WENO 重构。
//!
//! # 模块概览
//!
//! - [`model`]: Euler 变量、理想气体 EOS、重力场、等熵平衡态
//! - [`reconstruction`]: 模板搜索、最小二乘拟合、WENO 杂交、
//!   局部/全局重构与背景缓存
//! - [`state`]: 守恒量 + 示踪剂的全场状态
//! - [`engine`]: 通量/源项回路与时间推进
//! - [`config`]: 求解器配置（serde）
//!
//! # 良平衡思路
//!
//! 每个单元维护一个局部等熵平衡态背景。重构作用在
//! `(u - 背景)/尺度` 的扰动场上，点值为 `背景(x) + 尺度 ⊙ 扰动(x)`。
//! 背景精确满足静力平衡时扰动恒为零，静态大气可保持到舍入误差。

#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod model;
pub mod reconstruction;
pub mod state;

pub use config::{ReconstructionConfig, SolverConfig};
pub use state::AllVariables;

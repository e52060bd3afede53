// crates/nova_physics/src/config.rs

//! 求解器配置
//!
//! 整个求解器的 serde 配置面。所有字段带默认值，缺省的 JSON 字段
//! 按默认补全；`validate` 在组装求解器之前执行。

use glam::DVec2;
use serde::{Deserialize, Serialize};

use nova_foundation::{ensure, NovaError, NovaResult};

use crate::model::scaling::Scaling;

pub use crate::reconstruction::config::{ReconstructionConfig, WellBalancing};

/// 重力场配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GravityConfig {
    /// 匀强重力
    Constant {
        /// 加速度大小
        g: f64,
        /// 势增长方向（单位向量）
        direction: DVec2,
    },
    /// 点质量重力
    PointMass {
        /// G·M
        gm: f64,
        /// 质心位置
        center: DVec2,
        /// 软化半径
        softening: f64,
    },
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self::Constant {
            g: 1.0,
            direction: DVec2::Y,
        }
    }
}

/// 求解器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// 绝热指数
    pub gamma: f64,
    /// 重力场
    pub gravity: GravityConfig,
    /// CFL 数
    pub cfl: f64,
    /// 终止时间
    pub t_end: f64,
    /// 单位正方形网格每边的分段数
    pub mesh_resolution: usize,
    /// 示踪剂个数
    pub n_tracers: usize,
    /// 扰动场尺度选择
    pub scaling: Scaling,
    /// 重构配置
    pub reconstruction: ReconstructionConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 1.4,
            gravity: GravityConfig::default(),
            cfl: 0.45,
            t_end: 0.1,
            mesh_resolution: 16,
            n_tracers: 0,
            scaling: Scaling::Euler,
            reconstruction: ReconstructionConfig::default(),
        }
    }
}

impl SolverConfig {
    /// 校验配置
    pub fn validate(&self) -> NovaResult<()> {
        ensure!(self.gamma > 1.0, NovaError::config("gamma 必须 > 1"));
        NovaError::check_range("cfl", self.cfl, 0.0, 1.0)?;
        ensure!(self.t_end >= 0.0, NovaError::config("t_end 必须非负"));
        ensure!(
            self.mesh_resolution >= 1,
            NovaError::config("mesh_resolution 必须 >= 1")
        );
        if let GravityConfig::Constant { direction, .. } = self.gravity {
            ensure!(
                (direction.length() - 1.0).abs() < 1e-10,
                NovaError::config("重力方向必须是单位向量")
            );
        }
        self.reconstruction.validate()?;
        Ok(())
    }
}

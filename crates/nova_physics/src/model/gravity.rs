// crates/nova_physics/src/model/gravity.rs

//! 重力场
//!
//! 平衡态与源项只通过势 `φ` 和梯度 `∇φ` 使用重力，
//! 具体场形对上层不可见。

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 重力势接口
pub trait Gravity: Clone + Send + Sync + 'static {
    /// 重力势 φ(x)
    fn phi(&self, x: DVec2) -> f64;

    /// 势梯度 ∇φ(x)
    fn grad_phi(&self, x: DVec2) -> DVec2;
}

/// 匀强重力，势 `φ = g · (x - x₀) · dir`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstantGravity {
    /// 重力加速度大小
    pub g: f64,
    /// 势增长方向（单位向量，通常指向“上”）
    pub direction: DVec2,
}

impl ConstantGravity {
    /// 沿 +y 方向增长的匀强势
    pub fn along_y(g: f64) -> Self {
        Self {
            g,
            direction: DVec2::Y,
        }
    }
}

impl Gravity for ConstantGravity {
    #[inline]
    fn phi(&self, x: DVec2) -> f64 {
        self.g * x.dot(self.direction)
    }

    #[inline]
    fn grad_phi(&self, _x: DVec2) -> DVec2 {
        self.direction * self.g
    }
}

/// 点质量重力，势 `φ = -G M / |x - x_c|`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointMassGravity {
    /// G·M
    pub gm: f64,
    /// 质心位置
    pub center: DVec2,
    /// 防奇异的软化半径
    pub softening: f64,
}

impl Gravity for PointMassGravity {
    #[inline]
    fn phi(&self, x: DVec2) -> f64 {
        let r = (x - self.center).length().max(self.softening);
        -self.gm / r
    }

    #[inline]
    fn grad_phi(&self, x: DVec2) -> DVec2 {
        let d = x - self.center;
        let r = d.length().max(self.softening);
        d * (self.gm / (r * r * r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_gravity() {
        let g = ConstantGravity::along_y(9.81);
        assert!((g.phi(DVec2::new(3.0, 2.0)) - 19.62).abs() < 1e-12);
        assert!((g.grad_phi(DVec2::ZERO) - DVec2::new(0.0, 9.81)).length() < 1e-14);
    }

    #[test]
    fn test_point_mass_gradient_matches_fd() {
        let g = PointMassGravity {
            gm: 2.0,
            center: DVec2::new(0.5, 0.5),
            softening: 1e-6,
        };
        let x = DVec2::new(1.3, 0.9);
        let eps = 1e-6;
        let fd = DVec2::new(
            (g.phi(x + DVec2::X * eps) - g.phi(x - DVec2::X * eps)) / (2.0 * eps),
            (g.phi(x + DVec2::Y * eps) - g.phi(x - DVec2::Y * eps)) / (2.0 * eps),
        );
        assert!((g.grad_phi(x) - fd).length() < 1e-6);
    }
}

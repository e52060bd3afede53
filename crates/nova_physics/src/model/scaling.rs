// crates/nova_physics/src/model/scaling.rs

//! 特征尺度
//!
//! 重构作用在无量纲化的扰动场上。尺度向量由单元平均状态导出，
//! 逐分量除/乘。

use serde::{Deserialize, Serialize};

use super::euler::{EulerVar, IdealGasEos};

/// 扰动场的无量纲化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Euler 特征尺度 `(ρ, ρa, ρa, E)`
    Euler,
    /// 不缩放
    Unity,
}

impl Scaling {
    /// 由参考状态计算尺度向量
    #[inline]
    pub fn scale(&self, eos: &IdealGasEos, u: &EulerVar) -> EulerVar {
        match self {
            Scaling::Unity => EulerVar([1.0, 1.0, 1.0, 1.0]),
            Scaling::Euler => {
                let rho = u.rho();
                let a = eos.sound_speed(u);
                EulerVar([rho, rho * a, rho * a, u.energy()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity() {
        let eos = IdealGasEos::new(1.4);
        let u = EulerVar([2.0, 0.1, 0.2, 5.0]);
        let s = Scaling::Unity.scale(&eos, &u);
        assert_eq!(s, EulerVar([1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_euler_scale_positive() {
        let eos = IdealGasEos::new(1.4);
        let u = EulerVar([1.0, 0.0, 0.0, 2.5]);
        let s = Scaling::Euler.scale(&eos, &u);
        assert!((s.rho() - 1.0).abs() < 1e-14);
        assert!((s.energy() - 2.5).abs() < 1e-14);
        assert!((s.mx() - 1.4_f64.sqrt()).abs() < 1e-14);
        assert!(s.mx() > 0.0 && s.my() > 0.0);
    }
}

// crates/nova_physics/src/model/euler.rs

//! Euler 变量与理想气体状态方程
//!
//! 守恒量排列为 `(ρ, ρu, ρv, E)`。平衡态子空间只涉及 `(ρ, E)`，
//! 用 [`RhoE`] 单独表示；等熵平衡态的参数空间是比焓与熵常数
//! `(h, K)`，见 [`EnthalpyEntropy`]。

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 守恒变量个数
pub const N_CVARS: usize = 4;

/// Euler 守恒变量 `(ρ, ρu, ρv, E)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerVar(pub [f64; N_CVARS]);

impl EulerVar {
    /// 零值
    pub const ZERO: Self = Self([0.0; N_CVARS]);

    /// 密度
    #[inline]
    pub fn rho(&self) -> f64 {
        self.0[0]
    }

    /// x 方向动量密度
    #[inline]
    pub fn mx(&self) -> f64 {
        self.0[1]
    }

    /// y 方向动量密度
    #[inline]
    pub fn my(&self) -> f64 {
        self.0[2]
    }

    /// 总能量密度
    #[inline]
    pub fn energy(&self) -> f64 {
        self.0[3]
    }

    /// 动能密度
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * (self.mx() * self.mx() + self.my() * self.my()) / self.rho()
    }

    /// 逐分量乘
    #[inline]
    pub fn component_mul(&self, rhs: &Self) -> Self {
        let mut out = [0.0; N_CVARS];
        for i in 0..N_CVARS {
            out[i] = self.0[i] * rhs.0[i];
        }
        Self(out)
    }

    /// 逐分量除
    #[inline]
    pub fn component_div(&self, rhs: &Self) -> Self {
        let mut out = [0.0; N_CVARS];
        for i in 0..N_CVARS {
            out[i] = self.0[i] / rhs.0[i];
        }
        Self(out)
    }

    /// 分量绝对值的最大值
    #[inline]
    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0_f64, |m, &v| m.max(v.abs()))
    }
}

impl From<[f64; N_CVARS]> for EulerVar {
    fn from(v: [f64; N_CVARS]) -> Self {
        Self(v)
    }
}

impl Add for EulerVar {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for i in 0..N_CVARS {
            out[i] += rhs.0[i];
        }
        Self(out)
    }
}

impl Sub for EulerVar {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut out = self.0;
        for i in 0..N_CVARS {
            out[i] -= rhs.0[i];
        }
        Self(out)
    }
}

impl Neg for EulerVar {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.map(|v| -v))
    }
}

impl Mul<f64> for EulerVar {
    type Output = Self;
    #[inline]
    fn mul(self, s: f64) -> Self {
        Self(self.0.map(|v| v * s))
    }
}

impl Div<f64> for EulerVar {
    type Output = Self;
    #[inline]
    fn div(self, s: f64) -> Self {
        Self(self.0.map(|v| v / s))
    }
}

impl AddAssign for EulerVar {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..N_CVARS {
            self.0[i] += rhs.0[i];
        }
    }
}

// ============================================================================
// 平衡态子空间
// ============================================================================

/// 静止流体的 `(ρ, E)` 对，平衡态背景只作用在这两个分量上
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RhoE {
    /// 密度
    pub rho: f64,
    /// 内能密度（静止，无动能）
    pub e: f64,
}

impl RhoE {
    /// 零值
    pub const ZERO: Self = Self { rho: 0.0, e: 0.0 };

    /// 构造
    #[inline]
    pub fn new(rho: f64, e: f64) -> Self {
        Self { rho, e }
    }

    /// 嵌入完整守恒变量（动量为零）
    #[inline]
    pub fn to_euler(self) -> EulerVar {
        EulerVar([self.rho, 0.0, 0.0, self.e])
    }
}

impl Add for RhoE {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.rho + rhs.rho, self.e + rhs.e)
    }
}

impl Sub for RhoE {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.rho - rhs.rho, self.e - rhs.e)
    }
}

impl Mul<f64> for RhoE {
    type Output = Self;
    #[inline]
    fn mul(self, s: f64) -> Self {
        Self::new(self.rho * s, self.e * s)
    }
}

/// 等熵平衡态参数 `(h, K)`：比焓与熵常数 `K = p/ρ^γ`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnthalpyEntropy {
    /// 比焓
    pub h: f64,
    /// 熵常数 K = p/ρ^γ
    pub k: f64,
}

impl EnthalpyEntropy {
    /// 构造
    #[inline]
    pub fn new(h: f64, k: f64) -> Self {
        Self { h, k }
    }
}

// ============================================================================
// 理想气体 EOS
// ============================================================================

/// 理想气体状态方程 `p = (γ-1) ρ e_int`
///
/// 下游只使用这里的一组封闭转换，不直接触碰 γ。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealGasEos {
    /// 绝热指数
    pub gamma: f64,
}

impl IdealGasEos {
    /// 构造
    #[inline]
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// 压力（扣除动能）
    #[inline]
    pub fn pressure(&self, u: &EulerVar) -> f64 {
        (self.gamma - 1.0) * (u.energy() - u.kinetic_energy())
    }

    /// 静止流体的压力
    #[inline]
    pub fn pressure_rhoe(&self, re: RhoE) -> f64 {
        (self.gamma - 1.0) * re.e
    }

    /// 声速
    #[inline]
    pub fn sound_speed(&self, u: &EulerVar) -> f64 {
        (self.gamma * self.pressure(u) / u.rho()).sqrt()
    }

    /// 静止流体 (ρ, E) → (h, K)
    ///
    /// `h = γ p / ((γ-1) ρ)`，`K = p / ρ^γ`。
    #[inline]
    pub fn enthalpy_entropy(&self, re: RhoE) -> EnthalpyEntropy {
        let p = self.pressure_rhoe(re);
        let h = self.gamma * p / ((self.gamma - 1.0) * re.rho);
        let k = p / re.rho.powf(self.gamma);
        EnthalpyEntropy::new(h, k)
    }

    /// (h, K) → 静止流体 (ρ, E)，[`Self::enthalpy_entropy`] 的逆
    #[inline]
    pub fn rhoe(&self, theta: EnthalpyEntropy) -> RhoE {
        let gm1 = self.gamma - 1.0;
        let rho = (gm1 / self.gamma * theta.h / theta.k).powf(1.0 / gm1);
        let p = theta.k * rho.powf(self.gamma);
        RhoE::new(rho, p / gm1)
    }
}

// crates/nova_physics/src/state.rs

//! 全场状态
//!
//! 守恒变量数组加按行排布的示踪剂数组。重构通过 [`StateAccess`]
//! 读取状态，不依赖具体存储布局。

use serde::{Deserialize, Serialize};

use crate::model::euler::EulerVar;

/// 状态读取接口
///
/// 重构模块只需要按单元读平均值，这里抽象出最小接口。
pub trait StateAccess: Sync {
    /// 单元守恒量平均
    fn conserved(&self, cell: usize) -> EulerVar;

    /// 单元第 k 个示踪剂平均
    fn tracer(&self, cell: usize, k: usize) -> f64;

    /// 示踪剂个数
    fn n_tracers(&self) -> usize;
}

/// 守恒量 + 示踪剂的全场状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllVariables {
    /// 单元守恒量平均
    pub cvars: Vec<EulerVar>,
    /// 示踪剂平均，行主序 `[cell * n_avars + k]`
    pub avars: Vec<f64>,
    /// 每单元示踪剂个数
    pub n_avars: usize,
}

impl AllVariables {
    /// 全零状态
    pub fn zeros(n_cells: usize, n_avars: usize) -> Self {
        Self {
            cvars: vec![EulerVar::ZERO; n_cells],
            avars: vec![0.0; n_cells * n_avars],
            n_avars,
        }
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cvars.len()
    }

    /// 写入示踪剂
    #[inline]
    pub fn set_tracer(&mut self, cell: usize, k: usize, value: f64) {
        self.avars[cell * self.n_avars + k] = value;
    }

    /// 全部清零
    pub fn fill_zero(&mut self) {
        self.cvars.fill(EulerVar::ZERO);
        self.avars.fill(0.0);
    }

    /// `self += a * other`，时间推进用
    pub fn scaled_add(&mut self, a: f64, other: &Self) {
        debug_assert_eq!(self.cvars.len(), other.cvars.len());
        for (u, v) in self.cvars.iter_mut().zip(&other.cvars) {
            *u += *v * a;
        }
        for (q, r) in self.avars.iter_mut().zip(&other.avars) {
            *q += a * r;
        }
    }

    /// `self = c0 * self + c1 * other`，SSP-RK 的凸组合
    pub fn convex_combine(&mut self, c0: f64, c1: f64, other: &Self) {
        debug_assert_eq!(self.cvars.len(), other.cvars.len());
        for (u, v) in self.cvars.iter_mut().zip(&other.cvars) {
            *u = *u * c0 + *v * c1;
        }
        for (q, r) in self.avars.iter_mut().zip(&other.avars) {
            *q = c0 * *q + c1 * r;
        }
    }
}

impl StateAccess for AllVariables {
    #[inline]
    fn conserved(&self, cell: usize) -> EulerVar {
        self.cvars[cell]
    }

    #[inline]
    fn tracer(&self, cell: usize, k: usize) -> f64 {
        self.avars[cell * self.n_avars + k]
    }

    #[inline]
    fn n_tracers(&self) -> usize {
        self.n_avars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_layout() {
        let s = AllVariables::zeros(5, 2);
        assert_eq!(s.n_cells(), 5);
        assert_eq!(s.avars.len(), 10);
        assert_eq!(s.tracer(4, 1), 0.0);
    }

    #[test]
    fn test_scaled_add() {
        let mut a = AllVariables::zeros(2, 1);
        let mut b = AllVariables::zeros(2, 1);
        b.cvars[0] = EulerVar([1.0, 2.0, 3.0, 4.0]);
        b.set_tracer(1, 0, 2.0);
        a.scaled_add(0.5, &b);
        assert!((a.cvars[0].mx() - 1.0).abs() < 1e-15);
        assert!((a.tracer(1, 0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_convex_combine() {
        let mut a = AllVariables::zeros(1, 0);
        let mut b = AllVariables::zeros(1, 0);
        a.cvars[0] = EulerVar([2.0, 0.0, 0.0, 2.0]);
        b.cvars[0] = EulerVar([4.0, 0.0, 0.0, 4.0]);
        a.convex_combine(0.5, 0.5, &b);
        assert!((a.cvars[0].rho() - 3.0).abs() < 1e-15);
    }
}

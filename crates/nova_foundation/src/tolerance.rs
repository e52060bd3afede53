// crates/nova_foundation/src/tolerance.rs

//! 数值容差常量
//!
//! 集中管理跨模块共用的数值阈值，避免魔法数字散落在各处。
//! 这些值是算法契约的一部分：改动会影响重构与平衡态求解的可复现性。

/// 平衡态拟牛顿迭代的相对收敛容差（逐分量，相对初始猜测）
pub const EQUILIBRIUM_RTOL: f64 = 1e-13;

/// 平衡态拟牛顿迭代的最大迭代次数
pub const EQUILIBRIUM_MAX_ITERS: usize = 20;

/// 对称差分雅可比的相对步长
pub const JACOBIAN_FD_REL_STEP: f64 = 1e-6;

/// 点缓存投影的分离判据：最小间距须大于 `span / SEPARATION_FACTOR`
pub const CACHE_SEPARATION_FACTOR: f64 = 1e5;

/// 点缓存查询的绝对容差系数（乘以投影跨度）
pub const CACHE_HIT_RTOL: f64 = 1e-10;

/// CWENO 中心线性权重的最小允许值（归一化后）
pub const CWENO_MIN_CENTRAL_WEIGHT: f64 = 1e-12;

/// 安全除法阈值
pub const SAFE_DIV: f64 = 1e-14;

/// 权重归一化后求和的校验容差
pub const WEIGHT_SUM_TOL: f64 = 1e-12;

/// 判断分母是否可安全用于除法
#[inline]
pub fn is_divisor_safe(d: f64) -> bool {
    d.abs() >= SAFE_DIV
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_safe() {
        assert!(is_divisor_safe(1.0));
        assert!(is_divisor_safe(-1e-10));
        assert!(!is_divisor_safe(1e-15));
        assert!(!is_divisor_safe(0.0));
    }

    #[test]
    fn test_tolerance_ordering() {
        // 查询容差必须远小于分离判据，否则缓存命中会产生歧义
        assert!(CACHE_HIT_RTOL < 1.0 / CACHE_SEPARATION_FACTOR);
    }
}

// crates/nova_mesh/src/moments.rs

//! 归一化几何矩与单项式索引映射
//!
//! 重构多项式以形心为基点、以特征长度归一化的单项式展开。
//! 本模块定义单项式的线性索引约定，并计算每个单元的归一化矩
//!
//! ```text
//! m_{ab} = (1/|Ω|) ∫_Ω ((x-x_c)/l)^a ((y-y_c)/l)^b dΩ
//! ```
//!
//! 矩数组的布局与多项式系数布局一致：按总次数分组，组内按 y 次数
//! 递增，即 `poly_index(a, b) = (a+b)(a+b+1)/2 + b`。

use glam::DVec2;

use crate::quadrature::{triangle_rule, TriangleRule};

/// 支持的最高单项式次数
pub const MAX_MOMENT_DEGREE: usize = 4;

/// 矩数组长度 = poly_dof(MAX_MOMENT_DEGREE)
pub const N_MOMENTS: usize = 15;

/// 次数不超过 `deg` 的二元单项式个数
#[inline]
pub const fn poly_dof(deg: usize) -> usize {
    (deg + 1) * (deg + 2) / 2
}

/// 单项式 x^a y^b 的线性索引
#[inline]
pub const fn poly_index(a: usize, b: usize) -> usize {
    let d = a + b;
    d * (d + 1) / 2 + b
}

/// 线性索引对应的指数对 (a, b)，与 [`poly_index`] 互逆
pub const MOMENT_EXPONENTS: [(usize, usize); N_MOMENTS] = [
    (0, 0),
    (1, 0),
    (0, 1),
    (2, 0),
    (1, 1),
    (0, 2),
    (3, 0),
    (2, 1),
    (1, 2),
    (0, 3),
    (4, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 4),
];

/// 线性索引对应的单项式总次数
#[inline]
pub fn poly_degree(k: usize) -> usize {
    let (a, b) = MOMENT_EXPONENTS[k];
    a + b
}

/// 计算三角形 (a, b, c) 关于 (center, length) 的归一化矩
///
/// 使用 5 阶精确的求积规则，对 4 次以内的单项式是精确的。
/// `moments[0]` 恒为 1。
pub fn normalized_moments(
    a: DVec2,
    b: DVec2,
    c: DVec2,
    center: DVec2,
    length: f64,
) -> [f64; N_MOMENTS] {
    // MAX_MOMENT_DEGREE <= 5，规则表里必然存在
    let rule: TriangleRule = triangle_rule(5).unwrap();

    let mut m = [0.0; N_MOMENTS];
    for (bc, &w) in rule.points.iter().zip(rule.weights) {
        let p = a * bc[0] + b * bc[1] + c * bc[2];
        let xi = (p - center) / length;
        for (k, &(pa, pb)) in MOMENT_EXPONENTS.iter().enumerate() {
            m[k] += w * xi.x.powi(pa as i32) * xi.y.powi(pb as i32);
        }
    }
    m[0] = 1.0;
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_dof() {
        assert_eq!(poly_dof(0), 1);
        assert_eq!(poly_dof(1), 3);
        assert_eq!(poly_dof(2), 6);
        assert_eq!(poly_dof(3), 10);
        assert_eq!(poly_dof(4), 15);
    }

    #[test]
    fn test_poly_index_roundtrip() {
        for (k, &(a, b)) in MOMENT_EXPONENTS.iter().enumerate() {
            assert_eq!(poly_index(a, b), k, "指数对 ({a},{b})");
        }
    }

    #[test]
    fn test_first_moments_vanish_at_centroid() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(2.0, 0.3);
        let c = DVec2::new(0.5, 1.7);
        let centroid = (a + b + c) / 3.0;
        let m = normalized_moments(a, b, c, centroid, 1.0);
        assert!((m[0] - 1.0).abs() < 1e-15);
        // 关于形心的一阶矩为零
        assert!(m[poly_index(1, 0)].abs() < 1e-14);
        assert!(m[poly_index(0, 1)].abs() < 1e-14);
    }

    #[test]
    fn test_length_scaling() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 0.0);
        let c = DVec2::new(0.0, 1.0);
        let centroid = (a + b + c) / 3.0;
        let m1 = normalized_moments(a, b, c, centroid, 1.0);
        let m2 = normalized_moments(a, b, c, centroid, 2.0);
        // 二阶矩随 1/l² 缩放
        let k = poly_index(2, 0);
        assert!((m1[k] / m2[k] - 4.0).abs() < 1e-12);
    }
}

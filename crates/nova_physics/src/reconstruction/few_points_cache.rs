// crates/nova_physics/src/reconstruction/few_points_cache.rs

//! 少量点上的值缓存
//!
//! 单元的背景点值只会在固定的几个求积点被查询。把点集投影到一条
//! 合适的方向上做一维排序，查询退化为带容差的二分查找。
//!
//! 方向从固定的候选表里挑选：要求投影后任意两点的最小间距大于
//! 跨度的 1e-5 倍，保证查询容差内的命中唯一。候选方向是一组固定的
//! 伪随机向量，属于可调参数而非接口契约；全部失败才是致命错误。
//!
//! 查询未命中返回 `None`，调用方回退到直接求值。

use glam::DVec2;

use nova_foundation::tolerance::{CACHE_HIT_RTOL, CACHE_SEPARATION_FACTOR};
use nova_foundation::{NovaError, NovaResult};

/// 候选投影方向（无需单位化，分离判据与查询容差同尺度）
const DIRECTIONS: [DVec2; 10] = [
    DVec2::new(0.935_172, 0.354_174),
    DVec2::new(-0.421_893, 0.906_641),
    DVec2::new(0.137_442, -0.990_510),
    DVec2::new(0.778_253, -0.627_953),
    DVec2::new(-0.964_810, -0.262_936),
    DVec2::new(0.569_714, 0.821_843),
    DVec2::new(-0.297_152, -0.954_835),
    DVec2::new(0.991_420, -0.130_716),
    DVec2::new(-0.683_215, 0.730_218),
    DVec2::new(0.215_908, 0.976_406),
];

/// 固定点集上的值缓存
#[derive(Debug, Clone)]
pub struct FewPointsCache<V> {
    points: Vec<DVec2>,
    dir: DVec2,
    atol: f64,
    /// 升序投影键
    sorted_keys: Vec<f64>,
    /// 排序位置 → 原始点索引
    sorted_to_orig: Vec<usize>,
    values: Vec<V>,
}

impl<V: Clone> FewPointsCache<V> {
    /// 为点集挑选投影方向并建立索引，值由 [`Self::update`] 填充
    pub fn new(points: Vec<DVec2>, init: V) -> NovaResult<Self> {
        let n = points.len();
        if n == 0 {
            return Err(NovaError::invalid_input("点缓存的点集为空"));
        }

        for &dir in &DIRECTIONS {
            let mut keyed: Vec<(f64, usize)> = points
                .iter()
                .enumerate()
                .map(|(i, &p)| (dir.dot(p), i))
                .collect();
            keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

            let span = keyed[n - 1].0 - keyed[0].0;
            let separated = if n == 1 {
                true
            } else {
                let dx_min = keyed
                    .windows(2)
                    .map(|w| w[1].0 - w[0].0)
                    .fold(f64::MAX, f64::min);
                span > 0.0 && dx_min > span / CACHE_SEPARATION_FACTOR
            };
            if !separated {
                continue;
            }

            let atol = if n == 1 {
                CACHE_HIT_RTOL
            } else {
                CACHE_HIT_RTOL * span
            };
            return Ok(Self {
                values: vec![init; n],
                points,
                dir,
                atol,
                sorted_keys: keyed.iter().map(|&(k, _)| k).collect(),
                sorted_to_orig: keyed.iter().map(|&(_, i)| i).collect(),
            });
        }

        Err(NovaError::numerical(
            "点缓存找不到可分离的投影方向",
        ))
    }

    /// 点的数量
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空（构造保证非空）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 在全部点上重算值
    pub fn update(&mut self, mut f: impl FnMut(DVec2) -> V) {
        for (i, &p) in self.points.iter().enumerate() {
            self.values[i] = f(p);
        }
    }

    /// 查询 `x` 处的缓存值；不在点集内返回 `None`
    pub fn get(&self, x: DVec2) -> Option<&V> {
        let key = self.dir.dot(x);
        let idx = self
            .sorted_keys
            .partition_point(|&k| k < key - self.atol);
        if idx < self.sorted_keys.len() && (self.sorted_keys[idx] - key).abs() <= self.atol {
            Some(&self.values[self.sorted_to_orig[idx]])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<DVec2> {
        vec![
            DVec2::new(0.1, 0.2),
            DVec2::new(0.4, 0.15),
            DVec2::new(0.25, 0.6),
            DVec2::new(0.7, 0.45),
        ]
    }

    #[test]
    fn test_hit_returns_cached_value() {
        let pts = sample_points();
        let mut cache = FewPointsCache::new(pts.clone(), 0.0).unwrap();
        cache.update(|p| p.x + 10.0 * p.y);
        for &p in &pts {
            let got = cache.get(p).copied().unwrap();
            assert!((got - (p.x + 10.0 * p.y)).abs() < 1e-14);
        }
    }

    #[test]
    fn test_miss_returns_none() {
        let mut cache = FewPointsCache::new(sample_points(), 0.0).unwrap();
        cache.update(|p| p.x);
        assert!(cache.get(DVec2::new(0.9, 0.9)).is_none());
        assert!(cache.get(DVec2::new(0.11, 0.2)).is_none());
    }

    #[test]
    fn test_single_point() {
        let p = DVec2::new(0.3, 0.7);
        let mut cache = FewPointsCache::new(vec![p], 0).unwrap();
        cache.update(|_| 42);
        assert_eq!(cache.get(p).copied(), Some(42));
        assert!(cache.get(DVec2::new(0.5, 0.5)).is_none());
    }

    #[test]
    fn test_update_overwrites() {
        let pts = sample_points();
        let mut cache = FewPointsCache::new(pts.clone(), 0.0).unwrap();
        cache.update(|_| 1.0);
        cache.update(|_| 2.0);
        assert_eq!(cache.get(pts[2]).copied(), Some(2.0));
    }

    #[test]
    fn test_coincident_points_rejected() {
        // 两个重合点在任何方向上都不可分离
        let p = DVec2::new(0.5, 0.5);
        assert!(FewPointsCache::new(vec![p, p], 0.0).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(FewPointsCache::<f64>::new(vec![], 0.0).is_err());
    }
}

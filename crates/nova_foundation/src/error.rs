// crates/nova_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `NovaError` 枚举和 `NovaResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误类别，物理语义在调用处以消息表达
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **区分致命与降级**: 只有致命问题才构造错误；可降级的数值问题
//!    （如平衡态求解失败）由调用方记录日志并继续
//!
//! # 示例
//!
//! ```
//! use nova_foundation::error::{NovaError, NovaResult};
//!
//! fn read_config() -> NovaResult<()> {
//!     Err(NovaError::config("配置文件格式错误"))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type NovaResult<T> = Result<T, NovaError>;

/// NovaHydro 错误类型
///
/// 核心错误类型，用于整个项目。仅覆盖致命失败：构造期配置校验、
/// 网格拓扑缺陷、数值前置条件被破坏等。
#[derive(Error, Debug)]
pub enum NovaError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    // ========================================================================
    // 配置与数据校验
    // ========================================================================

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    // ========================================================================
    // 网格与数值
    // ========================================================================

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    Mesh {
        /// 具体错误信息
        message: String,
    },

    /// 数值前置条件被破坏
    #[error("数值错误: {message}")]
    Numerical {
        /// 具体错误信息
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl NovaError {
    /// 从IO错误创建
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 无效网格
    pub fn mesh(message: impl Into<String>) -> Self {
        Self::Mesh {
            message: message.into(),
        }
    }

    /// 数值错误
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl NovaError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> NovaResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> NovaResult<()> {
        if value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for NovaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NovaError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_io_error() {
        let err = NovaError::io("读取失败");
        assert!(err.to_string().contains("IO错误"));
    }

    #[test]
    fn test_size_mismatch() {
        let err = NovaError::size_mismatch("orders", 3, 4);
        assert!(err.to_string().contains("orders"));
        assert!(err.to_string().contains("3"));
        assert!(err.to_string().contains("4"));
    }

    #[test]
    fn test_check_size() {
        assert!(NovaError::check_size("test", 10, 10).is_ok());
        assert!(NovaError::check_size("test", 10, 5).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(NovaError::check_range("value", 5.0, 0.0, 10.0).is_ok());
        assert!(NovaError::check_range("value", -1.0, 0.0, 10.0).is_err());
        assert!(NovaError::check_range("value", 11.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let nova_err: NovaError = io_err.into();
        assert!(matches!(nova_err, NovaError::Io { .. }));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> NovaResult<()> {
            crate::ensure!(value > 0, NovaError::invalid_input("值必须为正"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }

    #[test]
    fn test_require_macro() {
        fn get_value(opt: Option<i32>) -> NovaResult<i32> {
            let v = crate::require!(opt, NovaError::invalid_input("缺少值"));
            Ok(v)
        }

        assert_eq!(get_value(Some(42)).unwrap(), 42);
        assert!(get_value(None).is_err());
    }
}

//! # tutor-predict - 学习保持与进度预测
//!
//! 本 crate 为辅导 CRM 提供无状态的预测引擎，根据学生各主题的掌握度记录输出:
//!
//! - **Retention** - 遗忘曲线估计与复习紧急度
//! - **Weakness** - 近期趋势模式 (下降、停滞、进展缓慢)
//! - **Forecast** - 截止日期时的整体掌握度与目标对比
//! - **Recommendation** - 下一次课程的重点主题排序
//!
//! ## 设计理念
//!
//! 本 crate 的设计目标:
//! - **纯函数** - 输出只取决于历史记录、配置和显式的 `as_of` 时间
//! - **可配置** - 所有阈值集中在 [`PredictionConfig`]
//! - **按主题隔离** - 单个主题的异常数据不会中断其他主题
//!
//! ## 模块结构
//!
//! - [`retention`] - 衰减模型 (紧急度分级、升级时间)
//! - [`weakness`] - 近期窗口趋势分类
//! - [`forecast`] - 按周速率外推到截止日期
//! - [`recommend`] - 排序与下一次课程组合
//! - [`engine`] - 组合后的 [`predict`] 调用
//! - [`regression`] - 最小二乘辅助函数
//! - [`sanitize`] - 输入校验
//! - [`config`] - 可调参数与加载
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use tutor_predict::{predict, History, PredictionConfig, TopicObservation};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 8, 16, 0, 0).unwrap();
//! let mut history = History::new();
//! history.insert(
//!     "fractions".to_string(),
//!     vec![TopicObservation {
//!         topic_id: "fractions".to_string(),
//!         timestamp: start,
//!         mastery: 72.0,
//!         session_minutes: 45.0,
//!     }],
//! );
//!
//! let as_of = start + Duration::days(10);
//! let report = predict(&history, 85.0, as_of + Duration::weeks(6), as_of, &PredictionConfig::default()).unwrap();
//! assert_eq!(report.recommendation.focus_topics, vec!["fractions".to_string()]);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod logging;
pub mod recommend;
pub mod regression;
pub mod retention;
pub mod sanitize;
pub mod types;
pub mod weakness;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use config::{AppConfig, PredictionConfig};
pub use engine::{aggregate_series, predict, PredictionRequest};
pub use error::{PredictError, PredictResult};
pub use forecast::forecast_progress;
pub use recommend::compose_recommendation;
pub use retention::predict_topic;
pub use weakness::analyze_topic;

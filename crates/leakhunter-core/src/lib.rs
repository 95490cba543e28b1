//! 行级泄露扫描核心库
//!
//! 设计要点：
//! - 规则集一次构建、整体校验（任何缺陷使加载整体失败），之后只读共享给所有 worker。
//! - 扫描引擎以有界任务通道作准入门：生产者在门满时阻塞，限制读入领先处理的程度。
//! - 泄露经多生产者通道汇入单一接收端（Result Sink），由其逐条独立序列化。

mod entropy;
mod findings;
mod options;
mod prefilter;
mod rules;
mod scan;
mod sink;

pub use entropy::shannon_entropy;
pub use findings::Leak;
pub use options::{ScanOptions, ScanStats};
pub use rules::{Config, ConfigError, Entropy, Rule, Whitelist};
pub use scan::{scan, ScanError};
pub use sink::{JsonSink, LeakSink};

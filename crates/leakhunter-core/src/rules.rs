//! 规则加载与编译（TOML）
//!
//! 配置里的数值字段（熵区间、捕获组号）以文本形态进入，在校验阶段
//! 统一解析；任何一条规则存在缺陷都会使整次加载失败，不产生部分
//! 规则集。

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::prefilter::PrefilterPlan;

/// 配置加载错误（启动前致命）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("problem loading config: cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("problem loading config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("problem loading config: invalid pattern in rule {rule:?}: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
    #[error("problem loading config: invalid whitelist pattern in rule {rule:?}: {source}")]
    InvalidWhitelistPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
    #[error("problem loading config: invalid entropy number {value:?} in rule {rule:?}")]
    InvalidEntropyNumber { rule: String, value: String },
    #[error("problem loading config: invalid entropy ranges in rule {rule:?}, must be within 0.0-8.0")]
    EntropyRangeOutOfBounds { rule: String },
    #[error("problem loading config: entropy min value cannot be higher than max value in rule {rule:?}")]
    EntropyMinExceedsMax { rule: String },
    #[error("problem loading config: entropy group cannot be higher than number of groups in regexp, rule {rule:?}")]
    EntropyGroupOutOfBounds { rule: String },
}

/// 白名单匹配器：命中整行或命中值即抑制一次泄露
#[derive(Debug)]
pub struct Whitelist {
    pub description: String,
    pub regex: Regex,
}

/// 熵区间：对指定捕获组的香农熵约束（group 0 为整个命中）
#[derive(Debug, Clone, PartialEq)]
pub struct Entropy {
    pub min: f64,
    pub max: f64,
    pub group: usize,
}

/// 单条检测规则（已编译）
#[derive(Debug)]
pub struct Rule {
    pub description: String,
    pub regex: Regex,
    pub tags: Vec<String>,
    /// 预筛关键词（可选）：非空时该规则仅对包含任一关键词的行求值
    pub keywords: Vec<String>,
    pub whitelist: Vec<Whitelist>,
    pub entropies: Vec<Entropy>,
}

/// 规则集：保持配置顺序，构建后不可变，可在所有 worker 间只读共享
#[derive(Debug)]
pub struct Config {
    pub rules: Vec<Rule>,
    pub(crate) prefilter: Option<PrefilterPlan>,
}

// 原始 TOML 形态
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    description: String,
    regex: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    whitelist: Vec<RawWhitelist>,
    #[serde(default)]
    entropies: Vec<RawEntropy>,
}

#[derive(Debug, Deserialize)]
struct RawWhitelist {
    #[serde(default)]
    description: String,
    regex: String,
}

#[derive(Debug, Deserialize)]
struct RawEntropy {
    min: String,
    max: String,
    #[serde(default)]
    group: Option<String>,
}

impl Config {
    /// 从 TOML 文本构建完整校验过的规则集
    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        let mut rules = Vec::with_capacity(raw.rules.len());
        for r in raw.rules {
            rules.push(compile_rule(r)?);
        }

        let prefilter = PrefilterPlan::build(&rules);
        Ok(Config { rules, prefilter })
    }

    /// 从文件路径读取并构建
    pub fn from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&content)
    }
}

/// 编译单条规则：主模式 → 白名单 → 熵区间，顺序固定
fn compile_rule(raw: RawRule) -> Result<Rule, ConfigError> {
    let regex = Regex::new(&raw.regex).map_err(|source| ConfigError::InvalidPattern {
        rule: raw.description.clone(),
        source,
    })?;

    let mut whitelist = Vec::with_capacity(raw.whitelist.len());
    for wl in raw.whitelist {
        let wl_regex =
            Regex::new(&wl.regex).map_err(|source| ConfigError::InvalidWhitelistPattern {
                rule: raw.description.clone(),
                source,
            })?;
        whitelist.push(Whitelist {
            description: wl.description,
            regex: wl_regex,
        });
    }

    let mut entropies = Vec::with_capacity(raw.entropies.len());
    for e in raw.entropies {
        entropies.push(compile_entropy(&raw.description, &regex, e)?);
    }

    Ok(Rule {
        description: raw.description,
        regex,
        tags: raw.tags,
        keywords: raw.keywords,
        whitelist,
        entropies,
    })
}

fn compile_entropy(rule: &str, regex: &Regex, raw: RawEntropy) -> Result<Entropy, ConfigError> {
    let min = parse_entropy_number(rule, &raw.min)?;
    let max = parse_entropy_number(rule, &raw.max)?;

    // group 缺省为 0（整个命中）；usize 解析天然拒绝负数
    let group_text = raw.group.as_deref().unwrap_or("0");
    let group: usize = group_text
        .parse()
        .map_err(|_| ConfigError::InvalidEntropyNumber {
            rule: rule.to_string(),
            value: group_text.to_string(),
        })?;

    // captures_len 含隐式的 group 0
    if group >= regex.captures_len() {
        return Err(ConfigError::EntropyGroupOutOfBounds {
            rule: rule.to_string(),
        });
    }
    if !(0.0..=8.0).contains(&min) || !(0.0..=8.0).contains(&max) {
        return Err(ConfigError::EntropyRangeOutOfBounds {
            rule: rule.to_string(),
        });
    }
    if min > max {
        return Err(ConfigError::EntropyMinExceedsMax {
            rule: rule.to_string(),
        });
    }

    Ok(Entropy { min, max, group })
}

fn parse_entropy_number(rule: &str, text: &str) -> Result<f64, ConfigError> {
    text.parse::<f64>()
        .map_err(|_| ConfigError::InvalidEntropyNumber {
            rule: rule.to_string(),
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_rules_in_source_order() {
        let cfg = Config::from_toml_str(
            r#"
            [[rules]]
            description = "AWS Key"
            regex = "AKIA[0-9A-Z]{16}"
            tags = ["key", "AWS"]

            [[rules]]
            description = "Slack Token"
            regex = "xox[baprs]-[0-9A-Za-z-]{10,48}"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rules.len(), 2);
        assert_eq!(cfg.rules[0].description, "AWS Key");
        assert_eq!(cfg.rules[0].tags, vec!["key", "AWS"]);
        assert_eq!(cfg.rules[1].description, "Slack Token");
        assert!(cfg.rules[1].tags.is_empty());
    }

    #[test]
    fn compiles_whitelist_and_entropy() {
        let cfg = Config::from_toml_str(
            r#"
            [[rules]]
            description = "Generic"
            regex = "secret=([a-z0-9]+)"
            [[rules.whitelist]]
            description = "fixture"
            regex = "fakesecret"
            [[rules.entropies]]
            min = "3.0"
            max = "4.5"
            group = "1"
            "#,
        )
        .unwrap();

        let rule = &cfg.rules[0];
        assert_eq!(rule.whitelist.len(), 1);
        assert_eq!(rule.whitelist[0].description, "fixture");
        assert_eq!(
            rule.entropies,
            vec![Entropy {
                min: 3.0,
                max: 4.5,
                group: 1
            }]
        );
    }

    #[test]
    fn entropy_group_defaults_to_zero() {
        let cfg = Config::from_toml_str(
            r#"
            [[rules]]
            description = "r"
            regex = "x+"
            [[rules.entropies]]
            min = "0.0"
            max = "8.0"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.rules[0].entropies[0].group, 0);
    }

    #[test]
    fn invalid_pattern_fails_whole_load() {
        let err = Config::from_toml_str(
            r#"
            [[rules]]
            description = "ok"
            regex = "a+"

            [[rules]]
            description = "broken"
            regex = "([unclosed"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { rule, .. } if rule == "broken"));
    }

    #[test]
    fn invalid_whitelist_pattern_fails() {
        let err = Config::from_toml_str(
            r#"
            [[rules]]
            description = "r"
            regex = "a+"
            [[rules.whitelist]]
            regex = "([unclosed"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWhitelistPattern { .. }));
    }

    #[test]
    fn entropy_min_above_max_fails() {
        let err = entropy_config_err("5.0", "3.0", None);
        assert!(matches!(err, ConfigError::EntropyMinExceedsMax { .. }));
    }

    #[test]
    fn entropy_out_of_bounds_fails() {
        let err = entropy_config_err("-1.0", "3.0", None);
        assert!(matches!(err, ConfigError::EntropyRangeOutOfBounds { .. }));
        let err = entropy_config_err("3.0", "9.0", None);
        assert!(matches!(err, ConfigError::EntropyRangeOutOfBounds { .. }));
    }

    #[test]
    fn entropy_group_out_of_bounds_fails() {
        // 模式只有隐式 group 0，group 1 越界
        let err = entropy_config_err("0.0", "8.0", Some("1"));
        assert!(matches!(err, ConfigError::EntropyGroupOutOfBounds { .. }));
    }

    #[test]
    fn entropy_numbers_must_parse() {
        let err = entropy_config_err("abc", "8.0", None);
        assert!(matches!(err, ConfigError::InvalidEntropyNumber { value, .. } if value == "abc"));
        let err = entropy_config_err("0.0", "8.0", Some("x"));
        assert!(matches!(err, ConfigError::InvalidEntropyNumber { value, .. } if value == "x"));
    }

    fn entropy_config_err(min: &str, max: &str, group: Option<&str>) -> ConfigError {
        let group_line = group
            .map(|g| format!("group = \"{g}\"\n"))
            .unwrap_or_default();
        let content = format!(
            "[[rules]]\ndescription = \"r\"\nregex = \"a+\"\n[[rules.entropies]]\nmin = \"{min}\"\nmax = \"{max}\"\n{group_line}",
        );
        Config::from_toml_str(&content).unwrap_err()
    }
}

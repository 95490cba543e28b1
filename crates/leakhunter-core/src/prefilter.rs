//! 关键词预筛（Aho-Corasick）
//!
//! 带关键词的规则只在行内出现任一关键词（忽略 ASCII 大小写）时才运行
//! 正则；无关键词的规则恒参与求值。关键词命中采用 overlapping 迭代，
//! 保证互相重叠的关键词不会彼此遮蔽。

use std::collections::HashMap;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::rules::Rule;

/// 预筛计划（只读，可跨线程共享）
#[derive(Debug)]
pub(crate) struct PrefilterPlan {
    /// 全局关键词自动机
    ac: AhoCorasick,
    /// 关键词索引 -> 规则下标列表
    keyword_to_rules: Vec<Vec<usize>>,
    /// 无关键词的规则下标（恒运行）
    unkeyed: Vec<usize>,
}

impl PrefilterPlan {
    /// 从规则集构建；任何规则都不带关键词时返回 None（全量求值）
    pub(crate) fn build(rules: &[Rule]) -> Option<PrefilterPlan> {
        let mut keywords: Vec<String> = Vec::new();
        let mut keyword_index: HashMap<String, usize> = HashMap::new();
        let mut keyword_to_rules: Vec<Vec<usize>> = Vec::new();
        let mut unkeyed: Vec<usize> = Vec::new();

        for (idx, rule) in rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                unkeyed.push(idx);
                continue;
            }
            for kw in &rule.keywords {
                let lowered = kw.to_ascii_lowercase();
                let id = match keyword_index.get(&lowered) {
                    Some(id) => *id,
                    None => {
                        let id = keywords.len();
                        keywords.push(lowered.clone());
                        keyword_index.insert(lowered, id);
                        keyword_to_rules.push(Vec::new());
                        id
                    }
                };
                keyword_to_rules[id].push(idx);
            }
        }

        if keywords.is_empty() {
            return None;
        }

        let ac = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&keywords)
            .expect("build aho-corasick");

        Some(PrefilterPlan {
            ac,
            keyword_to_rules,
            unkeyed,
        })
    }

    /// 返回需要对该行求值的规则下标（保持配置顺序）
    pub(crate) fn candidate_rules(&self, line: &str, total: usize) -> Vec<usize> {
        let mut selected = vec![false; total];
        for &idx in &self.unkeyed {
            selected[idx] = true;
        }
        for m in self.ac.find_overlapping_iter(line) {
            for &idx in &self.keyword_to_rules[m.pattern().as_usize()] {
                selected[idx] = true;
            }
        }
        selected
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(idx, _)| idx)
            .collect()
    }
}

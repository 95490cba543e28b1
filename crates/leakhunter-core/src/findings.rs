//! 泄露记录
use serde::Serialize;

/// 单条泄露：某一行上被某条规则命中且未被抑制的具体片段。
/// 只持有从规则拷贝的描述与标签文本，不反向引用规则本身。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leak {
    /// 0 起始的行号，由单线程生产者在分发前确定
    pub line_number: usize,
    pub line: String,
    pub offender: String,
    pub rule: String,
    /// 规则标签，以空格连接
    pub tags: String,
}

impl Leak {
    /// 掩盖泄露内容：offender 字段与 line 中的出现处均替换为 REDACTED
    pub fn redacted(mut self) -> Leak {
        if !self.offender.is_empty() {
            self.line = self.line.replace(&self.offender, "REDACTED");
        }
        self.offender = "REDACTED".to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_offender_everywhere() {
        let leak = Leak {
            line_number: 3,
            line: "a=hunter2 b=hunter2".to_string(),
            offender: "hunter2".to_string(),
            rule: "Generic".to_string(),
            tags: String::new(),
        };
        let redacted = leak.redacted();
        assert_eq!(redacted.offender, "REDACTED");
        assert_eq!(redacted.line, "a=REDACTED b=REDACTED");
        assert_eq!(redacted.line_number, 3);
    }
}

//! 扫描选项与统计信息

/// 扫描选项（由调用方提供，核心自身不解析命令行）
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 并发预算：0 表示串行扫描（单 worker，输出按行号有序，便于复现）；
    /// 超过 CPU 核数时收敛到核数并告警
    pub threads: usize,
    /// 多行缩进格式渲染 JSON
    pub pretty: bool,
    /// 输出前掩盖泄露内容
    pub redact: bool,
}

/// 扫描统计（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub lines_scanned: usize,
    pub leaks_found: usize,
}

//! 报告输出（文本行 / JSON 数组）
use std::io::{self, Write};

use serde::Serialize;

use crate::harness::Report;

/// 报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// 单条报告的序列化形式（耗时以秒为单位）
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord<'a> {
    pub strategy: &'a str,
    pub ok: bool,
    pub rounds: u32,
    pub seconds: Option<f64>,
    pub mean_seconds: Option<f64>,
    pub checksum: Option<u64>,
    pub tokens: Option<u64>,
    pub bytes: Option<u64>,
    pub error: Option<String>,
}

impl Report {
    pub fn record(&self) -> ReportRecord<'_> {
        match &self.outcome {
            Ok(m) => ReportRecord {
                strategy: self.name(),
                ok: true,
                rounds: m.rounds,
                seconds: Some(m.best.as_secs_f64()),
                mean_seconds: Some(m.mean.as_secs_f64()),
                checksum: Some(m.checksum),
                tokens: Some(m.tokens),
                bytes: Some(m.bytes),
                error: None,
            },
            Err(e) => ReportRecord {
                strategy: self.name(),
                ok: false,
                rounds: 0,
                seconds: None,
                mean_seconds: None,
                checksum: None,
                tokens: None,
                bytes: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// 文本格式：`<checksum> <name>: <seconds>`，失败时 `FAILED <name>: <error>`
fn write_text(reports: &[Report], out: &mut dyn Write) -> io::Result<()> {
    for r in reports {
        match &r.outcome {
            Ok(m) if m.rounds > 1 => writeln!(
                out,
                "{} {}: {:.6} (mean {:.6}, {} rounds)",
                m.checksum,
                r.name(),
                m.best.as_secs_f64(),
                m.mean.as_secs_f64(),
                m.rounds
            )?,
            Ok(m) => writeln!(out, "{} {}: {:.6}", m.checksum, r.name(), m.best.as_secs_f64())?,
            Err(e) => writeln!(out, "FAILED {}: {}", r.name(), e)?,
        }
    }
    Ok(())
}

fn write_json(reports: &[Report], out: &mut dyn Write) -> io::Result<()> {
    let records: Vec<ReportRecord<'_>> = reports.iter().map(Report::record).collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)
}

pub fn write_reports(reports: &[Report], format: ReportFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        ReportFormat::Text => write_text(reports, out),
        ReportFormat::Json => write_json(reports, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::harness::Measurement;
    use crate::strategy::Strategy;
    use std::time::Duration;

    fn sample() -> Vec<Report> {
        vec![
            Report {
                strategy: Strategy::Filestream,
                outcome: Ok(Measurement {
                    rounds: 1,
                    best: Duration::from_millis(1500),
                    mean: Duration::from_millis(1500),
                    checksum: 42,
                    tokens: 7,
                    bytes: 60,
                }),
            },
            Report {
                strategy: Strategy::Win32,
                outcome: Err(ScanError::TokenOverflow { limit: 256, offset: 9 }),
            },
        ]
    }

    #[test]
    fn text_lines_follow_report_order() {
        let mut buf = Vec::new();
        write_reports(&sample(), ReportFormat::Text, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "42 filestream: 1.500000");
        assert_eq!(lines[1], "FAILED win32: token longer than 256 bytes at byte offset 9");
    }

    #[test]
    fn json_records_carry_errors() {
        let mut buf = Vec::new();
        write_reports(&sample(), ReportFormat::Json, &mut buf).expect("write");
        let v: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(v[0]["strategy"], "filestream");
        assert_eq!(v[0]["checksum"], 42);
        assert_eq!(v[1]["ok"], false);
        assert!(v[1]["seconds"].is_null());
    }
}

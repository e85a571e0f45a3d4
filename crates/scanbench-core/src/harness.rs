//! 基准主流程：依次执行各策略、计时并累加校验和
//!
//! - 策略严格串行执行，互不并发；
//! - `rounds > 1` 时按轮交错（每一轮把所有策略各跑一遍），降低文件缓存冷热带来的偏差；
//! - 单个策略失败只记录到它自己的报告中，其余策略照常执行。
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::options::{BenchOptions, ScanConfig};
use crate::strategy::{tokenize, Strategy};

/// 一个策略的计时结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub rounds: u32,
    /// 各轮中最短耗时
    pub best: Duration,
    pub mean: Duration,
    /// 所有 token 的字符数之和
    pub checksum: u64,
    pub tokens: u64,
    pub bytes: u64,
}

/// 单个策略的报告
#[derive(Debug)]
pub struct Report {
    pub strategy: Strategy,
    pub outcome: Result<Measurement, ScanError>,
}

impl Report {
    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }
}

struct Sample {
    elapsed: Duration,
    checksum: u64,
    tokens: u64,
    bytes: u64,
}

/// 计时执行一次；回调只做最少的工作（累加长度）
fn time_once(strategy: Strategy, input: &Path, config: &ScanConfig) -> Result<Sample, ScanError> {
    let mut checksum = 0u64;
    let mut tokens = 0u64;
    let start = Instant::now();
    let bytes = strategy.scan(input, config, |text| {
        checksum += text.chars().count() as u64;
        tokens += 1;
    })?;
    let elapsed = start.elapsed();
    Ok(Sample { elapsed, checksum, tokens, bytes })
}

struct Slot {
    strategy: Strategy,
    samples: Vec<Sample>,
    error: Option<ScanError>,
}

impl Slot {
    fn into_report(self) -> Report {
        let outcome = match self.error {
            Some(e) => Err(e),
            None => Ok(summarize(&self.samples)),
        };
        Report { strategy: self.strategy, outcome }
    }
}

fn summarize(samples: &[Sample]) -> Measurement {
    let rounds = samples.len() as u32;
    let best = samples.iter().map(|s| s.elapsed).min().unwrap_or_default();
    let total: Duration = samples.iter().map(|s| s.elapsed).sum();
    let mean = if rounds == 0 { Duration::ZERO } else { total / rounds };
    let (checksum, tokens, bytes) = samples.first().map(|s| (s.checksum, s.tokens, s.bytes)).unwrap_or_default();
    Measurement { rounds, best, mean, checksum, tokens, bytes }
}

/// 按给定顺序对 `input` 执行每个策略，返回与 `strategies` 同序的报告
///
/// 仅当配置本身非法时返回 `Err`；策略级失败体现在各自的 `Report::outcome` 中。
pub fn run(
    strategies: &[Strategy],
    input: &Path,
    config: &ScanConfig,
    opts: &BenchOptions,
) -> Result<Vec<Report>, ScanError> {
    config.validate()?;
    opts.validate()?;
    info!(input = %input.display(), strategies = strategies.len(), rounds = opts.rounds, "starting benchmark");

    if opts.warmup {
        for &s in strategies {
            // 预热失败不在这里处理，计时轮会再次遇到并记录
            if let Err(e) = s.scan(input, config, |_| {}) {
                debug!(strategy = s.name(), error = %e, "warm-up failed");
            }
        }
    }

    let reports = run_rounds(strategies, opts.rounds, |s| time_once(s, input, config));
    info!(failed = reports.iter().filter(|r| r.outcome.is_err()).count(), "benchmark finished");
    Ok(reports)
}

/// 按轮交错调用 `measure`；已失败的策略不再参与后续轮次
fn run_rounds<F>(strategies: &[Strategy], rounds: u32, mut measure: F) -> Vec<Report>
where
    F: FnMut(Strategy) -> Result<Sample, ScanError>,
{
    let mut slots: Vec<Slot> =
        strategies.iter().map(|&strategy| Slot { strategy, samples: Vec::new(), error: None }).collect();

    for round in 0..rounds {
        for slot in slots.iter_mut().filter(|s| s.error.is_none()) {
            let name = slot.strategy.name();
            match measure(slot.strategy) {
                Ok(sample) => {
                    if let Some(first) = slot.samples.first() {
                        if first.checksum != sample.checksum {
                            let e = ScanError::Unstable { strategy: name, first: first.checksum, current: sample.checksum };
                            warn!(strategy = name, round, error = %e, "strategy failed");
                            slot.error = Some(e);
                            continue;
                        }
                    }
                    debug!(strategy = name, round, elapsed = ?sample.elapsed, checksum = sample.checksum, "round finished");
                    slot.samples.push(sample);
                }
                Err(e) => {
                    warn!(strategy = name, round, error = %e, "strategy failed");
                    slot.error = Some(e);
                }
            }
        }
    }

    slots.into_iter().map(Slot::into_report).collect()
}

/// 两个策略输出出现差异的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub reference: Strategy,
    pub strategy: Strategy,
    /// 第一个不同 token 的下标
    pub index: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// 跨策略一致性检查结果
#[derive(Debug, Default)]
pub struct Verification {
    pub agreed: Vec<Strategy>,
    pub failed: Vec<(Strategy, ScanError)>,
    pub divergences: Vec<Divergence>,
}

impl Verification {
    pub fn is_consistent(&self) -> bool {
        self.failed.is_empty() && self.divergences.is_empty()
    }
}

fn first_difference(a: &[String], b: &[String]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

/// 逐个策略收集完整 token 序列，与第一个成功的策略逐项比较
pub fn verify(strategies: &[Strategy], input: &Path, config: &ScanConfig) -> Result<Verification, ScanError> {
    config.validate()?;
    let mut out = Verification::default();
    let mut reference: Option<(Strategy, Vec<String>)> = None;

    for &s in strategies {
        let tokens = match tokenize(s, input, config) {
            Ok(t) => t,
            Err(e) => {
                warn!(strategy = s.name(), error = %e, "strategy failed");
                out.failed.push((s, e));
                continue;
            }
        };
        let Some((r, expected)) = reference.as_ref() else {
            out.agreed.push(s);
            reference = Some((s, tokens));
            continue;
        };
        match first_difference(expected, &tokens) {
            None => out.agreed.push(s),
            Some(index) => {
                warn!(reference = r.name(), strategy = s.name(), index, "token sequences differ");
                out.divergences.push(Divergence {
                    reference: *r,
                    strategy: s,
                    index,
                    expected: expected.get(index).cloned(),
                    actual: tokens.get(index).cloned(),
                });
            }
        }
    }
    Ok(out)
}

//! Baseline-versus-candidate delta reports.

use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::evaluation::{EvaluationSummary, SummaryMetric};

/// Baselines smaller than this in magnitude yield no percentage.
const PCT_EPSILON: f64 = 1e-12;

/// Direction in which a metric counts as better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricObjective {
    Higher,
    Lower,
    /// Reported but never judged.
    Neutral,
}

impl MetricObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Higher => "higher",
            Self::Lower => "lower",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for MetricObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compared metrics, in report order.
pub const COMPARED_METRICS: [(SummaryMetric, MetricObjective); 10] = [
    (SummaryMetric::AvgReward, MetricObjective::Higher),
    (SummaryMetric::AvgGridCost, MetricObjective::Lower),
    (SummaryMetric::AvgDegradationCost, MetricObjective::Lower),
    (SummaryMetric::AvgPenaltyCost, MetricObjective::Lower),
    (SummaryMetric::AvgUnmetLoadKwh, MetricObjective::Lower),
    (SummaryMetric::AvgCurtailedKwh, MetricObjective::Lower),
    (SummaryMetric::AvgImportKwh, MetricObjective::Lower),
    (SummaryMetric::AvgExportKwh, MetricObjective::Neutral),
    (SummaryMetric::AvgBatteryThroughputKwh, MetricObjective::Lower),
    (SummaryMetric::AvgSafetyOverrides, MetricObjective::Lower),
];

/// One row of a [`ComparisonReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: SummaryMetric,
    pub objective: MetricObjective,
    pub baseline: f64,
    pub candidate: f64,
    /// `candidate - baseline`.
    pub delta: f64,
    /// `None` for neutral metrics.
    pub improved: Option<bool>,
    /// Improvement relative to `|baseline|`; `None` for neutral metrics or a
    /// zero baseline.
    pub improvement_pct: Option<f64>,
}

impl MetricComparison {
    fn new(
        metric: SummaryMetric,
        objective: MetricObjective,
        baseline: f64,
        candidate: f64,
    ) -> Self {
        let (improved, gain) = match objective {
            MetricObjective::Neutral => (None, None),
            MetricObjective::Higher => (Some(candidate > baseline), Some(candidate - baseline)),
            MetricObjective::Lower => (Some(candidate < baseline), Some(baseline - candidate)),
        };
        let improvement_pct = gain
            .filter(|_| baseline.abs() >= PCT_EPSILON)
            .map(|g| g / baseline.abs() * 100.0);

        Self {
            metric,
            objective,
            baseline,
            candidate,
            delta: candidate - baseline,
            improved,
            improvement_pct,
        }
    }
}

/// Per-metric deltas between two evaluation summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub baseline_policy: String,
    pub candidate_policy: String,
    /// Smaller of the two episode counts.
    pub episodes: usize,
    pub metrics: Vec<MetricComparison>,
    pub improved_metric_count: usize,
    /// Metrics with a non-neutral objective.
    pub compared_metric_count: usize,
}

/// Compares `candidate` against `baseline` over [`COMPARED_METRICS`].
///
/// # Examples
///
/// ```
/// # use microgrid_ems::comparison::compare;
/// # use microgrid_ems::evaluation::EvaluationSummary;
/// # use microgrid_ems::runner::EpisodeMetrics;
/// let run = |name: &str, reward: f64| {
///     let m = EpisodeMetrics { total_reward: reward, ..EpisodeMetrics::default() };
///     EvaluationSummary::from_details(name, vec![m]).unwrap()
/// };
/// let report = compare(&run("base", -120.0), &run("cand", -90.0));
/// let reward = &report.metrics[0];
/// assert_eq!(reward.improved, Some(true));
/// assert!((reward.improvement_pct.unwrap() - 25.0).abs() < 1e-9);
/// ```
pub fn compare(baseline: &EvaluationSummary, candidate: &EvaluationSummary) -> ComparisonReport {
    let metrics: Vec<MetricComparison> = COMPARED_METRICS
        .iter()
        .map(|&(metric, objective)| {
            MetricComparison::new(
                metric,
                objective,
                baseline.metric(metric),
                candidate.metric(metric),
            )
        })
        .collect();

    let compared_metric_count = metrics.iter().filter(|m| m.improved.is_some()).count();
    let improved_metric_count = metrics
        .iter()
        .filter(|m| m.improved == Some(true))
        .count();

    ComparisonReport {
        baseline_policy: baseline.policy.clone(),
        candidate_policy: candidate.policy.clone(),
        episodes: baseline.episodes.min(candidate.episodes),
        metrics,
        improved_metric_count,
        compared_metric_count,
    }
}

fn format_improvement(pct: Option<f64>) -> String {
    pct.map_or_else(|| "n/a".to_string(), |p| format!("{p:+.2}%"))
}

fn format_improved(improved: Option<bool>) -> String {
    improved.map_or_else(|| "n/a".to_string(), |b| b.to_string())
}

impl ComparisonReport {
    /// Renders the report as a Markdown document with one table row per metric.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = writeln!(out, "# Baseline vs Candidate Comparison");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Baseline: `{}`", self.baseline_policy);
        let _ = writeln!(out, "- Candidate: `{}`", self.candidate_policy);
        let _ = writeln!(out, "- Episodes: {}", self.episodes);
        let _ = writeln!(
            out,
            "- Improved metrics: {}/{}",
            self.improved_metric_count, self.compared_metric_count
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "| Metric | Objective | Baseline | Candidate | Delta (Candidate - Base) | Improvement | Improved |"
        );
        let _ = writeln!(out, "|---|---|---:|---:|---:|---:|---|");
        for m in &self.metrics {
            let _ = writeln!(
                out,
                "| {} | {} | {:.4} | {:.4} | {:+.4} | {} | {} |",
                m.metric,
                m.objective,
                m.baseline,
                m.candidate,
                m.delta,
                format_improvement(m.improvement_pct),
                format_improved(m.improved),
            );
        }
        out
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Baseline: {}", self.baseline_policy)?;
        writeln!(f, "Candidate: {}", self.candidate_policy)?;
        write!(
            f,
            "Improved metrics: {}/{}",
            self.improved_metric_count, self.compared_metric_count
        )?;
        for m in &self.metrics {
            write!(
                f,
                "\n- {}: base={:.4}, candidate={:.4}, delta={:+.4}, improvement={}, improved={}",
                m.metric,
                m.baseline,
                m.candidate,
                m.delta,
                format_improvement(m.improvement_pct),
                format_improved(m.improved),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::EpisodeMetrics;

    fn summary(
        name: &str,
        episodes: usize,
        reward: f64,
        export: f64,
        grid: f64,
    ) -> EvaluationSummary {
        let details = (0..episodes)
            .map(|i| EpisodeMetrics {
                episode: i,
                total_reward: reward,
                export_kwh: export,
                grid_cost: grid,
                ..EpisodeMetrics::default()
            })
            .collect();
        EvaluationSummary::from_details(name, details).unwrap()
    }

    fn row(report: &ComparisonReport, metric: SummaryMetric) -> &MetricComparison {
        report
            .metrics
            .iter()
            .find(|m| m.metric == metric)
            .unwrap()
    }

    #[test]
    fn higher_is_better_for_reward() {
        let r = compare(
            &summary("base", 3, -120.0, 0.0, 10.0),
            &summary("cand", 3, -90.0, 0.0, 10.0),
        );
        let reward = row(&r, SummaryMetric::AvgReward);
        assert_eq!(reward.improved, Some(true));
        assert!((reward.delta - 30.0).abs() < 1e-9);
        assert!((reward.improvement_pct.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn lower_is_better_for_costs() {
        let r = compare(
            &summary("base", 3, 0.0, 0.0, 20.0),
            &summary("cand", 3, 0.0, 0.0, 15.0),
        );
        let grid = row(&r, SummaryMetric::AvgGridCost);
        assert_eq!(grid.improved, Some(true));
        assert!((grid.improvement_pct.unwrap() - 25.0).abs() < 1e-9);

        let worse = compare(
            &summary("base", 3, 0.0, 0.0, 15.0),
            &summary("cand", 3, 0.0, 0.0, 20.0),
        );
        let grid = row(&worse, SummaryMetric::AvgGridCost);
        assert_eq!(grid.improved, Some(false));
        assert!(grid.improvement_pct.unwrap() < 0.0);
    }

    #[test]
    fn export_is_neutral() {
        let r = compare(
            &summary("base", 2, 0.0, 10.0, 0.0),
            &summary("cand", 2, 0.0, 50.0, 0.0),
        );
        let export = row(&r, SummaryMetric::AvgExportKwh);
        assert_eq!(export.objective, MetricObjective::Neutral);
        assert_eq!(export.improved, None);
        assert_eq!(export.improvement_pct, None);
        assert_eq!(r.compared_metric_count, 9);
    }

    #[test]
    fn zero_baseline_has_no_percentage() {
        let r = compare(
            &summary("base", 2, 0.0, 0.0, 0.0),
            &summary("cand", 2, 5.0, 0.0, 0.0),
        );
        let reward = row(&r, SummaryMetric::AvgReward);
        assert_eq!(reward.improved, Some(true));
        assert_eq!(reward.improvement_pct, None);
    }

    #[test]
    fn episodes_is_minimum_and_counts_add_up() {
        let r = compare(
            &summary("base", 5, -120.0, 0.0, 20.0),
            &summary("cand", 3, -90.0, 0.0, 15.0),
        );
        assert_eq!(r.episodes, 3);
        assert_eq!(r.baseline_policy, "base");
        assert_eq!(r.candidate_policy, "cand");
        // reward and grid cost improve; every other compared metric is tied
        assert_eq!(r.improved_metric_count, 2);
        assert_eq!(r.metrics.len(), COMPARED_METRICS.len());
    }

    #[test]
    fn markdown_has_one_row_per_metric() {
        let r = compare(
            &summary("base", 2, -120.0, 0.0, 20.0),
            &summary("cand", 2, -90.0, 0.0, 15.0),
        );
        let md = r.to_markdown();
        assert!(md.contains("- Improved metrics: 2/9"));
        assert!(
            md.contains("| avg_reward | higher | -120.0000 | -90.0000 | +30.0000 | +25.00% | true |")
        );
        assert!(md.contains("| avg_export_kwh | neutral |"));
        let rows = md.lines().filter(|l| l.starts_with("| avg_")).count();
        assert_eq!(rows, 10);
    }

    #[test]
    fn report_serializes_null_for_neutral() {
        let r = compare(
            &summary("base", 1, -1.0, 0.0, 0.0),
            &summary("cand", 1, -1.0, 0.0, 0.0),
        );
        let json = serde_json::to_value(&r).unwrap();
        let export = &json["metrics"][7];
        assert_eq!(export["metric"], "avg_export_kwh");
        assert!(export["improved"].is_null());
        assert!(export["improvement_pct"].is_null());
    }
}

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::report::{AnalysisReport, ExportFormat};

const TABULAR_HEADER: [&str; 4] = ["date", "created", "completed", "completion_rate"];
const SUMMARY_RECOMMENDATION_LIMIT: usize = 3;

/// Serializes a report in the named format (`structured`, `tabular`,
/// `summary`).
pub fn export_analysis_data(report: &AnalysisReport, format: &str) -> AppResult<String> {
    let format: ExportFormat = format.parse()?;
    export_report(report, format)
}

pub fn export_report(report: &AnalysisReport, format: ExportFormat) -> AppResult<String> {
    let content = match format {
        ExportFormat::Structured => serde_json::to_string_pretty(report)?,
        ExportFormat::Tabular => render_tabular(report)?,
        ExportFormat::Summary => render_summary(report),
    };
    debug!(
        target: "app::analytics::export",
        format = format.as_str(),
        bytes = content.len(),
        "exported analysis report"
    );
    Ok(content)
}

/// Reads back the `structured` encoding.
pub fn parse_structured(payload: &str) -> AppResult<AnalysisReport> {
    Ok(serde_json::from_str(payload)?)
}

fn render_tabular(report: &AnalysisReport) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TABULAR_HEADER)?;

    for bucket in report.time_period_analysis.day.as_deref().unwrap_or_default() {
        writer.write_record([
            bucket.start_date.format("%Y-%m-%d").to_string(),
            bucket.total.to_string(),
            bucket.completed.to_string(),
            bucket.completion_rate.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::other(format!("导出表格失败: {err}")))?;
    String::from_utf8(bytes).map_err(|err| AppError::other(format!("导出表格编码失败: {err}")))
}

fn render_summary(report: &AnalysisReport) -> String {
    let overview = &report.overview;
    let trend = &report.productivity_trend;
    let procrastination = &report.procrastination_analysis;

    let mut content = String::new();
    content.push_str("任务行为分析报告\n");
    content.push_str(&format!(
        "生成时间：{}\n",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M")
    ));
    content.push_str(&format!("任务数量：{}\n\n", report.metadata.record_count));

    content.push_str("【概览】\n");
    content.push_str(&format!(
        "- 总任务：{}\n- 已完成：{}\n- 未完成：{}\n- 完成率：{}%\n\n",
        overview.total, overview.completed, overview.pending, overview.completion_rate
    ));

    content.push_str("【效率趋势】\n");
    content.push_str(&format!(
        "- 趋势：{}\n- 日均完成：{:.1}\n- {}\n\n",
        trend.trend.label(),
        trend.daily_average,
        trend.description
    ));

    content.push_str("【拖延分析】\n");
    content.push_str(&format!(
        "- 拖延指数：{}（{}）\n- 延期任务：{}\n- 长期延期：{}\n- 平均完成用时：{:.1} 天\n\n",
        procrastination.procrastination_score,
        procrastination.procrastination_level.label(),
        procrastination.delayed_tasks,
        procrastination.long_term_delayed,
        procrastination.average_completion_days
    ));

    content.push_str("【重点建议】\n");
    let top = report
        .recommendations
        .as_ref()
        .map(|recommendations| recommendations.top(SUMMARY_RECOMMENDATION_LIMIT))
        .unwrap_or_default();
    if top.is_empty() {
        for line in procrastination
            .recommendations
            .iter()
            .take(SUMMARY_RECOMMENDATION_LIMIT)
        {
            content.push_str(&format!("- {line}\n"));
        }
    } else {
        for item in top {
            content.push_str(&format!("- {}：{}\n", item.title, item.description));
        }
    }

    content
}

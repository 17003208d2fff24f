//! Response formatting for the tool surface.
//!
//! Every externally-visible answer is a markdown string with stable
//! sections; error responses lead with the error kind on the first line
//! and never carry stack traces.

use std::collections::BTreeMap;

use netrag_core::{
    AnalysisType, DeviceRecord, Guidance, HealthReport, NetragError, Priority, SchemaAwareContext,
};

/// Assemble the full `network_query` response.
#[allow(clippy::too_many_arguments)]
pub fn query_response(
    query: &str,
    analysis_type: AnalysisType,
    guidance: &Guidance,
    context: &SchemaAwareContext,
    structured: &str,
    llm_prose: Option<&str>,
    caveats: &[String],
    include_recommendations: bool,
) -> String {
    let mut parts = vec![
        "# Network Analysis\n".to_string(),
        format!("**Query:** {query}\n"),
        format!("**Analysis Type:** {}\n", analysis_type.as_str()),
        format!("**Confidence:** {}\n", guidance.confidence.as_str()),
        format!("**Reasoning:** {}\n", guidance.reasoning),
    ];

    if !caveats.is_empty() {
        parts.push("\n## Caveats\n".to_string());
        for caveat in caveats {
            parts.push(format!("⚠️ {caveat}\n"));
        }
    }

    parts.push("\n## Data Context\n".to_string());
    parts.push(quality_block(context));

    parts.push("\n## Result\n".to_string());
    parts.push(structured.to_string());

    match llm_prose {
        Some(prose) => {
            parts.push("\n## Analysis\n".to_string());
            parts.push(prose.to_string());
            parts.push("\n".to_string());
        }
        None => {
            parts.push(
                "\n*LLM was unavailable; the structured result above is complete \
                 but no prose analysis was generated.*\n"
                    .to_string(),
            );
        }
    }

    if include_recommendations {
        let mut recommendations: Vec<&String> = context.recommendations.iter().collect();
        if !recommendations.is_empty() {
            parts.push("\n## Recommendations\n".to_string());
            for rec in recommendations.drain(..) {
                parts.push(format!("💡 {rec}\n"));
            }
        }
    }

    parts.join("")
}

/// Per-schema quality lines with band emoji.
pub fn quality_block(context: &SchemaAwareContext) -> String {
    if context.quality.is_empty() {
        return "No data sources were assessed for this query.\n".to_string();
    }
    let mut lines = Vec::new();
    for (schema, metrics) in &context.quality {
        lines.push(format!(
            "{} **{}**: overall {:.0}% (completeness {:.0}%, freshness {:.0}%, \
             consistency {:.0}%, accuracy {:.0}%), {} records\n",
            metrics.band().emoji(),
            schema,
            metrics.overall * 100.0,
            metrics.completeness * 100.0,
            metrics.freshness * 100.0,
            metrics.consistency * 100.0,
            metrics.accuracy * 100.0,
            metrics.record_count,
        ));
    }
    lines.join("")
}

/// Listing block with per-region breakdown and health per device.
pub fn device_listing(devices: &[(DeviceRecord, HealthReport)], total: usize) -> String {
    if devices.is_empty() {
        return "No devices found matching the criteria.\n".to_string();
    }

    let mut parts = vec![format!("Found **{total}** devices.\n\n")];

    let mut by_region: BTreeMap<String, usize> = BTreeMap::new();
    for (record, _) in devices {
        if let Some(region) = record.str_field("region") {
            *by_region.entry(region.to_string()).or_insert(0) += 1;
        }
    }
    if !by_region.is_empty() {
        parts.push("**By region:** ".to_string());
        let breakdown: Vec<String> = by_region
            .iter()
            .map(|(region, count)| format!("{region}: {count}"))
            .collect();
        parts.push(breakdown.join(", "));
        parts.push("\n\n".to_string());
    }

    for (i, (record, report)) in devices.iter().enumerate() {
        parts.push(format!(
            "{}. **{}** — {} (score {})\n",
            i + 1,
            record.display_name(),
            report.status.as_str(),
            report.score,
        ));
        parts.push(device_line(record));
    }

    parts.join("")
}

fn device_line(record: &DeviceRecord) -> String {
    match record.schema_name.as_str() {
        "ftth_olt" => format!(
            "   {} / {}, {} Gbps, {} services, inmanta: {}, complete: {}\n",
            record.str_field("region").unwrap_or("?"),
            record.str_field("environment").unwrap_or("?"),
            record.int_field("bandwidth_gbps").unwrap_or(0),
            record.int_field("service_count").unwrap_or(0),
            record.bool_field("managed_by_inmanta").unwrap_or(false),
            record.bool_field("complete_config").unwrap_or(false),
        ),
        "mobile_modem" => format!(
            "   {} / {}, {} Mbps, {}°C\n",
            record.str_field("hardware_type").unwrap_or("?"),
            record.str_field("status").unwrap_or("?"),
            record.int_field("throughput_mbps").unwrap_or(0),
            record.int_field("temperature_celsius").unwrap_or(0),
        ),
        _ => String::new(),
    }
}

/// Detail block for a single device.
pub fn device_details(record: &DeviceRecord, report: &HealthReport) -> String {
    let mut parts = vec![
        format!("## Device Details: {}\n\n", record.display_name()),
        format!(
            "**Health:** {} (score {}/100)\n",
            report.status.as_str(),
            report.score
        ),
    ];
    if let Some(rule_id) = &report.rule_id {
        parts.push(format!("**Rule:** {rule_id}\n"));
    }
    if let Some(note) = &report.note {
        parts.push(format!("**Note:** {note}\n"));
    }

    parts.push("\n### Configuration\n".to_string());
    for (field, value) in &record.fields {
        parts.push(format!("- **{field}:** {value}\n"));
    }

    if !report.adjustments.is_empty() {
        parts.push("\n### Score Adjustments\n".to_string());
        for adjustment in &report.adjustments {
            parts.push(format!("- {:+}: {}\n", adjustment.impact, adjustment.reason));
        }
    }

    if !report.recommendations.is_empty() {
        parts.push("\n### Recommendations\n".to_string());
        for rec in &report.recommendations {
            parts.push(format!("{} {}\n", priority_marker(rec.priority), rec.message));
        }
    }

    parts.join("")
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🚨",
        Priority::Medium => "⚠️",
        Priority::Low => "📊",
    }
}

/// Structured error message: first line names the kind, the body names the
/// component and the next step.
pub fn error_response(error: &NetragError) -> String {
    let next_step = match error {
        NetragError::InvalidInput(_) | NetragError::Validation(_) => {
            "Check the arguments and retry."
        }
        NetragError::NotFound(_) => "Verify the identifier; it may not exist in this fleet.",
        NetragError::UpstreamUnavailable { .. } => {
            "Retry shortly; the upstream dependency is unreachable."
        }
        NetragError::Timeout(_) => "Retry with a narrower query or raise the deadline.",
        NetragError::Canceled => "The request was canceled by the caller.",
        NetragError::IncompatibleState { .. } => {
            "Re-ingest the corpus with this version of the tool."
        }
        NetragError::Internal(_) => "This is a bug; check the server logs.",
    };
    format!("# Error: {}\n{}\n\n{next_step}\n", error.kind(), error)
}

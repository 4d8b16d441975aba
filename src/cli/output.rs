use console::style;
use serde::Serialize;
use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, SearchResult, SearchResults};
use crate::services::IngestReport;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_ingest_preview(&self, preview: &IngestPreview) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub embedding_url: String,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub index: String,
    pub index_exists: bool,
    pub vector_count: u64,
}

/// What `ingest --dry-run` would send.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestPreview {
    pub total: u64,
    pub skipped: u64,
    pub embed_batches: u64,
    pub records: Vec<PreviewRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewRecord {
    #[serde(rename = "projectNo")]
    pub project_no: String,
    pub text: String,
}

fn keyword_list(result: &SearchResult) -> String {
    result.metadata.keywords.join(", ")
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No projects found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Projects matching: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.total, results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(
                output,
                "{}. {} [Score: {:.3}]",
                i + 1,
                style(&result.metadata.title).bold(),
                result.score
            )
            .unwrap();
            writeln!(output, "   Project:    {}", result.project_no).unwrap();
            if !result.metadata.supervisor.is_empty() {
                writeln!(output, "   Supervisor: {}", result.metadata.supervisor).unwrap();
            }
            if !result.metadata.category.is_empty() {
                writeln!(output, "   Category:   {}", result.metadata.category).unwrap();
            }
            if !result.metadata.project_type.is_empty() {
                writeln!(output, "   Type:       {}", result.metadata.project_type).unwrap();
            }
            writeln!(
                output,
                "   Joint/URECA: {}",
                result.metadata.is_joint_or_ureca
            )
            .unwrap();
            if !result.metadata.keywords.is_empty() {
                writeln!(output, "   Keywords:   {}", keyword_list(result)).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        let heading = if report.is_complete() {
            style("Ingestion Complete").green().to_string()
        } else {
            style("Ingestion Finished With Drops").yellow().to_string()
        };
        writeln!(output, "{}", heading).unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Records read:     {}", report.total).unwrap();
        writeln!(output, "Skipped (no id):  {}", report.skipped).unwrap();
        writeln!(output, "Embedded:         {}", report.embedded).unwrap();
        writeln!(output, "Embedding failed: {}", report.embed_failed).unwrap();
        writeln!(output, "Upserted:         {}", report.upserted).unwrap();
        writeln!(output, "Dropped:          {}", report.dropped).unwrap();
        writeln!(
            output,
            "Calls:            {} embedding, {} upsert",
            report.embed_calls, report.upsert_calls
        )
        .unwrap();
        writeln!(output, "Duration:         {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_ingest_preview(&self, preview: &IngestPreview) -> String {
        let mut output = String::new();
        writeln!(
            output,
            "Dry run: would ingest {} of {} records in {} embedding batches ({} skipped)",
            preview.records.len(),
            preview.total,
            preview.embed_batches,
            preview.skipped
        )
        .unwrap();
        for record in &preview.records {
            let text: String = record.text.chars().take(80).collect();
            writeln!(output, "  {}: {}", record.project_no, text).unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        writeln!(output, "Embedding:     {}", status.embedding_model).unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output, "  Dimension:   {}", status.embedding_dimension).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            style("[CONNECTED]").green()
        } else {
            style("[DISCONNECTED]").red()
        };
        writeln!(
            output,
            "Vector Store:  {} {}",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Index:       {}", status.index).unwrap();
        if status.index_exists {
            writeln!(output, "  Vectors:     {}", status.vector_count).unwrap();
        } else if status.vector_store_connected {
            writeln!(output, "  Vectors:     (index not created yet)").unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        to_json(results, self.pretty)
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        to_json(report, self.pretty)
    }

    fn format_ingest_preview(&self, preview: &IngestPreview) -> String {
        to_json(preview, self.pretty)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "embedding": {
                "model": status.embedding_model,
                "dimension": status.embedding_dimension,
                "url": status.embedding_url,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "index": status.index,
                "index_exists": status.index_exists,
                "vectors": status.vector_count,
            }
        });
        to_json(&json, self.pretty)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No projects found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.total, results.duration_ms
        )
        .unwrap();

        writeln!(
            output,
            "| # | Project | Title | Supervisor | Category | Type | Joint/URECA | Score |"
        )
        .unwrap();
        writeln!(output, "|---|---|---|---|---|---|---|---|").unwrap();
        for (i, result) in results.results.iter().enumerate() {
            let m = &result.metadata;
            writeln!(
                output,
                "| {} | `{}` | {} | {} | {} | {} | {} | {:.3} |",
                i + 1,
                result.project_no,
                m.title,
                m.supervisor,
                m.category,
                m.project_type,
                m.is_joint_or_ureca,
                result.score
            )
            .unwrap();
        }

        output
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Report\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Records read | {} |", report.total).unwrap();
        writeln!(output, "| Skipped (no id) | {} |", report.skipped).unwrap();
        writeln!(output, "| Embedded | {} |", report.embedded).unwrap();
        writeln!(output, "| Embedding failed | {} |", report.embed_failed).unwrap();
        writeln!(output, "| Upserted | {} |", report.upserted).unwrap();
        writeln!(output, "| Dropped | {} |", report.dropped).unwrap();
        writeln!(output, "| Embedding calls | {} |", report.embed_calls).unwrap();
        writeln!(output, "| Upsert calls | {} |", report.upsert_calls).unwrap();
        writeln!(output, "| Duration | {}ms |", report.duration_ms).unwrap();
        output
    }

    fn format_ingest_preview(&self, preview: &IngestPreview) -> String {
        let mut output = String::new();
        writeln!(output, "## Dry Run\n").unwrap();
        writeln!(
            output,
            "Would ingest **{}** of {} records in {} embedding batches ({} skipped).\n",
            preview.records.len(),
            preview.total,
            preview.embed_batches,
            preview.skipped
        )
        .unwrap();
        for record in &preview.records {
            writeln!(output, "- `{}`: {}", record.project_no, record.text).unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        writeln!(output, "### Embedding\n").unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **Dimension:** {}", status.embedding_dimension).unwrap();
        writeln!(output, "- **URL:** `{}`\n", status.embedding_url).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Store ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Index:** {}", status.index).unwrap();
        writeln!(output, "- **Vectors:** {}", status.vector_count).unwrap();

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectMetadata;

    fn sample_results() -> SearchResults {
        let result = SearchResult {
            project_no: "P1".into(),
            score: 0.91,
            metadata: ProjectMetadata {
                title: "Vision System".into(),
                supervisor: "Dr. A".into(),
                category: "AI".into(),
                project_type: "FYP".into(),
                keywords: vec!["ml".into(), "cv".into()],
                is_joint_or_ureca: "URECA".into(),
            },
        };
        SearchResults::new("vision".into(), vec![result], 12)
    }

    #[test]
    fn test_text_search_results() {
        let output = TextFormatter.format_search_results(&sample_results());
        assert!(output.contains("Vision System"));
        assert!(output.contains("Project:    P1"));
        assert!(output.contains("Keywords:   ml, cv"));
        assert!(output.contains("0.910"));
    }

    #[test]
    fn test_empty_results_message() {
        let empty = SearchResults::new("nothing".into(), vec![], 3);
        assert_eq!(
            TextFormatter.format_search_results(&empty),
            "No projects found for: nothing\n"
        );
    }

    #[test]
    fn test_json_search_results_are_flat() {
        let output = JsonFormatter::new(false).format_search_results(&sample_results());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["results"][0]["projectNo"], "P1");
        assert_eq!(value["results"][0]["supervisor"], "Dr. A");
        assert_eq!(value["total"], 1);
    }

    #[test]
    fn test_markdown_table_row() {
        let output = MarkdownFormatter.format_search_results(&sample_results());
        assert!(output.contains("| 1 | `P1` | Vision System | Dr. A | AI | FYP | URECA | 0.910 |"));
    }

    #[test]
    fn test_json_ingest_report() {
        let report = IngestReport {
            total: 3,
            skipped: 1,
            upserted: 2,
            ..Default::default()
        };
        let output = JsonFormatter::new(false).format_ingest_report(&report);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["upserted"], 2);
    }

    #[test]
    fn test_json_error() {
        let output = JsonFormatter::new(false).format_error("boom");
        assert_eq!(output, r#"{"error":"boom"}"#);
    }
}

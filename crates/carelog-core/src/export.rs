//! CSV/JSON import and export.
//!
//! Residents round-trip through a small quoted CSV dialect
//! (`name,mobility,diet,allergies`, allergies `;`-joined) or plain JSON.
//! Imports validate per row: a missing name skips the row rather than
//! failing the batch. The adherence report exports as the dashboard CSV
//! (summary columns plus the 24 hourly trend counts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::resident::{Mobility, Resident};
use crate::stats::AdherenceReport;
use crate::store::Database;

/// A resident-to-be from an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentDraft {
    pub name: String,
    pub mobility: Mobility,
    pub diet: String,
    pub allergies: Vec<String>,
}

/// Outcome of an import batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

// ── CSV ──────────────────────────────────────────────────────────────

fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Split one CSV line honoring double-quoted fields with `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Render residents as CSV with a header row.
pub fn residents_to_csv(residents: &[Resident]) -> String {
    let mut lines = vec!["name,mobility,diet,allergies".to_string()];
    for r in residents {
        lines.push(
            [
                csv_escape(&r.name),
                csv_escape(r.mobility.as_str()),
                csv_escape(&r.diet),
                csv_escape(&r.allergies.join(";")),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

/// Render residents as pretty JSON.
pub fn residents_to_json(residents: &[Resident]) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(residents)?)
}

/// Parse residents from CSV. Rows without a name are dropped silently; the
/// import summary accounts for them.
pub fn parse_residents_csv(text: &str) -> Vec<ResidentDraft> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let header: Vec<String> = split_csv_line(header)
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let col = |name: &str| header.iter().position(|h| h == name);
    let (name_col, mobility_col, diet_col, allergies_col) = (
        col("name"),
        col("mobility"),
        col("diet"),
        col("allergies"),
    );

    let mut out = Vec::new();
    for line in lines {
        let fields = split_csv_line(line);
        let take = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let name = take(name_col);
        if name.is_empty() {
            continue;
        }
        out.push(ResidentDraft {
            name,
            mobility: Mobility::parse(&take(mobility_col)),
            diet: take(diet_col),
            allergies: split_list(&take(allergies_col)),
        });
    }
    out
}

// ── JSON ─────────────────────────────────────────────────────────────

/// Parse residents from JSON. Accepts both this tool's export shape and the
/// looser legacy shape (`diet` nested under `preferences`, allergies as a
/// delimited string).
pub fn parse_residents_json(text: &str) -> Result<Vec<ResidentDraft>, CoreError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(values.iter().filter_map(draft_from_value).collect())
}

fn draft_from_value(value: &serde_json::Value) -> Option<ResidentDraft> {
    let name = value.get("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let mobility = value
        .get("mobility")
        .and_then(|v| v.as_str())
        .map(Mobility::parse)
        .unwrap_or(Mobility::Low);
    let diet = value
        .get("diet")
        .or_else(|| value.get("preferences").and_then(|p| p.get("diet")))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();
    let allergies = match value.get("allergies") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) => split_list(s),
        _ => Vec::new(),
    };
    Some(ResidentDraft {
        name,
        mobility,
        diet,
        allergies,
    })
}

fn split_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Insert drafts as resident documents.
pub fn import_residents(
    db: &Database,
    drafts: &[ResidentDraft],
    now: DateTime<Utc>,
) -> Result<ImportSummary, CoreError> {
    let mut summary = ImportSummary::default();
    for draft in drafts {
        match Resident::new(
            &draft.name,
            draft.mobility,
            &draft.diet,
            draft.allergies.clone(),
            now,
        ) {
            Ok(resident) => {
                db.insert(&resident)?;
                summary.imported += 1;
            }
            Err(_) => summary.skipped += 1,
        }
    }
    Ok(summary)
}

// ── Adherence CSV ────────────────────────────────────────────────────

/// Export an adherence report as the dashboard CSV: summary columns plus
/// one raw count per trend bucket.
pub fn adherence_to_csv(report: &AdherenceReport) -> String {
    let buckets = report
        .trends
        .values()
        .map(Vec::len)
        .max()
        .unwrap_or(crate::stats::DEFAULT_TREND_BUCKETS);

    let mut header = vec![
        "Resident".to_string(),
        "Adherence".to_string(),
        "OnTimePct".to_string(),
    ];
    header.extend((0..buckets).map(|i| format!("Hour{i:02}")));
    let mut lines = vec![header.join(",")];

    let empty = Vec::new();
    for row in &report.rows {
        let counts = report.trends.get(&row.resident_id).unwrap_or(&empty);
        let mut cols = vec![
            csv_escape(&row.name),
            csv_escape(&format!("{}%", (row.adherence * 100.0).round())),
            csv_escape(&format!("{}%", row.on_time_pct.round())),
        ];
        for i in 0..buckets {
            cols.push(counts.get(i).copied().unwrap_or(0).to_string());
        }
        lines.push(cols.join(","));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::AdherenceAnalyzer;
    use chrono::{Duration, TimeZone};

    fn resident(name: &str, diet: &str, allergies: &[&str]) -> Resident {
        Resident::new(
            name,
            Mobility::Medium,
            diet,
            allergies.iter().map(|s| s.to_string()).collect(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn csv_roundtrip_preserves_quoting() {
        let residents = vec![
            resident("Mensah, Ama", "low-sodium", &["shellfish", "peanuts"]),
            resident("Kwesi \"KB\" Boateng", "diabetic", &[]),
        ];
        let csv = residents_to_csv(&residents);
        let drafts = parse_residents_csv(&csv);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name, "Mensah, Ama");
        assert_eq!(drafts[0].allergies, vec!["shellfish", "peanuts"]);
        assert_eq!(drafts[1].name, "Kwesi \"KB\" Boateng");
    }

    #[test]
    fn csv_rows_without_name_are_dropped() {
        let csv = "name,mobility,diet,allergies\n\"\",low,,\n\"Ama\",high,,\n";
        let drafts = parse_residents_csv(&csv);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].mobility, Mobility::High);
    }

    #[test]
    fn json_accepts_legacy_nested_diet() {
        let json = r#"[
            {"name": "Ama", "mobility": "low", "preferences": {"diet": "low-sodium"},
             "allergies": "shellfish; fish"},
            {"name": "", "mobility": "low"},
            {"name": "Kwesi", "diet": "diabetic", "allergies": ["fish"]}
        ]"#;
        let drafts = parse_residents_json(json).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].diet, "low-sodium");
        assert_eq!(drafts[0].allergies, vec!["shellfish", "fish"]);
        assert_eq!(drafts[1].diet, "diabetic");
    }

    #[test]
    fn import_counts_skipped_rows() {
        let db = Database::open_memory().unwrap();
        let drafts = vec![
            ResidentDraft {
                name: "Ama".to_string(),
                mobility: Mobility::Low,
                diet: String::new(),
                allergies: vec![],
            },
            ResidentDraft {
                name: "  ".to_string(),
                mobility: Mobility::Low,
                diet: String::new(),
                allergies: vec![],
            },
        ];
        let summary = import_residents(&db, &drafts, Utc::now()).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        let stored: Vec<Resident> = db.load_all().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn adherence_csv_has_hourly_columns() {
        use crate::reposition::{RepositionEvent, RepositionPreference};

        let start = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let end = start + Duration::hours(24);
        let r = resident("Ama Mensah", "", &[]);
        let prefs = vec![RepositionPreference {
            id: format!("rpref:{}", r.id),
            resident_id: r.id.clone(),
            interval_min: 120,
            updated_at: start,
        }];
        let events = vec![RepositionEvent {
            id: "e1".to_string(),
            resident_id: r.id.clone(),
            at: start + Duration::hours(3),
            guidance: None,
        }];
        let report = AdherenceAnalyzer::new().compute_report(
            &[r.clone()],
            &prefs,
            &events,
            start,
            end,
        );

        let csv = adherence_to_csv(&report);
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Resident,Adherence,OnTimePct,Hour00"));
        assert!(header.ends_with("Hour23"));
        let row = lines.next().unwrap();
        assert!(row.contains("\"Ama Mensah\""));
        assert!(row.contains("8%")); // 1 of 12 expected
    }
}

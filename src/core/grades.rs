use crate::domain::model::Grade;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

pub const UNKNOWN_SUBJECT: &str = "Unknown";

const DISPLAY_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

/// 依科目分組，科目名稱排序；組內保持原本順序
pub fn group_by_subject(grades: Vec<Grade>) -> BTreeMap<String, Vec<Grade>> {
    let mut grouped: BTreeMap<String, Vec<Grade>> = BTreeMap::new();
    for grade in grades {
        let subject = grade
            .subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SUBJECT)
            .to_string();
        grouped.entry(subject).or_default().push(grade);
    }
    grouped
}

pub fn format_grade_value(value: f64) -> String {
    format!("{:.1}", value)
}

/// Formats a `createdAt` timestamp as `Jan 5, 2024, 02:30 PM`.
///
/// Timestamps with an offset are shown in that offset. Input that does not
/// parse is returned unchanged.
pub fn format_date(created_at: Option<&str>) -> String {
    let raw = match created_at.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return "Unknown".to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local().format(DISPLAY_FORMAT).to_string();
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY_FORMAT).to_string();
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.format(DISPLAY_FORMAT).to_string();
    }

    tracing::debug!("Unrecognised timestamp format: {}", raw);
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(id: i64, subject: Option<&str>, value: f64) -> Grade {
        Grade {
            id,
            value,
            subject: subject.map(String::from),
            student_id: Some(1),
            student_name: Some("Ana Kovač".into()),
            teacher_id: Some(2),
            teacher_name: Some("Tom Reed".into()),
            parent_id: Some(3),
            created_at: None,
        }
    }

    #[test]
    fn groups_sorts_subjects_and_keeps_order_within_group() {
        let grouped = group_by_subject(vec![
            grade(1, Some("Physics"), 80.0),
            grade(2, Some("Maths"), 91.5),
            grade(3, None, 60.0),
            grade(4, Some("Maths"), 70.0),
            grade(5, Some(""), 55.0),
        ]);

        let subjects: Vec<&str> = grouped.keys().map(String::as_str).collect();
        assert_eq!(subjects, vec!["Maths", "Physics", "Unknown"]);

        let maths: Vec<i64> = grouped["Maths"].iter().map(|g| g.id).collect();
        assert_eq!(maths, vec![2, 4]);
        assert_eq!(grouped["Unknown"].len(), 2);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_by_subject(Vec::new()).is_empty());
    }

    #[test]
    fn values_have_one_decimal() {
        assert_eq!(format_grade_value(85.0), "85.0");
        assert_eq!(format_grade_value(72.46), "72.5");
        assert_eq!(format_grade_value(0.0), "0.0");
    }

    #[test]
    fn formats_common_backend_timestamps() {
        assert_eq!(format_date(None), "Unknown");
        assert_eq!(format_date(Some("")), "Unknown");
        assert_eq!(
            format_date(Some("2024-01-05T14:30:00")),
            "Jan 5, 2024, 02:30 PM"
        );
        assert_eq!(
            format_date(Some("2024-11-20T09:05:12.123456")),
            "Nov 20, 2024, 09:05 AM"
        );
        assert_eq!(
            format_date(Some("2024-03-01T23:59:00+02:00")),
            "Mar 1, 2024, 11:59 PM"
        );
        assert_eq!(format_date(Some("2024-06-30")), "Jun 30, 2024, 12:00 AM");
        assert_eq!(format_date(Some("yesterday")), "yesterday");
    }
}

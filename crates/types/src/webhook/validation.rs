//! Form state helpers shared by the TUI form modal and the CLI `invoke` command.
//!
//! Both front ends seed values the same way, block submission on the same
//! required-field rule, and pick the transport (JSON or multipart) from the
//! schema shape alone.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::arguments::normalize_date;
use super::{FieldType, WorkflowFormField};
use crate::FileAttachment;

/// Current value of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Files(Vec<FileAttachment>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Files(_) => None,
        }
    }

    pub fn files(&self) -> &[FileAttachment] {
        match self {
            FieldValue::Files(files) => files,
            FieldValue::Text(_) => &[],
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Files(files) => files.is_empty(),
        }
    }
}

/// Field name to value, in schema order.
pub type FormValues = IndexMap<String, FieldValue>;

/// Field name to validation message, in schema order.
pub type FieldErrors = IndexMap<String, String>;

/// Transport used to submit a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Json,
    Multipart,
}

/// Initial values for a freshly opened form: defaults for text-like fields,
/// empty lists for file fields.
pub fn seed_form_values(fields: &[WorkflowFormField]) -> FormValues {
    fields
        .iter()
        .map(|field| {
            let value = if field.is_file() {
                FieldValue::Files(Vec::new())
            } else {
                FieldValue::Text(field.initial_text())
            };
            (field.name.clone(), value)
        })
        .collect()
}

/// Apply the required-field rule to every field in schema order.
///
/// The result lists every failing field rather than stopping at the first.
/// A missing entry in `values` counts as blank.
pub fn validate_required(fields: &[WorkflowFormField], values: &FormValues) -> FieldErrors {
    fields
        .iter()
        .filter(|field| field.required)
        .filter(|field| values.get(&field.name).is_none_or(FieldValue::is_blank))
        .map(|field| (field.name.clone(), required_message(field)))
        .collect()
}

pub fn required_message(field: &WorkflowFormField) -> String {
    format!("{} is required", field.label)
}

/// Multipart whenever the schema declares a file field, even if the user
/// leaves every file field empty.
pub fn submission_mode(fields: &[WorkflowFormField]) -> SubmissionMode {
    if fields.iter().any(WorkflowFormField::is_file) {
        SubmissionMode::Multipart
    } else {
        SubmissionMode::Json
    }
}

/// JSON form data for the text-like fields, as strings. Date fields are
/// sent as `YYYY-MM-DD` when the entered text is a recognizable date.
pub fn collect_form_data(fields: &[WorkflowFormField], values: &FormValues) -> Map<String, Value> {
    fields
        .iter()
        .filter(|field| !field.is_file())
        .map(|field| {
            let text = values.get(&field.name).and_then(FieldValue::as_text).unwrap_or_default();
            let text = if field.field_type == FieldType::Date { normalize_date(text) } else { text.to_string() };
            (field.name.clone(), Value::String(text))
        })
        .collect()
}

/// All selected files across every file field, in schema order.
pub fn collect_files(fields: &[WorkflowFormField], values: &FormValues) -> Vec<FileAttachment> {
    fields
        .iter()
        .filter(|field| field.is_file())
        .filter_map(|field| values.get(&field.name))
        .flat_map(|value| value.files().iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, label: &str, field_type: FieldType, required: bool) -> WorkflowFormField {
        WorkflowFormField {
            name: name.into(),
            label: label.into(),
            field_type,
            required,
            placeholder: None,
            options: Vec::new(),
            default: None,
            accept: None,
            multiple: false,
        }
    }

    #[test]
    fn seeds_defaults_and_empty_file_lists() {
        let mut month = field("month", "Month", FieldType::Select, false);
        month.default = Some(Value::from("Feb"));
        let fields = vec![month, field("scan", "Scan", FieldType::File, false), field("x", "X", FieldType::Text, false)];

        let values = seed_form_values(&fields);
        assert_eq!(values.get("month"), Some(&FieldValue::Text("Feb".into())));
        assert_eq!(values.get("scan"), Some(&FieldValue::Files(Vec::new())));
        assert_eq!(values.get("x"), Some(&FieldValue::Text(String::new())));
        assert_eq!(values.keys().collect::<Vec<_>>(), ["month", "scan", "x"]);
    }

    #[test]
    fn validation_collects_every_missing_field() {
        let fields = vec![
            field("a", "A", FieldType::Text, true),
            field("b", "B", FieldType::Number, false),
            field("c", "C", FieldType::File, true),
            field("d", "D", FieldType::Textarea, true),
        ];
        let mut values = seed_form_values(&fields);
        values.insert("d".into(), FieldValue::Text("   ".into()));

        let errors = validate_required(&fields, &values);
        assert_eq!(errors.keys().collect::<Vec<_>>(), ["a", "c", "d"]);
        assert_eq!(errors["a"], "A is required");
        assert_eq!(errors["c"], "C is required");
    }

    #[test]
    fn populated_form_passes_validation() {
        let fields = vec![field("x", "X", FieldType::Text, true), field("f", "F", FieldType::File, true)];
        let mut values = seed_form_values(&fields);
        values.insert("x".into(), FieldValue::Text("5".into()));
        values.insert(
            "f".into(),
            FieldValue::Files(vec![FileAttachment::new("a.pdf", "application/pdf", vec![0])]),
        );
        assert!(validate_required(&fields, &values).is_empty());
    }

    #[test]
    fn submission_mode_depends_on_schema_only() {
        let without_files = vec![field("x", "X", FieldType::Text, true)];
        assert_eq!(submission_mode(&without_files), SubmissionMode::Json);

        let with_optional_file = vec![field("x", "X", FieldType::Text, true), field("f", "F", FieldType::File, false)];
        assert_eq!(submission_mode(&with_optional_file), SubmissionMode::Multipart);
    }

    #[test]
    fn files_are_aggregated_in_schema_order() {
        let fields = vec![
            field("first", "First", FieldType::File, false),
            field("note", "Note", FieldType::Text, false),
            field("second", "Second", FieldType::File, false),
        ];
        let mut values = seed_form_values(&fields);
        values.insert(
            "second".into(),
            FieldValue::Files(vec![FileAttachment::new("b.png", "image/png", vec![2])]),
        );
        values.insert(
            "first".into(),
            FieldValue::Files(vec![FileAttachment::new("a.pdf", "application/pdf", vec![1])]),
        );
        values.insert("note".into(), FieldValue::Text("hello".into()));

        let names: Vec<_> = collect_files(&fields, &values).into_iter().map(|f| f.file_name).collect();
        assert_eq!(names, ["a.pdf", "b.png"]);

        let data = collect_form_data(&fields, &values);
        assert_eq!(data.len(), 1);
        assert_eq!(data["note"], Value::String("hello".into()));
    }

    #[test]
    fn date_fields_are_sent_normalized() {
        let fields = vec![field("from", "From", FieldType::Date, true), field("note", "Note", FieldType::Text, false)];
        let mut values = seed_form_values(&fields);
        values.insert("from".into(), FieldValue::Text("12/31/2024".into()));
        values.insert("note".into(), FieldValue::Text("12/31/2024".into()));

        let data = collect_form_data(&fields, &values);
        assert_eq!(data["from"], Value::String("2024-12-31".into()));
        assert_eq!(data["note"], Value::String("12/31/2024".into()));
    }
}

use std::collections::HashMap;

use crate::models::{
    DocumentRecords, NormalizedClass, NormalizedGrade, NormalizedStudent, RawRecord,
    UNKNOWN_NAME_PREFIX,
};
use crate::parsers::{field_values, parse_age, parse_score};

const NAME_FIELDS: &[&str] = &["name", "student", "full name", "student name"];
const EMAIL_FIELDS: &[&str] = &["email", "e-mail"];
const AGE_FIELDS: &[&str] = &["age"];
const CLASS_FIELDS: &[&str] = &["classes", "class"];
const GRADE_FIELDS: &[&str] = &["grades", "grade", "scores", "score"];
const FEEDBACK_FIELDS: &[&str] = &["feedback", "comments", "comment"];

/// Turn one document's raw records into students, classes and grades with document-local ids.
///
/// Class names and grade values are paired by position, so a single grade next to
/// several classes belongs to the first class only. Classes without a parseable
/// paired score still count as enrollments but produce no grade.
pub fn normalize_records(source: &str, records: &[RawRecord]) -> DocumentRecords {
    let mut document = DocumentRecords {
        source: source.to_string(),
        ..Default::default()
    };
    let mut class_ids: HashMap<String, u32> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let local_id = index as u32 + 1;

        let name = text_field(record, NAME_FIELDS)
            .unwrap_or_else(|| format!("{UNKNOWN_NAME_PREFIX}_{local_id}"));
        let email = text_field(record, EMAIL_FIELDS).unwrap_or_default();
        let age = parse_age(text_field(record, AGE_FIELDS).as_deref());
        let feedback = text_field(record, FEEDBACK_FIELDS);

        let class_names = source_values(record, CLASS_FIELDS, &["class"]);
        let grade_values = source_values(record, GRADE_FIELDS, &["grade", "score"]);

        let mut enrolled: Vec<String> = Vec::new();
        for (position, title) in class_names.iter().enumerate() {
            let class_local_id = match class_ids.get(title) {
                Some(id) => *id,
                None => {
                    let id = document.classes.len() as u32 + 1;
                    class_ids.insert(title.clone(), id);
                    document.classes.push(NormalizedClass {
                        local_id: id,
                        title: title.clone(),
                    });
                    id
                }
            };

            if !enrolled.contains(title) {
                enrolled.push(title.clone());
            }

            let score = parse_score(grade_values.get(position).map(String::as_str));
            if score.is_some() {
                document.grades.push(NormalizedGrade {
                    student_local_id: local_id,
                    class_local_id,
                    score,
                    feedback: feedback.clone(),
                });
            }
        }

        document.students.push(NormalizedStudent {
            local_id,
            name,
            email,
            age,
            enrolled_class_titles: enrolled,
        });
    }

    document
}

/// Values of the first exact field present, else of every field whose name contains a needle.
fn source_values(record: &RawRecord, exact: &[&str], needles: &[&str]) -> Vec<String> {
    match record.first_of(exact) {
        Some(value) => field_values(Some(value)),
        None => record
            .all_containing(needles)
            .into_iter()
            .flat_map(|value| field_values(Some(value)))
            .collect(),
    }
}

fn text_field(record: &RawRecord, names: &[&str]) -> Option<String> {
    record
        .first_of(names)
        .and_then(|value| value.as_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

use pretty_assertions::assert_eq;

use classroom_ingest::models::FieldValue;
use classroom_ingest::{extract_records, merge_documents, parse_document, Selectors};

const ROSTER: &str = r#"
<html><body>
  <table>
    <thead><tr><th>Name</th><th>Classes</th><th>Grades</th><th>Email</th><th>Age</th></tr></thead>
    <tbody>
      <tr><td>Alice</td><td>Math; Science</td><td>95</td><td>alice@example.com</td><td>15</td></tr>
      <tr><td>Bob</td><td>Science | Art</td><td>71 / 64</td><td></td><td>n/a</td></tr>
    </tbody>
  </table>
</body></html>
"#;

const ALICE_DETAIL: &str = r#"
<html><body>
  <div class="student-card">
    <h2 class="name">Alice</h2>
    <span class="email">alice@example.com</span>
    <ul><li class="course">History</li><li class="course">Math</li></ul>
    <span class="grade">A: 80</span>
  </div>
</body></html>
"#;

#[test]
fn extra_table_column_gets_a_synthetic_name() {
    let html = r#"
    <table>
      <tr><th>Name</th><th>Grade</th></tr>
      <tr><td>Alice</td><td>90</td><td>room 4</td></tr>
      <tr><td>Bob</td><td>80</td><td>room 5</td></tr>
    </table>
    "#;

    let records = extract_records(html, &Selectors::default());

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("col_3"), Some(&FieldValue::Text("room 5".to_string())));
}

#[test]
fn main_and_detail_documents_reconcile() {
    let selectors = Selectors::default();
    let main = parse_document(ROSTER, "https://school.example/roster", &selectors);
    let detail = parse_document(ALICE_DETAIL, "https://school.example/students/alice", &selectors);

    assert_eq!(main.students.len(), 2);
    assert_eq!(detail.students.len(), 1);

    let merged = merge_documents(&[main, detail]);

    let titles: Vec<(u32, &str)> = merged
        .classes
        .iter()
        .map(|class| (class.id, class.title.as_str()))
        .collect();
    assert_eq!(titles, vec![(1, "Math"), (2, "Science"), (3, "Art"), (4, "History")]);

    assert_eq!(merged.students.len(), 2);
    let alice = merged.student_by_name("Alice").unwrap();
    assert_eq!(alice.id, 1);
    assert_eq!(alice.age, Some(15));
    assert_eq!(alice.enrolled_classes, vec![1, 2, 4]);

    let bob = merged.student_by_name("Bob").unwrap();
    assert_eq!(bob.email, "");
    assert_eq!(bob.age, None);
    assert_eq!(bob.enrolled_classes, vec![2, 3]);

    let grades: Vec<(u32, u32, Option<f64>)> = merged
        .grades
        .iter()
        .map(|grade| (grade.student_id, grade.class_id, grade.score))
        .collect();
    assert_eq!(
        grades,
        vec![
            (1, 1, Some(95.0)),
            (2, 2, Some(71.0)),
            (2, 3, Some(64.0)),
            (1, 4, Some(80.0)),
        ]
    );

    for grade in &merged.grades {
        assert!(merged.students.iter().any(|s| s.id == grade.student_id));
        assert!(merged.classes.iter().any(|c| c.id == grade.class_id));
    }
}

#[test]
fn mailto_link_on_detail_page_matches_main_table_student() {
    let detail = r#"
    <div class="student">
      <span class="name">Alice</span>
      <a href="mailto:alice@example.com">Email</a>
      <span class="class">History</span>
    </div>
    "#;

    let selectors = Selectors::default();
    let main = parse_document(ROSTER, "https://school.example/roster", &selectors);
    let detail = parse_document(detail, "https://school.example/students/alice", &selectors);

    assert_eq!(detail.students[0].email, "alice@example.com");

    let merged = merge_documents(&[main, detail]);

    assert_eq!(merged.students.len(), 2);
    let alice = merged.student_by_name("Alice").unwrap();
    assert_eq!(alice.email, "alice@example.com");
    assert_eq!(alice.enrolled_classes.len(), 3);
}

#[test]
fn merged_dataset_serializes_as_plain_json() {
    let selectors = Selectors::default();
    let merged = merge_documents(&[parse_document(ROSTER, "main", &selectors)]);

    let json = serde_json::to_value(&merged).unwrap();

    assert_eq!(json["students"][0]["name"], "Alice");
    assert_eq!(json["students"][0]["enrolled_classes"], serde_json::json!([1, 2]));
    assert_eq!(json["classes"][1]["title"], "Science");
    assert_eq!(json["grades"][0]["score"], 95.0);
    assert!(json["grades"][0]["feedback"].is_null());
}

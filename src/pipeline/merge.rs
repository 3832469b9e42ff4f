use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::models::{
    DocumentRecords, MergedClass, MergedDataset, MergedGrade, MergedStudent, StudentKey,
};

struct StudentAccumulator {
    key: StudentKey,
    age: Option<u32>,
    class_titles: Vec<String>,
}

/// Combine per-document results into one dataset with global ids.
///
/// `documents` must be in merge order: the main document first, then detail pages.
/// Classes are identified by exact title and students by exact (name, email); ids are
/// assigned in order of first appearance. Grades whose student or class can't be
/// resolved inside their own document are dropped.
pub fn merge_documents(documents: &[DocumentRecords]) -> MergedDataset {
    let mut class_ids: HashMap<&str, u32> = HashMap::new();
    let mut classes = Vec::new();

    for document in documents {
        for class in &document.classes {
            if !class_ids.contains_key(class.title.as_str()) {
                let id = classes.len() as u32 + 1;
                class_ids.insert(class.title.as_str(), id);
                classes.push(MergedClass {
                    id,
                    title: class.title.clone(),
                });
            }
        }
    }

    let mut student_ids: HashMap<StudentKey, u32> = HashMap::new();
    let mut accumulators: Vec<StudentAccumulator> = Vec::new();

    for document in documents {
        for student in &document.students {
            let key = StudentKey::new(student.name.clone(), student.email.clone());
            let index = match student_ids.get(&key) {
                Some(id) => *id as usize - 1,
                None => {
                    accumulators.push(StudentAccumulator {
                        key: key.clone(),
                        age: None,
                        class_titles: Vec::new(),
                    });
                    student_ids.insert(key, accumulators.len() as u32);
                    accumulators.len() - 1
                }
            };

            let entry = &mut accumulators[index];
            if entry.age.is_none() {
                entry.age = student.age;
            }
            for title in &student.enrolled_class_titles {
                if !entry.class_titles.contains(title) {
                    entry.class_titles.push(title.clone());
                }
            }
        }
    }

    let mut grades = Vec::new();
    let mut dropped = 0usize;

    for document in documents {
        for grade in &document.grades {
            let student_id = document
                .student(grade.student_local_id)
                .map(|student| StudentKey::new(student.name.clone(), student.email.clone()))
                .and_then(|key| student_ids.get(&key).copied());
            let class_id = document
                .class_title(grade.class_local_id)
                .and_then(|title| class_ids.get(title).copied());

            match (student_id, class_id) {
                (Some(student_id), Some(class_id)) => grades.push(MergedGrade {
                    student_id,
                    class_id,
                    score: grade.score,
                    feedback: grade.feedback.clone(),
                }),
                _ => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        debug!("Dropped {} grades with unresolvable student or class", dropped);
    }

    let students = accumulators
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let enrolled: BTreeSet<u32> = entry
                .class_titles
                .iter()
                .filter_map(|title| class_ids.get(title.as_str()).copied())
                .collect();

            MergedStudent {
                id: index as u32 + 1,
                name: entry.key.name,
                email: entry.key.email,
                age: entry.age,
                enrolled_classes: enrolled.into_iter().collect(),
            }
        })
        .collect();

    MergedDataset {
        students,
        classes,
        grades,
    }
}

use serde::{Deserialize, Serialize};

/// Deduplication key for students across documents: exact (name, email) match.
/// An absent email is the empty string, so same-named students without email collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentKey {
    pub name: String,
    pub email: String,
}

impl StudentKey {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Stable hash of the key, used as the storage-side identity.
    pub fn fingerprint(&self) -> String {
        use md5::Context;

        let mut hasher = Context::new();
        hasher.consume(self.name.as_bytes());
        hasher.consume(b"|");
        hasher.consume(self.email.as_bytes());
        format!("{:x}", hasher.compute())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedStudent {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub age: Option<u32>,
    /// Global class ids, ascending.
    pub enrolled_classes: Vec<u32>,
}

impl MergedStudent {
    pub fn key(&self) -> StudentKey {
        StudentKey::new(self.name.clone(), self.email.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedClass {
    pub id: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedGrade {
    pub student_id: u32,
    pub class_id: u32,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

/// Final pipeline output. Ids are dense, 1-based and only meaningful within this value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    pub students: Vec<MergedStudent>,
    pub classes: Vec<MergedClass>,
    pub grades: Vec<MergedGrade>,
}

impl MergedDataset {
    pub fn student_by_name(&self, name: &str) -> Option<&MergedStudent> {
        self.students.iter().find(|student| student.name == name)
    }

    /// Student ids enrolled in `class_id`, rebuilt from the students' enrollment lists.
    pub fn enrolled_students(&self, class_id: u32) -> Vec<u32> {
        self.students
            .iter()
            .filter(|student| student.enrolled_classes.contains(&class_id))
            .map(|student| student.id)
            .collect()
    }
}

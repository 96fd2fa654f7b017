//! The domain store: the only place where students and grades change.

use crate::model::{Grade, NewGrade, NewStudent, Student, UNKNOWN_STUDENT};
use crate::Result;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use super::slots::{SlotStore, GRADES_SLOT, STUDENTS_SLOT};

/// Owned application state: roster plus grade log, mirrored to slots.
#[derive(Debug)]
pub struct DomainStore {
    slots: SlotStore,
    students: Vec<Student>,
    grades: Vec<Grade>,
}

impl DomainStore {
    /// Open the store in `data_dir`, hydrating both collections.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let slots = SlotStore::new(data_dir).await?;
        let students: Vec<Student> = slots.load(STUDENTS_SLOT).await?;
        let grades: Vec<Grade> = slots.load(GRADES_SLOT).await?;
        info!(
            "Loaded {} students and {} grades from {}",
            students.len(),
            grades.len(),
            data_dir.display()
        );
        Ok(Self {
            slots,
            students,
            grades,
        })
    }

    pub fn list_students(&self) -> &[Student] {
        &self.students
    }

    /// Grades in insertion order.
    pub fn list_grades(&self) -> &[Grade] {
        &self.grades
    }

    /// Grades as the roll-up table shows them, most recent first.
    pub fn grades_newest_first(&self) -> impl Iterator<Item = &Grade> {
        self.grades.iter().rev()
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn grade(&self, id: &str) -> Option<&Grade> {
        self.grades.iter().find(|g| g.id == id)
    }

    /// "Vorname Nachname" for a student id, or the unknown placeholder.
    pub fn student_display_name(&self, id: &str) -> String {
        self.student(id)
            .map(Student::full_name)
            .unwrap_or_else(|| UNKNOWN_STUDENT.to_string())
    }

    /// Append a student with a fresh id and persist the roster.
    pub async fn add_student(&mut self, data: NewStudent) -> Result<&Student> {
        let student = Student {
            id: Uuid::new_v4().to_string(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
        };
        debug!("Adding student {}", student.id);
        self.students.push(student);
        self.slots.save(STUDENTS_SLOT, &self.students).await?;
        Ok(&self.students[self.students.len() - 1])
    }

    /// Remove a student and every grade that references it.
    /// Unknown ids are a no-op.
    pub async fn delete_student(&mut self, id: &str) -> Result<()> {
        self.students.retain(|s| s.id != id);
        self.grades.retain(|g| g.student_id != id);
        debug!("Deleted student {} and its grades", id);
        self.slots.save(STUDENTS_SLOT, &self.students).await?;
        self.slots.save(GRADES_SLOT, &self.grades).await?;
        Ok(())
    }

    /// Append a grade with a fresh id and persist the grade log.
    /// The caller guarantees `student_id` refers to a roster entry.
    pub async fn add_grade(&mut self, data: NewGrade) -> Result<&Grade> {
        let grade = Grade {
            id: Uuid::new_v4().to_string(),
            student_id: data.student_id,
            subject: data.subject,
            grade: data.grade,
            comment: data.comment,
            date: data.date,
        };
        debug!("Adding grade {} for student {}", grade.id, grade.student_id);
        self.grades.push(grade);
        self.slots.save(GRADES_SLOT, &self.grades).await?;
        Ok(&self.grades[self.grades.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn new_student(first: &str, last: &str) -> NewStudent {
        NewStudent {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@beispiel.de", first.to_lowercase()),
        }
    }

    fn new_grade(student_id: &str, value: f64) -> NewGrade {
        NewGrade {
            student_id: student_id.to_string(),
            subject: "Mathematik".to_string(),
            grade: value,
            comment: String::new(),
            date: "1.9.2026".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_student_generates_unique_ids() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();

        for i in 0..20 {
            store.add_student(new_student("Kind", "Nummer")).await.unwrap();
            assert_eq!(store.list_students().len(), i + 1);
        }

        let ids: HashSet<&str> = store.list_students().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_delete_student_cascades_to_grades() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();

        let anna = store.add_student(new_student("Anna", "Berg")).await.unwrap().id.clone();
        let ben = store.add_student(new_student("Ben", "Adler")).await.unwrap().id.clone();
        store.add_grade(new_grade(&anna, 1.3)).await.unwrap();
        store.add_grade(new_grade(&ben, 2.7)).await.unwrap();
        store.add_grade(new_grade(&anna, 4.0)).await.unwrap();

        store.delete_student(&anna).await.unwrap();

        assert_eq!(store.list_students().len(), 1);
        assert_eq!(store.list_students()[0].id, ben);
        assert_eq!(store.list_grades().len(), 1);
        assert_eq!(store.list_grades()[0].student_id, ben);
        assert_eq!(store.list_grades()[0].grade, 2.7);
    }

    #[tokio::test]
    async fn test_delete_unknown_student_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
        let anna = store.add_student(new_student("Anna", "Berg")).await.unwrap().id.clone();
        store.add_grade(new_grade(&anna, 2.0)).await.unwrap();

        store.delete_student("does-not-exist").await.unwrap();

        assert_eq!(store.list_students().len(), 1);
        assert_eq!(store.list_grades().len(), 1);
    }

    #[tokio::test]
    async fn test_add_grade_is_append_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
        let anna = store.add_student(new_student("Anna", "Berg")).await.unwrap().id.clone();

        store.add_grade(new_grade(&anna, 1.0)).await.unwrap();
        let first = store.list_grades()[0].clone();
        store.add_grade(new_grade(&anna, 5.5)).await.unwrap();

        assert_eq!(store.list_grades().len(), 2);
        assert_eq!(store.list_grades()[0], first);
        assert_ne!(store.list_grades()[0].id, store.list_grades()[1].id);
    }

    #[tokio::test]
    async fn test_newest_first_and_name_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
        let anna = store.add_student(new_student("Anna", "Berg")).await.unwrap().id.clone();
        store.add_grade(new_grade(&anna, 1.0)).await.unwrap();
        store.add_grade(new_grade(&anna, 2.0)).await.unwrap();
        store.add_grade(new_grade("stale", 3.0)).await.unwrap();

        let order: Vec<f64> = store.grades_newest_first().map(|g| g.grade).collect();
        assert_eq!(order, vec![3.0, 2.0, 1.0]);
        assert_eq!(store.student_display_name(&anna), "Anna Berg");
        assert_eq!(store.student_display_name("stale"), UNKNOWN_STUDENT);
    }
}

//! In-memory backend for view and navigation tests.

use crate::domain::model::{Grade, NewGrade, NewUser, Role, User};
use crate::domain::ports::GradingApi;
use crate::utils::error::{GradebookError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::Mutex;

pub(crate) fn token_for(role: Role, user_id: i64) -> String {
    let payload = serde_json::json!({ "role": role.as_str(), "userId": user_id });
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.sig",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

fn user(id: i64, first: &str, last: &str, role: Role, parent_id: Option<i64>) -> User {
    User {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}@school.test", first.to_lowercase()),
        role,
        parent_id,
        subject: (role == Role::Teacher).then(|| "Maths".to_string()),
    }
}

#[derive(Debug)]
pub(crate) struct FakeApi {
    users: Mutex<Vec<User>>,
    grades: Mutex<Vec<Grade>>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        let users = vec![
            user(1, "Alma", "Admin", Role::Admin, None),
            user(2, "Tom", "Reed", Role::Teacher, None),
            user(3, "Petra", "Kovač", Role::Parent, None),
            user(10, "Ana", "Kovač", Role::Student, Some(3)),
            user(11, "Ben", "Novak", Role::Student, None),
        ];
        let grades = vec![
            Grade {
                id: 100,
                value: 80.0,
                subject: Some("Physics".into()),
                student_id: Some(10),
                student_name: Some("Ana Kovač".into()),
                teacher_id: Some(2),
                teacher_name: Some("Tom Reed".into()),
                parent_id: Some(3),
                created_at: Some("2024-01-05T14:30:00".into()),
            },
            Grade {
                id: 101,
                value: 91.5,
                subject: Some("Maths".into()),
                student_id: Some(10),
                student_name: Some("Ana Kovač".into()),
                teacher_id: Some(2),
                teacher_name: Some("Tom Reed".into()),
                parent_id: Some(3),
                created_at: None,
            },
        ];
        Self {
            users: Mutex::new(users),
            grades: Mutex::new(grades),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    /// 下一次呼叫回傳 500 與指定訊息
    pub(crate) fn fail_next(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn students(&self) -> Vec<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == Role::Student)
            .cloned()
            .collect()
    }

    pub(crate) fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    pub(crate) fn grades(&self) -> Vec<Grade> {
        self.grades.lock().unwrap().clone()
    }

    fn enter(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().take() {
            Some(message) => Err(GradebookError::ApiError {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    fn users_where(&self, keep: impl Fn(&User) -> bool) -> Vec<User> {
        self.users.lock().unwrap().iter().filter(|u| keep(*u)).cloned().collect()
    }
}

#[async_trait]
impl GradingApi for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> Result<String> {
        self.enter(format!("login({})", email))?;
        let found = self.users_where(|u| u.email == email);
        match found.first() {
            Some(u) => Ok(token_for(u.role, u.id)),
            None => Err(GradebookError::ApiError {
                status: 401,
                message: "Invalid credentials".into(),
            }),
        }
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        self.enter("all_users".into())?;
        Ok(self.users())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        self.enter(format!("create_user({})", new_user.email))?;
        let mut users = self.users.lock().unwrap();
        let created = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            email: new_user.email.clone(),
            role: new_user.role,
            parent_id: new_user.parent_id,
            subject: new_user.subject.clone(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn all_students(&self) -> Result<Vec<User>> {
        self.enter("all_students".into())?;
        Ok(self.users_where(|u| u.role == Role::Student))
    }

    async fn all_parents(&self) -> Result<Vec<User>> {
        self.enter("all_parents".into())?;
        Ok(self.users_where(|u| u.role == Role::Parent))
    }

    async fn teacher_by_id(&self, id: i64) -> Result<User> {
        self.enter(format!("teacher_by_id({})", id))?;
        self.users_where(|u| u.id == id && u.role == Role::Teacher)
            .into_iter()
            .next()
            .ok_or_else(|| GradebookError::ApiError {
                status: 404,
                message: "Teacher not found".into(),
            })
    }

    async fn children_of_parent(&self, parent_id: i64) -> Result<Vec<User>> {
        self.enter(format!("children_of_parent({})", parent_id))?;
        Ok(self.users_where(|u| u.parent_id == Some(parent_id)))
    }

    async fn user_by_id(&self, id: i64) -> Result<User> {
        self.enter(format!("user_by_id({})", id))?;
        self.users_where(|u| u.id == id)
            .into_iter()
            .next()
            .ok_or_else(|| GradebookError::ApiError {
                status: 404,
                message: "User not found".into(),
            })
    }

    async fn all_grades(&self) -> Result<Vec<Grade>> {
        self.enter("all_grades".into())?;
        Ok(self.grades())
    }

    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade> {
        self.enter(format!("create_grade({}, {})", grade.student_id, grade.value))?;
        let mut grades = self.grades.lock().unwrap();
        let created = Grade {
            id: grades.iter().map(|g| g.id).max().unwrap_or(0) + 1,
            value: grade.value,
            subject: Some("Maths".into()),
            student_id: Some(grade.student_id),
            student_name: None,
            teacher_id: Some(grade.teacher_id),
            teacher_name: None,
            parent_id: Some(grade.parent_id),
            created_at: None,
        };
        grades.push(created.clone());
        Ok(created)
    }

    async fn grades_for_student(&self, student_id: i64) -> Result<Vec<Grade>> {
        self.enter(format!("grades_for_student({})", student_id))?;
        Ok(self
            .grades()
            .into_iter()
            .filter(|g| g.student_id == Some(student_id))
            .collect())
    }

    async fn grades_for_parent(&self, parent_id: i64) -> Result<Vec<Grade>> {
        self.enter(format!("grades_for_parent({})", parent_id))?;
        Ok(self
            .grades()
            .into_iter()
            .filter(|g| g.parent_id == Some(parent_id))
            .collect())
    }
}

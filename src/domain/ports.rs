use crate::domain::model::{Grade, NewGrade, NewUser, User};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Token persistence, the terminal counterpart of browser local storage.
pub trait SessionStore: Send + Sync {
    fn load_token(&self) -> Result<Option<String>>;
    fn save_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// REST surface of the grading backend.
#[async_trait]
pub trait GradingApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<String>;

    async fn all_users(&self) -> Result<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn all_students(&self) -> Result<Vec<User>>;
    async fn all_parents(&self) -> Result<Vec<User>>;
    async fn teacher_by_id(&self, id: i64) -> Result<User>;
    async fn children_of_parent(&self, parent_id: i64) -> Result<Vec<User>>;
    async fn user_by_id(&self, id: i64) -> Result<User>;

    async fn all_grades(&self) -> Result<Vec<Grade>>;
    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade>;
    async fn grades_for_student(&self, student_id: i64) -> Result<Vec<Grade>>;
    async fn grades_for_parent(&self, parent_id: i64) -> Result<Vec<Grade>>;
}

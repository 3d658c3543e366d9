use crate::app::views::Loadable;
use crate::domain::model::{Grade, NewGrade, NewUser, Role, User, SUBJECTS};
use crate::domain::ports::GradingApi;
use crate::utils::error::{GradebookError, Result};
use crate::utils::validation::Validate;
use std::fmt::Write;

const GRADE_RANGE_MESSAGE: &str = "Grade must be a number between 0 and 100";
const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";
const PARENT_REQUIRED_MESSAGE: &str = "Please select a parent for the student";
const SUBJECT_REQUIRED_MESSAGE: &str = "Please select a subject for the teacher";

/// 伺服器錯誤留在表單上，讓使用者修正後重送
fn remember_failure(slot: &mut Option<String>, err: &GradebookError, fallback: &str) {
    let message = err.user_friendly_message();
    *slot = Some(if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    });
}

/// Teacher's form for grading one student.
#[derive(Debug, Clone)]
pub struct CreateGradeForm {
    student_id: i64,
    teacher_id: Option<i64>,
    parent_id: i64,
    value: String,
    error: Option<String>,
}

impl CreateGradeForm {
    pub fn new(student_id: i64, teacher_id: Option<i64>, parent_id: i64) -> Self {
        Self {
            student_id,
            teacher_id,
            parent_id,
            value: String::new(),
            error: None,
        }
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn to_request(&self) -> Result<NewGrade> {
        let value = self
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && (0.0..=100.0).contains(v))
            .ok_or_else(|| GradebookError::validation(GRADE_RANGE_MESSAGE))?;
        let teacher_id = self.teacher_id.ok_or_else(|| GradebookError::TokenError {
            message: "token carries no userId claim".to_string(),
        })?;
        Ok(NewGrade {
            student_id: self.student_id,
            teacher_id,
            parent_id: self.parent_id,
            value,
        })
    }

    /// Validates and posts the grade. The error stays on the form as well.
    pub async fn submit(&mut self, api: &dyn GradingApi) -> Result<Grade> {
        self.error = None;
        let request = match self.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        match api.create_grade(&request).await {
            Ok(grade) => {
                tracing::info!(
                    "✅ Grade {} created for student {}",
                    request.value,
                    request.student_id
                );
                Ok(grade)
            }
            Err(e) => {
                remember_failure(&mut self.error, &e, "Failed to create grade");
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("== Create New Grade ==\n");
        let _ = writeln!(out, "Grade Value (0-100): {}", self.value);
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }
        out
    }
}

impl Validate for CreateGradeForm {
    fn validate(&self) -> Result<()> {
        self.to_request().map(|_| ())
    }
}

/// Admin's form for creating a student, parent or teacher account.
#[derive(Debug, Clone, Default)]
pub struct CreateUserForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    role: Option<Role>,
    parent_id: Option<i64>,
    subject: Option<String>,
    parents: Option<Loadable<Vec<User>>>,
    error: Option<String>,
}

impl CreateUserForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Parents offered for a student account, once loaded.
    pub fn parents(&self) -> &[User] {
        self.parents
            .as_ref()
            .and_then(|p| p.loaded())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 換角色時清掉家長與科目
    pub fn set_role(&mut self, role: Option<Role>) {
        self.role = role;
        self.parent_id = None;
        self.subject = None;
        if role != Some(Role::Student) {
            self.parents = None;
        }
    }

    /// Sets the role and, for students, fetches the parent choices.
    pub async fn choose_role(&mut self, role: Option<Role>, api: &dyn GradingApi) {
        self.set_role(role);
        if role == Some(Role::Student) {
            self.load_parents(api).await;
        }
    }

    /// 家長清單載入失敗只記 log，不擋表單
    pub async fn load_parents(&mut self, api: &dyn GradingApi) {
        self.parents = Some(Loadable::Loading);
        match api.all_parents().await {
            Ok(parents) => self.parents = Some(Loadable::Loaded(parents)),
            Err(e) => {
                tracing::error!("Failed to load parents: {}", e);
                self.parents = Some(Loadable::Loaded(Vec::new()));
            }
        }
    }

    pub fn set_parent(&mut self, parent_id: Option<i64>) {
        self.parent_id = parent_id;
    }

    pub fn set_subject(&mut self, subject: Option<String>) {
        self.subject = subject.filter(|s| !s.trim().is_empty());
    }

    pub fn to_request(&self) -> Result<NewUser> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.email)
            || blank(&self.password)
            || blank(&self.first_name)
            || blank(&self.last_name)
        {
            return Err(GradebookError::validation(REQUIRED_FIELDS_MESSAGE));
        }
        let role = self
            .role
            .filter(|r| Role::assignable().contains(r))
            .ok_or_else(|| GradebookError::validation(REQUIRED_FIELDS_MESSAGE))?;

        let parent_id = match role {
            Role::Student => Some(
                self.parent_id
                    .ok_or_else(|| GradebookError::validation(PARENT_REQUIRED_MESSAGE))?,
            ),
            _ => None,
        };
        let subject = match role {
            Role::Teacher => Some(
                self.subject
                    .clone()
                    .filter(|s| SUBJECTS.contains(&s.as_str()))
                    .ok_or_else(|| GradebookError::validation(SUBJECT_REQUIRED_MESSAGE))?,
            ),
            _ => None,
        };

        Ok(NewUser {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role,
            parent_id,
            subject,
        })
    }

    pub async fn submit(&mut self, api: &dyn GradingApi) -> Result<User> {
        self.error = None;
        let request = match self.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        match api.create_user(&request).await {
            Ok(user) => {
                tracing::info!("✅ Created {} account for {}", user.role, user.email);
                Ok(user)
            }
            Err(e) => {
                remember_failure(&mut self.error, &e, "Failed to create user");
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("== Create New User ==\n");
        let _ = writeln!(out, "Email *:      {}", self.email);
        let _ = writeln!(out, "Password *:   {}", "*".repeat(self.password.chars().count()));
        let _ = writeln!(out, "First Name *: {}", self.first_name);
        let _ = writeln!(out, "Last Name *:  {}", self.last_name);
        let _ = writeln!(
            out,
            "Role *:       {}",
            self.role.map(|r| r.as_str()).unwrap_or("Select role")
        );
        match self.role {
            Some(Role::Student) => match &self.parents {
                Some(Loadable::Loading) | None => out.push_str("Parent *:     Loading parents...\n"),
                Some(_) => {
                    let chosen = self
                        .parents()
                        .iter()
                        .find(|p| Some(p.id) == self.parent_id)
                        .map(|p| format!("{} ({})", p.full_name(), p.email))
                        .unwrap_or_else(|| "Select parent".to_string());
                    let _ = writeln!(out, "Parent *:     {}", chosen);
                }
            },
            Some(Role::Teacher) => {
                let _ = writeln!(
                    out,
                    "Subject *:    {}",
                    self.subject.as_deref().unwrap_or("Select subject")
                );
            }
            _ => {}
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }
        out
    }
}

impl Validate for CreateUserForm {
    fn validate(&self) -> Result<()> {
        self.to_request().map(|_| ())
    }
}

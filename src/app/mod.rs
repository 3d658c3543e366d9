//! Screen navigation for the terminal front-end.
//!
//! After login the role claim picks the home screen:
//!
//! * TEACHER: students list, then a student's details and the grade form
//! * PARENT: children list, then one child's grades
//! * STUDENT: own grades
//! * ADMIN: users list and the create-user form
//!
//! Every screen fetches on entry, the same way a page does when it mounts.

#[cfg(feature = "cli")]
pub mod commands;
pub mod forms;
pub mod shell;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

use crate::core::session::Session;
use crate::domain::model::Role;
use crate::domain::ports::GradingApi;
use crate::utils::error::{GradebookError, Result};
use forms::{CreateGradeForm, CreateUserForm};
use std::sync::Arc;
use views::{GradesView, ListKind, StudentDetailsView, UserListView};

pub const WELCOME_MESSAGE: &str = "You are successfully logged in!";

#[derive(Debug, Clone)]
pub enum Screen {
    Login,
    Students(UserListView),
    StudentDetails {
        details: StudentDetailsView,
        grade_form: Option<CreateGradeForm>,
    },
    Children(UserListView),
    ChildGrades(GradesView),
    OwnGrades(GradesView),
    Users(UserListView),
    CreateUser(CreateUserForm),
    Welcome,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Login => "login",
            Screen::Students(_) => "students",
            Screen::StudentDetails { .. } => "student-details",
            Screen::Children(_) => "children",
            Screen::ChildGrades(_) => "child-grades",
            Screen::OwnGrades(_) => "grades",
            Screen::Users(_) => "users",
            Screen::CreateUser(_) => "create-user",
            Screen::Welcome => "welcome",
        }
    }
}

pub struct App {
    api: Arc<dyn GradingApi>,
    session: Session,
    screen: Screen,
    users_refresh: u64,
    notice: Option<String>,
}

impl App {
    pub fn new(api: Arc<dyn GradingApi>, session: Session) -> Self {
        Self {
            api,
            session,
            screen: Screen::Login,
            users_refresh: 0,
            notice: None,
        }
    }

    /// 已有 token 就直接進首頁
    pub async fn start(&mut self) {
        if self.session.is_authenticated() {
            self.go_home().await;
        } else {
            self.screen = Screen::Login;
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> Arc<dyn GradingApi> {
        Arc::clone(&self.api)
    }

    /// How many times the admin's user list was refreshed after a create.
    pub fn users_refresh(&self) -> u64 {
        self.users_refresh
    }

    /// One-shot message shown above the next rendered screen.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.session.login(self.api.as_ref(), email, password).await?;
        self.go_home().await;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        self.screen = Screen::Login;
        self.notice = None;
        Ok(())
    }

    /// Role dispatch, then load the landing view.
    pub async fn go_home(&mut self) {
        let role = self.session.role();
        tracing::debug!("User role: {:?}", role);
        let api = self.api();
        self.screen = match role {
            Some(Role::Teacher) => {
                let mut view = UserListView::new(ListKind::Students);
                view.load(api.as_ref()).await;
                Screen::Students(view)
            }
            Some(Role::Parent) => {
                let mut view = UserListView::new(ListKind::Children {
                    parent_id: self.session.user_id(),
                });
                view.load(api.as_ref()).await;
                Screen::Children(view)
            }
            Some(Role::Student) => {
                let mut view = GradesView::own(role, self.session.user_id());
                view.load(api.as_ref()).await;
                Screen::OwnGrades(view)
            }
            Some(Role::Admin) => {
                let mut view = UserListView::new(ListKind::Users);
                view.load(api.as_ref()).await;
                Screen::Users(view)
            }
            Some(Role::Unknown) | None => Screen::Welcome,
        };
    }

    /// Opens entry `number` (1-based) of the current list.
    pub async fn open(&mut self, number: usize) -> Result<()> {
        let api = self.api();
        let next = match &self.screen {
            Screen::Students(list) => {
                let student = list.select(number).cloned().ok_or_else(|| no_entry(number))?;
                let mut details = StudentDetailsView::new(student.id, Some(student));
                details.load(api.as_ref()).await;
                Screen::StudentDetails {
                    details,
                    grade_form: None,
                }
            }
            Screen::Children(list) => {
                let child = list.select(number).ok_or_else(|| no_entry(number))?;
                let mut grades = GradesView::for_child(self.session.role(), child.id);
                grades.load(api.as_ref()).await;
                Screen::ChildGrades(grades)
            }
            other => {
                return Err(GradebookError::validation(format!(
                    "Nothing to open on the {} screen",
                    other.name()
                )))
            }
        };
        self.screen = next;
        Ok(())
    }

    /// Back / Cancel. Lists are fetched again when they come back.
    pub async fn back(&mut self) {
        if let Screen::StudentDetails {
            grade_form: grade_form @ Some(_),
            ..
        } = &mut self.screen
        {
            *grade_form = None;
            return;
        }
        if matches!(
            self.screen,
            Screen::StudentDetails { .. } | Screen::ChildGrades(_) | Screen::CreateUser(_)
        ) {
            self.go_home().await;
        }
    }

    pub async fn retry(&mut self) {
        let api = self.api();
        match &mut self.screen {
            Screen::Students(view) | Screen::Children(view) | Screen::Users(view) => {
                view.retry(api.as_ref()).await
            }
            Screen::OwnGrades(view) | Screen::ChildGrades(view) => view.retry(api.as_ref()).await,
            Screen::StudentDetails { details, .. } => details.load(api.as_ref()).await,
            _ => {}
        }
    }

    /// "Create Grade" on a student card, "Create New User" on the users list.
    pub fn open_form(&mut self) -> Result<()> {
        if matches!(self.screen, Screen::Users(_)) {
            self.screen = Screen::CreateUser(CreateUserForm::new());
            return Ok(());
        }
        let teacher_id = self.session.user_id();
        match &mut self.screen {
            Screen::StudentDetails {
                details,
                grade_form,
            } => {
                if details.state().loaded().is_none() {
                    return Err(GradebookError::validation(
                        "Student details are not loaded, go back to the list",
                    ));
                }
                let parent_id = details.parent_id().ok_or_else(|| {
                    GradebookError::validation("This student has no parent, grades cannot be created")
                })?;
                *grade_form = Some(CreateGradeForm::new(
                    details.student_id(),
                    teacher_id,
                    parent_id,
                ));
                Ok(())
            }
            other => Err(GradebookError::validation(format!(
                "No form is available on the {} screen",
                other.name()
            ))),
        }
    }

    pub fn grade_form_mut(&mut self) -> Option<&mut CreateGradeForm> {
        match &mut self.screen {
            Screen::StudentDetails { grade_form, .. } => grade_form.as_mut(),
            _ => None,
        }
    }

    pub fn user_form_mut(&mut self) -> Option<&mut CreateUserForm> {
        match &mut self.screen {
            Screen::CreateUser(form) => Some(form),
            _ => None,
        }
    }

    /// Submits whichever form is open; the form keeps its error on failure.
    pub async fn submit_form(&mut self) -> Result<()> {
        let api = self.api();
        match &mut self.screen {
            Screen::StudentDetails {
                grade_form: Some(form),
                ..
            } => {
                form.submit(api.as_ref()).await?;
                self.grade_form_closed("Grade created successfully!");
                Ok(())
            }
            Screen::CreateUser(form) => {
                form.submit(api.as_ref()).await?;
                self.users_refresh += 1;
                let mut view = UserListView::new(ListKind::Users);
                view.load(api.as_ref()).await;
                self.screen = Screen::Users(view);
                self.notice = Some("User created successfully!".to_string());
                Ok(())
            }
            other => Err(GradebookError::validation(format!(
                "No form is open on the {} screen",
                other.name()
            ))),
        }
    }

    fn grade_form_closed(&mut self, notice: &str) {
        if let Screen::StudentDetails { grade_form, .. } = &mut self.screen {
            *grade_form = None;
        }
        self.notice = Some(notice.to_string());
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if !matches!(self.screen, Screen::Login) {
            out.push_str("=== Gradebook ===  [logout] Logout\n");
        }
        let body = match &self.screen {
            Screen::Login => "== Login ==\nEmail and password required".to_string(),
            Screen::Students(view) | Screen::Children(view) | Screen::Users(view) => {
                let mut body = view.render();
                if matches!(self.screen, Screen::Users(_)) && view.state().loaded().is_some() {
                    body.push_str("[new] Create New User\n");
                }
                body
            }
            Screen::StudentDetails {
                details,
                grade_form,
            } => {
                let mut body = details.render();
                if let Some(form) = grade_form {
                    body.push('\n');
                    body.push_str(&form.render());
                }
                body
            }
            Screen::ChildGrades(view) | Screen::OwnGrades(view) => view.render(),
            Screen::CreateUser(form) => form.render(),
            Screen::Welcome => WELCOME_MESSAGE.to_string(),
        };
        out.push_str(&body);
        out
    }
}

fn no_entry(number: usize) -> GradebookError {
    GradebookError::validation(format!("There is no entry number {}", number))
}

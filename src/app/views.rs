use crate::core::grades::{format_date, format_grade_value, group_by_subject};
use crate::domain::model::{Grade, Role, User};
use crate::domain::ports::GradingApi;
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

/// State of one fetch-backed view.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    /// 錯誤訊息為空時用 fallback
    pub fn from_result(result: Result<T>, fallback: &str) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(e) => {
                let message = e.user_friendly_message();
                tracing::warn!("❌ {}: {}", fallback, message);
                if message.trim().is_empty() {
                    Loadable::Failed(fallback.to_string())
                } else {
                    Loadable::Failed(message)
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Students,
    /// Children of the given parent; `None` when the token has no user id.
    Children { parent_id: Option<i64> },
    Parents,
    Users,
}

impl ListKind {
    fn noun(&self) -> &'static str {
        match self {
            ListKind::Students => "students",
            ListKind::Children { .. } => "children",
            ListKind::Parents => "parents",
            ListKind::Users => "users",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ListKind::Students => "Students",
            ListKind::Children { .. } => "My Children",
            ListKind::Parents => "Parents",
            ListKind::Users => "Users",
        }
    }
}

/// Students (teacher), children (parent) or all users (admin).
#[derive(Debug, Clone)]
pub struct UserListView {
    kind: ListKind,
    state: Loadable<Vec<User>>,
}

impl UserListView {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            state: Loadable::Loading,
        }
    }

    /// A view over data that was already fetched.
    pub fn loaded(kind: ListKind, users: Vec<User>) -> Self {
        Self {
            kind,
            state: Loadable::Loaded(users),
        }
    }

    pub fn state(&self) -> &Loadable<Vec<User>> {
        &self.state
    }

    pub async fn load(&mut self, api: &dyn GradingApi) {
        self.state = Loadable::Loading;
        let fallback = format!("Failed to load {}", self.kind.noun());
        let result = match self.kind {
            ListKind::Students => api.all_students().await,
            ListKind::Children {
                parent_id: Some(parent_id),
            } => api.children_of_parent(parent_id).await,
            ListKind::Children { parent_id: None } => {
                self.state = Loadable::Failed(fallback);
                return;
            }
            ListKind::Parents => api.all_parents().await,
            ListKind::Users => api.all_users().await,
        };
        self.state = Loadable::from_result(result, &fallback);
        if let Loadable::Loaded(users) = &self.state {
            tracing::debug!("Loaded {} {}", users.len(), self.kind.noun());
        }
    }

    pub async fn retry(&mut self, api: &dyn GradingApi) {
        self.load(api).await;
    }

    /// 1-based，和畫面上的編號一致
    pub fn select(&self, number: usize) -> Option<&User> {
        let users = self.state.loaded()?;
        number.checked_sub(1).and_then(|i| users.get(i))
    }

    pub fn render(&self) -> String {
        let noun = self.kind.noun();
        match &self.state {
            Loadable::Loading => format!("Loading {}...", noun),
            Loadable::Failed(message) => format!("Error: {}\n[retry] Retry", message),
            Loadable::Loaded(users) => {
                let mut out = format!("== {} ==\n", self.kind.title());
                if users.is_empty() {
                    let _ = writeln!(out, "No {} found", noun);
                    return out;
                }
                for (i, user) in users.iter().enumerate() {
                    let _ = write!(out, "{:>3}. {} <{}>", i + 1, user.full_name(), user.email);
                    match self.kind {
                        ListKind::Users | ListKind::Parents => {
                            let _ = writeln!(out, "  {}", user.role);
                        }
                        _ => {
                            let _ = writeln!(out, "  ->");
                        }
                    }
                }
                out
            }
        }
    }
}

/// Detail card for one student, opened from the teacher's list.
#[derive(Debug, Clone)]
pub struct StudentDetailsView {
    student_id: i64,
    /// List entry the teacher clicked; carries the parent id for grading.
    selected: Option<User>,
    state: Loadable<User>,
}

impl StudentDetailsView {
    pub fn new(student_id: i64, selected: Option<User>) -> Self {
        Self {
            student_id,
            selected,
            state: Loadable::Loading,
        }
    }

    pub fn loaded(student: User) -> Self {
        Self {
            student_id: student.id,
            selected: Some(student.clone()),
            state: Loadable::Loaded(student),
        }
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn state(&self) -> &Loadable<User> {
        &self.state
    }

    pub async fn load(&mut self, api: &dyn GradingApi) {
        self.state = Loadable::Loading;
        let result = api.user_by_id(self.student_id).await;
        self.state = Loadable::from_result(result, "Failed to load user details");
    }

    /// 只有學生有家長時才能給分
    pub fn parent_id(&self) -> Option<i64> {
        self.selected.as_ref().and_then(|s| s.parent_id)
    }

    /// 資料載入失敗時不能給分
    pub fn can_create_grade(&self) -> bool {
        self.state.loaded().is_some() && self.parent_id().is_some()
    }

    pub fn render(&self) -> String {
        match &self.state {
            Loadable::Loading => "Loading student details...".to_string(),
            Loadable::Failed(message) => format!("Error: {}\n[back] Back to List", message),
            Loadable::Loaded(user) => {
                let mut out = String::from("[back] Back to Students\n== Student Details ==\n");
                let _ = writeln!(out, "ID:         {}", user.id);
                let _ = writeln!(out, "First Name: {}", user.first_name);
                let _ = writeln!(out, "Last Name:  {}", user.last_name);
                let _ = writeln!(out, "Email:      {}", user.email);
                let _ = writeln!(out, "Role:       {}", user.role);
                if self.can_create_grade() {
                    let _ = writeln!(out, "[new] Create Grade");
                }
                out
            }
        }
    }
}

/// Grades grouped by subject.
#[derive(Debug, Clone)]
pub struct GradesView {
    role: Option<Role>,
    student_id: Option<i64>,
    with_back: bool,
    state: Loadable<BTreeMap<String, Vec<Grade>>>,
}

impl GradesView {
    /// 學生看自己的成績
    pub fn own(role: Option<Role>, user_id: Option<i64>) -> Self {
        Self {
            role,
            student_id: user_id,
            with_back: false,
            state: Loadable::Loading,
        }
    }

    /// 家長點進某個孩子
    pub fn for_child(role: Option<Role>, child_id: i64) -> Self {
        Self {
            role,
            student_id: Some(child_id),
            with_back: true,
            state: Loadable::Loading,
        }
    }

    /// Every grade in the system, for admins.
    pub fn all(role: Option<Role>) -> Self {
        Self {
            role,
            student_id: None,
            with_back: false,
            state: Loadable::Loading,
        }
    }

    pub fn with_grades(mut self, grades: Vec<Grade>) -> Self {
        self.state = Loadable::Loaded(group_by_subject(grades));
        self
    }

    pub fn state(&self) -> &Loadable<BTreeMap<String, Vec<Grade>>> {
        &self.state
    }

    pub async fn load(&mut self, api: &dyn GradingApi) {
        self.state = Loadable::Loading;
        let Some(student_id) = self.student_id else {
            self.state = Loadable::Failed("Failed to load grades".to_string());
            return;
        };
        let result = api.grades_for_student(student_id).await.map(group_by_subject);
        self.state = Loadable::from_result(result, "Failed to load grades");
    }

    pub async fn retry(&mut self, api: &dyn GradingApi) {
        self.load(api).await;
    }

    pub fn title(&self) -> &'static str {
        if self.role == Some(Role::Student) {
            "My Grades"
        } else {
            "Grades"
        }
    }

    pub fn render(&self) -> String {
        match &self.state {
            Loadable::Loading => "Loading grades...".to_string(),
            Loadable::Failed(message) => format!("Error: {}\n[retry] Retry", message),
            Loadable::Loaded(grouped) => {
                let mut out = String::new();
                if self.with_back {
                    out.push_str("[back] Back\n");
                }
                let _ = writeln!(out, "== {} ==", self.title());
                if grouped.is_empty() {
                    out.push_str("No grades found\n");
                    return out;
                }
                let show_student = matches!(self.role, Some(Role::Parent) | Some(Role::Admin));
                for (subject, grades) in grouped {
                    let _ = writeln!(out, "-- {} --", subject);
                    for grade in grades {
                        let _ = write!(out, "  {:>5}", format_grade_value(grade.value));
                        if show_student {
                            let _ = write!(out, "  {}", grade.student_name.as_deref().unwrap_or(""));
                        }
                        let _ = writeln!(
                            out,
                            "  Teacher: {}  Date: {}",
                            grade.teacher_name.as_deref().unwrap_or(""),
                            format_date(grade.created_at.as_deref())
                        );
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::FakeApi;
    use crate::domain::model::Role;

    #[tokio::test]
    async fn students_list_goes_from_loading_to_loaded() {
        let api = FakeApi::default();
        let mut view = UserListView::new(ListKind::Students);
        assert!(view.state().is_loading());
        assert_eq!(view.render(), "Loading students...");

        view.load(&api).await;
        let rendered = view.render();
        assert!(rendered.starts_with("== Students =="));
        assert!(rendered.contains("1. Ana Kovač <ana@school.test>"));
        assert_eq!(view.select(1).map(|u| u.id), Some(10));
        assert!(view.select(0).is_none());
        assert!(view.select(9).is_none());
    }

    #[tokio::test]
    async fn failed_load_shows_server_text_and_retry_recovers() {
        let api = FakeApi::default();
        api.fail_next("Database unavailable");

        let mut view = UserListView::new(ListKind::Users);
        view.load(&api).await;
        assert_eq!(view.state().error(), Some("Database unavailable"));
        assert!(view.render().contains("[retry] Retry"));

        view.retry(&api).await;
        assert!(view.state().loaded().is_some());
        assert!(view.render().contains("ADMIN"));
    }

    #[tokio::test]
    async fn empty_server_text_falls_back_to_view_message() {
        let api = FakeApi::default();
        api.fail_next("");
        let mut view = UserListView::new(ListKind::Children { parent_id: Some(3) });
        view.load(&api).await;
        assert_eq!(view.state().error(), Some("Failed to load children"));
    }

    #[tokio::test]
    async fn children_without_user_id_fail_without_calling_backend() {
        let api = FakeApi::default();
        let mut view = UserListView::new(ListKind::Children { parent_id: None });
        view.load(&api).await;
        assert_eq!(view.state().error(), Some("Failed to load children"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_children_list_says_so() {
        let api = FakeApi::default();
        let mut view = UserListView::new(ListKind::Children { parent_id: Some(999) });
        view.load(&api).await;
        assert!(view.render().contains("No children found"));
        assert_eq!(api.calls(), vec!["children_of_parent(999)".to_string()]);
    }

    #[tokio::test]
    async fn student_details_offer_grading_only_with_parent() {
        let api = FakeApi::default();
        let with_parent = api.students()[0].clone();
        let mut view = StudentDetailsView::new(with_parent.id, Some(with_parent));
        view.load(&api).await;
        assert!(view.can_create_grade());
        assert!(view.render().contains("[new] Create Grade"));

        let orphan = api.students()[1].clone();
        let mut view = StudentDetailsView::new(orphan.id, Some(orphan));
        view.load(&api).await;
        assert!(!view.can_create_grade());
        assert!(!view.render().contains("Create Grade"));
    }

    #[tokio::test]
    async fn student_details_error_offers_back_not_retry() {
        let api = FakeApi::default();
        api.fail_next("User not found");
        let mut view = StudentDetailsView::new(404, None);
        view.load(&api).await;
        let rendered = view.render();
        assert!(rendered.contains("User not found"));
        assert!(rendered.contains("[back] Back to List"));
        assert!(!rendered.contains("Retry"));
    }

    #[tokio::test]
    async fn failed_details_never_allow_grading() {
        let api = FakeApi::default();
        let with_parent = api.students()[0].clone();
        api.fail_next("User service down");
        let mut view = StudentDetailsView::new(with_parent.id, Some(with_parent));
        view.load(&api).await;
        assert_eq!(view.parent_id(), Some(3));
        assert!(!view.can_create_grade());
        assert!(!view.render().contains("Create Grade"));
    }

    #[tokio::test]
    async fn grades_view_groups_and_titles_by_role() {
        let api = FakeApi::default();
        let mut own = GradesView::own(Some(Role::Student), Some(10));
        own.load(&api).await;
        let rendered = own.render();
        assert!(rendered.contains("== My Grades =="));
        let maths = rendered.find("-- Maths --").unwrap();
        let physics = rendered.find("-- Physics --").unwrap();
        assert!(maths < physics);
        assert!(rendered.contains("91.5"));
        assert!(!rendered.contains("Ana Kovač"));

        let mut child = GradesView::for_child(Some(Role::Parent), 10);
        child.load(&api).await;
        let rendered = child.render();
        assert!(rendered.starts_with("[back] Back"));
        assert!(rendered.contains("== Grades =="));
        assert!(rendered.contains("Ana Kovač"));
    }

    #[tokio::test]
    async fn grades_view_without_student_fails() {
        let api = FakeApi::default();
        let mut view = GradesView::own(Some(Role::Student), None);
        view.load(&api).await;
        assert_eq!(view.state().error(), Some("Failed to load grades"));
    }

    #[tokio::test]
    async fn grades_view_with_no_grades() {
        let api = FakeApi::default();
        let mut view = GradesView::own(Some(Role::Student), Some(11));
        view.load(&api).await;
        assert!(view.render().contains("No grades found"));
    }
}

//! One-shot subcommands. Each one fetches, renders and returns the text;
//! failures propagate so the binary can pick an exit code.

use crate::app::forms::{CreateGradeForm, CreateUserForm};
use crate::app::views::{GradesView, ListKind, StudentDetailsView, UserListView};
use crate::config::cli::Command;
use crate::core::session::Session;
use crate::domain::model::{Role, User};
use crate::domain::ports::GradingApi;
use crate::utils::error::{GradebookError, Result};
use std::fmt::Write;
use std::str::FromStr;

pub async fn execute(command: &Command, api: &dyn GradingApi, session: &Session) -> Result<String> {
    match command {
        Command::Login { email, password } => {
            let claims = session.login(api, email, password).await?;
            Ok(format!(
                "✅ Logged in as {} ({})",
                email,
                claims.role.map(|r| r.as_str()).unwrap_or("no role")
            ))
        }
        Command::Logout => {
            session.logout()?;
            Ok("Logged out".to_string())
        }
        Command::Whoami => whoami(session),
        Command::Profile => profile(api, session).await,
        Command::Students => {
            session.require_role(Role::Teacher)?;
            let students = api.all_students().await?;
            Ok(UserListView::loaded(ListKind::Students, students).render())
        }
        Command::Student { id } => {
            session.require_role(Role::Teacher)?;
            let student = api.user_by_id(*id).await?;
            Ok(StudentDetailsView::loaded(student).render())
        }
        Command::Children => {
            session.require_role(Role::Parent)?;
            let parent_id = session.require_user_id()?;
            let children = api.children_of_parent(parent_id).await?;
            Ok(UserListView::loaded(ListKind::Children { parent_id: Some(parent_id) }, children).render())
        }
        Command::Parents => {
            session.require_role(Role::Admin)?;
            let parents = api.all_parents().await?;
            Ok(UserListView::loaded(ListKind::Parents, parents).render())
        }
        Command::Users => {
            session.require_role(Role::Admin)?;
            let users = api.all_users().await?;
            Ok(UserListView::loaded(ListKind::Users, users).render())
        }
        Command::Grades {
            student,
            children,
            all,
        } => grades(api, session, *student, *children, *all).await,
        Command::CreateUser {
            email,
            password,
            first_name,
            last_name,
            role,
            parent_id,
            subject,
        } => {
            session.require_role(Role::Admin)?;
            let role = Role::from_str(role).map_err(GradebookError::validation)?;
            let mut form = CreateUserForm::new();
            form.email = email.clone();
            form.password = password.clone();
            form.first_name = first_name.clone();
            form.last_name = last_name.clone();
            form.set_role(Some(role));
            form.set_parent(*parent_id);
            form.set_subject(subject.clone());
            let user = form.submit(api).await?;
            Ok(format!(
                "✅ Created {} account #{} for {} <{}>",
                user.role,
                user.id,
                user.full_name(),
                user.email
            ))
        }
        Command::CreateGrade {
            student,
            value,
            parent,
        } => {
            session.require_role(Role::Teacher)?;
            let parent_id = match parent {
                Some(parent_id) => *parent_id,
                None => api.user_by_id(*student).await?.parent_id.ok_or_else(|| {
                    GradebookError::validation("This student has no parent, grades cannot be created")
                })?,
            };
            let mut form = CreateGradeForm::new(*student, session.user_id(), parent_id);
            form.set_value(value.clone());
            form.submit(api).await?;
            Ok("✅ Grade created successfully!".to_string())
        }
        Command::Shell => Err(GradebookError::ConfigError {
            message: "the shell runs from the binary entry point".to_string(),
        }),
    }
}

fn whoami(session: &Session) -> Result<String> {
    let claims = session.claims()?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Role:    {}",
        claims.role.map(|r| r.as_str()).unwrap_or("unknown")
    );
    let _ = writeln!(
        out,
        "User id: {}",
        claims.user_id.map(|id| id.to_string()).unwrap_or_else(|| "unknown".into())
    );
    if let Some(sub) = &claims.sub {
        let _ = writeln!(out, "Subject: {}", sub);
    }
    if let Some(exp) = claims.exp {
        let expires = chrono::DateTime::from_timestamp(exp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| exp.to_string());
        let _ = writeln!(out, "Expires: {}", expires);
    }
    Ok(out)
}

async fn profile(api: &dyn GradingApi, session: &Session) -> Result<String> {
    let id = session.require_user_id()?;
    let user: User = match session.role() {
        Some(Role::Teacher) => api.teacher_by_id(id).await?,
        _ => api.user_by_id(id).await?,
    };
    let mut out = String::from("== Profile ==\n");
    let _ = writeln!(out, "ID:         {}", user.id);
    let _ = writeln!(out, "Name:       {}", user.full_name());
    let _ = writeln!(out, "Email:      {}", user.email);
    let _ = writeln!(out, "Role:       {}", user.role);
    if let Some(subject) = &user.subject {
        let _ = writeln!(out, "Subject:    {}", subject);
    }
    if let Some(parent_id) = user.parent_id {
        let _ = writeln!(out, "Parent ID:  {}", parent_id);
    }
    Ok(out)
}

async fn grades(
    api: &dyn GradingApi,
    session: &Session,
    student: Option<i64>,
    children: bool,
    all: bool,
) -> Result<String> {
    let role = session.claims()?.role;
    let view = if all {
        session.require_role(Role::Admin)?;
        GradesView::all(role).with_grades(api.all_grades().await?)
    } else if children {
        session.require_role(Role::Parent)?;
        let parent_id = session.require_user_id()?;
        GradesView::all(role).with_grades(api.grades_for_parent(parent_id).await?)
    } else if let Some(student_id) = student {
        GradesView::own(role, Some(student_id)).with_grades(api.grades_for_student(student_id).await?)
    } else {
        let own = session.require_user_id()?;
        GradesView::own(role, Some(own)).with_grades(api.grades_for_student(own).await?)
    };
    Ok(view.render())
}

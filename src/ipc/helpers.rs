use crate::app::App;
use crate::calendar::CalendarCell;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::parse_date;
use chrono::NaiveDate;
use serde_json::json;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Absent and `null` are both `None`; anything but a string is rejected.
pub fn get_optional_str(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be string or null", key))),
    }
}

pub fn get_required_day(params: &serde_json::Value) -> Result<u32, HandlerErr> {
    params
        .get("day")
        .and_then(|v| v.as_u64())
        .and_then(|d| u32::try_from(d).ok())
        .ok_or_else(|| HandlerErr::bad_params("missing day"))
}

/// `params.today` when given, else the local date.
pub fn get_today(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match get_optional_str(params, "today")? {
        Some(raw) => {
            parse_date(&raw).ok_or_else(|| HandlerErr::bad_params("today must be YYYY-MM-DD"))
        }
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn require_session(app: &App) -> Result<(), HandlerErr> {
    if app.session.identity().is_none() {
        return Err(HandlerErr::new("not_logged_in", "log in first"));
    }
    Ok(())
}

pub fn require_tutor(app: &App) -> Result<(), HandlerErr> {
    require_session(app)?;
    if !app.session.is_tutor() {
        return Err(HandlerErr::new("forbidden", "only the tutor can do that"));
    }
    Ok(())
}

/// Runs `f` against the configured app, or answers `not_configured`.
pub fn with_app<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&mut App, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(app) = state.app.as_mut() else {
        return err(
            &req.id,
            "not_configured",
            "gateway credentials missing; see setup.instructions",
            None,
        );
    };
    match f(app, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn roster_json(app: &App) -> serde_json::Value {
    json!({
        "students": app.roster.students(),
        "loaded": app.roster.loaded(),
        "pendingDelete": app.roster.pending_delete().map(|s| json!({
            "studentId": s.id,
            "name": s.name,
        })),
    })
}

pub fn modal_json(app: &App) -> serde_json::Value {
    json!({
        "open": app.modal.is_open(),
        "draft": app.modal.draft(),
    })
}

pub fn calendar_json(app: &App, today: NaiveDate) -> serde_json::Value {
    let month = app.calendar.month();
    let cells: Vec<CalendarCell> = app.render(today);
    json!({
        "month": month.key(),
        "label": month.label(),
        "studentId": app.calendar.student_id(),
        "leadingBlanks": month.leading_blanks(),
        "daysInMonth": month.days(),
        "loading": app.calendar.loading(),
        "cells": cells,
    })
}

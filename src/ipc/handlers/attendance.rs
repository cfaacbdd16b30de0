use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    calendar_json, get_optional_str, get_required_day, get_today, modal_json, require_tutor,
    with_app,
};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use serde_json::json;

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let day = get_required_day(params)?;
        if app.calendar.student_id().is_none() {
            return Err(HandlerErr::validation("Please select a student"));
        }
        let month = app.calendar.month();
        if month.date_of(day).is_none() {
            return Err(HandlerErr::bad_params("day out of range for month"));
        }
        app.modal.open(day, app.calendar.record_for_day(day));
        Ok(modal_json(app))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let status = get_optional_str(params, "status")?
            .map(|s| s.parse::<AttendanceStatus>())
            .transpose()
            .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
        let comment = get_optional_str(params, "comment")?;
        let Some(draft) = app.modal.draft_mut() else {
            return Err(HandlerErr::new("not_open", "no day is being edited"));
        };
        if let Some(status) = status {
            draft.status = status;
        }
        if let Some(comment) = comment {
            draft.comment = comment;
        }
        Ok(modal_json(app))
    })
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let today = get_today(params)?;
        if !app.save_modal() {
            return Err(HandlerErr::new("not_open", "no day is being edited"));
        }
        Ok(json!({
            "modal": modal_json(app),
            "calendar": calendar_json(app, today),
        }))
    })
}

fn handle_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        require_tutor(app)?;
        app.modal.cancel();
        Ok(modal_json(app))
    })
}

fn handle_modal(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| Ok(modal_json(app)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(handle_open(state, req)),
        "attendance.update" => Some(handle_update(state, req)),
        "attendance.save" => Some(handle_save(state, req)),
        "attendance.cancel" => Some(handle_cancel(state, req)),
        "attendance.modal" => Some(handle_modal(state, req)),
        _ => None,
    }
}

use crate::calendar::MonthCursor;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    calendar_json, get_optional_str, get_required_str, get_today, require_session, require_tutor,
    with_app,
};
use crate::ipc::types::{AppState, Request};

fn handle_select_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let today = get_today(params)?;
        let selection = get_optional_str(params, "studentId")?.filter(|s| !s.is_empty());
        if let Some(id) = selection.as_deref() {
            if app.roster.find(id).is_none() {
                return Err(HandlerErr::new("not_found", "student not found"));
            }
        }
        app.modal.cancel();
        app.calendar.select_student(selection);
        Ok(calendar_json(app, today))
    })
}

fn handle_navigate(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_session(app)?;
        let today = get_today(params)?;
        let delta = params
            .get("delta")
            .and_then(|v| v.as_i64())
            .and_then(|d| i32::try_from(d).ok())
            .ok_or_else(|| HandlerErr::bad_params("missing delta"))?;
        app.modal.cancel();
        app.calendar.navigate(delta);
        Ok(calendar_json(app, today))
    })
}

fn handle_set_month(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_session(app)?;
        let today = get_today(params)?;
        let raw = get_required_str(params, "month")?;
        let month = MonthCursor::parse(&raw)
            .ok_or_else(|| HandlerErr::bad_params("month must be YYYY-MM or YYYY-MM-DD"))?;
        app.modal.cancel();
        app.calendar.set_month(month);
        Ok(calendar_json(app, today))
    })
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_session(app)?;
        Ok(calendar_json(app, get_today(params)?))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.selectStudent" => Some(handle_select_student(state, req)),
        "calendar.navigate" => Some(handle_navigate(state, req)),
        "calendar.setMonth" => Some(handle_set_month(state, req)),
        "calendar.view" => Some(handle_view(state, req)),
        _ => None,
    }
}

use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_required_str, require_tutor, roster_json, with_app};
use crate::ipc::types::{AppState, Request};
use crate::roster::RosterError;
use serde_json::json;

fn roster_err(e: RosterError) -> HandlerErr {
    match e {
        RosterError::BlankName => HandlerErr::validation(e),
        RosterError::UnknownStudent => HandlerErr::new("not_found", e.to_string()),
        RosterError::NothingToConfirm => HandlerErr::bad_params(e.to_string()),
    }
}

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| Ok(roster_json(app)))
}

fn handle_roster_refetch(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        app.roster.refetch();
        Ok(roster_json(app))
    })
}

fn handle_roster_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let name = get_required_str(params, "name")?;
        app.roster.add(&name).map_err(roster_err)?;
        Ok(roster_json(app))
    })
}

fn handle_roster_request_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        require_tutor(app)?;
        let student_id = get_required_str(params, "studentId")?;
        let student = app.roster.request_delete(&student_id).map_err(roster_err)?;
        Ok(json!({
            "confirm": {
                "studentId": student.id,
                "name": student.name,
                "message": format!("Delete {} and all of their attendance?", student.name),
            }
        }))
    })
}

fn handle_roster_confirm_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        require_tutor(app)?;
        app.confirm_delete().map_err(roster_err)?;
        Ok(roster_json(app))
    })
}

fn handle_roster_cancel_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        require_tutor(app)?;
        app.roster.cancel_delete();
        Ok(roster_json(app))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_roster_list(state, req)),
        "roster.refetch" => Some(handle_roster_refetch(state, req)),
        "roster.add" => Some(handle_roster_add(state, req)),
        "roster.requestDelete" => Some(handle_roster_request_delete(state, req)),
        "roster.confirmDelete" => Some(handle_roster_confirm_delete(state, req)),
        "roster.cancelDelete" => Some(handle_roster_cancel_delete(state, req)),
        _ => None,
    }
}

use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_str, get_required_str, with_app};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        Ok(json!({ "identity": app.session.identity() }))
    })
}

fn handle_login_tutor(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        let code = get_required_str(params, "code")?;
        let identity = app.login_tutor(&code).map_err(HandlerErr::validation)?;
        Ok(json!({ "identity": identity }))
    })
}

fn handle_login_parent(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, params| {
        let selection = get_optional_str(params, "studentId")?;
        let identity = app
            .login_parent(selection.as_deref())
            .map_err(HandlerErr::validation)?;
        Ok(json!({ "identity": identity }))
    })
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_app(state, req, |app, _| {
        app.logout();
        Ok(json!({ "identity": null }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.get" => Some(handle_session_get(state, req)),
        "session.loginTutor" => Some(handle_login_tutor(state, req)),
        "session.loginParent" => Some(handle_login_parent(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        _ => None,
    }
}

use crate::config::{ENV_GATEWAY_KEY, ENV_GATEWAY_URL, ENV_TUTOR_CODE, ENV_TUTOR_CODE_SHA256};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configured": state.configured(),
        }),
    )
}

fn screen(state: &AppState) -> &'static str {
    match state.app.as_ref() {
        None => "setup",
        Some(app) if app.session.identity().is_none() => "login",
        Some(_) => "calendar",
    }
}

fn handle_app_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(app) = state.app.as_ref() else {
        return ok(
            &req.id,
            json!({
                "screen": screen(state),
                "role": null,
                "missing": state.setup.missing,
                "error": state.setup.error,
            }),
        );
    };
    let identity = app.session.identity();
    ok(
        &req.id,
        json!({
            "screen": screen(state),
            "role": identity.map(|i| i.role()),
            "identity": identity,
            "studentsLoaded": app.roster.loaded(),
            "selectedStudentId": app.calendar.student_id(),
            "month": app.calendar.month().key(),
            "loading": app.calendar.loading(),
            "modalOpen": app.modal.is_open(),
            "pendingDelete": app.roster.pending_delete().map(|s| s.id.clone()),
        }),
    )
}

fn handle_setup_instructions(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "configured": state.configured(),
            "missing": state.setup.missing,
            "error": state.setup.error,
            "instructions": [
                format!("Set {ENV_GATEWAY_URL} to the service URL (https://... or sqlite:<path>)."),
                format!("Set {ENV_GATEWAY_KEY} to the service's public API key."),
                format!("Set {ENV_TUTOR_CODE} (or {ENV_TUTOR_CODE_SHA256}) to enable tutor login."),
                "Restart the app after updating the environment or .env file.".to_string(),
            ],
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "app.state" => Some(handle_app_state(state, req)),
        "setup.instructions" => Some(handle_setup_instructions(state, req)),
        _ => None,
    }
}

//! Task endpoints.
//!
//! | Method   | Path                | Auth                         |
//! |----------|---------------------|------------------------------|
//! | `GET`    | `/task/`            | open                         |
//! | `POST`   | `/task/`            | open                         |
//! | `GET`    | `/task/basic`       | Basic                        |
//! | `GET`    | `/task/:task_id/`   | open                         |
//! | `DELETE` | `/task/:task_id/`   | Basic and `User-Agent` match |

use crate::agent::AllowedAgent;
use crate::config::ServerConfig;
use crate::store::{EmptyTask, TaskNotFound, TaskStore};
use axum::http::{HeaderValue, StatusCode, header};
use constant_time_eq::constant_time_eq;
use rest_toolkit_auth::{And, BasicAuth, DynStrategy};
use rest_toolkit_web::{Api, ApiRequest, Endpoint, ErrorMap, RegistrationError, Reply};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct NewTask {
    task: String,
}

fn task_errors() -> ErrorMap {
    ErrorMap::new()
        .on_with::<TaskNotFound, _>(StatusCode::NOT_FOUND, |e| json!({ "id": e.id }))
        .on::<EmptyTask>(StatusCode::UNPROCESSABLE_ENTITY)
}

fn basic_auth(config: &ServerConfig) -> BasicAuth {
    let username = config.username.clone();
    let password = config.password.clone();
    BasicAuth::new(move |user, pass| {
        user == username && constant_time_eq(pass.as_bytes(), password.as_bytes())
    })
}

/// Build the task API for `config`, serving `store`.
///
/// # Errors
///
/// Returns a [`RegistrationError`] if two endpoints collide.
pub fn build_api(config: &ServerConfig, store: &TaskStore) -> Result<Api, RegistrationError> {
    let mut api = Api::new(config.api_version.clone());

    let tasks = store.clone();
    api.register_endpoint(Endpoint::get("/task/", move |_: &ApiRequest| {
        Ok::<_, anyhow::Error>(Reply::from_value(&tasks.list())?)
    }))?;

    let tasks = store.clone();
    api.register_endpoint(
        Endpoint::post("/task/", move |request: &ApiRequest| {
            let new: NewTask = request.json()?;
            let task = tasks.create(new.task)?;
            let location = format!("/{}/task/{}/", request.version(), task.id);
            Ok::<_, anyhow::Error>(
                Reply::from_value(&task)?
                    .with_status(StatusCode::CREATED)
                    .with_header(header::LOCATION, HeaderValue::from_str(&location)?),
            )
        })
        .with_errors(task_errors()),
    )?;

    let tasks = store.clone();
    api.register_endpoint(
        Endpoint::get("/task/basic", move |_: &ApiRequest| {
            Ok::<_, anyhow::Error>(Reply::from_value(&tasks.list())?)
        })
        .with_auth(basic_auth(config)),
    )?;

    let tasks = store.clone();
    api.register_endpoint(
        Endpoint::get("/task/:task_id/", move |request: &ApiRequest| {
            let task = tasks.get(request.param("task_id")?)?;
            Ok::<_, anyhow::Error>(Reply::from_value(&task)?)
        })
        .with_errors(task_errors()),
    )?;

    let mut delete_guard: Vec<DynStrategy<ApiRequest>> = vec![Box::new(basic_auth(config))];
    if let Some(agent) = &config.allowed_agent {
        delete_guard.push(Box::new(AllowedAgent::new(agent.clone())));
    }
    let tasks = store.clone();
    api.register_endpoint(
        Endpoint::delete("/task/:task_id/", move |request: &ApiRequest| {
            let deleted = tasks.delete(request.param("task_id")?)?;
            Ok::<_, anyhow::Error>(Reply::from_value(&deleted)?)
        })
        .with_auth(And::new(delete_guard))
        .with_errors(task_errors()),
    )?;

    Ok(api)
}

// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The REST facade (§4.K, §6): a thin HTTP front end over the same [`Engine`] the
//! CLI drives synchronously. No authentication, no remote distribution — single
//! process, single campaign.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use campaign_runner::list;

use crate::engine::Engine;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/case-runner", put(put_case_runner))
        .route("/case-runner/testlist", put(put_testlist).get(get_testlist))
        .route("/case-runner/resource", put(put_resource))
        .with_state(engine)
}

#[derive(Deserialize)]
struct CaseRunnerRequest {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    setting_path: Option<Utf8PathBuf>,
}

async fn put_case_runner(State(engine): State<Arc<Engine>>, Json(body): Json<CaseRunnerRequest>) -> StatusCode {
    match body.status.as_str() {
        "init" => StatusCode::OK,
        "start" => {
            let runner = Arc::clone(&engine.runner);
            tokio::task::spawn_blocking(move || {
                if let Err(err) = runner.start() {
                    tracing::error!(error = %err, "campaign run failed");
                }
            });
            StatusCode::ACCEPTED
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

#[derive(Deserialize)]
struct TestListRequest {
    file: Utf8PathBuf,
}

async fn put_testlist(State(engine): State<Arc<Engine>>, Json(body): Json<TestListRequest>) -> StatusCode {
    match list::load(&body.file, false) {
        Ok(test_list) => {
            engine.runner.load_test_list(test_list);
            StatusCode::OK
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load test list");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Serialize)]
struct TestListResponse {
    loaded: bool,
    name: Option<String>,
    case_count: usize,
}

async fn get_testlist(State(engine): State<Arc<Engine>>) -> Json<TestListResponse> {
    match engine.runner.test_list() {
        Some(test_list) => Json(TestListResponse {
            loaded: true,
            name: Some(test_list.name),
            case_count: test_list.cases.len(),
        }),
        None => Json(TestListResponse { loaded: false, name: None, case_count: 0 }),
    }
}

#[derive(Deserialize)]
struct ResourceRequest {
    file: Utf8PathBuf,
    user: String,
}

async fn put_resource(State(engine): State<Arc<Engine>>, Json(body): Json<ResourceRequest>) -> StatusCode {
    match engine.runner.load_resource(&body.file, &body.user) {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::error!(error = %err, "failed to load resource pool");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

//! HTTP surface: one router, one session, JSON in and out.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::export::{export_filename, export_xlsx};
use crate::session::Session;

/// Serving-layer state: the session object behind one mutex, so commands
/// run one at a time. No globals anywhere.
pub struct AppState {
    session: Mutex<Session>,
}

#[derive(Deserialize)]
struct ColumnSelection {
    code: Option<String>,
    order: Option<String>,
}

#[derive(Deserialize)]
struct FilterRequest {
    order: String,
}

#[derive(Deserialize)]
struct ScanRequest {
    code: String,
}

pub fn router() -> Router {
    let state = Arc::new(AppState {
        session: Mutex::new(Session::new()),
    });

    Router::new()
        .route("/", get(serve_index))
        .route("/api/upload", post(upload))
        .route("/api/state", get(state_snapshot))
        .route("/api/columns", post(set_columns))
        .route("/api/filter", post(apply_filter))
        .route("/api/clear_filter", post(clear_filter))
        .route("/api/scan", post(scan))
        .route("/api/clear_highlights", post(clear_highlights))
        .route("/api/export", get(export))
        // Spreadsheets routinely exceed axum's 2 MB default.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(bind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(bind).await?;
    info!("listening on http://{bind}");
    axum::serve(listener, router()).await?;
    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("static/index.html"))
}

async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> impl IntoResponse {
    let mut file_data = Vec::new();
    let mut filename = String::from("planilha.xlsx");

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("spreadsheet") {
                    continue;
                }
                if let Some(name) = field.file_name() {
                    filename = name.to_string();
                }
                match field.bytes().await {
                    Ok(bytes) => file_data = bytes.to_vec(),
                    Err(e) => {
                        error!(%filename, error = %e, "falha ao receber o arquivo");
                        return Json(json!({
                            "status": "error",
                            "notices": [{"level": "error", "text": format!("Erro ao receber o arquivo: {e}")}],
                        }));
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "falha ao receber o arquivo");
                return Json(json!({
                    "status": "error",
                    "notices": [{"level": "error", "text": format!("Erro ao receber o arquivo: {e}")}],
                }));
            }
        }
    }

    if file_data.is_empty() {
        return Json(json!({
            "status": "error",
            "notices": [{"level": "error", "text": "Nenhum arquivo recebido."}],
        }));
    }

    let mut session = state.session.lock().unwrap();
    match session.load(&filename, &file_data) {
        Ok(notices) => {
            info!(rows = session.dataset.as_ref().map(|d| d.len()), %filename, "planilha carregada");
            Json(json!({ "status": "ok", "notices": notices }))
        }
        Err(e) => {
            error!(%filename, error = %e, "falha no upload");
            Json(json!({
                "status": "error",
                "notices": [{"level": "error", "text": format!("Erro ao carregar planilha: {e}")}],
            }))
        }
    }
}

/// Everything the page needs to redraw itself after any command.
async fn state_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().unwrap();

    let Some(dataset) = session.dataset.as_ref() else {
        return Json(json!({ "loaded": false }));
    };

    let rows: Vec<serde_json::Value> = session
        .view()
        .iter()
        .enumerate()
        .map(|(pos, &row)| {
            let style = session.style_of(row);
            json!({
                "index": row,
                "position": pos + 1,
                "cells": dataset.rows[row]
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>(),
                "color": style.map(|s| crate::colors::hex(s.color)),
                "bold": style.map(|s| s.bold).unwrap_or(false),
            })
        })
        .collect();

    Json(json!({
        "loaded": true,
        "filename": dataset.filename,
        "total_rows": dataset.len(),
        "columns": dataset.columns,
        "code_column": dataset.code_column.map(|i| &dataset.columns[i]),
        "order_column": dataset.order_column.map(|i| &dataset.columns[i]),
        "orders": dataset.distinct_orders(),
        "filtered_order": session.filtered_order(),
        "rows": rows,
        "scanned": session.scanned_report(),
        "scanned_count": session.ledger.len(),
        "order_colors": session.order_colors.entries(),
        "last_found": session.last_found,
    }))
}

async fn set_columns(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ColumnSelection>,
) -> impl IntoResponse {
    let mut session = state.session.lock().unwrap();
    let notices = session.set_columns(payload.code.as_deref(), payload.order.as_deref());
    Json(json!({ "status": "ok", "notices": notices }))
}

async fn apply_filter(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FilterRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().unwrap();
    let notices = session.apply_filter(payload.order.trim());
    Json(json!({ "status": "ok", "notices": notices }))
}

async fn clear_filter(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut session = state.session.lock().unwrap();
    let notices = session.clear_filter();
    Json(json!({ "status": "ok", "notices": notices }))
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScanRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().unwrap();
    let outcome = session.scan(&payload.code);
    Json(json!({
        "status": "ok",
        "notices": outcome.notices,
        "matched": outcome.matched.map(|m| json!({
            "row": m.row,
            "position": m.position,
            "count": m.count,
        })),
    }))
}

async fn clear_highlights(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut session = state.session.lock().unwrap();
    let notices = session.clear_highlights();
    Json(json!({ "status": "ok", "notices": notices }))
}

async fn export(State(state): State<Arc<AppState>>) -> Response {
    let session = state.session.lock().unwrap();

    let Some(dataset) = session.dataset.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status": "error",
                "notices": [{"level": "error", "text": "Nenhuma planilha carregada."}],
            })),
        )
            .into_response();
    };

    match export_xlsx(dataset, &session.ledger, &session.order_colors) {
        Ok(bytes) => {
            let filename = export_filename(Local::now());
            (
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                            .to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "falha na exportação");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "notices": [{"level": "error", "text": format!("Erro ao gerar Excel: {e}")}],
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn post_upload(body: impl Into<Body>) -> serde_json::Value {
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                "multipart/form-data; boundary=BOUNDARY",
            )
            .body(body.into())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_accepts_a_workbook_and_reports_detection() {
        use crate::colors::OrderColorMap;
        use crate::dataset::tests::dataset;
        use crate::dataset::CellValue;
        use crate::export::export_xlsx;
        use crate::ledger::ScanLedger;

        let ds = dataset(
            &["PEDIDO", "EAN_PRODUTO"],
            vec![vec![CellValue::Int(5), CellValue::Int(111)]],
        );
        let xlsx = export_xlsx(&ds, &ScanLedger::new(), &OrderColorMap::new()).unwrap();

        let mut body = Vec::new();
        body.extend_from_slice(
            b"--BOUNDARY\r\n\
              Content-Disposition: form-data; name=\"spreadsheet\"; filename=\"pedidos.xlsx\"\r\n\
              Content-Type: application/octet-stream\r\n\r\n",
        );
        body.extend_from_slice(&xlsx);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        let reply = post_upload(body).await;
        assert_eq!(reply["status"], "ok");
        let texts: Vec<&str> = reply["notices"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["text"].as_str())
            .collect();
        assert!(texts.iter().any(|t| t.contains("pedidos.xlsx")));
        assert!(texts.iter().any(|t| t.contains("EAN_PRODUTO")));
    }

    #[tokio::test]
    async fn upload_read_failure_reports_the_cause() {
        // Body ends mid-field, without the closing boundary: reading the
        // file bytes fails and the user must see why, not "no file".
        let truncated = "--BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"spreadsheet\"; filename=\"a.xlsx\"\r\n\r\n\
            parcial";
        let reply = post_upload(truncated).await;
        assert_eq!(reply["status"], "error");
        let text = reply["notices"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Erro ao receber o arquivo"));
    }
}

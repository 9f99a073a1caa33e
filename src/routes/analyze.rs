use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::llm::ImageAttachment;
use crate::pipeline::{AuditRequest, EvaluationContext, Report, generate_report};

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Multipart fields as they arrive. Names follow the upload form, with English aliases.
#[derive(Debug, Default)]
struct AnalyzeForm {
    image: Option<(String, Bytes)>,
    system_type: Option<String>,
    criticality_level: Option<String>,
    user_profile: Option<String>,
    operating_environment: Option<String>,
}

impl AnalyzeForm {
    async fn read(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let slot = match name.as_str() {
                "file" | "image" => {
                    let media_type = field
                        .content_type()
                        .filter(|ct| !ct.is_empty())
                        .unwrap_or(DEFAULT_MEDIA_TYPE)
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::Validation(format!("could not read image upload: {e}"))
                    })?;
                    form.image = Some((media_type, bytes));
                    continue;
                }
                "tipo_sistema" | "system_type" => &mut form.system_type,
                "nivel_criticidad" | "criticality_level" => &mut form.criticality_level,
                "perfil_usuario" | "user_profile" => &mut form.user_profile,
                "entorno_operativo" | "operating_environment" => &mut form.operating_environment,
                other => {
                    tracing::debug!(field = other, "Ignoring unknown form field");
                    continue;
                }
            };

            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("could not read field `{name}`: {e}")))?;
            *slot = Some(value);
        }

        Ok(form)
    }

    fn into_request(self) -> AppResult<AuditRequest> {
        let (media_type, bytes) = required(self.image, "file")?;

        Ok(AuditRequest {
            image: ImageAttachment::from_bytes(media_type, &bytes),
            context: EvaluationContext {
                system_type: required(self.system_type, "tipo_sistema")?,
                criticality_level: required(self.criticality_level, "nivel_criticidad")?,
                user_profile: required(self.user_profile, "perfil_usuario")?,
                operating_environment: required(self.operating_environment, "entorno_operativo")?,
            },
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("missing required field `{field}`")))
}

pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Report>> {
    let request = AnalyzeForm::read(&mut multipart).await?.into_request()?;

    tracing::info!(
        media_type = %request.image.media_type,
        system_type = %request.context.system_type,
        criticality = %request.context.criticality_level,
        "Audit requested"
    );

    let report = generate_report(&state.llm_client, &state.rubric, &state.settings, request).await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm::LlmClient;
    use crate::llm::stub::StubProvider;
    use crate::pipeline::Rubric;
    use crate::routes::create_router;
    use crate::{AppState, pipeline::Locale};

    const BOUNDARY: &str = "hmi-audit-boundary";

    fn state(provider: Arc<StubProvider>) -> AppState {
        let mut config = Config::from_vars(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        })
        .unwrap();
        config.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
        AppState::new(config, Arc::new(LlmClient::new(provider)))
    }

    fn scoring_provider(score: &str) -> StubProvider {
        let mut provider = StubProvider::new().reply("KEY OBSERVATIONS", "KEY OBSERVATIONS:\n- ok");
        for criterion in Rubric::standard(Locale::En).criteria {
            provider = provider.reply(
                &criterion.title,
                &format!("SCORE: {score}\nSUMMARY: Seen on {}", criterion.title),
            );
        }
        provider
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"screen.png\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn analyze_request(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    const CONTEXT_FIELDS: [(&str, &str); 4] = [
        ("tipo_sistema", "Seguridad"),
        ("nivel_criticidad", "Alta"),
        ("perfil_usuario", "Nuevo"),
        ("entorno_operativo", "Emergencia"),
    ];

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_returns_report() {
        let provider = Arc::new(scoring_provider("8/10"));
        let app = create_router(state(provider.clone()));

        let response = app
            .oneshot(analyze_request(multipart_body(
                &CONTEXT_FIELDS,
                Some(("image/png", &b"\x89PNG fake"[..])),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["bridges"].as_array().unwrap().len(), 8);
        assert_eq!(body["bridges"][0]["title"], "BRIDGE 01 – ORIENT");
        assert_eq!(body["bridges"][0]["score"], 8);
        assert_eq!(body["average"], 8.0);
        assert_eq!(body["synthesis"], "KEY OBSERVATIONS:\n- ok");

        let evaluation = provider
            .calls()
            .into_iter()
            .find(|c| c.stage == "evaluate")
            .unwrap();
        let image = evaluation.image.unwrap();
        assert_eq!(image.media_type, "image/png");
        assert!(evaluation.prompt.contains("- System type: Seguridad"));
        assert!(evaluation.prompt.contains("- Operating environment: Emergencia"));
    }

    #[tokio::test]
    async fn test_analyze_accepts_english_field_names() {
        let provider = Arc::new(scoring_provider("6/10"));
        let app = create_router(state(provider));

        let response = app
            .oneshot(analyze_request(multipart_body(
                &[
                    ("system_type", "Process"),
                    ("criticality_level", "Low"),
                    ("user_profile", "Expert"),
                    ("operating_environment", "Normal"),
                ],
                Some(("image/jpeg", &b"jpeg"[..])),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["average"], 6.0);
    }

    #[tokio::test]
    async fn test_analyze_missing_field_is_rejected() {
        let provider = Arc::new(scoring_provider("8/10"));
        let app = create_router(state(provider.clone()));

        let response = app
            .oneshot(analyze_request(multipart_body(
                &CONTEXT_FIELDS[..3],
                Some(("image/png", &b"png"[..])),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "missing required field `entorno_operativo`");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_missing_image_is_rejected() {
        let provider = Arc::new(scoring_provider("8/10"));
        let app = create_router(state(provider));

        let response = app
            .oneshot(analyze_request(multipart_body(&CONTEXT_FIELDS, None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_zero_scores_returns_error_object() {
        let provider = Arc::new(scoring_provider("unrateable"));
        let app = create_router(state(provider.clone()));

        let response = app
            .oneshot(analyze_request(multipart_body(
                &CONTEXT_FIELDS,
                Some(("image/png", &b"png"[..])),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "error": "No scores could be computed." })
        );
        assert_eq!(provider.calls_for_stage("synthesize"), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_jpeg() {
        let provider = Arc::new(scoring_provider("7/10"));
        let app = create_router(state(provider.clone()));

        let mut body = String::new();
        for (name, value) in CONTEXT_FIELDS {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"screen\"\r\n\r\nabc\r\n--{BOUNDARY}--\r\n"
        ));

        let response = app
            .oneshot(analyze_request(Body::from(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let image = provider.calls()[0].image.clone().unwrap();
        assert_eq!(image.media_type, "image/jpeg");
        assert_eq!(image.data_base64, "YWJj");
    }
}

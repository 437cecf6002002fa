//! AWS Lambda handler for waterfall calculations
//!
//! Accepts a deal's yearly cash flows and either an inline promote structure
//! or the id of one loaded from `WATERFALL_STRUCTURES_PATH`, and returns the
//! full waterfall result as JSON.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use aws_lambda_events::event::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::encodings::Body;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use serde::Deserialize;

use promote_waterfall::structure::load_structures;
use promote_waterfall::structure::loader::DEFAULT_STRUCTURES_PATH;
use promote_waterfall::{
    CalculationService, CashFlowProjection, EngineConfig, InMemoryCashFlowSource, InMemoryStructureStore,
    InvestedCapital, PromoteStructure, WaterfallEngine, WaterfallError, YearlyCashFlow,
};

/// Input for one waterfall run
#[derive(Debug, Deserialize)]
pub struct WaterfallRequest {
    pub deal_id: String,

    /// Id of a stored structure; ignored when `structure` is supplied
    #[serde(default)]
    pub structure_id: Option<String>,

    /// Inline structure, run without touching the store
    #[serde(default)]
    pub structure: Option<PromoteStructure>,

    #[serde(default)]
    pub initial_invested_capital: InvestedCapital,

    #[serde(default)]
    pub yearly_cash_flows: Vec<YearlyCashFlow>,
}

/// Loaded once per cold start
struct HandlerState {
    store: InMemoryStructureStore,
    config: EngineConfig,
}

fn error_response(status: i64, message: &str) -> ApiGatewayV2httpResponse {
    ApiGatewayV2httpResponse {
        status_code: status,
        body: Some(Body::Text(serde_json::json!({ "error": message }).to_string())),
        ..Default::default()
    }
}

fn json_response<T: serde::Serialize>(body: &T) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(ApiGatewayV2httpResponse {
        status_code: 200,
        body: Some(Body::Text(serde_json::to_string(body)?)),
        ..Default::default()
    })
}

fn waterfall_error_response(err: &WaterfallError) -> ApiGatewayV2httpResponse {
    let status = match err {
        WaterfallError::StructureNotFound { .. } | WaterfallError::ProjectionNotFound(_) => 404,
        e if e.is_validation() => 400,
        _ => 500,
    };
    error_response(status, &err.to_string())
}

/// Lambda handler function
async fn handler(
    state: &HandlerState,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let start = std::time::Instant::now();
    let request = event.payload;

    if request.request_context.http.method.as_str() == "OPTIONS" {
        return Ok(ApiGatewayV2httpResponse {
            status_code: 200,
            ..Default::default()
        });
    }

    if request.is_base64_encoded {
        return Ok(error_response(400, "Binary request bodies are not supported"));
    }

    let body = request.body.unwrap_or_else(|| "{}".to_string());
    let request: WaterfallRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => return Ok(error_response(400, &format!("Invalid JSON: {}", e))),
    };

    let projection = CashFlowProjection::new(
        request.deal_id.clone(),
        request.initial_invested_capital,
        request.yearly_cash_flows,
    );

    let outcome = match (request.structure, request.structure_id) {
        (Some(structure), _) => WaterfallEngine::new(state.config).calculate(&structure, &projection),
        (None, Some(structure_id)) => {
            let source = InMemoryCashFlowSource::new().with_projection(projection);
            let service = CalculationService::new(state.store.clone(), source, state.config);
            service.calculate(&request.deal_id, &structure_id)
        }
        (None, None) => return Ok(error_response(400, "Either structure or structure_id is required")),
    };

    match outcome {
        Ok(result) => {
            info!(
                "Deal {} structure {} calculated in {}ms",
                result.deal_id,
                result.structure_id,
                start.elapsed().as_millis()
            );
            json_response(&result)
        }
        Err(e) => {
            warn!("Deal {} rejected: {}", request.deal_id, e);
            Ok(waterfall_error_response(&e))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = EngineConfig::from_env()?;
    let path = std::env::var("WATERFALL_STRUCTURES_PATH").unwrap_or_else(|_| DEFAULT_STRUCTURES_PATH.to_string());

    let store = match load_structures(&path) {
        Ok(structures) => InMemoryStructureStore::with_structures(structures)?,
        Err(e) => {
            warn!("No stored structures loaded from {}: {}", path, e);
            InMemoryStructureStore::new()
        }
    };

    let state = HandlerState { store, config };
    let state = &state;
    run(service_fn(move |event| async move { handler(state, event).await })).await
}

use axum::http::{header, HeaderValue};
use axum::Json;
use fsroute::{Context, HandlerConfig, Hook, RouteModule};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Clock shared with every route as the `get_date` decorator
pub type Clock = fn() -> u64;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: u64,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub async fn get_healthcheck(ctx: Context) -> Json<Health> {
    let clock = ctx.decorator::<Clock>("get_date").copied().unwrap_or(now_millis);
    Json(Health {
        status: "ok",
        timestamp: clock(),
    })
}

pub fn module() -> RouteModule {
    RouteModule::new().get(
        HandlerConfig::from_fn(get_healthcheck)
            .decorate("get_date", now_millis as Clock)
            .hook(Hook::after_handle(|_, response| {
                tracing::debug!("Healthcheck answered");
                response
                    .headers_mut()
                    .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            })),
    )
}

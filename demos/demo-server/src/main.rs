use rest_advice::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
struct User {
    id: i64,
    email: String,
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
struct CreateUserRequest {
    #[validate(email(message = "must be a well-formed email address"))]
    email: String,
    #[validate(length(min = 2, max = 64, message = "size must be between 2 and 64"))]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: u32,
    sort: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("account {0} is suspended")]
struct AccountSuspended(i64);

#[derive(Default)]
struct UserStore {
    users: RwLock<BTreeMap<i64, User>>,
}

type AppState = Arc<UserStore>;

async fn create_user(
    axum::extract::State(store): axum::extract::State<AppState>,
    Valid(req): Valid<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), Exception> {
    let mut users = store.users.write().await;
    if users.values().any(|user| user.email == req.email) {
        return Err(EntityAlreadyExists::with_identifier("User", "email", &req.email).into());
    }

    let id = users.keys().next_back().map_or(1, |last| last + 1);
    let user = User {
        id,
        email: req.email,
        name: req.name,
    };
    users.insert(id, user.clone());
    tracing::info!(user_id = id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    axum::extract::State(store): axum::extract::State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, Exception> {
    if id == 13 {
        return Err(AccountSuspended(id).into());
    }
    store
        .users
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| EntityNotFound::with_id("User", id).into())
}

async fn list_users(
    axum::extract::State(store): axum::extract::State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, Exception> {
    const PAGE_SIZE: usize = 20;

    let mut users: Vec<User> = store.users.read().await.values().cloned().collect();
    if let Some(sort) = params.sort {
        let sort = SortPipe::for_type::<User>(&["id", "name", "email"])
            .transform(sort)
            .await?;
        users.sort_by(|a, b| match sort.property.as_str() {
            "name" => a.name.cmp(&b.name),
            "email" => a.email.cmp(&b.email),
            _ => a.id.cmp(&b.id),
        });
        if sort.direction == Direction::Desc {
            users.reverse();
        }
    }

    let skip = params.page.saturating_sub(1) as usize * PAGE_SIZE;
    Ok(Json(users.into_iter().skip(skip).take(PAGE_SIZE).collect()))
}

async fn billing_status() -> Result<Json<serde_json::Value>, Exception> {
    Err(InternalCallFailed {
        status: 503,
        method: "GET".to_string(),
        url: "http://billing.internal/status".to_string(),
        body: Some(serde_json::json!({ "reason": "maintenance" })),
    }
    .into())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ConfigService::new();
    let filter_config = match FilterConfig::from_config(&config) {
        Ok(filter_config) => filter_config,
        Err(e) => {
            tracing::warn!("{}; falling back to defaults", e);
            FilterConfig::default()
        }
    };

    let filter = RestExceptionFilter::new(filter_config).register(|e: &AccountSuspended| {
        let mut response = ErrorResponse::new(HttpStatus::Forbidden);
        response.set_message(e.to_string());
        response
    });

    let router = Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/billing/status", get(billing_status))
        .with_state(AppState::default())
        .with_exception_handling(filter);

    let host = config.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = config.get("PORT").unwrap_or_else(|| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("Server stopped");
}

use std::sync::Arc;

use actix_web::dev::Service;
use actix_web::{web, App, HttpServer};
use uuid::Uuid;
use werewolf_backend::ai::DecisionProvider;
use werewolf_backend::config::game::GameConfig;
use werewolf_backend::config::provider::ProviderConfig;
use werewolf_backend::services::rooms::RoomRegistry;
use werewolf_backend::state::app_state::AppState;
use werewolf_backend::storage::JsonFileStore;
use werewolf_backend::ws::hub::WsRegistry;
use werewolf_backend::{routes, telemetry, trace_ctx, LlmProvider, RandomProvider};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("❌ BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    println!("🚀 Starting Werewolf Backend on http://{}:{}", host, port);

    let cfg = Arc::new(GameConfig::from_env());
    let provider: Arc<dyn DecisionProvider> = match ProviderConfig::from_env() {
        Ok(Some(provider_cfg)) => {
            println!("✅ LLM provider configured ({})", provider_cfg.model);
            Arc::new(LlmProvider::new(provider_cfg))
        }
        Ok(None) => {
            let name = std::env::var("AI_PROVIDER")
                .unwrap_or_else(|_| RandomProvider::NAME.to_string());
            match werewolf_backend::ai::by_name(&name) {
                Some(factory) => {
                    println!("ℹ️  No LLM configured, AI players use '{}' decisions", factory.name);
                    (factory.make)(None)
                }
                None => {
                    eprintln!("❌ Unknown AI provider '{name}'");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Invalid LLM configuration: {e}");
            std::process::exit(1);
        }
    };

    let ws_registry = Arc::new(WsRegistry::new());
    let store = Arc::new(JsonFileStore::new(cfg.store_path.clone()));
    let rooms = RoomRegistry::new(ws_registry.clone(), provider, store, cfg);

    match rooms.load_saved_rooms().await {
        Ok(count) if count > 0 => println!("✅ Restored {count} saved rooms"),
        Ok(_) => {}
        Err(e) => eprintln!("⚠️  Could not restore saved rooms: {e}"),
    }
    rooms.spawn_background_tasks();

    let data = web::Data::new(AppState::new(ws_registry, rooms));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_cors::Cors::permissive())
            .wrap_fn(|req, srv| {
                let trace_id = Uuid::new_v4().to_string();
                let fut = srv.call(req);
                async move { trace_ctx::with_trace_id(trace_id, fut).await }
            })
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usuarios_backend::{
    AppState,
    config::Config,
    identity::GoTrueProvider,
    invites::TokenCipher,
    middleware::{log_errors, requerir_token},
    notify::WebhookNotifier,
    routes,
    store::Stores,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    let state = AppState {
        stores: Stores::new(&config),
        identity: GoTrueProvider::new(&config),
        notifier: WebhookNotifier::new(&config),
        cipher: TokenCipher::new(&config.invite_token_secret),
        config: config.clone(),
    };

    // Rutas públicas: altas, login, invitaciones y consultas administrativas.
    let public_routes = Router::new()
        .route("/usuarios/crear", post(routes::usuarios::handler::crear))
        .route("/usuarios/login", post(routes::usuarios::handler::login))
        .route("/usuarios", get(routes::usuarios::handler::listar))
        .route("/usuarios/por-id", get(routes::usuarios::handler::por_id))
        .route(
            "/usuarios/contar-por-rol",
            get(routes::usuarios::handler::contar_por_rol),
        )
        .route(
            "/usuarios/codigo-unico",
            post(routes::usuarios::handler::codigo_unico),
        )
        .route(
            "/invitaciones/crear",
            post(routes::invitaciones::handler::crear),
        )
        .route(
            "/invitaciones/resolver",
            get(routes::invitaciones::handler::resolver),
        )
        .route(
            "/relaciones/medico-paciente",
            post(routes::relaciones::handler::asignar_medico),
        )
        .route(
            "/relaciones/cuidador-paciente",
            post(routes::relaciones::handler::asignar_cuidador)
                .delete(routes::relaciones::handler::quitar_cuidador),
        )
        .route(
            "/relaciones/sin-relacion",
            get(routes::relaciones::handler::sin_relacion),
        );

    // Rutas con token del usuario: cada operación corre con su autoridad.
    let protected_routes = Router::new()
        .route("/usuarios/perfil", get(routes::usuarios::handler::perfil))
        .route(
            "/usuarios/desactivar",
            post(routes::usuarios::handler::desactivar),
        )
        .route(
            "/usuarios/contrasenia",
            put(routes::usuarios::handler::cambiar_contrasenia),
        )
        .route(
            "/usuarios/correo",
            put(routes::usuarios::handler::cambiar_correo),
        )
        .route(
            "/usuarios/avatar",
            put(routes::usuarios::handler::subir_avatar),
        )
        .route(
            "/relaciones/mis-pacientes",
            get(routes::relaciones::handler::mis_pacientes),
        )
        .route(
            "/relaciones/mis-medicos",
            get(routes::relaciones::handler::mis_medicos),
        )
        .route(
            "/relaciones/mi-paciente",
            get(routes::relaciones::handler::mi_paciente),
        )
        .layer(axum::middleware::from_fn(requerir_token));

    let router = Router::new().nest(
        &config.api_base_uri.clone(),
        Router::new().merge(public_routes).merge(protected_routes),
    );

    let router = router.layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("CORS permisivo habilitado en modo desarrollo");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("SERVER_HOST inválido, usando la dirección por defecto");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Servidor escuchando en {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}

use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::{EmailProvider, EmailService, Geocoder, HttpGeocoder, JwtService, MongoDb};

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub db: MongoDb,
    pub jwt: JwtService,
    pub geocoder: Arc<dyn Geocoder>,
    pub email: Arc<dyn EmailProvider>,
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/updatedetails", put(handlers::auth::update_details))
        .route("/updatepassword", put(handlers::auth::update_password))
        .route("/forgotpassword", post(handlers::auth::forgot_password))
        .route(
            "/resetpassword/:resettoken",
            put(handlers::auth::reset_password),
        );

    let bootcamp_routes = Router::new()
        .route(
            "/",
            get(handlers::bootcamps::list_bootcamps).post(handlers::bootcamps::create_bootcamp),
        )
        .route(
            "/radius/:zipcode/:distance",
            get(handlers::bootcamps::bootcamps_in_radius),
        )
        .route(
            "/:id",
            get(handlers::bootcamps::get_bootcamp)
                .put(handlers::bootcamps::update_bootcamp)
                .delete(handlers::bootcamps::delete_bootcamp),
        )
        .route("/:id/photo", put(handlers::bootcamps::upload_bootcamp_photo))
        .route(
            "/:id/courses",
            get(handlers::courses::list_bootcamp_courses).post(handlers::courses::add_course),
        )
        .route(
            "/:id/reviews",
            get(handlers::reviews::list_bootcamp_reviews).post(handlers::reviews::add_review),
        );

    let course_routes = Router::new()
        .route("/", get(handlers::courses::list_courses))
        .route(
            "/:id",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        );

    let review_routes = Router::new()
        .route("/", get(handlers::reviews::list_reviews))
        .route(
            "/:id",
            get(handlers::reviews::get_review)
                .put(handlers::reviews::update_review)
                .delete(handlers::reviews::delete_review),
        );

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/bootcamps", bootcamp_routes)
        .nest("/api/v1/courses", course_routes)
        .nest("/api/v1/reviews", review_routes)
        .nest("/api/v1/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let geocoder: Arc<dyn Geocoder> = Arc::new(HttpGeocoder::new(&config.geocoder)?);
        let email: Arc<dyn EmailProvider> = Arc::new(EmailService::new(&config.smtp)?);
        let jwt = JwtService::new(&config.jwt);

        let state = AppState {
            config: config.clone(),
            db,
            jwt,
            geocoder,
            email,
        };

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

//! Test utilities with lazy testcontainers support
//!
//! Containers are started on first use and shared by every test in the
//! binary. Each test opens its own pool and works with fresh ids.

pub mod containers {
    use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
    use testcontainers_modules::{postgres::Postgres, redis::Redis};
    use tokio::sync::OnceCell;

    static POSTGRES: OnceCell<(ContainerAsync<Postgres>, String)> = OnceCell::const_new();
    static REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

    /// Start (or reuse) the PostgreSQL container and return its URL
    pub async fn postgres_url() -> String {
        let (_, url) = POSTGRES
            .get_or_init(|| async {
                let container = Postgres::default()
                    .with_user("codequest")
                    .with_password("codequest_test")
                    .with_db_name("codequest_test")
                    .with_tag("16-alpine")
                    .start()
                    .await
                    .expect("Failed to start PostgreSQL container");
                let host = container.get_host().await.unwrap();
                let port = container.get_host_port_ipv4(5432).await.unwrap();
                let url = format!(
                    "postgres://codequest:codequest_test@{}:{}/codequest_test",
                    host, port
                );
                (container, url)
            })
            .await;
        url.clone()
    }

    /// Start (or reuse) the Redis container and return its URL
    pub async fn redis_url() -> String {
        let (_, url) = REDIS
            .get_or_init(|| async {
                let container = Redis::default()
                    .start()
                    .await
                    .expect("Failed to start Redis container");
                let host = container.get_host().await.unwrap();
                let port = container.get_host_port_ipv4(6379).await.unwrap();
                (container, format!("redis://{}:{}", host, port))
            })
            .await;
        url.clone()
    }
}

pub mod database {
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::containers;

    /// A migrated pool on the shared PostgreSQL container
    pub async fn test_pool() -> PgPool {
        let pool = PgPool::connect(&containers::postgres_url().await)
            .await
            .expect("Failed to connect to test database");
        crate::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    /// Insert a problem row with a unique slug
    pub async fn insert_problem(pool: &PgPool) -> Uuid {
        sqlx::query_scalar(r#"INSERT INTO problems (slug, title) VALUES ($1, $2) RETURNING id"#)
            .bind(format!("sum-{}", Uuid::new_v4()))
            .bind("Sum")
            .fetch_one(pool)
            .await
            .expect("Failed to insert problem")
    }
}

pub mod test_app {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{containers, database};
    use crate::{
        config::{
            Config, DatabaseConfig, Judge0Config, JwtConfig, ProblemsConfig, RedisConfig,
            ServerConfig,
        },
        services::{ReconciliationService, SubmissionService},
        state::AppState,
    };

    pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only";

    /// Serve the full router on a random port with real database and redis
    /// containers and the given services. Returns the API base URL.
    pub async fn spawn_test_app(
        submissions: SubmissionService,
        reconciliation: ReconciliationService,
    ) -> String {
        let database_url = containers::postgres_url().await;
        let redis_url = containers::redis_url().await;

        let db_pool = database::test_pool().await;
        let redis_client = redis::Client::open(redis_url.as_str()).unwrap();
        let redis_conn = redis::aio::ConnectionManager::new(redis_client)
            .await
            .expect("Failed to connect to test redis");

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                rust_log: "debug".to_string(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            redis: RedisConfig { url: redis_url },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            judge0: Judge0Config {
                uri: "http://127.0.0.1:9".to_string(),
                rapidapi_key: None,
                rapidapi_host: None,
                callback_url: None,
                timeout: Duration::from_secs(1),
            },
            problems: ProblemsConfig {
                mount_path: PathBuf::from("/nonexistent"),
            },
        };

        let state = AppState::new(db_pool, redis_conn, submissions, reconciliation, config);
        let app = crate::create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        format!("http://{}/api/v1", addr)
    }
}

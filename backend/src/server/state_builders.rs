//! Adapter selection and service assembly from settings.
//!
//! | setting                     | present                 | absent             |
//! |-----------------------------|-------------------------|--------------------|
//! | `database_url`              | Diesel repository       | in-memory          |
//! | `redis_url` (+ enabled)     | Redis idempotency store | in-memory store    |
//! | `idempotency_enabled=false` | no-op store             |                    |
//! | `events_enabled` + redis    | Redis pub/sub notifier  | no-op notifier     |

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use user_service::domain::ports::{
    EventNotifier, IdempotencyStore, NoOpEventNotifier, NoOpIdempotencyStore,
    TimeOrderedIdGenerator, UserRepository,
};
use user_service::domain::{UserService, UserServicePorts};
use user_service::inbound::http::state::HttpState;
use user_service::outbound::memory::{InMemoryIdempotencyStore, InMemoryUserRepository};
use user_service::outbound::persistence::{DbPool, DieselUserRepository, run_migrations};
use user_service::outbound::redis::{RedisEventNotifier, RedisIdempotencyStore, RedisPool};
use user_service::settings::ServiceSettings;

async fn build_repository(settings: &ServiceSettings) -> Result<Arc<dyn UserRepository>> {
    let Some(config) = settings.db_pool_config() else {
        warn!("no database url configured; users are kept in memory");
        return Ok(Arc::new(InMemoryUserRepository::new()));
    };
    run_migrations(&config.database_url)
        .await
        .wrap_err("run database migrations")?;
    info!(
        max_connections = config.max_size,
        "using PostgreSQL user repository"
    );
    let pool = DbPool::new(config).await.wrap_err("build database pool")?;
    Ok(Arc::new(DieselUserRepository::new(pool)))
}

async fn build_redis_pool(settings: &ServiceSettings) -> Result<Option<RedisPool>> {
    let Some(config) = settings.redis_pool_config() else {
        return Ok(None);
    };
    let pool = RedisPool::new(config)
        .await
        .wrap_err("connect to redis")?;
    Ok(Some(pool))
}

fn build_idempotency_store(
    settings: &ServiceSettings,
    redis: Option<&RedisPool>,
    clock: &Arc<dyn Clock>,
) -> Arc<dyn IdempotencyStore> {
    if !settings.idempotency_enabled() {
        info!("idempotency disabled; keyed creates are not deduplicated");
        return Arc::new(NoOpIdempotencyStore);
    }
    match redis {
        Some(pool) => {
            info!(
                namespace = settings.idempotency_namespace(),
                "using redis idempotency store"
            );
            Arc::new(RedisIdempotencyStore::new(
                pool.clone(),
                settings.idempotency_namespace(),
            ))
        }
        None => {
            warn!("no redis url configured; idempotency only holds within this process");
            Arc::new(InMemoryIdempotencyStore::new(clock.clone()))
        }
    }
}

fn build_notifier(settings: &ServiceSettings, redis: Option<&RedisPool>) -> Arc<dyn EventNotifier> {
    if !settings.events_enabled() {
        return Arc::new(NoOpEventNotifier);
    }
    match redis {
        Some(pool) => Arc::new(RedisEventNotifier::new(
            pool.clone(),
            settings.events_subject_prefix(),
        )),
        None => {
            warn!("events enabled without a redis url; events are dropped");
            Arc::new(NoOpEventNotifier)
        }
    }
}

/// Build every adapter named by `settings` and wrap the service in HTTP state.
pub async fn build_http_state(settings: &ServiceSettings) -> Result<HttpState> {
    let config = settings
        .idempotency_config()
        .wrap_err("invalid idempotency settings")?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repository = build_repository(settings).await?;
    let redis = build_redis_pool(settings).await?;

    let service = Arc::new(UserService::new(
        UserServicePorts {
            repository,
            idempotency_store: build_idempotency_store(settings, redis.as_ref(), &clock),
            notifier: build_notifier(settings, redis.as_ref()),
            id_generator: Arc::new(TimeOrderedIdGenerator),
            clock,
        },
        config,
    ));
    Ok(HttpState::new(service.clone(), service))
}

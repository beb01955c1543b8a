use actix::Actor;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::authentication,
    modules::{
        conversation::{handle::ConversationSvc, repository_pg::ConversationRepositoryPg},
        friend::{handle::FriendSvc, repository_pg::FriendRepositoryPg},
        message::{handle::MessageSvc, repository_pg::MessageRepositoryPg},
        sync::{handler::sync_handler, server::SyncServer, snapshot::SnapshotLoader},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_cache =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let friend_repo = Arc::new(FriendRepositoryPg::new(db_pool.clone()));
    let conversation_repo = Arc::new(ConversationRepositoryPg::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepositoryPg::new(db_pool.clone()));

    let sync_server = SyncServer::new().start();

    let user_service =
        UserService::with_dependencies(user_repo.clone(), Some(Arc::new(redis_cache)));
    let friend_service: FriendSvc = crate::modules::friend::service::FriendService::with_dependencies(
        friend_repo.clone(),
        user_repo.clone(),
        Some(sync_server.clone()),
    );
    let conversation_service: ConversationSvc =
        crate::modules::conversation::service::ConversationService::with_dependencies(
            conversation_repo.clone(),
        );
    let message_service: MessageSvc =
        crate::modules::message::service::MessageService::with_dependencies(
            message_repo,
            conversation_repo,
            friend_repo,
            Some(sync_server.clone()),
        );

    let snapshot_loader =
        Arc::new(SnapshotLoader::new(friend_service.clone(), message_service.clone()));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(friend_service.clone()))
            .app_data(web::Data::new(conversation_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(sync_server.clone()))
            .app_data(web::Data::new(snapshot_loader.clone()))
            .service(health_check)
            .route("/ws", web::get().to(sync_handler))
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(modules::user::route::configure)
                    .configure(modules::friend::route::configure)
                    .configure(modules::conversation::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}

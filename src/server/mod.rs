//! main file for the server

pub(crate) mod checkout;
pub(crate) mod controller;
pub(crate) mod database;
pub(crate) mod ledger;
pub(crate) mod model;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod util;

use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::server::controller::auth::require_token;
use crate::server::database::pool::Pool;
use crate::server::model::config::ServerConfig;
use crate::server::state::AppState;

/// Run the server
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let ServerConfig {
        addr,
        db_read_conn_str,
        db_write_conn_str,
        auth_token,
    } = config;

    let (read_pool, write_pool) = (Pool::new("db-read"), Pool::new("db-write"));
    read_pool
        .init(db_read_conn_str.as_str())
        .await
        .map_err(std::io::Error::other)?;
    write_pool
        .init(db_write_conn_str.as_str())
        .await
        .map_err(std::io::Error::other)?;

    let state = AppState::new(read_pool, write_pool.clone(), auth_token);

    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(scheduler::job::night_menu_sweeper(
        cancel_token.clone(),
        write_pool,
    ));

    let app_state = web::Data::new(state);
    info!("listening on {}", addr);
    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(from_fn(require_token))
            .app_data(app_state.clone())
            .service(controller::checkout::post_checkout)
            .service(controller::menu::get_menu)
            .service(controller::menu::get_menu_catalog)
            .service(controller::menu::post_menu_item)
            .service(controller::menu::put_menu_item)
            .service(controller::menu::delete_menu_item)
            .service(controller::menu::post_night_menu)
            .service(controller::stock::get_stock)
            .service(controller::stock::post_stock)
            .service(controller::stock::put_stock)
            .service(controller::stock::delete_stock)
            .service(controller::stock::post_stock_snapshot)
            .service(controller::report::get_report)
    })
    .bind(addr)?
    .run()
    .await;

    // stop the sweeper with the server
    cancel_token.cancel();
    let _ = sweeper.await;
    result
}

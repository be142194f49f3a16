use std::net::SocketAddr;
use std::sync::Arc;

use astra::Server;
use chrono::Utc;
use log::{error, info, warn};

use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::meetings::MeetingLifecycle;
use crate::notify::{BrevoNotifier, LogNotifier, Notifier};
use crate::responses::error_to_response;
use crate::router::{handle, AppState};

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod meetings;
mod notify;
mod responses;
mod router;

#[cfg(test)]
mod tests;

fn main() {
    env_logger::init();
    let config = Config::from_env();

    let db = Database::new(config.db_path.clone());
    if let Err(e) = init_db(&db, "sql/schema.sql") {
        error!("database initialization failed: {e}");
        std::process::exit(1);
    }

    // First-run admin account, so meeting requests have someone to notify.
    if let Some(admin_email) = &config.admin_email {
        let seeded = db.with_conn(|conn| {
            db::users::ensure_admin(conn, &config.admin_name, admin_email, Utc::now().timestamp())
        });
        match seeded {
            Ok(id) => info!("admin account ready: {admin_email} (id {id})"),
            Err(e) => {
                error!("admin seeding failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let notifier: Arc<dyn Notifier> = match &config.brevo_api_key {
        Some(key) => Arc::new(BrevoNotifier::new(
            key.clone(),
            config.sender_email.clone(),
            config.sender_name.clone(),
        )),
        None => {
            warn!("BREVO_API_KEY not set, emails will be logged instead of sent");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        db,
        lifecycle: MeetingLifecycle::new(notifier),
    };

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid bind address {:?}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    info!("starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(&err),
    });

    if let Err(e) = result {
        error!("server ended with error: {e}");
    }

    info!("server shut down cleanly");
}

pub mod admin;
pub mod backend;
pub mod config;
pub mod view;

use std::sync::LazyLock;

use beacon::{Session, Transport, Viewer};

pub use backend::{Backend, Realtime};
pub use config::{AppConfig, ConfigError};
pub use view::NotificationList;

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    let initialized = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,beacon=debug"),
    )
    .try_init();
    if initialized.is_ok() {
        log::info!("Logging initialized");
    }
});

/// Start the signed-in user's notification session against the configured backend.
///
/// Channels only carry changes made after they open, so the list starts empty until
/// `session.store().fetch_once()` runs. Use [`start_session_and_fetch`] to do both.
///
/// The session should be closed (or dropped) at logout, before a session for another user is
/// started.
pub fn start_session<T: Transport>(
    config: &AppConfig,
    viewer: Viewer,
    access_token: &str,
    transport: T,
) -> Session<Backend> {
    LazyLock::force(&LOGGER);

    let (realtime, backend) = backend::connect(config, access_token, transport);
    Session::start(viewer, &realtime, backend, config.session_config())
}

/// [`start_session`], then load the existing notifications once.
///
/// A failed fetch is logged and the session is returned anyway: live changes still arrive and
/// the caller can retry with `fetch_once`.
pub async fn start_session_and_fetch<T: Transport>(
    config: &AppConfig,
    viewer: Viewer,
    access_token: &str,
    transport: T,
) -> Session<Backend> {
    let session = start_session(config, viewer, access_token, transport);
    if let Err(e) = session.store().fetch_once().await {
        log::warn!("Starting without the initial notification list: {e}");
    }
    session
}

use log::info;

use campus_messenger::integration;
use campus_messenger::state::AppState;

#[tokio::main]
async fn main() {
    let config = integration::Config::default();
    integration::init_logger();

    let pool = config.db.connect();
    let state = AppState::init(&config, pool);
    let app = campus_messenger::app(&config.env, state);

    let addr = config.env.addr();
    info!("Listening on {addr}");

    if let Err(e) = axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
    {
        panic!("Server stopped: {e}");
    }
}

use cfg_if::cfg_if;

mod cards;
mod game;
mod info;
mod players;
mod state;
mod table;

pub use cards::{BlackCardView, PointInfo, WhiteCardView};
pub use game::{FinishedGame, GameBoard, GameView};
pub use info::{ConnectionStatus, ErrorBanner, ExtraGameInfo};
pub use players::PlayersInfo;
pub use state::{parse_channel_config, use_game_state_with, GameStateSignals};
pub use table::{Hand, Table};

/// Routes `log` output to the browser console.
pub fn init_logging() {
    #[cfg(debug_assertions)]
    let log_level = log::Level::Debug;
    #[cfg(not(debug_assertions))]
    let log_level = log::Level::Warn;
    _ = console_log::init_with_level(log_level);
    console_error_panic_hook::set_once();
}

cfg_if! { if #[cfg(target_arch = "wasm32")] {
    use leptos::prelude::*;
    use wasm_bindgen::prelude::wasm_bindgen;

    pub use game::GamePage;
    pub use state::use_game_state;

    /// Mounts the game page for `state_id`. `config` is an optional JSON channel config.
    #[wasm_bindgen]
    pub fn start_game(state_id: String, config: Option<String>) {
        init_logging();

        let config = match parse_channel_config(config.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e:#}, using defaults");
                Default::default()
            }
        };
        leptos::mount::mount_to_body(move || view! { <GamePage state_id config /> });
    }
}}

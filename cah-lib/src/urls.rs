// User
pub const LOGIN_URL: &str = "/api/user/login";
pub const LOGOUT_URL: &str = "/api/user/logout";
pub const REGISTER_URL: &str = "/api/user/register";
pub const VALID_COOKIE_URL: &str = "/api/user/valid-cookie";

// Game
pub const OPEN_GAMES_URL: &str = "/api/game/list-open";
pub const GAMES_IN_PROGRESS_URL: &str = "/api/game/list-in-progress";
pub const CREATE_GAME_URL: &str = "/api/game/create";
pub const JOIN_GAME_URL: &str = "/api/game/join";
pub const START_GAME_URL: &str = "/api/game/start";
pub const AVAILABLE_EXPANSIONS_URL: &str = "/api/game/available-expansions";

pub fn room_state_url(game_id: &str) -> String {
    format!("/api/game/{game_id}/room-state")
}

// Game state
pub fn gamestate_url(state_id: &str) -> String {
    format!("/api/gamestate/{state_id}/state")
}

pub fn play_cards_url(state_id: &str) -> String {
    format!("/api/gamestate/{state_id}/play-cards")
}

pub fn choose_winner_url(state_id: &str) -> String {
    format!("/api/gamestate/{state_id}/choose-winner")
}

/// Websocket scheme mirroring the page: `ws:` for `http:` pages, `wss:` for anything else.
pub fn websocket_scheme(page_protocol: &str) -> &'static str {
    if page_protocol == "http:" {
        "ws:"
    } else {
        "wss:"
    }
}

/// Absolute url of the game state feed, e.g. `wss://example.org/api/gamestate/42/state-websocket`.
///
/// `page_protocol` is the page's `location.protocol` (with trailing colon) and `host` its
/// `location.host`.
pub fn gamestate_websocket_url(page_protocol: &str, host: &str, state_id: &str) -> String {
    format!(
        "{}//{host}/api/gamestate/{state_id}/state-websocket",
        websocket_scheme(page_protocol)
    )
}

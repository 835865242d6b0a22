use anyhow::{Context, Result};
use leptos::{prelude::*, task::spawn_local};

use cah_lib::GameStateSnapshot;
use game_channel::{ChannelConfig, ChannelError, ChannelState, Connector, Sleeper, StateChannel};

/// Reactive view of one game state subscription.
#[derive(Clone, Copy)]
pub struct GameStateSignals {
    pub state: ReadSignal<Option<GameStateSnapshot>>,
    pub channel_state: ReadSignal<ChannelState>,
    pub error: ReadSignal<Option<String>>,
}

/// Reads a channel config from JSON, falling back to defaults for missing fields.
pub fn parse_channel_config(json: Option<&str>) -> Result<ChannelConfig> {
    match json {
        None => Ok(ChannelConfig::default()),
        Some(s) => serde_json::from_str(s).context("Invalid channel config"),
    }
}

/// Subscribes to the state feed of `state_id` for the lifetime of the current owner.
///
/// Each snapshot replaces the previous one in `state`. Transport errors and the fatal
/// channel error end up in `error` as user facing messages, the latest one winning.
pub fn use_game_state_with<C, T>(
    connector: C,
    sleeper: T,
    config: ChannelConfig,
    state_id: &str,
) -> GameStateSignals
where
    C: Connector + 'static,
    T: Sleeper + 'static,
{
    let (state, set_state) = signal(None::<GameStateSnapshot>);
    let (channel_state, set_channel_state) = signal(ChannelState::Connecting);
    let (error, set_error) = signal(None::<String>);

    let opened = StateChannel::builder(connector, sleeper)
        .config(config)
        .on_state_change(move |s| {
            log::debug!("Game state channel: {s}");
            set_channel_state.set(s);
        })
        .on_transport_error(move |e| set_error.set(Some(format!("Server connection error: {e}"))))
        .open(
            state_id,
            move |snapshot: GameStateSnapshot| {
                log::debug!("Game state {} ({})", snapshot.id, snapshot.phase);
                set_state.set(Some(snapshot));
            },
            move |e: ChannelError| {
                log::error!("Game state channel failed: {e}");
                set_error.set(Some(e.to_string()));
            },
        );

    match opened {
        Ok((handle, task)) => {
            spawn_local(task);
            on_cleanup(move || handle.close());
        }
        Err(e) => {
            set_channel_state.set(ChannelState::Failed);
            set_error.set(Some(e.to_string()));
        }
    }

    GameStateSignals {
        state,
        channel_state,
        error,
    }
}

#[cfg(target_arch = "wasm32")]
pub fn use_game_state(state_id: &str, config: ChannelConfig) -> GameStateSignals {
    use game_channel::{BrowserSleeper, WebSocketConnector};

    use_game_state_with(WebSocketConnector, BrowserSleeper, config, state_id)
}

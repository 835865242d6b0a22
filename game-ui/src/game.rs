use leptos::either::*;
use leptos::prelude::*;

use cah_lib::GameStateSnapshot;

use crate::{
    cards::BlackCardView,
    info::{ConnectionStatus, ErrorBanner, ExtraGameInfo},
    players::PlayersInfo,
    state::GameStateSignals,
    table::{Hand, Table},
};

#[component]
pub fn GameView(signals: GameStateSignals) -> impl IntoView {
    let GameStateSignals {
        state,
        channel_state,
        error,
    } = signals;

    view! {
        <div class="cah-game">
            <ConnectionStatus channel_state />
            <ErrorBanner error />
            {move || state.get().map(|state| view! { <GameBoard state /> })}
        </div>
    }
}

#[component]
pub fn GameBoard(state: GameStateSnapshot) -> impl IntoView {
    if state.phase.is_finished() {
        return Either::Left(view! { <FinishedGame state /> });
    }
    let phase = state.phase.to_string();
    Either::Right(view! {
        <h2 class="text-center text-2xl my-2">{phase}</h2>
        <PlayersInfo state=state.clone() />
        <Table state=state.clone() />
        <Hand state=state.clone() />
        <ExtraGameInfo state />
    })
}

#[component]
pub fn FinishedGame(state: GameStateSnapshot) -> impl IntoView {
    let winner = state.winner().cloned();
    let summary = match winner {
        Some(winner) => Either::Left(view! {
            <h2 class="text-xl my-2">"Winner: " {winner.name}</h2>
            <h3 class="font-medium">"Black cards earned:"</h3>
            <div class="flex flex-wrap justify-center">
                {winner
                    .points
                    .into_iter()
                    .map(|card| view! { <BlackCardView card /> })
                    .collect_view()}
            </div>
        }),
        None => Either::Right(view! { <h2 class="text-xl my-2">"No players left"</h2> }),
    };

    view! {
        <PlayersInfo state />
        <div class="text-center">
            <h1 class="text-3xl my-4">"Game finished!"</h1>
            {summary}
        </div>
    }
}

#[cfg(target_arch = "wasm32")]
#[component]
pub fn GamePage(state_id: String, #[prop(optional)] config: game_channel::ChannelConfig) -> impl IntoView {
    let signals = crate::state::use_game_state(&state_id, config);
    view! { <GameView signals /> }
}

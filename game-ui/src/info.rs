use leptos::prelude::*;

use cah_lib::GameStateSnapshot;
use game_channel::ChannelState;

#[component]
pub fn ExtraGameInfo(state: GameStateSnapshot) -> impl IntoView {
    view! {
        <div class="text-center my-4">
            <p>
                <b>"Round: "</b>
                {state.round_text()}
            </p>
            <p>
                <b>"Black cards left: "</b>
                {state.black_cards_left}
            </p>
            <p>
                <b>"White cards left: "</b>
                {state.white_cards_left}
            </p>
        </div>
    }
}

#[component]
pub fn ConnectionStatus(channel_state: ReadSignal<ChannelState>) -> impl IntoView {
    let text = move || match channel_state.get() {
        ChannelState::Open | ChannelState::Closed => None,
        s => Some(s.to_string()),
    };
    view! { <div class="text-center text-neutral-500 h-6">{text}</div> }
}

#[component]
pub fn ErrorBanner(error: ReadSignal<Option<String>>) -> impl IntoView {
    view! { <div class="text-center text-red-600 h-8">{move || error.get()}</div> }
}

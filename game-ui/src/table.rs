use leptos::prelude::*;

use cah_lib::{GameStateSnapshot, SinnerPlay};

use crate::cards::{BlackCardView, WhiteCardView};

#[component]
pub fn Table(state: GameStateSnapshot) -> impl IntoView {
    let plays = state
        .sinner_plays
        .into_iter()
        .map(|play| view! { <SinnerPlayView play /> })
        .collect_view();

    view! {
        <div class="flex flex-wrap justify-center items-start my-4">
            <BlackCardView card=state.black_card_in_play />
            {plays}
        </div>
    }
}

#[component]
fn SinnerPlayView(play: SinnerPlay) -> impl IntoView {
    view! {
        <div class="inline-flex m-1 p-1 rounded-md bg-neutral-500/30" id=format!("play_{}", play.id)>
            {play
                .white_cards
                .into_iter()
                .map(|card| view! { <WhiteCardView card /> })
                .collect_view()}
        </div>
    }
}

#[component]
pub fn Hand(state: GameStateSnapshot) -> impl IntoView {
    let me = state.my_player;
    let in_play = (!me.white_cards_in_play.is_empty()).then(|| {
        view! {
            <div class="my-2">
                <h3 class="font-medium">"In play"</h3>
                {me
                    .white_cards_in_play
                    .into_iter()
                    .map(|card| view! { <WhiteCardView card /> })
                    .collect_view()}
            </div>
        }
    });

    view! {
        <div class="text-center my-4">
            {in_play}
            <div class="flex flex-wrap justify-center">
                {me.hand.into_iter().map(|card| view! { <WhiteCardView card /> }).collect_view()}
            </div>
        </div>
    }
}

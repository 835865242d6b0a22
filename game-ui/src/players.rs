use leptos::either::*;
use leptos::prelude::*;

use cah_lib::{GameStateSnapshot, PlayerInfo, PlayerStatus};

use crate::cards::PointInfo;

#[component]
pub fn PlayersInfo(state: GameStateSnapshot) -> impl IntoView {
    let players_view = state
        .players
        .iter()
        .map(|player| {
            let its_you = state.is_me(player);
            let status = player.status(state.current_czar_id);
            view! { <PlayerCard player=player.clone() its_you status /> }
        })
        .collect_view();
    view! { <div class="flex flex-wrap justify-center my-4">{players_view}</div> }
}

#[component]
fn PlayerCard(player: PlayerInfo, its_you: bool, status: PlayerStatus) -> impl IntoView {
    let status_view = match status {
        PlayerStatus::Czar => Either::Left(view! { <b>{status.to_string()}</b> }),
        _ => Either::Right(view! { <span>{status.to_string()}</span> }),
    };
    let you = its_you.then(|| view! { <b>" (You)"</b> });

    view! {
        <div class="grow m-1 p-1 rounded-sm shadow-lg bg-neutral-200/50 text-neutral-900">
            <div>{player.name} {you}</div>
            <div>{status_view}</div>
            <div class="flex flex-wrap">
                {player
                    .points
                    .into_iter()
                    .map(|card| view! { <PointInfo card /> })
                    .collect_view()}
            </div>
        </div>
    }
}

use leptos::prelude::*;

use cah_lib::{BlackCard, WhiteCard};

#[macro_export]
macro_rules! card_class {
    ($colors:literal) => {
        concat!(
            "inline-flex flex-col justify-between w-36 h-48 m-1 p-2 rounded-md shadow-md text-left text-sm font-bold ",
            $colors
        )
    };
}

#[component]
pub fn WhiteCardView(card: WhiteCard) -> impl IntoView {
    view! {
        <div class=card_class!("bg-white text-black")>
            <span>{card.text}</span>
            <span class="text-xs font-normal text-neutral-500">{card.expansion}</span>
        </div>
    }
}

#[component]
pub fn BlackCardView(card: BlackCard) -> impl IntoView {
    let pick = (card.blanks > 1).then(|| format!("Pick {}", card.blanks));
    view! {
        <div class=card_class!("bg-black text-white")>
            <span>{card.text}</span>
            <span class="flex justify-between text-xs font-normal text-neutral-400">
                <span>{card.expansion}</span>
                <span>{pick}</span>
            </span>
        </div>
    }
}

/// Small black square standing for an earned black card; hovering shows the text.
#[component]
pub fn PointInfo(card: BlackCard) -> impl IntoView {
    view! {
        <span class="inline-block w-3.5 h-4 m-0.5 rounded-sm bg-black has-tooltip relative">
            <span class="tooltip font-bold rounded-sm whitespace-nowrap bg-white text-black px-1 top-0 left-0 -mt-5 cursor-default">
                {card.text}
            </span>
        </span>
    }
}

pub mod snapshot;
pub mod urls;

pub use snapshot::{
    BlackCard, FullPlayerInfo, GameStateSnapshot, Phase, PlayerInfo, PlayerStatus, SinnerPlay,
    WhiteCard,
};

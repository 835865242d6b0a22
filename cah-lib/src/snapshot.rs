use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;

#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteCard {
    pub text: String,
    pub expansion: String,
}

#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackCard {
    pub text: String,
    pub expansion: String,
    pub blanks: usize,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    SinnersPlaying,
    CzarChoosingWinner,
    Finished,
    #[serde(other)]
    Unknown,
}

impl Phase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Phase::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::SinnersPlaying => "Sinners Playing",
            Phase::CzarChoosingWinner => "Czar Choosing Winner",
            Phase::Finished => "Finished",
            Phase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Public view of a player, as every participant sees it.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: i64,
    pub name: String,
    pub hand_size: usize,
    pub white_cards_in_play: usize,
    pub points: Vec<BlackCard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerStatus {
    Czar,
    Waiting,
    Playing,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerStatus::Czar => "Current Czar",
            PlayerStatus::Waiting => "Waiting",
            PlayerStatus::Playing => "Playing...",
        };
        f.write_str(s)
    }
}

impl PlayerInfo {
    pub fn status(&self, current_czar_id: i64) -> PlayerStatus {
        if self.id == current_czar_id {
            PlayerStatus::Czar
        } else if self.white_cards_in_play > 0 {
            PlayerStatus::Waiting
        } else {
            PlayerStatus::Playing
        }
    }
}

/// The receiving player's own view, including the hand.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FullPlayerInfo {
    pub id: i64,
    pub name: String,
    pub hand: Vec<WhiteCard>,
    pub white_cards_in_play: Vec<WhiteCard>,
    pub points: Vec<BlackCard>,
}

#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SinnerPlay {
    pub id: i64,
    pub white_cards: Vec<WhiteCard>,
}

/// Whole game state pushed by the server. Each one replaces the previous.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameStateSnapshot {
    pub id: i64,
    pub phase: Phase,
    pub players: Vec<PlayerInfo>,
    #[serde(rename = "currentCzarID")]
    pub current_czar_id: i64,
    pub black_card_in_play: BlackCard,
    pub black_cards_left: usize,
    pub white_cards_left: usize,
    pub sinner_plays: Vec<SinnerPlay>,
    pub my_player: FullPlayerInfo,
    pub curr_round: u32,
    // 0 when the game has no round limit
    pub max_rounds: u32,
}

impl GameStateSnapshot {
    pub fn is_me(&self, player: &PlayerInfo) -> bool {
        player.id == self.my_player.id
    }

    pub fn is_czar(&self, player: &PlayerInfo) -> bool {
        player.id == self.current_czar_id
    }

    pub fn am_czar(&self) -> bool {
        self.my_player.id == self.current_czar_id
    }

    pub fn round_text(&self) -> String {
        if self.max_rounds > 0 {
            format!("{} of {}", self.curr_round, self.max_rounds)
        } else {
            self.curr_round.to_string()
        }
    }

    /// Player with the most black cards once the game is over.
    ///
    /// Ties go to whoever comes first in the player list.
    pub fn winner(&self) -> Option<&PlayerInfo> {
        if !self.phase.is_finished() {
            return None;
        }
        self.players.iter().fold(None, |best, p| match best {
            Some(b) if b.points.len() >= p.points.len() => Some(b),
            _ => Some(p),
        })
    }
}

impl FromStr for GameStateSnapshot {
    type Err = SerdeJsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str::<GameStateSnapshot>(s)
    }
}

// Initiative-derived turn ordering. Pure functions over the player set.

use itertools::Itertools;

use crate::catalog;
use crate::enums::Phase;
use crate::ordered_set::OrderedSet;

use super::types::{GameState, Player, PlayerId};

/// Initiative of a player without a faction override or a claimed card.
pub const NO_INITIATIVE: u8 = 99;

pub fn effective_initiative(player: &Player) -> u8 {
    catalog::fixed_initiative(player.faction_id.as_deref())
        .or(player.strategy_card.map(|c| c.initiative))
        .unwrap_or(NO_INITIATIVE)
}

/// Players by ascending initiative; ties keep seating order.
pub fn sort_by_initiative(players: &[Player]) -> Vec<&Player> {
    players
        .iter()
        .sorted_by_key(|p| effective_initiative(p))
        .collect()
}

pub fn first_unpassed<'a>(
    players: &'a [Player],
    passed: &OrderedSet<PlayerId>,
) -> Option<&'a Player> {
    sort_by_initiative(players)
        .into_iter()
        .find(|p| !passed.contains(&p.id))
}

/// The player who acts after `current`.
///
/// Walks initiative order starting at the seat after `current`, wrapping
/// around, so `current` itself is only returned when every other player has
/// passed. Returns `None` once everybody has passed.
pub fn next_player<'a>(
    players: &'a [Player],
    current: Option<&str>,
    passed: &OrderedSet<PlayerId>,
) -> Option<&'a Player> {
    let order = sort_by_initiative(players);
    let Some(index) = current.and_then(|id| order.iter().position(|p| p.id == id)) else {
        return first_unpassed(players, passed);
    };
    (1..=order.len())
        .map(|step| order[(index + step) % order.len()])
        .find(|p| !passed.contains(&p.id))
}

/// Whoever holds the turn right now: `current` while they are still in the
/// round, otherwise the next unpassed player.
pub fn active_player<'a>(
    players: &'a [Player],
    current: Option<&str>,
    passed: &OrderedSet<PlayerId>,
) -> Option<&'a Player> {
    match current.and_then(|id| players.iter().find(|p| p.id == id)) {
        Some(player) if !passed.contains(&player.id) => Some(player),
        _ => next_player(players, current, passed),
    }
}

fn rotated_from(players: &[Player], start: usize) -> Vec<&Player> {
    if players.is_empty() {
        return Vec::new();
    }
    (0..players.len())
        .map(|offset| &players[(start + offset) % players.len()])
        .collect()
}

fn speaker_index(players: &[Player]) -> Option<usize> {
    players.iter().position(|p| p.is_speaker)
}

/// Strategy-phase pick order: the speaker first, then clockwise by seat.
pub fn speaker_order(players: &[Player]) -> Vec<&Player> {
    rotated_from(players, speaker_index(players).unwrap_or(0))
}

/// Agenda voting order: the player after the speaker first, the speaker last.
pub fn voting_order(players: &[Player]) -> Vec<&Player> {
    rotated_from(players, speaker_index(players).map_or(0, |i| i + 1))
}

/// The player whose turn it is to claim a strategy card.
pub fn current_picker(players: &[Player]) -> Option<&Player> {
    speaker_order(players)
        .into_iter()
        .find(|p| p.strategy_card.is_none())
}

/// How a phase lists its players.
pub fn display_order(phase: Phase, players: &[Player]) -> Vec<&Player> {
    match phase {
        Phase::Strategy => speaker_order(players),
        Phase::Action | Phase::Status => sort_by_initiative(players),
        Phase::Agenda => voting_order(players),
        Phase::Setup | Phase::Results => players.iter().collect(),
    }
}

impl GameState {
    /// The only player allowed to act in the action phase. With time-limit
    /// mode this is exactly the current player; without it an unset or
    /// passed current falls through to the next unpassed player.
    pub fn acting_player_id(&self) -> Option<&str> {
        if self.time_limit_mode {
            return self
                .current_turn_player_id
                .as_deref()
                .filter(|id| !self.passed_players.contains(*id));
        }
        active_player(
            &self.players,
            self.current_turn_player_id.as_deref(),
            &self.passed_players,
        )
        .map(|p| p.id.as_str())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game::types::StrategyCardClaim;
    use proptest::prelude::*;

    pub(crate) fn seat(index: usize, faction: Option<&str>, card: Option<u8>) -> Player {
        let mut player = Player::new(
            format!("player-{}", index),
            format!("Player {}", index + 1),
            catalog::PLAYER_COLORS[index % catalog::PLAYER_COLORS.len()],
        );
        player.faction_id = faction.map(str::to_string);
        player.strategy_card = card.map(|id| StrategyCardClaim { id, initiative: id });
        player
    }

    fn ids<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<&'a str> {
        players.into_iter().map(|p| p.id.as_str()).collect()
    }

    fn passed(ids: &[&str]) -> OrderedSet<PlayerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_effective_initiative_sources() {
        assert_eq!(effective_initiative(&seat(0, Some("sol"), Some(4))), 4);
        assert_eq!(effective_initiative(&seat(0, Some("naalu"), Some(8))), 0);
        assert_eq!(effective_initiative(&seat(0, Some("naalu"), None)), 0);
        assert_eq!(effective_initiative(&seat(0, None, None)), NO_INITIATIVE);
        assert_eq!(effective_initiative(&seat(0, Some("unknown"), Some(3))), 3);
    }

    #[test]
    fn test_sort_by_initiative_puts_naalu_first() {
        let players = vec![
            seat(0, Some("sol"), Some(1)),
            seat(1, Some("naalu"), Some(7)),
            seat(2, Some("hacan"), Some(3)),
        ];
        assert_eq!(
            ids(sort_by_initiative(&players)),
            vec!["player-1", "player-0", "player-2"]
        );
    }

    #[test]
    fn test_sort_is_stable_for_uncarded_players() {
        let players = vec![seat(0, None, None), seat(1, None, Some(2)), seat(2, None, None)];
        assert_eq!(
            ids(sort_by_initiative(&players)),
            vec!["player-1", "player-0", "player-2"]
        );
    }

    #[test]
    fn test_next_player_skips_passed_and_wraps() {
        // initiative order: player-2 (1), player-0 (3), player-1 (5)
        let players = vec![
            seat(0, None, Some(3)),
            seat(1, None, Some(5)),
            seat(2, None, Some(1)),
        ];
        let none = passed(&[]);
        assert_eq!(next_player(&players, None, &none).map(|p| p.id.as_str()), Some("player-2"));
        assert_eq!(
            next_player(&players, Some("player-2"), &none).map(|p| p.id.as_str()),
            Some("player-0")
        );
        assert_eq!(
            next_player(&players, Some("player-1"), &none).map(|p| p.id.as_str()),
            Some("player-2")
        );
        assert_eq!(
            next_player(&players, Some("player-2"), &passed(&["player-0"])).map(|p| p.id.as_str()),
            Some("player-1")
        );
    }

    #[test]
    fn test_next_player_returns_current_when_alone() {
        let players = vec![seat(0, None, Some(1)), seat(1, None, Some(2))];
        let p = passed(&["player-1"]);
        assert_eq!(
            next_player(&players, Some("player-0"), &p).map(|p| p.id.as_str()),
            Some("player-0")
        );
        let all = passed(&["player-0", "player-1"]);
        assert!(next_player(&players, Some("player-0"), &all).is_none());
    }

    #[test]
    fn test_active_player_prefers_unpassed_current() {
        let players = vec![seat(0, None, Some(1)), seat(1, None, Some(2)), seat(2, None, Some(3))];
        let none = passed(&[]);
        assert_eq!(
            active_player(&players, Some("player-1"), &none).map(|p| p.id.as_str()),
            Some("player-1")
        );
        assert_eq!(
            active_player(&players, Some("player-1"), &passed(&["player-1"])).map(|p| p.id.as_str()),
            Some("player-2")
        );
        assert_eq!(active_player(&players, None, &none).map(|p| p.id.as_str()), Some("player-0"));
    }

    #[test]
    fn test_speaker_and_voting_order() {
        let mut players: Vec<Player> = (0..4).map(|i| seat(i, None, None)).collect();
        players[2].is_speaker = true;
        assert_eq!(
            ids(speaker_order(&players)),
            vec!["player-2", "player-3", "player-0", "player-1"]
        );
        assert_eq!(
            ids(voting_order(&players)),
            vec!["player-3", "player-0", "player-1", "player-2"]
        );
        assert_eq!(
            ids(display_order(Phase::Agenda, &players)),
            ids(voting_order(&players))
        );
    }

    #[test]
    fn test_current_picker_follows_speaker_order() {
        let mut players: Vec<Player> = (0..3).map(|i| seat(i, None, None)).collect();
        players[1].is_speaker = true;
        assert_eq!(current_picker(&players).map(|p| p.id.as_str()), Some("player-1"));
        players[1].strategy_card = Some(StrategyCardClaim { id: 3, initiative: 3 });
        assert_eq!(current_picker(&players).map(|p| p.id.as_str()), Some("player-2"));
        players[2].strategy_card = Some(StrategyCardClaim { id: 4, initiative: 4 });
        players[0].strategy_card = Some(StrategyCardClaim { id: 5, initiative: 5 });
        assert!(current_picker(&players).is_none());
    }

    fn roster_strategy() -> impl Strategy<Value = (Vec<Player>, Vec<bool>, Option<usize>)> {
        (3usize..=8).prop_flat_map(|count| {
            (
                Just(count),
                Just((1u8..=8).collect::<Vec<_>>()).prop_shuffle(),
                proptest::option::of(0..count),
                proptest::collection::vec(any::<bool>(), count),
                proptest::option::of(0..count),
            )
                .prop_map(|(count, cards, naalu, passed, current)| {
                    let players = (0..count)
                        .map(|i| {
                            let faction = if naalu == Some(i) { Some("naalu") } else { Some("sol") };
                            seat(i, faction, Some(cards[i]))
                        })
                        .collect();
                    (players, passed, current)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_initiative_order_is_total((players, _, _) in roster_strategy()) {
            let order = sort_by_initiative(&players);
            prop_assert_eq!(order.len(), players.len());
            let keys: Vec<u8> = order.iter().map(|p| effective_initiative(p)).collect();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
            if let Some(naalu) = players.iter().find(|p| p.faction_id.as_deref() == Some("naalu")) {
                prop_assert_eq!(&order[0].id, &naalu.id);
            }
        }

        #[test]
        fn prop_next_player_never_returns_passed((players, flags, current) in roster_strategy()) {
            let passed: OrderedSet<PlayerId> = players
                .iter()
                .zip(&flags)
                .filter(|(_, flag)| **flag)
                .map(|(p, _)| p.id.clone())
                .collect();
            let current = current.map(|i| players[i].id.as_str());
            let next = next_player(&players, current, &passed);
            match next {
                Some(p) => prop_assert!(!passed.contains(&p.id)),
                None => prop_assert_eq!(passed.len(), players.len()),
            }
            let again = next_player(&players, current, &passed);
            prop_assert_eq!(next.map(|p| &p.id), again.map(|p| &p.id));
        }
    }
}

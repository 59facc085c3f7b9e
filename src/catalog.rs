// Static reference data: factions, strategy cards and seat colors.
//
// Read-only lookup tables. The only rule-bearing attribute is
// `fixed_initiative`, which pins a faction's turn priority regardless of the
// strategy card it holds.

use serde::Serialize;

use crate::enums::Expansion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub expansion: Expansion,
    /// Initiative that overrides the held strategy card, if any.
    pub fixed_initiative: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCard {
    pub id: u8,
    pub name: &'static str,
    pub color: &'static str,
    pub initiative: u8,
}

const fn faction(
    id: &'static str,
    name: &'static str,
    color: &'static str,
    expansion: Expansion,
    fixed_initiative: Option<u8>,
) -> Faction {
    Faction {
        id,
        name,
        color,
        expansion,
        fixed_initiative,
    }
}

const fn card(id: u8, name: &'static str, color: &'static str) -> StrategyCard {
    StrategyCard {
        id,
        name,
        color,
        initiative: id,
    }
}

pub const FACTIONS: &[Faction] = &[
    faction("arborec", "The Arborec", "#2d5a27", Expansion::Base, None),
    faction("barony", "The Barony of Letnev", "#4a4a4a", Expansion::Base, None),
    faction("saar", "The Clan of Saar", "#8b7355", Expansion::Base, None),
    faction("muaat", "The Embers of Muaat", "#ff4500", Expansion::Base, None),
    faction("hacan", "The Emirates of Hacan", "#ffd700", Expansion::Base, None),
    faction("sol", "The Federation of Sol", "#1e90ff", Expansion::Base, None),
    faction("creuss", "The Ghosts of Creuss", "#00ced1", Expansion::Base, None),
    faction("l1z1x", "The L1Z1X Mindnet", "#483d8b", Expansion::Base, None),
    faction("mentak", "The Mentak Coalition", "#ff8c00", Expansion::Base, None),
    faction("naalu", "The Naalu Collective", "#9370db", Expansion::Base, Some(0)),
    faction("nekro", "The Nekro Virus", "#8b0000", Expansion::Base, None),
    faction("sardakk", "Sardakk N'orr", "#b22222", Expansion::Base, None),
    faction("jolnar", "The Universities of Jol-Nar", "#4169e1", Expansion::Base, None),
    faction("winnu", "The Winnu", "#daa520", Expansion::Base, None),
    faction("xxcha", "The Xxcha Kingdom", "#228b22", Expansion::Base, None),
    faction("yin", "The Yin Brotherhood", "#f5f5f5", Expansion::Base, None),
    faction("yssaril", "The Yssaril Tribes", "#006400", Expansion::Base, None),
    faction("argent", "The Argent Flight", "#c0c0c0", Expansion::Pok, None),
    faction("empyrean", "The Empyrean", "#9932cc", Expansion::Pok, None),
    faction("mahact", "The Mahact Gene-Sorcerers", "#800080", Expansion::Pok, None),
    faction("naazrokha", "The Naaz-Rokha Alliance", "#cd853f", Expansion::Pok, None),
    faction("nomad", "The Nomad", "#2f4f4f", Expansion::Pok, None),
    faction("titans", "The Titans of Ul", "#708090", Expansion::Pok, None),
    faction("cabal", "The Vuil'Raith Cabal", "#dc143c", Expansion::Pok, None),
    faction("keleres", "The Council Keleres", "#fafad2", Expansion::Codex, None),
    faction("crimson", "The Crimson Rebellion", "#cc0000", Expansion::ThundersEdge, None),
    faction("deepwrought", "The Deepwrought Scholarate", "#1a5276", Expansion::ThundersEdge, None),
    faction("firmament", "The Firmament / The Obsidian", "#1c1c1c", Expansion::ThundersEdge, None),
    faction("lastbastion", "Last Bastion", "#d4af37", Expansion::ThundersEdge, None),
    faction("ralnel", "The Ral Nel Consortium", "#4ecdc4", Expansion::ThundersEdge, None),
];

pub const STRATEGY_CARDS: [StrategyCard; 8] = [
    card(1, "Leadership", "#dc2626"),
    card(2, "Diplomacy", "#f59e0b"),
    card(3, "Politics", "#eab308"),
    card(4, "Construction", "#22c55e"),
    card(5, "Trade", "#06b6d4"),
    card(6, "Warfare", "#3b82f6"),
    card(7, "Technology", "#8b5cf6"),
    card(8, "Imperial", "#ec4899"),
];

pub const PLAYER_COLORS: [&str; 8] = [
    "#ef4444", "#3b82f6", "#22c55e", "#eab308", "#8b5cf6", "#ec4899", "#f97316", "#14b8a6",
];

pub fn find_faction(id: &str) -> Option<&'static Faction> {
    FACTIONS.iter().find(|f| f.id == id)
}

pub fn find_strategy_card(id: u8) -> Option<&'static StrategyCard> {
    STRATEGY_CARDS.iter().find(|c| c.id == id)
}

/// Fixed initiative declared by a faction, if the faction is known and has one.
pub fn fixed_initiative(faction_id: Option<&str>) -> Option<u8> {
    faction_id
        .and_then(find_faction)
        .and_then(|f| f.fixed_initiative)
}

pub fn factions_in(expansion: Expansion) -> impl Iterator<Item = &'static Faction> {
    FACTIONS.iter().filter(move |f| f.expansion == expansion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_faction_ids_are_unique() {
        let ids: HashSet<_> = FACTIONS.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), FACTIONS.len());
    }

    #[test]
    fn test_only_naalu_has_fixed_initiative() {
        let fixed: Vec<_> = FACTIONS
            .iter()
            .filter(|f| f.fixed_initiative.is_some())
            .map(|f| f.id)
            .collect();
        assert_eq!(fixed, vec!["naalu"]);
        assert_eq!(fixed_initiative(Some("naalu")), Some(0));
        assert_eq!(fixed_initiative(Some("sol")), None);
        assert_eq!(fixed_initiative(None), None);
    }

    #[test]
    fn test_strategy_card_initiatives_are_distinct() {
        for (i, card) in STRATEGY_CARDS.iter().enumerate() {
            assert_eq!(card.initiative as usize, i + 1);
        }
        assert_eq!(find_strategy_card(8).map(|c| c.name), Some("Imperial"));
        assert!(find_strategy_card(9).is_none());
    }

    #[test]
    fn test_expansion_grouping() {
        assert_eq!(factions_in(Expansion::Base).count(), 17);
        assert_eq!(factions_in(Expansion::Pok).count(), 7);
        assert_eq!(factions_in(Expansion::Codex).count(), 1);
        assert_eq!(factions_in(Expansion::ThundersEdge).count(), 5);
    }
}

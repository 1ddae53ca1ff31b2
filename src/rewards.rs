//! Stars and unlockable characters
//!
//! The profile is the reward collaborator: finished games pay their stars
//! into it, and stars buy characters from the roster.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A playable character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    /// Stars needed to unlock
    pub cost: u32,
}

/// Character that is always unlocked
pub const DEFAULT_CHARACTER: &str = "repairman";

pub const CHARACTERS: [Character; 8] = [
    Character { id: "repairman", name: "Repairman", cost: 0 },
    Character { id: "bluey", name: "Bluey", cost: 25 },
    Character { id: "bingo", name: "Bingo", cost: 25 },
    Character { id: "rainbow-llama", name: "Rainbow Llama", cost: 25 },
    Character { id: "curious-george", name: "Curious George", cost: 25 },
    Character { id: "orca", name: "Orca", cost: 25 },
    Character { id: "qiaohu", name: "Qiaohu", cost: 25 },
    Character { id: "zander", name: "Zander", cost: 25 },
];

pub fn find_character(id: &str) -> Option<&'static Character> {
    CHARACTERS.iter().find(|c| c.id == id)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnlockError {
    #[error("unknown character `{0}`")]
    UnknownCharacter(String),
    #[error("character `{0}` is already unlocked")]
    AlreadyUnlocked(String),
    #[error("character `{id}` is locked")]
    Locked { id: String },
    #[error("need {cost} stars, have {available}")]
    NotEnoughStars { cost: u32, available: u32 },
}

/// Receives the stars earned by a finished game
pub trait RewardSink {
    fn award(&mut self, stars: u32);
}

/// Persistent player progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub total_stars: u32,
    pub unlocked_characters: Vec<String>,
    pub selected_character: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            total_stars: 0,
            unlocked_characters: vec![DEFAULT_CHARACTER.to_string()],
            selected_character: DEFAULT_CHARACTER.to_string(),
        }
    }
}

impl Profile {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked_characters.iter().any(|c| c == id)
    }

    /// Spend stars on a character and switch to it
    pub fn unlock(&mut self, id: &str) -> Result<(), UnlockError> {
        let character =
            find_character(id).ok_or_else(|| UnlockError::UnknownCharacter(id.to_string()))?;
        if self.is_unlocked(id) {
            return Err(UnlockError::AlreadyUnlocked(id.to_string()));
        }
        if self.total_stars < character.cost {
            return Err(UnlockError::NotEnoughStars {
                cost: character.cost,
                available: self.total_stars,
            });
        }

        self.total_stars -= character.cost;
        self.unlocked_characters.push(id.to_string());
        self.selected_character = id.to_string();
        log::info!("Unlocked {} for {} stars", character.name, character.cost);
        Ok(())
    }

    pub fn select(&mut self, id: &str) -> Result<(), UnlockError> {
        if find_character(id).is_none() {
            return Err(UnlockError::UnknownCharacter(id.to_string()));
        }
        if !self.is_unlocked(id) {
            return Err(UnlockError::Locked { id: id.to_string() });
        }
        self.selected_character = id.to_string();
        Ok(())
    }

    /// Drop unknown ids, keep the default unlocked, fix a bad selection
    pub fn sanitized(mut self) -> Self {
        let mut seen: Vec<String> = Vec::with_capacity(self.unlocked_characters.len() + 1);
        for id in self.unlocked_characters.drain(..) {
            if find_character(&id).is_some() && !seen.contains(&id) {
                seen.push(id);
            }
        }
        if !seen.iter().any(|id| id == DEFAULT_CHARACTER) {
            seen.insert(0, DEFAULT_CHARACTER.to_string());
        }
        self.unlocked_characters = seen;

        if !self.is_unlocked(&self.selected_character) {
            self.selected_character = DEFAULT_CHARACTER.to_string();
        }
        self
    }
}

impl RewardSink for Profile {
    fn award(&mut self, stars: u32) {
        self.total_stars = self.total_stars.saturating_add(stars);
        log::info!("Awarded {} stars (total {})", stars, self.total_stars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let p = Profile::default();
        assert_eq!(p.total_stars, 0);
        assert!(p.is_unlocked("repairman"));
        assert_eq!(p.selected_character, "repairman");
    }

    #[test]
    fn test_unlock_flow() {
        let mut p = Profile::default();
        assert_eq!(
            p.unlock("orca"),
            Err(UnlockError::NotEnoughStars {
                cost: 25,
                available: 0
            })
        );
        p.award(30);
        assert_eq!(p.unlock("orca"), Ok(()));
        assert_eq!(p.total_stars, 5);
        assert_eq!(p.selected_character, "orca");
        assert_eq!(
            p.unlock("orca"),
            Err(UnlockError::AlreadyUnlocked("orca".into()))
        );
        assert_eq!(
            p.unlock("dragon"),
            Err(UnlockError::UnknownCharacter("dragon".into()))
        );
    }

    #[test]
    fn test_select() {
        let mut p = Profile::default();
        assert!(matches!(p.select("bingo"), Err(UnlockError::Locked { .. })));
        p.award(25);
        p.unlock("bingo").unwrap();
        assert_eq!(p.select("repairman"), Ok(()));
        assert_eq!(p.selected_character, "repairman");
    }

    #[test]
    fn test_sanitize() {
        let p = Profile {
            total_stars: 3,
            unlocked_characters: vec!["ghost".into(), "orca".into(), "orca".into()],
            selected_character: "ghost".into(),
        }
        .sanitized();
        assert_eq!(p.unlocked_characters, vec!["repairman", "orca"]);
        assert_eq!(p.selected_character, "repairman");
        assert_eq!(p.total_stars, 3);
    }
}

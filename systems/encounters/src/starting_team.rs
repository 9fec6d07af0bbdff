use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use warband_core::{Command, TemplateId};

use crate::EncounterError;

/// Party the player picks before the first floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingTeam {
    /// A knight.
    Balanced,
    /// A berserker.
    Aggressive,
    /// An archer.
    Defensive,
}

impl StartingTeam {
    /// Every selectable team in menu order.
    pub const ALL: [Self; 3] = [Self::Balanced, Self::Aggressive, Self::Defensive];

    /// Stable key used in configuration files and on the command line.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced Team",
            Self::Aggressive => "Aggressive Team",
            Self::Defensive => "Defensive Team",
        }
    }

    /// One-line summary shown next to the name.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Balanced => "A well-rounded team with mixed abilities",
            Self::Aggressive => "High damage output but less survivability",
            Self::Defensive => "High survivability but slower damage output",
        }
    }

    /// Hero templates that make up the team.
    #[must_use]
    pub const fn templates(self) -> &'static [&'static str] {
        match self {
            Self::Balanced => &["knight"],
            Self::Aggressive => &["berserker"],
            Self::Defensive => &["archer"],
        }
    }

    /// Emits one level one recruitment per team member.
    pub fn recruit(self, out: &mut Vec<Command>) {
        out.extend(self.templates().iter().map(|template| Command::RecruitUnit {
            template: TemplateId::new(*template),
            level: 1,
        }));
    }
}

impl fmt::Display for StartingTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StartingTeam {
    type Err = EncounterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|team| team.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| EncounterError::UnknownStartingTeam(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back() {
        for team in StartingTeam::ALL {
            assert_eq!(team.key().parse::<StartingTeam>(), Ok(team));
        }
        assert_eq!("DEFENSIVE".parse::<StartingTeam>(), Ok(StartingTeam::Defensive));
        assert_eq!(
            "reckless".parse::<StartingTeam>(),
            Err(EncounterError::UnknownStartingTeam("reckless".to_owned()))
        );
    }

    #[test]
    fn aggressive_team_recruits_a_berserker() {
        let mut commands = Vec::new();
        StartingTeam::Aggressive.recruit(&mut commands);
        assert_eq!(
            commands,
            vec![Command::RecruitUnit {
                template: TemplateId::from("berserker"),
                level: 1,
            }]
        );
    }
}

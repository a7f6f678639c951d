//! Rank display names per category, indexed by rank ordinal.

use serde::Serialize;

use crate::tasks::types::TaskCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankInfo {
    pub display_name: &'static str,
    pub description: &'static str,
}

const fn rank(display_name: &'static str, description: &'static str) -> RankInfo {
    RankInfo {
        display_name,
        description,
    }
}

const WORK_RANKS: [RankInfo; 10] = [
    rank("Maintenance Novice", "Beginning your journey in the tunnels"),
    rank("Station Worker", "Learning the ways of the Metro"),
    rank("Tunnel Engineer", "Mastering the underground infrastructure"),
    rank("Duty Serviceman", "Keeping the stations running"),
    rank("Metro Technician", "Expert in Metro operations"),
    rank("Order Specialist", "Respected member of the Order"),
    rank("Station Commander", "Leading station operations"),
    rank("Faction Lieutenant", "Commanding respect in the Metro"),
    rank("Order General", "High-ranking Metro official"),
    rank("Polis Council", "Elite member of Metro leadership"),
];

const STUDY_RANKS: [RankInfo; 10] = [
    rank("Librarian Initiate", "Beginning to learn the old knowledge"),
    rank("Archive Seeker", "Collecting pre-war documents"),
    rank("Knowledge Hunter", "Exploring forgotten libraries"),
    rank("Polis Scholar", "Student of ancient wisdom"),
    rank("Artifact Researcher", "Studying anomalous phenomena"),
    rank("Science Master", "Expert in Metro sciences"),
    rank("Wisdom Keeper", "Guardian of Metro knowledge"),
    rank("Research Director", "Leader of scientific expeditions"),
    rank("Brahminy Elder", "Master of Metro wisdom"),
    rank("Grand Archivist", "Keeper of all Metro knowledge"),
];

const HEALTH_RANKS: [RankInfo; 10] = [
    rank("Field Medic", "Learning to heal in the Metro"),
    rank("Station Healer", "Caring for the station folk"),
    rank("Tunnel Doctor", "Experienced in Metro medicine"),
    rank("Radiation Expert", "Specialist in radiation treatment"),
    rank("Medical Officer", "Leading station medical care"),
    rank("Health Director", "Managing Metro healthcare"),
    rank("Chief Surgeon", "Master of Metro medicine"),
    rank("Medical Commander", "Coordinating medical operations"),
    rank("Health Council", "Elite medical authority"),
    rank("Medical Legend", "Legendary Metro healer"),
];

const PERSONAL_RANKS: [RankInfo; 10] = [
    rank("Metro Dweller", "Living in the underground"),
    rank("Station Citizen", "Established Metro resident"),
    rank("Tunnel Navigator", "Experienced Metro traveler"),
    rank("Metro Scout", "Explorer of dark tunnels"),
    rank("Station Elite", "Respected Metro citizen"),
    rank("Dark One Friend", "Connected to the Metro's mysteries"),
    rank("Metro Ranger", "Guardian of the tunnels"),
    rank("Spartan Warrior", "Elite Metro fighter"),
    rank("Metro Legend", "Living legend of the tunnels"),
    rank("Dark One Chosen", "One with the Metro's spirit"),
];

const SHOPPING_RANKS: [RankInfo; 10] = [
    rank("Bullet Counter", "Learning Metro's currency"),
    rank("Trade Novice", "Beginning trader in stations"),
    rank("Station Merchant", "Established local trader"),
    rank("Caravan Guard", "Protecting Metro trade"),
    rank("Market Dealer", "Skilled station merchant"),
    rank("Trade Master", "Expert in Metro commerce"),
    rank("Caravan Leader", "Leading trade expeditions"),
    rank("Market Commander", "Controlling station markets"),
    rank("Trade Baron", "Wealthy Metro merchant"),
    rank("Market Council", "Elite economic authority"),
];

const OTHER_RANKS: [RankInfo; 10] = [
    rank("Zone Rookie", "Fresh arrival to the Zone"),
    rank("Stalker", "Beginning Zone explorer"),
    rank("Zone Ranger", "Experienced Zone survivor"),
    rank("Duty Member", "Protector of the Zone"),
    rank("Freedom Fighter", "Champion of the Zone"),
    rank("Clear Sky Scout", "Master artifact hunter"),
    rank("Spartan Elite", "Elite Zone warrior"),
    rank("Zone Pathfinder", "Master of the Zone"),
    rank("Zone Expert", "Legend of the Zone"),
    rank("Zone Legend", "Living myth of the Zone"),
];

pub fn rank_table(category: TaskCategory) -> &'static [RankInfo; 10] {
    match category {
        TaskCategory::Work => &WORK_RANKS,
        TaskCategory::Study => &STUDY_RANKS,
        TaskCategory::Health => &HEALTH_RANKS,
        TaskCategory::Personal => &PERSONAL_RANKS,
        TaskCategory::Shopping => &SHOPPING_RANKS,
        TaskCategory::Other => &OTHER_RANKS,
    }
}

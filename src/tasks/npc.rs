//! NPC roster and flavor-message generation.
//!
//! Every category has a small cast of characters. On a task outcome the
//! generator picks one of the category's NPCs at random, then one of that
//! NPC's lines for the outcome, and files it in the inbox as unread.

use chrono::{DateTime, Utc};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::logutil::escape_log;
use crate::tasks::errors::TaskQuestError;
use crate::tasks::types::{Npc, NpcMessage, TaskCategory};

pub const DEFAULT_MAX_MESSAGES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Inbox of NPC messages plus the roster that writes them.
pub struct MessageGenerator {
    npcs: Vec<Npc>,
    messages: Vec<NpcMessage>,
    rng: StdRng,
    max_messages: usize,
}

impl MessageGenerator {
    pub fn new(npcs: Vec<Npc>) -> Self {
        Self {
            npcs,
            messages: Vec::new(),
            rng: StdRng::from_entropy(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Deterministic selection, for tests and replays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self.enforce_retention();
        self
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn primary_npc(&self, category: TaskCategory) -> Option<&Npc> {
        self.npcs
            .iter()
            .find(|n| n.category == category && n.is_primary)
            .or_else(|| self.npcs.iter().find(|n| n.category == category))
    }

    pub fn messages(&self) -> &[NpcMessage] {
        &self.messages
    }

    /// Replace the inbox, e.g. with messages restored from storage.
    pub fn restore_messages(&mut self, messages: Vec<NpcMessage>) {
        self.messages = messages;
        self.enforce_retention();
    }

    /// Append a message from a random NPC of `category`. `None` when the
    /// category has no NPC or the chosen NPC has no line for the outcome.
    pub fn generate(
        &mut self,
        category: TaskCategory,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Option<NpcMessage> {
        let candidates: Vec<&Npc> = self.npcs.iter().filter(|n| n.category == category).collect();
        let npc = *candidates.choose(&mut self.rng)?;
        let lines = match outcome {
            Outcome::Success => &npc.completion_messages,
            Outcome::Failure => &npc.failure_messages,
        };
        let line = lines.choose(&mut self.rng)?;
        let message = NpcMessage::new(npc, line, category, outcome == Outcome::Failure, now);
        debug!(
            "{} message from {} for {}: {}",
            if message.is_failure { "Failure" } else { "Success" },
            message.npc_id,
            category,
            escape_log(&message.message)
        );
        self.messages.push(message.clone());
        self.enforce_retention();
        Some(message)
    }

    pub fn mark_read(&mut self, message_id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.mark_read();
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        self.messages.iter_mut().for_each(NpcMessage::mark_read);
    }

    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_read).count()
    }

    /// Oldest read messages go first, then the oldest unread ones.
    fn enforce_retention(&mut self) {
        while self.messages.len() > self.max_messages {
            let victim = self.messages.iter().position(|m| m.is_read).unwrap_or(0);
            self.messages.remove(victim);
        }
    }
}

/// Reject rosters that would leave a category or outcome without a line.
pub fn validate_roster(npcs: &[Npc]) -> Result<(), TaskQuestError> {
    for category in TaskCategory::ALL {
        let cast: Vec<&Npc> = npcs.iter().filter(|n| n.category == category).collect();
        if cast.is_empty() {
            return Err(TaskQuestError::InvalidSeed(format!(
                "no NPC for category {}",
                category
            )));
        }
        if let Some(npc) = cast
            .iter()
            .find(|n| n.completion_messages.is_empty() || n.failure_messages.is_empty())
        {
            return Err(TaskQuestError::InvalidSeed(format!(
                "NPC {} needs both completion and failure lines",
                npc.id
            )));
        }
    }
    Ok(())
}

/// The built-in cast: two characters per category, one of them primary.
pub fn default_roster() -> Vec<Npc> {
    vec![
        Npc::new("commander_varek", "Commander Varek", "npc_varek", TaskCategory::Work)
            .with_personality("Strict, pragmatic, and relentless.")
            .with_completion(&[
                "You did what needed to be done. That's how survivors are made.",
                "Keep this up, and maybe you'll earn something more than just survival.",
                "Good. There's no room for slackers here.",
            ])
            .with_failure(&[
                "One task undone is one crack in the foundation. Enough cracks, and everything collapses.",
                "You think you'll get another chance? The wasteland doesn't do second chances.",
                "Discipline wins wars. Laziness loses them.",
            ])
            .as_primary(),
        Npc::new("karlo_butcher", "Karlo \"The Butcher\"", "npc_karlo", TaskCategory::Work)
            .with_personality("Gruff, no-nonsense, dark sense of humor.")
            .with_completion(&[
                "Work ain't pretty, but it keeps your hands from shaking.",
                "You get your job done, you get to eat. Simple as that.",
                "Not bad. You might actually survive out here.",
            ])
            .with_failure(&[
                "I used to know a guy who skipped work too much. He's fertilizer now.",
                "You think someone else is gonna carry your weight? Not in this world.",
                "Idle hands bring bad luck. You don't want bad luck.",
            ]),
        Npc::new("dr_rada", "Dr. Rada", "npc_rada", TaskCategory::Study)
            .with_personality("Intellectual, slightly eccentric, driven by curiosity.")
            .with_completion(&[
                "You've added another piece to the puzzle. Don't stop now.",
                "A sharp mind is more dangerous than a dull blade.",
                "If knowledge dies, so does the world. Keep learning.",
            ])
            .with_failure(&[
                "The ignorant don't last long out here.",
                "Every day you waste, history forgets another name. Don't let it be yours.",
                "You didn't study? Then you just chose to be prey.",
            ])
            .as_primary(),
        Npc::new("elias_archivist", "Elias \"The Archivist\"", "npc_elias", TaskCategory::Study)
            .with_personality("Nostalgic, melancholic, but determined.")
            .with_completion(&[
                "You remind me of the students I once taught. Before the silence took everything.",
                "You may not see it now, but this knowledge will save you one day.",
                "One more page remembered, one less piece of the past lost.",
            ])
            .with_failure(&[
                "A world without knowledge is a world without light. Do you really want to live in the dark?",
                "I've seen bright minds waste away because they stopped caring. Don't follow their path.",
                "Ignoring wisdom is like ignoring a loaded gun pointed at you.",
            ]),
        Npc::new("medic_tasha", "Medic Tasha", "npc_tasha", TaskCategory::Health)
            .with_personality("Compassionate but no-nonsense.")
            .with_completion(&[
                "Taking care of yourself isn't selfish. It's necessary.",
                "A strong body keeps you alive. A weak one makes you a target.",
                "You're one of the few who actually listen. Good.",
            ])
            .with_failure(&[
                "Neglect yourself, and the world will do the rest.",
                "I don't patch up fools. Take care of yourself.",
                "Sick, weak, tired. Pick any of those and you won't last long.",
            ])
            .as_primary(),
        Npc::new("brother_caleb", "Brother Caleb", "npc_caleb", TaskCategory::Health)
            .with_personality("Calm, philosophical, slightly eerie.")
            .with_completion(&[
                "You heal yourself, you heal the world in small ways.",
                "Good. Life is a fragile ember. You must tend it carefully.",
                "Pain is a lesson. Strength is its reward.",
            ])
            .with_failure(&[
                "The body is a temple. Yours is crumbling.",
                "Even the strongest fall when their health fades.",
                "Do you wish to meet the void so soon?",
            ]),
        Npc::new("nomad", "Nomad", "npc_nomad", TaskCategory::Personal)
            .with_personality("Mysterious, poetic, deeply introspective.")
            .with_completion(&[
                "You did something for yourself. That's rare in a world that only takes.",
                "Even the smallest step forward is still movement.",
                "You are not just surviving. You are living. Keep going.",
            ])
            .with_failure(&[
                "A road unwalked is a journey lost.",
                "You ignore yourself today, you lose yourself tomorrow.",
                "Your soul needs care too. Don't let it wither.",
            ])
            .as_primary(),
        Npc::new("marika", "Marika", "npc_marika", TaskCategory::Personal)
            .with_personality("Wistful, slightly melancholic but hopeful.")
            .with_completion(&[
                "You found time for yourself. That means you're still human.",
                "Personal time is like a rare artifact. Cherish it.",
                "A little beauty in this world of ash? That's worth something.",
            ])
            .with_failure(&[
                "Too busy for yourself? That's how people become empty shells.",
                "Neglecting what makes you you? Dangerous mistake.",
                "You can run from yourself, but you won't get far.",
            ]),
        Npc::new("grifter", "Grifter", "npc_grifter", TaskCategory::Shopping)
            .with_personality("Cunning, sarcastic, always looking for a deal.")
            .with_completion(&[
                "You got what you needed. Smart move.",
                "Preparedness is the difference between a survivor and a corpse.",
                "You planned ahead? Good. That's rare.",
            ])
            .with_failure(&[
                "No supplies? No problem. Just hope you don't get hungry.",
                "A fool and their last meal are soon parted.",
                "Ever seen someone desperate? It's not pretty. Stock up next time.",
            ])
            .as_primary(),
        Npc::new("viktor_mule", "Viktor \"The Mule\"", "npc_viktor", TaskCategory::Shopping)
            .with_personality("Gruff, but secretly enjoys helping people.")
            .with_completion(&[
                "You stocked up? You're smarter than most.",
                "A full bag today keeps desperation away tomorrow.",
                "Supplies are life. Don't forget that.",
            ])
            .with_failure(&[
                "No supplies? Hope you like bartering with bullets.",
                "Hungry, cold, unprepared. You're setting yourself up for trouble.",
                "Ran out of essentials? What's next, selling your boots?",
            ]),
        Npc::new("the_voice", "The Voice", "npc_voice", TaskCategory::Other)
            .with_personality("Mysterious radio broadcaster.")
            .with_completion(&[
                "Every action changes the tide. You did well.",
                "A step forward is a step away from the abyss.",
                "The world watches. Keep moving.",
            ])
            .with_failure(&[
                "Stagnation is a slow death. Beware.",
                "You lost today, but tomorrow is unwritten.",
                "Even shadows move. Why don't you?",
            ])
            .as_primary(),
        Npc::new("old_man_kaspar", "Old Man Kaspar", "npc_kaspar", TaskCategory::Other)
            .with_personality("Crazy hermit, speaks in riddles.")
            .with_completion(&[
                "The gears turn, the wheel moves. Keep pushing.",
                "Another day won, another ghost left behind.",
            ])
            .with_failure(&[
                "A stalled engine rusts away. Get moving.",
                "The stars whisper warnings. Listen before it's too late.",
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> MessageGenerator {
        MessageGenerator::new(default_roster()).with_seed(7)
    }

    #[test]
    fn default_roster_covers_every_category() {
        assert!(validate_roster(&default_roster()).is_ok());
        for category in TaskCategory::ALL {
            let primaries = default_roster()
                .into_iter()
                .filter(|n| n.category == category && n.is_primary)
                .count();
            assert_eq!(primaries, 1, "{}", category);
        }
    }

    #[test]
    fn success_message_comes_from_category_cast() {
        let mut gen = generator();
        let msg = gen
            .generate(TaskCategory::Study, Outcome::Success, Utc::now())
            .unwrap();
        assert!(!msg.is_failure);
        assert!(!msg.is_read);
        let npc = gen.npcs().iter().find(|n| n.id == msg.npc_id).unwrap();
        assert_eq!(npc.category, TaskCategory::Study);
        assert!(npc.completion_messages.contains(&msg.message));
        assert_eq!(gen.unread_count(), 1);
    }

    #[test]
    fn failure_message_uses_failure_lines() {
        let mut gen = generator();
        let msg = gen
            .generate(TaskCategory::Shopping, Outcome::Failure, Utc::now())
            .unwrap();
        assert!(msg.is_failure);
        let npc = gen.npcs().iter().find(|n| n.id == msg.npc_id).unwrap();
        assert!(npc.failure_messages.contains(&msg.message));
    }

    #[test]
    fn unknown_category_cast_is_noop() {
        let roster: Vec<Npc> = default_roster()
            .into_iter()
            .filter(|n| n.category != TaskCategory::Other)
            .collect();
        let mut gen = MessageGenerator::new(roster);
        assert!(gen
            .generate(TaskCategory::Other, Outcome::Success, Utc::now())
            .is_none());
        assert!(gen.messages().is_empty());
    }

    #[test]
    fn read_flags() {
        let mut gen = generator();
        let first = gen.generate(TaskCategory::Work, Outcome::Success, Utc::now()).unwrap();
        gen.generate(TaskCategory::Work, Outcome::Failure, Utc::now());
        assert!(gen.mark_read(&first.id));
        assert!(!gen.mark_read("missing"));
        assert_eq!(gen.unread_count(), 1);
        gen.mark_all_read();
        assert_eq!(gen.unread_count(), 0);
    }

    #[test]
    fn retention_evicts_read_messages_first() {
        let mut gen = generator().with_max_messages(2);
        let keep_unread = gen.generate(TaskCategory::Work, Outcome::Success, Utc::now()).unwrap();
        let read = gen.generate(TaskCategory::Work, Outcome::Success, Utc::now()).unwrap();
        gen.mark_read(&read.id);
        let newest = gen.generate(TaskCategory::Work, Outcome::Success, Utc::now()).unwrap();

        let ids: Vec<&str> = gen.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![keep_unread.id.as_str(), newest.id.as_str()]);
    }

    #[test]
    fn roster_validation_rejects_gaps() {
        let mut roster = default_roster();
        roster.retain(|n| n.category != TaskCategory::Health);
        assert!(matches!(
            validate_roster(&roster),
            Err(TaskQuestError::InvalidSeed(_))
        ));
    }
}

//! French chat templates

use std::time::Duration;

use crate::combat::counter::CounterReport;
use crate::combat::precision::PrecisionLevel;
use crate::combat::resolution::Outcome;
use crate::combat::severity::FailureSeverity;
use crate::ports::{ActorProfile, Narrator};
use crate::reaction::NpcReaction;

/// Fixed-template narrator
#[derive(Debug, Clone, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    pub fn new() -> Self {
        Self
    }
}

fn failure_line(severity: FailureSeverity) -> &'static str {
    match severity {
        FailureSeverity::Light => "perd un instant l'équilibre",
        FailureSeverity::Moderate => "trébuche et doit se reprendre",
        FailureSeverity::Heavy => "se découvre complètement et chancelle",
        FailureSeverity::Critical => "s'effondre au sol, sonné",
        FailureSeverity::Catastrophic => "se blesse gravement dans son propre élan",
    }
}

fn success_line(level: PrecisionLevel) -> &'static str {
    match level {
        PrecisionLevel::VeryHigh => "exécute le mouvement avec une précision magistrale",
        PrecisionLevel::High => "porte un coup net et bien placé",
        PrecisionLevel::Medium => "réussit son action",
        PrecisionLevel::Low => "s'en sort de justesse",
        PrecisionLevel::VeryLow => "réussit par pure chance",
    }
}

impl Narrator for TemplateNarrator {
    fn narrate(&self, actor: &ActorProfile, action: &str, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Busy { remaining_ms, .. } => format!(
                "⛔ {} est immobilisé et ne peut pas agir ({} restantes).",
                actor.name,
                format_duration(Duration::from_millis(*remaining_ms))
            ),
            Outcome::Failure(failure) => format!(
                "❌ {} tente « {} » mais {}. Immobilisé pendant {}.",
                actor.name,
                action.trim(),
                failure_line(failure.severity),
                format_duration(Duration::from_millis(failure.immobilization_ms))
            ),
            Outcome::Success(success) => format!(
                "✅ {} {} : « {} » (précision {}).",
                actor.name,
                success_line(success.precision),
                action.trim(),
                success.precision.label()
            ),
        }
    }

    fn countdown(&self, subject: &ActorProfile, description: &str, window: Duration) -> String {
        format!(
            "⚔️ {} subit {} ! Vous avez {} pour réagir.",
            subject.name,
            description,
            format_duration(window)
        )
    }

    fn reminder(&self, subject: &ActorProfile, remaining: Duration) -> String {
        format!(
            "⏳ {}, plus que {} pour réagir !",
            subject.name,
            format_duration(remaining)
        )
    }

    fn timeout(&self, subject: &ActorProfile, damage: f64, immobilized_for: Duration) -> String {
        format!(
            "💥 {} n'a pas réagi à temps et encaisse {:.0} dégâts. Immobilisé pendant {}.",
            subject.name,
            damage,
            format_duration(immobilized_for)
        )
    }

    fn npc_reaction(&self, npc: &ActorProfile, reaction: &NpcReaction) -> String {
        let mut text = format!(
            "🤺 {} réagit : {} ({}% d'efficacité, {:.0} dégâts)",
            npc.name, reaction.label, reaction.effectiveness, reaction.damage
        );
        if reaction.lethal {
            text.push_str(" ☠️ Coup potentiellement mortel !");
        }
        text
    }

    fn counter(&self, defender: &ActorProfile, report: &CounterReport, damage: f64) -> String {
        if report.success {
            format!(
                "🔁 Contre-attaque de {} au timing {} : {:.0} dégâts (x{:.1}).",
                defender.name,
                report.timing.label(),
                damage,
                report.damage_multiplier
            )
        } else {
            format!(
                "🔁 Contre-attaque de {} manquée (timing {}).",
                defender.name,
                report.timing.label()
            )
        }
    }
}

/// Human duration: "2m 30s", "15s", "1h 5m"
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64().round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes, seconds) {
        (0, 0, s) => format!("{}s", s),
        (0, m, 0) => format!("{}m", m),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, 0, _) => format!("{}h", h),
        (h, m, _) => format!("{}h {}m", h, m),
    }
}

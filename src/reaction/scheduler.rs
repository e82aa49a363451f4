use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::npc::NpcAutoResponder;
use super::reminders::reminder_offsets;
use super::timer::{ReactionStatus, ReactionTimer};
use crate::combat::immobilization::Immobilizations;
use crate::core::config::ReactionConfig;
use crate::core::error::{CollaboratorError, CombatError, Result};
use crate::core::sync::lock;
use crate::core::types::{ActionId, ActorId, ActorKind, RoomId};
use crate::ports::Collaborators;
use crate::timer::TimerScheduler;

/// Resolved windows are kept this long so late answers get a proper "too late"
const RESOLVED_RETENTION: Duration = Duration::from_secs(300);

/// Cause recorded on a defender who let the window expire
pub const TIMEOUT_CAUSE: &str = "aucune réaction";

/// An incoming action the subject has to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub action_id: ActionId,
    pub subject: ActorId,
    pub attacker: Option<ActorId>,
    pub room: RoomId,
    pub description: String,
    /// Damage the subject takes without a reaction
    pub incoming_damage: f64,
}

impl ReactionRequest {
    pub fn new(subject: ActorId, room: RoomId, description: impl Into<String>) -> Self {
        Self {
            action_id: ActionId::new(),
            subject,
            attacker: None,
            room,
            description: description.into(),
            incoming_damage: 0.0,
        }
    }

    pub fn from_attacker(mut self, attacker: ActorId) -> Self {
        self.attacker = Some(attacker);
        self
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.incoming_damage = damage;
        self
    }
}

/// Answer to a defender's response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Accepted { elapsed_ms: u64, window_ms: u64 },
    /// The window was already closed, `status` says how
    TooLate { status: ReactionStatus },
}

impl Response {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Response::Accepted { .. })
    }
}

/// Runs reaction windows
#[derive(Clone)]
pub struct ReactionScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    config: ReactionConfig,
    scheduler: TimerScheduler,
    collaborators: Collaborators,
    immobilizations: Immobilizations,
    npc: NpcAutoResponder,
    reactions: Mutex<AHashMap<ActionId, Arc<ReactionTimer>>>,
}

impl ReactionScheduler {
    pub fn new(
        config: ReactionConfig,
        scheduler: TimerScheduler,
        collaborators: Collaborators,
        immobilizations: Immobilizations,
        npc: NpcAutoResponder,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                scheduler,
                collaborators,
                immobilizations,
                npc,
                reactions: Mutex::new(AHashMap::new()),
            }),
        }
    }

    /// Open a reaction window sized by the subject's rank
    pub fn start(&self, request: ReactionRequest) -> Result<Arc<ReactionTimer>> {
        let rank = self
            .inner
            .collaborators
            .store
            .rank(&request.subject)
            .map_err(CollaboratorError::into_lookup_error)?;
        self.start_with_window(request, rank.reaction_window())
    }

    /// Open a reaction window of an explicit length
    pub fn start_with_window(
        &self,
        request: ReactionRequest,
        window: Duration,
    ) -> Result<Arc<ReactionTimer>> {
        let inner = &self.inner;
        let subject = inner
            .collaborators
            .store
            .profile(&request.subject)
            .map_err(CollaboratorError::into_lookup_error)?;

        let reaction = Arc::new(ReactionTimer::new(
            request.action_id,
            subject,
            request.attacker,
            request.room,
            request.description,
            request.incoming_damage,
            window,
        ));

        {
            let mut reactions = lock(&inner.reactions);
            if reactions
                .get(&reaction.action_id)
                .map(|existing| existing.is_waiting())
                .unwrap_or(false)
            {
                return Err(CombatError::DuplicateAction(reaction.action_id));
            }
            prune(&mut reactions);
            reactions.insert(reaction.action_id, reaction.clone());
        }

        tracing::info!(
            "Reaction window {} opened for {} ({:?})",
            reaction.action_id,
            reaction.subject.id,
            window
        );
        let text = inner
            .collaborators
            .narrator
            .countdown(&reaction.subject, &reaction.description, window);
        inner.collaborators.notify(&reaction.room, &text);

        for offset in reminder_offsets(window, &inner.config) {
            let weak_inner = Arc::downgrade(&self.inner);
            let weak_reaction = Arc::downgrade(&reaction);
            let handle = inner.scheduler.schedule(offset, move || {
                remind(&weak_inner, &weak_reaction);
            });
            reaction.attach(handle);
        }

        let weak_inner = Arc::downgrade(&self.inner);
        let weak_reaction = Arc::downgrade(&reaction);
        let deadline = inner.scheduler.schedule(window, move || {
            if let (Some(inner), Some(reaction)) = (weak_inner.upgrade(), weak_reaction.upgrade()) {
                inner.expire(&reaction);
            }
        });
        reaction.attach(deadline);

        if reaction.subject.kind == ActorKind::NonPlayer {
            inner.npc.schedule(&reaction);
        }

        Ok(reaction)
    }

    /// Defender answers in time (or not)
    pub fn respond(&self, action_id: &ActionId) -> Result<Response> {
        let reaction = self.get(action_id).ok_or(CombatError::UnknownAction(*action_id))?;
        let elapsed = reaction.elapsed();
        if self.inner.finish(&reaction, ReactionStatus::Responded) {
            tracing::info!(
                "{} reacted to {} after {:?}",
                reaction.subject.id,
                action_id,
                elapsed
            );
            Ok(Response::Accepted {
                elapsed_ms: elapsed.as_millis() as u64,
                window_ms: reaction.window().as_millis() as u64,
            })
        } else {
            tracing::debug!("Late response to {} ({:?})", action_id, reaction.status());
            Ok(Response::TooLate {
                status: reaction.status(),
            })
        }
    }

    /// Close a window without consequences
    pub fn cancel(&self, action_id: &ActionId) -> Result<bool> {
        let reaction = self.get(action_id).ok_or(CombatError::UnknownAction(*action_id))?;
        let cancelled = self.inner.finish(&reaction, ReactionStatus::Cancelled);
        if cancelled {
            tracing::info!("Reaction window {} cancelled", action_id);
        }
        Ok(cancelled)
    }

    pub fn get(&self, action_id: &ActionId) -> Option<Arc<ReactionTimer>> {
        lock(&self.inner.reactions).get(action_id).cloned()
    }

    pub fn status(&self, action_id: &ActionId) -> Option<ReactionStatus> {
        self.get(action_id).map(|reaction| reaction.status())
    }

    /// The open window the actor must currently react to, if any
    pub fn pending_for(&self, subject: &ActorId) -> Option<ActionId> {
        lock(&self.inner.reactions)
            .values()
            .filter(|reaction| reaction.is_waiting() && &reaction.subject.id == subject)
            .min_by_key(|reaction| reaction.deadline)
            .map(|reaction| reaction.action_id)
    }

    pub fn npc(&self) -> &NpcAutoResponder {
        &self.inner.npc
    }
}

impl SchedulerInner {
    /// The single resolution path shared by every outcome
    fn finish(&self, reaction: &ReactionTimer, to: ReactionStatus) -> bool {
        if !reaction.resolve(to) {
            return false;
        }
        self.npc.forget(&reaction.action_id);
        true
    }

    fn expire(&self, reaction: &ReactionTimer) {
        if !self.finish(reaction, ReactionStatus::TimedOut) {
            return;
        }
        let subject = &reaction.subject;
        let severity = self.config.timeout_severity;
        tracing::info!(
            "{} let reaction window {} expire, takes {:.1} damage",
            subject.id,
            reaction.action_id,
            reaction.incoming_damage
        );

        self.collaborators.damage(&subject.id, reaction.incoming_damage);
        // A longer immobilization already running is kept as is
        let immobilized_for =
            match self.immobilizations.immobilize(&subject.id, severity, TIMEOUT_CAUSE) {
                Some(record) => record.remaining(),
                None => self.immobilizations.remaining(&subject.id),
            };
        let text = self
            .collaborators
            .narrator
            .timeout(subject, reaction.incoming_damage, immobilized_for);
        self.collaborators.notify(&reaction.room, &text);
    }
}

fn remind(inner: &Weak<SchedulerInner>, reaction: &Weak<ReactionTimer>) {
    let (Some(inner), Some(reaction)) = (inner.upgrade(), reaction.upgrade()) else {
        return;
    };
    if !reaction.is_waiting() {
        return;
    }
    let remaining = reaction.remaining();
    tracing::debug!("Reminder for {}: {:?} left", reaction.action_id, remaining);
    let text = inner.collaborators.narrator.reminder(&reaction.subject, remaining);
    inner.collaborators.notify(&reaction.room, &text);
}

fn prune(reactions: &mut AHashMap<ActionId, Arc<ReactionTimer>>) {
    let now = Instant::now();
    reactions.retain(|_, reaction| match reaction.resolved_at() {
        Some(at) => now.saturating_duration_since(at) < RESOLVED_RETENTION,
        None => true,
    });
}

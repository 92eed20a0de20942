//! Teleport command authorization and dispatch
//!
//! A teleport request names an actor, a target list, and a destination.
//! Dispatch runs in two phases:
//! 1. Synchronous gate: parse targets, resolve the destination, and run
//!    the permission check per target. Denials settle immediately.
//! 2. Asynchronous relocation: one task per approved target picks the
//!    arrival point (safe-spot search unless skipped) and moves the
//!    player, reporting through the target's ticket.
//!
//! Targets never affect each other: a denial, an offline name, or a
//! failed safety search on one target leaves the rest untouched.

pub mod targets;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::destination::{self, ResolvedDestination};
use crate::messaging::{Notice, NoticeQueue};
use crate::permissions::{Actor, PermissionChecker, PermissionResult};
use crate::players::PlayerRegistry;
use crate::safety::SafetySearch;
use crate::world::{Location, WorldManager};

pub use targets::parse_targets;

/// A teleport command to authorize and execute
#[derive(Debug, Clone)]
pub struct TeleportRequest {
    /// Who issued the command
    pub actor: Actor,
    /// Raw comma-separated target list; absent targets the actor
    pub targets: Option<String>,
    /// Raw destination string
    pub destination: String,
    /// Skip the safe-spot search (the `--unsafe` flag)
    pub skip_safety: bool,
}

impl TeleportRequest {
    /// A request moving the actor themself, safety search on
    pub fn new(actor: Actor, destination: impl Into<String>) -> Self {
        Self {
            actor,
            targets: None,
            destination: destination.into(),
            skip_safety: false,
        }
    }

    /// Set the raw target list
    pub fn targets(mut self, raw: impl Into<String>) -> Self {
        self.targets = Some(raw.into());
        self
    }

    /// Set whether the safe-spot search is skipped
    pub fn skip_safety(mut self, skip: bool) -> Self {
        self.skip_safety = skip;
        self
    }
}

/// Terminal outcome for a single target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result")]
pub enum TeleportResult {
    /// Target arrived at the location
    #[serde(rename = "relocated")]
    Relocated { location: Location },
    /// Actor lacked the required permission node
    #[serde(rename = "denied")]
    Denied,
    /// No safe arrival existed and the search was not skipped
    #[serde(rename = "no_safe_location")]
    NoSafeLocation,
    /// Target vanished mid-flight, or the relocation task was dropped
    #[serde(rename = "discarded")]
    Discarded,
}

/// Request-level outcome
///
/// Every dispatch is an accepted command; the disposition says whether
/// any per-target work was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition")]
pub enum Disposition {
    /// Tickets were issued for these targets, in scheduling order
    #[serde(rename = "scheduled")]
    Scheduled { targets: Vec<String> },
    /// The target list parsed to nothing; no work to do
    #[serde(rename = "no_targets")]
    NoTargets,
    /// The destination did not resolve; nobody was scheduled and the
    /// actor was notified
    #[serde(rename = "invalid_destination")]
    InvalidDestination,
}

/// Pending outcome for one scheduled target
#[derive(Debug)]
pub struct TeleportTicket {
    /// Target this ticket tracks
    pub target: String,
    rx: oneshot::Receiver<TeleportResult>,
}

impl TeleportTicket {
    /// Await the terminal result. A dropped relocation task reports
    /// [`TeleportResult::Discarded`].
    pub async fn outcome(self) -> TeleportResult {
        self.rx.await.unwrap_or(TeleportResult::Discarded)
    }
}

/// Outcome of dispatching one teleport request
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Correlation id carried in tracing fields
    pub request_id: Uuid,
    pub disposition: Disposition,
    /// One ticket per scheduled target, in scheduling order
    pub tickets: Vec<TeleportTicket>,
}

impl DispatchOutcome {
    /// Whether the command itself was accepted. Always true: a rejected
    /// destination or an empty target list is an accepted command that
    /// moves nobody.
    pub fn accepted(&self) -> bool {
        true
    }

    /// Await every ticket, each under `timeout`, returning
    /// `(target, result)` pairs in scheduling order. A ticket that
    /// cannot settle in time reports [`TeleportResult::Discarded`].
    pub async fn settle(self, timeout: Duration) -> Vec<(String, TeleportResult)> {
        let mut results = Vec::with_capacity(self.tickets.len());
        for ticket in self.tickets {
            let target = ticket.target.clone();
            let result = match tokio::time::timeout(timeout, ticket.outcome()).await {
                Ok(result) => result,
                Err(_) => TeleportResult::Discarded,
            };
            results.push((target, result));
        }
        results
    }
}

/// Teleport dispatcher
///
/// Reads the world registry and engine config, writes only player
/// locations and the notice queue.
pub struct Dispatcher {
    worlds: Arc<WorldManager>,
    players: Arc<PlayerRegistry>,
    safety: Arc<SafetySearch>,
    notices: Arc<NoticeQueue>,
    config: Arc<RwLock<EngineConfig>>,
}

impl Dispatcher {
    /// Create a dispatcher over shared engine state
    pub fn new(
        worlds: Arc<WorldManager>,
        players: Arc<PlayerRegistry>,
        safety: Arc<SafetySearch>,
        notices: Arc<NoticeQueue>,
        config: Arc<RwLock<EngineConfig>>,
    ) -> Self {
        Self {
            worlds,
            players,
            safety,
            notices,
            config,
        }
    }

    /// Dispatch a teleport request.
    ///
    /// Permission granularity and search bounds are snapshotted from
    /// the config once per request, so a runtime toggle never changes
    /// the rules of an in-flight dispatch.
    pub async fn dispatch(&self, request: TeleportRequest) -> DispatchOutcome {
        let request_id = Uuid::new_v4();
        let config = self.config.read().await.clone();
        let checker = PermissionChecker::new(config.finer_teleport_permissions);

        let targets = targets::parse_targets(request.targets.as_deref(), &request.actor.id);
        if targets.is_empty() {
            debug!(%request_id, actor = %request.actor.id, "Teleport request with empty target list");
            return DispatchOutcome {
                request_id,
                disposition: Disposition::NoTargets,
                tickets: Vec::new(),
            };
        }

        let dest = match destination::resolve(&request.destination, &self.worlds).await {
            Ok(dest) => dest,
            Err(err) => {
                warn!(
                    %request_id,
                    actor = %request.actor.id,
                    destination = %request.destination,
                    error = %err,
                    "Teleport destination rejected"
                );
                self.notices
                    .notify(
                        &request.actor.id,
                        Notice::InvalidDestination {
                            input: request.destination.clone(),
                        },
                    )
                    .await;
                return DispatchOutcome {
                    request_id,
                    disposition: Disposition::InvalidDestination,
                    tickets: Vec::new(),
                };
            }
        };

        let mut tickets = Vec::new();
        let mut scheduled = Vec::new();
        for target in targets {
            if !self.players.is_connected(&target).await {
                debug!(%request_id, target = %target, "Skipping unknown or offline target");
                continue;
            }

            let (tx, rx) = oneshot::channel();
            match checker.can_teleport(&request.actor, &target, &dest) {
                PermissionResult::Denied { node } => {
                    debug!(
                        %request_id,
                        actor = %request.actor.id,
                        target = %target,
                        node = %node,
                        "Teleport denied"
                    );
                    self.notices
                        .notify(
                            &request.actor.id,
                            Notice::PermissionDenied {
                                target: target.clone(),
                                node,
                            },
                        )
                        .await;
                    let _ = tx.send(TeleportResult::Denied);
                }
                PermissionResult::Allowed => {
                    self.notices
                        .notify(
                            &target,
                            Notice::Teleporting {
                                target: target.clone(),
                                destination: dest.describe(),
                            },
                        )
                        .await;
                    self.spawn_relocation(
                        request_id,
                        request.actor.id.clone(),
                        target.clone(),
                        dest.clone(),
                        request.skip_safety,
                        &config,
                        tx,
                    );
                }
            }
            tickets.push(TeleportTicket {
                target: target.clone(),
                rx,
            });
            scheduled.push(target);
        }

        info!(
            %request_id,
            actor = %request.actor.id,
            destination = %request.destination,
            scheduled = scheduled.len(),
            "Dispatched teleport request"
        );
        DispatchOutcome {
            request_id,
            disposition: Disposition::Scheduled { targets: scheduled },
            tickets,
        }
    }

    /// Spawn the relocation task for one approved target
    #[allow(clippy::too_many_arguments)]
    fn spawn_relocation(
        &self,
        request_id: Uuid,
        actor_id: String,
        target: String,
        dest: ResolvedDestination,
        skip_safety: bool,
        config: &EngineConfig,
        tx: oneshot::Sender<TeleportResult>,
    ) {
        let players = Arc::clone(&self.players);
        let safety = Arc::clone(&self.safety);
        let notices = Arc::clone(&self.notices);
        let radius = config.safety_search_radius;
        let height = config.safety_search_height;

        tokio::spawn(async move {
            let arrival = if skip_safety || !dest.adjust_safety() {
                Some(dest.location.clone())
            } else {
                safety.find_safe(&dest.location, radius, height).await
            };

            let result = match arrival {
                None => {
                    warn!(
                        %request_id,
                        target = %target,
                        world = %dest.world.name,
                        "No safe arrival found"
                    );
                    notices
                        .notify(
                            &actor_id,
                            Notice::NoSafeLocation {
                                target: target.clone(),
                                world: dest.world.name.clone(),
                            },
                        )
                        .await;
                    TeleportResult::NoSafeLocation
                }
                Some(location) => {
                    // set_location re-checks connectivity under the
                    // registry lock; a false return means the target
                    // disconnected after the permission gate
                    if players.set_location(&target, location.clone()).await {
                        debug!(%request_id, target = %target, location = %location, "Relocated target");
                        TeleportResult::Relocated { location }
                    } else {
                        debug!(%request_id, target = %target, "Target disconnected mid-flight");
                        TeleportResult::Discarded
                    }
                }
            };

            let _ = tx.send(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CreateWorldOptions;

    const SETTLE: Duration = Duration::from_secs(2);

    struct Fixture {
        dispatcher: Dispatcher,
        players: Arc<PlayerRegistry>,
        notices: Arc<NoticeQueue>,
        safety: Arc<SafetySearch>,
    }

    async fn fixture() -> Fixture {
        let worlds = WorldManager::shared(None);
        worlds
            .create_world(CreateWorldOptions::world_name("world"))
            .await
            .unwrap();
        worlds
            .create_world(CreateWorldOptions::world_name("otherworld").spawn_at(8.0, 70.0, 8.0))
            .await
            .unwrap();

        let players = PlayerRegistry::shared();
        players
            .connect("Player1", Location::new("world", 0.0, 64.0, 0.0))
            .await;
        players
            .connect("Player2", Location::new("world", 0.0, 64.0, 0.0))
            .await;

        let safety = SafetySearch::shared();
        let notices = NoticeQueue::shared();
        let config = Arc::new(RwLock::new(EngineConfig::default()));
        let dispatcher = Dispatcher::new(
            Arc::clone(&worlds),
            Arc::clone(&players),
            Arc::clone(&safety),
            Arc::clone(&notices),
            config,
        );

        Fixture {
            dispatcher,
            players,
            notices,
            safety,
        }
    }

    #[tokio::test]
    async fn test_console_moves_target_to_spawn() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "otherworld")
            .targets("Player1")
            .skip_safety(true);

        let outcome = fx.dispatcher.dispatch(request).await;
        assert!(outcome.accepted());
        assert_eq!(
            outcome.disposition,
            Disposition::Scheduled {
                targets: vec!["Player1".to_string()]
            }
        );

        let results = outcome.settle(SETTLE).await;
        assert_eq!(
            results,
            vec![(
                "Player1".to_string(),
                TeleportResult::Relocated {
                    location: Location::new("otherworld", 8.0, 70.0, 8.0)
                }
            )]
        );
        assert_eq!(
            fx.players.location("Player1").await.unwrap(),
            Location::new("otherworld", 8.0, 70.0, 8.0)
        );
    }

    #[tokio::test]
    async fn test_invalid_destination_moves_nobody() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "nowhere").targets("Player1,Player2");

        let outcome = fx.dispatcher.dispatch(request).await;
        assert!(outcome.accepted());
        assert_eq!(outcome.disposition, Disposition::InvalidDestination);
        assert!(outcome.tickets.is_empty());

        assert_eq!(
            fx.players.location("Player1").await.unwrap(),
            Location::new("world", 0.0, 64.0, 0.0)
        );
        let notices = fx.notices.drain_for(crate::permissions::CONSOLE_NAME).await;
        assert_eq!(
            notices,
            vec![Notice::InvalidDestination {
                input: "nowhere".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_denied_settles_immediately() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::player("Player1"), "otherworld");

        let outcome = fx.dispatcher.dispatch(request).await;
        let results = outcome.settle(SETTLE).await;
        assert_eq!(results, vec![("Player1".to_string(), TeleportResult::Denied)]);

        // Unmoved, and the actor heard about it
        assert_eq!(
            fx.players.location("Player1").await.unwrap(),
            Location::new("world", 0.0, 64.0, 0.0)
        );
        let notices = fx.notices.drain_for("Player1").await;
        assert_eq!(
            notices,
            vec![Notice::PermissionDenied {
                target: "Player1".to_string(),
                node: "multiverse.teleport.self.w.otherworld".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_separator_only_target_list_is_no_op() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "otherworld").targets(",,");

        let outcome = fx.dispatcher.dispatch(request).await;
        assert!(outcome.accepted());
        assert_eq!(outcome.disposition, Disposition::NoTargets);
        assert!(outcome.tickets.is_empty());
        assert!(fx.notices.is_empty().await);
    }

    #[tokio::test]
    async fn test_offline_target_skipped_silently() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "otherworld")
            .targets("benwoo1110,Player2")
            .skip_safety(true);

        let outcome = fx.dispatcher.dispatch(request).await;
        assert_eq!(
            outcome.disposition,
            Disposition::Scheduled {
                targets: vec!["Player2".to_string()]
            }
        );

        let results = outcome.settle(SETTLE).await;
        assert_eq!(results.len(), 1);
        assert_eq!(
            fx.players.location("Player2").await.unwrap(),
            Location::new("otherworld", 8.0, 70.0, 8.0)
        );
    }

    #[tokio::test]
    async fn test_duplicate_targets_move_once() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "otherworld")
            .targets("Player1,Player1")
            .skip_safety(true);

        let outcome = fx.dispatcher.dispatch(request).await;
        assert_eq!(outcome.tickets.len(), 1);
        let results = outcome.settle(SETTLE).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_teleporting_notice_precedes_move() {
        let fx = fixture().await;
        let request = TeleportRequest::new(Actor::console(), "otherworld")
            .targets("Player1")
            .skip_safety(true);

        let outcome = fx.dispatcher.dispatch(request).await;
        // Queued during the synchronous gate, before any relocation
        let notices = fx.notices.drain_for("Player1").await;
        assert_eq!(
            notices,
            vec![Notice::Teleporting {
                target: "Player1".to_string(),
                destination: "otherworld".to_string(),
            }]
        );
        outcome.settle(SETTLE).await;
    }

    #[tokio::test]
    async fn test_unsafe_spawn_reports_no_safe_location() {
        let fx = fixture().await;
        // Saturate the whole search volume around otherworld's spawn
        for dx in -3..=3 {
            for dz in -3..=3 {
                for dy in -3..=3 {
                    fx.safety
                        .mark_unsafe("otherworld", 8 + dx, 70 + dy, 8 + dz)
                        .await;
                }
            }
        }

        let request = TeleportRequest::new(Actor::console(), "otherworld").targets("Player1");
        let outcome = fx.dispatcher.dispatch(request).await;
        let results = outcome.settle(SETTLE).await;
        assert_eq!(
            results,
            vec![("Player1".to_string(), TeleportResult::NoSafeLocation)]
        );
        assert_eq!(
            fx.players.location("Player1").await.unwrap(),
            Location::new("world", 0.0, 64.0, 0.0)
        );
    }

    #[tokio::test]
    async fn test_skip_safety_bypasses_search() {
        let fx = fixture().await;
        fx.safety.mark_unsafe("otherworld", 8, 70, 8).await;

        let request = TeleportRequest::new(Actor::console(), "otherworld")
            .targets("Player1")
            .skip_safety(true);
        let outcome = fx.dispatcher.dispatch(request).await;
        let results = outcome.settle(SETTLE).await;
        assert_eq!(
            results,
            vec![(
                "Player1".to_string(),
                TeleportResult::Relocated {
                    location: Location::new("otherworld", 8.0, 70.0, 8.0)
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_dropped_task_reports_discarded() {
        let (tx, rx) = oneshot::channel::<TeleportResult>();
        drop(tx);
        let ticket = TeleportTicket {
            target: "Player1".to_string(),
            rx,
        };
        assert_eq!(ticket.outcome().await, TeleportResult::Discarded);
    }

    #[tokio::test]
    async fn test_settle_times_out_silent_ticket() {
        let (tx, rx) = oneshot::channel::<TeleportResult>();
        let outcome = DispatchOutcome {
            request_id: Uuid::new_v4(),
            disposition: Disposition::Scheduled {
                targets: vec!["Player1".to_string()],
            },
            tickets: vec![TeleportTicket {
                target: "Player1".to_string(),
                rx,
            }],
        };

        // The sender stays alive and silent, so only the timeout can
        // settle the ticket
        let results = outcome.settle(Duration::from_millis(20)).await;
        assert_eq!(
            results,
            vec![("Player1".to_string(), TeleportResult::Discarded)]
        );
        drop(tx);
    }
}

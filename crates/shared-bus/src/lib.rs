//! # Shared Bus - Event Bus for the V2X Pipeline
//!
//! Every pipeline stage publishes its results here; observers (metrics,
//! archivers, live views) subscribe with an [`EventFilter`].
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ vx-03 Track  │                    │   Metrics    │
//! │              │    publish()       │   Handler    │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Delivery is best-effort: events published while nobody listens are
//! dropped, and a subscriber that falls more than the channel capacity
//! behind skips the oldest events.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, V2xEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

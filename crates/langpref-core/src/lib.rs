//! # langpref Core
//!
//! Locale preference resolution and synchronization.
//!
//! ## Architecture
//!
//! ```text
//! langpref-core/src/
//! ├── ports.rs        # CookieJar / AddressReader / ClientLocale / Scheduler / SignalBus
//! ├── memory.rs       # In-memory port implementations
//! ├── scope.rs        # Cookie domain heuristics and cleanup candidates
//! ├── persistence.rs  # Cookie adapter and bound preference store
//! ├── resolution.rs   # Precedence chain (cookie → URL → client → default)
//! ├── reconcile.rs    # Duplicate-scope cleanup
//! ├── sync/           # Broadcast + polling subscriber
//! └── engine.rs       # Initial load and user-change orchestration
//! ```
//!
//! Everything runs on one thread. Shared state is `Rc`/`RefCell`, matching
//! the browser event loop the engine is embedded in.

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stdout,
        clippy::indexing_slicing
    )
)]

pub mod engine;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod ports;
pub mod reconcile;
pub mod resolution;
pub mod scope;
pub mod sync;

// Re-export commonly used types
pub use engine::{ChangeOutcome, EnginePorts, PreferenceEngine};
pub use error::{EngineError, EngineResult};
pub use persistence::{CookieAdapter, PreferenceStore, SetCookie};
pub use ports::{AddressReader, ClientLocale, CookieJar, ListenerId, ScheduledTask, Scheduler, SignalBus};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use resolution::{PreferenceResolver, Resolution};
pub use scope::{resolve_scope, ScopeResolver};
pub use sync::{HandlerId, LocaleSubscriber};

pub use langpref_types as types;

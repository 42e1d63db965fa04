//! # Axon Core
//!
//! The core layer of the Axon framework.
//!
//! This crate holds everything that does not depend on how modules and
//! listeners are organised:
//!
//! - **Containers**: the ordered, uniquely-keyed [`KeyedContainer`] every
//!   registry is built on
//! - **Event taxonomy**: [`EventName`], [`ScopeId`] and the raw [`Payload`]
//! - **Upstream contract**: [`EventSource`] with identity-comparable
//!   [`UpstreamHandler`]s, plus the in-process [`LocalEventSource`]
//! - **Library contract**: [`LibraryInterface`], which binds internal events
//!   to upstream names and [`ScopeResolver`]s
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐  "MESSAGE_CREATE"  ┌──────────────────┐  MessageCreate  ┌──────────────┐
//! │ EventSource  │───────────────────▶│ LibraryInterface │────────────────▶│ EventManager │
//! │  (upstream)  │                    │ (scope resolver) │   + ScopeId     │ (framework)  │
//! └──────────────┘                    └──────────────────┘                 └──────────────┘
//! ```

pub mod collection;
pub mod error;
pub mod event;
pub mod library;
pub mod message;
pub mod source;

pub use collection::KeyedContainer;
pub use error::{ContainerError, ContainerResult, LibraryError, LibraryResult};
pub use event::{EventName, Payload, ScopeId, UnknownEventName};
pub use library::{BoxedLibrary, EventBinding, LibraryInterface, LibraryType, ScopeResolver};
pub use message::{Author, Message, MessageEdit};
pub use source::{BoxedEventSource, EventSource, LocalEventSource, UpstreamHandler};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        EventName, EventSource, KeyedContainer, LibraryInterface, LibraryType, Message, Payload,
        ScopeId, UpstreamHandler,
    };
}

//! Shortcut-driven search launcher: shortcut detection, URL templating and
//! OpenSearch autodiscovery.

// Pratiques dangereuses ou non idiomatiques
#![deny(unsafe_code)] // Pas de code unsafe
#![deny(missing_docs)] // Tout élément public doit être documenté
#![deny(non_camel_case_types)]
#![deny(unused_must_use)] // Les Result et Option doivent être traités
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)] // Pas de unwrap() hors tests
#![deny(clippy::expect_used)] // Pas de expect() hors tests
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)] // Le journal passe par tracing
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(overflowing_literals)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::shadow_unrelated
    )
)]

/// Runtime configuration.
pub mod config;
/// Legacy character encodings for query values.
pub mod encoding;
/// Search engine model, registry and authoring helpers.
pub mod engines;
/// Error types.
pub mod error;
/// Search-term injection into URL templates.
pub mod injector;
/// Incremental shortcut detection.
pub mod matcher;
/// OpenSearch description autodiscovery.
#[allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]
pub mod opensearch;
/// Input line to final URL resolution.
pub mod resolve;
/// HTTP server and API routes.
#[allow(
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::unused_async
)]
pub mod server;
/// Entry helpers to start the service.
pub mod start;

pub use engines::{MAGIC_WORD, SearchEngine, TERMS_PLACEHOLDER};
pub use error::{DiscoveryError, InjectionError, RegistryError, ResolveError};

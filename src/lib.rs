//! # Folio
//!
//! Content logic for a design-studio portfolio: the project list shown on the
//! homepage, its split into case studies and selected works, and the partner
//! logo strip with its admin-controlled order.
//!
//! # Architecture: Catalog Under Remote
//!
//! Content comes from two places, merged on every load:
//!
//! ```text
//! catalog.toml (bundled)  ─┐
//!                          ├─ merge ─→ [remote newest-first, unshadowed catalog] ─→ filters
//! remote collection  ──────┘
//! ```
//!
//! The catalog guarantees the site always has something to show. Remote rows
//! are what the admin edits; a remote row whose `id` matches a catalog entry
//! replaces it. When the remote query fails the site quietly falls back to the
//! catalog alone.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Project`, `Partner`, `ProjectType`, `Direction` |
//! | [`remote`] | `RemoteCollection` and `ObjectStorage` traits, `Query`, `RemoteError` |
//! | [`store`] | `LocalStore`, a file-backed implementation of both traits |
//! | [`schema`] | Row normalization: legacy layout column names, record encode/decode |
//! | [`catalog`] | The bundled static projects and partners |
//! | [`merge`] | Remote-first merge with catalog fallback |
//! | [`filters`] | Case study / selected work classification with legacy positional rule |
//! | [`partners`] | Partner ordering: add, remove, single-step swap moves |
//! | [`projects`] | Project administration: save, delete, publish toggle, cover upload |
//! | [`naming`] | Content-addressed object keys for uploads |
//! | [`config`] | `folio.toml` loading and validation over stock defaults |
//! | [`output`] | CLI listing formatters |
//!
//! # Design Decisions
//!
//! ## Remote Behind a Trait
//!
//! Every board is generic over [`remote::RemoteCollection`] and
//! [`remote::ObjectStorage`]. The shipped [`store::LocalStore`] keeps tables in
//! a JSON snapshot and objects as plain files; a hosted backend slots in by
//! implementing the same two traits. Tests use `LocalStore` in memory with
//! injected faults rather than mocks.
//!
//! ## Legacy Positional Classification
//!
//! Rows written before the type column existed carry no type. The first few
//! published untyped entries (three by default) count as case studies, the rest
//! as selected works. See [`filters::Classifier`].
//!
//! ## Swap-Based Reordering
//!
//! Moving a partner swaps `sort_order` with its neighbor using concurrent
//! updates. Keys may have gaps; only their relative order matters. Tied keys
//! are raised just enough to make the list strictly increasing, so a move
//! always changes the visible order and leaves no duplicates behind.

pub mod catalog;
pub mod config;
pub mod filters;
pub mod merge;
pub mod naming;
pub mod output;
pub mod partners;
pub mod projects;
pub mod remote;
pub mod schema;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

//! MCP bridge between a file-synced Markdown note application and an AI agent.
//!
//! The note app periodically drops a zip archive of Markdown notes (with
//! YAML-like front matter) into a shared sync folder. notebridge extracts the
//! newest archive, reconciles each note against a SQLite index, and exposes
//! search/read/write tools over [MCP](https://modelcontextprotocol.io/).
//! Agent-side writes are staged as Markdown files in an import folder the
//! note app watches.
//!
//! # Architecture
//!
//! - **Index**: SQLite (notes table + scalar sync metadata), substring search
//!   scoped to user-granted notebooks
//! - **Sync**: newest-archive extraction into a scratch directory, per-file
//!   reconciliation with last-write-wins conflict policy, always producing a
//!   structured report
//! - **Triggers**: periodic schedule, export-directory watcher, and a manual
//!   tool — serialized through a single in-flight-cycle gate
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — TOML process config plus the persisted notebook-access JSON
//! - [`db`] — SQLite initialization, schema, and migrations
//! - [`notes`] — front-matter codec, note materializer, index store, to-do view
//! - [`sync`] — archive extractor, reconciliation engine, outbound writer

pub mod config;
pub mod db;
pub mod notes;
pub mod sync;

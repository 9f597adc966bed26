// Library root
// -----------
// This crate exposes the analysis form as a library; the binary (`main.rs`)
// wires configuration, logging and an HTTP transport around it.
//
// Module responsibilities:
// - `form`: the two input fields, the submission status and the
//   validation gate.
// - `api`: wire types for `POST /api/analyze`, the tagged failure type and
//   the `Transport` seam with its reqwest implementation.
// - `submit`: the submission controller (single-flight policy, stale
//   settlement protection, timeout and cancellation).
// - `project`: turns a settled outcome into the displayed message.
// - `config` / `logging`: ambient setup for the binary.
// - `ui`: the interactive terminal form.
pub mod api;
pub mod config;
pub mod form;
pub mod logging;
pub mod project;
pub mod submit;
pub mod ui;

//! # Workflows Module
//!
//! High-level entry points that run a complete primer design.
//!
//! ## Overview
//!
//! A workflow validates the settings, prepares the template, screens every
//! requested role, and assembles the best pairs, reporting progress along the way.
//! Callers that only need a one-off design use [`design::choose_primers`]; callers
//! that design many templates, or that supply their own scorer and repeat
//! libraries, build a [`design::PrimerEngine`] once and reuse it.
//!
//! ## Architecture
//!
//! - **Design Workflow** ([`design`]) - Single-template design and the batch runner.

pub mod design;

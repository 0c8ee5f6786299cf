//! Grid domain model.
//!
//! # Responsibility
//! - Define the fixed-size text grid and its snapshot encoding.
//! - Define transient selection state and display-only cell classification.
//!
//! # Invariants
//! - Grid shape is fixed per session.
//! - Nothing in this module performs I/O.

pub mod cell_class;
pub mod grid;
pub mod selection;

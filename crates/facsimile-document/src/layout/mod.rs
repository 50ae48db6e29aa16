// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry: output page sizes and scales derived from scan dimensions.

pub mod planner;

pub use planner::plan;

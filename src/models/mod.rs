// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card scene model and drag interaction.

pub mod drag;
pub mod scene;

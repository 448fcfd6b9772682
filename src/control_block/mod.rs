// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod inquiry;
pub mod mod_sense;
pub mod mode_select;

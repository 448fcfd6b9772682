// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod identity;
pub mod intent;
pub mod mode_page;
pub mod sense_data;
pub mod supported;

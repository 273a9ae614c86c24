// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod crawler;
pub mod fetch;
pub mod search;
pub mod settings;
pub mod version;

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod aggregate;
pub mod crawler;
pub mod credentials;
pub mod extractor;
pub mod fetcher;
pub mod frontier;
pub mod links;
pub mod logging;
pub mod orchestrator;
pub mod search;

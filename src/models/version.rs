// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub agent: String,
    pub version: String,
    pub credential_pool_size: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenService;
use crate::storage::Store;

/// Shared application state, cloned into every handler.
///
/// The store needs no outer lock: redb serializes write transactions
/// internally and read transactions see a consistent snapshot.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: Arc<Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use std::collections::{HashSet, VecDeque};

/// Breadth-first queue of `(url, depth)` plus the visited set for one site.
/// A URL is queued at most once while pending, and never after it was visited.
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    queue: VecDeque<(String, usize)>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl CrawlFrontier {
    pub fn new(start_url: &str) -> Self {
        let mut frontier = Self::default();
        frontier.push(start_url, 0);
        frontier
    }

    /// Enqueue unless already visited or pending. Returns whether it was added.
    pub fn push(&mut self, url: &str, depth: usize) -> bool {
        if self.visited.contains(url) || self.queued.contains(url) {
            return false;
        }
        self.queued.insert(url.to_string());
        self.queue.push_back((url.to_string(), depth));
        true
    }

    pub fn pop(&mut self) -> Option<(String, usize)> {
        let (url, depth) = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some((url, depth))
    }

    /// Mark as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Visited plus pending, the quantity the soft growth cap bounds
    pub fn footprint(&self) -> usize {
        self.visited.len() + self.queue.len()
    }
}

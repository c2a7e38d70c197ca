//! Allocation of invocation contexts.
//!
//! Contexts are allocated through a [`ContextAllocator`] so that every
//! allocation is accounted for and allocation failure can be injected.
//! An allocation is represented by a [`Lease`]; dropping the lease returns
//! it to the allocator's books.

use crate::error::{GuardError, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The allocations made before a guarded region is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocSite {
    /// The invocation context itself.
    Context,
    /// The recovery point stored in the context.
    RecoveryPoint,
}

impl fmt::Display for AllocSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocSite::Context => f.write_str("invocation context"),
            AllocSite::RecoveryPoint => f.write_str("recovery point"),
        }
    }
}

/// Source of context allocations.
pub trait ContextAllocator {
    /// Reserve `size` bytes for `site`.
    ///
    /// Fails with [`GuardError::ResourceExhausted`].
    fn allocate(&self, site: AllocSite, size: usize) -> Result<Lease<'_>>;
}

/// Allocation counters.
#[derive(Debug, Default)]
pub struct AllocStats {
    outstanding: AtomicUsize,
    bytes: AtomicUsize,
    total: AtomicUsize,
}

impl AllocStats {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Leases currently alive.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Bytes held by live leases.
    pub fn bytes(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Leases ever handed out.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// A live allocation. Released on drop.
#[must_use]
#[derive(Debug)]
pub struct Lease<'a> {
    stats: &'a AllocStats,
    site: AllocSite,
    size: usize,
}

impl<'a> Lease<'a> {
    /// Record a new allocation against `stats`.
    pub fn new(stats: &'a AllocStats, site: AllocSite, size: usize) -> Self {
        stats.outstanding.fetch_add(1, Ordering::Relaxed);
        stats.bytes.fetch_add(size, Ordering::Relaxed);
        stats.total.fetch_add(1, Ordering::Relaxed);
        Self { stats, site, size }
    }

    /// What this lease was allocated for.
    pub fn site(&self) -> AllocSite {
        self.site
    }

    /// Size of the allocation in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.stats.outstanding.fetch_sub(1, Ordering::Relaxed);
        self.stats.bytes.fetch_sub(self.size, Ordering::Relaxed);
    }
}

/// Allocator that never fails and keeps count of what it hands out.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    stats: AllocStats,
}

static GLOBAL: TrackingAllocator = TrackingAllocator::new();

impl TrackingAllocator {
    pub const fn new() -> Self {
        Self {
            stats: AllocStats::new(),
        }
    }

    /// Process-wide allocator used by [`run_guarded`](crate::run_guarded).
    pub fn global() -> &'static TrackingAllocator {
        &GLOBAL
    }

    pub fn stats(&self) -> &AllocStats {
        &self.stats
    }
}

impl ContextAllocator for TrackingAllocator {
    fn allocate(&self, site: AllocSite, size: usize) -> Result<Lease<'_>> {
        Ok(Lease::new(&self.stats, site, size))
    }
}

/// Allocator that fails every allocation for one site.
///
/// Other sites are served by an inner [`TrackingAllocator`].
#[derive(Debug)]
pub struct FailingAllocator {
    fail_at: AllocSite,
    inner: TrackingAllocator,
    attempts: AtomicUsize,
}

impl FailingAllocator {
    pub fn new(fail_at: AllocSite) -> Self {
        Self {
            fail_at,
            inner: TrackingAllocator::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Allocations attempted, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Counters of the allocations that succeeded.
    pub fn stats(&self) -> &AllocStats {
        self.inner.stats()
    }
}

impl ContextAllocator for FailingAllocator {
    fn allocate(&self, site: AllocSite, size: usize) -> Result<Lease<'_>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if site == self.fail_at {
            tracing::debug!(%site, size, "injected allocation failure");
            return Err(GuardError::ResourceExhausted(site));
        }
        self.inner.allocate(site, size)
    }
}

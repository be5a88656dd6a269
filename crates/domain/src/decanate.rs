// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-career queue of requests awaiting resolution.
//!
//! ## Invariants
//!
//! - Only requests of the decanate's career are admitted
//! - Requests are kept in admission order (FIFO)
//! - `pending[i].priority() == Some(i + 1)` after every operation
//! - Removing a request never reorders the survivors, it only closes the gap

use crate::error::DomainError;
use crate::request::{Request, RequestStatus};
use crate::types::{CareerId, RequestId};
use time::OffsetDateTime;

/// A request the decanate refused to admit, handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refused {
    /// Why the request was refused.
    pub error: DomainError,
    /// The request, exactly as it was passed in.
    pub request: Request,
}

impl std::fmt::Display for Refused {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request {} refused: {}", self.request.id(), self.error)
    }
}

impl std::error::Error for Refused {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The administrative unit resolving the requests of one career.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decanate {
    career: CareerId,
    pending: Vec<Request>,
    limit: Option<usize>,
}

impl Decanate {
    /// Creates a decanate with an unbounded queue.
    #[must_use]
    pub const fn new(career: CareerId) -> Self {
        Self {
            career,
            pending: Vec::new(),
            limit: None,
        }
    }

    /// Creates a decanate that holds at most `limit` pending requests.
    #[must_use]
    pub const fn with_limit(career: CareerId, limit: Option<usize>) -> Self {
        Self {
            career,
            pending: Vec::new(),
            limit,
        }
    }

    #[must_use]
    pub const fn career(&self) -> &CareerId {
        &self.career
    }

    /// Returns the pending requests in priority order.
    #[must_use]
    pub fn pending_requests(&self) -> &[Request] {
        &self.pending
    }

    #[must_use]
    pub fn get(&self, request: RequestId) -> Option<&Request> {
        self.pending.iter().find(|r| r.id() == request)
    }

    /// Returns whether `receive` would admit the request.
    #[must_use]
    pub fn can_receive(&self, request: &Request) -> bool {
        self.check_receive(request).is_ok()
    }

    /// Admits a pending request at the tail of the queue and starts its review.
    ///
    /// Returns a copy of the admitted request.
    ///
    /// # Errors
    ///
    /// Returns the request together with the reason if:
    /// - The request belongs to another career
    /// - The request is not pending
    /// - The queue reached its configured bound
    pub fn receive(
        &mut self,
        mut request: Request,
        comment: &str,
        at: OffsetDateTime,
    ) -> Result<Request, Box<Refused>> {
        if let Err(error) = self.check_receive(&request) {
            return Err(Box::new(Refused { error, request }));
        }
        let Some(priority) = self.next_priority() else {
            let error: DomainError = DomainError::DecanateFull {
                career: self.career.clone(),
                limit: self.pending.len(),
            };
            return Err(Box::new(Refused { error, request }));
        };
        if let Err(error) = request.review(comment, at) {
            return Err(Box::new(Refused { error, request }));
        }
        request.set_priority(Some(priority));
        self.pending.push(request.clone());
        Ok(request)
    }

    /// Approves a request under review and removes it from the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is not pending here, or if its state
    /// machine rejects the approval. The queue is unchanged on error.
    pub fn approve(
        &mut self,
        request: RequestId,
        comment: &str,
        at: OffsetDateTime,
    ) -> Result<Request, DomainError> {
        self.resolve(request, |r| r.approve(comment, at))
    }

    /// Rejects a request under review and removes it from the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is not pending here, or if its state
    /// machine rejects the rejection. The queue is unchanged on error.
    pub fn reject(
        &mut self,
        request: RequestId,
        comment: &str,
        at: OffsetDateTime,
    ) -> Result<Request, DomainError> {
        self.resolve(request, |r| r.reject(comment, at))
    }

    fn check_receive(&self, request: &Request) -> Result<(), DomainError> {
        if request.career() != &self.career {
            return Err(DomainError::WrongCareer {
                expected: self.career.clone(),
                actual: request.career().clone(),
            });
        }
        if request.status() != RequestStatus::Pending {
            return Err(DomainError::InvalidTransition {
                entity: format!("request {}", request.id()),
                from: request.status().as_str(),
                operation: "receive",
                reason: "only pending requests can be received",
            });
        }
        if let Some(limit) = self.limit {
            if self.pending.len() >= limit {
                return Err(DomainError::DecanateFull {
                    career: self.career.clone(),
                    limit,
                });
            }
        }
        Ok(())
    }

    fn resolve<F>(&mut self, request: RequestId, transition: F) -> Result<Request, DomainError>
    where
        F: FnOnce(&mut Request) -> Result<(), DomainError>,
    {
        let index: usize = self
            .pending
            .iter()
            .position(|r| r.id() == request)
            .ok_or(DomainError::RequestNotFound(request))?;
        transition(&mut self.pending[index])?;
        let mut resolved: Request = self.pending.remove(index);
        resolved.set_priority(None);
        self.renumber();
        Ok(resolved)
    }

    /// The priority of the next admitted request, if one still fits in `u32`.
    fn next_priority(&self) -> Option<u32> {
        u32::try_from(self.pending.len())
            .ok()
            .and_then(|len| len.checked_add(1))
    }

    fn renumber(&mut self) {
        for (position, request) in (1_u32..).zip(self.pending.iter_mut()) {
            request.set_priority(Some(position));
        }
    }
}

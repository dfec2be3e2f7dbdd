use tokio::sync::OwnedSemaphorePermit;

/// A held set of permits across the rate-limit dimensions plus the
/// concurrency bulkhead slot. Dropping it releases the concurrency slot.
///
/// The token-bucket dimensions have nothing to release on a successful
/// reservation: once every dimension is acquired, the estimated cost stands
/// even if the call later turns out cheaper (spec §4.4 — actual-vs-estimated
/// is never credited back). A reservation that fails partway through
/// acquisition is a different story: [`crate::Limiter::reserve`] credits
/// back whatever earlier dimensions it already took before returning the
/// error, so a rejected reservation never leaves tokens stranded.
pub struct Reservation {
    pub(crate) _concurrent_permit: OwnedSemaphorePermit,
}

impl Reservation {
    /// Explicit release, for callers that want to free the concurrency slot
    /// before the reservation would otherwise go out of scope. Equivalent to
    /// `drop(reservation)`.
    pub fn release(self) {
        drop(self);
    }
}

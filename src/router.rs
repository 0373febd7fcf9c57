//! The Tausch homomorphic routing engine.
//!
//! Each subscriber publishes an encrypted routing vector (a "subscription":
//! one selector ciphertext per participant, including itself); the router
//! combines queued per-round messages with these selectors via the
//! ciphertext homomorphisms in [`crate::dj::ciphertext`] without ever
//! learning the routing. Callbacks are dispatched only after the lock has
//! been released, so a callback may re-enter the router; and
//! `route_messages`'s per-recipient accumulator starts at the ciphertext
//! multiplicative identity (`c = 1`), never a raw integer `0`, since the
//! ciphertext homomorphisms have no additive-identity shortcut.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use num_bigint_dig::BigUint;
use parking_lot::ReentrantMutex;

use crate::codec;
use crate::dj::ciphertext::Ciphertext;
use crate::error::{Error, RouterError};
use crate::keccak::sponge::KeccakSponge;

/// A stable, cheap-to-hash identifier for a subscriber: the Keccak-256
/// digest (SHA-3-256 sponge parameters, `pad10*1` padding) of the public
/// modulus `n`'s little-endian byte encoding. Avoids repeatedly hashing a
/// large [`BigUint`] as a `HashMap` key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId([u8; 32]);

impl KeyId {
    /// Derives the identifier for public modulus `n`.
    pub fn of(n: &BigUint) -> Self {
        let mut sponge = KeccakSponge::sha3_256();
        sponge
            .absorb(&codec::int_to_bytes_unsized(n))
            .expect("a fresh sponge has not begun squeezing");
        let digest = sponge.squeeze(32);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        KeyId(bytes)
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "…)")
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// The event delivered to a router callback: a user joined or left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterEvent {
    /// A user was added via [`TauschRouter::add_user`].
    Add,
    /// A user was removed via [`TauschRouter::del_user`].
    Del,
}

/// A subscriber's membership-change callback. Returns `Err` to signal the
/// callback itself failed; this does not roll back router state (which is
/// already committed by the time callbacks run) but is aggregated into
/// [`crate::error::Error::CallbackFailures`].
pub type Callback = Arc<dyn Fn(RouterEvent, KeyId) -> Result<(), String> + Send + Sync>;

struct RouterInner {
    table: HashMap<KeyId, HashMap<KeyId, Ciphertext>>,
    queue: HashMap<KeyId, BigUint>,
    callbacks: HashMap<KeyId, Callback>,
}

/// The homomorphic routing engine. Safe to share across threads; every
/// operation but callback dispatch takes the internal reentrant lock. A
/// callback may re-enter the router (e.g. to call
/// [`Self::update_subscription`] on itself) because dispatch always runs
/// after the lock guard for the triggering operation has been dropped.
pub struct TauschRouter {
    inner: ReentrantMutex<RefCell<RouterInner>>,
}

impl Default for TauschRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl TauschRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        TauschRouter {
            inner: ReentrantMutex::new(RefCell::new(RouterInner {
                table: HashMap::new(),
                queue: HashMap::new(),
                callbacks: HashMap::new(),
            })),
        }
    }

    /// The set of currently registered subscriber identities.
    pub fn users(&self) -> HashSet<KeyId> {
        let guard = self.inner.lock();
        guard.borrow().table.keys().copied().collect()
    }

    /// Registers `user` with a membership-change `callback`. Fails with
    /// [`RouterError::DuplicateUser`] if already present. After the state
    /// change is committed and the lock released, every registered
    /// callback (including the new one) is invoked with `(Add, user)`.
    pub fn add_user<F>(&self, user: KeyId, callback: F) -> Result<(), Error>
    where
        F: Fn(RouterEvent, KeyId) -> Result<(), String> + Send + Sync + 'static,
    {
        let callbacks = {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            if inner.table.contains_key(&user) {
                return Err(RouterError::DuplicateUser.into());
            }
            inner.table.insert(user, HashMap::new());
            inner.callbacks.insert(user, Arc::new(callback));
            inner.callbacks.clone()
        };
        tracing::debug!(user = %user, "router: user added");
        dispatch(&callbacks, RouterEvent::Add, user)
    }

    /// Removes `user`, along with any selector it holds in other
    /// subscriptions and any message it has queued this round. Fails with
    /// [`RouterError::UnknownUser`] if absent. Remaining callbacks are
    /// invoked with `(Del, user)` after the lock is released.
    pub fn del_user(&self, user: KeyId) -> Result<(), Error> {
        let callbacks = {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            if !inner.table.contains_key(&user) {
                return Err(RouterError::UnknownUser.into());
            }
            inner.table.remove(&user);
            inner.callbacks.remove(&user);
            inner.queue.remove(&user);
            for subscription in inner.table.values_mut() {
                subscription.remove(&user);
            }
            inner.callbacks.clone()
        };
        tracing::debug!(user = %user, "router: user removed");
        dispatch(&callbacks, RouterEvent::Del, user)
    }

    /// Replaces `user`'s subscription. `subscription` must select exactly
    /// the router's current users, and every selector ciphertext in it must
    /// belong to `user_n` (the subscriber's own modulus) and share a common
    /// ciphertext modulus `m`. Fails with [`RouterError::UnknownUser`] or
    /// [`RouterError::TypeMismatch`].
    pub fn update_subscription(
        &self,
        user: KeyId,
        user_n: &BigUint,
        subscription: HashMap<KeyId, Ciphertext>,
    ) -> Result<(), RouterError> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        if !inner.table.contains_key(&user) {
            return Err(RouterError::UnknownUser);
        }
        check_subscription(&inner.table, user_n, &subscription)?;
        inner.table.insert(user, subscription);
        Ok(())
    }

    /// Queues `message` for `user` in the current round. Fails with
    /// [`RouterError::UnknownUser`] if `user` isn't registered, or
    /// [`RouterError::DuplicateQueued`] if it already queued this round.
    /// Returns `true` iff every registered user has now queued.
    pub fn queue_message(&self, user: KeyId, message: BigUint) -> Result<bool, RouterError> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        if !inner.table.contains_key(&user) {
            return Err(RouterError::UnknownUser);
        }
        if inner.queue.contains_key(&user) {
            return Err(RouterError::DuplicateQueued);
        }
        inner.queue.insert(user, message);
        Ok(inner.queue.len() == inner.table.len())
    }

    /// Combines this round's queued messages with every subscriber's
    /// selectors: `out[R] = sum_S table[R][S] * queue[S]`, computed via the
    /// ciphertext homomorphisms with the identity ciphertext as the fold
    /// seed. Requires every user to have queued; fails with
    /// [`RouterError::IncompleteQueue`] otherwise, or
    /// [`RouterError::TypeMismatch`] if the routing table is inconsistent.
    /// Clears the queue on success.
    pub fn route_messages(&self) -> Result<HashMap<KeyId, Ciphertext>, Error> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        check_consistency(&inner.table, &inner.callbacks)?;
        if inner.queue.len() != inner.table.len() {
            return Err(RouterError::IncompleteQueue.into());
        }

        let mut out = HashMap::with_capacity(inner.table.len());
        for (recipient, subscription) in inner.table.iter() {
            let m = subscription
                .values()
                .next()
                .map(|ct| ct.m().clone())
                .ok_or(RouterError::TypeMismatch)?;
            let mut acc = Ciphertext::identity(m);
            for (sender, selector) in subscription.iter() {
                let message = inner
                    .queue
                    .get(sender)
                    .expect("queue completeness was just checked");
                let term = Ciphertext::new_raw(selector.c().clone(), selector.m().clone())
                    .scalar_mul(message);
                acc = acc
                    .checked_add(&term)
                    .map_err(crate::error::Error::Dj)?;
            }
            out.insert(*recipient, acc);
        }
        inner.queue.clear();
        tracing::trace!(recipients = out.len(), "router: routed one round");
        Ok(out)
    }
}

fn check_subscription(
    table: &HashMap<KeyId, HashMap<KeyId, Ciphertext>>,
    user_n: &BigUint,
    subscription: &HashMap<KeyId, Ciphertext>,
) -> Result<(), RouterError> {
    let table_keys: HashSet<KeyId> = table.keys().copied().collect();
    let sub_keys: HashSet<KeyId> = subscription.keys().copied().collect();
    if table_keys != sub_keys {
        return Err(RouterError::TypeMismatch);
    }
    let mut shared_m: Option<&BigUint> = None;
    for ciphertext in subscription.values() {
        if ciphertext.derive_s(user_n).is_err() {
            return Err(RouterError::TypeMismatch);
        }
        match shared_m {
            None => shared_m = Some(ciphertext.m()),
            Some(m) if m != ciphertext.m() => return Err(RouterError::TypeMismatch),
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_consistency(
    table: &HashMap<KeyId, HashMap<KeyId, Ciphertext>>,
    callbacks: &HashMap<KeyId, Callback>,
) -> Result<(), RouterError> {
    let table_keys: HashSet<KeyId> = table.keys().copied().collect();
    for subscription in table.values() {
        let sub_keys: HashSet<KeyId> = subscription.keys().copied().collect();
        if sub_keys != table_keys {
            return Err(RouterError::TypeMismatch);
        }
    }
    let callback_keys: HashSet<KeyId> = callbacks.keys().copied().collect();
    if callback_keys != table_keys {
        return Err(RouterError::TypeMismatch);
    }
    Ok(())
}

fn dispatch(callbacks: &HashMap<KeyId, Callback>, event: RouterEvent, subject: KeyId) -> Result<(), Error> {
    let mut failures = Vec::new();
    for (subscriber, callback) in callbacks.iter() {
        if let Err(reason) = callback(event, subject) {
            failures.push((*subscriber, reason));
        }
    }
    if !failures.is_empty() {
        return Err(Error::CallbackFailures(failures));
    }
    Ok(())
}

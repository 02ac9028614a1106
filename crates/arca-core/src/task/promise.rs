// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A minimal single-assignment promise with synchronous continuations.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Continuation<T> = Box<dyn FnOnce(&T)>;

/// Specifies the state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The promise is in-flight.
    Pending,
    /// The promise carries its value.
    Resolved,
}

struct Shared<T> {
    value: Option<T>,
    continuations: Vec<Continuation<T>>,
}

/// A single-assignment asynchronous value.
///
/// A promise starts pending and is resolved exactly once. Continuations
/// registered while pending fire synchronously inside [`Promise::resolve`],
/// in registration order; continuations registered afterwards fire
/// immediately. There is no rejected state: failures travel as a
/// "null-equivalent" payload (`None`, or `Default::default()`), so a chain
/// always runs to completion.
///
/// Cloning a `Promise` yields another reference to the same value.
pub struct Promise<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("Promise")
            .field("resolved", &shared.value.is_some())
            .field("continuations", &shared.continuations.len())
            .finish()
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Creates a pending promise.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                value: None,
                continuations: Vec::new(),
            })),
        }
    }

    /// Creates a promise that is already resolved with `value`.
    pub fn resolved(value: T) -> Self {
        let promise = Self::new();
        promise.shared.borrow_mut().value = Some(value);
        promise
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        if self.shared.borrow().value.is_some() {
            PromiseState::Resolved
        } else {
            PromiseState::Pending
        }
    }

    /// Returns `true` once the promise carries its value.
    pub fn is_resolved(&self) -> bool {
        self.state() == PromiseState::Resolved
    }

    /// Returns a copy of the value, if resolved.
    pub fn value(&self) -> Option<T> {
        self.shared.borrow().value.clone()
    }

    /// Returns `true` if both promises share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Resolves the promise and runs every registered continuation.
    ///
    /// A second resolution is logged and ignored; the first value stands.
    pub fn resolve(&self, value: T) {
        let continuations = {
            let mut shared = self.shared.borrow_mut();
            if shared.value.is_some() {
                log::warn!("Attempted to resolve a promise that is already resolved; ignoring.");
                return;
            }
            shared.value = Some(value.clone());
            std::mem::take(&mut shared.continuations)
        };

        for continuation in continuations {
            continuation(&value);
        }
    }

    /// Runs `on_resolved` with the value once it is available.
    ///
    /// If the promise is already resolved, `on_resolved` runs immediately and
    /// `self` is returned. Otherwise the returned promise resolves with the
    /// same value right after `on_resolved` completes.
    pub fn then<F>(&self, on_resolved: F) -> Promise<T>
    where
        F: FnOnce(&T) + 'static,
    {
        if let Some(value) = self.value() {
            on_resolved(&value);
            return self.clone();
        }

        let next = Promise::new();
        let chained = next.clone();
        self.push(Box::new(move |value: &T| {
            on_resolved(value);
            chained.resolve(value.clone());
        }));
        next
    }

    /// Chains an asynchronous step, flattening the promise it returns.
    ///
    /// `on_resolved` must hand back the promise of its own work. Returning
    /// `None` breaks that contract: it is logged and replaced by a promise
    /// already resolved with `U::default()`, so the chain still completes.
    pub fn continue_with<U, F>(&self, on_resolved: F) -> Promise<U>
    where
        U: Clone + Default + 'static,
        F: FnOnce(T) -> Option<Promise<U>> + 'static,
    {
        if let Some(value) = self.value() {
            return or_empty(on_resolved(value));
        }

        let next = Promise::new();
        let chained = next.clone();
        self.push(Box::new(move |value: &T| {
            or_empty(on_resolved(value.clone())).then(move |inner| chained.resolve(inner.clone()));
        }));
        next
    }

    /// Resolves once every input has resolved, with their values in input order.
    ///
    /// Inputs that share state (clones of one promise) are counted once, so
    /// the result holds one value per distinct promise. An empty input
    /// resolves immediately.
    pub fn all(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Vec<T>> {
        let mut distinct: Vec<Promise<T>> = Vec::new();
        for promise in promises {
            if !distinct.iter().any(|seen| seen.ptr_eq(&promise)) {
                distinct.push(promise);
            }
        }

        if distinct.is_empty() {
            return Promise::resolved(Vec::new());
        }

        let result = Promise::new();
        let remaining = Rc::new(Cell::new(distinct.len()));
        let members = Rc::new(distinct);

        for member in members.iter() {
            let result = result.clone();
            let remaining = remaining.clone();
            let members = members.clone();
            member.then(move |_| {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    result.resolve(members.iter().filter_map(Promise::value).collect());
                }
            });
        }

        result
    }

    fn push(&self, continuation: Continuation<T>) {
        self.shared.borrow_mut().continuations.push(continuation);
    }
}

fn or_empty<U: Clone + Default + 'static>(returned: Option<Promise<U>>) -> Promise<U> {
    returned.unwrap_or_else(|| {
        log::error!(
            "continue_with callback returned no promise; substituting an empty resolved promise"
        );
        Promise::resolved(U::default())
    })
}

//! The deferred-value container.
//!
//! A [`Promise`] starts pending and settles exactly once, to a value or a
//! reason. Settlement is requested through a [`Resolver`] and always lands
//! on a later scheduler turn; reactions registered with
//! [`then`](Promise::then) and friends are likewise delivered on a later
//! turn, in registration order.
//!
//! ```
//! use promissory::{LocalRuntime, Promise};
//!
//! let rt = LocalRuntime::default();
//! let p: Promise<i32, String> = rt.promise(|resolver| {
//!     resolver.resolve(20);
//!     Ok(())
//! });
//! let doubled = p.then(|v| Ok(v * 2)).catch(|_| Ok(0));
//! assert_eq!(rt.block_on(&doubled).unwrap(), Ok(40));
//! ```
//!
//! - [`container`]: settlement state machine and reaction dispatch
//! - [`chain`]: derived containers (`then`, `catch`, `finally`, ...)

pub mod chain;
pub mod container;

pub use self::container::{Promise, Resolution, Resolver};

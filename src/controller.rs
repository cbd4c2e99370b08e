//! # Controller Module
//!
//! Controllers declare which HTTP methods they serve by implementing the verb
//! traits ([`Get`], [`Post`], [`Put`], [`Delete`], [`Options`]) and exposing
//! them through [`Controller`]. Registration inspects those capabilities,
//! most specific combination first, and asks the controller to configure one
//! [`RouteDescriptor`] per supported verb.
//!
//! ```rust
//! use ctlroute::controller::{Controller, Get, Verb, supported_verbs};
//! use ctlroute::dispatcher::HandlerResponse;
//! use ctlroute::route::RouteDescriptor;
//!
//! struct Status;
//!
//! impl Get for Status {
//!     fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
//!         route.set_handler(|_| Ok(HandlerResponse::text(200, "up")))
//!     }
//! }
//!
//! impl Controller for Status {
//!     fn as_get(&self) -> Option<&dyn Get> {
//!         Some(self)
//!     }
//! }
//!
//! assert_eq!(supported_verbs(&Status), [Verb::Get]);
//! ```

use crate::route::RouteDescriptor;
use http::Method;
use std::fmt;

/// Serves GET
pub trait Get {
    fn get(&self, route: RouteDescriptor) -> RouteDescriptor;
}

/// Serves POST
pub trait Post {
    fn post(&self, route: RouteDescriptor) -> RouteDescriptor;
}

/// Serves PUT
pub trait Put {
    fn put(&self, route: RouteDescriptor) -> RouteDescriptor;
}

/// Serves DELETE
pub trait Delete {
    fn delete(&self, route: RouteDescriptor) -> RouteDescriptor;
}

/// Serves OPTIONS; only honoured on controllers that also serve full REST
pub trait Options {
    fn options(&self, route: RouteDescriptor) -> RouteDescriptor;
}

/// A registrable controller
///
/// Each `as_*` accessor exposes one verb capability; the defaults expose none,
/// so a controller overrides exactly the verbs it implements.
pub trait Controller {
    /// Logical location, e.g. `my_app::controllers::api::v1` or
    /// `controllers/api/v1`; only the part after `controllers` is used.
    ///
    /// A location with no `controllers` segment is used whole, so
    /// `shop::api` yields `/shop/api/<name>`. Return `""` (the default) for a
    /// bare `/<name>` path.
    fn namespace(&self) -> &str {
        ""
    }

    fn as_get(&self) -> Option<&dyn Get> {
        None
    }

    fn as_post(&self) -> Option<&dyn Post> {
        None
    }

    fn as_put(&self) -> Option<&dyn Put> {
        None
    }

    fn as_delete(&self) -> Option<&dyn Delete> {
        None
    }

    fn as_options(&self) -> Option<&dyn Options> {
        None
    }
}

/// HTTP verbs a controller can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl Verb {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
            Verb::Options => Method::OPTIONS,
        }
    }

    /// Let `controller` configure `route` for this verb
    ///
    /// Returns `None` when the controller lacks the capability.
    #[must_use]
    pub fn configure(
        self,
        controller: &dyn Controller,
        route: RouteDescriptor,
    ) -> Option<RouteDescriptor> {
        match self {
            Verb::Get => controller.as_get().map(|c| c.get(route)),
            Verb::Post => controller.as_post().map(|c| c.post(route)),
            Verb::Put => controller.as_put().map(|c| c.put(route)),
            Verb::Delete => controller.as_delete().map(|c| c.delete(route)),
            Verb::Options => controller.as_options().map(|c| c.options(route)),
        }
    }

    fn supported_by(self, controller: &dyn Controller) -> bool {
        match self {
            Verb::Get => controller.as_get().is_some(),
            Verb::Post => controller.as_post().is_some(),
            Verb::Put => controller.as_put().is_some(),
            Verb::Delete => controller.as_delete().is_some(),
            Verb::Options => controller.as_options().is_some(),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// Recognised capability combinations, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// GET, POST, PUT, DELETE and OPTIONS
    FullRest,
    /// GET, POST, PUT and DELETE
    Rest,
    /// GET and POST
    Web,
    Get,
    Post,
    Put,
    Delete,
}

impl Capability {
    /// Every combination in the order they are checked
    pub const ORDER: [Capability; 7] = [
        Capability::FullRest,
        Capability::Rest,
        Capability::Web,
        Capability::Get,
        Capability::Post,
        Capability::Put,
        Capability::Delete,
    ];

    #[must_use]
    pub fn verbs(self) -> &'static [Verb] {
        match self {
            Capability::FullRest => &[Verb::Get, Verb::Post, Verb::Put, Verb::Delete, Verb::Options],
            Capability::Rest => &[Verb::Get, Verb::Post, Verb::Put, Verb::Delete],
            Capability::Web => &[Verb::Get, Verb::Post],
            Capability::Get => &[Verb::Get],
            Capability::Post => &[Verb::Post],
            Capability::Put => &[Verb::Put],
            Capability::Delete => &[Verb::Delete],
        }
    }

    #[must_use]
    pub fn matches(self, controller: &dyn Controller) -> bool {
        self.verbs().iter().all(|v| v.supported_by(controller))
    }
}

/// Combinations `controller` satisfies, most specific first
#[must_use]
pub fn capabilities(controller: &dyn Controller) -> Vec<Capability> {
    Capability::ORDER
        .into_iter()
        .filter(|c| c.matches(controller))
        .collect()
}

/// Verbs to register for `controller`, each at most once
///
/// The union of every matching combination in check order. OPTIONS only
/// appears when the full REST combination matches.
#[must_use]
pub fn supported_verbs(controller: &dyn Controller) -> Vec<Verb> {
    let mut verbs: Vec<Verb> = Vec::with_capacity(5);
    for capability in capabilities(controller) {
        for verb in capability.verbs() {
            if !verbs.contains(verb) {
                verbs.push(*verb);
            }
        }
    }
    verbs
}
